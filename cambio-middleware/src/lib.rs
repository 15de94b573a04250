//! cambio-middleware
//!
//! Wrappers applied around endpoint actions. Currently: the call
//! coalescer, which shares one in-flight invocation among every caller
//! inside a time window.
#![warn(missing_docs)]

mod coalesce;

pub use crate::coalesce::Coalescer;
