//! cambio-core
//!
//! Framework leaves shared across the cambio ecosystem.
//!
//! - `error`: the unified [`CambioError`] type.
//! - `transform`: declarative drop/rename/derive field rules.
//! - `namespace`: the dotted-path namespace tree behind `provider.api.*`.
//! - `schema`: the id-keyed schema registry façade.
//! - `signing`: keyed-MAC signature computation.
//! - `transport`: the network-call seam and its reqwest implementation.
//!
//! The engine itself (providers, endpoint units, the request pipeline)
//! lives in the `cambio` crate; vendor endpoint tables live in the
//! per-provider crates.
#![warn(missing_docs)]

pub mod error;
/// Dotted-path namespace tree with never-overwrite binding.
pub mod namespace;
/// Schema registry: directory-loaded, id-keyed documents.
pub mod schema;
/// Keyed-MAC signature computation for authenticated requests.
pub mod signing;
/// Declarative request/response field transforms.
pub mod transform;
/// Network-call shape, the `Transport` trait, and the reqwest transport.
pub mod transport;

pub use error::{CallResult, CambioError};
pub use namespace::NamespaceNode;
pub use schema::SchemaRegistry;
pub use signing::{SigningConfig, sign};
pub use transform::{TransformMap, TransformRule, apply as apply_transforms};
pub use transport::{CallOptions, HttpTransport, Transport};
