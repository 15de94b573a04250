//! cambio-types
//!
//! Shared cambio-specific data transfer objects: capability flags,
//! rate-limit hints, request/signing configuration, and credentials.
//!
//! Everything in this crate is pure data, with no hooks and no I/O, so it can be
//! serialized, compared, and shared freely across the workspace.
#![warn(missing_docs)]

/// Provider capability flags and rate-limit hints.
pub mod capability;
/// Request and signing configuration enums.
pub mod config;
/// API credential material.
pub mod credentials;

pub use capability::{ProviderCaps, ProviderFlags, RateLimit};
pub use config::{AuthPlacement, DigestEncoding, HashAlgorithm, HttpMethod};
pub use credentials::Credentials;
