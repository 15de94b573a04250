//! cambio
//!
//! Declarative exchange API clients. A vendor's raw HTTP endpoints and a
//! normalized "api" layer are both described as plain configuration
//! ([`ProviderDefinition`]); this crate turns that configuration into a
//! callable, name-dispatched client with a fixed request/response
//! pipeline, per-provider authentication signing, and per-endpoint call
//! coalescing.
//!
//! ```rust,ignore
//! use cambio::{Credentials, Provider};
//!
//! let provider = Provider::new(
//!     cambio_bitstamp::definition(),
//!     Credentials::key_secret("key", "secret").with_user("679064"),
//! )?;
//!
//! // By name…
//! let ticker = provider.api("ticker", serde_json::Value::Null).await?;
//! // …or through the dotted namespace tree.
//! let leaf = provider.api_tree().get("account.balance").unwrap();
//! let balance = provider.call(leaf.leaf().unwrap(), serde_json::Value::Null).await?;
//! ```
//!
//! Async runtime (Tokio)
//! ---------------------
//! This crate assumes the Tokio ecosystem: the call coalescer parks
//! waiters on `tokio::sync::oneshot` channels and drives the shared
//! invocation on a spawned task, so endpoint calls must run under a
//! Tokio 1.x runtime.
#![warn(missing_docs)]

/// Static provider/endpoint definitions and hook types.
pub mod definition;
/// The live provider: dispatch, nonce sequence, signing.
pub mod provider;
/// The endpoint unit and its five-stage pipeline.
pub mod service;

pub use definition::{
    ActionFn, ActionFuture, Endpoint, EndpointSpec, ProviderDefinition, RequestDefaults, TableKind,
};
pub use provider::Provider;
pub use service::Service;

pub use cambio_core::signing::{self, SigningConfig};
pub use cambio_core::{
    CallOptions, CallResult, CambioError, HttpTransport, NamespaceNode, SchemaRegistry, Transport,
    TransformRule,
};
pub use cambio_middleware::Coalescer;
pub use cambio_types::{
    AuthPlacement, Credentials, DigestEncoding, HashAlgorithm, HttpMethod, ProviderCaps,
    ProviderFlags, RateLimit,
};
