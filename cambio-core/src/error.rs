//! Unified error type for the cambio workspace.

use thiserror::Error;

/// Result of any endpoint invocation.
///
/// `Clone` end to end: the call coalescer shares one completed result,
/// success or failure, with every caller inside a window.
pub type CallResult = Result<serde_json::Value, CambioError>;

/// Unified error type for the cambio workspace.
///
/// Expected failures (unknown dispatch names, validation rejections,
/// transport problems) are always returned as `Err` values, never
/// panicked, so callers can treat every invocation uniformly.
/// Configuration problems are returned from constructors and are fatal to
/// building that provider.
#[derive(Debug, Clone, Error)]
pub enum CambioError {
    /// Invalid provider or endpoint definition: duplicate dispatch name,
    /// missing credential field, unreadable schema source.
    #[error("configuration error: {0}")]
    Config(String),

    /// The requested dispatch name is not registered on this provider.
    #[error("no such service: {service}")]
    UnknownService {
        /// Fully-qualified dispatch name, e.g. `api.account.balance`.
        service: String,
    },

    /// Request or response payload failed schema validation.
    #[error("validation failed for {service}: {detail}")]
    Validation {
        /// Schema name the payload was checked against.
        service: String,
        /// Offending path and reason.
        detail: String,
    },

    /// Network failure or non-success status from the vendor.
    #[error("transport error: {error}")]
    Transport {
        /// Human-readable failure description.
        error: String,
        /// HTTP status code, when the vendor responded at all.
        status: Option<u16>,
    },

    /// Signature construction failed (unusable key material).
    #[error("signing error: {0}")]
    Signing(String),

    /// A payload did not have the shape an endpoint expected.
    #[error("data issue: {0}")]
    Data(String),
}

impl CambioError {
    /// Helper: build a `Config` error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Helper: build an `UnknownService` error for a fully-qualified name.
    pub fn unknown_service(service: impl Into<String>) -> Self {
        Self::UnknownService {
            service: service.into(),
        }
    }

    /// Helper: build a `Validation` error.
    pub fn validation(service: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Validation {
            service: service.into(),
            detail: detail.into(),
        }
    }

    /// Helper: build a `Transport` error without a status code.
    pub fn transport(error: impl Into<String>) -> Self {
        Self::Transport {
            error: error.into(),
            status: None,
        }
    }

    /// Helper: build a `Transport` error carrying the response status.
    pub fn transport_status(error: impl Into<String>, status: u16) -> Self {
        Self::Transport {
            error: error.into(),
            status: Some(status),
        }
    }
}
