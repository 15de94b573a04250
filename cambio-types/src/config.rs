//! Request and signing configuration shared by definitions and the engine.

use serde::{Deserialize, Serialize};

/// HTTP verb an endpoint uses.
///
/// Read-style verbs route caller options into the query string; write-style
/// verbs route them into the request body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// Read verb; the default for endpoints that do not say otherwise.
    #[default]
    Get,
    /// Write verb used by most authenticated exchange endpoints.
    Post,
    /// Replace verb; rarely used by exchange APIs but accepted in definitions.
    Put,
    /// Delete verb.
    Delete,
}

impl HttpMethod {
    /// Canonical upper-case method name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }

    /// `true` when caller options belong on the query string rather than in
    /// a body payload.
    #[must_use]
    pub const fn is_read(self) -> bool {
        matches!(self, Self::Get | Self::Delete)
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Hash primitive used for authentication signatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// HMAC-SHA256; the default for every known exchange.
    #[default]
    Sha256,
    /// HMAC-SHA384.
    Sha384,
    /// HMAC-SHA512.
    Sha512,
}

/// Text encoding of a computed signature digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestEncoding {
    /// Lower-case hexadecimal; the default.
    #[default]
    Hex,
    /// Standard base64.
    Base64,
}

/// Where a provider places its auth material on an outgoing request.
///
/// Used by the diagnostic surface to know which request fragment carries
/// the key/signature/nonce triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthPlacement {
    /// Auth fields travel as request headers.
    #[default]
    Headers,
    /// Auth fields are merged into the request body.
    Body,
}
