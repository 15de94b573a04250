//! Keyed-MAC signature computation for authenticated requests.
//!
//! Providers build a vendor-specific message (nonce + identifiers, or
//! nonce + uri + body, depending on the vendor) and this module computes
//! the MAC over it with the provider's secret and configured hash/digest
//! form.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use hmac::{Hmac, Mac};
use sha2::{Sha256, Sha384, Sha512};

use cambio_types::{DigestEncoding, HashAlgorithm};

use crate::CambioError;

/// How a provider's signatures are computed and encoded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SigningConfig {
    /// Hash primitive; SHA-256 unless the vendor says otherwise.
    pub algorithm: HashAlgorithm,
    /// Digest text encoding; lower-case hex unless the vendor says otherwise.
    pub encoding: DigestEncoding,
    /// Some vendors require the signature upper-cased.
    pub uppercase: bool,
}

impl SigningConfig {
    /// Upper-case the encoded digest (Bitstamp-style).
    #[must_use]
    pub const fn uppercased(mut self) -> Self {
        self.uppercase = true;
        self
    }
}

/// Compute the configured MAC of `message` keyed by `secret`.
///
/// # Errors
/// `Signing` when the key material is unusable.
pub fn sign(message: &str, secret: &str, cfg: &SigningConfig) -> Result<String, CambioError> {
    let digest = match cfg.algorithm {
        HashAlgorithm::Sha256 => mac_digest::<Hmac<Sha256>>(message, secret)?,
        HashAlgorithm::Sha384 => mac_digest::<Hmac<Sha384>>(message, secret)?,
        HashAlgorithm::Sha512 => mac_digest::<Hmac<Sha512>>(message, secret)?,
    };
    let encoded = match cfg.encoding {
        DigestEncoding::Hex => hex::encode(digest),
        DigestEncoding::Base64 => BASE64.encode(digest),
    };
    Ok(if cfg.uppercase {
        encoded.to_uppercase()
    } else {
        encoded
    })
}

fn mac_digest<M>(message: &str, secret: &str) -> Result<Vec<u8>, CambioError>
where
    M: Mac + hmac::digest::KeyInit,
{
    let mut mac = <M as hmac::digest::KeyInit>::new_from_slice(secret.as_bytes())
        .map_err(|e| CambioError::Signing(format!("unusable secret: {e}")))?;
    mac.update(message.as_bytes());
    Ok(mac.finalize().into_bytes().to_vec())
}
