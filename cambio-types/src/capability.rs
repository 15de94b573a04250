use std::time::Duration;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Optional surfaces a provider supports beyond plain request/response
    /// endpoints.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ProviderCaps: u8 {
        /// The vendor offers a streaming feed.
        const STREAMING = 1 << 0;
        /// List endpoints support pagination parameters.
        const PAGINATION = 1 << 1;
        /// Historical data endpoints are available.
        const HISTORY = 1 << 2;
    }
}

/// Advisory rate-limit hint published by a provider definition.
///
/// This is informational only; the framework does not meter requests
/// against it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimit {
    /// Maximum number of requests within `timespan`.
    pub requests: u32,
    /// Accounting window for `requests`.
    pub timespan: Duration,
}

impl RateLimit {
    /// Build a rate-limit hint of `requests` per `timespan` seconds.
    #[must_use]
    pub const fn per_seconds(requests: u32, seconds: u64) -> Self {
        Self {
            requests,
            timespan: Duration::from_secs(seconds),
        }
    }
}

/// Capability description carried by every provider definition.
#[derive(Debug, Clone, Default)]
pub struct ProviderFlags {
    /// Optional surfaces the vendor supports.
    pub caps: ProviderCaps,
    /// Credential fields the vendor requires (e.g. `["key", "secret"]`).
    pub required_credentials: Vec<String>,
    /// Advisory request budget, when the vendor documents one.
    pub rate_limit: Option<RateLimit>,
}

impl ProviderFlags {
    /// Flags with the given required credential fields and no extra surfaces.
    #[must_use]
    pub fn requiring(fields: &[&str]) -> Self {
        Self {
            caps: ProviderCaps::empty(),
            required_credentials: fields.iter().map(ToString::to_string).collect(),
            rate_limit: None,
        }
    }

    /// Attach a rate-limit hint.
    #[must_use]
    pub const fn with_rate_limit(mut self, limit: RateLimit) -> Self {
        self.rate_limit = Some(limit);
        self
    }

    /// Enable additional capability surfaces.
    #[must_use]
    pub const fn with_caps(mut self, caps: ProviderCaps) -> Self {
        self.caps = caps;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_carry_required_fields() {
        let flags = ProviderFlags::requiring(&["key", "secret", "user"])
            .with_rate_limit(RateLimit::per_seconds(600, 600));
        assert_eq!(flags.required_credentials, vec!["key", "secret", "user"]);
        assert_eq!(flags.rate_limit.unwrap().requests, 600);
        assert!(flags.caps.is_empty());
    }

    #[test]
    fn caps_compose() {
        let caps = ProviderCaps::STREAMING | ProviderCaps::HISTORY;
        assert!(caps.contains(ProviderCaps::STREAMING));
        assert!(!caps.contains(ProviderCaps::PAGINATION));
    }
}
