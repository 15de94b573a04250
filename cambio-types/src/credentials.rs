//! API credential material supplied when instantiating a provider.

use serde::{Deserialize, Serialize};

/// Credential fields recognized across providers.
///
/// Which fields a given provider actually requires is declared by its
/// definition (`ProviderFlags::required_credentials`) and checked at
/// construction time. The secret is kept out of `Debug` output.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct Credentials {
    /// Public API key.
    pub key: Option<String>,
    /// Signing secret.
    pub secret: Option<String>,
    /// Customer/account identifier, for vendors that sign with one.
    pub user: Option<String>,
    /// Simple API key, for vendors with a non-signing auth mode.
    pub apikey: Option<String>,
}

impl Credentials {
    /// Key + secret pair, the most common shape.
    #[must_use]
    pub fn key_secret(key: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            secret: Some(secret.into()),
            ..Self::default()
        }
    }

    /// Attach a customer/account identifier.
    #[must_use]
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    /// Attach a simple API key.
    #[must_use]
    pub fn with_apikey(mut self, apikey: impl Into<String>) -> Self {
        self.apikey = Some(apikey.into());
        self
    }

    /// Look up a credential field by its definition name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&str> {
        match name {
            "key" => self.key.as_deref(),
            "secret" => self.secret.as_deref(),
            "user" => self.user.as_deref(),
            "apikey" => self.apikey.as_deref(),
            _ => None,
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("key", &self.key)
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .field("user", &self.user)
            .field("apikey", &self.apikey.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_lookup_matches_definition_names() {
        let creds = Credentials::key_secret("k", "s").with_user("679064");
        assert_eq!(creds.field("key"), Some("k"));
        assert_eq!(creds.field("user"), Some("679064"));
        assert_eq!(creds.field("apikey"), None);
        assert_eq!(creds.field("nonsense"), None);
    }

    #[test]
    fn debug_redacts_secret() {
        let creds = Credentials::key_secret("k", "hunter2");
        let out = format!("{creds:?}");
        assert!(!out.contains("hunter2"));
    }
}
