//! Static provider and endpoint definitions.
//!
//! A provider definition is plain configuration built once at startup: a
//! base URL, capability flags, signing conventions, two endpoint tables,
//! and a small set of hooks for the vendor-specific parts (credential
//! normalization, auth-message construction, request-option mutation).
//! The `Provider` type turns one definition plus a credential set into a
//! live client.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use serde_json::{Map, Value};

use cambio_core::{CallOptions, CallResult, CambioError, TransformMap, TransformRule};
use cambio_core::signing::SigningConfig;
use cambio_types::{AuthPlacement, Credentials, HttpMethod, ProviderFlags};

use crate::Provider;

/// Which endpoint table a service came from; also its dispatch prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableKind {
    /// Raw endpoints mirroring the vendor's actual API surface.
    Vendor,
    /// Normalized endpoints presenting the vendor-agnostic surface.
    Api,
}

impl TableKind {
    /// Dispatch prefix (`vendor` / `api`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Vendor => "vendor",
            Self::Api => "api",
        }
    }
}

impl std::fmt::Display for TableKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Boxed future returned by custom endpoint actions.
pub type ActionFuture = BoxFuture<'static, CallResult>;

/// Custom endpoint logic. Receives a handle to the owning provider (for
/// calling other endpoints) and the transformed request options.
pub type ActionFn = Arc<dyn Fn(Provider, Value) -> ActionFuture + Send + Sync>;

/// Credential normalization hook, run once at provider construction.
pub type InitCredentialsFn =
    Arc<dyn Fn(Credentials) -> Result<Credentials, CambioError> + Send + Sync>;

/// Builds the provider-specific message string that gets signed. The hook
/// draws the nonce (via [`Provider::next_nonce`]) as part of building the
/// message, so one message build equals one nonce.
pub type AuthMessageFn = Arc<dyn Fn(&Provider, &CallOptions) -> String + Send + Sync>;

/// Provider-specific request mutation: attaches auth material to headers
/// or body, adjusts encodings, honors access tokens.
pub type OptionsHookFn =
    Arc<dyn Fn(&Provider, &mut CallOptions) -> Result<(), CambioError> + Send + Sync>;

/// One endpoint definition, before normalization into a live service.
#[derive(Clone, Default)]
pub struct Endpoint {
    pub(crate) path: Option<String>,
    pub(crate) method: Option<HttpMethod>,
    pub(crate) auth: bool,
    pub(crate) aliases: Vec<String>,
    pub(crate) delegate: Option<String>,
    pub(crate) value: Option<Value>,
    pub(crate) action: Option<ActionFn>,
    pub(crate) transforms_request: TransformMap,
    pub(crate) transforms_response: TransformMap,
    pub(crate) schema_request: Option<String>,
    pub(crate) schema_response: Option<String>,
    pub(crate) args: Map<String, Value>,
    pub(crate) body: Map<String, Value>,
    pub(crate) json: Option<bool>,
    pub(crate) throttle: Option<Duration>,
}

impl Endpoint {
    /// Remote endpoint at `path`, relative to the provider base URL.
    #[must_use]
    pub fn path(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::default()
        }
    }

    /// Endpoint returning a fixed value; no network call, no validation.
    #[must_use]
    pub fn value(value: Value) -> Self {
        Self {
            value: Some(value),
            ..Self::default()
        }
    }

    /// Endpoint forwarding every call, verbatim, to a vendor endpoint.
    #[must_use]
    pub fn delegate(target: impl Into<String>) -> Self {
        Self {
            delegate: Some(target.into()),
            ..Self::default()
        }
    }

    /// Endpoint with fully custom logic replacing the default action.
    #[must_use]
    pub fn action<F>(action: F) -> Self
    where
        F: Fn(Provider, Value) -> ActionFuture + Send + Sync + 'static,
    {
        Self {
            action: Some(Arc::new(action)),
            ..Self::default()
        }
    }

    /// Set the HTTP verb (otherwise the provider default applies).
    #[must_use]
    pub const fn method(mut self, method: HttpMethod) -> Self {
        self.method = Some(method);
        self
    }

    /// Mark the endpoint as requiring authentication.
    #[must_use]
    pub const fn authenticated(mut self) -> Self {
        self.auth = true;
        self
    }

    /// Register an additional dispatch name for this endpoint.
    #[must_use]
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    /// Add a request transform rule for `field`.
    #[must_use]
    pub fn transform_request(mut self, field: impl Into<String>, rule: TransformRule) -> Self {
        self.transforms_request.insert(field.into(), rule);
        self
    }

    /// Add a response transform rule for `field`.
    #[must_use]
    pub fn transform_response(mut self, field: impl Into<String>, rule: TransformRule) -> Self {
        self.transforms_response.insert(field.into(), rule);
        self
    }

    /// Override the request schema name (default: `<provider>.<name>.request`).
    #[must_use]
    pub fn schema_request(mut self, name: impl Into<String>) -> Self {
        self.schema_request = Some(name.into());
        self
    }

    /// Override the response schema name (default: `<provider>.<name>.response`).
    #[must_use]
    pub fn schema_response(mut self, name: impl Into<String>) -> Self {
        self.schema_response = Some(name.into());
        self
    }

    /// Endpoint-level default query argument, merged under caller options.
    #[must_use]
    pub fn arg(mut self, key: impl Into<String>, value: Value) -> Self {
        self.args.insert(key.into(), value);
        self
    }

    /// Endpoint-level default body field, merged under caller options.
    #[must_use]
    pub fn body_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.body.insert(key.into(), value);
        self
    }

    /// Force structured (`true`) or form-encoded (`false`) bodies for this
    /// endpoint, overriding the provider default.
    #[must_use]
    pub const fn structured(mut self, json: bool) -> Self {
        self.json = Some(json);
        self
    }

    /// Per-endpoint coalescing window, overriding the provider default.
    #[must_use]
    pub const fn throttle(mut self, window: Duration) -> Self {
        self.throttle = Some(window);
        self
    }
}

impl std::fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Endpoint")
            .field("path", &self.path)
            .field("method", &self.method)
            .field("auth", &self.auth)
            .field("aliases", &self.aliases)
            .field("delegate", &self.delegate)
            .field("value", &self.value.is_some())
            .field("action", &self.action.is_some())
            .finish_non_exhaustive()
    }
}

/// Table entry: either a shorthand string or a full endpoint definition.
///
/// A shorthand in the vendor table is a URL path; in the api table it is
/// the name of the vendor endpoint to delegate to.
#[derive(Debug, Clone)]
pub enum EndpointSpec {
    /// Shorthand, interpreted per table kind.
    Shorthand(String),
    /// Full structured definition.
    Full(Endpoint),
}

impl EndpointSpec {
    pub(crate) fn normalize(self, table: TableKind) -> Endpoint {
        match self {
            Self::Full(def) => def,
            Self::Shorthand(s) => match table {
                TableKind::Vendor => Endpoint::path(s),
                TableKind::Api => Endpoint::delegate(s),
            },
        }
    }
}

impl From<&str> for EndpointSpec {
    fn from(s: &str) -> Self {
        Self::Shorthand(s.to_string())
    }
}

impl From<String> for EndpointSpec {
    fn from(s: String) -> Self {
        Self::Shorthand(s)
    }
}

impl From<Endpoint> for EndpointSpec {
    fn from(def: Endpoint) -> Self {
        Self::Full(def)
    }
}

/// Provider-wide request defaults applied under endpoint and caller
/// options.
#[derive(Debug, Clone)]
pub struct RequestDefaults {
    /// Structured (`true`) vs form-encoded (`false`) bodies.
    pub json: bool,
    /// Headers attached to every request.
    pub headers: std::collections::BTreeMap<String, String>,
}

impl Default for RequestDefaults {
    fn default() -> Self {
        Self {
            json: true,
            headers: std::collections::BTreeMap::new(),
        }
    }
}

/// Static description of one vendor: identity, capabilities, signing
/// conventions, endpoint tables, and hooks.
#[derive(Clone)]
pub struct ProviderDefinition {
    pub(crate) name: String,
    pub(crate) label: String,
    pub(crate) url: String,
    pub(crate) schema_sources: Vec<PathBuf>,
    pub(crate) currencies: Vec<String>,
    pub(crate) assets: Vec<String>,
    pub(crate) flags: ProviderFlags,
    pub(crate) signing: SigningConfig,
    pub(crate) auth_placement: AuthPlacement,
    pub(crate) request_defaults: RequestDefaults,
    pub(crate) default_method: HttpMethod,
    pub(crate) throttle: Duration,
    pub(crate) vendor: Vec<(String, EndpointSpec)>,
    pub(crate) api: Vec<(String, EndpointSpec)>,
    pub(crate) init_credentials: Option<InitCredentialsFn>,
    pub(crate) create_auth_message: Option<AuthMessageFn>,
    pub(crate) get_options: Option<OptionsHookFn>,
}

impl ProviderDefinition {
    /// Start a definition for `name` against `url`.
    #[must_use]
    pub fn builder(name: impl Into<String>, url: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            label: name.clone(),
            name,
            url: url.into(),
            schema_sources: Vec::new(),
            currencies: Vec::new(),
            assets: Vec::new(),
            flags: ProviderFlags::default(),
            signing: SigningConfig::default(),
            auth_placement: AuthPlacement::default(),
            request_defaults: RequestDefaults::default(),
            default_method: HttpMethod::Get,
            throttle: Duration::ZERO,
            vendor: Vec::new(),
            api: Vec::new(),
            init_credentials: None,
            create_auth_message: None,
            get_options: None,
        }
    }

    /// Display label.
    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Add a schema source directory.
    #[must_use]
    pub fn schema_source(mut self, dir: impl Into<PathBuf>) -> Self {
        self.schema_sources.push(dir.into());
        self
    }

    /// Supported quote currencies.
    #[must_use]
    pub fn currencies(mut self, currencies: &[&str]) -> Self {
        self.currencies = currencies.iter().map(ToString::to_string).collect();
        self
    }

    /// Supported traded assets.
    #[must_use]
    pub fn assets(mut self, assets: &[&str]) -> Self {
        self.assets = assets.iter().map(ToString::to_string).collect();
        self
    }

    /// Capability flags and credential requirements.
    #[must_use]
    pub fn flags(mut self, flags: ProviderFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Signature conventions.
    #[must_use]
    pub const fn signing(mut self, signing: SigningConfig) -> Self {
        self.signing = signing;
        self
    }

    /// Where auth material lives on an outgoing request.
    #[must_use]
    pub const fn auth_placement(mut self, placement: AuthPlacement) -> Self {
        self.auth_placement = placement;
        self
    }

    /// Provider-wide request defaults.
    #[must_use]
    pub fn request_defaults(mut self, defaults: RequestDefaults) -> Self {
        self.request_defaults = defaults;
        self
    }

    /// Fallback verb for endpoints that do not set one.
    #[must_use]
    pub const fn default_method(mut self, method: HttpMethod) -> Self {
        self.default_method = method;
        self
    }

    /// Provider-wide coalescing window (zero disables coalescing).
    #[must_use]
    pub const fn throttle(mut self, window: Duration) -> Self {
        self.throttle = window;
        self
    }

    /// Add a vendor-table endpoint.
    #[must_use]
    pub fn vendor(mut self, name: impl Into<String>, spec: impl Into<EndpointSpec>) -> Self {
        self.vendor.push((name.into(), spec.into()));
        self
    }

    /// Add an api-table endpoint.
    #[must_use]
    pub fn api(mut self, name: impl Into<String>, spec: impl Into<EndpointSpec>) -> Self {
        self.api.push((name.into(), spec.into()));
        self
    }

    /// Credential normalization hook.
    #[must_use]
    pub fn init_credentials<F>(mut self, f: F) -> Self
    where
        F: Fn(Credentials) -> Result<Credentials, CambioError> + Send + Sync + 'static,
    {
        self.init_credentials = Some(Arc::new(f));
        self
    }

    /// Auth-message construction hook.
    #[must_use]
    pub fn create_auth_message<F>(mut self, f: F) -> Self
    where
        F: Fn(&Provider, &CallOptions) -> String + Send + Sync + 'static,
    {
        self.create_auth_message = Some(Arc::new(f));
        self
    }

    /// Request-option mutation hook (auth header/body assembly).
    #[must_use]
    pub fn get_options<F>(mut self, f: F) -> Self
    where
        F: Fn(&Provider, &mut CallOptions) -> Result<(), CambioError> + Send + Sync + 'static,
    {
        self.get_options = Some(Arc::new(f));
        self
    }
}

impl std::fmt::Debug for ProviderDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderDefinition")
            .field("name", &self.name)
            .field("label", &self.label)
            .field("url", &self.url)
            .field("vendor_endpoints", &self.vendor.len())
            .field("api_endpoints", &self.api.len())
            .finish_non_exhaustive()
    }
}
