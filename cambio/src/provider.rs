//! The provider: one live, credentialed client for one vendor.
//!
//! A `Provider` is built from a static [`ProviderDefinition`] plus a
//! credential set. It owns the schema registry, the nonce sequence, and
//! the full service registry (every endpoint of both tables, keyed by
//! fully-qualified dispatch name), and it exposes the signature
//! computation every authenticated endpoint goes through.
//!
//! # Nonce ordering
//!
//! Nonces are wall-clock derived and strictly increasing for sequential
//! calls; the guard mutex is held only across signature construction,
//! never across a network call. Concurrent authenticated calls can still
//! reach the vendor out of nonce order (network latency reorders them),
//! so composite fan-out endpoints are restricted by convention to
//! unauthenticated sub-calls; authenticated endpoints must be called
//! sequentially.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use serde_json::Value;
use tracing::debug;

use cambio_core::{
    CallOptions, CallResult, CambioError, HttpTransport, NamespaceNode, SchemaRegistry, Transport,
    signing,
};
use cambio_types::{AuthPlacement, Credentials, ProviderFlags};

use crate::definition::{ProviderDefinition, TableKind};
use crate::service::Service;

struct ProviderInner {
    definition: ProviderDefinition,
    credentials: Credentials,
    schemas: SchemaRegistry,
    nonce: Mutex<u64>,
    services: HashMap<String, Arc<Service>>,
    vendor_tree: NamespaceNode,
    api_tree: NamespaceNode,
    transport: Arc<dyn Transport>,
}

/// Live client for one vendor. Cheap to clone; all clones share the same
/// nonce sequence, schema registry, and service registry.
#[derive(Clone)]
pub struct Provider {
    inner: Arc<ProviderInner>,
}

impl Provider {
    /// Build a provider over the real HTTP transport.
    ///
    /// # Errors
    /// `Config` for an invalid definition (empty vendor table, duplicate
    /// dispatch name, missing credential field, unreadable schema source).
    pub fn new(
        definition: ProviderDefinition,
        credentials: Credentials,
    ) -> Result<Self, CambioError> {
        let transport = Arc::new(HttpTransport::new()?);
        Self::with_transport(definition, credentials, transport)
    }

    /// Build a provider over a caller-supplied transport (tests inject a
    /// scripted double here).
    ///
    /// # Errors
    /// Same conditions as [`Provider::new`].
    pub fn with_transport(
        definition: ProviderDefinition,
        credentials: Credentials,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, CambioError> {
        if definition.vendor.is_empty() {
            return Err(CambioError::config(format!(
                "invalid provider definition for {}: empty vendor table",
                definition.name
            )));
        }

        let credentials = match &definition.init_credentials {
            Some(init) => init(credentials)?,
            None => credentials,
        };
        for field in &definition.flags.required_credentials {
            if credentials.field(field).is_none() {
                return Err(CambioError::config(format!(
                    "{} credentials missing required field: {field}",
                    definition.name
                )));
            }
        }

        let schemas = SchemaRegistry::load(&definition.schema_sources)?;

        let mut services = HashMap::new();
        let mut vendor_tree = NamespaceNode::new();
        let mut api_tree = NamespaceNode::new();
        for (table, entries) in [
            (TableKind::Vendor, definition.vendor.clone()),
            (TableKind::Api, definition.api.clone()),
        ] {
            let tree = match table {
                TableKind::Vendor => &mut vendor_tree,
                TableKind::Api => &mut api_tree,
            };
            for (name, spec) in entries {
                let def = spec.normalize(table);
                let mut aliases = vec![name.clone()];
                aliases.extend(def.aliases.iter().cloned());

                let service = Arc::new(Service::new(table, &name, def, &definition));
                for alias in aliases {
                    let full = format!("{table}.{alias}");
                    if services.insert(full.clone(), Arc::clone(&service)).is_some() {
                        return Err(CambioError::config(format!(
                            "duplicate service: {full}"
                        )));
                    }
                    tree.bind(&alias, Some(full));
                }
            }
        }

        let provider = Self {
            inner: Arc::new(ProviderInner {
                definition,
                credentials,
                schemas,
                nonce: Mutex::new(0),
                services,
                vendor_tree,
                api_tree,
                transport,
            }),
        };
        // Seed the sequence so the first signed request already has a
        // current nonce behind it.
        provider.next_nonce();
        Ok(provider)
    }

    /// Call a normalized api-table endpoint by name.
    pub async fn api(&self, name: &str, options: Value) -> CallResult {
        self.dispatch(TableKind::Api, name, options).await
    }

    /// Call a raw vendor-table endpoint by name.
    pub async fn vendor(&self, name: &str, options: Value) -> CallResult {
        self.dispatch(TableKind::Vendor, name, options).await
    }

    /// Call any endpoint by fully-qualified dispatch name
    /// (`vendor.order_book`, `api.account.balance`, …).
    pub async fn call(&self, full_name: &str, options: Value) -> CallResult {
        let Some(service) = self.inner.services.get(full_name) else {
            return Err(CambioError::unknown_service(full_name));
        };
        debug!(service = full_name, provider = %self.name(), "dispatch");
        Arc::clone(service).process(self, options).await
    }

    async fn dispatch(&self, table: TableKind, name: &str, options: Value) -> CallResult {
        self.call(&format!("{table}.{name}"), options).await
    }

    /// Assemble the auth-bearing request fragment (headers or body, per
    /// the definition's auth placement) for inspection, without sending
    /// anything.
    ///
    /// # Errors
    /// `UnknownService` for an unregistered name; otherwise whatever the
    /// option assembly reports (e.g. `Signing` for unusable credentials).
    pub fn auth_keys(&self, full_name: &str, options: Value) -> Result<Value, CambioError> {
        let Some(service) = self.inner.services.get(full_name) else {
            return Err(CambioError::unknown_service(full_name));
        };
        let call = service.build_call(self, options)?;
        let fragment = match self.inner.definition.auth_placement {
            AuthPlacement::Headers => call
                .headers
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect(),
            AuthPlacement::Body => call.body,
        };
        Ok(Value::Object(fragment))
    }

    /// Draw the next nonce: wall-clock milliseconds scaled to a
    /// microsecond unit, bumped past the previous value when the clock
    /// has not advanced. Must be called before constructing an
    /// authenticated request.
    pub fn next_nonce(&self) -> u64 {
        let mut guard = self.inner.nonce.lock().expect("nonce mutex poisoned");
        let wall = u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0) * 1000;
        let next = wall.max(*guard + 1);
        *guard = next;
        next
    }

    /// The most recently drawn nonce.
    pub fn current_nonce(&self) -> u64 {
        *self.inner.nonce.lock().expect("nonce mutex poisoned")
    }

    /// Compute the auth signature for an assembled request: the
    /// definition's message hook builds the message (drawing the nonce),
    /// and the configured MAC of that message is returned in the
    /// configured digest form.
    ///
    /// # Errors
    /// `Signing` when the definition has no message hook or the
    /// credentials carry no secret.
    pub fn create_auth_signature(&self, call: &CallOptions) -> Result<String, CambioError> {
        let Some(hook) = &self.inner.definition.create_auth_message else {
            return Err(CambioError::Signing(format!(
                "{} has no auth message builder",
                self.name()
            )));
        };
        let message = hook(self, call);
        let Some(secret) = self.inner.credentials.secret.as_deref() else {
            return Err(CambioError::Signing(format!(
                "{} credentials carry no secret",
                self.name()
            )));
        };
        signing::sign(&message, secret, &self.inner.definition.signing)
    }

    pub(crate) fn apply_options_hook(&self, call: &mut CallOptions) -> Result<(), CambioError> {
        match &self.inner.definition.get_options {
            Some(hook) => hook(self, call),
            None => Ok(()),
        }
    }

    /// Provider name (`bitstamp`, `coinbase`, …).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.definition.name
    }

    /// Display label.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.inner.definition.label
    }

    /// Base API URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.inner.definition.url
    }

    /// Capability flags and credential requirements.
    #[must_use]
    pub fn flags(&self) -> &ProviderFlags {
        &self.inner.definition.flags
    }

    /// Supported quote currencies.
    #[must_use]
    pub fn currencies(&self) -> &[String] {
        &self.inner.definition.currencies
    }

    /// Supported traded assets.
    #[must_use]
    pub fn assets(&self) -> &[String] {
        &self.inner.definition.assets
    }

    /// Credential material (hooks use this to pick up key/user fields).
    #[must_use]
    pub fn credentials(&self) -> &Credentials {
        &self.inner.credentials
    }

    /// The schema registry loaded from the definition's sources.
    #[must_use]
    pub fn schemas(&self) -> &SchemaRegistry {
        &self.inner.schemas
    }

    /// Read-only dotted-name view of the vendor table.
    #[must_use]
    pub fn vendor_tree(&self) -> &NamespaceNode {
        &self.inner.vendor_tree
    }

    /// Read-only dotted-name view of the api table.
    #[must_use]
    pub fn api_tree(&self) -> &NamespaceNode {
        &self.inner.api_tree
    }

    /// Registered fully-qualified dispatch names, unordered.
    pub fn service_names(&self) -> impl Iterator<Item = &str> {
        self.inner.services.keys().map(String::as_str)
    }

    pub(crate) fn transport(&self) -> &Arc<dyn Transport> {
        &self.inner.transport
    }

    pub(crate) fn default_headers(&self) -> &BTreeMap<String, String> {
        &self.inner.definition.request_defaults.headers
    }
}

impl std::fmt::Debug for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Provider")
            .field("name", &self.name())
            .field("services", &self.inner.services.len())
            .finish_non_exhaustive()
    }
}
