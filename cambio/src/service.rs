//! The endpoint unit: one configured, callable operation.
//!
//! Every endpoint, raw vendor call or normalized api call alike, becomes one
//! `Service`. A call runs the five-stage pipeline: transform request,
//! validate request, invoke, validate response, transform response, with
//! two shortcuts in front of it (pure delegates and literal values skip
//! the pipeline entirely).

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, Value};
use tracing::debug;
use url::Url;

use cambio_core::{CallOptions, CallResult, CambioError, TransformMap};
use cambio_middleware::Coalescer;
use cambio_types::HttpMethod;

use crate::Provider;
use crate::definition::{ActionFn, Endpoint, ProviderDefinition, TableKind};

/// Resolved endpoint behavior, decided once at construction.
#[derive(Clone)]
pub(crate) enum ServiceKind {
    /// Fixed result returned without any network call.
    Literal(Value),
    /// Unconditional forward to another vendor endpoint.
    Delegate(String),
    /// Default HTTP action against the configured path.
    Remote,
    /// Custom logic replacing the invoke stage.
    Custom(ActionFn),
}

/// One configured endpoint, instantiated once per provider instance and
/// reused for every call.
pub struct Service {
    table: TableKind,
    name: String,
    full_name: String,
    kind: ServiceKind,
    path: Option<String>,
    method: HttpMethod,
    auth: bool,
    transforms_request: TransformMap,
    transforms_response: TransformMap,
    schema_request: String,
    schema_response: String,
    args: Map<String, Value>,
    body: Map<String, Value>,
    json: bool,
    coalescer: Option<Coalescer>,
}

/// Option keys with engine meaning, peeled off before routing the rest of
/// the caller's options into query args or body fields.
const OPT_AUTH: &str = "auth";
const OPT_ACCESS_TOKEN: &str = "access_token";

impl Service {
    pub(crate) fn new(
        table: TableKind,
        name: &str,
        def: Endpoint,
        provider_def: &ProviderDefinition,
    ) -> Self {
        let kind = if let Some(target) = def.delegate {
            ServiceKind::Delegate(target)
        } else if let Some(value) = def.value {
            ServiceKind::Literal(value)
        } else if let Some(action) = def.action {
            ServiceKind::Custom(action)
        } else {
            ServiceKind::Remote
        };

        let window = def.throttle.unwrap_or(provider_def.throttle);
        let coalescer = (window > Duration::ZERO).then(|| Coalescer::new(window));

        Self {
            table,
            name: name.to_string(),
            full_name: format!("{table}.{name}"),
            kind,
            path: def.path,
            method: def.method.unwrap_or(provider_def.default_method),
            auth: def.auth,
            transforms_request: def.transforms_request,
            transforms_response: def.transforms_response,
            schema_request: def
                .schema_request
                .unwrap_or_else(|| format!("{}.{name}.request", provider_def.name)),
            schema_response: def
                .schema_response
                .unwrap_or_else(|| format!("{}.{name}.response", provider_def.name)),
            args: def.args,
            body: def.body,
            json: def.json.unwrap_or(provider_def.request_defaults.json),
            coalescer,
        }
    }

    /// Endpoint name within its table.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fully-qualified dispatch name (`vendor.…` / `api.…`).
    #[must_use]
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    /// Which table this endpoint came from.
    #[must_use]
    pub const fn table(&self) -> TableKind {
        self.table
    }

    /// Run one call through this endpoint.
    pub(crate) async fn process(
        self: Arc<Self>,
        provider: &Provider,
        options: Value,
    ) -> CallResult {
        let options = normalize_options(options);

        // Pure delegates forward verbatim; none of the other stages run.
        if let ServiceKind::Delegate(target) = &self.kind {
            debug!(service = %self.full_name, %target, "delegating");
            return Box::pin(provider.vendor(target, options)).await;
        }

        // Literal endpoints return their value immediately.
        if let ServiceKind::Literal(value) = &self.kind {
            return Ok(value.clone());
        }

        let options = cambio_core::apply_transforms(&self.transforms_request, options);
        provider
            .schemas()
            .validate(&options, &self.schema_request)?;

        // Invoke stage, routed through the coalescer when a window is
        // configured. The action future owns its captures so the coalescer
        // can drive it to completion on a separate task.
        let action = {
            let service = Arc::clone(&self);
            let provider = provider.clone();
            async move { service.run_action(&provider, options).await }
        };
        let result = match &self.coalescer {
            Some(coalescer) => coalescer.execute(action).await,
            None => action.await,
        }?;

        provider
            .schemas()
            .validate(&result, &self.schema_response)?;
        Ok(cambio_core::apply_transforms(
            &self.transforms_response,
            result,
        ))
    }

    async fn run_action(self: Arc<Self>, provider: &Provider, options: Value) -> CallResult {
        match &self.kind {
            ServiceKind::Custom(action) => action(provider.clone(), options).await,
            _ => self.default_action(provider, options).await,
        }
    }

    /// Default action: route options into query args (read verbs) or body
    /// fields (write verbs), assemble the full request, and call the
    /// transport.
    async fn default_action(&self, provider: &Provider, options: Value) -> CallResult {
        let call = self.build_call(provider, options)?;
        debug!(service = %self.full_name, uri = %call.uri, "invoking");
        provider.transport().call(&call).await
    }

    /// Assemble the full network-call shape for `options` without sending
    /// anything. Also backs the auth-keys diagnostic surface.
    pub(crate) fn build_call(
        &self,
        provider: &Provider,
        options: Value,
    ) -> Result<CallOptions, CambioError> {
        let mut fields = match normalize_options(options) {
            Value::Object(map) => map,
            other => {
                return Err(CambioError::Data(format!(
                    "request options for {} must be an object, got {other}",
                    self.full_name
                )));
            }
        };

        let auth_override = fields.remove(OPT_AUTH).and_then(|v| v.as_bool());
        let access_token = fields.remove(OPT_ACCESS_TOKEN);

        let mut call = CallOptions::new(self.method, self.resolve_uri(provider)?);
        call.json = self.json;
        call.auth = auth_override.unwrap_or(self.auth);
        call.headers = provider.default_headers().clone();

        // Increasing priority: endpoint defaults, then caller options.
        call.args = self.args.clone();
        call.body = self.body.clone();
        if self.method.is_read() {
            call.args.extend(fields);
        } else {
            call.body.extend(fields);
        }
        if let Some(token) = access_token {
            call.args.insert(OPT_ACCESS_TOKEN.to_string(), token);
        }

        provider.apply_options_hook(&mut call)?;
        Ok(call)
    }

    fn resolve_uri(&self, provider: &Provider) -> Result<String, CambioError> {
        let base = Url::parse(provider.url())
            .map_err(|e| CambioError::config(format!("invalid base url {}: {e}", provider.url())))?;
        match &self.path {
            Some(path) => Ok(base
                .join(path)
                .map_err(|e| {
                    CambioError::config(format!("invalid path {path} for {}: {e}", self.full_name))
                })?
                .to_string()),
            None => Ok(base.to_string()),
        }
    }
}

impl std::fmt::Debug for Service {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Service")
            .field("full_name", &self.full_name)
            .field("method", &self.method)
            .field("auth", &self.auth)
            .field("coalesced", &self.coalescer.is_some())
            .finish_non_exhaustive()
    }
}

/// Callers may pass `Value::Null` for "no options".
fn normalize_options(options: Value) -> Value {
    if options.is_null() {
        Value::Object(Map::new())
    } else {
        options
    }
}
