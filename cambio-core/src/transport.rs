//! The network-call seam.
//!
//! The engine assembles a [`CallOptions`], the full shape of one network
//! call, and hands it to a [`Transport`]. Production code uses
//! [`HttpTransport`] (reqwest); tests inject a scripted double instead, so
//! nothing above this seam ever touches the network.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::debug;

use cambio_types::HttpMethod;

use crate::{CallResult, CambioError};

/// Everything that describes one outgoing request.
#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    /// HTTP verb.
    pub method: HttpMethod,
    /// Absolute request URI (base URL already joined with the endpoint path).
    pub uri: String,
    /// Query-string parameters.
    pub args: Map<String, Value>,
    /// Body payload; omitted from the wire when empty.
    pub body: Map<String, Value>,
    /// Extra request headers.
    pub headers: BTreeMap<String, String>,
    /// `true` sends the body as JSON; `false` form-urlencodes it.
    pub json: bool,
    /// Whether this request must carry auth material. Assembly metadata
    /// only; the transport never reads it.
    pub auth: bool,
}

impl CallOptions {
    /// Read-style request for `uri`.
    #[must_use]
    pub fn get(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            json: true,
            ..Self::default()
        }
    }

    /// Request with an explicit verb.
    #[must_use]
    pub fn new(method: HttpMethod, uri: impl Into<String>) -> Self {
        Self {
            method,
            uri: uri.into(),
            json: true,
            ..Self::default()
        }
    }

    /// Add a query-string parameter.
    #[must_use]
    pub fn arg(mut self, key: impl Into<String>, value: Value) -> Self {
        self.args.insert(key.into(), value);
        self
    }

    /// Add a header.
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }
}

/// One network invocation. Implementations perform exactly one call, with
/// no retries and no backoff; a failure surfaces immediately to the pipeline.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue the request and return the decoded response payload.
    async fn call(&self, options: &CallOptions) -> CallResult;
}

/// reqwest-backed transport.
///
/// Responses are decoded as JSON when possible and fall back to a raw
/// string value otherwise (some vendors return bare text bodies, e.g. a
/// deposit address). A bounded request timeout lives here, at the
/// transport boundary, not in the pipeline.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Transport with a 30 second request timeout.
    ///
    /// # Errors
    /// `Config` when the underlying client cannot be constructed.
    pub fn new() -> Result<Self, CambioError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| CambioError::config(format!("http client: {e}")))?;
        Ok(Self { client })
    }

    /// Transport around a caller-configured client.
    #[must_use]
    pub const fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

/// Query/form parameters want plain strings; JSON strings go through
/// unquoted, everything else via its JSON rendering.
fn string_pairs(map: &Map<String, Value>) -> Vec<(String, String)> {
    map.iter()
        .map(|(k, v)| {
            let s = match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (k.clone(), s)
        })
        .collect()
}

#[async_trait]
impl Transport for HttpTransport {
    async fn call(&self, options: &CallOptions) -> CallResult {
        let method = reqwest::Method::from_bytes(options.method.as_str().as_bytes())
            .map_err(|e| CambioError::transport(e.to_string()))?;

        debug!(uri = %options.uri, method = %options.method, "performing request");

        let mut builder = self.client.request(method, &options.uri);
        if !options.args.is_empty() {
            builder = builder.query(&string_pairs(&options.args));
        }
        if !options.body.is_empty() {
            builder = if options.json {
                builder.json(&Value::Object(options.body.clone()))
            } else {
                builder.form(&string_pairs(&options.body))
            };
        }
        for (key, value) in &options.headers {
            builder = builder.header(key, value);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| CambioError::transport(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| CambioError::transport(e.to_string()))?;

        if !status.is_success() {
            return Err(CambioError::transport_status(
                format!("request failed: {}", options.uri),
                status.as_u16(),
            ));
        }

        Ok(serde_json::from_str(&text).unwrap_or(Value::String(text)))
    }
}
