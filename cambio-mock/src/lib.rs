//! Mock transport for CI-safe tests and examples.
//!
//! Routes are scripted by URI substring; each route returns a fixed
//! value, a fixed error, or runs a handler over the assembled call
//! options (handy for echo endpoints). Every issued call is recorded for
//! assertions, and routes can simulate latency for coalescing tests.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use cambio_core::{CallOptions, CallResult, CambioError, Transport};

type Handler = Arc<dyn Fn(&CallOptions) -> CallResult + Send + Sync>;

enum Script {
    Value(Value),
    Error(CambioError),
    Handler(Handler),
}

struct Route {
    fragment: String,
    script: Script,
    delay: Duration,
}

/// Scripted in-memory transport.
#[derive(Default)]
pub struct MockTransport {
    routes: Vec<Route>,
    calls: Mutex<Vec<CallOptions>>,
}

impl MockTransport {
    /// Transport with no routes; every call fails until routes are added.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Respond with `value` to any call whose URI contains `fragment`.
    #[must_use]
    pub fn route(mut self, fragment: impl Into<String>, value: Value) -> Self {
        self.routes.push(Route {
            fragment: fragment.into(),
            script: Script::Value(value),
            delay: Duration::ZERO,
        });
        self
    }

    /// Fail with `error` for any call whose URI contains `fragment`.
    #[must_use]
    pub fn route_error(mut self, fragment: impl Into<String>, error: CambioError) -> Self {
        self.routes.push(Route {
            fragment: fragment.into(),
            script: Script::Error(error),
            delay: Duration::ZERO,
        });
        self
    }

    /// Answer matching calls by running `handler` over the assembled
    /// options.
    #[must_use]
    pub fn route_with(
        mut self,
        fragment: impl Into<String>,
        handler: impl Fn(&CallOptions) -> CallResult + Send + Sync + 'static,
    ) -> Self {
        self.routes.push(Route {
            fragment: fragment.into(),
            script: Script::Handler(Arc::new(handler)),
            delay: Duration::ZERO,
        });
        self
    }

    /// Delay the most recently added route by `delay` before responding.
    ///
    /// # Panics
    /// Panics when no route has been added yet.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.routes
            .last_mut()
            .expect("with_delay requires a preceding route")
            .delay = delay;
        self
    }

    /// Every call issued so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<CallOptions> {
        self.calls.lock().expect("mock mutex poisoned").clone()
    }

    /// Number of calls issued so far.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.lock().expect("mock mutex poisoned").len()
    }

    /// Calls whose URI contains `fragment`.
    #[must_use]
    pub fn calls_to(&self, fragment: &str) -> Vec<CallOptions> {
        self.calls()
            .into_iter()
            .filter(|c| c.uri.contains(fragment))
            .collect()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn call(&self, options: &CallOptions) -> CallResult {
        self.calls
            .lock()
            .expect("mock mutex poisoned")
            .push(options.clone());

        let Some(route) = self.routes.iter().find(|r| options.uri.contains(&r.fragment))
        else {
            return Err(CambioError::transport_status(
                format!("no scripted response for {}", options.uri),
                404,
            ));
        };

        if !route.delay.is_zero() {
            tokio::time::sleep(route.delay).await;
        }
        match &route.script {
            Script::Value(value) => Ok(value.clone()),
            Script::Error(error) => Err(error.clone()),
            Script::Handler(handler) => handler(options),
        }
    }
}
