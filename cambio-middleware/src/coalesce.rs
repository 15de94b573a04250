//! Window-scoped call coalescing.
//!
//! The first call inside a window drives the underlying action; every
//! further call inside that window shares its result instead of invoking
//! the action again. Queued callers are completed last-registered-first
//! once the driving call finishes (ordering among coalesced callers is
//! otherwise unspecified). Errors are shared exactly like successes.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::FutureExt;
use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::debug;

use cambio_core::{CallResult, CambioError};

/// Shares one in-flight invocation among all callers inside a time window.
///
/// State machine per window:
/// - no active window: the caller becomes the initiator; the window opens
///   and the action runs on a spawned task (so cancelling the initiating
///   caller cannot strand anyone);
/// - window active, action still running: the caller queues and is
///   completed when the action finishes;
/// - window active, action finished: the caller receives the cached result
///   immediately, with no new invocation;
/// - window elapsed: state resets lazily on the next call, which starts a
///   fresh cycle. Callers queued under the previous cycle are still
///   drained when that cycle's action completes; every queued caller
///   resolves exactly once.
///
/// A zero window disables coalescing entirely.
pub struct Coalescer {
    window: Duration,
    inner: Arc<Mutex<Inner>>,
}

#[derive(Default)]
struct Inner {
    /// End of the active window; `None` before the first call.
    deadline: Option<Instant>,
    /// Completed result of the window's invocation, once available.
    cached: Option<CallResult>,
    /// Callers parked while the invocation is in flight.
    waiters: Vec<oneshot::Sender<CallResult>>,
}

impl Inner {
    /// Store the finished result and hand back the parked callers,
    /// last-registered-first.
    fn settle(&mut self, result: &CallResult) -> Vec<oneshot::Sender<CallResult>> {
        self.cached = Some(result.clone());
        let mut waiters = std::mem::take(&mut self.waiters);
        waiters.reverse();
        waiters
    }
}

impl Coalescer {
    /// Coalescer sharing results for `window` after each invocation.
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            inner: Arc::new(Mutex::new(Inner::default())),
        }
    }

    /// Length of the sharing window.
    #[must_use]
    pub const fn window(&self) -> Duration {
        self.window
    }

    /// Run `action` under the coalescing contract.
    ///
    /// The future must be `'static`: the initiator's action is driven on a
    /// spawned task so it runs to completion even if the caller that
    /// started it goes away.
    pub async fn execute<F>(&self, action: F) -> CallResult
    where
        F: Future<Output = CallResult> + Send + 'static,
    {
        if self.window.is_zero() {
            return action.await;
        }

        let now = Instant::now();
        let role = {
            let mut st = self.inner.lock().expect("coalescer mutex poisoned");
            let active = st.deadline.is_some_and(|d| now < d);
            if active {
                if let Some(cached) = &st.cached {
                    Role::Cached(cached.clone())
                } else {
                    let (tx, rx) = oneshot::channel();
                    st.waiters.push(tx);
                    Role::Waiter(rx)
                }
            } else {
                st.deadline = Some(now + self.window);
                st.cached = None;
                Role::Initiator
            }
        };

        match role {
            Role::Cached(result) => result,
            Role::Waiter(rx) => rx.await.unwrap_or_else(|_| {
                // Only reachable if the driving task was torn down with the
                // runtime itself.
                Err(CambioError::transport("coalesced call abandoned"))
            }),
            Role::Initiator => {
                let inner = Arc::clone(&self.inner);
                let handle = tokio::spawn(async move {
                    let result = std::panic::AssertUnwindSafe(action)
                        .catch_unwind()
                        .await
                        .unwrap_or_else(|_| {
                            Err(CambioError::Data("endpoint action panicked".into()))
                        });
                    let waiters = inner
                        .lock()
                        .expect("coalescer mutex poisoned")
                        .settle(&result);
                    if !waiters.is_empty() {
                        debug!(waiters = waiters.len(), "draining coalesced callers");
                    }
                    for waiter in waiters {
                        let _ = waiter.send(result.clone());
                    }
                    result
                });
                handle
                    .await
                    .unwrap_or_else(|e| Err(CambioError::Data(format!("action task failed: {e}"))))
            }
        }
    }

    #[cfg(test)]
    fn pending_waiters(&self) -> usize {
        self.inner.lock().unwrap().waiters.len()
    }
}

enum Role {
    Initiator,
    Waiter(oneshot::Receiver<CallResult>),
    Cached(CallResult),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_action(
        calls: &Arc<AtomicUsize>,
        delay: Duration,
    ) -> impl Future<Output = CallResult> + Send + 'static {
        let calls = Arc::clone(calls);
        async move {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            tokio::time::sleep(delay).await;
            Ok(json!({"invocation": n}))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn five_calls_in_one_window_share_one_invocation() {
        let coalescer = Arc::new(Coalescer::new(Duration::from_millis(100)));
        let calls = Arc::new(AtomicUsize::new(0));

        let futs = (0..5).map(|_| {
            let coalescer = Arc::clone(&coalescer);
            let action = counting_action(&calls, Duration::from_millis(20));
            async move { coalescer.execute(action).await }
        });
        let results = futures::future::join_all(futs).await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        for result in results {
            assert_eq!(result.unwrap(), json!({"invocation": 1}));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn completed_result_is_served_from_cache_inside_the_window() {
        let coalescer = Coalescer::new(Duration::from_millis(100));
        let calls = Arc::new(AtomicUsize::new(0));

        let first = coalescer
            .execute(counting_action(&calls, Duration::ZERO))
            .await
            .unwrap();
        // Well inside the window: no second invocation.
        tokio::time::sleep(Duration::from_millis(10)).await;
        let second = coalescer
            .execute(counting_action(&calls, Duration::ZERO))
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(first, second);
    }

    #[tokio::test(start_paused = true)]
    async fn elapsed_window_triggers_a_fresh_invocation() {
        let coalescer = Coalescer::new(Duration::from_millis(100));
        let calls = Arc::new(AtomicUsize::new(0));

        coalescer
            .execute(counting_action(&calls, Duration::ZERO))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(150)).await;
        let result = coalescer
            .execute(counting_action(&calls, Duration::ZERO))
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(result, json!({"invocation": 2}));
    }

    #[tokio::test(start_paused = true)]
    async fn zero_window_disables_coalescing() {
        let coalescer = Coalescer::new(Duration::ZERO);
        let calls = Arc::new(AtomicUsize::new(0));

        coalescer
            .execute(counting_action(&calls, Duration::ZERO))
            .await
            .unwrap();
        coalescer
            .execute(counting_action(&calls, Duration::ZERO))
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn errors_are_shared_like_successes() {
        let coalescer = Arc::new(Coalescer::new(Duration::from_millis(100)));
        let calls = Arc::new(AtomicUsize::new(0));

        let action = {
            let calls = Arc::clone(&calls);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(20)).await;
                Err(CambioError::transport_status("request failed: /ticker", 503))
            }
        };
        let a = {
            let c = Arc::clone(&coalescer);
            tokio::spawn(async move { c.execute(action).await })
        };
        tokio::task::yield_now().await;
        let b = coalescer
            .execute(async { Ok(json!("never invoked")) })
            .await;

        let a = a.await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        for result in [a, b] {
            match result {
                Err(CambioError::Transport { status, .. }) => assert_eq!(status, Some(503)),
                other => panic!("unexpected result: {other:?}"),
            }
        }
    }

    #[tokio::test(flavor = "current_thread")]
    async fn queued_waiters_drain_last_registered_first() {
        let coalescer = Arc::new(Coalescer::new(Duration::from_secs(5)));
        let (release_tx, release_rx) = oneshot::channel::<()>();

        let initiator = {
            let c = Arc::clone(&coalescer);
            tokio::spawn(async move {
                c.execute(async move {
                    let _ = release_rx.await;
                    Ok(json!("shared"))
                })
                .await
            })
        };
        tokio::task::yield_now().await;

        let order = Arc::new(Mutex::new(Vec::new()));
        let mut waiters = Vec::new();
        for i in 0..3usize {
            let c = Arc::clone(&coalescer);
            let order = Arc::clone(&order);
            waiters.push(tokio::spawn(async move {
                let result = c.execute(async { Ok(json!("unused")) }).await;
                order.lock().unwrap().push(i);
                result
            }));
            // Let the waiter park itself before registering the next one.
            while coalescer.pending_waiters() <= i {
                tokio::task::yield_now().await;
            }
        }

        release_tx.send(()).unwrap();
        for waiter in waiters {
            assert_eq!(waiter.await.unwrap().unwrap(), json!("shared"));
        }
        initiator.await.unwrap().unwrap();

        assert_eq!(*order.lock().unwrap(), vec![2, 1, 0]);
    }
}
