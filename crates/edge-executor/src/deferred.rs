//! Handle for data that resolves after the response has started.

use std::fmt::Display;
use std::future::Future;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Instant;

use edge_observability::StructuredLogger;
use tokio::task::JoinHandle;

/// Status of a deferred value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeferredStatus {
    /// Fetch still in flight.
    Pending,
    /// Fetch succeeded.
    Resolved,
    /// Fetch failed or panicked; the value is absent.
    Failed,
}

const PENDING: u8 = 0;
const RESOLVED: u8 = 1;
const FAILED: u8 = 2;

impl DeferredStatus {
    fn from_u8(v: u8) -> Self {
        match v {
            RESOLVED => Self::Resolved,
            FAILED => Self::Failed,
            _ => Self::Pending,
        }
    }
}

enum Inner<T> {
    Task(JoinHandle<Option<T>>),
    Ready(Option<T>),
}

/// A pending-or-resolved value that never surfaces an error.
///
/// The work runs on its own tokio task from the moment the handle is
/// created. Failures are logged at `warn` inside that task and become
/// `None`, so awaiting the handle is infallible.
pub struct Deferred<T> {
    name: &'static str,
    inner: Inner<T>,
    status: Arc<AtomicU8>,
}

impl<T: Send + 'static> Deferred<T> {
    /// Spawn `fut` and return a handle to its eventual value.
    pub fn spawn<F, E>(name: &'static str, logger: StructuredLogger, fut: F) -> Self
    where
        F: Future<Output = Result<T, E>> + Send + 'static,
        E: Display + Send + 'static,
    {
        let status = Arc::new(AtomicU8::new(PENDING));
        let task_status = status.clone();

        let handle = tokio::spawn(async move {
            let started = Instant::now();
            match fut.await {
                Ok(value) => {
                    task_status.store(RESOLVED, Ordering::Release);
                    logger
                        .debug_builder("Deferred data resolved")
                        .field("deferred", name)
                        .duration_ms("elapsed_ms", started.elapsed())
                        .emit();
                    Some(value)
                }
                Err(e) => {
                    task_status.store(FAILED, Ordering::Release);
                    logger
                        .warn_builder("Deferred data failed, rendering without it")
                        .field("deferred", name)
                        .field("error", e.to_string())
                        .duration_ms("elapsed_ms", started.elapsed())
                        .emit();
                    None
                }
            }
        });

        Self {
            name,
            inner: Inner::Task(handle),
            status,
        }
    }
}

impl<T> Deferred<T> {
    /// An already-settled handle. `None` counts as failed.
    pub fn ready(name: &'static str, value: Option<T>) -> Self {
        let status = if value.is_some() { RESOLVED } else { FAILED };
        Self {
            name,
            inner: Inner::Ready(value),
            status: Arc::new(AtomicU8::new(status)),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Current status, without blocking.
    pub fn status(&self) -> DeferredStatus {
        DeferredStatus::from_u8(self.status.load(Ordering::Acquire))
    }

    pub fn is_pending(&self) -> bool {
        self.status() == DeferredStatus::Pending
    }

    /// Wait for the value. Failures, panics and cancellation yield `None`.
    pub async fn resolve(self) -> Option<T> {
        match self.inner {
            Inner::Ready(value) => value,
            Inner::Task(handle) => match handle.await {
                Ok(value) => value,
                Err(e) => {
                    self.status.store(FAILED, Ordering::Release);
                    tracing::warn!(deferred = self.name, error = %e, "deferred task did not complete");
                    None
                }
            },
        }
    }

    /// Stop the underlying task if it is still running.
    pub fn cancel(self) {
        if let Inner::Task(handle) = self.inner {
            handle.abort();
        }
    }
}

impl<T> std::fmt::Debug for Deferred<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Deferred")
            .field("name", &self.name)
            .field("status", &self.status())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use edge_observability::{LogCapture, LogLevel, RequestId};
    use std::time::Duration;
    use tokio::sync::oneshot;

    fn logger() -> (StructuredLogger, LogCapture) {
        let capture = LogCapture::new();
        let logger =
            StructuredLogger::new(RequestId::from_string("req-d")).with_capture(capture.clone());
        (logger, capture)
    }

    #[tokio::test]
    async fn test_resolves_value() {
        let (logger, _) = logger();
        let deferred = Deferred::spawn("products", logger, async { Ok::<_, String>(vec![1, 2, 3]) });
        assert_eq!(deferred.resolve().await, Some(vec![1, 2, 3]));
    }

    #[tokio::test]
    async fn test_failure_becomes_none_and_logs_warn() {
        let (logger, capture) = logger();
        let deferred = Deferred::spawn("products", logger, async {
            Err::<Vec<u32>, _>("upstream timeout")
        });
        assert_eq!(deferred.resolve().await, None);

        let warns = capture.at_level(LogLevel::Warn);
        assert_eq!(warns.len(), 1);
        assert_eq!(warns[0].field("error").as_deref(), Some("upstream timeout"));
        assert_eq!(warns[0].field("deferred").as_deref(), Some("products"));
    }

    #[tokio::test]
    async fn test_panic_becomes_none() {
        let (logger, _) = logger();
        let deferred: Deferred<u32> = Deferred::spawn("products", logger, async {
            if true {
                panic!("boom");
            }
            Ok::<_, String>(1)
        });
        assert_eq!(deferred.resolve().await, None);
    }

    #[tokio::test]
    async fn test_status_tracks_task() {
        let (logger, _) = logger();
        let (tx, rx) = oneshot::channel::<u32>();
        let deferred = Deferred::spawn("products", logger, async move {
            rx.await.map_err(|e| e.to_string())
        });
        assert_eq!(deferred.status(), DeferredStatus::Pending);

        tx.send(9).unwrap();
        for _ in 0..50 {
            if !deferred.is_pending() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(deferred.status(), DeferredStatus::Resolved);
        assert_eq!(deferred.resolve().await, Some(9));
    }

    #[tokio::test]
    async fn test_cancel_stops_task() {
        let (logger, capture) = logger();
        let deferred = Deferred::spawn("products", logger, async {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok::<_, String>(1)
        });
        deferred.cancel();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(capture.entries().is_empty());
    }

    #[tokio::test]
    async fn test_ready() {
        let present = Deferred::ready("products", Some(4));
        assert_eq!(present.status(), DeferredStatus::Resolved);
        assert_eq!(present.resolve().await, Some(4));

        let absent: Deferred<u32> = Deferred::ready("products", None);
        assert_eq!(absent.status(), DeferredStatus::Failed);
        assert_eq!(absent.resolve().await, None);
    }
}
