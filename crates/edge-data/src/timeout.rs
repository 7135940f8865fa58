//! Timeout configuration for storefront queries.

use std::time::Duration;

/// Timeout configuration for a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeoutConfig {
    /// Connection timeout.
    pub connect: Duration,
    /// Total operation timeout, including retries.
    pub total: Duration,
}

impl TimeoutConfig {
    /// Create a new timeout configuration.
    pub fn new(connect: Duration, total: Duration) -> Self {
        Self { connect, total }
    }

    /// Create from a single total timeout.
    pub fn from_total(total: Duration) -> Self {
        Self {
            connect: total / 4,
            total,
        }
    }

    /// Create from a millisecond budget.
    pub fn from_millis(total_ms: u64) -> Self {
        Self::from_total(Duration::from_millis(total_ms))
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self::from_millis(2000)
    }
}

/// Error when a timeout is exceeded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimeoutError {
    #[error("Connection timeout after {0:?}")]
    Connect(Duration),

    #[error("Total timeout after {0:?}")]
    Total(Duration),
}

/// Run a future under a total timeout.
pub async fn with_timeout<F, T>(total: Duration, fut: F) -> Result<T, TimeoutError>
where
    F: std::future::Future<Output = T>,
{
    tokio::time::timeout(total, fut)
        .await
        .map_err(|_| TimeoutError::Total(total))
}
