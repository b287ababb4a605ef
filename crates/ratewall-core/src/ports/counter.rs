//! Window counter port.

use async_trait::async_trait;
use std::time::Duration;

/// Atomic increment-with-expiry primitive shared by every limiter instance.
#[async_trait]
pub trait WindowCounter: Send + Sync {
    /// Increment the counter at `key` and return the post-increment count.
    ///
    /// The first increment starts a window of `window`; the key expires when it
    /// elapses. When `ceiling` is non-zero and the new count exceeds it, the
    /// call fails with [`CounterError::LimitReached`] instead of returning a count.
    async fn increment(&self, key: &str, window: Duration, ceiling: u64)
    -> Result<u64, CounterError>;

    /// Delete the counter at `key`. Deleting a missing key succeeds.
    async fn delete(&self, key: &str) -> Result<(), CounterError>;

    /// Override the remaining lifetime of the counter at `key`.
    async fn expire(&self, key: &str, ttl: Duration) -> Result<(), CounterError>;
}

/// Window counter errors.
#[derive(Debug, thiserror::Error)]
pub enum CounterError {
    /// The counter is already past its hard ceiling.
    #[error("reach limit")]
    LimitReached,

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Operation failed: {0}")]
    Operation(String),
}
