//! In-memory window counter - used as fallback when Redis is unavailable.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;

use ratewall_core::ports::{CounterError, WindowCounter};

struct CounterEntry {
    count: u64,
    expires_at: Instant,
}

/// In-memory fixed-window counter.
///
/// Counts are per-process, so limits are not shared across instances.
/// Expired entries are dropped lazily on the next access to their key.
pub struct InMemoryWindowCounter {
    store: Mutex<HashMap<String, CounterEntry>>,
}

impl InMemoryWindowCounter {
    pub fn new() -> Self {
        Self {
            store: Mutex::new(HashMap::new()),
        }
    }

    fn is_expired(entry: &CounterEntry) -> bool {
        Instant::now() >= entry.expires_at
    }

    /// Current count at `key`, if it has not expired.
    pub async fn current(&self, key: &str) -> Option<u64> {
        let store = self.store.lock().await;
        store
            .get(key)
            .filter(|entry| !Self::is_expired(entry))
            .map(|entry| entry.count)
    }
}

impl Default for InMemoryWindowCounter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WindowCounter for InMemoryWindowCounter {
    async fn increment(
        &self,
        key: &str,
        window: Duration,
        ceiling: u64,
    ) -> Result<u64, CounterError> {
        let mut store = self.store.lock().await;

        let entry = store
            .entry(key.to_string())
            .and_modify(|entry| {
                if Self::is_expired(entry) {
                    entry.count = 0;
                    entry.expires_at = Instant::now() + window;
                }
            })
            .or_insert_with(|| CounterEntry {
                count: 0,
                expires_at: Instant::now() + window,
            });

        entry.count += 1;
        if ceiling > 0 && entry.count > ceiling {
            return Err(CounterError::LimitReached);
        }
        Ok(entry.count)
    }

    async fn delete(&self, key: &str) -> Result<(), CounterError> {
        self.store.lock().await.remove(key);
        Ok(())
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<(), CounterError> {
        let mut store = self.store.lock().await;
        match store.get_mut(key) {
            Some(entry) if !Self::is_expired(entry) => {
                entry.expires_at = Instant::now() + ttl;
            }
            Some(_) => {
                store.remove(key);
            }
            None => {}
        }
        Ok(())
    }
}
