//! Redis window counter using an atomic increment script.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Script};

use ratewall_core::ports::{CounterError, WindowCounter};

use crate::connection::{self, RedisConfig};

/// Returned by the script when the count is past the ceiling.
const LIMIT_REACHED: i64 = -1;

/// Redis-backed fixed-window counter shared by every instance.
pub struct RedisWindowCounter {
    conn: ConnectionManager,
    /// Lua script for atomic increment with expiry
    script: Script,
}

impl RedisWindowCounter {
    pub async fn new(config: &RedisConfig) -> Result<Self, CounterError> {
        let (_, conn) = connection::open(config)
            .await
            .map_err(CounterError::Connection)?;

        tracing::info!(url = %config.url, "Connected to Redis window counter");

        Ok(Self::with_connection(conn))
    }

    /// Build on an existing managed connection.
    pub fn with_connection(conn: ConnectionManager) -> Self {
        // Returns the post-increment count, or -1 past the ceiling.
        // A key without a TTL gets the window, so a lost PEXPIRE cannot
        // leave a counter that never resets.
        let script = Script::new(
            r#"
            local current = redis.call('INCR', KEYS[1])
            if redis.call('PTTL', KEYS[1]) == -1 then
                redis.call('PEXPIRE', KEYS[1], ARGV[1])
            end

            local ceiling = tonumber(ARGV[2])
            if ceiling > 0 and current > ceiling then
                return -1
            end
            return current
            "#,
        );

        Self { conn, script }
    }
}

fn millis(duration: Duration) -> i64 {
    (duration.as_millis() as i64).max(1)
}

#[async_trait]
impl WindowCounter for RedisWindowCounter {
    async fn increment(
        &self,
        key: &str,
        window: Duration,
        ceiling: u64,
    ) -> Result<u64, CounterError> {
        let mut conn = self.conn.clone();

        let result: i64 = self
            .script
            .key(key)
            .arg(millis(window))
            .arg(ceiling)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| CounterError::Operation(e.to_string()))?;

        if result == LIMIT_REACHED {
            return Err(CounterError::LimitReached);
        }
        Ok(result as u64)
    }

    async fn delete(&self, key: &str) -> Result<(), CounterError> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(key)
            .await
            .map_err(|e| CounterError::Operation(e.to_string()))?;
        Ok(())
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<(), CounterError> {
        let mut conn = self.conn.clone();
        conn.pexpire::<_, ()>(key, millis(ttl))
            .await
            .map_err(|e| CounterError::Operation(e.to_string()))?;
        Ok(())
    }
}
