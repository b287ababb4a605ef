//! Redis set-backed membership store.

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;

use ratewall_core::ports::{MembershipStore, StoreError};

use crate::connection::{self, RedisConfig};

/// Redis-backed membership store using `SMEMBERS`, `SADD` and `SREM`.
pub struct RedisMembershipStore {
    conn: ConnectionManager,
}

impl RedisMembershipStore {
    pub async fn new(config: &RedisConfig) -> Result<Self, StoreError> {
        let (_, conn) = connection::open(config)
            .await
            .map_err(StoreError::Connection)?;

        tracing::info!(url = %config.url, "Connected to Redis membership store");

        Ok(Self::with_connection(conn))
    }

    /// Build on an existing managed connection.
    pub fn with_connection(conn: ConnectionManager) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl MembershipStore for RedisMembershipStore {
    async fn members(&self, set_key: &str) -> Result<Vec<String>, StoreError> {
        let mut conn = self.conn.clone();
        conn.smembers::<_, Vec<String>>(set_key)
            .await
            .map_err(|e| StoreError::Operation(e.to_string()))
    }

    async fn add(&self, set_key: &str, member: &str) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        conn.sadd::<_, _, ()>(set_key, member)
            .await
            .map_err(|e| StoreError::Operation(e.to_string()))?;
        Ok(())
    }

    async fn remove(&self, set_key: &str, member: &str) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        conn.srem::<_, _, ()>(set_key, member)
            .await
            .map_err(|e| StoreError::Operation(e.to_string()))?;
        Ok(())
    }
}
