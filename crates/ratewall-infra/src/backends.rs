//! Backend selection and limiter wiring.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;

use ratewall_core::ports::{
    MembershipStore, PubSub, PubSubError, PubSubMessage, Publisher, WindowCounter,
};
use ratewall_core::{ConfigError, LimiterConfigBuilder, RateLimiter};

use crate::connection::RedisConfig;
use crate::counter::InMemoryWindowCounter;
use crate::membership::InMemoryMembershipStore;
use crate::pubsub::InMemoryPubSub;

#[cfg(feature = "redis")]
use crate::counter::RedisWindowCounter;
#[cfg(feature = "redis")]
use crate::membership::RedisMembershipStore;
#[cfg(feature = "redis")]
use crate::pubsub::RedisPubSub;

/// Backend setup errors.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("Redis unavailable: {0}")]
    Unavailable(String),
}

/// The broadcast bus in use.
///
/// [`PubSub`] has a generic `subscribe`, so it cannot be a trait object;
/// this enum stands in for one.
pub enum Broadcast {
    Memory(InMemoryPubSub),
    #[cfg(feature = "redis")]
    Redis(RedisPubSub),
}

#[async_trait]
impl Publisher for Broadcast {
    async fn publish(&self, channel: &str, message: &str) -> Result<(), PubSubError> {
        match self {
            Broadcast::Memory(bus) => bus.publish(channel, message).await,
            #[cfg(feature = "redis")]
            Broadcast::Redis(bus) => bus.publish(channel, message).await,
        }
    }
}

#[async_trait]
impl PubSub for Broadcast {
    async fn subscribe<F>(&self, channel: &str, handler: F) -> Result<(), PubSubError>
    where
        F: Fn(PubSubMessage) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync + 'static,
    {
        match self {
            Broadcast::Memory(bus) => bus.subscribe(channel, handler).await,
            #[cfg(feature = "redis")]
            Broadcast::Redis(bus) => bus.subscribe(channel, handler).await,
        }
    }

    async fn unsubscribe(&self, channel: &str) -> Result<(), PubSubError> {
        match self {
            Broadcast::Memory(bus) => bus.unsubscribe(channel).await,
            #[cfg(feature = "redis")]
            Broadcast::Redis(bus) => bus.unsubscribe(channel).await,
        }
    }
}

/// Everything a limiter needs from infrastructure.
#[derive(Clone)]
pub struct Backends {
    pub counter: Arc<dyn WindowCounter>,
    pub store: Arc<dyn MembershipStore>,
    pub broadcast: Arc<Broadcast>,
}

impl Backends {
    /// Single-process backends. Limits are not shared across instances.
    pub fn in_memory() -> Self {
        Self {
            counter: Arc::new(InMemoryWindowCounter::new()),
            store: Arc::new(InMemoryMembershipStore::new()),
            broadcast: Arc::new(Broadcast::Memory(InMemoryPubSub::default())),
        }
    }

    /// Redis-backed backends sharing one managed connection.
    ///
    /// Falls back to [`Backends::in_memory`] when Redis is unreachable and
    /// `fallback_to_memory` is set.
    pub async fn connect(config: &RedisConfig) -> Result<Self, BackendError> {
        match Self::connect_redis(config).await {
            Ok(backends) => Ok(backends),
            Err(e) if config.fallback_to_memory => {
                tracing::warn!(
                    error = %e,
                    "Redis unavailable, falling back to in-memory backends (limits are per-process)"
                );
                Ok(Self::in_memory())
            }
            Err(e) => Err(e),
        }
    }

    #[cfg(feature = "redis")]
    async fn connect_redis(config: &RedisConfig) -> Result<Self, BackendError> {
        let (client, conn) = crate::connection::open(config)
            .await
            .map_err(BackendError::Unavailable)?;

        tracing::info!(url = %config.url, "Connected to Redis backends");

        Ok(Self {
            counter: Arc::new(RedisWindowCounter::with_connection(conn.clone())),
            store: Arc::new(RedisMembershipStore::with_connection(conn.clone())),
            broadcast: Arc::new(Broadcast::Redis(RedisPubSub::with_connection(client, conn))),
        })
    }

    #[cfg(not(feature = "redis"))]
    async fn connect_redis(_config: &RedisConfig) -> Result<Self, BackendError> {
        Err(BackendError::Unavailable(
            "built without the redis feature".to_string(),
        ))
    }

    /// Build a limiter on these backends, publishing list changes on the bus.
    pub async fn build_limiter(
        &self,
        builder: LimiterConfigBuilder,
    ) -> Result<RateLimiter, ConfigError> {
        let config = builder.publisher(self.broadcast.clone()).build()?;
        Ok(RateLimiter::new(config, self.counter.clone(), self.store.clone()).await)
    }

    /// Relay list changes from other instances into `limiter`.
    pub async fn subscribe(&self, limiter: Arc<RateLimiter>) -> Result<(), PubSubError> {
        let channel = limiter.channel().to_string();
        self.broadcast
            .subscribe(&channel, move |msg| {
                let limiter = limiter.clone();
                Box::pin(async move {
                    match limiter.apply_notification(&msg.payload).await {
                        Ok(()) => {}
                        Err(e) if e.is_already_exists() => {
                            tracing::debug!(payload = %msg.payload, "Relayed change already applied");
                        }
                        Err(e) => {
                            tracing::warn!(
                                channel = %msg.channel,
                                payload = %msg.payload,
                                error = %e,
                                "Failed to apply relayed change"
                            );
                        }
                    }
                })
            })
            .await
    }
}
