//! Broadcast port - how list changes reach the other instances.

use async_trait::async_trait;
use std::future::Future;
use std::pin::Pin;

/// A payload delivered on a channel.
#[derive(Debug, Clone)]
pub struct PubSubMessage {
    pub channel: String,
    pub payload: String,
}

/// Sending side of a broadcast bus.
///
/// Split from [`PubSub`] because `subscribe` is generic and the limiter
/// needs a trait object.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, channel: &str, message: &str) -> Result<(), PubSubError>;
}

/// Full broadcast bus, used by the host to feed relayed changes back in.
#[async_trait]
pub trait PubSub: Publisher {
    /// Deliver every message published on `channel` to `handler`, in order.
    async fn subscribe<F>(&self, channel: &str, handler: F) -> Result<(), PubSubError>
    where
        F: Fn(PubSubMessage) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync + 'static;

    /// Stop delivering `channel`. Unknown channels are a no-op.
    async fn unsubscribe(&self, channel: &str) -> Result<(), PubSubError>;
}

#[derive(Debug, thiserror::Error)]
pub enum PubSubError {
    #[error("publish failed: {0}")]
    Publish(String),

    #[error("subscribe failed: {0}")]
    Subscribe(String),

    #[error("connection error: {0}")]
    Connection(String),
}
