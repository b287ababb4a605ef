//! Redis broadcast bus.
//!
//! `PUBLISH` goes over the shared managed connection. Each subscribed
//! channel owns a dedicated pub/sub connection driven by a background task
//! that reconnects with backoff when the connection drops, so an instance
//! keeps receiving list changes across Redis restarts.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use ratewall_core::ports::{PubSub, PubSubError, PubSubMessage, Publisher};

use crate::connection::{self, RedisConfig};

const MIN_BACKOFF: Duration = Duration::from_millis(250);
const MAX_BACKOFF: Duration = Duration::from_secs(30);

type Handler = Arc<dyn Fn(PubSubMessage) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

pub struct RedisPubSub {
    conn: ConnectionManager,
    client: Client,
    listeners: Mutex<HashMap<String, Vec<JoinHandle<()>>>>,
}

impl RedisPubSub {
    pub async fn new(config: &RedisConfig) -> Result<Self, PubSubError> {
        let (client, conn) = connection::open(config)
            .await
            .map_err(PubSubError::Connection)?;
        Ok(Self::with_connection(client, conn))
    }

    /// Share a client and managed connection opened elsewhere.
    pub fn with_connection(client: Client, conn: ConnectionManager) -> Self {
        Self {
            conn,
            client,
            listeners: Mutex::new(HashMap::new()),
        }
    }

    async fn open_subscription(
        client: &Client,
        channel: &str,
    ) -> redis::RedisResult<redis::aio::PubSub> {
        let mut pubsub = client.get_async_pubsub().await?;
        pubsub.subscribe(channel).await?;
        Ok(pubsub)
    }

    /// Pump `pubsub` into `handler`, reopening it whenever the stream ends.
    async fn listen(client: Client, channel: String, mut pubsub: redis::aio::PubSub, handler: Handler) {
        loop {
            {
                let mut stream = pubsub.on_message();
                while let Some(msg) = stream.next().await {
                    match msg.get_payload::<String>() {
                        Ok(payload) => {
                            handler(PubSubMessage {
                                channel: channel.clone(),
                                payload,
                            })
                            .await
                        }
                        Err(e) => tracing::warn!(channel = %channel, error = %e, "Dropping non-text payload"),
                    }
                }
            }

            tracing::warn!(channel = %channel, "Subscription stream ended, reconnecting");
            let mut backoff = MIN_BACKOFF;
            pubsub = loop {
                tokio::time::sleep(backoff).await;
                match Self::open_subscription(&client, &channel).await {
                    Ok(fresh) => {
                        tracing::info!(channel = %channel, "Resubscribed");
                        break fresh;
                    }
                    Err(e) => {
                        tracing::warn!(
                            channel = %channel,
                            error = %e,
                            retry_ms = backoff.as_millis() as u64,
                            "Resubscribe failed"
                        );
                        backoff = (backoff * 2).min(MAX_BACKOFF);
                    }
                }
            };
        }
    }
}

#[async_trait]
impl Publisher for RedisPubSub {
    async fn publish(&self, channel: &str, message: &str) -> Result<(), PubSubError> {
        let mut conn = self.conn.clone();
        let receivers: u64 = conn
            .publish(channel, message)
            .await
            .map_err(|e| PubSubError::Publish(e.to_string()))?;
        tracing::trace!(channel = %channel, receivers, "Published");
        Ok(())
    }
}

#[async_trait]
impl PubSub for RedisPubSub {
    /// The first subscription is made before returning, so a Redis outage
    /// at startup is reported instead of retried silently.
    async fn subscribe<F>(&self, channel: &str, handler: F) -> Result<(), PubSubError>
    where
        F: Fn(PubSubMessage) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync + 'static,
    {
        let pubsub = Self::open_subscription(&self.client, channel)
            .await
            .map_err(|e| PubSubError::Subscribe(e.to_string()))?;

        let task = tokio::spawn(Self::listen(
            self.client.clone(),
            channel.to_string(),
            pubsub,
            Arc::new(handler),
        ));

        self.listeners
            .lock()
            .await
            .entry(channel.to_string())
            .or_default()
            .push(task);
        tracing::debug!(channel = %channel, "Listening on Redis channel");
        Ok(())
    }

    async fn unsubscribe(&self, channel: &str) -> Result<(), PubSubError> {
        if let Some(tasks) = self.listeners.lock().await.remove(channel) {
            tasks.iter().for_each(JoinHandle::abort);
            tracing::debug!(channel = %channel, "Stopped listening on Redis channel");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_publish_reaches_subscriber() {
        let Ok(bus) = RedisPubSub::new(&connection::test_config()).await else {
            return;
        };

        let channel = "ratewall-test-relay";
        let (tx, mut rx) = mpsc::unbounded_channel();
        bus.subscribe(channel, move |msg| {
            let tx = tx.clone();
            Box::pin(async move {
                let _ = tx.send(msg.payload);
            })
        })
        .await
        .unwrap();

        bus.publish(channel, "ab-10.0.0.1").await.unwrap();
        let received = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .unwrap();
        assert_eq!(received.as_deref(), Some("ab-10.0.0.1"));

        bus.unsubscribe(channel).await.unwrap();
    }

    #[tokio::test]
    async fn test_new_fails_without_server() {
        let config = RedisConfig {
            url: "redis://127.0.0.1:1".to_string(),
            connect_timeout: Duration::from_millis(200),
            fallback_to_memory: false,
        };
        assert!(RedisPubSub::new(&config).await.is_err());
    }
}
