//! In-process broadcast bus.
//!
//! Stands in for Redis when it is unavailable. Only limiters sharing the
//! same bus value see each other's changes, which is what the integration
//! tests rely on.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use async_trait::async_trait;
use tokio::sync::{Mutex, broadcast};
use tokio::task::JoinHandle;

use ratewall_core::ports::{PubSub, PubSubError, PubSubMessage, Publisher};

#[derive(Default)]
struct Channel {
    sender: Option<broadcast::Sender<String>>,
    listeners: Vec<JoinHandle<()>>,
}

pub struct InMemoryPubSub {
    channels: Mutex<HashMap<String, Channel>>,
    capacity: usize,
}

impl InMemoryPubSub {
    /// `capacity` is how many undelivered messages a slow listener may fall
    /// behind before it starts missing changes.
    pub fn new(capacity: usize) -> Self {
        Self {
            channels: Mutex::new(HashMap::new()),
            capacity,
        }
    }
}

impl Default for InMemoryPubSub {
    fn default() -> Self {
        Self::new(256)
    }
}

#[async_trait]
impl Publisher for InMemoryPubSub {
    async fn publish(&self, channel: &str, message: &str) -> Result<(), PubSubError> {
        let channels = self.channels.lock().await;
        let receivers = channels
            .get(channel)
            .and_then(|c| c.sender.as_ref())
            .and_then(|tx| tx.send(message.to_string()).ok())
            .unwrap_or(0);
        tracing::trace!(channel = %channel, receivers, "Published");
        Ok(())
    }
}

#[async_trait]
impl PubSub for InMemoryPubSub {
    async fn subscribe<F>(&self, channel: &str, handler: F) -> Result<(), PubSubError>
    where
        F: Fn(PubSubMessage) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync + 'static,
    {
        let mut channels = self.channels.lock().await;
        let entry = channels.entry(channel.to_string()).or_default();
        let mut rx = entry
            .sender
            .get_or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe();

        let name = channel.to_string();
        entry.listeners.push(tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(payload) => {
                        handler(PubSubMessage {
                            channel: name.clone(),
                            payload,
                        })
                        .await
                    }
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        tracing::warn!(channel = %name, missed, "Listener fell behind, changes lost");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }));

        tracing::debug!(channel = %channel, "Listening on in-memory channel");
        Ok(())
    }

    async fn unsubscribe(&self, channel: &str) -> Result<(), PubSubError> {
        if let Some(removed) = self.channels.lock().await.remove(channel) {
            removed.listeners.iter().for_each(JoinHandle::abort);
        }
        Ok(())
    }
}
