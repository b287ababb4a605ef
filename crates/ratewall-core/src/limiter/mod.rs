//! The distributed rate limiter.
//!
//! A [`RateLimiter`] combines a shared [`WindowCounter`] with locally mirrored
//! whitelist and blocklist entries. Counters are consistent across instances
//! because they live in the shared store; list mirrors converge through
//! broadcast notifications on the limiter's channel.

mod cache;
mod check;
mod config;
mod lists;
mod relay;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use crate::domain::{ListKind, Notification};
use crate::ports::{MembershipStore, WindowCounter};

use cache::ListCache;

pub use config::{CountHandler, LimiterConfig, LimiterConfigBuilder};

/// Shared-state rate limiter with whitelist and blocklist overrides.
pub struct RateLimiter {
    config: LimiterConfig,
    counter: Arc<dyn WindowCounter>,
    store: Arc<dyn MembershipStore>,
    lists: ListCache,
    white_key: String,
    block_key: String,
}

impl RateLimiter {
    /// Build a limiter, loading both lists from the membership store.
    ///
    /// Seed entries from the configuration are merged with stored members.
    /// A list that cannot be loaded starts from its seeds alone.
    pub async fn new(
        config: LimiterConfig,
        counter: Arc<dyn WindowCounter>,
        store: Arc<dyn MembershipStore>,
    ) -> Self {
        let white_key = ListKind::White.set_key(config.name());
        let block_key = ListKind::Block.set_key(config.name());

        let white = load_list(store.as_ref(), &white_key, config.white_list()).await;
        let block = load_list(store.as_ref(), &block_key, config.block_list()).await;

        tracing::info!(
            limiter = %config.name(),
            white = white.len(),
            block = block.len(),
            "Rate limiter initialized"
        );

        Self {
            lists: ListCache::new(white, block),
            config,
            counter,
            store,
            white_key,
            block_key,
        }
    }

    pub fn config(&self) -> &LimiterConfig {
        &self.config
    }

    /// Name of the broadcast channel list changes are published on.
    pub fn channel(&self) -> &str {
        self.config.name()
    }

    fn set_key(&self, kind: ListKind) -> &str {
        match kind {
            ListKind::White => &self.white_key,
            ListKind::Block => &self.block_key,
        }
    }

    fn counter_key(&self, id: &str) -> String {
        format!("{}:{}", self.config.name(), id)
    }

    /// Publish a list change. Failures are logged and otherwise ignored.
    async fn broadcast(&self, notification: Notification) {
        let Some(publisher) = self.config.publisher() else {
            return;
        };
        let message = notification.encode();
        if let Err(e) = publisher.publish(self.channel(), &message).await {
            tracing::warn!(
                limiter = %self.config.name(),
                message = %message,
                error = %e,
                "Failed to broadcast list change"
            );
        }
    }
}

async fn load_list(store: &dyn MembershipStore, set_key: &str, seed: &[String]) -> Vec<String> {
    match store.members(set_key).await {
        Ok(stored) => cache::merge(seed, stored),
        Err(e) => {
            tracing::warn!(key = %set_key, error = %e, "Failed to load list, using seeds only");
            cache::merge(seed, Vec::new())
        }
    }
}
