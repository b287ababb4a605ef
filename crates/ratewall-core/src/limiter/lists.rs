//! Whitelist and blocklist mutation and queries.

use crate::domain::{ListKind, ListOp, Notification};
use crate::error::LimiterError;

use super::RateLimiter;

impl RateLimiter {
    /// Add `id` to a list, persisting it before updating the local mirror.
    ///
    /// Returns [`LimiterError::AlreadyExists`] when the mirror already held
    /// `id`; the store add is idempotent and is still performed. On a store
    /// failure the mirror is left untouched. The change is published when
    /// `broadcast` is set and a publisher is configured.
    pub async fn add(&self, kind: ListKind, id: &str, broadcast: bool) -> Result<(), LimiterError> {
        self.store.add(self.set_key(kind), id).await?;

        if !self.lists.insert(kind, id).await {
            tracing::debug!(limiter = %self.config.name(), list = %kind, id = %id, "Already listed");
            return Err(LimiterError::AlreadyExists(kind));
        }

        tracing::info!(limiter = %self.config.name(), list = %kind, id = %id, "Listed");
        if broadcast {
            self.broadcast(Notification::new(ListOp::add(kind), id)).await;
        }
        Ok(())
    }

    /// Remove `id` from a list. Removing an absent id succeeds.
    ///
    /// Removing from the blocklist also resets the id's counter.
    pub async fn remove(
        &self,
        kind: ListKind,
        id: &str,
        broadcast: bool,
    ) -> Result<(), LimiterError> {
        self.store.remove(self.set_key(kind), id).await?;

        if self.lists.remove(kind, id).await {
            tracing::info!(limiter = %self.config.name(), list = %kind, id = %id, "Unlisted");
        }
        if broadcast {
            self.broadcast(Notification::new(ListOp::remove(kind), id)).await;
        }
        if kind == ListKind::Block {
            self.check_reset(id).await?;
        }
        Ok(())
    }

    pub async fn add_white_list(&self, id: &str, broadcast: bool) -> Result<(), LimiterError> {
        self.add(ListKind::White, id, broadcast).await
    }

    pub async fn add_block_list(&self, id: &str, broadcast: bool) -> Result<(), LimiterError> {
        self.add(ListKind::Block, id, broadcast).await
    }

    pub async fn remove_white_list(&self, id: &str, broadcast: bool) -> Result<(), LimiterError> {
        self.remove(ListKind::White, id, broadcast).await
    }

    pub async fn remove_block_list(&self, id: &str, broadcast: bool) -> Result<(), LimiterError> {
        self.remove(ListKind::Block, id, broadcast).await
    }

    /// Query the local mirror of a list.
    ///
    /// With `Some(id)` the result holds `id` if listed and is empty otherwise;
    /// with `None` it is the whole list.
    pub async fn list(&self, kind: ListKind, id: Option<&str>) -> Vec<String> {
        self.lists.lookup(kind, id).await
    }

    pub async fn white_list(&self, id: Option<&str>) -> Vec<String> {
        self.list(ListKind::White, id).await
    }

    pub async fn block_list(&self, id: Option<&str>) -> Vec<String> {
        self.list(ListKind::Block, id).await
    }
}
