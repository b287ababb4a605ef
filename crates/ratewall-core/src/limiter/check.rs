//! The check algorithm.

use crate::domain::{Decision, ListKind, Verdict};
use crate::error::LimiterError;
use crate::ports::CounterError;

use super::RateLimiter;

impl RateLimiter {
    /// Count one attempt by `id` and decide whether it may proceed.
    ///
    /// Whitelisted ids are allowed and blocklisted ids blocked without
    /// touching the counter; both report zero attempts. Otherwise the shared
    /// counter is incremented and the escalation policy applied once it
    /// reaches the block threshold. Counter failures other than the hard
    /// ceiling are returned as errors and no decision is made.
    pub async fn check(&self, id: &str) -> Result<Decision, LimiterError> {
        if self.lists.contains(ListKind::White, id).await {
            return Ok(Decision::new(0, Verdict::Allow));
        }
        if self.lists.contains(ListKind::Block, id).await {
            return Ok(self.blocked(0));
        }

        let key = self.counter_key(id);
        let block_times = self.config.block_times();
        let attempts = match self
            .counter
            .increment(&key, self.config.window(), block_times)
            .await
        {
            Ok(count) => count,
            Err(CounterError::LimitReached) => {
                tracing::debug!(limiter = %self.config.name(), id = %id, "Hard ceiling reached");
                return Ok(self.blocked(0));
            }
            Err(e) => return Err(e.into()),
        };

        if block_times > 0 && attempts >= block_times {
            self.escalate(id, &key).await?;
            return Ok(self.blocked(attempts));
        }

        if let Some(handler) = self.config.custom_handler() {
            return Ok(Decision::new(attempts, handler(attempts)));
        }

        tracing::trace!(limiter = %self.config.name(), id = %id, attempts, "Allowed");
        Ok(Decision::new(attempts, Verdict::Allow))
    }

    /// Drop the counter for `id`, so the next check starts from one.
    pub async fn check_reset(&self, id: &str) -> Result<(), LimiterError> {
        self.counter.delete(&self.counter_key(id)).await?;
        Ok(())
    }

    async fn escalate(&self, id: &str, key: &str) -> Result<(), LimiterError> {
        let duration = self.config.block_duration();
        if duration.is_zero() {
            tracing::info!(limiter = %self.config.name(), id = %id, "Threshold reached, blocklisting");
            match self.add_block_list(id, true).await {
                Err(e) if !e.is_already_exists() => return Err(e),
                _ => {}
            }
        } else {
            tracing::info!(
                limiter = %self.config.name(),
                id = %id,
                block_secs = duration.as_secs(),
                "Threshold reached, extending window"
            );
            self.counter.expire(key, duration).await?;
        }
        Ok(())
    }

    fn blocked(&self, attempts: u64) -> Decision {
        Decision::new(attempts, Verdict::Block(self.config.rejection().clone()))
    }
}
