use crate::domain::{ListOp, Notification};
use crate::error::LimiterError;

use super::RateLimiter;

impl RateLimiter {
    /// Apply a list change received from another instance.
    ///
    /// Behaves exactly like the matching add or remove with broadcasting
    /// off, so relayed changes are never re-published. Malformed messages and
    /// unknown op codes are ignored.
    pub async fn apply_notification(&self, message: &str) -> Result<(), LimiterError> {
        let Some(Notification { op, id }) = Notification::parse(message) else {
            tracing::trace!(limiter = %self.config.name(), message = %message, "Ignoring message");
            return Ok(());
        };

        tracing::debug!(limiter = %self.config.name(), op = op.code(), id = %id, "Applying relayed change");
        match op {
            ListOp::AddWhite | ListOp::AddBlock => self.add(op.kind(), &id, false).await,
            ListOp::RemoveWhite | ListOp::RemoveBlock => self.remove(op.kind(), &id, false).await,
        }
    }
}
