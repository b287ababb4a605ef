//! Limiter-level error types.

use thiserror::Error;

use crate::domain::ListKind;
use crate::ports::{CounterError, StoreError};

/// Invalid limiter configuration, reported at construction.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Limiter name must not be empty")]
    EmptyName,

    #[error("Window duration must be greater than zero")]
    ZeroWindow,
}

/// Errors returned by limiter operations.
///
/// A blocked identifier is not an error; see [`crate::Verdict::Block`].
#[derive(Debug, Error)]
pub enum LimiterError {
    /// The identifier was already present in the target list.
    #[error("{0} exists")]
    AlreadyExists(ListKind),

    #[error("Counter backend failed: {0}")]
    Counter(#[from] CounterError),

    #[error("Membership store failed: {0}")]
    Membership(#[from] StoreError),
}

impl LimiterError {
    /// True for the duplicate-add signal, which callers usually treat as success.
    pub fn is_already_exists(&self) -> bool {
        matches!(self, LimiterError::AlreadyExists(_))
    }
}
