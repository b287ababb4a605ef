use serde::{Deserialize, Serialize};

/// What a blocked caller is told.
///
/// Every limiter reports one configured rejection on block; the default is
/// [`Rejection::forbidden`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rejection {
    /// HTTP-style status code hosts may surface.
    pub status: u16,
    pub message: String,
}

impl Rejection {
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn forbidden() -> Self {
        Self::new(403, "forbidden")
    }

    pub fn too_many_requests() -> Self {
        Self::new(429, "too many requests")
    }
}

impl Default for Rejection {
    fn default() -> Self {
        Self::forbidden()
    }
}

/// Outcome of a single check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Allow,
    /// Allowed, with a note from the custom handler.
    Warn(String),
    Block(Rejection),
}

/// Result of [`crate::RateLimiter::check`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    /// Post-increment count, or 0 when a list or the hard ceiling decided.
    pub attempts: u64,
    pub verdict: Verdict,
}

impl Decision {
    pub fn new(attempts: u64, verdict: Verdict) -> Self {
        Self { attempts, verdict }
    }

    pub fn is_allowed(&self) -> bool {
        !self.is_blocked()
    }

    pub fn is_blocked(&self) -> bool {
        matches!(self.verdict, Verdict::Block(_))
    }

    pub fn rejection(&self) -> Option<&Rejection> {
        match &self.verdict {
            Verdict::Block(rejection) => Some(rejection),
            _ => None,
        }
    }
}
