//! # Ratewall Core
//!
//! The decision layer of Ratewall.
//! This crate holds the limiter algorithm and the ports it needs from
//! infrastructure: a window counter, a membership store and a pub/sub channel.
//! It has no storage or transport dependencies of its own.

pub mod domain;
pub mod error;
pub mod limiter;
pub mod ports;

pub use domain::{Decision, ListKind, ListOp, Notification, Rejection, Verdict};
pub use error::{ConfigError, LimiterError};
pub use limiter::{LimiterConfig, LimiterConfigBuilder, RateLimiter};
