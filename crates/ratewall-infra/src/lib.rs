//! # Ratewall Infrastructure
//!
//! Concrete implementations of the ports defined in `ratewall-core`.
//!
//! ## Feature Flags
//!
//! - `redis` (default) - Redis window counter, membership store and pub/sub
//! - `minimal` - No external dependencies, in-memory only

pub mod backends;
pub mod connection;
pub mod counter;
pub mod membership;
pub mod pubsub;

pub use backends::{BackendError, Backends, Broadcast};
pub use connection::RedisConfig;

// Re-exports - In-Memory
pub use counter::InMemoryWindowCounter;
pub use membership::InMemoryMembershipStore;
pub use pubsub::InMemoryPubSub;

// Re-exports - Redis
#[cfg(feature = "redis")]
pub use counter::RedisWindowCounter;
#[cfg(feature = "redis")]
pub use membership::RedisMembershipStore;
#[cfg(feature = "redis")]
pub use pubsub::RedisPubSub;
