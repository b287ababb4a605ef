//! Pub/Sub implementations.

mod memory;

pub use memory::InMemoryPubSub;

#[cfg(feature = "redis")]
mod redis;
#[cfg(feature = "redis")]
pub use self::redis::RedisPubSub;
