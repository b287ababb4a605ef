//! Window counter implementations.

mod memory;

pub use memory::InMemoryWindowCounter;

#[cfg(feature = "redis")]
mod redis;
#[cfg(feature = "redis")]
pub use self::redis::RedisWindowCounter;
