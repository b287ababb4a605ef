//! Membership store implementations.

mod memory;

pub use memory::InMemoryMembershipStore;

#[cfg(feature = "redis")]
mod redis;
#[cfg(feature = "redis")]
pub use self::redis::RedisMembershipStore;
