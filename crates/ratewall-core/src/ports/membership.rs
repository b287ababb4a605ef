use async_trait::async_trait;

/// Durable set storage backing the whitelist and blocklist.
#[async_trait]
pub trait MembershipStore: Send + Sync {
    /// List every member of the set at `set_key`. A missing set is empty.
    async fn members(&self, set_key: &str) -> Result<Vec<String>, StoreError>;

    /// Add `member` to the set. Adding an existing member succeeds.
    async fn add(&self, set_key: &str, member: &str) -> Result<(), StoreError>;

    /// Remove `member` from the set. Removing a missing member succeeds.
    async fn remove(&self, set_key: &str, member: &str) -> Result<(), StoreError>;
}

/// Membership store errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Operation failed: {0}")]
    Operation(String),
}
