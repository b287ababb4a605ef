//! In-memory membership store.
//!
//! This is a fallback when Redis is not available.
//! Note: Data is lost on process restart.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;

use ratewall_core::ports::{MembershipStore, StoreError};

/// In-memory set store using an async RwLock.
pub struct InMemoryMembershipStore {
    sets: RwLock<HashMap<String, BTreeSet<String>>>,
}

impl InMemoryMembershipStore {
    pub fn new() -> Self {
        Self {
            sets: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryMembershipStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MembershipStore for InMemoryMembershipStore {
    async fn members(&self, set_key: &str) -> Result<Vec<String>, StoreError> {
        let sets = self.sets.read().await;
        Ok(sets
            .get(set_key)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn add(&self, set_key: &str, member: &str) -> Result<(), StoreError> {
        let mut sets = self.sets.write().await;
        sets.entry(set_key.to_string())
            .or_default()
            .insert(member.to_string());
        Ok(())
    }

    async fn remove(&self, set_key: &str, member: &str) -> Result<(), StoreError> {
        let mut sets = self.sets.write().await;
        if let Some(set) = sets.get_mut(set_key) {
            set.remove(member);
            if set.is_empty() {
                sets.remove(set_key);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_add_is_idempotent() {
        let store = InMemoryMembershipStore::new();
        store.add("s", "a").await.unwrap();
        store.add("s", "a").await.unwrap();
        store.add("s", "b").await.unwrap();
        assert_eq!(store.members("s").await.unwrap(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_remove() {
        let store = InMemoryMembershipStore::new();
        store.add("s", "a").await.unwrap();
        store.remove("s", "a").await.unwrap();
        store.remove("s", "missing").await.unwrap();
        store.remove("other", "a").await.unwrap();
        assert!(store.members("s").await.unwrap().is_empty());
    }
}
