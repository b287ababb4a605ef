//! In-process mirror of the whitelist and blocklist.

use tokio::sync::RwLock;

use crate::domain::ListKind;

/// Ordered, de-duplicated copies of both lists.
///
/// Locks are only held for in-memory work, never across a store call.
pub(crate) struct ListCache {
    white: RwLock<Vec<String>>,
    block: RwLock<Vec<String>>,
}

impl ListCache {
    pub(crate) fn new(white: Vec<String>, block: Vec<String>) -> Self {
        Self {
            white: RwLock::new(white),
            block: RwLock::new(block),
        }
    }

    fn list(&self, kind: ListKind) -> &RwLock<Vec<String>> {
        match kind {
            ListKind::White => &self.white,
            ListKind::Block => &self.block,
        }
    }

    pub(crate) async fn contains(&self, kind: ListKind, id: &str) -> bool {
        self.list(kind).read().await.iter().any(|entry| entry == id)
    }

    /// Append `id` unless present. Returns false when it was already there.
    pub(crate) async fn insert(&self, kind: ListKind, id: &str) -> bool {
        let mut list = self.list(kind).write().await;
        if list.iter().any(|entry| entry == id) {
            return false;
        }
        list.push(id.to_string());
        true
    }

    /// Remove the first entry equal to `id`. Returns false when absent.
    pub(crate) async fn remove(&self, kind: ListKind, id: &str) -> bool {
        let mut list = self.list(kind).write().await;
        match list.iter().position(|entry| entry == id) {
            Some(index) => {
                list.remove(index);
                true
            }
            None => false,
        }
    }

    /// A single-entry lookup when `id` is given, the whole list otherwise.
    pub(crate) async fn lookup(&self, kind: ListKind, id: Option<&str>) -> Vec<String> {
        let list = self.list(kind).read().await;
        match id {
            Some(id) => list
                .iter()
                .find(|entry| entry.as_str() == id)
                .cloned()
                .into_iter()
                .collect(),
            None => list.clone(),
        }
    }
}

/// Union of seed entries and stored members, seeds first, without duplicates.
pub(crate) fn merge(seed: &[String], stored: Vec<String>) -> Vec<String> {
    let mut merged: Vec<String> = Vec::with_capacity(seed.len() + stored.len());
    for id in seed.iter().cloned().chain(stored) {
        if !merged.contains(&id) {
            merged.push(id);
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_merge_is_union_in_order() {
        let merged = merge(&strings(&["a", "b", "a"]), strings(&["c", "b", "d"]));
        assert_eq!(merged, strings(&["a", "b", "c", "d"]));
    }

    #[tokio::test]
    async fn test_insert_and_remove() {
        let cache = ListCache::new(strings(&["a"]), Vec::new());

        assert!(!cache.insert(ListKind::White, "a").await);
        assert!(cache.insert(ListKind::White, "b").await);
        assert!(cache.contains(ListKind::White, "b").await);
        assert!(!cache.contains(ListKind::Block, "b").await);

        assert!(cache.remove(ListKind::White, "a").await);
        assert!(!cache.remove(ListKind::White, "a").await);
        assert_eq!(cache.lookup(ListKind::White, None).await, strings(&["b"]));
    }

    #[tokio::test]
    async fn test_lookup_single() {
        let cache = ListCache::new(Vec::new(), strings(&["x", "y"]));

        assert_eq!(cache.lookup(ListKind::Block, Some("y")).await, strings(&["y"]));
        assert!(cache.lookup(ListKind::Block, Some("z")).await.is_empty());
        assert!(cache.lookup(ListKind::White, None).await.is_empty());
    }
}
