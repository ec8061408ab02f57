//! In-memory draft store for tests and single-process use.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::store::traits::OnboardingStore;

/// `HashMap`-backed [`OnboardingStore`]. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<(String, String), String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries across all scopes.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl OnboardingStore for MemoryStore {
    async fn get(&self, scope: &str, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.entries.read().await;
        Ok(entries.get(&(scope.to_string(), key.to_string())).cloned())
    }

    async fn set(&self, scope: &str, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.write().await;
        entries.insert((scope.to_string(), key.to_string()), value.to_string());
        Ok(())
    }

    async fn remove(&self, scope: &str, key: &str) -> Result<bool, StoreError> {
        let mut entries = self.entries.write().await;
        Ok(entries
            .remove(&(scope.to_string(), key.to_string()))
            .is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_get_remove() {
        let store = MemoryStore::new();
        assert!(store.get("s1", "k").await.unwrap().is_none());

        store.set("s1", "k", "v1").await.unwrap();
        store.set("s1", "k", "v2").await.unwrap();
        assert_eq!(store.get("s1", "k").await.unwrap().as_deref(), Some("v2"));
        assert_eq!(store.len().await, 1);

        assert!(store.remove("s1", "k").await.unwrap());
        assert!(!store.remove("s1", "k").await.unwrap());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn scopes_are_isolated() {
        let store = MemoryStore::new();
        store.set("a", "k", "one").await.unwrap();
        store.set("b", "k", "two").await.unwrap();
        assert_eq!(store.get("a", "k").await.unwrap().as_deref(), Some("one"));
        assert_eq!(store.get("b", "k").await.unwrap().as_deref(), Some("two"));
    }
}
