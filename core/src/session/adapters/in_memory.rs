use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use tracing::debug;

use crate::session::store::{SessionStore, SessionStoreError};

/// In-memory implementation of SessionStore, lost when the process exits
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    /// Thread-safe storage of items
    items: Arc<RwLock<HashMap<String, String>>>,
}

impl InMemorySessionStore {
    /// Create a new, empty InMemorySessionStore
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get_item(&self, key: &str) -> Result<Option<String>, SessionStoreError> {
        let items = self.items.read().map_err(|e| {
            SessionStoreError::StorageError(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(items.get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<(), SessionStoreError> {
        let mut items = self.items.write().map_err(|e| {
            SessionStoreError::StorageError(format!("Failed to acquire write lock: {}", e))
        })?;

        items.insert(key.to_string(), value.to_string());
        debug!("Stored session item: {}", key);
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<Option<String>, SessionStoreError> {
        let mut items = self.items.write().map_err(|e| {
            SessionStoreError::StorageError(format!("Failed to acquire write lock: {}", e))
        })?;

        Ok(items.remove(key))
    }

    async fn clear(&self) -> Result<(), SessionStoreError> {
        let mut items = self.items.write().map_err(|e| {
            SessionStoreError::StorageError(format!("Failed to acquire write lock: {}", e))
        })?;

        let count = items.len();
        items.clear();
        debug!("Cleared {} session items", count);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::test;

    #[test]
    async fn test_set_and_get_item() {
        let store = InMemorySessionStore::new();

        store.set_item("user_phone", "9999900000").await.unwrap();
        assert_eq!(
            store.get_item("user_phone").await.unwrap(),
            Some("9999900000".to_string())
        );
        assert_eq!(store.get_item("user_name").await.unwrap(), None);

        store.set_item("user_phone", "8888800000").await.unwrap();
        assert_eq!(
            store.get_item("user_phone").await.unwrap(),
            Some("8888800000".to_string())
        );
    }

    #[test]
    async fn test_remove_and_clear() {
        let store = InMemorySessionStore::new();
        store.set_item("a", "1").await.unwrap();
        store.set_item("b", "2").await.unwrap();

        assert_eq!(store.remove_item("a").await.unwrap(), Some("1".to_string()));
        assert_eq!(store.remove_item("a").await.unwrap(), None);

        store.clear().await.unwrap();
        assert_eq!(store.get_item("b").await.unwrap(), None);
    }
}
