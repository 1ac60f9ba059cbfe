use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use crate::session::store::{SessionStore, SessionStoreError};

/// SessionStore persisted as a flat TOML table, so `register` and `chat`
/// can run as separate invocations
#[derive(Debug)]
pub struct FileSessionStore {
    path: PathBuf,
    /// Serializes read-modify-write cycles on the file
    lock: Mutex<()>,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_items(&self) -> Result<BTreeMap<String, String>, SessionStoreError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }

        let content = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            SessionStoreError::StorageError(format!(
                "Failed to read session file {}: {}",
                self.path.display(),
                e
            ))
        })?;

        toml::from_str(&content).map_err(|e| {
            SessionStoreError::SerializationError(format!("Failed to parse session file: {}", e))
        })
    }

    async fn write_items(&self, items: &BTreeMap<String, String>) -> Result<(), SessionStoreError> {
        let content = toml::to_string(items).map_err(|e| {
            SessionStoreError::SerializationError(format!("Failed to serialize session: {}", e))
        })?;

        // Ensure the directory exists
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                SessionStoreError::StorageError(format!(
                    "Failed to create session directory: {}",
                    e
                ))
            })?;
        }

        tokio::fs::write(&self.path, content).await.map_err(|e| {
            SessionStoreError::StorageError(format!(
                "Failed to write session file {}: {}",
                self.path.display(),
                e
            ))
        })
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn get_item(&self, key: &str) -> Result<Option<String>, SessionStoreError> {
        let _guard = self.lock.lock().await;
        let mut items = self.read_items().await?;
        Ok(items.remove(key))
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<(), SessionStoreError> {
        let _guard = self.lock.lock().await;
        let mut items = self.read_items().await?;
        items.insert(key.to_string(), value.to_string());
        self.write_items(&items).await?;
        debug!("Stored session item {} in {}", key, self.path.display());
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<Option<String>, SessionStoreError> {
        let _guard = self.lock.lock().await;
        let mut items = self.read_items().await?;
        let removed = items.remove(key);
        if removed.is_some() {
            self.write_items(&items).await?;
        }
        Ok(removed)
    }

    async fn clear(&self) -> Result<(), SessionStoreError> {
        let _guard = self.lock.lock().await;
        if self.path.exists() {
            tokio::fs::remove_file(&self.path).await.map_err(|e| {
                SessionStoreError::StorageError(format!(
                    "Failed to remove session file {}: {}",
                    self.path.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }
}
