//! Local key-value storage backing the ledger.

use async_trait::async_trait;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::sync::RwLock;

use crate::ports::{KeyValueStore, LedgerError};

fn check_key(key: &str) -> Result<(), LedgerError> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '-');

    if valid {
        Ok(())
    } else {
        Err(LedgerError::InvalidKey(key.to_string()))
    }
}

/// Stores each key as `{dir}/{key}.json`. Writes go through a temporary
/// file and a rename so readers never observe a half-written value.
#[derive(Debug, Clone)]
pub struct FileKeyValueStore {
    dir: PathBuf,
}

impl FileKeyValueStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, LedgerError> {
        check_key(key)?;
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

#[async_trait]
impl KeyValueStore for FileKeyValueStore {
    async fn get_item(&self, key: &str) -> Result<Option<String>, LedgerError> {
        let path = self.path_for(key)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<(), LedgerError> {
        let path = self.path_for(key)?;
        tokio::fs::create_dir_all(&self.dir).await?;

        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, value).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }
}

/// Process-local storage, used when no data directory is configured and in tests.
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    items: RwLock<HashMap<String, String>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryKeyValueStore {
    async fn get_item(&self, key: &str) -> Result<Option<String>, LedgerError> {
        check_key(key)?;
        Ok(self.items.read().await.get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<(), LedgerError> {
        check_key(key)?;
        self.items
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_file_store_round_trips_values() {
        let dir = TempDir::new().unwrap();
        let store = FileKeyValueStore::new(dir.path().join("ledger"));

        assert_eq!(store.get_item("transactions").await.unwrap(), None);

        store.set_item("transactions", "[]").await.unwrap();
        assert_eq!(
            store.get_item("transactions").await.unwrap().as_deref(),
            Some("[]")
        );
        assert!(dir.path().join("ledger").join("transactions.json").exists());
        assert!(!dir.path().join("ledger").join("transactions.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_rejects_path_like_keys() {
        let dir = TempDir::new().unwrap();
        let store = FileKeyValueStore::new(dir.path());

        let result = store.set_item("../escape", "x").await;
        assert!(matches!(result, Err(LedgerError::InvalidKey(_))));
    }

    #[tokio::test]
    async fn test_memory_store_overwrites() {
        let store = MemoryKeyValueStore::new();
        store.set_item("transactions", "[1]").await.unwrap();
        store.set_item("transactions", "[2]").await.unwrap();
        assert_eq!(
            store.get_item("transactions").await.unwrap().as_deref(),
            Some("[2]")
        );
    }
}
