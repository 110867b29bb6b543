//! Key/value persistence for the local store strategy.

use std::{
    collections::HashMap,
    fs,
    path::PathBuf,
    sync::{Mutex, PoisonError, RwLock},
};

use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};

/// String key/value storage, in the spirit of a browser's `localStorage`.
pub trait LocalStorage: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>>;
    fn set_item(&self, key: &str, value: &str) -> Result<()>;
    fn remove_item(&self, key: &str) -> Result<()>;
}

#[derive(Debug, Default)]
pub struct MemoryLocalStorage {
    items: RwLock<HashMap<String, String>>,
}

impl MemoryLocalStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keys(&self) -> Vec<String> {
        let items = self.items.read().unwrap_or_else(PoisonError::into_inner);
        let mut keys: Vec<String> = items.keys().cloned().collect();
        keys.sort();
        keys
    }
}

impl LocalStorage for MemoryLocalStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let items = self.items.read().unwrap_or_else(PoisonError::into_inner);
        Ok(items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let mut items = self.items.write().unwrap_or_else(PoisonError::into_inner);
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        let mut items = self.items.write().unwrap_or_else(PoisonError::into_inner);
        items.remove(key);
        Ok(())
    }
}

const CURRENT_VERSION: u32 = 1;

#[derive(Serialize, Deserialize, Default)]
struct StoredItems {
    version: u32,
    items: HashMap<String, String>,
}

/// Local storage kept in a single JSON file.
#[derive(Debug)]
pub struct FileLocalStorage {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileLocalStorage {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    fn with_items<F>(&self, op: F) -> Result<()>
    where
        F: FnOnce(&mut HashMap<String, String>),
    {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| Error::Storage("Local storage lock poisoned".into()))?;
        let mut items = self.load_locked()?;
        op(&mut items);
        self.persist_locked(&items)
    }

    fn load_locked(&self) -> Result<HashMap<String, String>> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }

        let raw = fs::read(&self.path)?;
        if raw.is_empty() {
            return Ok(HashMap::new());
        }

        let stored: StoredItems = serde_json::from_slice(&raw)?;
        Ok(stored.items)
    }

    fn persist_locked(&self, items: &HashMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let stored = StoredItems {
            version: CURRENT_VERSION,
            items: items.clone(),
        };
        let serialized = serde_json::to_vec_pretty(&stored)?;

        // Write through a sibling file so a crash never leaves half a document.
        let tmp_path = self.path.with_extension("tmp");
        fs::write(&tmp_path, serialized)?;
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

impl LocalStorage for FileLocalStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| Error::Storage("Local storage lock poisoned".into()))?;
        Ok(self.load_locked()?.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.with_items(|items| {
            items.insert(key.to_string(), value.to_string());
        })
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.with_items(|items| {
            items.remove(key);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_file_storage_round_trip_across_instances() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("nested").join("local.json");

        let storage = FileLocalStorage::new(path.clone());
        storage.set_item("bigstep-api-keys-guest", "[]").unwrap();
        storage.set_item("other", "x").unwrap();
        storage.remove_item("other").unwrap();

        let reopened = FileLocalStorage::new(path);
        assert_eq!(
            reopened.get_item("bigstep-api-keys-guest").unwrap(),
            Some("[]".to_string())
        );
        assert_eq!(reopened.get_item("other").unwrap(), None);
    }

    #[test]
    fn test_file_storage_missing_file_is_empty() {
        let tmp = tempdir().unwrap();
        let storage = FileLocalStorage::new(tmp.path().join("absent.json"));
        assert_eq!(storage.get_item("anything").unwrap(), None);
    }
}
