use super::{PersistentStore, StoreKey};
use crate::core::{NodeError, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// File-backed store: one JSON document per key, written atomically via a
/// temp file in the same directory followed by a rename.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)
            .map_err(|e| NodeError::Persistence(format!("Failed to create data directory: {}", e)))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn key_path(&self, key: StoreKey) -> PathBuf {
        self.dir.join(format!("{}.json", key.as_str()))
    }
}

impl PersistentStore for FileStore {
    fn set_raw(&self, key: StoreKey, value: serde_json::Value) -> Result<()> {
        let serialized = serde_json::to_vec_pretty(&value)
            .map_err(|e| NodeError::Persistence(format!("Failed to serialize {}: {}", key.as_str(), e)))?;

        let mut temp = NamedTempFile::new_in(&self.dir)
            .map_err(|e| NodeError::Persistence(format!("Failed to create temp file: {}", e)))?;
        temp.write_all(&serialized)
            .map_err(|e| NodeError::Persistence(format!("Failed to write {}: {}", key.as_str(), e)))?;
        temp.as_file()
            .sync_all()
            .map_err(|e| NodeError::Persistence(format!("Failed to sync {}: {}", key.as_str(), e)))?;
        temp.persist(self.key_path(key))
            .map_err(|e| NodeError::Persistence(format!("Failed to persist {}: {}", key.as_str(), e)))?;
        Ok(())
    }

    fn get_raw(&self, key: StoreKey) -> Result<Option<serde_json::Value>> {
        let path = self.key_path(key);
        let data = match fs::read(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(NodeError::Persistence(format!(
                    "Failed to read {}: {}",
                    key.as_str(),
                    e
                )));
            }
        };
        let value = serde_json::from_slice(&data)
            .map_err(|e| NodeError::Persistence(format!("Failed to parse {}: {}", key.as_str(), e)))?;
        Ok(Some(value))
    }

    fn remove(&self, key: StoreKey) -> Result<()> {
        match fs::remove_file(self.key_path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(NodeError::Persistence(format!(
                "Failed to remove {}: {}",
                key.as_str(),
                e
            ))),
        }
    }

    fn clear(&self) -> Result<()> {
        for key in StoreKey::ALL {
            self.remove(key)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn set_get_round_trip_preserves_precision() {
        let dir = tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        let store: &dyn PersistentStore = &store;

        let amount = 0.1_f64 + 0.2_f64;
        store.set(StoreKey::User, &json!({ "balance": amount })).unwrap();
        let loaded: serde_json::Value = store.get(StoreKey::User).unwrap().unwrap();
        assert_eq!(loaded["balance"].as_f64().unwrap(), amount);
    }

    #[test]
    fn missing_key_reads_as_none() {
        let dir = tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        assert!(store.get_raw(StoreKey::Session).unwrap().is_none());
    }

    #[test]
    fn remove_is_idempotent() {
        let dir = tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        store.set_raw(StoreKey::Wallet, json!({"address": "D"})).unwrap();
        store.remove(StoreKey::Wallet).unwrap();
        store.remove(StoreKey::Wallet).unwrap();
        assert!(store.get_raw(StoreKey::Wallet).unwrap().is_none());
    }

    #[test]
    fn clear_removes_only_known_keys() {
        let dir = tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        store.set_raw(StoreKey::User, json!({"id": "u"})).unwrap();
        store.set_raw(StoreKey::Earnings, json!([])).unwrap();
        let stray = dir.path().join("unrelated.json");
        fs::write(&stray, b"{}").unwrap();

        store.clear().unwrap();

        assert!(store.get_raw(StoreKey::User).unwrap().is_none());
        assert!(store.get_raw(StoreKey::Earnings).unwrap().is_none());
        assert!(stray.exists());
    }

    #[test]
    fn corrupted_file_reports_persistence_error() {
        let dir = tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        fs::write(store.key_path(StoreKey::User), b"not json").unwrap();
        let err = store.get_raw(StoreKey::User).unwrap_err();
        assert!(matches!(err, NodeError::Persistence(_)));
    }
}
