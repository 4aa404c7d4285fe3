use super::{PersistentStore, StoreKey};
use crate::core::{NodeError, Result};
use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

/// In-memory store for tests and embedders that do not need durability.
///
/// Writes can be made to fail on demand to exercise the persistence-failure
/// paths of callers.
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<StoreKey, serde_json::Value>>,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// When enabled, every subsequent write reports a persistence failure
    /// and leaves the stored value untouched.
    pub fn set_failing(&self, failing: bool) {
        self.fail_writes.store(failing, Ordering::SeqCst);
    }
}

impl PersistentStore for MemoryStore {
    fn set_raw(&self, key: StoreKey, value: serde_json::Value) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(NodeError::Persistence(format!(
                "Simulated write failure for {}",
                key.as_str()
            )));
        }
        let mut entries = self
            .entries
            .write()
            .map_err(|e| NodeError::Persistence(e.to_string()))?;
        entries.insert(key, value);
        Ok(())
    }

    fn get_raw(&self, key: StoreKey) -> Result<Option<serde_json::Value>> {
        let entries = self
            .entries
            .read()
            .map_err(|e| NodeError::Persistence(e.to_string()))?;
        Ok(entries.get(&key).cloned())
    }

    fn remove(&self, key: StoreKey) -> Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| NodeError::Persistence(e.to_string()))?;
        entries.remove(&key);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| NodeError::Persistence(e.to_string()))?;
        entries.clear();
        Ok(())
    }
}
