//! Typed key-value persistence over a fixed set of logical keys.
//!
//! Writes are atomic per key: a failed write leaves the previously persisted
//! value intact. Failures are reported as [`NodeError::Persistence`], never
//! panicked past this layer.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::core::Result;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// The seven logical keys the ledger persists under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreKey {
    User,
    Wallet,
    Earnings,
    Transactions,
    Referrals,
    Session,
    Settings,
}

impl StoreKey {
    pub const ALL: [StoreKey; 7] = [
        StoreKey::User,
        StoreKey::Wallet,
        StoreKey::Earnings,
        StoreKey::Transactions,
        StoreKey::Referrals,
        StoreKey::Session,
        StoreKey::Settings,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StoreKey::User => "dogenode_user_data",
            StoreKey::Wallet => "dogenode_wallet_data",
            StoreKey::Earnings => "dogenode_earnings",
            StoreKey::Transactions => "dogenode_transactions",
            StoreKey::Referrals => "dogenode_referrals",
            StoreKey::Session => "dogenode_session",
            StoreKey::Settings => "dogenode_settings",
        }
    }

    pub fn from_name(name: &str) -> Option<StoreKey> {
        StoreKey::ALL.iter().copied().find(|k| k.as_str() == name)
    }
}

pub trait PersistentStore: Send + Sync {
    fn set_raw(&self, key: StoreKey, value: serde_json::Value) -> Result<()>;
    fn get_raw(&self, key: StoreKey) -> Result<Option<serde_json::Value>>;
    fn remove(&self, key: StoreKey) -> Result<()>;
    /// Remove every known key. Unrelated data in the backing medium is left alone.
    fn clear(&self) -> Result<()>;
}

impl dyn PersistentStore {
    pub fn set<T: Serialize>(&self, key: StoreKey, value: &T) -> Result<()> {
        self.set_raw(key, serde_json::to_value(value)?)
    }

    pub fn get<T: DeserializeOwned>(&self, key: StoreKey) -> Result<Option<T>> {
        match self.get_raw(key)? {
            Some(raw) => Ok(Some(serde_json::from_value(raw)?)),
            None => Ok(None),
        }
    }
}
