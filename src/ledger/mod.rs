//! Typed ledger over the persistent store.
//!
//! All entities are exclusively owned by this layer: every read returns a
//! value copy and every mutation must be written back explicitly. Read
//! failures fall back to the entity default (logged, never panicked); write
//! failures propagate so the caller can treat the operation as "state
//! unchanged since the last successful write".

pub mod reset;
pub mod retention;

use crate::core::ids;
use crate::core::{NodeError, Result};
use crate::store::{PersistentStore, StoreKey};
use chrono::{DateTime, Utc};
use log::warn;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

pub const SCHEMA_VERSION: u32 = 1;
pub const MAX_EARNINGS: usize = 1000;
pub const MAX_TRANSACTIONS: usize = 500;
pub const SOURCE_MINING: &str = "mining";

pub const fn default_schema_version() -> u32 {
    1
}

// ============================================================================
// Records
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub id: String,
    pub balance: f64,
    pub total_earnings: f64,
    pub today_earnings: f64,
    pub total_withdrawals: u64,
    pub referral_count: u64,
    pub created_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
}

impl UserRecord {
    fn create(now: DateTime<Utc>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            id: ids::generate_user_id(),
            balance: 0.0,
            total_earnings: 0.0,
            today_earnings: 0.0,
            total_withdrawals: 0,
            referral_count: 0,
            created_at: now,
            last_active: now,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub is_active: bool,
    pub started_at: Option<DateTime<Utc>>,
    pub bandwidth: f64,
    pub uptime: u64,
}

impl Default for SessionRecord {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            is_active: false,
            started_at: None,
            bandwidth: 0.0,
            uptime: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EarningRecord {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub id: Uuid,
    pub amount: f64,
    pub source: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Deposit,
    Withdrawal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub amount: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
    pub status: TransactionStatus,
    pub timestamp: DateTime<Utc>,
}

/// Caller-supplied fields of a transaction; id and timestamp are generated
/// by the ledger on append.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub kind: TransactionKind,
    pub amount: f64,
    pub to_address: Option<String>,
    pub tx_hash: Option<String>,
    pub status: TransactionStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferredUser {
    pub id: String,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferralBook {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub code: String,
    pub referred: Vec<ReferredUser>,
    pub earnings: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletLink {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub address: String,
    pub wallet_type: String,
    pub connected_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsRecord {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub notifications: bool,
    pub auto_start: bool,
    pub language: String,
    pub theme: String,
}

impl Default for SettingsRecord {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            notifications: true,
            auto_start: false,
            language: "es".to_string(),
            theme: "light".to_string(),
        }
    }
}

// ============================================================================
// Schema versioning
// ============================================================================

trait Versioned {
    fn schema_version(&self) -> u32;
}

macro_rules! impl_versioned {
    ($($record:ty),+ $(,)?) => {
        $(impl Versioned for $record {
            fn schema_version(&self) -> u32 {
                self.schema_version
            }
        })+
    };
}

impl_versioned!(
    UserRecord,
    SessionRecord,
    EarningRecord,
    TransactionRecord,
    ReferralBook,
    WalletLink,
    SettingsRecord,
);

fn ensure_supported(version: u32) -> Result<()> {
    if version > SCHEMA_VERSION {
        return Err(NodeError::SchemaVersion {
            found: version,
            supported: SCHEMA_VERSION,
        });
    }
    Ok(())
}

// ============================================================================
// Ledger
// ============================================================================

pub struct Ledger {
    store: Arc<dyn PersistentStore>,
}

impl Ledger {
    pub fn new(store: Arc<dyn PersistentStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn PersistentStore> {
        &self.store
    }

    /// Read an entity, falling back to `default` when the key is absent or
    /// unreadable. A schema version newer than this build supports is the one
    /// read failure that propagates.
    fn read_or_else<T, F>(&self, key: StoreKey, default: F) -> Result<T>
    where
        T: DeserializeOwned + Versioned,
        F: FnOnce() -> T,
    {
        match self.store.get::<T>(key) {
            Ok(Some(record)) => {
                ensure_supported(record.schema_version())?;
                Ok(record)
            }
            Ok(None) => Ok(default()),
            Err(err) => {
                warn!("ledger read of {} failed, using default: {}", key.as_str(), err);
                Ok(default())
            }
        }
    }

    fn read_list<T>(&self, key: StoreKey) -> Result<Vec<T>>
    where
        T: DeserializeOwned + Versioned,
    {
        match self.store.get::<Vec<T>>(key) {
            Ok(Some(list)) => {
                for record in &list {
                    ensure_supported(record.schema_version())?;
                }
                Ok(list)
            }
            Ok(None) => Ok(Vec::new()),
            Err(err) => {
                warn!("ledger read of {} failed, using default: {}", key.as_str(), err);
                Ok(Vec::new())
            }
        }
    }

    // ------------------------------------------------------------------
    // User
    // ------------------------------------------------------------------

    /// The local user, created lazily (and persisted) on first access.
    pub fn user(&self) -> Result<UserRecord> {
        match self.store.get::<UserRecord>(StoreKey::User) {
            Ok(Some(user)) => {
                ensure_supported(user.schema_version())?;
                Ok(user)
            }
            Ok(None) => {
                let mut user = UserRecord::create(Utc::now());
                self.save_user(&mut user)?;
                Ok(user)
            }
            Err(err) => {
                warn!("ledger read of user failed, using default: {}", err);
                Ok(UserRecord::create(Utc::now()))
            }
        }
    }

    /// Persist the user, refreshing `last_active` in place.
    pub fn save_user(&self, user: &mut UserRecord) -> Result<()> {
        user.last_active = Utc::now();
        self.store.set(StoreKey::User, user)
    }

    /// Zero `today_earnings` if the local calendar day changed since the
    /// user's last activity. Runs once per load, before accrual resumes.
    pub fn apply_daily_reset(&self) -> Result<bool> {
        let mut user = self.user()?;
        if !reset::crossed_calendar_day(user.last_active, Utc::now()) {
            return Ok(false);
        }
        user.today_earnings = 0.0;
        self.save_user(&mut user)?;
        Ok(true)
    }

    // ------------------------------------------------------------------
    // Session
    // ------------------------------------------------------------------

    pub fn session(&self) -> Result<SessionRecord> {
        self.read_or_else(StoreKey::Session, SessionRecord::default)
    }

    pub fn save_session(&self, session: &SessionRecord) -> Result<()> {
        self.store.set(StoreKey::Session, session)
    }

    // ------------------------------------------------------------------
    // Earnings
    // ------------------------------------------------------------------

    pub fn earnings(&self) -> Result<Vec<EarningRecord>> {
        self.read_list(StoreKey::Earnings)
    }

    /// Prepend a new earning, enforce retention, persist.
    pub fn append_earning(&self, amount: f64, source: &str) -> Result<EarningRecord> {
        let record = EarningRecord {
            schema_version: SCHEMA_VERSION,
            id: Uuid::new_v4(),
            amount,
            source: source.to_string(),
            timestamp: Utc::now(),
        };
        let mut list = self.earnings()?;
        list.insert(0, record.clone());
        retention::enforce(&mut list, MAX_EARNINGS);
        self.store.set(StoreKey::Earnings, &list)?;
        Ok(record)
    }

    // ------------------------------------------------------------------
    // Transactions
    // ------------------------------------------------------------------

    pub fn transactions(&self) -> Result<Vec<TransactionRecord>> {
        self.read_list(StoreKey::Transactions)
    }

    /// Prepend a new transaction, enforce retention, persist.
    pub fn append_transaction(&self, new: NewTransaction) -> Result<TransactionRecord> {
        let record = TransactionRecord {
            schema_version: SCHEMA_VERSION,
            id: Uuid::new_v4(),
            kind: new.kind,
            amount: new.amount,
            to_address: new.to_address,
            tx_hash: new.tx_hash,
            status: new.status,
            timestamp: Utc::now(),
        };
        let mut list = self.transactions()?;
        list.insert(0, record.clone());
        retention::enforce(&mut list, MAX_TRANSACTIONS);
        self.store.set(StoreKey::Transactions, &list)?;
        Ok(record)
    }

    // ------------------------------------------------------------------
    // Referrals
    // ------------------------------------------------------------------

    /// The referral book; the code is generated once and persisted so it
    /// stays stable for the lifetime of the user record.
    pub fn referrals(&self) -> Result<ReferralBook> {
        match self.store.get::<ReferralBook>(StoreKey::Referrals) {
            Ok(Some(book)) => {
                ensure_supported(book.schema_version())?;
                Ok(book)
            }
            Ok(None) => {
                let book = ReferralBook {
                    schema_version: SCHEMA_VERSION,
                    code: ids::generate_referral_code(),
                    referred: Vec::new(),
                    earnings: 0.0,
                };
                self.store.set(StoreKey::Referrals, &book)?;
                Ok(book)
            }
            Err(err) => {
                warn!("ledger read of referrals failed, using default: {}", err);
                Ok(ReferralBook {
                    schema_version: SCHEMA_VERSION,
                    code: ids::generate_referral_code(),
                    referred: Vec::new(),
                    earnings: 0.0,
                })
            }
        }
    }

    pub fn add_referral(&self, referred_id: &str) -> Result<()> {
        let mut book = self.referrals()?;
        book.referred.push(ReferredUser {
            id: referred_id.to_string(),
            joined_at: Utc::now(),
        });
        self.store.set(StoreKey::Referrals, &book)?;

        let mut user = self.user()?;
        user.referral_count += 1;
        self.save_user(&mut user)
    }

    // ------------------------------------------------------------------
    // Wallet link
    // ------------------------------------------------------------------

    pub fn wallet(&self) -> Result<Option<WalletLink>> {
        match self.store.get::<WalletLink>(StoreKey::Wallet) {
            Ok(Some(link)) => {
                ensure_supported(link.schema_version())?;
                Ok(Some(link))
            }
            Ok(None) => Ok(None),
            Err(err) => {
                warn!("ledger read of wallet failed, using default: {}", err);
                Ok(None)
            }
        }
    }

    pub fn save_wallet(&self, link: &WalletLink) -> Result<()> {
        self.store.set(StoreKey::Wallet, link)
    }

    pub fn remove_wallet(&self) -> Result<()> {
        self.store.remove(StoreKey::Wallet)
    }

    // ------------------------------------------------------------------
    // Settings
    // ------------------------------------------------------------------

    pub fn settings(&self) -> Result<SettingsRecord> {
        self.read_or_else(StoreKey::Settings, SettingsRecord::default)
    }

    pub fn save_settings(&self, settings: &SettingsRecord) -> Result<()> {
        self.store.set(StoreKey::Settings, settings)
    }

    // ------------------------------------------------------------------
    // Export / import / clear
    // ------------------------------------------------------------------

    /// All persisted state as one JSON object, keyed by store key name.
    pub fn export(&self) -> Result<serde_json::Value> {
        let mut out = serde_json::Map::new();
        for key in StoreKey::ALL {
            if let Some(value) = self.store.get_raw(key)? {
                out.insert(key.as_str().to_string(), value);
            }
        }
        Ok(serde_json::Value::Object(out))
    }

    /// Import previously exported state. Unknown keys are ignored.
    pub fn import(&self, data: serde_json::Value) -> Result<()> {
        let object = data.as_object().ok_or_else(|| {
            NodeError::Persistence("import payload must be a JSON object".to_string())
        })?;
        for (name, value) in object {
            if let Some(key) = StoreKey::from_name(name) {
                self.store.set_raw(key, value.clone())?;
            }
        }
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        self.store.clear()
    }
}
