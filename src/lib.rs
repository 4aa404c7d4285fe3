// ============================================================================
// DogeNode Library
// ============================================================================
//
// Simulated passive accrual of a virtual currency balance for a single local
// user, with a persistent ledger that survives reloads. The ledger is
// advisory and local, not authoritative.

pub mod core;
pub mod engine;
pub mod facade;
pub mod ledger;
pub mod observer;
pub mod price;
pub mod store;
pub mod wallet;

// Re-export main types for convenience
pub use crate::core::{NodeError, Result};
pub use crate::engine::rng::{Sampler, SeededSampler, ThreadSampler};
pub use crate::engine::{AccrualEngine, EngineConfig, EngineState, TickOutcome};
pub use crate::facade::Node;
pub use crate::ledger::{
    EarningRecord, Ledger, NewTransaction, ReferralBook, SessionRecord, SettingsRecord,
    TransactionKind, TransactionRecord, TransactionStatus, UserRecord, WalletLink,
};
pub use crate::observer::{NodeObserver, NullObserver, StatsSnapshot};
pub use crate::price::PriceFeed;
pub use crate::store::{FileStore, MemoryStore, PersistentStore, StoreKey};
pub use crate::wallet::{
    ConnectOptions, SimulatedWallet, WalletBridge, WalletInfo, WithdrawalProcessor,
    WithdrawalReceipt,
};
