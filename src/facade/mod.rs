//! High-level client API tying the ledger, engine and wallet together.

use crate::core::{NodeError, Result};
use crate::engine::rng::{Sampler, ThreadSampler};
use crate::engine::{AccrualEngine, EngineConfig, EngineState};
use crate::ledger::{Ledger, TransactionRecord, WalletLink};
use crate::observer::{NodeObserver, NullObserver, StatsSnapshot};
use crate::price::PriceFeed;
use crate::store::{FileStore, PersistentStore};
use crate::wallet::{
    ConnectOptions, SimulatedWallet, WalletBridge, WalletInfo, WithdrawalProcessor,
    WithdrawalReceipt,
};
use chrono::Utc;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::warn;

/// A local accrual node over a persistent ledger.
///
/// Opening a node runs the full load sequence: the user record is created
/// lazily if absent, the daily reset is applied exactly once, the referral
/// code is ensured, and a session that was active at last shutdown resumes
/// accruing immediately (preserving its counters).
///
/// # Examples
///
/// ```no_run
/// use dogenode::Node;
///
/// # async fn demo() -> dogenode::Result<()> {
/// let mut node = Node::open_dir(".dogenode").await?;
/// node.start().await?;
/// let stats = node.stats().await?;
/// println!("balance: {:.2}", stats.balance);
/// node.stop().await?;
/// # Ok(())
/// # }
/// ```
pub struct Node {
    ledger: Arc<Mutex<Ledger>>,
    engine: AccrualEngine,
    processor: WithdrawalProcessor,
    bridge: Arc<dyn WalletBridge>,
    observer: Arc<dyn NodeObserver>,
    price: Arc<Mutex<PriceFeed>>,
}

impl Node {
    /// Open with every collaborator supplied explicitly.
    pub async fn open(
        store: Arc<dyn PersistentStore>,
        bridge: Arc<dyn WalletBridge>,
        observer: Arc<dyn NodeObserver>,
        sampler: Box<dyn Sampler>,
        config: EngineConfig,
    ) -> Result<Self> {
        let ledger = Arc::new(Mutex::new(Ledger::new(store)));

        let auto_start = {
            let ledger = ledger.lock().await;
            ledger.user()?;
            ledger.apply_daily_reset()?;
            ledger.referrals()?;
            ledger.settings()?.auto_start
        };

        let price = Arc::new(Mutex::new(PriceFeed::new()));
        let engine = AccrualEngine::new(
            ledger.clone(),
            observer.clone(),
            sampler,
            price.clone(),
            config,
        );
        let processor = WithdrawalProcessor::new(ledger.clone(), bridge.clone());

        let mut node = Self {
            ledger,
            engine,
            processor,
            bridge,
            observer,
            price,
        };

        let resumed = node.engine.resume().await?;
        if !resumed && auto_start {
            node.engine.start().await?;
        }
        Ok(node)
    }

    /// Open a file-backed node with default collaborators: a simulated
    /// wallet, no observer, the thread-local sampler.
    pub async fn open_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        Self::open(
            Arc::new(FileStore::open(dir)?),
            Arc::new(SimulatedWallet::new()),
            Arc::new(NullObserver),
            Box::new(ThreadSampler),
            EngineConfig::default(),
        )
        .await
    }

    pub fn state(&self) -> EngineState {
        self.engine.state()
    }

    pub async fn start(&mut self) -> Result<()> {
        self.engine.start().await?;
        self.notify_stats().await;
        Ok(())
    }

    pub async fn stop(&mut self) -> Result<()> {
        self.engine.stop().await?;
        self.notify_stats().await;
        Ok(())
    }

    pub async fn toggle(&mut self) -> Result<EngineState> {
        match self.engine.state() {
            EngineState::Active => self.stop().await?,
            EngineState::Idle => self.start().await?,
        }
        Ok(self.engine.state())
    }

    pub async fn stats(&self) -> Result<StatsSnapshot> {
        let ledger = self.ledger.lock().await;
        let price = self.price.lock().await;
        StatsSnapshot::collect(&ledger, &price)
    }

    pub async fn withdraw(&self, to_address: &str, amount: f64) -> Result<WithdrawalReceipt> {
        let receipt = self.processor.withdraw(to_address, amount).await?;
        self.observer.transactions_changed();
        self.notify_stats().await;
        Ok(receipt)
    }

    pub async fn recent_transactions(&self, limit: usize) -> Result<Vec<TransactionRecord>> {
        let ledger = self.ledger.lock().await;
        let mut list = ledger.transactions()?;
        list.truncate(limit);
        Ok(list)
    }

    pub async fn referral_link(&self, base_url: &str) -> Result<String> {
        let ledger = self.ledger.lock().await;
        let book = ledger.referrals()?;
        Ok(format!("{}?ref={}", base_url, book.code))
    }

    // ------------------------------------------------------------------
    // Wallet bridge events
    // ------------------------------------------------------------------

    /// Connect the external wallet and persist the link.
    pub async fn connect_wallet(&self, options: ConnectOptions) -> Result<WalletInfo> {
        let info = self.bridge.connect(options).await?;
        let ledger = self.ledger.lock().await;
        ledger.save_wallet(&WalletLink {
            schema_version: crate::ledger::SCHEMA_VERSION,
            address: info.address.clone(),
            wallet_type: info.wallet_type.clone(),
            connected_at: Utc::now(),
        })?;
        Ok(info)
    }

    pub async fn disconnect_wallet(&self) -> Result<()> {
        self.bridge.disconnect().await?;
        let ledger = self.ledger.lock().await;
        ledger.remove_wallet()
    }

    pub async fn wallet_link(&self) -> Result<Option<WalletLink>> {
        let ledger = self.ledger.lock().await;
        ledger.wallet()
    }

    /// The bridge reported an authoritative balance; overwrite ours.
    pub async fn balance_changed(&self, balance: f64) -> Result<()> {
        if !balance.is_finite() || balance < 0.0 {
            return Err(NodeError::InvalidAmount(format!("{}", balance)));
        }
        {
            let ledger = self.ledger.lock().await;
            let mut user = ledger.user()?;
            user.balance = balance;
            ledger.save_user(&mut user)?;
        }
        self.notify_stats().await;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Export / import / clear
    // ------------------------------------------------------------------

    pub async fn export(&self) -> Result<serde_json::Value> {
        let ledger = self.ledger.lock().await;
        ledger.export()
    }

    pub async fn import(&self, data: serde_json::Value) -> Result<()> {
        let ledger = self.ledger.lock().await;
        ledger.import(data)
    }

    /// Stop accruing and wipe all persisted state.
    pub async fn clear(&mut self) -> Result<()> {
        self.engine.stop().await?;
        let ledger = self.ledger.lock().await;
        ledger.clear()
    }

    async fn notify_stats(&self) {
        let snapshot = {
            let ledger = self.ledger.lock().await;
            let price = self.price.lock().await;
            StatsSnapshot::collect(&ledger, &price)
        };
        match snapshot {
            Ok(snapshot) => self.observer.stats_changed(&snapshot),
            Err(err) => warn!("stats snapshot failed: {}", err),
        }
    }
}
