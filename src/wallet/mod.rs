//! The external wallet capability and the withdrawal processor.
//!
//! The wallet itself is out of core scope: the core only consumes it as an
//! opaque async capability that supplies/consumes balance and withdrawal
//! confirmations.

pub mod address;
mod withdraw;

pub use withdraw::{MAX_AMOUNT, MIN_WITHDRAWAL, WithdrawalProcessor};

use crate::core::{Result, ids};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletInfo {
    pub address: String,
    pub wallet_type: String,
}

#[derive(Debug, Clone, Default)]
pub struct ConnectOptions {
    /// Requested wallet type; `None` lets the bridge pick.
    pub wallet_type: Option<String>,
}

/// Confirmation returned by the bridge for a completed withdrawal.
#[derive(Debug, Clone)]
pub struct WithdrawalReceipt {
    pub amount: f64,
    pub address: String,
    pub tx_hash: String,
}

#[async_trait]
pub trait WalletBridge: Send + Sync {
    async fn connect(&self, options: ConnectOptions) -> Result<WalletInfo>;
    async fn balance(&self) -> Result<f64>;
    async fn withdraw(&self, address: &str, amount: f64) -> Result<WithdrawalReceipt>;
    async fn disconnect(&self) -> Result<()>;
}

/// Bridge that settles everything locally with generated hashes. Backs the
/// CLI and tests; no funds move anywhere.
pub struct SimulatedWallet {
    address: String,
}

impl SimulatedWallet {
    pub fn new() -> Self {
        Self {
            address: ids::generate_address(),
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }
}

impl Default for SimulatedWallet {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WalletBridge for SimulatedWallet {
    async fn connect(&self, options: ConnectOptions) -> Result<WalletInfo> {
        Ok(WalletInfo {
            address: self.address.clone(),
            wallet_type: options.wallet_type.unwrap_or_else(|| "simulated".to_string()),
        })
    }

    async fn balance(&self) -> Result<f64> {
        Ok(0.0)
    }

    async fn withdraw(&self, address: &str, amount: f64) -> Result<WithdrawalReceipt> {
        Ok(WithdrawalReceipt {
            amount,
            address: address.to_string(),
            tx_hash: ids::generate_tx_hash(),
        })
    }

    async fn disconnect(&self) -> Result<()> {
        Ok(())
    }
}
