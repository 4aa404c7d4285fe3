use super::{WalletBridge, WithdrawalReceipt, address};
use crate::core::{NodeError, Result};
use crate::ledger::{Ledger, NewTransaction, TransactionKind, TransactionStatus};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

/// Smallest withdrawable amount.
pub const MIN_WITHDRAWAL: f64 = 10.0;
/// Sanity ceiling on any single amount.
pub const MAX_AMOUNT: f64 = 10_000_000.0;

/// Validates and applies a balance-decreasing ledger transaction, delegating
/// the actual fund movement to the wallet bridge.
pub struct WithdrawalProcessor {
    ledger: Arc<Mutex<Ledger>>,
    bridge: Arc<dyn WalletBridge>,
}

impl WithdrawalProcessor {
    pub fn new(ledger: Arc<Mutex<Ledger>>, bridge: Arc<dyn WalletBridge>) -> Self {
        Self { ledger, bridge }
    }

    /// The ledger lock is held across the bridge call so no other
    /// ledger-mutating operation can interleave with a withdrawal in flight.
    ///
    /// Bridge failures surface unchanged and leave the ledger untouched; no
    /// `Failed` transaction is recorded for them.
    pub async fn withdraw(&self, to_address: &str, amount: f64) -> Result<WithdrawalReceipt> {
        if !address::is_valid_address(to_address) {
            return Err(NodeError::InvalidAddress(to_address.to_string()));
        }
        if !amount.is_finite() || amount <= 0.0 || amount >= MAX_AMOUNT {
            return Err(NodeError::InvalidAmount(format!("{}", amount)));
        }
        if amount < MIN_WITHDRAWAL {
            return Err(NodeError::InvalidAmount(format!(
                "minimum withdrawal is {} (got {})",
                MIN_WITHDRAWAL, amount
            )));
        }

        let ledger = self.ledger.lock().await;
        let mut user = ledger.user()?;
        if user.balance < amount {
            return Err(NodeError::InsufficientBalance {
                available: user.balance,
                requested: amount,
            });
        }

        let receipt = self.bridge.withdraw(to_address, amount).await?;

        user.balance -= receipt.amount;
        user.total_withdrawals += 1;
        ledger.save_user(&mut user)?;
        ledger.append_transaction(NewTransaction {
            kind: TransactionKind::Withdrawal,
            amount: receipt.amount,
            to_address: Some(receipt.address.clone()),
            tx_hash: Some(receipt.tx_hash.clone()),
            status: TransactionStatus::Completed,
        })?;

        info!(amount = receipt.amount, "withdrawal completed");
        Ok(receipt)
    }
}
