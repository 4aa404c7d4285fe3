//! Notification seam for a presentation layer.
//!
//! The core calls out on every stats-relevant mutation; what (if anything)
//! gets rendered is the observer's business.

use crate::core::Result;
use crate::ledger::Ledger;
use crate::price::PriceFeed;

/// Snapshot of everything a presentation layer shows.
#[derive(Debug, Clone, PartialEq)]
pub struct StatsSnapshot {
    pub balance: f64,
    pub total_earnings: f64,
    pub today_earnings: f64,
    pub total_withdrawals: u64,
    pub referral_count: u64,
    pub referral_code: String,
    pub bandwidth: f64,
    pub uptime: u64,
    pub price_usd: f64,
    pub balance_usd: f64,
}

impl StatsSnapshot {
    pub fn collect(ledger: &Ledger, price: &PriceFeed) -> Result<Self> {
        let user = ledger.user()?;
        let session = ledger.session()?;
        let referrals = ledger.referrals()?;
        Ok(Self {
            balance: user.balance,
            total_earnings: user.total_earnings,
            today_earnings: user.today_earnings,
            total_withdrawals: user.total_withdrawals,
            referral_count: user.referral_count,
            referral_code: referrals.code,
            bandwidth: session.bandwidth,
            uptime: session.uptime,
            price_usd: price.price_usd(),
            balance_usd: price.usd_value(user.balance),
        })
    }
}

#[allow(unused_variables)]
pub trait NodeObserver: Send + Sync {
    fn stats_changed(&self, stats: &StatsSnapshot) {}
    fn uptime_changed(&self, uptime: u64) {}
    fn transactions_changed(&self) {}
}

/// Observer that ignores every notification.
pub struct NullObserver;

impl NodeObserver for NullObserver {}
