use chrono::Utc;
use dogenode::{
    EngineConfig, EngineState, FileStore, Ledger, Node, NullObserver, PersistentStore,
    SeededSampler, SimulatedWallet,
};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;

const VALID_ADDRESS: &str = "D6abcdefghijkmnopqrstuvwxyz1234567";

/// Timers far in the future so open/resume never ticks during a test.
fn quiet_config() -> EngineConfig {
    EngineConfig {
        earnings_period: Duration::from_secs(3600),
        uptime_period: Duration::from_secs(3600),
        ..EngineConfig::default()
    }
}

async fn open_node(dir: &Path) -> Node {
    Node::open(
        Arc::new(FileStore::open(dir).unwrap()),
        Arc::new(SimulatedWallet::new()),
        Arc::new(NullObserver),
        Box::new(SeededSampler::new(11)),
        quiet_config(),
    )
    .await
    .unwrap()
}

fn raw_ledger(dir: &Path) -> Ledger {
    let store: Arc<dyn PersistentStore> = Arc::new(FileStore::open(dir).unwrap());
    Ledger::new(store)
}

#[tokio::test]
async fn open_creates_user_and_stable_referral_code() {
    let dir = tempdir().unwrap();

    let node = open_node(dir.path()).await;
    let first = node.stats().await.unwrap();
    assert_eq!(first.balance, 0.0);
    assert_eq!(first.referral_code.len(), 8);
    drop(node);

    let node = open_node(dir.path()).await;
    let second = node.stats().await.unwrap();
    assert_eq!(second.referral_code, first.referral_code);
}

#[tokio::test]
async fn daily_reset_runs_on_open() {
    let dir = tempdir().unwrap();
    {
        let ledger = raw_ledger(dir.path());
        let mut user = ledger.user().unwrap();
        user.today_earnings = 5.0;
        user.total_earnings = 20.0;
        ledger.save_user(&mut user).unwrap();
        // Backdate last_active past save_user's refresh.
        user.last_active = Utc::now() - chrono::Duration::days(2);
        ledger.store().set(dogenode::StoreKey::User, &user).unwrap();
    }

    let node = open_node(dir.path()).await;
    let stats = node.stats().await.unwrap();
    assert_eq!(stats.today_earnings, 0.0);
    assert_eq!(stats.total_earnings, 20.0);
}

#[tokio::test]
async fn active_session_resumes_on_open() {
    let dir = tempdir().unwrap();
    {
        let mut node = open_node(dir.path()).await;
        node.start().await.unwrap();
        assert_eq!(node.state(), EngineState::Active);
        // Dropped while active: the persisted session stays active.
    }

    let mut node = open_node(dir.path()).await;
    assert_eq!(node.state(), EngineState::Active);
    node.stop().await.unwrap();
    assert_eq!(node.state(), EngineState::Idle);

    let node = open_node(dir.path()).await;
    assert_eq!(node.state(), EngineState::Idle);
}

#[tokio::test]
async fn auto_start_setting_is_honored() {
    let dir = tempdir().unwrap();
    {
        let ledger = raw_ledger(dir.path());
        let mut settings = ledger.settings().unwrap();
        settings.auto_start = true;
        ledger.save_settings(&settings).unwrap();
    }

    let mut node = open_node(dir.path()).await;
    assert_eq!(node.state(), EngineState::Active);
    node.stop().await.unwrap();
}

#[tokio::test]
async fn withdrawal_round_trip_through_facade() {
    let dir = tempdir().unwrap();
    {
        let ledger = raw_ledger(dir.path());
        let mut user = ledger.user().unwrap();
        user.balance = 15.0;
        ledger.save_user(&mut user).unwrap();
    }

    let node = open_node(dir.path()).await;
    let receipt = node.withdraw(VALID_ADDRESS, 10.0).await.unwrap();
    assert_eq!(receipt.amount, 10.0);

    let stats = node.stats().await.unwrap();
    assert!((stats.balance - 5.0).abs() < 1e-9);
    assert_eq!(stats.total_withdrawals, 1);

    let recent = node.recent_transactions(5).await.unwrap();
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].amount, 10.0);
}

#[tokio::test]
async fn stats_carry_usd_conversion() {
    let dir = tempdir().unwrap();
    let node = open_node(dir.path()).await;
    node.balance_changed(100.0).await.unwrap();

    // No earnings tick has run under the quiet config, so the price is still
    // the default 0.08 USD.
    let stats = node.stats().await.unwrap();
    assert!((stats.price_usd - 0.08).abs() < 1e-9);
    assert!((stats.balance_usd - 8.0).abs() < 1e-9);
    assert!((stats.balance_usd - stats.balance * stats.price_usd).abs() < 1e-9);
}

#[tokio::test]
async fn referral_link_embeds_the_code() {
    let dir = tempdir().unwrap();
    let node = open_node(dir.path()).await;
    let stats = node.stats().await.unwrap();
    let link = node.referral_link("https://dogenode.example").await.unwrap();
    assert_eq!(
        link,
        format!("https://dogenode.example?ref={}", stats.referral_code)
    );
}

#[tokio::test]
async fn wallet_connect_and_disconnect_persist_the_link() {
    let dir = tempdir().unwrap();
    let node = open_node(dir.path()).await;

    let info = node.connect_wallet(Default::default()).await.unwrap();
    assert_eq!(info.wallet_type, "simulated");
    let link = node.wallet_link().await.unwrap().unwrap();
    assert_eq!(link.address, info.address);

    node.disconnect_wallet().await.unwrap();
    assert!(node.wallet_link().await.unwrap().is_none());
}

#[tokio::test]
async fn balance_changed_overwrites_balance() {
    let dir = tempdir().unwrap();
    let node = open_node(dir.path()).await;

    node.balance_changed(123.456).await.unwrap();
    assert!((node.stats().await.unwrap().balance - 123.456).abs() < 1e-9);

    assert!(node.balance_changed(-1.0).await.is_err());
    assert!((node.stats().await.unwrap().balance - 123.456).abs() < 1e-9);
}

#[tokio::test]
async fn export_import_moves_state_between_stores() {
    let source_dir = tempdir().unwrap();
    let node = open_node(source_dir.path()).await;
    node.balance_changed(42.0).await.unwrap();
    let stats = node.stats().await.unwrap();
    let exported = node.export().await.unwrap();

    let target_dir = tempdir().unwrap();
    let target = open_node(target_dir.path()).await;
    target.import(exported).await.unwrap();

    let imported = target.stats().await.unwrap();
    assert_eq!(imported.balance, 42.0);
    assert_eq!(imported.referral_code, stats.referral_code);
}

#[tokio::test]
async fn clear_stops_and_wipes() {
    let dir = tempdir().unwrap();
    let mut node = open_node(dir.path()).await;
    node.start().await.unwrap();
    node.balance_changed(9.0).await.unwrap();

    node.clear().await.unwrap();
    assert_eq!(node.state(), EngineState::Idle);
    assert_eq!(node.stats().await.unwrap().balance, 0.0);
}
