use anyhow::Context;
use clap::{Parser, Subcommand};
use dogenode::wallet::address::format_address;
use dogenode::{
    FileStore, Ledger, Node, NodeObserver, PersistentStore, PriceFeed, StatsSnapshot,
    TransactionKind, TransactionStatus,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "dogenode", about = "Simulated passive-accrual node with a local ledger")]
struct Cli {
    /// Data directory for the persistent ledger
    #[arg(long, default_value = ".dogenode")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Accrue until interrupted, printing stats as they change
    Run,
    /// Print the current ledger stats
    Stats,
    /// List recent transactions
    Transactions {
        /// Maximum number to show
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Withdraw funds to an address
    Withdraw { address: String, amount: f64 },
    /// Print all persisted state as JSON
    Export,
    /// Delete all persisted state
    Clear,
}

struct PrintObserver;

impl NodeObserver for PrintObserver {
    fn stats_changed(&self, stats: &StatsSnapshot) {
        println!(
            "balance {:.2} (${:.2}) | today {:.2} | total {:.2} | bandwidth {:.0} | uptime {}",
            stats.balance, stats.balance_usd, stats.today_earnings, stats.total_earnings,
            stats.bandwidth, format_uptime(stats.uptime),
        );
    }
}

fn format_uptime(seconds: u64) -> String {
    format!(
        "{:02}:{:02}:{:02}",
        seconds / 3600,
        (seconds % 3600) / 60,
        seconds % 60
    )
}

fn print_stats(stats: &StatsSnapshot) {
    println!("balance:           {:.2} (${:.2} at ${:.3})", stats.balance, stats.balance_usd, stats.price_usd);
    println!("total earnings:    {:.2}", stats.total_earnings);
    println!("today earnings:    {:.2}", stats.today_earnings);
    println!("total withdrawals: {}", stats.total_withdrawals);
    println!("referrals:         {} (code {})", stats.referral_count, stats.referral_code);
    println!("bandwidth:         {:.0}", stats.bandwidth);
    println!("uptime:            {}", format_uptime(stats.uptime));
}

/// Read-only commands go straight to the ledger so they never arm timers or
/// touch the persisted session.
fn read_only_ledger(data_dir: &PathBuf) -> anyhow::Result<Ledger> {
    let store: Arc<dyn PersistentStore> =
        Arc::new(FileStore::open(data_dir).context("opening data directory")?);
    Ok(Ledger::new(store))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Run => {
            let mut node = Node::open(
                Arc::new(FileStore::open(&cli.data_dir)?),
                Arc::new(dogenode::SimulatedWallet::new()),
                Arc::new(PrintObserver),
                Box::new(dogenode::ThreadSampler),
                dogenode::EngineConfig::default(),
            )
            .await?;
            node.start().await?;
            println!("accruing; press ctrl-c to stop");
            tokio::signal::ctrl_c().await.context("waiting for ctrl-c")?;
            node.stop().await?;
        }
        Command::Stats => {
            let ledger = read_only_ledger(&cli.data_dir)?;
            print_stats(&StatsSnapshot::collect(&ledger, &PriceFeed::new())?);
        }
        Command::Transactions { limit } => {
            let ledger = read_only_ledger(&cli.data_dir)?;
            let mut list = ledger.transactions()?;
            list.truncate(limit);
            if list.is_empty() {
                println!("no transactions");
            }
            for tx in list {
                let kind = match tx.kind {
                    TransactionKind::Deposit => "deposit",
                    TransactionKind::Withdrawal => "withdrawal",
                };
                let status = match tx.status {
                    TransactionStatus::Pending => "pending",
                    TransactionStatus::Completed => "completed",
                    TransactionStatus::Failed => "failed",
                };
                let to = tx
                    .to_address
                    .as_deref()
                    .map(format_address)
                    .unwrap_or_default();
                println!(
                    "{}  {:<10} {:>10.2}  {:<9} {}",
                    tx.timestamp.format("%Y-%m-%d %H:%M:%S"),
                    kind,
                    tx.amount,
                    status,
                    to,
                );
            }
        }
        Command::Withdraw { address, amount } => {
            let node = Node::open_dir(&cli.data_dir).await?;
            let receipt = node.withdraw(&address, amount).await?;
            println!(
                "withdrew {:.2} to {} (tx {})",
                receipt.amount, receipt.address, receipt.tx_hash
            );
        }
        Command::Export => {
            let ledger = read_only_ledger(&cli.data_dir)?;
            println!("{}", serde_json::to_string_pretty(&ledger.export()?)?);
        }
        Command::Clear => {
            let mut node = Node::open_dir(&cli.data_dir).await?;
            node.clear().await?;
            println!("ledger cleared");
        }
    }
    Ok(())
}
