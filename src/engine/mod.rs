//! The accrual state machine: Idle/Active, two independent periodic timers,
//! atomic ledger mutation per tick.

pub mod rng;

use crate::core::Result;
use crate::ledger::{Ledger, SOURCE_MINING};
use crate::observer::{NodeObserver, StatsSnapshot};
use crate::price::PriceFeed;
use chrono::Utc;
use self::rng::Sampler;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, oneshot};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    Active,
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub earnings_period: Duration,
    pub uptime_period: Duration,
    /// Uniform range of one earnings tick, `[min, max)`.
    pub earning_range: (f64, f64),
    /// Uniform range of one simulated bandwidth increment, `[min, max)`.
    pub bandwidth_range: (f64, f64),
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            earnings_period: Duration::from_secs(2),
            uptime_period: Duration::from_secs(1),
            earning_range: (0.1, 0.5),
            bandwidth_range: (20.0, 50.0),
        }
    }
}

/// What one earnings tick applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickOutcome {
    pub earning: f64,
    pub bandwidth: f64,
}

/// One earnings tick: read fresh, mutate, write back. If any write fails the
/// tick failed as a unit and the caller must not notify observers.
pub fn apply_earning_tick(
    ledger: &Ledger,
    sampler: &mut dyn Sampler,
    config: &EngineConfig,
) -> Result<TickOutcome> {
    let mut user = ledger.user()?;
    let mut session = ledger.session()?;

    let earning = sampler.sample(config.earning_range.0, config.earning_range.1);
    user.balance += earning;
    user.total_earnings += earning;
    user.today_earnings += earning;
    ledger.save_user(&mut user)?;
    ledger.append_earning(earning, SOURCE_MINING)?;

    let bandwidth = sampler.sample(config.bandwidth_range.0, config.bandwidth_range.1);
    session.bandwidth += bandwidth;
    ledger.save_session(&session)?;

    Ok(TickOutcome { earning, bandwidth })
}

/// One uptime tick; returns the new uptime in whole time-units.
pub fn apply_uptime_tick(ledger: &Ledger) -> Result<u64> {
    let mut session = ledger.session()?;
    session.uptime += 1;
    ledger.save_session(&session)?;
    Ok(session.uptime)
}

// ============================================================================
// Tick workers
// ============================================================================

struct TickWorker {
    stop_tx: Option<oneshot::Sender<()>>,
    join_handle: Option<JoinHandle<()>>,
}

impl TickWorker {
    async fn stop(mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        if let Some(join_handle) = self.join_handle.take() {
            let _ = join_handle.await;
        }
    }
}

impl Drop for TickWorker {
    fn drop(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        if let Some(join_handle) = self.join_handle.take() {
            join_handle.abort();
        }
    }
}

struct EngineWorkers {
    earnings: TickWorker,
    uptime: TickWorker,
}

// ============================================================================
// AccrualEngine
// ============================================================================

/// The Idle/Active state machine owning both periodic timers.
///
/// All ledger mutation runs under the shared ledger lock, and every tick body
/// re-checks the engine generation after acquiring it, so `stop()` is
/// effective immediately: once it returns, no in-flight tick applies further
/// mutations.
pub struct AccrualEngine {
    ledger: Arc<Mutex<Ledger>>,
    observer: Arc<dyn NodeObserver>,
    sampler: Arc<Mutex<Box<dyn Sampler>>>,
    price: Arc<Mutex<PriceFeed>>,
    config: EngineConfig,
    generation: Arc<AtomicU64>,
    workers: Option<EngineWorkers>,
}

impl AccrualEngine {
    pub fn new(
        ledger: Arc<Mutex<Ledger>>,
        observer: Arc<dyn NodeObserver>,
        sampler: Box<dyn Sampler>,
        price: Arc<Mutex<PriceFeed>>,
        config: EngineConfig,
    ) -> Self {
        Self {
            ledger,
            observer,
            sampler: Arc::new(Mutex::new(sampler)),
            price,
            config,
            generation: Arc::new(AtomicU64::new(0)),
            workers: None,
        }
    }

    pub fn state(&self) -> EngineState {
        if self.workers.is_some() {
            EngineState::Active
        } else {
            EngineState::Idle
        }
    }

    /// Begin a new accrual run. No-op when already Active. Resets the
    /// session counters: this is an explicit new run, not a resume.
    pub async fn start(&mut self) -> Result<()> {
        if self.workers.is_some() {
            return Ok(());
        }
        {
            let ledger = self.ledger.lock().await;
            let mut session = ledger.session()?;
            session.is_active = true;
            session.started_at = Some(Utc::now());
            session.uptime = 0;
            session.bandwidth = 0.0;
            ledger.save_session(&session)?;
        }
        self.arm_timers();
        info!("accrual engine started");
        Ok(())
    }

    /// Re-enter Active after a reload when the persisted session says the
    /// engine was running. Leaves `uptime`, `bandwidth` and `started_at`
    /// untouched. Returns whether a session was resumed.
    pub async fn resume(&mut self) -> Result<bool> {
        if self.workers.is_some() {
            return Ok(true);
        }
        let active = {
            let ledger = self.ledger.lock().await;
            ledger.session()?.is_active
        };
        if active {
            self.arm_timers();
            info!("accrual engine resumed");
        }
        Ok(active)
    }

    /// Leave Active. No-op when already Idle. Cancellation is immediate:
    /// a tick scheduled before this call observes the stale generation under
    /// the ledger lock and applies nothing.
    pub async fn stop(&mut self) -> Result<()> {
        let Some(workers) = self.workers.take() else {
            return Ok(());
        };
        self.generation.fetch_add(1, Ordering::SeqCst);
        workers.earnings.stop().await;
        workers.uptime.stop().await;

        let ledger = self.ledger.lock().await;
        let mut session = ledger.session()?;
        session.is_active = false;
        ledger.save_session(&session)?;
        info!("accrual engine stopped");
        Ok(())
    }

    fn arm_timers(&mut self) {
        let generation = self.generation.load(Ordering::SeqCst);
        let earnings = self.spawn_earnings_worker(generation);
        let uptime = self.spawn_uptime_worker(generation);
        self.workers = Some(EngineWorkers { earnings, uptime });
    }

    fn spawn_earnings_worker(&self, my_generation: u64) -> TickWorker {
        let ledger = self.ledger.clone();
        let sampler = self.sampler.clone();
        let observer = self.observer.clone();
        let price = self.price.clone();
        let config = self.config.clone();
        let generation = self.generation.clone();
        let period = self.config.earnings_period;

        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
        let join_handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    _ = sleep(period) => {
                        let snapshot = {
                            let ledger = ledger.lock().await;
                            if generation.load(Ordering::SeqCst) != my_generation {
                                break;
                            }
                            let mut sampler = sampler.lock().await;
                            match apply_earning_tick(&ledger, sampler.as_mut(), &config) {
                                Ok(_) => {
                                    let mut price = price.lock().await;
                                    price.refresh(sampler.as_mut());
                                    StatsSnapshot::collect(&ledger, &price)
                                }
                                Err(err) => {
                                    warn!("earnings tick failed: {}", err);
                                    continue;
                                }
                            }
                        };
                        match snapshot {
                            Ok(snapshot) => observer.stats_changed(&snapshot),
                            Err(err) => warn!("stats snapshot failed: {}", err),
                        }
                    }
                }
            }
        });

        TickWorker {
            stop_tx: Some(stop_tx),
            join_handle: Some(join_handle),
        }
    }

    fn spawn_uptime_worker(&self, my_generation: u64) -> TickWorker {
        let ledger = self.ledger.clone();
        let observer = self.observer.clone();
        let generation = self.generation.clone();
        let period = self.config.uptime_period;

        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
        let join_handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    _ = sleep(period) => {
                        let uptime = {
                            let ledger = ledger.lock().await;
                            if generation.load(Ordering::SeqCst) != my_generation {
                                break;
                            }
                            match apply_uptime_tick(&ledger) {
                                Ok(uptime) => uptime,
                                Err(err) => {
                                    warn!("uptime tick failed: {}", err);
                                    continue;
                                }
                            }
                        };
                        observer.uptime_changed(uptime);
                    }
                }
            }
        });

        TickWorker {
            stop_tx: Some(stop_tx),
            join_handle: Some(join_handle),
        }
    }
}
