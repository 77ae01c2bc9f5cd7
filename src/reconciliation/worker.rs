//! Reconciliation Worker
//!
//! Background loop that polls the accrual oracle for every pending order and
//! moves it toward a terminal state. Crediting goes through
//! [`LoyaltyRepository::credit_processed`], so an order is credited at most
//! once no matter how many ticks replay the same verdict.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::accrual::{AccrualOracle, OracleError, Verdict};
use crate::order::OrderStatus;
use crate::repository::{CreditOutcome, LoyaltyRepository, RepositoryError, StatusUpdate};

/// Configuration for the reconciliation worker
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Fixed delay between tick starts
    pub tick_interval: Duration,
    /// Maximum pending orders examined per tick
    pub batch_size: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(1),
            batch_size: 100,
        }
    }
}

/// What one tick did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Orders queried at the oracle
    pub examined: usize,
    /// NEW -> PROCESSING moves
    pub advanced: usize,
    pub invalidated: usize,
    pub credited: usize,
    /// Transient oracle errors, retried next tick
    pub deferred: usize,
    /// Fatal oracle errors and storage errors
    pub failed: usize,
    /// Set when the oracle asked us to back off; the tick ended early
    pub throttle: Option<Duration>,
}

impl TickReport {
    pub fn is_idle(&self) -> bool {
        self.advanced == 0
            && self.invalidated == 0
            && self.credited == 0
            && self.failed == 0
            && self.throttle.is_none()
    }
}

/// Effect of applying one verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Applied {
    Advanced,
    Invalidated,
    Credited,
    Unchanged,
}

/// Reconciliation Worker
///
/// One instance per process. Ticks never overlap: [`Self::tick`] returns
/// `Ok(None)` when another tick is still running.
pub struct ReconciliationWorker {
    repo: Arc<dyn LoyaltyRepository>,
    oracle: Arc<dyn AccrualOracle>,
    config: WorkerConfig,
    tick_lock: Mutex<()>,
}

impl ReconciliationWorker {
    pub fn new(
        repo: Arc<dyn LoyaltyRepository>,
        oracle: Arc<dyn AccrualOracle>,
        config: WorkerConfig,
    ) -> Self {
        Self {
            repo,
            oracle,
            config,
            tick_lock: Mutex::new(()),
        }
    }

    pub fn with_defaults(repo: Arc<dyn LoyaltyRepository>, oracle: Arc<dyn AccrualOracle>) -> Self {
        Self::new(repo, oracle, WorkerConfig::default())
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// Run the reconciliation loop until `shutdown` is cancelled.
    ///
    /// An in-flight tick always runs to completion; cancellation is only
    /// observed between ticks and during a rate-limit pause.
    pub async fn run(&self, shutdown: CancellationToken) {
        info!(
            tick_interval_ms = self.config.tick_interval.as_millis() as u64,
            batch_size = self.config.batch_size,
            "Starting reconciliation worker"
        );

        let mut interval = tokio::time::interval(self.config.tick_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = interval.tick() => {}
            }

            let report = match self.tick().await {
                Ok(Some(report)) => report,
                Ok(None) => continue,
                Err(e) => {
                    error!(error = %e, "Reconciliation tick failed");
                    continue;
                }
            };

            if !report.is_idle() {
                info!(
                    examined = report.examined,
                    advanced = report.advanced,
                    invalidated = report.invalidated,
                    credited = report.credited,
                    deferred = report.deferred,
                    failed = report.failed,
                    "Reconciliation tick done"
                );
            }

            if let Some(pause) = report.throttle {
                warn!(pause_ms = pause.as_millis() as u64, "Oracle rate limit, pausing");
                tokio::select! {
                    biased;
                    _ = shutdown.cancelled() => break,
                    _ = tokio::time::sleep(pause) => {}
                }
                interval.reset();
            }
        }

        info!("Reconciliation worker stopped");
    }

    /// Run a single reconciliation pass.
    ///
    /// Returns `Ok(None)` if a tick is already in flight. Only the initial
    /// pending-order fetch can fail the whole tick; per-order failures are
    /// logged and counted in the report.
    pub async fn tick(&self) -> Result<Option<TickReport>, RepositoryError> {
        let Ok(_guard) = self.tick_lock.try_lock() else {
            debug!("Reconciliation tick already in flight, skipping");
            return Ok(None);
        };

        let pending = self.repo.pending_orders(self.config.batch_size).await?;
        let mut report = TickReport::default();

        if pending.is_empty() {
            return Ok(Some(report));
        }
        debug!(count = pending.len(), "Pending orders this tick");

        for number in &pending {
            report.examined += 1;

            let verdict = match self.oracle.query(number).await {
                Ok(verdict) => verdict,
                Err(OracleError::RateLimited { retry_after }) => {
                    report.deferred += 1;
                    report.throttle = Some(retry_after);
                    break;
                }
                Err(e) if e.is_transient() => {
                    debug!(order = %number, error = %e, "Oracle not ready, retry next tick");
                    report.deferred += 1;
                    continue;
                }
                Err(e) => {
                    warn!(order = %number, error = %e, "Oracle query failed");
                    report.failed += 1;
                    continue;
                }
            };

            match self.apply(number, verdict).await {
                Ok(Applied::Advanced) => report.advanced += 1,
                Ok(Applied::Invalidated) => report.invalidated += 1,
                Ok(Applied::Credited) => report.credited += 1,
                Ok(Applied::Unchanged) => {}
                Err(e) => {
                    error!(order = %number, error = %e, "Failed to apply oracle verdict");
                    report.failed += 1;
                }
            }
        }

        Ok(Some(report))
    }

    async fn apply(&self, number: &str, verdict: Verdict) -> Result<Applied, RepositoryError> {
        match verdict {
            Verdict::Registered | Verdict::Processing => {
                match self.repo.advance_status(number, OrderStatus::Processing).await? {
                    StatusUpdate::Updated { from } => {
                        debug!(order = %number, from = %from, "Order processing");
                        Ok(Applied::Advanced)
                    }
                    StatusUpdate::Unchanged { current } => {
                        if current != OrderStatus::Processing {
                            info!(order = %number, current = %current, verdict = ?verdict, "Ignoring regressive verdict");
                        }
                        Ok(Applied::Unchanged)
                    }
                }
            }
            Verdict::Invalid => {
                match self.repo.advance_status(number, OrderStatus::Invalid).await? {
                    StatusUpdate::Updated { from } => {
                        info!(order = %number, from = %from, "Order invalid");
                        Ok(Applied::Invalidated)
                    }
                    StatusUpdate::Unchanged { current } => {
                        info!(order = %number, current = %current, "Ignoring INVALID verdict for terminal order");
                        Ok(Applied::Unchanged)
                    }
                }
            }
            Verdict::Processed { accrual } => {
                match self.repo.credit_processed(number, accrual).await? {
                    CreditOutcome::Credited { owner, from } => {
                        info!(order = %number, user_id = owner, amount = %accrual, from = %from, "Order credited");
                        Ok(Applied::Credited)
                    }
                    CreditOutcome::AlreadyTerminal { current } => {
                        info!(order = %number, current = %current, "Ignoring PROCESSED verdict for terminal order");
                        Ok(Applied::Unchanged)
                    }
                }
            }
        }
    }
}
