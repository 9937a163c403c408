//! # Collect Coordinator
//!
//! Runs reconciliation passes against one sync target.
//!
//! ## Overview
//!
//! A pass takes a batch of candidate items and:
//! 1. Drops invalid items and duplicate identities
//! 2. Consumes the one-shot full-coverage flag
//! 3. Plans the run (loads memory, probes the remote store when needed)
//! 4. Pushes the work list through the executor
//! 5. Applies the planned memory update
//! 6. Emits `CollectEvent`s on the event bus and returns a [`RunReport`]
//!
//! Passes against the same target are serialized by a run lock: [`run`]
//! waits for it, [`try_run`] fails fast with `RunInProgress`. A pass that is
//! cancelled, times out, or fails leaves memory exactly as it found it.
//!
//! [`run`]: CollectCoordinator::run
//! [`try_run`]: CollectCoordinator::try_run
//!
//! ## Usage
//!
//! ```rust,ignore
//! let coordinator = CollectCoordinator::new(
//!     "linkding",
//!     config,
//!     remote,
//!     catalog,
//!     memory,
//!     event_bus,
//! )?;
//!
//! let report = coordinator.run(items, &CancellationToken::new()).await?;
//! println!("collected {}", report.success_count());
//! ```

use crate::catalog::{CachedCatalog, CatalogLookup};
use crate::executor::{Execution, SyncExecutor};
use crate::memory::MemoryStore;
use crate::model::{Item, UniqueKey};
use crate::planner::{prepare_candidates, Candidate, MemoryUpdate, Plan, ReconciliationPlanner};
use crate::remote::RemoteStoreClient;
use crate::report::{RunId, RunReport};
use crate::{Result, SyncError};
use bridge_traits::time::SystemClock;
use core_runtime::config::CollectConfig;
use core_runtime::events::{CollectEvent, CoreEvent, EventBus};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// One-shot switch forcing the next pass to run with full coverage.
#[derive(Debug, Default)]
pub struct FullCoverageFlag(AtomicBool);

impl FullCoverageFlag {
    pub fn new(armed: bool) -> Self {
        Self(AtomicBool::new(armed))
    }

    pub fn arm(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Read and clear in one step.
    pub fn take(&self) -> bool {
        self.0.swap(false, Ordering::SeqCst)
    }

    pub fn is_armed(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

pub struct CollectCoordinator {
    target: String,
    config: CollectConfig,
    memory: Arc<dyn MemoryStore>,
    planner: ReconciliationPlanner,
    executor: SyncExecutor,
    full_coverage: FullCoverageFlag,
    run_lock: Mutex<()>,
    event_bus: EventBus,
}

impl CollectCoordinator {
    /// Create a coordinator for `target`.
    ///
    /// # Arguments
    ///
    /// * `target` - Name of the sync target, used in events and logs
    /// * `config` - Validated collection configuration
    /// * `remote` - Remote store the target pushes to
    /// * `catalog` - Catalog used to build display records; answers are
    ///   cached per the config's catalog cache settings
    /// * `memory` - Per-target memory store
    /// * `event_bus` - Event bus for run events
    pub fn new(
        target: impl Into<String>,
        config: CollectConfig,
        remote: Arc<dyn RemoteStoreClient>,
        catalog: Arc<dyn CatalogLookup>,
        memory: Arc<dyn MemoryStore>,
        event_bus: EventBus,
    ) -> Result<Self> {
        config.validate()?;

        let target = target.into();
        if target.trim().is_empty() {
            return Err(SyncError::Config("target name must not be empty".to_string()));
        }

        let planner =
            ReconciliationPlanner::new(target.clone(), Arc::clone(&memory), Arc::clone(&remote), &config);
        let catalog = CachedCatalog::from_config(catalog, &config, Arc::new(SystemClock));
        let executor = SyncExecutor::new(
            Arc::new(catalog),
            remote,
            config.max_concurrent_pushes,
            config.request_timeout,
        );
        let full_coverage = FullCoverageFlag::new(config.full_coverage_on_start);

        Ok(Self {
            target,
            config,
            memory,
            planner,
            executor,
            full_coverage,
            run_lock: Mutex::new(()),
            event_bus,
        })
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn config(&self) -> &CollectConfig {
        &self.config
    }

    pub fn full_coverage(&self) -> &FullCoverageFlag {
        &self.full_coverage
    }

    /// Whether a pass currently holds the run lock.
    pub fn is_running(&self) -> bool {
        self.run_lock.try_lock().is_err()
    }

    /// Run a pass, waiting for any pass already in progress.
    ///
    /// Consumes the full-coverage flag and uses the configured threshold.
    pub async fn run(&self, items: Vec<Item>, cancel: &CancellationToken) -> Result<RunReport> {
        let _guard = self.run_lock.lock().await;
        let threshold = self.config.memory_threshold_or_default();
        self.pass(items, None, threshold, cancel).await
    }

    /// Run a pass unless one is already in progress.
    pub async fn try_run(&self, items: Vec<Item>, cancel: &CancellationToken) -> Result<RunReport> {
        let _guard = self
            .run_lock
            .try_lock()
            .map_err(|_| SyncError::RunInProgress {
                target: self.target.clone(),
            })?;
        let threshold = self.config.memory_threshold_or_default();
        self.pass(items, None, threshold, cancel).await
    }

    /// Run a pass with an explicit full-coverage mode and threshold.
    ///
    /// The stored full-coverage flag is left untouched.
    pub async fn reconcile(
        &self,
        items: Vec<Item>,
        full_coverage: bool,
        threshold: usize,
        cancel: &CancellationToken,
    ) -> Result<RunReport> {
        let _guard = self.run_lock.lock().await;
        self.pass(items, Some(full_coverage), threshold, cancel).await
    }

    /// Forget everything this target remembers.
    pub async fn reset_memory(&self) -> Result<()> {
        let _guard = self.run_lock.lock().await;
        self.memory.reset().await?;
        info!(target_store = %self.target, "Memory reset on request");
        Ok(())
    }

    #[instrument(skip(self, items, cancel), fields(target_store = %self.target, items = items.len()))]
    async fn pass(
        &self,
        items: Vec<Item>,
        full_coverage: Option<bool>,
        threshold: usize,
        cancel: &CancellationToken,
    ) -> Result<RunReport> {
        let run_id = RunId::new();
        let batch = prepare_candidates(items, &self.config.namespace);

        if batch.rejected > 0 || batch.duplicates > 0 {
            debug!(
                rejected = batch.rejected,
                duplicates = batch.duplicates,
                "Pre-filtered candidate batch"
            );
        }

        if batch.candidates.is_empty() {
            debug!("Nothing to collect");
            return Ok(RunReport::empty(run_id, &self.target, batch.rejected));
        }

        let full_coverage = full_coverage.unwrap_or_else(|| self.full_coverage.take());
        let candidate_count = batch.candidates.len();
        let started = Instant::now();

        let result = match timeout(
            self.config.run_timeout,
            self.plan_and_push(run_id, batch.candidates, full_coverage, cancel),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(SyncError::Timeout(self.config.run_timeout.as_secs())),
        };

        let (plan, execution) = match result {
            Ok(done) => done,
            Err(e) => {
                self.emit_abort(run_id, &e, 0);
                return Err(e);
            }
        };

        if execution.interrupted {
            let error = SyncError::Cancelled;
            self.emit_abort(run_id, &error, execution.outcomes.len());
            return Err(error);
        }

        let succeeded: HashSet<UniqueKey> = execution
            .outcomes
            .iter()
            .filter(|o| o.status.is_success())
            .map(|o| o.key.clone())
            .collect();

        let update = plan.memory_update(&succeeded, threshold);
        let memory_action = update.action();
        if let Err(e) = self.apply_memory_update(update).await {
            self.emit_abort(run_id, &e, execution.outcomes.len());
            return Err(e);
        }

        let report = RunReport {
            run_id,
            target: self.target.clone(),
            strategy: Some(plan.strategy),
            candidates: candidate_count,
            rejected: batch.rejected,
            outcomes: execution.outcomes,
            memory_action,
            duration: started.elapsed(),
        };

        self.event_bus
            .emit(CoreEvent::Collect(CollectEvent::RunCompleted {
                run_id: run_id.to_string(),
                target: self.target.clone(),
                attempted: report.attempted_count() as u64,
                succeeded: report.success_count() as u64,
                failed: report.failure_count() as u64,
                memory_action: memory_action.to_string(),
                duration_ms: millis(report.duration),
            }))
            .ok();

        info!(
            strategy = %plan.strategy,
            attempted = report.attempted_count(),
            succeeded = report.success_count(),
            memory = %memory_action,
            "Collect run completed in {:?}",
            report.duration
        );

        Ok(report)
    }

    async fn plan_and_push(
        &self,
        run_id: RunId,
        candidates: Vec<Candidate>,
        full_coverage: bool,
        cancel: &CancellationToken,
    ) -> Result<(Plan, Execution)> {
        let candidate_count = candidates.len();

        let mut plan = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(SyncError::Cancelled),
            plan = self.planner.plan(candidates, full_coverage) => plan?,
        };

        self.event_bus
            .emit(CoreEvent::Collect(CollectEvent::RunStarted {
                run_id: run_id.to_string(),
                target: self.target.clone(),
                strategy: plan.strategy.to_string(),
                candidates: candidate_count as u64,
            }))
            .ok();

        let work = std::mem::take(&mut plan.work);
        let execution = self.executor.execute(work, cancel).await;
        Ok((plan, execution))
    }

    async fn apply_memory_update(&self, update: MemoryUpdate) -> Result<()> {
        match update {
            MemoryUpdate::Save(keys) => {
                self.memory.save(&keys).await?;
                info!(size = keys.len(), "Memory saved");
            }
            MemoryUpdate::Append(keys) => {
                let merged = self.memory.append(&keys).await?;
                info!(added = keys.len(), size = merged.len(), "Memory appended");
            }
            MemoryUpdate::Reset => {
                self.memory.reset().await?;
                info!("Memory reset");
            }
            MemoryUpdate::Unchanged => {}
        }
        Ok(())
    }

    fn emit_abort(&self, run_id: RunId, error: &SyncError, items_processed: usize) {
        let event = match error {
            SyncError::Cancelled | SyncError::Timeout(_) => {
                warn!(items_processed, "Collect run stopped: {}", error);
                CollectEvent::RunCancelled {
                    run_id: run_id.to_string(),
                    target: self.target.clone(),
                    items_processed: items_processed as u64,
                }
            }
            other => {
                warn!("Collect run failed: {}", other);
                CollectEvent::RunFailed {
                    run_id: run_id.to_string(),
                    target: self.target.clone(),
                    message: other.to_string(),
                }
            }
        };
        self.event_bus.emit(CoreEvent::Collect(event)).ok();
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
