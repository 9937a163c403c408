//! # Collect Service
//!
//! Fans candidate items out to every configured sync target.
//!
//! Two kinds of trigger reach the service:
//! - **Scheduled** runs carry a full batch, either supplied by the caller or
//!   gathered from the registered [`ItemSource`]s. Each target is tried with
//!   the non-blocking `try_run`; a busy target is skipped.
//! - **Events** carry a single item (a download finished, a subscription was
//!   added). Repeats of the same item within the idempotency window are
//!   dropped, the rest wait for each target's run lock.
//!
//! Targets are processed one after the other and a failing target never
//! stops the others.

use crate::coordinator::CollectCoordinator;
use crate::idempotency::IdempotencyGuard;
use crate::model::{Category, Item, MediaSource};
use crate::report::RunReport;
use crate::{Result, SyncError};
use async_trait::async_trait;
use bridge_traits::time::Clock;
use core_runtime::config::CollectConfig;
use core_runtime::events::{CollectEvent, CoreEvent, EventBus};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Host-supplied producer of candidate items.
#[async_trait]
pub trait ItemSource: Send + Sync {
    fn source(&self) -> MediaSource;

    async fn fetch(&self) -> Result<Vec<Item>>;
}

/// Items produced by one source.
#[derive(Debug, Clone)]
pub struct SourceBatch {
    pub source: MediaSource,
    pub items: Vec<Item>,
}

impl SourceBatch {
    pub fn new(source: MediaSource, items: Vec<Item>) -> Self {
        Self { source, items }
    }
}

/// A single-item trigger.
#[derive(Debug, Clone)]
pub struct TriggerEvent {
    pub source: MediaSource,
    pub item: Item,
}

impl TriggerEvent {
    pub fn new(source: MediaSource, item: Item) -> Self {
        Self { source, item }
    }
}

#[derive(Debug)]
pub enum TargetStatus {
    Completed(RunReport),
    /// Another pass held the target's run lock
    Busy,
    Failed(SyncError),
}

#[derive(Debug)]
pub struct TargetOutcome {
    pub target: String,
    pub status: TargetStatus,
}

impl TargetOutcome {
    /// Summary line, or `None` when there is nothing worth reporting.
    pub fn summary(&self) -> Option<String> {
        match &self.status {
            TargetStatus::Completed(report) if report.success_count() > 0 => {
                Some(format!("{}: collected {}", self.target, report.success_count()))
            }
            TargetStatus::Failed(_) => Some(format!("{}: failed", self.target)),
            _ => None,
        }
    }
}

/// Per-target results of one trigger.
#[derive(Debug, Default)]
pub struct ServiceReport {
    pub outcomes: Vec<TargetOutcome>,
}

impl ServiceReport {
    pub fn total_collected(&self) -> usize {
        self.outcomes
            .iter()
            .map(|o| match &o.status {
                TargetStatus::Completed(report) => report.success_count(),
                _ => 0,
            })
            .sum()
    }

    pub fn has_failures(&self) -> bool {
        self.outcomes
            .iter()
            .any(|o| matches!(o.status, TargetStatus::Failed(_)))
    }

    /// One line per target that collected something or failed.
    pub fn summary(&self) -> Vec<String> {
        self.outcomes.iter().filter_map(TargetOutcome::summary).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    ShuttingDown,
    NoTargets,
    SourceDisabled,
    CategoryDisabled,
    InvalidItem,
}

impl fmt::Display for IgnoreReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            IgnoreReason::ShuttingDown => "service is shutting down",
            IgnoreReason::NoTargets => "no sync target configured",
            IgnoreReason::SourceDisabled => "source not enabled",
            IgnoreReason::CategoryDisabled => "category not enabled",
            IgnoreReason::InvalidItem => "item is missing identity fields",
        };
        f.write_str(reason)
    }
}

#[derive(Debug)]
pub enum EventDisposition {
    Ignored(IgnoreReason),
    /// Same item seen within the idempotency window
    Suppressed,
    Processed(ServiceReport),
}

pub struct CollectService {
    config: CollectConfig,
    targets: Vec<Arc<CollectCoordinator>>,
    sources: Vec<Arc<dyn ItemSource>>,
    guard: IdempotencyGuard,
    cancel: CancellationToken,
    event_bus: EventBus,
}

impl CollectService {
    pub fn new(config: CollectConfig, event_bus: EventBus, clock: Arc<dyn Clock>) -> Result<Self> {
        config.validate()?;
        let guard = IdempotencyGuard::new(config.idempotency_capacity, config.idempotency_ttl, clock);

        Ok(Self {
            config,
            targets: Vec::new(),
            sources: Vec::new(),
            guard,
            cancel: CancellationToken::new(),
            event_bus,
        })
    }

    pub fn with_target(mut self, target: Arc<CollectCoordinator>) -> Self {
        self.targets.push(target);
        self
    }

    pub fn with_source(mut self, source: Arc<dyn ItemSource>) -> Self {
        self.sources.push(source);
        self
    }

    pub fn targets(&self) -> &[Arc<CollectCoordinator>] {
        &self.targets
    }

    pub fn is_shutting_down(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Arm full coverage on every target for its next pass.
    pub fn arm_full_coverage(&self) {
        for target in &self.targets {
            target.full_coverage().arm();
        }
    }

    fn source_enabled(&self, source: MediaSource) -> bool {
        self.config.is_source_enabled(source.as_str())
    }

    fn category_enabled(&self, category: Option<Category>) -> bool {
        category.is_some_and(|c| self.config.is_category_enabled(c.as_str()))
    }

    /// Merge batches from several sources.
    ///
    /// Batches from disabled sources, invalid items and items of disabled
    /// categories are dropped. Identities are deduplicated, first wins.
    pub fn gather(&self, batches: Vec<SourceBatch>) -> Vec<Item> {
        let mut seen = HashSet::new();
        let mut merged = Vec::new();

        for batch in batches {
            if !self.source_enabled(batch.source) {
                debug!(source = %batch.source, "Skipping disabled source");
                continue;
            }

            for item in batch.items {
                if !item.is_valid() || !self.category_enabled(item.category) {
                    continue;
                }
                if seen.insert((item.category, item.external_id.trim().to_string())) {
                    merged.push(item);
                }
            }
        }

        merged
    }

    /// Fetch from every enabled source in source order.
    ///
    /// A failing source is logged and skipped.
    pub async fn collect_from_sources(&self) -> Vec<Item> {
        let mut sources: Vec<&Arc<dyn ItemSource>> = self
            .sources
            .iter()
            .filter(|s| self.source_enabled(s.source()))
            .collect();
        sources.sort_by_key(|s| MediaSource::ALL.iter().position(|m| *m == s.source()));

        let mut batches = Vec::with_capacity(sources.len());
        for source in sources {
            if self.is_shutting_down() {
                break;
            }
            match source.fetch().await {
                Ok(items) => {
                    debug!(source = %source.source(), count = items.len(), "Fetched candidates");
                    batches.push(SourceBatch::new(source.source(), items));
                }
                Err(e) => warn!(source = %source.source(), "Failed to fetch candidates: {}", e),
            }
        }

        self.gather(batches)
    }

    /// Scheduled run over every target.
    ///
    /// With `None`, candidates are gathered from the registered sources.
    #[instrument(skip(self, items))]
    pub async fn run_scheduled(&self, items: Option<Vec<Item>>) -> ServiceReport {
        let mut report = ServiceReport::default();
        if self.is_shutting_down() {
            warn!("Scheduled run skipped: service is shutting down");
            return report;
        }

        let items = match items {
            Some(items) => items,
            None => self.collect_from_sources().await,
        };
        info!(candidates = items.len(), targets = self.targets.len(), "Scheduled run");

        for target in &self.targets {
            if self.is_shutting_down() {
                warn!("Scheduled run stopped: service is shutting down");
                break;
            }

            let status = match target.try_run(items.clone(), &self.cancel).await {
                Ok(run) => TargetStatus::Completed(run),
                Err(SyncError::RunInProgress { .. }) => {
                    info!(target_store = target.target(), "Target busy, skipping");
                    TargetStatus::Busy
                }
                Err(e) => TargetStatus::Failed(e),
            };
            report.outcomes.push(TargetOutcome {
                target: target.target().to_string(),
                status,
            });
        }

        report
    }

    /// Single-item trigger.
    #[instrument(skip(self, event), fields(source = %event.source, external_id = %event.item.external_id))]
    pub async fn handle_event(&self, event: TriggerEvent) -> EventDisposition {
        if self.is_shutting_down() {
            return EventDisposition::Ignored(IgnoreReason::ShuttingDown);
        }
        if self.targets.is_empty() {
            return EventDisposition::Ignored(IgnoreReason::NoTargets);
        }
        if !self.source_enabled(event.source) {
            return EventDisposition::Ignored(IgnoreReason::SourceDisabled);
        }
        let Some(key) = event.item.unique_key(&self.config.namespace) else {
            return EventDisposition::Ignored(IgnoreReason::InvalidItem);
        };
        if !self.category_enabled(event.item.category) {
            return EventDisposition::Ignored(IgnoreReason::CategoryDisabled);
        }

        let key = key.to_string();
        if self.guard.observe_and_mark(key.clone()).is_some() {
            debug!(%key, "Duplicate trigger suppressed");
            self.event_bus
                .emit(CoreEvent::Collect(CollectEvent::DuplicateSuppressed { key }))
                .ok();
            return EventDisposition::Suppressed;
        }

        let mut report = ServiceReport::default();
        for target in &self.targets {
            if self.is_shutting_down() {
                break;
            }

            let status = match target.run(vec![event.item.clone()], &self.cancel).await {
                Ok(run) => TargetStatus::Completed(run),
                Err(e) => TargetStatus::Failed(e),
            };
            report.outcomes.push(TargetOutcome {
                target: target.target().to_string(),
                status,
            });
        }

        EventDisposition::Processed(report)
    }

    /// Stop in-flight passes and forget recent triggers.
    pub fn shutdown(&self) {
        info!("Shutting down collect service");
        self.cancel.cancel();
        self.guard.clear();
    }
}
