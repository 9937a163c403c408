//! # Reconciliation Planner
//!
//! Decides, for one run against one target, which candidates need pushing
//! and how the local memory must change afterwards.
//!
//! ## Strategies
//!
//! Evaluated in order, first match wins:
//!
//! 1. **FullCoverage** - forced re-check: probe the remote store and push the
//!    incoming candidates followed by every key found remotely. Memory is
//!    replaced when the successes exceed the threshold, otherwise cleared.
//! 2. **DirectPush** - the batch is small: push everything without an
//!    existence check. Successes are appended only if memory already exists.
//! 3. **MemoryFiltered** - memory exists: push candidates memory does not
//!    know about and append the successes.
//! 4. **RemoteFiltered** - no memory and a large batch: probe the remote
//!    store and push candidates it does not hold. Memory is initialized once
//!    the remote count plus successes exceeds the threshold.
//!
//! Probe results are re-keyed into the planner's namespace, so a provider
//! that reports keys under its own prefix still matches local candidates.
//!
//! Memory is never touched here. The coordinator applies the returned
//! [`MemoryUpdate`] only after a run completes.

use crate::memory::MemoryStore;
use crate::model::{Item, UniqueKey};
use crate::remote::RemoteStoreClient;
use crate::{Result, SyncError};
use core_runtime::config::CollectConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    FullCoverage,
    DirectPush,
    MemoryFiltered,
    RemoteFiltered,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::FullCoverage => "full_coverage",
            Strategy::DirectPush => "direct_push",
            Strategy::MemoryFiltered => "memory_filtered",
            Strategy::RemoteFiltered => "remote_filtered",
        }
    }

    /// Whether this strategy probes the remote store.
    pub fn probes_remote(&self) -> bool {
        matches!(self, Strategy::FullCoverage | Strategy::RemoteFiltered)
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pick the strategy for a run.
pub fn choose_strategy(
    full_coverage: bool,
    candidate_count: usize,
    small_batch_limit: usize,
    memory_exists: bool,
) -> Strategy {
    if full_coverage {
        Strategy::FullCoverage
    } else if candidate_count <= small_batch_limit {
        Strategy::DirectPush
    } else if memory_exists {
        Strategy::MemoryFiltered
    } else {
        Strategy::RemoteFiltered
    }
}

/// A valid, deduplicated item paired with its key.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub key: UniqueKey,
    pub item: Item,
}

/// Candidates that survived validation plus the number that did not.
#[derive(Debug, Clone, Default)]
pub struct PreparedBatch {
    pub candidates: Vec<Candidate>,
    pub rejected: usize,
    pub duplicates: usize,
}

/// Drop invalid items and duplicate identities, keeping the first occurrence.
pub fn prepare_candidates(items: Vec<Item>, namespace: &str) -> PreparedBatch {
    let mut batch = PreparedBatch::default();
    let mut seen = HashSet::with_capacity(items.len());

    for item in items {
        let Some(key) = item.unique_key(namespace) else {
            debug!(external_id = %item.external_id, "Dropping invalid item");
            batch.rejected += 1;
            continue;
        };

        if seen.insert(key.clone()) {
            batch.candidates.push(Candidate { key, item });
        } else {
            batch.duplicates += 1;
        }
    }

    batch
}

/// Memory change to apply after a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemoryUpdate {
    /// Replace memory with this set
    Save(HashSet<UniqueKey>),
    /// Union this set into memory
    Append(HashSet<UniqueKey>),
    /// Clear memory
    Reset,
    /// Leave memory alone
    Unchanged,
}

impl MemoryUpdate {
    pub fn action(&self) -> MemoryAction {
        match self {
            MemoryUpdate::Save(_) => MemoryAction::Saved,
            MemoryUpdate::Append(_) => MemoryAction::Appended,
            MemoryUpdate::Reset => MemoryAction::Reset,
            MemoryUpdate::Unchanged => MemoryAction::Unchanged,
        }
    }
}

/// What happened to memory, without the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryAction {
    Saved,
    Appended,
    Reset,
    Unchanged,
}

impl MemoryAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemoryAction::Saved => "saved",
            MemoryAction::Appended => "appended",
            MemoryAction::Reset => "reset",
            MemoryAction::Unchanged => "unchanged",
        }
    }
}

impl fmt::Display for MemoryAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of planning one run.
#[derive(Debug, Clone)]
pub struct Plan {
    pub strategy: Strategy,
    /// Ordered work list
    pub work: Vec<Candidate>,
    /// Memory contents when the run started
    pub memory_before: HashSet<UniqueKey>,
    /// Keys found by the remote probe; empty unless the strategy probes
    pub remote_existing: HashSet<UniqueKey>,
    /// Candidates skipped because memory or the remote already had them
    pub skipped: usize,
}

impl Plan {
    /// Memory change given the keys pushed successfully.
    ///
    /// Thresholds compare strictly: a count equal to the threshold does not
    /// warrant persisting memory.
    pub fn memory_update(&self, succeeded: &HashSet<UniqueKey>, threshold: usize) -> MemoryUpdate {
        let memory_exists = !self.memory_before.is_empty();

        match self.strategy {
            Strategy::FullCoverage => {
                if succeeded.len() > threshold {
                    MemoryUpdate::Save(succeeded.clone())
                } else if memory_exists {
                    MemoryUpdate::Reset
                } else {
                    MemoryUpdate::Unchanged
                }
            }
            Strategy::DirectPush | Strategy::MemoryFiltered => {
                if memory_exists && !succeeded.is_empty() {
                    MemoryUpdate::Append(succeeded.clone())
                } else {
                    MemoryUpdate::Unchanged
                }
            }
            Strategy::RemoteFiltered => {
                // Probe results and successes are assumed disjoint.
                if self.remote_existing.len() + succeeded.len() > threshold {
                    MemoryUpdate::Save(self.remote_existing.union(succeeded).cloned().collect())
                } else {
                    MemoryUpdate::Unchanged
                }
            }
        }
    }
}

pub struct ReconciliationPlanner {
    target: String,
    namespace: String,
    memory: Arc<dyn MemoryStore>,
    remote: Arc<dyn RemoteStoreClient>,
    small_batch_limit: usize,
}

impl ReconciliationPlanner {
    /// Uses the namespace and small-batch limit from `config`.
    pub fn new(
        target: impl Into<String>,
        memory: Arc<dyn MemoryStore>,
        remote: Arc<dyn RemoteStoreClient>,
        config: &CollectConfig,
    ) -> Self {
        Self {
            target: target.into(),
            namespace: config.namespace.clone(),
            memory,
            remote,
            small_batch_limit: config.small_batch_limit,
        }
    }

    /// Build the work list for `candidates`.
    ///
    /// A failed probe aborts the plan; nothing is pushed.
    pub async fn plan(&self, candidates: Vec<Candidate>, full_coverage: bool) -> Result<Plan> {
        let memory_before = self.memory.load().await?;
        let strategy = choose_strategy(
            full_coverage,
            candidates.len(),
            self.small_batch_limit,
            !memory_before.is_empty(),
        );

        let remote_existing = if strategy.probes_remote() {
            self.probe().await?
        } else {
            HashSet::new()
        };

        let total = candidates.len();
        let work = match strategy {
            Strategy::FullCoverage => merge_with_remote(candidates, &remote_existing),
            Strategy::DirectPush => candidates,
            Strategy::MemoryFiltered => exclude(candidates, &memory_before),
            Strategy::RemoteFiltered => exclude(candidates, &remote_existing),
        };
        let skipped = match strategy {
            Strategy::FullCoverage => 0,
            _ => total - work.len(),
        };

        info!(
            target_store = %self.target,
            %strategy,
            candidates = total,
            work = work.len(),
            memory = memory_before.len(),
            remote = remote_existing.len(),
            "Planned run"
        );

        Ok(Plan {
            strategy,
            work,
            memory_before,
            remote_existing,
            skipped,
        })
    }

    async fn probe(&self) -> Result<HashSet<UniqueKey>> {
        let filter = self.remote.existing_filter();
        let found = self
            .remote
            .search_existing(&filter)
            .await
            .map_err(|e| SyncError::ProbeFailed {
                target: self.target.clone(),
                message: e.to_string(),
            })?;
        Ok(rekey(found, &self.namespace))
    }
}

/// Move every key into `namespace`, keeping category and external id.
fn rekey(found: HashSet<UniqueKey>, namespace: &str) -> HashSet<UniqueKey> {
    found
        .into_iter()
        .filter_map(|key| {
            if key.namespace() == namespace {
                Some(key)
            } else {
                UniqueKey::new(namespace, key.category(), key.external_id()).ok()
            }
        })
        .collect()
}

fn exclude(candidates: Vec<Candidate>, known: &HashSet<UniqueKey>) -> Vec<Candidate> {
    candidates
        .into_iter()
        .filter(|candidate| !known.contains(&candidate.key))
        .collect()
}

/// Incoming candidates first, then remote keys in sorted order, first wins.
fn merge_with_remote(candidates: Vec<Candidate>, remote: &HashSet<UniqueKey>) -> Vec<Candidate> {
    let mut seen: HashSet<UniqueKey> = candidates.iter().map(|c| c.key.clone()).collect();
    let mut placeholders: Vec<&UniqueKey> = remote.iter().collect();
    placeholders.sort();

    let mut work = candidates;
    for key in placeholders {
        if seen.insert(key.clone()) {
            work.push(Candidate {
                key: key.clone(),
                item: Item::placeholder(key),
            });
        }
    }
    work
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::DisplayRecord;
    use crate::memory::SettingsMemoryStore;
    use crate::model::Category;
    use async_trait::async_trait;
    use bridge_desktop::MemorySettingsStore;
    use bridge_traits::error::Result as BridgeResult;
    use mockall::mock;

    mock! {
        Remote {}

        #[async_trait]
        impl RemoteStoreClient for Remote {
            fn name(&self) -> &'static str;
            fn existing_filter(&self) -> String;
            async fn search_existing(&self, filter: &str) -> BridgeResult<HashSet<UniqueKey>>;
            async fn create(&self, record: &DisplayRecord) -> BridgeResult<()>;
        }
    }

    fn key(id: &str) -> UniqueKey {
        UniqueKey::new("tmdb", Category::Movie, id).unwrap()
    }

    fn candidate(id: &str) -> Candidate {
        Candidate {
            key: key(id),
            item: Item::new(Category::Movie, id),
        }
    }

    fn keys(ids: &[&str]) -> HashSet<UniqueKey> {
        ids.iter().map(|id| key(id)).collect()
    }

    #[test]
    fn test_choose_strategy_precedence() {
        assert_eq!(choose_strategy(true, 1, 10, true), Strategy::FullCoverage);
        assert_eq!(choose_strategy(true, 100, 10, false), Strategy::FullCoverage);
        assert_eq!(choose_strategy(false, 10, 10, true), Strategy::DirectPush);
        assert_eq!(choose_strategy(false, 5, 10, false), Strategy::DirectPush);
        assert_eq!(choose_strategy(false, 11, 10, true), Strategy::MemoryFiltered);
        assert_eq!(choose_strategy(false, 11, 10, false), Strategy::RemoteFiltered);
    }

    #[test]
    fn test_prepare_candidates_drops_invalid_and_duplicates() {
        let items = vec![
            Item::new(Category::Movie, "1").with_title("first"),
            Item::new(Category::Movie, ""),
            Item {
                external_id: "2".into(),
                ..Item::default()
            },
            Item::new(Category::Movie, "1").with_title("second"),
            Item::new(Category::Tv, "1"),
        ];

        let batch = prepare_candidates(items, "tmdb");

        assert_eq!(batch.rejected, 2);
        assert_eq!(batch.duplicates, 1);
        assert_eq!(batch.candidates.len(), 2);
        assert_eq!(batch.candidates[0].item.title.as_deref(), Some("first"));
        assert_eq!(batch.candidates[1].key.to_string(), "tmdb:tv:1");
    }

    #[test]
    fn test_merge_with_remote_keeps_incoming_first() {
        let work = merge_with_remote(
            vec![candidate("5"), candidate("1")],
            &keys(&["3", "1", "2"]),
        );

        let order: Vec<_> = work.iter().map(|c| c.key.external_id().to_string()).collect();
        assert_eq!(order, vec!["5", "1", "2", "3"]);
    }

    fn plan(strategy: Strategy, memory: &[&str], remote: &[&str]) -> Plan {
        Plan {
            strategy,
            work: Vec::new(),
            memory_before: keys(memory),
            remote_existing: keys(remote),
            skipped: 0,
        }
    }

    #[test]
    fn test_memory_update_full_coverage() {
        let p = plan(Strategy::FullCoverage, &["9"], &["1"]);
        assert_eq!(
            p.memory_update(&keys(&["1", "2"]), 1),
            MemoryUpdate::Save(keys(&["1", "2"]))
        );
        assert_eq!(p.memory_update(&keys(&["1", "2"]), 2), MemoryUpdate::Reset);

        let p = plan(Strategy::FullCoverage, &[], &["1"]);
        assert_eq!(p.memory_update(&keys(&["1"]), 10), MemoryUpdate::Unchanged);
    }

    #[test]
    fn test_memory_update_direct_push_appends_only_to_existing_memory() {
        let with_memory = plan(Strategy::DirectPush, &["1"], &[]);
        assert_eq!(
            with_memory.memory_update(&keys(&["2"]), 10),
            MemoryUpdate::Append(keys(&["2"]))
        );
        assert_eq!(with_memory.memory_update(&HashSet::new(), 10), MemoryUpdate::Unchanged);

        let without_memory = plan(Strategy::DirectPush, &[], &[]);
        assert_eq!(without_memory.memory_update(&keys(&["2"]), 0), MemoryUpdate::Unchanged);
    }

    #[test]
    fn test_memory_update_memory_filtered_appends() {
        let p = plan(Strategy::MemoryFiltered, &["1", "2"], &[]);
        assert_eq!(p.memory_update(&keys(&["3"]), 1), MemoryUpdate::Append(keys(&["3"])));
        assert_eq!(p.memory_update(&HashSet::new(), 1), MemoryUpdate::Unchanged);
    }

    #[test]
    fn test_memory_past_threshold_is_kept_by_filtered_runs() {
        let p = plan(Strategy::MemoryFiltered, &["1", "2", "3"], &[]);
        assert_eq!(p.memory_update(&keys(&["4"]), 1), MemoryUpdate::Append(keys(&["4"])));

        let p = plan(Strategy::DirectPush, &["1", "2", "3"], &[]);
        assert_eq!(p.memory_update(&HashSet::new(), 1), MemoryUpdate::Unchanged);
    }

    #[test]
    fn test_rekey_moves_foreign_keys_into_namespace() {
        let found: HashSet<UniqueKey> = [
            UniqueKey::new("tmdb", Category::Movie, "1").unwrap(),
            UniqueKey::new("mp", Category::Tv, "2").unwrap(),
        ]
        .into_iter()
        .collect();

        let mut rekeyed: Vec<String> = rekey(found, "mp").iter().map(ToString::to_string).collect();
        rekeyed.sort();

        assert_eq!(rekeyed, vec!["mp:movie:1", "mp:tv:2"]);
    }

    #[tokio::test]
    async fn test_remote_filter_matches_keys_from_another_namespace() {
        let mut remote = MockRemote::new();
        remote
            .expect_existing_filter()
            .return_const("#media".to_string());
        remote.expect_search_existing().times(1).returning(|_| {
            Ok([UniqueKey::new("tmdb", Category::Movie, "1").unwrap()]
                .into_iter()
                .collect())
        });

        let memory = Arc::new(SettingsMemoryStore::new(
            Arc::new(MemorySettingsStore::new()),
            "linkding",
        ));
        let config = CollectConfig::builder()
            .namespace("mp")
            .small_batch_limit(1)
            .build()
            .unwrap();
        let planner = ReconciliationPlanner::new("linkding", memory, Arc::new(remote), &config);

        let batch = prepare_candidates(
            vec![Item::new(Category::Movie, "1"), Item::new(Category::Movie, "2")],
            "mp",
        );
        let plan = planner.plan(batch.candidates, false).await.unwrap();

        assert_eq!(plan.strategy, Strategy::RemoteFiltered);
        assert_eq!(plan.skipped, 1);
        assert_eq!(plan.work.len(), 1);
        assert_eq!(plan.work[0].key.to_string(), "mp:movie:2");
        assert_eq!(
            plan.remote_existing,
            [UniqueKey::new("mp", Category::Movie, "1").unwrap()]
                .into_iter()
                .collect()
        );
    }

    #[tokio::test]
    async fn test_full_coverage_does_not_duplicate_foreign_keys() {
        let mut remote = MockRemote::new();
        remote
            .expect_existing_filter()
            .return_const("#media".to_string());
        remote.expect_search_existing().returning(|_| {
            Ok([
                UniqueKey::new("tmdb", Category::Movie, "1").unwrap(),
                UniqueKey::new("tmdb", Category::Movie, "3").unwrap(),
            ]
            .into_iter()
            .collect())
        });

        let memory = Arc::new(SettingsMemoryStore::new(
            Arc::new(MemorySettingsStore::new()),
            "linkding",
        ));
        let config = CollectConfig::builder().namespace("mp").build().unwrap();
        let planner = ReconciliationPlanner::new("linkding", memory, Arc::new(remote), &config);

        let batch = prepare_candidates(vec![Item::new(Category::Movie, "1")], "mp");
        let plan = planner.plan(batch.candidates, true).await.unwrap();

        let order: Vec<String> = plan.work.iter().map(|c| c.key.to_string()).collect();
        assert_eq!(order, vec!["mp:movie:1", "mp:movie:3"]);
    }

    #[test]
    fn test_memory_update_remote_filtered_initializes_past_threshold() {
        let p = plan(Strategy::RemoteFiltered, &[], &["1", "2"]);
        assert_eq!(
            p.memory_update(&keys(&["3"]), 2),
            MemoryUpdate::Save(keys(&["1", "2", "3"]))
        );
        assert_eq!(p.memory_update(&keys(&["3"]), 3), MemoryUpdate::Unchanged);
    }
}
