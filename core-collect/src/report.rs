//! Run reports.

use crate::model::{Item, UniqueKey};
use crate::planner::{MemoryAction, Strategy};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

/// Unique identifier for a reconciliation run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(Uuid);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum ItemStatus {
    Created,
    /// Catalog has no entry for the item
    LookupMissing,
    LookupFailed(String),
    CreateFailed(String),
}

impl ItemStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, ItemStatus::Created)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemOutcome {
    pub key: UniqueKey,
    pub item: Item,
    pub status: ItemStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: RunId,
    pub target: String,
    /// `None` when the run had nothing to do
    pub strategy: Option<Strategy>,
    /// Valid, deduplicated candidates handed to the planner
    pub candidates: usize,
    /// Items dropped for missing identity fields
    pub rejected: usize,
    pub outcomes: Vec<ItemOutcome>,
    pub memory_action: MemoryAction,
    pub duration: Duration,
}

impl RunReport {
    pub fn empty(run_id: RunId, target: impl Into<String>, rejected: usize) -> Self {
        Self {
            run_id,
            target: target.into(),
            strategy: None,
            candidates: 0,
            rejected,
            outcomes: Vec::new(),
            memory_action: MemoryAction::Unchanged,
            duration: Duration::ZERO,
        }
    }

    pub fn attempted_count(&self) -> usize {
        self.outcomes.len()
    }

    pub fn success_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.status.is_success()).count()
    }

    pub fn failure_count(&self) -> usize {
        self.attempted_count() - self.success_count()
    }

    pub fn succeeded_keys(&self) -> HashSet<UniqueKey> {
        self.outcomes
            .iter()
            .filter(|o| o.status.is_success())
            .map(|o| o.key.clone())
            .collect()
    }

    pub fn succeeded_items(&self) -> Vec<&Item> {
        self.outcomes
            .iter()
            .filter(|o| o.status.is_success())
            .map(|o| &o.item)
            .collect()
    }
}
