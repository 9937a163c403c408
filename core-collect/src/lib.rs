//! # Core Collect
//!
//! Reconciliation engine that keeps a remote store (e.g. a Linkding bookmark
//! server) in step with the media items a host knows about.
//!
//! ## Overview
//!
//! For each sync target the engine decides which candidate items still need
//! pushing, pushes them, and maintains a local *memory* of keys already
//! known to exist remotely so that large collections are not probed on every
//! run. Duplicate single-item triggers are collapsed by an idempotency guard.
//!
//! ## Components
//!
//! - [`model`] - `Item`, `Category`, `MediaSource`, `UniqueKey`
//! - [`idempotency`] - `IdempotencyGuard` over a TTL+LRU [`cache`]
//! - [`memory`] - `MemoryStore` and the settings-backed implementation
//! - [`remote`] / [`catalog`] - seams to the remote store and catalog
//! - [`planner`] - strategy selection and post-run memory update
//! - [`executor`] - pushes a work list with bounded concurrency
//! - [`coordinator`] - one serialized pass per target
//! - [`service`] - scheduled and event-driven triggers over all targets

pub mod cache;
pub mod catalog;
pub mod coordinator;
pub mod error;
pub mod executor;
pub mod idempotency;
pub mod memory;
pub mod model;
pub mod planner;
pub mod remote;
pub mod report;
pub mod service;

pub use catalog::{CachedCatalog, CatalogLookup, CatalogSource, DisplayRecord};
pub use coordinator::{CollectCoordinator, FullCoverageFlag};
pub use error::{Result, SyncError};
pub use idempotency::IdempotencyGuard;
pub use memory::{MemoryStore, SettingsMemoryStore};
pub use model::{Category, Item, MediaSource, UniqueKey};
pub use planner::{MemoryAction, MemoryUpdate, Strategy};
pub use remote::RemoteStoreClient;
pub use report::{ItemOutcome, ItemStatus, RunId, RunReport};
pub use service::{
    CollectService, EventDisposition, IgnoreReason, ItemSource, ServiceReport, SourceBatch,
    TargetOutcome, TargetStatus, TriggerEvent,
};
