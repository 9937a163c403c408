//! Shared fakes for core-collect integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use bridge_desktop::MemorySettingsStore;
use bridge_traits::error::{BridgeError, Result as BridgeResult};
use core_collect::{
    CatalogLookup, Category, CollectCoordinator, DisplayRecord, Item, MemoryStore,
    RemoteStoreClient, SettingsMemoryStore, UniqueKey,
};
use core_runtime::config::{CollectConfig, CollectConfigBuilder};
use core_runtime::events::EventBus;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex as AsyncMutex, Notify, Semaphore};
use tokio_util::sync::CancellationToken;

// ============================================================================
// Fake Remote Store
// ============================================================================

/// Remote store held in memory. Created records become visible to later
/// probes, as on a real server.
#[derive(Default)]
pub struct FakeRemote {
    existing: AsyncMutex<HashSet<UniqueKey>>,
    created: AsyncMutex<Vec<DisplayRecord>>,
    probes: AtomicUsize,
    fail_probe: AtomicBool,
    rejected_ids: HashSet<String>,
    cancel_after: Option<(usize, CancellationToken)>,
    gate: Option<(Arc<Notify>, Arc<Semaphore>)>,
}

impl FakeRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_existing(self, keys: impl IntoIterator<Item = UniqueKey>) -> Self {
        Self {
            existing: AsyncMutex::new(keys.into_iter().collect()),
            ..self
        }
    }

    pub fn failing_probe(self) -> Self {
        self.fail_probe.store(true, Ordering::SeqCst);
        self
    }

    pub fn rejecting(mut self, ids: &[&str]) -> Self {
        self.rejected_ids = ids.iter().map(|id| id.to_string()).collect();
        self
    }

    /// Cancel `token` once `count` records have been created.
    pub fn cancel_after(mut self, count: usize, token: CancellationToken) -> Self {
        self.cancel_after = Some((count, token));
        self
    }

    /// Block every create until a permit is added to `gate`; `entered` is
    /// notified when a create starts waiting.
    pub fn gated(mut self, entered: Arc<Notify>, gate: Arc<Semaphore>) -> Self {
        self.gate = Some((entered, gate));
        self
    }

    pub fn probe_count(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }

    pub async fn created_ids(&self) -> Vec<String> {
        self.created
            .lock()
            .await
            .iter()
            .map(|r| r.external_id.clone())
            .collect()
    }

    pub async fn created(&self) -> Vec<DisplayRecord> {
        self.created.lock().await.clone()
    }
}

#[async_trait]
impl RemoteStoreClient for FakeRemote {
    fn name(&self) -> &'static str {
        "fake"
    }

    fn existing_filter(&self) -> String {
        "#media".to_string()
    }

    async fn search_existing(&self, _filter: &str) -> BridgeResult<HashSet<UniqueKey>> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        if self.fail_probe.load(Ordering::SeqCst) {
            return Err(BridgeError::OperationFailed("connection refused".to_string()));
        }
        Ok(self.existing.lock().await.clone())
    }

    async fn create(&self, record: &DisplayRecord) -> BridgeResult<()> {
        if let Some((entered, gate)) = &self.gate {
            entered.notify_one();
            gate.acquire()
                .await
                .map_err(|e| BridgeError::OperationFailed(e.to_string()))?
                .forget();
        }

        if self.rejected_ids.contains(&record.external_id) {
            return Err(BridgeError::OperationFailed("HTTP 400".to_string()));
        }

        let key = UniqueKey::new("tmdb", record.category, &record.external_id)
            .map_err(|e| BridgeError::OperationFailed(e.to_string()))?;
        self.existing.lock().await.insert(key);

        let mut created = self.created.lock().await;
        created.push(record.clone());

        if let Some((count, token)) = &self.cancel_after {
            if created.len() >= *count {
                token.cancel();
            }
        }
        Ok(())
    }
}

// ============================================================================
// Fake Catalog
// ============================================================================

#[derive(Default)]
pub struct FakeCatalog {
    missing: HashSet<String>,
    lookups: AtomicUsize,
}

impl FakeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn missing(ids: &[&str]) -> Self {
        Self {
            missing: ids.iter().map(|id| id.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CatalogLookup for FakeCatalog {
    async fn lookup(
        &self,
        category: Category,
        external_id: &str,
    ) -> BridgeResult<Option<DisplayRecord>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if self.missing.contains(external_id) {
            return Ok(None);
        }
        Ok(Some(DisplayRecord::new(
            category,
            external_id,
            format!("Title {}", external_id),
        )))
    }
}

// ============================================================================
// Helpers
// ============================================================================

pub fn movie(id: impl ToString) -> Item {
    Item::new(Category::Movie, id.to_string())
}

pub fn movies(ids: std::ops::Range<usize>) -> Vec<Item> {
    ids.map(movie).collect()
}

pub fn key(id: impl ToString) -> UniqueKey {
    UniqueKey::new("tmdb", Category::Movie, &id.to_string()).unwrap()
}

pub fn keys(ids: std::ops::Range<usize>) -> HashSet<UniqueKey> {
    ids.map(key).collect()
}

pub fn config() -> CollectConfigBuilder {
    CollectConfig::builder().max_concurrent_pushes(4)
}

pub struct Harness {
    pub coordinator: Arc<CollectCoordinator>,
    pub remote: Arc<FakeRemote>,
    pub catalog: Arc<FakeCatalog>,
    pub memory: Arc<SettingsMemoryStore>,
    pub event_bus: EventBus,
}

impl Harness {
    pub fn new(remote: FakeRemote, config: CollectConfig) -> Self {
        Self::with_catalog(remote, FakeCatalog::new(), config)
    }

    pub fn with_catalog(remote: FakeRemote, catalog: FakeCatalog, config: CollectConfig) -> Self {
        Self::named("fake", remote, catalog, config)
    }

    pub fn named(
        target: &str,
        remote: FakeRemote,
        catalog: FakeCatalog,
        config: CollectConfig,
    ) -> Self {
        let remote = Arc::new(remote);
        let catalog = Arc::new(catalog);
        let settings = Arc::new(MemorySettingsStore::new());
        let memory = Arc::new(SettingsMemoryStore::new(settings, target));
        let event_bus = EventBus::new(256);

        let coordinator = CollectCoordinator::new(
            target,
            config,
            remote.clone(),
            catalog.clone(),
            memory.clone(),
            event_bus.clone(),
        )
        .unwrap();

        Self {
            coordinator: Arc::new(coordinator),
            remote,
            catalog,
            memory,
            event_bus,
        }
    }

    pub async fn seed_memory(&self, keys: HashSet<UniqueKey>) {
        self.memory.save(&keys).await.unwrap();
    }

    pub async fn memory(&self) -> HashSet<UniqueKey> {
        self.memory.load().await.unwrap()
    }
}
