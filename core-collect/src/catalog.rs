//! # Catalog Lookup
//!
//! Resolves `(category, external_id)` into the display details a remote
//! record is built from. Lookups hit an external metadata service, so the
//! engine wraps them in [`CachedCatalog`], a short-lived cache keyed by
//! identity.

use crate::cache::TtlCache;
use crate::model::Category;
use async_trait::async_trait;
use bridge_traits::error::Result;
use bridge_traits::time::Clock;
use core_runtime::config::CollectConfig;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Which catalog a record was resolved from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogSource {
    #[default]
    Tmdb,
    Douban,
}

/// Display details for one item.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DisplayRecord {
    pub category: Category,
    pub external_id: String,
    pub title: String,
    pub original_title: Option<String>,
    pub year: Option<String>,
    pub overview: Option<String>,
    pub vote_average: Option<f64>,
    /// Runtime in minutes
    pub runtime: Option<u32>,
    /// Finer-grained kind, e.g. "Anime" or "Documentary"
    pub sub_category: Option<String>,
    pub genres: Vec<String>,
    pub directors: Vec<String>,
    pub actors: Vec<String>,
    pub detail_link: Option<String>,
    pub imdb_id: Option<String>,
    pub tvdb_id: Option<String>,
    pub douban_id: Option<String>,
    pub source: CatalogSource,
}

impl DisplayRecord {
    pub fn new(category: Category, external_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            category,
            external_id: external_id.into(),
            title: title.into(),
            ..Self::default()
        }
    }
}

#[async_trait]
pub trait CatalogLookup: Send + Sync {
    /// `Ok(None)` when the catalog has no entry for the identity.
    async fn lookup(&self, category: Category, external_id: &str) -> Result<Option<DisplayRecord>>;
}

/// [`CatalogLookup`] decorator that remembers answers for a while.
///
/// Misses are cached like hits; errors are not.
pub struct CachedCatalog {
    inner: Arc<dyn CatalogLookup>,
    cache: TtlCache<(Category, String), Option<DisplayRecord>>,
}

impl CachedCatalog {
    pub fn new(
        inner: Arc<dyn CatalogLookup>,
        capacity: usize,
        ttl: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            inner,
            cache: TtlCache::new(capacity, ttl, clock),
        }
    }

    /// Sized and timed by `catalog_cache_capacity` / `catalog_cache_ttl`.
    pub fn from_config(
        inner: Arc<dyn CatalogLookup>,
        config: &CollectConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self::new(
            inner,
            config.catalog_cache_capacity,
            config.catalog_cache_ttl,
            clock,
        )
    }

    pub fn clear(&self) {
        self.cache.clear();
    }
}

#[async_trait]
impl CatalogLookup for CachedCatalog {
    async fn lookup(&self, category: Category, external_id: &str) -> Result<Option<DisplayRecord>> {
        let key = (category, external_id.to_string());
        if let Some(cached) = self.cache.get(&key) {
            debug!(%category, external_id, "Catalog cache hit");
            return Ok(cached);
        }

        let resolved = self.inner.lookup(category, external_id).await?;
        self.cache.insert(key, resolved.clone());
        Ok(resolved)
    }
}
