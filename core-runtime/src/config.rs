//! # Collect Configuration Module
//!
//! Typed configuration for the collection core.
//!
//! ## Overview
//!
//! [`CollectConfig`] replaces a loosely typed key/value settings map with named
//! fields and documented defaults. It is built through [`CollectConfigBuilder`]
//! and validated on `build()`, failing fast with actionable messages.
//!
//! Values that a user may leave unset keep two accessors: the raw getter
//! (returns `Option`) and an `_or_default` getter that applies the documented
//! default.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::CollectConfig;
//! use std::time::Duration;
//!
//! let config = CollectConfig::builder()
//!     .memory_threshold(500)
//!     .max_concurrent_pushes(2)
//!     .enabled_categories(["movie", "tv"])
//!     .build()?;
//!
//! assert_eq!(config.memory_threshold_or_default(), 500);
//! # Ok::<(), core_runtime::Error>(())
//! ```

use crate::error::{Error, Result};
use std::collections::BTreeSet;
use std::time::Duration;

/// Threshold above which the synced-item memory is worth persisting.
pub const DEFAULT_MEMORY_THRESHOLD: usize = 1000;
/// Batches of at most this many items are pushed without an existence check.
pub const DEFAULT_SMALL_BATCH_LIMIT: usize = 10;
pub const DEFAULT_NAMESPACE: &str = "tmdb";
pub const DEFAULT_IDEMPOTENCY_TTL: Duration = Duration::from_secs(5 * 60);
pub const DEFAULT_IDEMPOTENCY_CAPACITY: usize = 1000;
pub const DEFAULT_CATALOG_CACHE_TTL: Duration = Duration::from_secs(10 * 60);
pub const DEFAULT_CATALOG_CACHE_CAPACITY: usize = 10_000;
pub const DEFAULT_RUN_TIMEOUT: Duration = Duration::from_secs(60 * 60);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

const MAX_CONCURRENT_PUSHES: usize = 32;

/// Item sources enabled when none are configured.
pub const ALL_SOURCES: &[&str] = &["library", "subscription", "subscription_history"];
/// Item categories enabled when none are configured.
pub const ALL_CATEGORIES: &[&str] = &["movie", "tv", "collection"];

/// Configuration of the reconciliation engine and its triggers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectConfig {
    memory_threshold: Option<usize>,

    /// Upper bound (inclusive) for the direct-push branch.
    pub small_batch_limit: usize,

    /// Namespace prefix of every unique key (`<namespace>:<category>:<id>`).
    pub namespace: String,

    /// How long a trigger key is remembered for duplicate suppression.
    pub idempotency_ttl: Duration,
    pub idempotency_capacity: usize,

    /// How long catalog lookups are cached.
    pub catalog_cache_ttl: Duration,
    pub catalog_cache_capacity: usize,

    /// Number of remote creates in flight at once within one pass.
    pub max_concurrent_pushes: usize,

    /// Upper bound on a whole pass, remote probe included.
    pub run_timeout: Duration,
    /// Upper bound on a single remote request.
    pub request_timeout: Duration,

    /// Canonical names of the item sources that feed runs.
    pub enabled_sources: BTreeSet<String>,
    /// Canonical names of the item categories that are collected.
    pub enabled_categories: BTreeSet<String>,

    /// Arm the one-shot full-coverage pass on startup.
    pub full_coverage_on_start: bool,
}

impl Default for CollectConfig {
    fn default() -> Self {
        Self {
            memory_threshold: None,
            small_batch_limit: DEFAULT_SMALL_BATCH_LIMIT,
            namespace: DEFAULT_NAMESPACE.to_string(),
            idempotency_ttl: DEFAULT_IDEMPOTENCY_TTL,
            idempotency_capacity: DEFAULT_IDEMPOTENCY_CAPACITY,
            catalog_cache_ttl: DEFAULT_CATALOG_CACHE_TTL,
            catalog_cache_capacity: DEFAULT_CATALOG_CACHE_CAPACITY,
            max_concurrent_pushes: 1,
            run_timeout: DEFAULT_RUN_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            enabled_sources: ALL_SOURCES.iter().map(|s| s.to_string()).collect(),
            enabled_categories: ALL_CATEGORIES.iter().map(|s| s.to_string()).collect(),
            full_coverage_on_start: false,
        }
    }
}

impl CollectConfig {
    /// Creates a new builder for constructing a `CollectConfig`.
    pub fn builder() -> CollectConfigBuilder {
        CollectConfigBuilder::default()
    }

    /// The user-provided memory threshold, if any.
    pub fn memory_threshold(&self) -> Option<usize> {
        self.memory_threshold
    }

    /// The memory threshold, falling back to [`DEFAULT_MEMORY_THRESHOLD`].
    pub fn memory_threshold_or_default(&self) -> usize {
        self.memory_threshold.unwrap_or(DEFAULT_MEMORY_THRESHOLD)
    }

    pub fn is_source_enabled(&self, source: &str) -> bool {
        self.enabled_sources.contains(&normalize_name(source))
    }

    pub fn is_category_enabled(&self, category: &str) -> bool {
        self.enabled_categories.contains(&normalize_name(category))
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - The namespace is non-empty and contains no `:` separator
    /// - Capacities and timeouts are non-zero
    /// - Push concurrency is between 1 and 32
    pub fn validate(&self) -> Result<()> {
        if self.namespace.trim().is_empty() {
            return Err(Error::Config("Namespace cannot be empty".to_string()));
        }

        if self.namespace.contains(':') {
            return Err(Error::Config(format!(
                "Namespace '{}' must not contain ':' (it separates unique key parts)",
                self.namespace
            )));
        }

        if self.idempotency_capacity == 0 || self.catalog_cache_capacity == 0 {
            return Err(Error::Config(
                "Cache capacities must be greater than 0".to_string(),
            ));
        }

        if self.idempotency_ttl.is_zero() || self.catalog_cache_ttl.is_zero() {
            return Err(Error::Config(
                "Cache TTLs must be greater than 0".to_string(),
            ));
        }

        if self.run_timeout.is_zero() || self.request_timeout.is_zero() {
            return Err(Error::Config("Timeouts must be greater than 0".to_string()));
        }

        if self.max_concurrent_pushes == 0 || self.max_concurrent_pushes > MAX_CONCURRENT_PUSHES {
            return Err(Error::Config(format!(
                "max_concurrent_pushes must be between 1 and {}, got {}",
                MAX_CONCURRENT_PUSHES, self.max_concurrent_pushes
            )));
        }

        Ok(())
    }
}

fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

fn normalize_names<I, S>(names: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names
        .into_iter()
        .map(|name| normalize_name(name.as_ref()))
        .filter(|name| !name.is_empty())
        .collect()
}

/// Builder for [`CollectConfig`].
#[derive(Debug, Default)]
pub struct CollectConfigBuilder {
    memory_threshold: Option<usize>,
    small_batch_limit: Option<usize>,
    namespace: Option<String>,
    idempotency_ttl: Option<Duration>,
    idempotency_capacity: Option<usize>,
    catalog_cache_ttl: Option<Duration>,
    catalog_cache_capacity: Option<usize>,
    max_concurrent_pushes: Option<usize>,
    run_timeout: Option<Duration>,
    request_timeout: Option<Duration>,
    enabled_sources: Option<BTreeSet<String>>,
    enabled_categories: Option<BTreeSet<String>>,
    full_coverage_on_start: bool,
}

impl CollectConfigBuilder {
    /// Sets the memory threshold.
    pub fn memory_threshold(mut self, threshold: usize) -> Self {
        self.memory_threshold = Some(threshold);
        self
    }

    pub fn small_batch_limit(mut self, limit: usize) -> Self {
        self.small_batch_limit = Some(limit);
        self
    }

    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn idempotency_ttl(mut self, ttl: Duration) -> Self {
        self.idempotency_ttl = Some(ttl);
        self
    }

    pub fn idempotency_capacity(mut self, capacity: usize) -> Self {
        self.idempotency_capacity = Some(capacity);
        self
    }

    pub fn catalog_cache_ttl(mut self, ttl: Duration) -> Self {
        self.catalog_cache_ttl = Some(ttl);
        self
    }

    pub fn catalog_cache_capacity(mut self, capacity: usize) -> Self {
        self.catalog_cache_capacity = Some(capacity);
        self
    }

    pub fn max_concurrent_pushes(mut self, max: usize) -> Self {
        self.max_concurrent_pushes = Some(max);
        self
    }

    pub fn run_timeout(mut self, timeout: Duration) -> Self {
        self.run_timeout = Some(timeout);
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Restricts the sources feeding runs. Names are trimmed and lowercased.
    pub fn enabled_sources<I, S>(mut self, sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.enabled_sources = Some(normalize_names(sources));
        self
    }

    /// Restricts the collected categories. Names are trimmed and lowercased.
    pub fn enabled_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.enabled_categories = Some(normalize_names(categories));
        self
    }

    pub fn full_coverage_on_start(mut self, enabled: bool) -> Self {
        self.full_coverage_on_start = enabled;
        self
    }

    /// Builds and validates the final `CollectConfig`.
    pub fn build(self) -> Result<CollectConfig> {
        let defaults = CollectConfig::default();

        let config = CollectConfig {
            memory_threshold: self.memory_threshold,
            small_batch_limit: self.small_batch_limit.unwrap_or(defaults.small_batch_limit),
            namespace: self
                .namespace
                .map(|ns| ns.trim().to_string())
                .unwrap_or(defaults.namespace),
            idempotency_ttl: self.idempotency_ttl.unwrap_or(defaults.idempotency_ttl),
            idempotency_capacity: self
                .idempotency_capacity
                .unwrap_or(defaults.idempotency_capacity),
            catalog_cache_ttl: self.catalog_cache_ttl.unwrap_or(defaults.catalog_cache_ttl),
            catalog_cache_capacity: self
                .catalog_cache_capacity
                .unwrap_or(defaults.catalog_cache_capacity),
            max_concurrent_pushes: self
                .max_concurrent_pushes
                .unwrap_or(defaults.max_concurrent_pushes),
            run_timeout: self.run_timeout.unwrap_or(defaults.run_timeout),
            request_timeout: self.request_timeout.unwrap_or(defaults.request_timeout),
            enabled_sources: self.enabled_sources.unwrap_or(defaults.enabled_sources),
            enabled_categories: self
                .enabled_categories
                .unwrap_or(defaults.enabled_categories),
            full_coverage_on_start: self.full_coverage_on_start,
        };

        config.validate()?;

        Ok(config)
    }
}
