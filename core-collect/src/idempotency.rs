//! # Idempotency Guard
//!
//! Suppresses duplicate processing of the same logical event within a short
//! window. The host can fire the same trigger several times in quick
//! succession (a transfer completing twice, a subscription re-added); only
//! the first caller for a key should do the work.
//!
//! ```rust,ignore
//! let guard = IdempotencyGuard::new(1000, Duration::from_secs(300), clock);
//! if guard.observe_and_mark("tmdb:movie:100".to_string()).is_some() {
//!     return; // already handled
//! }
//! ```

use crate::cache::TtlCache;
use bridge_traits::time::Clock;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug)]
pub struct IdempotencyGuard<K: Hash + Eq = String, V: Clone = bool> {
    cache: TtlCache<K, V>,
}

impl<K: Hash + Eq, V: Clone> IdempotencyGuard<K, V> {
    pub fn new(capacity: usize, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            cache: TtlCache::new(capacity, ttl, clock),
        }
    }

    /// Atomically return the previous live value for `key` and store `value`.
    pub fn get_and_set(&self, key: K, value: V) -> Option<V> {
        self.cache.get_and_set(key, value)
    }

    pub fn clear(&self) {
        self.cache.clear();
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

impl<K: Hash + Eq> IdempotencyGuard<K, bool> {
    /// Mark `key` as seen, returning the previous marker if there was one.
    ///
    /// `None` means the caller is first and should proceed.
    pub fn observe_and_mark(&self, key: K) -> Option<bool> {
        self.cache.get_and_set(key, true)
    }
}
