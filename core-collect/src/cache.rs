//! Bounded LRU cache with per-entry time-to-live.
//!
//! Every operation runs under a single lock, so `get_and_set` is atomic with
//! respect to concurrent callers. Expiry is evaluated against an injected
//! [`Clock`], which lets tests advance time deterministically.

use bridge_traits::time::Clock;
use lru::LruCache;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

#[derive(Debug, Clone)]
struct Entry<V> {
    value: V,
    expires_at_ms: i64,
}

impl<V> Entry<V> {
    /// An entry is gone once `now >= expires_at`.
    fn is_live(&self, now_ms: i64) -> bool {
        now_ms < self.expires_at_ms
    }
}

pub struct TtlCache<K: Hash + Eq, V: Clone> {
    inner: Mutex<LruCache<K, Entry<V>>>,
    ttl_ms: i64,
    clock: Arc<dyn Clock>,
}

impl<K: Hash + Eq, V: Clone> TtlCache<K, V> {
    /// A zero capacity is bumped to one.
    pub fn new(capacity: usize, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(LruCache::new(capacity)),
            ttl_ms: i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX),
            clock,
        }
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<K, Entry<V>>> {
        // A panic while holding the lock cannot leave the map half-written.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn expiry_from(&self, now_ms: i64) -> i64 {
        now_ms.saturating_add(self.ttl_ms)
    }

    /// Live value for `key`, evicting it if it has expired.
    pub fn get(&self, key: &K) -> Option<V> {
        let now_ms = self.clock.unix_timestamp_millis();
        let mut cache = self.lock();

        let expired = match cache.get(key) {
            Some(entry) if entry.is_live(now_ms) => return Some(entry.value.clone()),
            Some(_) => true,
            None => false,
        };

        if expired {
            cache.pop(key);
        }
        None
    }

    /// Store `value` with a fresh TTL.
    pub fn insert(&self, key: K, value: V) {
        let now_ms = self.clock.unix_timestamp_millis();
        let expires_at_ms = self.expiry_from(now_ms);
        self.lock().put(key, Entry { value, expires_at_ms });
    }

    /// Return the previous live value and store `value`, in one step.
    ///
    /// Of any number of concurrent callers racing on an absent key, exactly
    /// one observes `None`.
    pub fn get_and_set(&self, key: K, value: V) -> Option<V> {
        let now_ms = self.clock.unix_timestamp_millis();
        let expires_at_ms = self.expiry_from(now_ms);

        self.lock()
            .put(key, Entry { value, expires_at_ms })
            .filter(|previous| previous.is_live(now_ms))
            .map(|previous| previous.value)
    }

    pub fn remove(&self, key: &K) -> Option<V> {
        let now_ms = self.clock.unix_timestamp_millis();
        self.lock()
            .pop(key)
            .filter(|entry| entry.is_live(now_ms))
            .map(|entry| entry.value)
    }
}

impl<K: Hash + Eq + Clone, V: Clone> TtlCache<K, V> {
    /// Drop expired entries and return how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now_ms = self.clock.unix_timestamp_millis();
        let mut cache = self.lock();

        let expired: Vec<K> = cache
            .iter()
            .filter(|(_, entry)| !entry.is_live(now_ms))
            .map(|(key, _)| key)
            .cloned()
            .collect();

        for key in &expired {
            cache.pop(key);
        }
        expired.len()
    }
}

impl<K: Hash + Eq, V: Clone> TtlCache<K, V> {
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Number of stored entries, expired ones included until purged.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.lock().cap().get()
    }
}

impl<K: Hash + Eq, V: Clone> std::fmt::Debug for TtlCache<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtlCache")
            .field("len", &self.len())
            .field("ttl_ms", &self.ttl_ms)
            .finish()
    }
}
