//! Time-bounded response cache keyed by normalized query text.
//!
//! Entries expire `ttl` after insertion. Expiry is lazy: an expired entry
//! is a miss and is removed when read, or in bulk by [`ResponseCache::purge_expired`].
//! There is no background eviction.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};

use tracing::debug;

use assist_index::normalize;

/// Source of "now" for expiry checks.
pub type Clock = Arc<dyn Fn() -> Instant + Send + Sync>;

/// Default time-to-live: one hour.
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

struct CacheEntry<V> {
    value: V,
    created_at: Instant,
}

/// Thread-safe TTL cache.
pub struct ResponseCache<V> {
    entries: RwLock<HashMap<String, CacheEntry<V>>>,
    ttl: Duration,
    clock: Clock,
}

impl<V: Clone> ResponseCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(Instant::now))
    }

    /// Create a cache that reads time from `clock`.
    pub fn with_clock(ttl: Duration, clock: Clock) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
            clock,
        }
    }

    /// Normalized form of a query, as used for keys.
    pub fn key(query: &str) -> String {
        normalize(query)
    }

    fn is_live(&self, entry: &CacheEntry<V>, now: Instant) -> bool {
        now.saturating_duration_since(entry.created_at) < self.ttl
    }

    /// Look up a query. Expired entries are removed and reported as a miss.
    pub fn get(&self, query: &str) -> Option<V> {
        let key = Self::key(query);
        let now = (self.clock)();

        {
            let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
            match entries.get(&key) {
                None => return None,
                Some(entry) if self.is_live(entry, now) => return Some(entry.value.clone()),
                Some(_) => {}
            }
        }

        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        // Another writer may have refreshed the entry in between
        if let Some(entry) = entries.get(&key) {
            if self.is_live(entry, now) {
                return Some(entry.value.clone());
            }
            entries.remove(&key);
            debug!(key = %key, "Evicted expired cache entry");
        }
        None
    }

    /// Insert or replace the value for a query.
    pub fn put(&self, query: &str, value: V) {
        let key = Self::key(query);
        let created_at = (self.clock)();
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key, CacheEntry { value, created_at });
    }

    /// Remove every expired entry; returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = (self.clock)();
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|_, entry| now.saturating_duration_since(entry.created_at) < self.ttl);
        before - entries.len()
    }

    /// Number of stored entries, expired ones included until purged.
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}
