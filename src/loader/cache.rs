//! Result cache for coalesced lookups.
//!
//! Holds both found values and confirmed "no value" results so neither is
//! fetched twice. Entries never expire on their own; callers decide when to
//! drop them.

use std::collections::HashMap;
use std::time::Duration;

use tokio::time::Instant;

/// Cached outcome of a completed fetch.
#[derive(Debug, Clone)]
pub struct CachedValue<V> {
    /// `None` is a cached negative result, not a miss.
    pub value: Option<V>,
    pub cached_at: Instant,
}

/// Snapshot of cache contents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub total: usize,
    /// Entries holding a value.
    pub resolved: usize,
    /// Entries recording that the key has no value.
    pub negative: usize,
}

/// Unbounded key to result map shared by every lookup.
pub struct ResultCache<V> {
    entries: HashMap<String, CachedValue<V>>,
}

impl<V> ResultCache<V> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&CachedValue<V>> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn insert(&mut self, key: String, value: Option<V>) {
        self.entries.insert(
            key,
            CachedValue {
                value,
                cached_at: Instant::now(),
            },
        );
    }

    /// Remove one entry. Returns true if it was present.
    pub fn remove(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Remove everything, returning the number of dropped entries.
    pub fn clear(&mut self) -> usize {
        let dropped = self.entries.len();
        self.entries.clear();
        dropped
    }

    /// Remove entries cached longer than `max_age` ago.
    pub fn evict_older_than(&mut self, max_age: Duration) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.cached_at.elapsed() < max_age);
        before - self.entries.len()
    }

    pub fn stats(&self) -> CacheStats {
        let negative = self.entries.values().filter(|e| e.value.is_none()).count();
        CacheStats {
            total: self.entries.len(),
            resolved: self.entries.len() - negative,
            negative,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V> Default for ResultCache<V> {
    fn default() -> Self {
        Self::new()
    }
}
