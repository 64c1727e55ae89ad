//! Substitution store
//!
//! Maps original values to their synthetic replacements so that a value is
//! replaced the same way in every column and every run served by the same
//! store. The store is bounded: once `capacity` mappings are held, the least
//! recently used one is evicted. The date offset lives outside the LRU and is
//! chosen at most once per store.

use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};

/// Default number of mappings kept before eviction
pub const DEFAULT_CAPACITY: usize = 100_000;

/// Snapshot of store usage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreStats {
    pub len: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

struct Inner {
    mappings: LruCache<String, String>,
    hits: u64,
    misses: u64,
    evictions: u64,
}

/// Bounded, thread-safe original -> replacement mapping
pub struct SubstitutionStore {
    inner: Mutex<Inner>,
    date_offset: OnceLock<i64>,
}

impl SubstitutionStore {
    /// Create a store holding at most `capacity` mappings (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(Inner {
                mappings: LruCache::new(capacity),
                hits: 0,
                misses: 0,
                evictions: 0,
            }),
            date_offset: OnceLock::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Cached replacement for `original`, if any
    pub fn get(&self, original: &str) -> Option<String> {
        let mut inner = self.lock();
        let found = inner.mappings.get(original).cloned();
        if found.is_some() {
            inner.hits += 1;
        }
        found
    }

    /// Returns the cached replacement, or generates and caches one.
    ///
    /// `generate` runs outside the lock. When two callers race on the same key
    /// the first stored value wins and both return it.
    pub fn get_or_insert_with<F>(&self, original: &str, generate: F) -> String
    where
        F: FnOnce() -> String,
    {
        if let Some(existing) = self.get(original) {
            return existing;
        }

        let candidate = generate();

        let mut inner = self.lock();
        if let Some(existing) = inner.mappings.get(original).cloned() {
            inner.hits += 1;
            return existing;
        }
        inner.misses += 1;
        if inner.mappings.len() == inner.mappings.cap().get() {
            inner.evictions += 1;
        }
        inner.mappings.put(original.to_string(), candidate.clone());
        candidate
    }

    /// Day offset used for date shifting, chosen on first use
    pub fn date_offset_with<F>(&self, choose: F) -> i64
    where
        F: FnOnce() -> i64,
    {
        *self.date_offset.get_or_init(choose)
    }

    /// Date offset if one has been chosen
    pub fn date_offset(&self) -> Option<i64> {
        self.date_offset.get().copied()
    }

    /// Drops every value mapping. The date offset is kept.
    pub fn flush(&self) {
        let mut inner = self.lock();
        inner.mappings.clear();
        tracing::info!("Substitution store flushed");
    }

    pub fn len(&self) -> usize {
        self.lock().mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.lock().mappings.cap().get()
    }

    pub fn stats(&self) -> StoreStats {
        let inner = self.lock();
        StoreStats {
            len: inner.mappings.len(),
            capacity: inner.mappings.cap().get(),
            hits: inner.hits,
            misses: inner.misses,
            evictions: inner.evictions,
        }
    }
}

impl Default for SubstitutionStore {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl std::fmt::Debug for SubstitutionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let stats = self.stats();
        f.debug_struct("SubstitutionStore")
            .field("len", &stats.len)
            .field("capacity", &stats.capacity)
            .field("date_offset", &self.date_offset())
            .finish()
    }
}
