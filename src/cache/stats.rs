//! Cache Statistics Module
//!
//! Tracks query cache behaviour: hits, misses, deduplicated fetches,
//! invalidations and garbage collection.

use serde::Serialize;

// == Cache Stats ==
/// Tracks query cache metrics.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct CacheStats {
    /// Reads served from a fresh entry
    pub hits: u64,
    /// Reads that found no entry or a stale one
    pub misses: u64,
    /// Callers that joined a fetch already in flight
    pub deduplicated: u64,
    /// Entries marked stale by invalidation
    pub invalidations: u64,
    /// Fetches that completed with an error
    pub fetch_errors: u64,
    /// Entries removed by garbage collection
    pub collected: u64,
    /// Current number of entries in the cache
    pub total_entries: usize,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if nothing was read yet.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_dedup(&mut self) {
        self.deduplicated += 1;
    }

    pub fn record_invalidations(&mut self, count: usize) {
        self.invalidations += count as u64;
    }

    pub fn record_fetch_error(&mut self) {
        self.fetch_errors += 1;
    }

    pub fn record_collected(&mut self, count: usize) {
        self.collected += count as u64;
    }

    pub fn set_total_entries(&mut self, count: usize) {
        self.total_entries = count;
    }
}
