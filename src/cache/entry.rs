//! Cache Entry Module
//!
//! Defines a cached query result with its freshness window.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::time::Instant;

// == Cache Entry ==
/// A cached query result and its metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The decoded response body
    pub value: Arc<Value>,
    /// When the value arrived (monotonic, drives freshness)
    pub fetched_at: Instant,
    /// When the value arrived (wall clock, for reporting)
    pub fetched_at_utc: DateTime<Utc>,
    /// How long the value is served without refetching
    pub stale_time: Duration,
    /// Set by invalidation; overrides the freshness window
    pub invalidated: bool,
    /// Last time the entry was read, written or lost its last observer
    pub last_used: Instant,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a fresh entry.
    ///
    /// # Arguments
    /// * `value` - The response body to store
    /// * `stale_time` - Freshness window
    pub fn new(value: Arc<Value>, stale_time: Duration) -> Self {
        let now = Instant::now();
        Self {
            value,
            fetched_at: now,
            fetched_at_utc: Utc::now(),
            stale_time,
            invalidated: false,
            last_used: now,
        }
    }

    // == Is Stale ==
    /// Checks whether the next read must refetch.
    ///
    /// Boundary condition: an entry is stale once the elapsed time is greater
    /// than or equal to the freshness window, so a zero window is always stale.
    pub fn is_stale(&self) -> bool {
        self.invalidated || self.fetched_at.elapsed() >= self.stale_time
    }

    // == Fresh For ==
    /// Returns how much longer the entry stays fresh.
    ///
    /// # Returns
    /// - `Duration::ZERO` if the entry is stale for any reason
    /// - the remaining freshness window otherwise
    pub fn fresh_for(&self) -> Duration {
        if self.invalidated {
            return Duration::ZERO;
        }
        self.stale_time.saturating_sub(self.fetched_at.elapsed())
    }

    // == Mark Stale ==
    pub fn invalidate(&mut self) {
        self.invalidated = true;
    }

    pub fn touch(&mut self) {
        self.last_used = Instant::now();
    }

    /// True once the entry has gone unused for at least `retention`.
    pub fn is_collectable(&self, retention: Duration) -> bool {
        self.last_used.elapsed() >= retention
    }
}
