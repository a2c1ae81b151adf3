//! Cache GC Task
//!
//! Background task that periodically removes unobserved cache entries.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::QueryCache;

/// Spawns a background task that periodically garbage-collects the cache.
///
/// The task runs in an infinite loop, sleeping for the specified interval
/// between runs. Entries that still have subscribers, or that were used
/// within the cache's retention window, are kept.
///
/// # Arguments
/// * `cache` - Handle to the cache to collect
/// * `interval_secs` - Interval in seconds between runs (at least 1)
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during shutdown.
///
/// # Example
/// ```ignore
/// let cache = QueryCache::new(Duration::from_secs(30), Duration::from_secs(300));
/// let gc_handle = spawn_gc_task(cache.clone(), 60);
/// // Later, during shutdown:
/// gc_handle.abort();
/// ```
pub fn spawn_gc_task(cache: QueryCache, interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            "Starting cache GC task with interval of {} seconds",
            interval.as_secs()
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = cache.collect_garbage();
            let stats = cache.stats();

            if removed > 0 {
                info!(
                    "Cache GC: removed {} unobserved entries (hit rate {:.1}%)",
                    removed,
                    stats.hit_rate() * 100.0
                );
            } else {
                debug!(
                    "Cache GC: nothing to collect ({} entries, hit rate {:.1}%)",
                    cache.len(),
                    stats.hit_rate() * 100.0
                );
            }
        }
    })
}
