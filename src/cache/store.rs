//! Query Cache Store Module
//!
//! Keyed cache of server resources with read-through fetching, in-flight
//! deduplication, prefix invalidation and observer-aware garbage collection.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};
use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::cache::{CacheEntry, CacheStats, KeyPrefix, Mutation, QueryKey};
use crate::error::{ClientError, Result};

/// A cached response body. Clones share one allocation.
pub type CachedValue = Arc<Value>;

type SharedFetch = Shared<BoxFuture<'static, Result<CachedValue>>>;
type Callback = Arc<dyn Fn(&CacheEvent) + Send + Sync>;

// == Cache Read ==
/// Outcome of a synchronous cache lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheRead {
    /// Within its freshness window and not invalidated
    Fresh(CachedValue),
    /// Present, but the next fetch must go to the server
    Stale(CachedValue),
    Miss,
}

impl CacheRead {
    pub fn is_fresh(&self) -> bool {
        matches!(self, CacheRead::Fresh(_))
    }

    /// The cached value regardless of freshness.
    pub fn value(&self) -> Option<&CachedValue> {
        match self {
            CacheRead::Fresh(v) | CacheRead::Stale(v) => Some(v),
            CacheRead::Miss => None,
        }
    }
}

// == Cache Event ==
/// Delivered to subscribers of a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEvent {
    /// A new value was stored
    Updated(QueryKey),
    /// The entry was marked stale and should be refetched
    Invalidated(QueryKey),
    /// The entry was dropped
    Removed(QueryKey),
}

impl CacheEvent {
    pub fn key(&self) -> &QueryKey {
        match self {
            CacheEvent::Updated(k) | CacheEvent::Invalidated(k) | CacheEvent::Removed(k) => k,
        }
    }
}

struct InFlight {
    id: u64,
    fetch: SharedFetch,
    invalidated: bool,
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<QueryKey, CacheEntry>,
    in_flight: HashMap<QueryKey, InFlight>,
    subscribers: HashMap<QueryKey, Vec<(u64, Callback)>>,
    next_id: u64,
    stats: CacheStats,
}

impl CacheState {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn callbacks_for(&self, key: &QueryKey) -> Vec<Callback> {
        self.subscribers
            .get(key)
            .map(|subs| subs.iter().map(|(_, cb)| Arc::clone(cb)).collect())
            .unwrap_or_default()
    }
}

struct CacheInner {
    state: Mutex<CacheState>,
    stale_time: Duration,
    gc_time: Duration,
}

impl CacheInner {
    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// == Query Cache ==
/// Shared handle to the resource cache. Clones address the same cache.
#[derive(Clone)]
pub struct QueryCache {
    inner: Arc<CacheInner>,
}

impl QueryCache {
    // == Constructor ==
    /// Creates an empty cache.
    ///
    /// # Arguments
    /// * `stale_time` - Default freshness window for stored values
    /// * `gc_time` - How long an unobserved entry is retained
    pub fn new(stale_time: Duration, gc_time: Duration) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                state: Mutex::new(CacheState::default()),
                stale_time,
                gc_time,
            }),
        }
    }

    pub fn stale_time(&self) -> Duration {
        self.inner.stale_time
    }

    // == Read ==
    /// Looks up a key without touching the network.
    pub fn read(&self, key: &QueryKey) -> CacheRead {
        let mut state = self.inner.lock();
        let read = match state.entries.get_mut(key) {
            Some(entry) => {
                entry.touch();
                if entry.is_stale() {
                    CacheRead::Stale(Arc::clone(&entry.value))
                } else {
                    CacheRead::Fresh(Arc::clone(&entry.value))
                }
            }
            None => CacheRead::Miss,
        };

        if read.is_fresh() {
            state.stats.record_hit();
        } else {
            state.stats.record_miss();
        }
        read
    }

    // == Write ==
    /// Stores a value with the default freshness window and notifies subscribers.
    pub fn write(&self, key: QueryKey, value: Value) -> CachedValue {
        self.write_with(key, Arc::new(value), self.inner.stale_time)
    }

    /// Stores a value with an explicit freshness window.
    pub fn write_with(&self, key: QueryKey, value: CachedValue, stale_time: Duration) -> CachedValue {
        let callbacks = {
            let mut state = self.inner.lock();
            state
                .entries
                .insert(key.clone(), CacheEntry::new(Arc::clone(&value), stale_time));
            let total = state.entries.len();
            state.stats.set_total_entries(total);
            state.callbacks_for(&key)
        };

        notify(&callbacks, &CacheEvent::Updated(key));
        value
    }

    // == Remove ==
    /// Drops an entry outright. Returns true if one existed.
    pub fn remove(&self, key: &QueryKey) -> bool {
        let (removed, callbacks) = {
            let mut state = self.inner.lock();
            let removed = state.entries.remove(key).is_some();
            if let Some(flight) = state.in_flight.get_mut(key) {
                flight.invalidated = true;
            }
            let total = state.entries.len();
            state.stats.set_total_entries(total);
            (removed, state.callbacks_for(key))
        };

        if removed {
            notify(&callbacks, &CacheEvent::Removed(key.clone()));
        }
        removed
    }

    // == Invalidate ==
    /// Marks every entry matching `prefix` stale.
    ///
    /// Subscribers of matching keys are notified before this returns, so a
    /// read issued afterwards observes the invalidation. A fetch already in
    /// flight for a matching key will store its result as stale.
    ///
    /// Returns the number of entries marked.
    pub fn invalidate(&self, prefix: impl Into<KeyPrefix>) -> usize {
        let prefix = prefix.into();
        let (count, pending) = {
            let mut state = self.inner.lock();

            let mut touched = Vec::new();
            for (key, entry) in state.entries.iter_mut() {
                if prefix.matches(key) {
                    entry.invalidate();
                    touched.push(key.clone());
                }
            }
            for (key, flight) in state.in_flight.iter_mut() {
                if prefix.matches(key) {
                    flight.invalidated = true;
                }
            }
            state.stats.record_invalidations(touched.len());

            let pending: Vec<(QueryKey, Vec<Callback>)> = state
                .subscribers
                .keys()
                .filter(|key| prefix.matches(key))
                .map(|key| (key.clone(), state.callbacks_for(key)))
                .collect();

            (touched.len(), pending)
        };

        debug!("Invalidated {} entries matching {}", count, prefix);

        for (key, callbacks) in pending {
            notify(&callbacks, &CacheEvent::Invalidated(key));
        }
        count
    }

    /// Applies every invalidation edge declared for `mutation`.
    pub fn apply_mutation(&self, mutation: &Mutation) -> usize {
        let total: usize = mutation
            .edges()
            .into_iter()
            .map(|edge| self.invalidate(edge))
            .sum();
        debug!("Mutation {} invalidated {} entries", mutation, total);
        total
    }

    // == Fetch ==
    /// Returns the cached value for `key`, fetching it when missing or stale.
    ///
    /// Concurrent callers for an equal key share a single in-flight fetch and
    /// receive the same `Arc`. The fetch runs as its own task: if every
    /// caller goes away the request still completes and its result is cached.
    /// Errors are returned to every waiting caller and are never cached.
    pub async fn fetch<F, Fut>(&self, key: QueryKey, fetcher: F) -> Result<CachedValue>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value>> + Send + 'static,
    {
        self.fetch_with(key, self.inner.stale_time, fetcher).await
    }

    /// Like [`fetch`](Self::fetch) with an explicit freshness window.
    pub async fn fetch_with<F, Fut>(
        &self,
        key: QueryKey,
        stale_time: Duration,
        fetcher: F,
    ) -> Result<CachedValue>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value>> + Send + 'static,
    {
        if let Some(joined) = self.lookup_or_join(&key) {
            return joined.await;
        }

        // Build the request future outside the lock; futures are lazy, so
        // if another caller raced us in, ours is dropped without sending.
        let request = fetcher();

        let fetch = {
            let mut state = self.inner.lock();
            if let Some(joined) = state.in_flight.get(&key).map(|f| f.fetch.clone()) {
                state.stats.record_dedup();
                joined
            } else {
                state.stats.record_miss();
                let id = state.next_id();
                let fetch = self.spawn_fetch(key.clone(), id, stale_time, request);
                state.in_flight.insert(
                    key.clone(),
                    InFlight {
                        id,
                        fetch: fetch.clone(),
                        invalidated: false,
                    },
                );
                trace!("Started fetch #{} for {}", id, key);
                fetch
            }
        };

        fetch.await
    }

    // Fresh hit → ready value; in flight → join; otherwise None.
    fn lookup_or_join(&self, key: &QueryKey) -> Option<BoxFuture<'static, Result<CachedValue>>> {
        let mut state = self.inner.lock();

        if let Some(entry) = state.entries.get_mut(key) {
            entry.touch();
            if !entry.is_stale() {
                trace!("Serving {} (fresh for {:?})", key, entry.fresh_for());
                let value = Arc::clone(&entry.value);
                state.stats.record_hit();
                return Some(futures::future::ready(Ok(value)).boxed());
            }
            trace!(
                "Refetching {} (fetched {})",
                key,
                entry.fetched_at_utc.to_rfc3339()
            );
        }

        if let Some(flight) = state.in_flight.get(key) {
            let fetch = flight.fetch.clone();
            state.stats.record_dedup();
            return Some(fetch.boxed());
        }

        None
    }

    fn spawn_fetch<Fut>(&self, key: QueryKey, id: u64, stale_time: Duration, request: Fut) -> SharedFetch
    where
        Fut: Future<Output = Result<Value>> + Send + 'static,
    {
        let cache = self.clone();
        let task = tokio::spawn(async move {
            let result = request.await.map(Arc::new);
            cache.complete(&key, id, &result, stale_time);
            result
        });

        async move {
            task.await
                .unwrap_or_else(|e| Err(ClientError::Network(format!("fetch task failed: {}", e))))
        }
        .boxed()
        .shared()
    }

    fn complete(&self, key: &QueryKey, id: u64, result: &Result<CachedValue>, stale_time: Duration) {
        let callbacks = {
            let mut state = self.inner.lock();

            let invalidated = match state.in_flight.get(key) {
                Some(flight) if flight.id == id => {
                    let invalidated = flight.invalidated;
                    state.in_flight.remove(key);
                    invalidated
                }
                // Superseded by a newer fetch for the same key.
                _ => return,
            };

            match result {
                Ok(value) => {
                    let mut entry = CacheEntry::new(Arc::clone(value), stale_time);
                    if invalidated {
                        entry.invalidate();
                    }
                    state.entries.insert(key.clone(), entry);
                    let total = state.entries.len();
                    state.stats.set_total_entries(total);
                    state.callbacks_for(key)
                }
                Err(e) => {
                    state.stats.record_fetch_error();
                    debug!("Fetch #{} for {} failed: {}", id, key, e);
                    Vec::new()
                }
            }
        };

        notify(&callbacks, &CacheEvent::Updated(key.clone()));
    }

    /// True while a fetch for `key` is running.
    pub fn is_fetching(&self, key: &QueryKey) -> bool {
        self.inner.lock().in_flight.contains_key(key)
    }

    // == Subscribe ==
    /// Registers `callback` for events on `key`.
    ///
    /// The returned guard unsubscribes on drop; after that the callback is
    /// never invoked again. While any subscription exists the entry is
    /// exempt from garbage collection.
    pub fn subscribe<F>(&self, key: QueryKey, callback: F) -> Subscription
    where
        F: Fn(&CacheEvent) + Send + Sync + 'static,
    {
        let mut state = self.inner.lock();
        let id = state.next_id();
        state
            .subscribers
            .entry(key.clone())
            .or_default()
            .push((id, Arc::new(callback)));

        Subscription {
            cache: Arc::downgrade(&self.inner),
            key,
            id,
        }
    }

    /// Number of live subscriptions on `key`.
    pub fn observer_count(&self, key: &QueryKey) -> usize {
        self.inner
            .lock()
            .subscribers
            .get(key)
            .map_or(0, |subs| subs.len())
    }

    // == Garbage Collection ==
    /// Removes entries with no observers that went unused for the retention window.
    ///
    /// Returns the number of entries removed.
    pub fn collect_garbage(&self) -> usize {
        let mut state = self.inner.lock();
        let retention = self.inner.gc_time;

        let doomed: Vec<QueryKey> = state
            .entries
            .iter()
            .filter(|(key, entry)| {
                entry.is_collectable(retention)
                    && !state.subscribers.contains_key(*key)
                    && !state.in_flight.contains_key(*key)
            })
            .map(|(key, _)| key.clone())
            .collect();

        for key in &doomed {
            state.entries.remove(key);
        }

        let count = doomed.len();
        state.stats.record_collected(count);
        let total = state.entries.len();
        state.stats.set_total_entries(total);
        count
    }

    /// Drops every entry. Subscribers are not notified.
    pub fn clear(&self) {
        let mut state = self.inner.lock();
        state.entries.clear();
        state.stats.set_total_entries(0);
    }

    // == Stats ==
    pub fn stats(&self) -> CacheStats {
        let state = self.inner.lock();
        let mut stats = state.stats.clone();
        stats.set_total_entries(state.entries.len());
        stats
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryCache")
            .field("entries", &self.len())
            .field("stale_time", &self.inner.stale_time)
            .field("gc_time", &self.inner.gc_time)
            .finish()
    }
}

// Callbacks run with the cache unlocked so they may read or fetch.
fn notify(callbacks: &[Callback], event: &CacheEvent) {
    for callback in callbacks {
        callback(event);
    }
}

// == Subscription ==
/// Live interest in one key. Dropping it unsubscribes.
pub struct Subscription {
    cache: Weak<CacheInner>,
    key: QueryKey,
    id: u64,
}

impl Subscription {
    pub fn key(&self) -> &QueryKey {
        &self.key
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let Some(inner) = self.cache.upgrade() else {
            return;
        };
        let mut state = inner.lock();

        let now_empty = match state.subscribers.get_mut(&self.key) {
            Some(subs) => {
                subs.retain(|(id, _)| *id != self.id);
                subs.is_empty()
            }
            None => {
                warn!("Subscription for {} was already gone", self.key);
                false
            }
        };

        if now_empty {
            state.subscribers.remove(&self.key);
            // Retention window starts when the last observer leaves.
            if let Some(entry) = state.entries.get_mut(&self.key) {
                entry.touch();
            }
        }
    }
}
