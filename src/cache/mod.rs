//! Cache Module
//!
//! Keyed cache of server resources with freshness windows, in-flight
//! deduplication and mutation-driven invalidation.

mod entry;
mod invalidation;
mod key;
mod stats;
mod store;


// Re-export public types
pub use entry::CacheEntry;
pub use invalidation::Mutation;
pub use key::{KeyPrefix, QueryKey, ResourceKind};
pub use stats::CacheStats;
pub use store::{CacheEvent, CacheRead, CachedValue, QueryCache, Subscription};
