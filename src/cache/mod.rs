//! Cache Module
//!
//! Expiring LRU cache for analysis results, keyed by image fingerprint.

mod entry;
mod fingerprint;
mod lru;
mod stats;
mod store;


use std::sync::Arc;

use tokio::sync::RwLock;

// Re-export public types
pub use entry::CacheEntry;
pub use fingerprint::fingerprint;
pub use lru::LruTracker;
pub use stats::CacheStats;
pub use store::CacheStore;

/// The cache as shared between request handlers.
pub type SharedCache = Arc<RwLock<CacheStore>>;

/// Wraps a store for sharing across handlers.
pub fn shared(store: CacheStore) -> SharedCache {
    Arc::new(RwLock::new(store))
}
