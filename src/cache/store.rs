//! Cache Store Module
//!
//! Expiring LRU cache for analysis results: HashMap storage, LRU tracking,
//! and lazy TTL expiry checked on access.

use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::cache::entry::current_timestamp_ms;
use crate::cache::{CacheEntry, CacheStats, LruTracker};

// == Cache Store ==
/// Bounded key-value store with LRU eviction and a single TTL for all entries.
///
/// The store is not synchronized; share it as `Arc<RwLock<CacheStore>>` and
/// take the write guard for both `get` and `set`, since a read promotes the
/// entry and may remove a stale one.
#[derive(Debug)]
pub struct CacheStore {
    /// Key-value storage
    entries: HashMap<String, CacheEntry>,
    /// LRU access tracker
    lru: LruTracker,
    /// Performance statistics
    stats: CacheStats,
    /// Maximum number of entries allowed
    capacity: usize,
    /// Maximum entry age in seconds
    ttl_seconds: u64,
}

impl CacheStore {
    // == Constructor ==
    /// Creates a new CacheStore.
    ///
    /// # Arguments
    /// * `capacity` - Maximum number of entries (a capacity of 0 is raised to 1)
    /// * `ttl_seconds` - Age after which an entry is no longer returned
    pub fn new(capacity: usize, ttl_seconds: u64) -> Self {
        Self {
            entries: HashMap::new(),
            lru: LruTracker::new(),
            stats: CacheStats::new(),
            capacity: capacity.max(1),
            ttl_seconds,
        }
    }

    // == Set ==
    /// Stores a value, replacing any previous value for the key.
    ///
    /// The entry becomes the most recently used one and its insertion time is
    /// reset. Least recently used entries are evicted until the store fits
    /// its capacity again.
    pub fn set(&mut self, key: String, value: Map<String, Value>) {
        self.set_at(key, value, current_timestamp_ms());
    }

    pub(crate) fn set_at(&mut self, key: String, value: Map<String, Value>, now_ms: u64) {
        self.entries.insert(key.clone(), CacheEntry::new(value, now_ms));
        self.lru.touch(&key);

        while self.entries.len() > self.capacity {
            match self.lru.evict_oldest() {
                Some(evicted_key) => {
                    self.entries.remove(&evicted_key);
                    self.stats.record_eviction();
                }
                None => break,
            }
        }

        self.stats.set_total_entries(self.entries.len());
    }

    // == Get ==
    /// Retrieves a value by key.
    ///
    /// A stale entry is removed and reported as absent. A fresh entry is
    /// promoted to most recently used.
    pub fn get(&mut self, key: &str) -> Option<Map<String, Value>> {
        self.get_at(key, current_timestamp_ms())
    }

    pub(crate) fn get_at(&mut self, key: &str, now_ms: u64) -> Option<Map<String, Value>> {
        let Some(entry) = self.entries.get(key) else {
            self.stats.record_miss();
            return None;
        };

        if entry.is_stale(self.ttl_seconds, now_ms) {
            self.entries.remove(key);
            self.lru.remove(key);
            self.stats.record_expirations(1);
            self.stats.record_miss();
            self.stats.set_total_entries(self.entries.len());
            return None;
        }

        let value = entry.value.clone();
        self.stats.record_hit();
        self.lru.touch(key);
        Some(value)
    }

    // == Purge Expired ==
    /// Removes every stale entry and returns how many were dropped.
    ///
    /// Only the optional sweep task calls this; normal operation relies on
    /// lazy expiry in `get`.
    pub fn purge_expired(&mut self) -> usize {
        self.purge_expired_at(current_timestamp_ms())
    }

    pub(crate) fn purge_expired_at(&mut self, now_ms: u64) -> usize {
        let ttl_seconds = self.ttl_seconds;
        let stale_keys: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_stale(ttl_seconds, now_ms))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &stale_keys {
            self.entries.remove(key);
            self.lru.remove(key);
        }

        self.stats.record_expirations(stale_keys.len());
        self.stats.set_total_entries(self.entries.len());
        stale_keys.len()
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn ttl_seconds(&self) -> u64 {
        self.ttl_seconds
    }

    /// Returns the number of stored entries, including stale ones not yet
    /// discovered.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
