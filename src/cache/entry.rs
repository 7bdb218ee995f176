//! Cache Entry Module
//!
//! Defines a cached analysis result together with its insertion time.

use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::{Map, Value};

// == Cache Entry ==
/// A cached JSON object and the moment it was stored.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The stored analysis result
    pub value: Map<String, Value>,
    /// Insertion timestamp (Unix milliseconds)
    pub inserted_at: u64,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates an entry stamped with the given insertion time.
    pub fn new(value: Map<String, Value>, inserted_at: u64) -> Self {
        Self { value, inserted_at }
    }

    // == Is Stale ==
    /// Checks whether the entry has outlived `ttl_seconds` at time `now_ms`.
    ///
    /// Staleness is strict: an entry whose age equals the TTL exactly is still
    /// fresh, and only an age greater than the TTL expires it.
    pub fn is_stale(&self, ttl_seconds: u64, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.inserted_at) > ttl_seconds.saturating_mul(1000)
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
