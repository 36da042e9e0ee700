//! Cache Statistics Module
//!
//! Tracks cache performance metrics including hits, misses, evictions and
//! expirations, and the `info()` report built from them.

use serde::Serialize;

// == Cache Stats ==
/// Tracks cache performance metrics.
///
/// Every key lookup made by a read operation counts exactly once, as a hit
/// when a live entry is found and as a miss otherwise.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Lookups that found a live entry
    pub hits: u64,
    /// Lookups that found nothing or an expired entry
    pub misses: u64,
    /// Entries removed by the LRU policy
    pub evictions: u64,
    /// Entries removed because their TTL elapsed
    pub expired: u64,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no lookups have been made.
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

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    pub fn record_expired(&mut self, count: usize) {
        self.expired += count as u64;
    }
}

// == Cache Info ==
/// Snapshot of cache state returned by `info()`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheInfo {
    /// Live keys at the time of the call
    pub keys: usize,
    /// Configured maximum number of keys
    pub max_size: usize,
    /// Default TTL applied to writes without an explicit TTL
    pub default_ttl_seconds: u64,
    /// Sum of approximate key+payload sizes
    pub approximate_size_bytes: usize,
    pub hits: u64,
    pub misses: u64,
    /// hits / (hits + misses)
    pub hit_rate: f64,
    pub evictions: u64,
    pub expired: u64,
    /// True when the last snapshot save failed and a retry is pending
    pub persistence_dirty: bool,
}
