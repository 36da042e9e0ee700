//! Cache Entry Module
//!
//! Defines individual cache entries with TTL support, plus the parallel
//! per-key metadata record.

use serde::{Deserialize, Serialize};

use crate::cache::{Kind, Value};

// == Cache Entry ==
/// Represents a single cache entry with its typed value and access metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// The stored value
    pub value: Value,
    /// Expiration timestamp (Unix milliseconds), None = no expiration
    pub expires_at: Option<u64>,
    /// Number of accesses since the entry was written by `set` or created
    pub access_count: u64,
    /// Last access timestamp (Unix milliseconds)
    pub last_access: u64,
    /// Store-wide access sequence number, breaks ties within one millisecond
    pub access_seq: u64,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new cache entry.
    ///
    /// # Arguments
    /// * `value` - The value to store
    /// * `now` - Current timestamp in milliseconds
    /// * `ttl_seconds` - TTL in seconds, 0 = no expiration
    /// * `seq` - Access sequence number for this write
    pub fn new(value: Value, now: u64, ttl_seconds: u64, seq: u64) -> Self {
        Self {
            value,
            expires_at: expiry_from(now, ttl_seconds),
            access_count: 0,
            last_access: now,
            access_seq: seq,
        }
    }

    /// Returns the kind of the stored value.
    pub fn kind(&self) -> Kind {
        self.value.kind()
    }

    // == Is Expired ==
    /// Checks if the entry has expired at `now`.
    ///
    /// Boundary condition: an entry is expired once `now >= expires_at`, so
    /// once the TTL duration has fully elapsed the entry is gone.
    pub fn is_expired(&self, now: u64) -> bool {
        match self.expires_at {
            Some(expires) => now >= expires,
            None => false,
        }
    }

    // == Time To Live ==
    /// Returns remaining TTL in milliseconds, or None if no expiration is set.
    ///
    /// Returns `Some(0)` once the entry has expired.
    pub fn ttl_remaining_ms(&self, now: u64) -> Option<u64> {
        self.expires_at
            .map(|expires| expires.saturating_sub(now))
    }

    // == Touch ==
    /// Records an access for LRU and hit accounting.
    pub fn touch(&mut self, now: u64, seq: u64) {
        self.access_count += 1;
        self.last_access = now;
        self.access_seq = seq;
    }

    /// Recency ordering key: smaller means less recently used.
    pub fn recency(&self) -> (u64, u64) {
        (self.last_access, self.access_seq)
    }
}

// == Entry Metadata ==
/// Per-key bookkeeping kept alongside the entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryMetadata {
    /// Creation timestamp (Unix milliseconds)
    pub created_at: u64,
    /// Accesses since creation
    pub cumulative_access_count: u64,
    /// Key plus payload size in bytes
    pub approximate_size_bytes: usize,
}

impl EntryMetadata {
    pub fn new(key: &str, value: &Value, now: u64) -> Self {
        Self {
            created_at: now,
            cumulative_access_count: 0,
            approximate_size_bytes: key.len() + value.approximate_size(),
        }
    }

    /// Refreshes the size estimate after a mutation.
    pub fn resize(&mut self, key: &str, value: &Value) {
        self.approximate_size_bytes = key.len() + value.approximate_size();
    }
}

/// Absolute expiry for a TTL in seconds, None when `ttl_seconds` is 0.
pub(crate) fn expiry_from(now: u64, ttl_seconds: u64) -> Option<u64> {
    (ttl_seconds > 0).then(|| now.saturating_add(ttl_seconds.saturating_mul(1000)))
}
