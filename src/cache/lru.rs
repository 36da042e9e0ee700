//! LRU Eviction Module
//!
//! Selects the least recently used entry when an insert would overflow
//! capacity. Recency lives on each entry, so selection is a linear scan over
//! live entries. That is fine at the low-hundreds sizes this cache targets.

use std::collections::HashMap;

use crate::cache::CacheEntry;

// == Select Victim ==
/// Returns the key with the oldest `(last_access, access_seq)`.
///
/// Returns None if there are no entries.
pub fn select_victim(entries: &HashMap<String, CacheEntry>) -> Option<String> {
    entries
        .iter()
        .min_by_key(|(_, entry)| entry.recency())
        .map(|(key, _)| key.clone())
}

// == Needs Eviction ==
/// Whether inserting `key` requires freeing a slot first.
///
/// Overwriting an existing key never evicts.
pub fn needs_eviction(entries: &HashMap<String, CacheEntry>, key: &str, max_size: usize) -> bool {
    !entries.contains_key(key) && entries.len() >= max_size
}
