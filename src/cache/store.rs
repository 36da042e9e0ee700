//! Cache Store Module
//!
//! Main cache engine: a HashMap of typed entries with lazy TTL expiration,
//! LRU eviction on insert and snapshot persistence after each mutation.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::cache::{
    lru, CacheEntry, CacheInfo, CacheStats, EntryMetadata, Kind, Value, MAX_KEY_LENGTH,
    MAX_VALUE_SIZE,
};
use crate::cache::pattern::glob_match;
use crate::clock::{Clock, SystemClock};
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};
use crate::persistence::{decode_snapshot, encode_snapshot, BlobStore, FileBlobStore};

// == Cache ==
/// Typed key-value cache with TTL expiration and LRU eviction.
///
/// Every operation runs synchronously to completion on `&mut self`. Share it
/// across tasks through [`crate::CacheHandle`].
#[derive(Debug)]
pub struct Cache {
    /// Key-value storage
    entries: HashMap<String, CacheEntry>,
    /// Per-key metadata, keyed identically to `entries`
    metadata: HashMap<String, EntryMetadata>,
    /// Performance statistics
    stats: CacheStats,
    /// Maximum number of keys allowed
    max_size: usize,
    /// Default TTL in seconds for writes without explicit TTL
    default_ttl: u64,
    clock: Arc<dyn Clock>,
    blob_store: Option<Box<dyn BlobStore>>,
    /// Set when the last snapshot save failed
    dirty: bool,
    /// Access sequence counter
    seq: u64,
}

impl Cache {
    // == Constructors ==
    /// Creates a cache from configuration, using the wall clock.
    ///
    /// If `config.snapshot_path` is set the cache is backed by a
    /// [`FileBlobStore`] at that path.
    pub fn new(config: &CacheConfig) -> Result<Self> {
        let store = config
            .snapshot_path
            .as_ref()
            .map(|path| Box::new(FileBlobStore::new(path.clone())) as Box<dyn BlobStore>);
        Self::open(config, store, Arc::new(SystemClock))
    }

    /// Creates an unpersisted cache driven by `clock`.
    pub fn with_clock(config: &CacheConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        Self::open(config, None, clock)
    }

    /// Creates a cache with an explicit blob store and clock.
    ///
    /// The blob store is loaded immediately. A load or decode failure is
    /// logged and leaves the cache empty; it never fails construction.
    ///
    /// # Errors
    /// `InvalidArgument` if the configuration is invalid.
    pub fn open(
        config: &CacheConfig,
        blob_store: Option<Box<dyn BlobStore>>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        config.validate()?;

        let mut cache = Self {
            entries: HashMap::new(),
            metadata: HashMap::new(),
            stats: CacheStats::new(),
            max_size: config.max_size,
            default_ttl: config.default_ttl_seconds,
            clock,
            blob_store,
            dirty: false,
            seq: 0,
        };
        cache.restore();

        info!(
            "Cache initialized: max_size={}, default_ttl={}s, entries={}",
            cache.max_size,
            cache.default_ttl,
            cache.entries.len()
        );
        Ok(cache)
    }

    // == Set ==
    /// Stores a value, replacing whatever the key held before.
    ///
    /// The kind is taken from the value's shape. Metadata is reset. If the
    /// key is new and the cache is full, the least recently used entry is
    /// evicted first.
    ///
    /// # Arguments
    /// * `key` - The key to store
    /// * `value` - The value to store
    /// * `ttl` - TTL in seconds; None uses the default, Some(0) never expires
    pub fn set(&mut self, key: &str, value: impl Into<Value>, ttl: Option<u64>) -> Result<()> {
        let value = value.into();
        Self::check_set(key, &value)?;

        let now = self.now();
        self.expire_key(key, now);
        if lru::needs_eviction(&self.entries, key, self.max_size) {
            self.make_room(now);
        }

        let seq = self.next_seq();
        let ttl = ttl.unwrap_or(self.default_ttl);
        self.metadata
            .insert(key.to_string(), EntryMetadata::new(key, &value, now));
        self.entries
            .insert(key.to_string(), CacheEntry::new(value, now, ttl, seq));

        self.persist();
        Ok(())
    }

    /// Checks that `set(key, value, ..)` would accept the key and value.
    ///
    /// # Errors
    /// `InvalidArgument` for an empty or oversized key, or an oversized element.
    pub fn check_set(key: &str, value: &Value) -> Result<()> {
        validate_key(key)?;
        validate_value(value)
    }

    // == Get ==
    /// Retrieves a value by key, or None if absent or expired.
    pub fn get(&mut self, key: &str) -> Option<Value> {
        match self.lookup(key, None) {
            Ok(Some(entry)) => Some(entry.value.clone()),
            _ => None,
        }
    }

    // == Delete ==
    /// Removes an entry. Returns true if something was removed.
    pub fn del(&mut self, key: &str) -> bool {
        let now = self.now();
        self.expire_key(key, now);

        let removed = self.remove_entry(key);
        if removed {
            self.persist();
        }
        removed
    }

    // == Exists ==
    /// Returns true if the key is present and not expired.
    pub fn exists(&mut self, key: &str) -> bool {
        let now = self.now();
        self.expire_key(key, now);
        self.entries.contains_key(key)
    }

    // == Expire ==
    /// Sets the key to expire `seconds` from now.
    ///
    /// Returns false if the key is absent.
    ///
    /// # Errors
    /// `InvalidArgument` if `seconds` is negative.
    pub fn expire(&mut self, key: &str, seconds: i64) -> Result<bool> {
        if seconds < 0 {
            return Err(CacheError::InvalidArgument(format!(
                "TTL must be non-negative, got {}",
                seconds
            )));
        }

        let now = self.now();
        self.expire_key(key, now);
        let Some(entry) = self.entries.get_mut(key) else {
            return Ok(false);
        };
        let ms = (seconds as u64).saturating_mul(1000);
        entry.expires_at = Some(now.saturating_add(ms));

        self.persist();
        Ok(true)
    }

    // == TTL ==
    /// Remaining time to live in whole seconds, rounded up.
    ///
    /// Returns -1 if the key has no expiry and -2 if it is absent or expired.
    pub fn ttl(&mut self, key: &str) -> i64 {
        let now = self.now();
        self.expire_key(key, now);
        match self.entries.get(key) {
            None => -2,
            Some(entry) => match entry.ttl_remaining_ms(now) {
                None => -1,
                Some(ms) => ms.div_ceil(1000) as i64,
            },
        }
    }

    // == Keys ==
    /// Returns the live keys matching a glob pattern, sorted.
    ///
    /// `*` matches any run of characters and `?` exactly one; the pattern
    /// must match the whole key.
    pub fn keys(&mut self, pattern: &str) -> Vec<String> {
        self.sweep_expired();
        let mut keys: Vec<String> = self
            .entries
            .keys()
            .filter(|key| glob_match(pattern, key))
            .cloned()
            .collect();
        keys.sort();
        keys
    }

    // == Flush All ==
    /// Removes every entry.
    pub fn flush_all(&mut self) {
        let count = self.entries.len();
        self.entries.clear();
        self.metadata.clear();
        info!("Flushed {} entries", count);
        self.persist();
    }

    // == Info ==
    /// Reports key count, capacity, size and hit statistics.
    ///
    /// Expired entries not yet swept are excluded.
    pub fn info(&self) -> CacheInfo {
        let now = self.now();
        let live: Vec<&String> = self
            .entries
            .iter()
            .filter(|(_, entry)| !entry.is_expired(now))
            .map(|(key, _)| key)
            .collect();
        let approximate_size_bytes = live
            .iter()
            .filter_map(|key| self.metadata.get(*key))
            .map(|meta| meta.approximate_size_bytes)
            .sum();

        CacheInfo {
            keys: live.len(),
            max_size: self.max_size,
            default_ttl_seconds: self.default_ttl,
            approximate_size_bytes,
            hits: self.stats.hits,
            misses: self.stats.misses,
            hit_rate: self.stats.hit_rate(),
            evictions: self.stats.evictions,
            expired: self.stats.expired,
            persistence_dirty: self.dirty,
        }
    }

    // == Sweep Expired ==
    /// Removes all expired entries from the cache.
    ///
    /// Returns the number of entries removed.
    pub fn sweep_expired(&mut self) -> usize {
        let now = self.now();
        let expired_keys: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired_keys {
            self.remove_entry(key);
        }
        self.stats.record_expired(expired_keys.len());
        expired_keys.len()
    }

    // == Save ==
    /// Writes a snapshot now, reporting any failure to the caller.
    ///
    /// Does nothing for an unpersisted cache.
    pub fn save(&mut self) -> Result<()> {
        let Some(store) = &self.blob_store else {
            return Ok(());
        };
        let bytes = encode_snapshot(&self.entries, &self.metadata)?;
        match store.save(&bytes) {
            Ok(()) => {
                self.dirty = false;
                Ok(())
            }
            Err(e) => {
                self.dirty = true;
                Err(CacheError::Persistence(format!("{:#}", e)))
            }
        }
    }

    // == Accessors ==
    /// Returns the number of stored entries, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Returns a copy of the hit/miss/eviction counters.
    pub fn stats(&self) -> CacheStats {
        self.stats.clone()
    }

    /// Returns the live entry for `key` without touching it.
    pub fn peek(&self, key: &str) -> Option<&CacheEntry> {
        let now = self.now();
        self.entries.get(key).filter(|entry| !entry.is_expired(now))
    }

    /// Returns the metadata for a live key.
    pub fn metadata(&self, key: &str) -> Option<&EntryMetadata> {
        self.peek(key)?;
        self.metadata.get(key)
    }

    // == Typed Operation Support ==

    /// Looks up a live entry for a read, recording a hit or miss.
    ///
    /// A hit refreshes the entry's recency. A kind mismatch fails before
    /// anything is recorded.
    pub(super) fn lookup(
        &mut self,
        key: &str,
        expected: Option<Kind>,
    ) -> Result<Option<&mut CacheEntry>> {
        let now = self.now();
        self.expire_key(key, now);

        if let (Some(kind), Some(entry)) = (expected, self.entries.get(key)) {
            if entry.kind() != kind {
                return Err(CacheError::type_mismatch(key, kind, entry.kind()));
            }
        }

        let seq = self.next_seq();
        match self.entries.get_mut(key) {
            Some(entry) => {
                entry.touch(now, seq);
                if let Some(meta) = self.metadata.get_mut(key) {
                    meta.cumulative_access_count += 1;
                }
                self.stats.record_hit();
                Ok(Some(entry))
            }
            None => {
                self.stats.record_miss();
                Ok(None)
            }
        }
    }

    /// Returns the entry a typed write should mutate, creating an empty one
    /// of `kind` if the key is absent.
    ///
    /// Callers must finish with [`Cache::commit_write`].
    pub(super) fn entry_for_write(&mut self, key: &str, kind: Kind) -> Result<&mut CacheEntry> {
        validate_key(key)?;
        let now = self.now();
        self.expire_key(key, now);

        if let Some(entry) = self.entries.get(key) {
            if entry.kind() != kind {
                return Err(CacheError::type_mismatch(key, kind, entry.kind()));
            }
        } else {
            if lru::needs_eviction(&self.entries, key, self.max_size) {
                self.make_room(now);
            }
            let value = Value::empty(kind);
            self.metadata
                .insert(key.to_string(), EntryMetadata::new(key, &value, now));
            let seq = self.next_seq();
            self.entries.insert(
                key.to_string(),
                CacheEntry::new(value, now, self.default_ttl, seq),
            );
            return self
                .entries
                .get_mut(key)
                .ok_or_else(|| CacheError::InvalidArgument(format!("entry vanished: {}", key)));
        }

        let seq = self.next_seq();
        if let Some(meta) = self.metadata.get_mut(key) {
            meta.cumulative_access_count += 1;
        }
        let entry = self
            .entries
            .get_mut(key)
            .ok_or_else(|| CacheError::InvalidArgument(format!("entry vanished: {}", key)))?;
        entry.touch(now, seq);
        Ok(entry)
    }

    /// Returns an existing entry for a removing write (pop, delete field),
    /// or None when the key is absent. Never creates an entry.
    pub(super) fn existing_for_write(
        &mut self,
        key: &str,
        kind: Kind,
    ) -> Result<Option<&mut CacheEntry>> {
        let now = self.now();
        self.expire_key(key, now);

        match self.entries.get(key) {
            None => return Ok(None),
            Some(entry) if entry.kind() != kind => {
                return Err(CacheError::type_mismatch(key, kind, entry.kind()));
            }
            Some(_) => {}
        }

        let seq = self.next_seq();
        if let Some(meta) = self.metadata.get_mut(key) {
            meta.cumulative_access_count += 1;
        }
        Ok(self.entries.get_mut(key).map(|entry| {
            entry.touch(now, seq);
            entry
        }))
    }

    /// Refreshes size metadata for `key` and persists.
    pub(super) fn commit_write(&mut self, key: &str) {
        if let (Some(entry), Some(meta)) = (self.entries.get(key), self.metadata.get_mut(key)) {
            meta.resize(key, &entry.value);
        }
        self.persist();
    }

    // == Internals ==

    fn now(&self) -> u64 {
        self.clock.now_ms()
    }

    fn next_seq(&mut self) -> u64 {
        self.seq += 1;
        self.seq
    }

    /// Removes `key` if it has expired. Returns true if it was removed.
    fn expire_key(&mut self, key: &str, now: u64) -> bool {
        let expired = self
            .entries
            .get(key)
            .is_some_and(|entry| entry.is_expired(now));
        if expired {
            self.remove_entry(key);
            self.stats.record_expired(1);
            debug!("Lazily expired key '{}'", key);
        }
        expired
    }

    fn remove_entry(&mut self, key: &str) -> bool {
        self.metadata.remove(key);
        self.entries.remove(key).is_some()
    }

    /// Frees one slot: expired entries go first, otherwise the LRU victim.
    fn make_room(&mut self, now: u64) {
        let purged = self.sweep_expired();
        if purged > 0 {
            debug!(
                "Purged {} expired entries to make room at {}ms",
                purged, now
            );
        }

        while self.entries.len() >= self.max_size {
            let Some(victim) = lru::select_victim(&self.entries) else {
                break;
            };
            self.remove_entry(&victim);
            self.stats.record_eviction();
            debug!("Evicted least recently used key '{}'", victim);
        }
    }

    /// Saves a snapshot after a mutation. Failures are logged and retried
    /// on the next mutation; in-memory state is kept.
    fn persist(&mut self) {
        if self.blob_store.is_none() {
            return;
        }
        if let Err(e) = self.save() {
            warn!("Snapshot save failed, will retry on next write: {}", e);
        }
    }

    /// Loads the blob store snapshot, dropping expired entries and evicting
    /// down to capacity.
    fn restore(&mut self) {
        let Some(store) = &self.blob_store else {
            return;
        };
        let bytes = match store.load() {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return,
            Err(e) => {
                warn!("Snapshot load failed, starting empty: {:#}", e);
                return;
            }
        };
        let snapshot = match decode_snapshot(&bytes) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("Snapshot unreadable, starting empty: {}", e);
                return;
            }
        };

        let now = self.now();
        let mut metadata = snapshot.metadata;
        for (key, entry) in snapshot.entries {
            if entry.is_expired(now) || validate_key(&key).is_err() {
                continue;
            }
            let meta = metadata
                .remove(&key)
                .unwrap_or_else(|| EntryMetadata::new(&key, &entry.value, now));
            self.seq = self.seq.max(entry.access_seq);
            self.metadata.insert(key.clone(), meta);
            self.entries.insert(key, entry);
        }

        while self.entries.len() > self.max_size {
            let Some(victim) = lru::select_victim(&self.entries) else {
                break;
            };
            self.remove_entry(&victim);
            self.stats.record_eviction();
        }
        info!("Restored {} entries from snapshot", self.entries.len());
    }
}

// == Validation ==

fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(CacheError::InvalidArgument("Key cannot be empty".to_string()));
    }
    if key.len() > MAX_KEY_LENGTH {
        return Err(CacheError::InvalidArgument(format!(
            "Key exceeds maximum length of {} bytes",
            MAX_KEY_LENGTH
        )));
    }
    Ok(())
}

/// Rejects a single string element larger than `MAX_VALUE_SIZE`.
pub(super) fn validate_element(element: &str) -> Result<()> {
    if element.len() > MAX_VALUE_SIZE {
        return Err(CacheError::InvalidArgument(format!(
            "Value exceeds maximum size of {} bytes",
            MAX_VALUE_SIZE
        )));
    }
    Ok(())
}

fn validate_value(value: &Value) -> Result<()> {
    match value {
        Value::Scalar(s) => validate_element(s),
        Value::Hash(map) => map
            .iter()
            .try_for_each(|(field, v)| validate_element(field).and_then(|_| validate_element(v))),
        Value::List(items) => items.iter().try_for_each(|item| validate_element(item)),
        Value::Set(members) => members.iter().try_for_each(|member| validate_element(member)),
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::persistence::MemoryBlobStore;
    use std::time::Duration;

    const START: u64 = 1_700_000_000_000;

    fn store_with(max_size: usize, default_ttl: u64) -> (Cache, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(START));
        let cache = Cache::with_clock(&CacheConfig::new(max_size, default_ttl), clock.clone())
            .unwrap();
        (cache, clock)
    }

    fn scalar(s: &str) -> Option<Value> {
        Some(Value::from(s))
    }

    #[test]
    fn test_store_new() {
        let (store, _) = store_with(100, 0);
        assert_eq!(store.len(), 0);
        assert!(store.is_empty());
        assert_eq!(store.max_size(), 100);
    }

    #[test]
    fn test_store_rejects_zero_capacity() {
        let result = Cache::with_clock(&CacheConfig::new(0, 0), Arc::new(SystemClock));
        assert!(matches!(result, Err(CacheError::InvalidArgument(_))));
    }

    #[test]
    fn test_store_set_and_get() {
        let (mut store, _) = store_with(100, 0);

        store.set("key1", "value1", None).unwrap();

        assert_eq!(store.get("key1"), scalar("value1"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_get_nonexistent() {
        let (mut store, _) = store_with(100, 0);
        assert_eq!(store.get("nonexistent"), None);
    }

    #[test]
    fn test_store_del() {
        let (mut store, _) = store_with(100, 0);

        store.set("key1", "value1", None).unwrap();
        assert!(store.del("key1"));
        assert!(!store.del("key1"));

        assert!(store.is_empty());
        assert!(!store.exists("key1"));
        assert!(store.metadata("key1").is_none());
    }

    #[test]
    fn test_store_overwrite_changes_kind() {
        let (mut store, _) = store_with(100, 0);

        store.hset("key1", "f", "v").unwrap();
        store.set("key1", "value2", None).unwrap();

        assert_eq!(store.get("key1"), scalar("value2"));
        assert_eq!(store.len(), 1);
        assert!(store.hget("key1", "f").is_err());
    }

    #[test]
    fn test_store_overwrite_resets_metadata() {
        let (mut store, clock) = store_with(100, 0);

        store.set("key1", "a", None).unwrap();
        store.get("key1");
        store.get("key1");
        assert_eq!(store.metadata("key1").unwrap().cumulative_access_count, 2);

        clock.advance(Duration::from_secs(5));
        store.set("key1", "bb", None).unwrap();

        let meta = store.metadata("key1").unwrap();
        assert_eq!(meta.cumulative_access_count, 0);
        assert_eq!(meta.created_at, START + 5_000);
        assert_eq!(meta.approximate_size_bytes, "key1".len() + 2);
        assert_eq!(store.peek("key1").unwrap().access_count, 0);
    }

    #[test]
    fn test_store_ttl_expiration() {
        let (mut store, clock) = store_with(100, 0);

        store.set("key1", "value1", Some(1)).unwrap();
        assert_eq!(store.get("key1"), scalar("value1"));

        clock.advance(Duration::from_millis(999));
        assert!(store.exists("key1"));

        clock.advance(Duration::from_millis(1));
        assert_eq!(store.get("key1"), None);
        assert_eq!(store.ttl("key1"), -2);
        assert_eq!(store.stats().expired, 1);
    }

    #[test]
    fn test_store_zero_ttl_never_expires() {
        let (mut store, clock) = store_with(100, 60);

        store.set("forever", "v", Some(0)).unwrap();
        clock.advance(Duration::from_secs(365 * 24 * 3600));

        assert_eq!(store.get("forever"), scalar("v"));
        assert_eq!(store.ttl("forever"), -1);
    }

    #[test]
    fn test_store_default_ttl_applies() {
        let (mut store, clock) = store_with(100, 10);

        store.set("k", "v", None).unwrap();
        assert_eq!(store.ttl("k"), 10);

        clock.advance(Duration::from_secs(10));
        assert!(!store.exists("k"));
    }

    #[test]
    fn test_store_ttl_rounds_up() {
        let (mut store, clock) = store_with(100, 0);

        store.set("k", "v", Some(10)).unwrap();
        clock.advance(Duration::from_millis(500));
        assert_eq!(store.ttl("k"), 10);

        clock.advance(Duration::from_millis(600));
        assert_eq!(store.ttl("k"), 9);
        assert_eq!(store.ttl("missing"), -2);
    }

    #[test]
    fn test_store_expire() {
        let (mut store, clock) = store_with(100, 0);

        assert!(!store.expire("missing", 5).unwrap());

        store.set("k", "v", None).unwrap();
        assert_eq!(store.ttl("k"), -1);
        assert!(store.expire("k", 5).unwrap());
        assert_eq!(store.ttl("k"), 5);

        clock.advance(Duration::from_secs(5));
        assert_eq!(store.get("k"), None);
    }

    #[test]
    fn test_store_expire_rejects_negative() {
        let (mut store, _) = store_with(100, 0);
        store.set("k", "v", None).unwrap();

        assert!(matches!(
            store.expire("k", -1),
            Err(CacheError::InvalidArgument(_))
        ));
        assert_eq!(store.ttl("k"), -1);
    }

    #[test]
    fn test_store_typed_write_keeps_expiry() {
        let (mut store, _) = store_with(100, 0);

        store.rpush("list", ["a"]).unwrap();
        store.expire("list", 30).unwrap();
        store.rpush("list", ["b"]).unwrap();

        assert_eq!(store.ttl("list"), 30);
    }

    #[test]
    fn test_store_lru_eviction() {
        let (mut store, clock) = store_with(3, 0);

        for key in ["key1", "key2", "key3"] {
            store.set(key, "v", None).unwrap();
            clock.advance(Duration::from_millis(1));
        }

        // Cache is full, adding key4 should evict key1 (oldest)
        store.set("key4", "value4", None).unwrap();

        assert_eq!(store.len(), 3);
        assert!(!store.exists("key1"));
        assert!(store.exists("key2"));
        assert!(store.exists("key3"));
        assert!(store.exists("key4"));
        assert_eq!(store.stats().evictions, 1);
    }

    #[test]
    fn test_store_lru_touch_on_get_same_millisecond() {
        let (mut store, _) = store_with(3, 0);

        store.set("key1", "value1", None).unwrap();
        store.set("key2", "value2", None).unwrap();
        store.set("key3", "value3", None).unwrap();

        // Access key1 to make it most recently used
        store.get("key1").unwrap();

        // Adding key4 should evict key2 (now oldest)
        store.set("key4", "value4", None).unwrap();

        assert!(store.exists("key1"));
        assert!(!store.exists("key2"));
    }

    #[test]
    fn test_store_overwrite_never_evicts() {
        let (mut store, _) = store_with(2, 0);

        store.set("a", "1", None).unwrap();
        store.set("b", "2", None).unwrap();
        store.set("a", "3", None).unwrap();

        assert_eq!(store.len(), 2);
        assert!(store.exists("b"));
        assert_eq!(store.stats().evictions, 0);
    }

    #[test]
    fn test_store_expired_entries_freed_before_eviction() {
        let (mut store, clock) = store_with(2, 0);

        store.set("short", "v", Some(1)).unwrap();
        store.set("long", "v", None).unwrap();
        clock.advance(Duration::from_secs(2));

        store.set("new", "v", None).unwrap();

        assert!(store.exists("long"));
        assert!(store.exists("new"));
        assert_eq!(store.stats().evictions, 0);
    }

    #[test]
    fn test_store_stats() {
        let (mut store, _) = store_with(100, 0);

        store.set("key1", "value1", None).unwrap();
        store.get("key1").unwrap(); // hit
        let _ = store.get("nonexistent"); // miss

        let stats = store.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn test_store_sweep_expired() {
        let (mut store, clock) = store_with(100, 0);

        store.set("key1", "value1", Some(1)).unwrap();
        store.set("key2", "value2", Some(10)).unwrap();
        clock.advance(Duration::from_millis(1100));

        assert_eq!(store.sweep_expired(), 1);
        assert_eq!(store.len(), 1);
        assert!(store.exists("key2"));
    }

    #[test]
    fn test_store_keys_excludes_expired() {
        let (mut store, clock) = store_with(100, 0);

        store.set("user:1", "a", None).unwrap();
        store.set("user:2", "b", Some(1)).unwrap();
        store.set("session:1", "c", None).unwrap();
        clock.advance(Duration::from_secs(1));

        assert_eq!(store.keys("user:*"), vec!["user:1".to_string()]);
        assert_eq!(store.keys("*"), vec!["session:1", "user:1"]);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_store_flush_all() {
        let (mut store, _) = store_with(100, 0);
        store.set("a", "1", None).unwrap();
        store.sadd("s", ["x"]).unwrap();

        store.flush_all();

        assert!(store.is_empty());
        assert_eq!(store.info().keys, 0);
    }

    #[test]
    fn test_store_info() {
        let (mut store, clock) = store_with(10, 0);

        store.set("a", "12345", None).unwrap();
        store.set("b", "x", Some(1)).unwrap();
        store.get("a");
        store.get("zzz");
        clock.advance(Duration::from_secs(1));

        let info = store.info();
        assert_eq!(info.keys, 1);
        assert_eq!(info.max_size, 10);
        assert_eq!(info.approximate_size_bytes, 6);
        assert_eq!(info.hits, 1);
        assert_eq!(info.misses, 1);
        assert_eq!(info.hit_rate, 0.5);
        assert!(!info.persistence_dirty);
    }

    #[test]
    fn test_store_key_validation() {
        let (mut store, _) = store_with(100, 0);
        let long_key = "x".repeat(MAX_KEY_LENGTH + 1);

        assert!(matches!(
            store.set(&long_key, "value", None),
            Err(CacheError::InvalidArgument(_))
        ));
        assert!(matches!(
            store.set("", "value", None),
            Err(CacheError::InvalidArgument(_))
        ));
        assert!(store.hset("", "f", "v").is_err());
    }

    #[test]
    fn test_store_value_too_large() {
        let (mut store, _) = store_with(100, 0);
        let large_value = "x".repeat(MAX_VALUE_SIZE + 1);

        assert!(matches!(
            store.set("key", large_value.as_str(), None),
            Err(CacheError::InvalidArgument(_))
        ));
        assert!(store.rpush("list", [large_value]).is_err());
        assert!(!store.exists("list"));
    }

    #[test]
    fn test_store_persists_and_restores() {
        let blob = MemoryBlobStore::new();
        let clock = Arc::new(ManualClock::new(START));
        let config = CacheConfig::new(10, 0);

        {
            let mut store =
                Cache::open(&config, Some(Box::new(blob.clone())), clock.clone()).unwrap();
            store.set("scalar", "v", None).unwrap();
            store.hset("hash", "f", "1").unwrap();
            store.set("short", "v", Some(1)).unwrap();
        }
        assert!(blob.contents().is_some());

        clock.advance(Duration::from_secs(2));
        let mut restored = Cache::open(&config, Some(Box::new(blob)), clock).unwrap();

        assert_eq!(restored.len(), 2);
        assert_eq!(restored.get("scalar"), scalar("v"));
        assert_eq!(restored.hget("hash", "f").unwrap(), Some("1".to_string()));
        assert!(!restored.exists("short"));
    }

    #[test]
    fn test_store_restore_trims_to_capacity() {
        let blob = MemoryBlobStore::new();
        let clock = Arc::new(ManualClock::new(START));

        {
            let mut store = Cache::open(
                &CacheConfig::new(10, 0),
                Some(Box::new(blob.clone())),
                clock.clone(),
            )
            .unwrap();
            for key in ["a", "b", "c"] {
                store.set(key, "v", None).unwrap();
            }
        }

        let mut small =
            Cache::open(&CacheConfig::new(2, 0), Some(Box::new(blob)), clock).unwrap();
        assert_eq!(small.len(), 2);
        assert!(!small.exists("a"));
    }

    #[test]
    fn test_store_corrupt_snapshot_starts_empty() {
        let blob = MemoryBlobStore::with_contents(b"{ not json".to_vec());
        let store = Cache::open(
            &CacheConfig::new(10, 0),
            Some(Box::new(blob)),
            Arc::new(ManualClock::new(START)),
        )
        .unwrap();
        assert!(store.is_empty());
    }

    #[derive(Debug)]
    struct BrokenBlobStore;

    impl BlobStore for BrokenBlobStore {
        fn load(&self) -> anyhow::Result<Option<Vec<u8>>> {
            Err(anyhow::anyhow!("disk offline"))
        }

        fn save(&self, _bytes: &[u8]) -> anyhow::Result<()> {
            Err(anyhow::anyhow!("disk offline"))
        }
    }

    #[test]
    fn test_store_save_failure_keeps_entries() {
        let mut store = Cache::open(
            &CacheConfig::new(10, 0),
            Some(Box::new(BrokenBlobStore)),
            Arc::new(ManualClock::new(START)),
        )
        .unwrap();

        store.set("k", "v", None).unwrap();

        assert_eq!(store.get("k"), scalar("v"));
        assert!(store.info().persistence_dirty);
        assert!(matches!(store.save(), Err(CacheError::Persistence(_))));
    }

    /// Fails the first save, then delegates to a memory store.
    #[derive(Debug)]
    struct FlakyBlobStore {
        inner: MemoryBlobStore,
        failed: std::sync::atomic::AtomicBool,
    }

    impl BlobStore for FlakyBlobStore {
        fn load(&self) -> anyhow::Result<Option<Vec<u8>>> {
            self.inner.load()
        }

        fn save(&self, bytes: &[u8]) -> anyhow::Result<()> {
            use std::sync::atomic::Ordering;
            if !self.failed.swap(true, Ordering::SeqCst) {
                return Err(anyhow::anyhow!("disk busy"));
            }
            self.inner.save(bytes)
        }
    }

    #[test]
    fn test_store_save_retried_on_next_write() {
        let blob = MemoryBlobStore::new();
        let flaky = FlakyBlobStore {
            inner: blob.clone(),
            failed: std::sync::atomic::AtomicBool::new(false),
        };
        let mut store = Cache::open(
            &CacheConfig::new(10, 0),
            Some(Box::new(flaky)),
            Arc::new(ManualClock::new(START)),
        )
        .unwrap();

        store.set("first", "1", None).unwrap();
        assert!(store.info().persistence_dirty);
        assert!(blob.contents().is_none());

        store.set("second", "2", None).unwrap();
        assert!(!store.info().persistence_dirty);

        let snapshot = decode_snapshot(&blob.contents().unwrap()).unwrap();
        assert!(snapshot.entries.contains_key("first"));
        assert!(snapshot.entries.contains_key("second"));
    }

    #[test]
    fn test_typed_creation_starts_untouched_like_set() {
        let (mut store, _) = store_with(10, 0);
        store.set("plain", "v", None).unwrap();
        store.hset("hash", "f", "v").unwrap();
        store.rpush("list", ["a"]).unwrap();
        store.sadd("set", ["m"]).unwrap();

        for key in ["plain", "hash", "list", "set"] {
            assert_eq!(store.peek(key).unwrap().access_count, 0, "{}", key);
            assert_eq!(store.metadata(key).unwrap().cumulative_access_count, 0, "{}", key);
        }

        store.hset("hash", "g", "w").unwrap();
        assert_eq!(store.peek("hash").unwrap().access_count, 1);
    }
}
