//! Mini Cache - An embedded Redis-like key-value cache
//!
//! Provides typed scalar/hash/list/set storage with TTL expiration, LRU
//! eviction, glob key enumeration, snapshot persistence and cache-aside /
//! write-through helpers.

pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod handle;
pub mod persistence;
pub mod tasks;

pub use cache::{Cache, CacheInfo, Kind, Value};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::CacheConfig;
pub use error::{CacheError, Result};
pub use handle::CacheHandle;
pub use persistence::{BlobStore, FileBlobStore, MemoryBlobStore};
pub use tasks::{spawn_interval_sweep, spawn_sweep_task};
