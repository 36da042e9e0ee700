//! Cache Module
//!
//! Provides the in-memory typed cache with TTL expiration and LRU eviction.

mod entry;
mod hash;
mod list;
mod lru;
mod pattern;
mod set;
mod stats;
mod store;
mod value;


// Re-export public types
pub use entry::{CacheEntry, EntryMetadata};
pub use pattern::glob_match;
pub use stats::{CacheInfo, CacheStats};
pub use store::Cache;
pub use value::{Kind, Value};

// == Public Constants ==
/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;

/// Maximum allowed size of a single scalar, field value or element in bytes
pub const MAX_VALUE_SIZE: usize = 1024 * 1024; // 1 MB
