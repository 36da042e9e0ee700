//! Error types for the cache engine
//!
//! Provides unified error handling using thiserror. Absent keys are never
//! errors: read operations report them as `None` or an empty collection.

use thiserror::Error;

use crate::cache::Kind;

// == Cache Error Enum ==
/// Unified error type for the cache engine.
#[derive(Error, Debug)]
pub enum CacheError {
    /// A typed operation targeted a key holding a different kind of value
    #[error("Type mismatch on key '{key}': expected {expected}, found {found}")]
    TypeMismatch {
        key: String,
        expected: Kind,
        found: Kind,
    },

    /// Invalid argument or configuration
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The blob store failed to load or save a snapshot
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// A snapshot could not be encoded or decoded
    #[error("Snapshot error: {0}")]
    Snapshot(#[from] serde_json::Error),

    /// A cache-aside loader failed; nothing was stored
    #[error("Loader failed: {0}")]
    Loader(#[source] anyhow::Error),

    /// A write-through persist function failed; the cache was not updated
    #[error("Write-through failed: {0}")]
    WriteThrough(#[source] anyhow::Error),
}

impl CacheError {
    /// Builds a `TypeMismatch` for `key`.
    pub(crate) fn type_mismatch(key: &str, expected: Kind, found: Kind) -> Self {
        CacheError::TypeMismatch {
            key: key.to_string(),
            expected,
            found,
        }
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache engine.
pub type Result<T> = std::result::Result<T, CacheError>;
