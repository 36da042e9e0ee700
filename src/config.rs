//! Configuration Module
//!
//! Handles loading and validating cache configuration from environment variables.

use std::env;
use std::path::PathBuf;

use crate::error::{CacheError, Result};

// == Cache Config ==
/// Cache construction parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Maximum number of keys the cache can hold
    pub max_size: usize,
    /// Default TTL in seconds for writes without an explicit TTL (0 = no expiry)
    pub default_ttl_seconds: u64,
    /// Interval in seconds between background expiry sweeps
    pub sweep_interval_secs: u64,
    /// Snapshot file for the file-backed blob store, None = no persistence
    pub snapshot_path: Option<PathBuf>,
}

impl CacheConfig {
    /// Creates a config with the given capacity and default TTL.
    pub fn new(max_size: usize, default_ttl_seconds: u64) -> Self {
        Self {
            max_size,
            default_ttl_seconds,
            ..Self::default()
        }
    }

    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_MAX_SIZE` - Maximum keys (default: 1000)
    /// - `CACHE_DEFAULT_TTL` - Default TTL in seconds (default: 0, no expiry)
    /// - `CACHE_SWEEP_INTERVAL` - Sweep frequency in seconds (default: 1)
    /// - `CACHE_SNAPSHOT_PATH` - Snapshot file path (default: unset)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_size: parse_var("CACHE_MAX_SIZE").unwrap_or(defaults.max_size),
            default_ttl_seconds: parse_var("CACHE_DEFAULT_TTL")
                .unwrap_or(defaults.default_ttl_seconds),
            sweep_interval_secs: parse_var("CACHE_SWEEP_INTERVAL")
                .unwrap_or(defaults.sweep_interval_secs),
            snapshot_path: env::var("CACHE_SNAPSHOT_PATH")
                .ok()
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
        }
    }

    // == Validate ==
    /// Rejects a zero capacity or a zero sweep interval.
    pub fn validate(&self) -> Result<()> {
        if self.max_size == 0 {
            return Err(CacheError::InvalidArgument(
                "max_size must be a positive integer".to_string(),
            ));
        }
        if self.sweep_interval_secs == 0 {
            return Err(CacheError::InvalidArgument(
                "sweep_interval_secs must be a positive integer".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_size: 1000,
            default_ttl_seconds: 0,
            sweep_interval_secs: 1,
            snapshot_path: None,
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}
