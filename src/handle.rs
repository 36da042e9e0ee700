//! Cache Handle
//!
//! A clonable handle that shares one [`Cache`] between tasks, plus the
//! cache-aside and write-through helpers. Construct a handle once and pass
//! clones to every component that needs caching.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::{RwLock, RwLockWriteGuard};
use tracing::debug;

use crate::cache::{Cache, Value};
use crate::error::{CacheError, Result};

// == Cache Handle ==
/// Shared, thread-safe access to a cache.
///
/// Every cache operation needs `&mut Cache` since reads expire lazily, so
/// the handle only ever takes the write side of the lock and access is
/// always exclusive. Each call holds it for one synchronous cache
/// operation. Loader and persist futures run with no lock held; their
/// result is stored by a single `set` afterwards.
#[derive(Debug, Clone)]
pub struct CacheHandle {
    inner: Arc<RwLock<Cache>>,
}

impl CacheHandle {
    /// Wraps a cache for sharing.
    pub fn new(cache: Cache) -> Self {
        Self {
            inner: Arc::new(RwLock::new(cache)),
        }
    }

    /// Locks the cache exclusively for a sequence of synchronous operations.
    ///
    /// Do not hold the guard across unrelated awaits; the sweep task waits
    /// on the same lock.
    pub async fn lock(&self) -> RwLockWriteGuard<'_, Cache> {
        self.inner.write().await
    }

    /// Runs one synchronous operation with exclusive access.
    pub async fn with<T>(&self, op: impl FnOnce(&mut Cache) -> T) -> T {
        let mut cache = self.inner.write().await;
        op(&mut *cache)
    }

    // == Cache Aside ==
    /// Returns the cached value for `key`, loading and storing it on a miss.
    ///
    /// The loader runs at most once per call. Concurrent misses on the same
    /// key are not coalesced: each caller runs its own loader and the last
    /// store wins.
    ///
    /// # Arguments
    /// * `key` - The key to read through
    /// * `loader` - Produces the value on a miss
    /// * `ttl` - TTL for the stored value, as for [`Cache::set`]
    ///
    /// # Errors
    /// `Loader` if the loader fails (nothing is stored), or any error from
    /// storing the loaded value.
    pub async fn cache_aside<F, Fut, V>(
        &self,
        key: &str,
        loader: F,
        ttl: Option<u64>,
    ) -> Result<Value>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<V>>,
        V: Into<Value>,
    {
        if let Some(value) = self.with(|cache| cache.get(key)).await {
            return Ok(value);
        }

        debug!("Cache-aside miss for '{}', invoking loader", key);
        let value: Value = loader().await.map_err(CacheError::Loader)?.into();

        self.with(|cache| cache.set(key, value.clone(), ttl)).await?;
        Ok(value)
    }

    // == Write Through ==
    /// Persists `value` through `persist`, then caches it.
    ///
    /// The cache is only updated once `persist` succeeds.
    ///
    /// # Errors
    /// `InvalidArgument` if the cache would reject the key or value, checked
    /// before `persist` runs. `WriteThrough` if `persist` fails; the cache is
    /// left untouched.
    pub async fn write_through<F, Fut, V>(
        &self,
        key: &str,
        value: V,
        persist: F,
        ttl: Option<u64>,
    ) -> Result<()>
    where
        V: Into<Value>,
        F: FnOnce(Value) -> Fut,
        Fut: Future<Output = anyhow::Result<()>>,
    {
        let value = value.into();
        Cache::check_set(key, &value)?;
        persist(value.clone())
            .await
            .map_err(CacheError::WriteThrough)?;

        self.with(|cache| cache.set(key, value, ttl)).await
    }
}

impl From<Cache> for CacheHandle {
    fn from(cache: Cache) -> Self {
        Self::new(cache)
    }
}
