//! Investigation entry cache implementation using Moka

use super::keys::CacheKey;
use chrono::{DateTime, Utc};
use moka::future::Cache;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use tracing::debug;

/// A cached provider result. Never mutated; a later write replaces it.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub value: Value,
    pub cached_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(value: Value) -> Self {
        Self {
            value,
            cached_at: Utc::now(),
        }
    }
}

/// Outcome of a read-through lookup
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    /// Served from the cache without calling the fetcher
    Hit(Value),
    /// Fetched and written to the cache
    Stored(Value),
    /// Fetched but not cacheable (error-shaped); nothing was written
    Rejected(Value),
}

impl Lookup {
    pub fn is_hit(&self) -> bool {
        matches!(self, Lookup::Hit(_))
    }

    pub fn value(&self) -> &Value {
        match self {
            Lookup::Hit(v) | Lookup::Stored(v) | Lookup::Rejected(v) => v,
        }
    }

    pub fn into_value(self) -> Value {
        match self {
            Lookup::Hit(v) | Lookup::Stored(v) | Lookup::Rejected(v) => v,
        }
    }
}

/// Unbounded store of cached lookups. Entries live until `invalidate_all`.
#[derive(Clone)]
pub struct EntryCacheManager {
    cache: Cache<CacheKey, CacheEntry>,
}

impl EntryCacheManager {
    pub fn new() -> Self {
        Self {
            cache: Cache::builder().build(),
        }
    }

    pub async fn get(&self, key: &CacheKey) -> Option<CacheEntry> {
        let result = self.cache.get(key).await;
        if result.is_some() {
            debug!("Cache hit for key: {}", key);
        } else {
            debug!("Cache miss for key: {}", key);
        }
        result
    }

    pub async fn insert(&self, key: CacheKey, value: Value) {
        debug!("Caching result for key: {}", key);
        self.cache.insert(key, CacheEntry::new(value)).await;
    }

    /// Return the cached value for `key`, or run `fetch` and cache its `Ok` value.
    ///
    /// Concurrent calls for the same key are coalesced: only one `fetch` runs and
    /// the others observe its result. `Err` values are handed back uncached.
    pub async fn get_or_try_insert_with<F>(&self, key: CacheKey, fetch: F) -> Lookup
    where
        F: Future<Output = Result<Value, Value>>,
    {
        let label = key.to_string();
        let result = self
            .cache
            .entry(key)
            .or_try_insert_with(async move { fetch.await.map(CacheEntry::new) })
            .await;

        match result {
            Ok(entry) if entry.is_fresh() => {
                debug!("Cache miss for key: {}, stored fresh result", label);
                Lookup::Stored(entry.into_value().value)
            }
            Ok(entry) => {
                debug!("Cache hit for key: {}", label);
                Lookup::Hit(entry.into_value().value)
            }
            Err(rejected) => {
                debug!("Result for key {} not cacheable", label);
                Lookup::Rejected(Arc::unwrap_or_clone(rejected))
            }
        }
    }

    pub async fn invalidate_all(&self) {
        self.cache.invalidate_all();
        self.cache.run_pending_tasks().await;
    }
}

impl Default for EntryCacheManager {
    fn default() -> Self {
        Self::new()
    }
}
