//! Read-through cache namespace.
//!
//! A namespace groups the keys that must be evicted together. Values are
//! stored as JSON so pages, single entities, and scalars share one code
//! path. Store failures never fail a read: the loader runs against the
//! source of truth and the request proceeds uncached.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::store::CoordStore;

const CACHE_PREFIX: &str = "cache:";

/// Read-through cache over one logical namespace.
pub struct CacheNamespace {
    store: Arc<dyn CoordStore>,
    namespace: String,
    ttl: Duration,
}

impl CacheNamespace {
    pub fn new(store: Arc<dyn CoordStore>, namespace: &str, ttl: Duration) -> Self {
        Self {
            store,
            namespace: namespace.to_string(),
            ttl,
        }
    }

    fn full_key(&self, key: &str) -> String {
        format!("{CACHE_PREFIX}{}:{key}", self.namespace)
    }

    /// Return the cached value for `key`, or run `loader` and cache its
    /// result. Concurrent misses for the same key may each run the loader;
    /// with page-level keys and coarse eviction that duplication is cheaper
    /// than a cross-replica miss guard.
    pub async fn get_or_compute<T, E, F, Fut>(&self, key: &str, loader: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let full_key = self.full_key(key);

        match self.store.get(&full_key).await {
            Ok(Some(raw)) => match serde_json::from_str::<T>(&raw) {
                Ok(value) => return Ok(value),
                Err(e) => {
                    tracing::warn!(key = %full_key, error = %e, "Discarding undecodable cache entry");
                }
            },
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(key = %full_key, error = %e, "Cache read failed, falling through to loader");
            }
        }

        tracing::debug!(namespace = %self.namespace, key, "Cache miss, computing value");
        let value = loader().await?;
        self.store_value(&full_key, &value).await;
        Ok(value)
    }

    /// Unconditionally cache a value under `key`.
    pub async fn put<T: Serialize>(&self, key: &str, value: &T) {
        let full_key = self.full_key(key);
        self.store_value(&full_key, value).await;
    }

    /// Evict every key in the namespace.
    ///
    /// Eviction is deliberately coarse: pages, per-entity entries, and the
    /// count all go at once so a reader never sees a fresh page next to a
    /// stale count. Failures are logged; the mutation that triggered the
    /// eviction has already committed.
    pub async fn evict_all(&self) {
        let prefix = format!("{CACHE_PREFIX}{}:", self.namespace);
        match self.store.del_prefix(&prefix).await {
            Ok(removed) => {
                tracing::info!(namespace = %self.namespace, removed, "Evicted cache namespace");
            }
            Err(e) => {
                tracing::error!(namespace = %self.namespace, error = %e, "Cache eviction failed");
            }
        }
    }

    /// Presence check without altering recency. `false` on store failure.
    pub async fn probe(&self, key: &str) -> bool {
        self.store
            .exists(&self.full_key(key))
            .await
            .unwrap_or(false)
    }

    async fn store_value<T: Serialize>(&self, full_key: &str, value: &T) {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::error!(key = %full_key, error = %e, "Failed to serialize cache value");
                return;
            }
        };
        if let Err(e) = self.store.set_ex(full_key, &raw, self.ttl).await {
            tracing::warn!(key = %full_key, error = %e, "Cache write failed");
        }
    }
}
