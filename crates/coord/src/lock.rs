//! Distributed per-key mutex with auto-expiring leases.
//!
//! Acquire maps to set-if-absent on `lock:<key>` with the lease as TTL, so a
//! crashed holder never wedges the key. Release deletes unconditionally --
//! ownership is not verified. A delayed holder can therefore delete a
//! successor's lease, which at worst admits one extra contender; every
//! invariant guarded by these locks is revalidated inside a DB transaction.
//!
//! When the store is unreachable, `acquire` returns `true` (fail-open): the
//! lock trims redundant work, it is not the safety boundary.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::store::CoordStore;

const LOCK_PREFIX: &str = "lock:";
const LOCK_SENTINEL: &str = "locked";

/// Per-key mutex over the coordination store.
pub struct DistributedLock {
    store: Arc<dyn CoordStore>,
}

impl DistributedLock {
    pub fn new(store: Arc<dyn CoordStore>) -> Self {
        Self { store }
    }

    /// Try to acquire the lock for `key`, holding it for at most `lease`.
    ///
    /// Returns `false` only when another holder currently has the key.
    pub async fn acquire(&self, key: &str, lease: Duration) -> bool {
        let full_key = format!("{LOCK_PREFIX}{key}");
        match self.store.set_if_absent(&full_key, LOCK_SENTINEL, lease).await {
            Ok(true) => {
                tracing::debug!(key, "Lock acquired");
                true
            }
            Ok(false) => {
                tracing::debug!(key, "Lock held by another process");
                false
            }
            Err(e) => {
                tracing::error!(key, error = %e, "Lock acquire failed, failing open");
                true
            }
        }
    }

    /// Release the lock for `key`. Best-effort; an expired lease is fine.
    pub async fn release(&self, key: &str) {
        let full_key = format!("{LOCK_PREFIX}{key}");
        match self.store.del(&full_key).await {
            Ok(true) => tracing::debug!(key, "Lock released"),
            Ok(false) => tracing::debug!(key, "Lock already expired"),
            Err(e) => tracing::error!(key, error = %e, "Lock release failed"),
        }
    }

    /// Run `action` under the lock, releasing on every path.
    ///
    /// Returns `None` when the lock could not be acquired.
    pub async fn with_lock<T, F, Fut>(&self, key: &str, lease: Duration, action: F) -> Option<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        if !self.acquire(key, lease).await {
            return None;
        }
        let result = action().await;
        self.release(key).await;
        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn test_second_acquire_is_denied() {
        let lock = DistributedLock::new(Arc::new(MemoryStore::new()));
        let lease = Duration::from_secs(5);
        assert!(lock.acquire("deck:1", lease).await);
        assert!(!lock.acquire("deck:1", lease).await);
    }

    #[tokio::test]
    async fn test_release_reopens_the_key() {
        let lock = DistributedLock::new(Arc::new(MemoryStore::new()));
        let lease = Duration::from_secs(5);
        assert!(lock.acquire("deck:1", lease).await);
        lock.release("deck:1").await;
        assert!(lock.acquire("deck:1", lease).await);
    }

    #[tokio::test]
    async fn test_distinct_keys_do_not_contend() {
        let lock = DistributedLock::new(Arc::new(MemoryStore::new()));
        let lease = Duration::from_secs(5);
        assert!(lock.acquire("deck:1", lease).await);
        assert!(lock.acquire("deck:2", lease).await);
    }

    #[tokio::test]
    async fn test_acquire_fails_open_on_store_outage() {
        let store = Arc::new(MemoryStore::new());
        let lock = DistributedLock::new(store.clone());
        store.set_failing(true);
        assert!(lock.acquire("deck:1", Duration::from_secs(5)).await);
    }

    #[tokio::test]
    async fn test_with_lock_releases_after_action() {
        let lock = DistributedLock::new(Arc::new(MemoryStore::new()));
        let lease = Duration::from_secs(5);

        let ran = lock.with_lock("deck:9", lease, || async { 42 }).await;
        assert_eq!(ran, Some(42));
        // The key must be free again.
        assert!(lock.acquire("deck:9", lease).await);
    }

    #[tokio::test]
    async fn test_with_lock_denied_while_held() {
        let lock = DistributedLock::new(Arc::new(MemoryStore::new()));
        let lease = Duration::from_secs(5);
        assert!(lock.acquire("deck:9", lease).await);
        let ran = lock.with_lock("deck:9", lease, || async { 42 }).await;
        assert_eq!(ran, None);
    }
}
