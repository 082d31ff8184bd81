//! Token-bucket rate limiting backed by the coordination store.
//!
//! Bucket state lives store-side under `rate_limit:<identity>` so limits
//! hold across replicas and survive restarts. The service layer only sees
//! consumed / rejected. Store outage allows the request (fail-open); the
//! limiter protects capacity, it does not gate correctness.

use std::sync::Arc;
use std::time::Duration;

use crate::store::CoordStore;

const RATE_PREFIX: &str = "rate_limit:";

/// One bucket shape: `capacity` tokens refilled greedily over `window`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RatePolicy {
    pub capacity: u32,
    pub window: Duration,
}

impl RatePolicy {
    pub const fn per_minute(capacity: u32) -> Self {
        Self {
            capacity,
            window: Duration::from_secs(60),
        }
    }
}

/// Per-identity token buckets.
pub struct RateLimiter {
    store: Arc<dyn CoordStore>,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn CoordStore>) -> Self {
        Self { store }
    }

    /// Consume one token from the bucket for `identity`.
    ///
    /// `identity` is `<principalOrIp>:<normalizedPath>`; distinct endpoint
    /// classes therefore never share a bucket. Returns `false` when the
    /// bucket is empty.
    pub async fn try_consume(&self, identity: &str, policy: RatePolicy) -> bool {
        let key = format!("{RATE_PREFIX}{identity}");
        match self
            .store
            .take_token(&key, policy.capacity, policy.window)
            .await
        {
            Ok(allowed) => allowed,
            Err(e) => {
                tracing::error!(identity, error = %e, "Rate limit check failed, failing open");
                true
            }
        }
    }
}
