//! Coordination primitives over a shared in-memory store.
//!
//! [`store::CoordStore`] is the thin adapter over the store itself (Redis in
//! production, [`store::MemoryStore`] in tests). The primitives built on top:
//!
//! - [`cache::CacheNamespace`] -- read-through cache with whole-namespace
//!   eviction.
//! - [`lock::DistributedLock`] -- per-key mutex with auto-expiring leases,
//!   fail-open on store outage.
//! - [`rate_limit::RateLimiter`] -- token buckets keyed per principal and
//!   endpoint class.
//! - [`queue::WorkQueue`] -- named FIFO queues carrying JSON envelopes.

pub mod cache;
pub mod lock;
pub mod queue;
pub mod rate_limit;
pub mod store;

pub use cache::CacheNamespace;
pub use lock::DistributedLock;
pub use queue::{QueueMessage, WorkQueue};
pub use rate_limit::{RateLimiter, RatePolicy};
pub use store::{CoordStore, MemoryStore, RedisStore, StoreError, StoreResult};
