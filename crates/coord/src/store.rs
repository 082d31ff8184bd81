//! Coordination-store adapter.
//!
//! [`CoordStore`] exposes the handful of atomic primitives everything else
//! is built on: set-if-absent with TTL, typed list operations, prefix
//! deletion, and an atomic token-bucket consume. [`RedisStore`] is the
//! production implementation; [`MemoryStore`] backs tests and can be flipped
//! into a failing state to exercise fail-open paths.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use tokio::sync::Mutex;

/// Transient failure talking to the coordination store.
///
/// Every operation can fail with this; callers decide between fail-open
/// (locks, rate limiter) and degrade-to-source (cache, queues).
#[derive(Debug, thiserror::Error)]
#[error("coordination store error: {0}")]
pub struct StoreError(pub String);

impl From<redis::RedisError> for StoreError {
    fn from(e: redis::RedisError) -> Self {
        StoreError(e.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Atomic primitives provided by the coordination store.
///
/// Atomicity holds per operation; no ordering is assumed across keys.
#[async_trait]
pub trait CoordStore: Send + Sync {
    /// Set `key` to `value` with a TTL iff the key does not exist.
    /// Returns `true` when the key was set.
    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> StoreResult<bool>;

    /// Delete a key. Returns `true` when a key was removed.
    async fn del(&self, key: &str) -> StoreResult<bool>;

    /// Fetch a string value.
    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Unconditionally set a string value with a TTL.
    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> StoreResult<()>;

    /// Presence check without touching recency.
    async fn exists(&self, key: &str) -> StoreResult<bool>;

    /// Delete every key starting with `prefix`. Returns the number removed.
    async fn del_prefix(&self, prefix: &str) -> StoreResult<u64>;

    /// Push a value at the head of a list.
    async fn list_push_left(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Pop from the tail of a list without waiting.
    async fn list_pop_right(&self, key: &str) -> StoreResult<Option<String>>;

    /// Pop from the tail of a list, waiting up to `timeout` for a value.
    async fn list_pop_right_blocking(
        &self,
        key: &str,
        timeout: Duration,
    ) -> StoreResult<Option<String>>;

    /// Read-only snapshot of a whole list, head first.
    async fn list_range(&self, key: &str) -> StoreResult<Vec<String>>;

    /// Length of a list (0 for a missing key).
    async fn list_len(&self, key: &str) -> StoreResult<i64>;

    /// Atomically refill and consume one token from a greedy token bucket.
    ///
    /// The bucket refills at `capacity / window` tokens per second up to
    /// `capacity`. Returns `true` when a token was consumed.
    async fn take_token(&self, key: &str, capacity: u32, window: Duration) -> StoreResult<bool>;
}

// ---------------------------------------------------------------------------
// Redis implementation
// ---------------------------------------------------------------------------

/// Atomic token-bucket refill + consume, evaluated server-side so that a
/// check is one round trip and safe across replicas.
const TAKE_TOKEN_SCRIPT: &str = r#"
local capacity = tonumber(ARGV[1])
local refill_per_sec = tonumber(ARGV[2])
local now_ms = tonumber(ARGV[3])
local ttl_secs = tonumber(ARGV[4])
local state = redis.call('HMGET', KEYS[1], 'tokens', 'ts')
local tokens = tonumber(state[1])
local ts = tonumber(state[2])
if tokens == nil or ts == nil then
    tokens = capacity
    ts = now_ms
end
local elapsed = math.max(0, now_ms - ts) / 1000.0
tokens = math.min(capacity, tokens + elapsed * refill_per_sec)
local allowed = 0
if tokens >= 1.0 then
    tokens = tokens - 1.0
    allowed = 1
end
redis.call('HSET', KEYS[1], 'tokens', tostring(tokens), 'ts', tostring(now_ms))
redis.call('EXPIRE', KEYS[1], ttl_secs)
return allowed
"#;

/// Redis-backed [`CoordStore`].
///
/// Holds a [`ConnectionManager`], which multiplexes and reconnects on its
/// own; per-operation failures surface as [`StoreError`].
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    /// Connect to the store at `url` (e.g. `redis://127.0.0.1:6379`).
    pub async fn connect(url: &str) -> StoreResult<Self> {
        let client = redis::Client::open(url).map_err(StoreError::from)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl CoordStore for RedisStore {
    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> StoreResult<bool> {
        let mut conn = self.conn.clone();
        let reply: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("NX")
            .arg("EX")
            .arg(ttl.as_secs().max(1))
            .query_async(&mut conn)
            .await?;
        Ok(reply.is_some())
    }

    async fn del(&self, key: &str) -> StoreResult<bool> {
        let mut conn = self.conn.clone();
        let removed: i64 = redis::cmd("DEL").arg(key).query_async(&mut conn).await?;
        Ok(removed > 0)
    }

    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = redis::cmd("GET").arg(key).query_async(&mut conn).await?;
        Ok(value)
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> StoreResult<()> {
        let mut conn = self.conn.clone();
        let _: () = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("EX")
            .arg(ttl.as_secs().max(1))
            .query_async(&mut conn)
            .await?;
        Ok(())
    }

    async fn exists(&self, key: &str) -> StoreResult<bool> {
        let mut conn = self.conn.clone();
        let n: i64 = redis::cmd("EXISTS").arg(key).query_async(&mut conn).await?;
        Ok(n > 0)
    }

    async fn del_prefix(&self, prefix: &str) -> StoreResult<u64> {
        let mut conn = self.conn.clone();
        let pattern = format!("{prefix}*");
        let mut cursor: u64 = 0;
        let mut deleted: u64 = 0;
        loop {
            let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(100)
                .query_async(&mut conn)
                .await?;
            if !keys.is_empty() {
                let removed: i64 = redis::cmd("DEL").arg(&keys).query_async(&mut conn).await?;
                deleted += removed as u64;
            }
            cursor = next;
            if cursor == 0 {
                break;
            }
        }
        Ok(deleted)
    }

    async fn list_push_left(&self, key: &str, value: &str) -> StoreResult<()> {
        let mut conn = self.conn.clone();
        let _: () = redis::cmd("LPUSH")
            .arg(key)
            .arg(value)
            .query_async(&mut conn)
            .await?;
        Ok(())
    }

    async fn list_pop_right(&self, key: &str) -> StoreResult<Option<String>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = redis::cmd("RPOP").arg(key).query_async(&mut conn).await?;
        Ok(value)
    }

    async fn list_pop_right_blocking(
        &self,
        key: &str,
        timeout: Duration,
    ) -> StoreResult<Option<String>> {
        let mut conn = self.conn.clone();
        let reply: Option<(String, String)> = redis::cmd("BRPOP")
            .arg(key)
            .arg(timeout.as_secs_f64())
            .query_async(&mut conn)
            .await?;
        Ok(reply.map(|(_list, value)| value))
    }

    async fn list_range(&self, key: &str) -> StoreResult<Vec<String>> {
        let mut conn = self.conn.clone();
        let values: Vec<String> = redis::cmd("LRANGE")
            .arg(key)
            .arg(0)
            .arg(-1)
            .query_async(&mut conn)
            .await?;
        Ok(values)
    }

    async fn list_len(&self, key: &str) -> StoreResult<i64> {
        let mut conn = self.conn.clone();
        let len: i64 = redis::cmd("LLEN").arg(key).query_async(&mut conn).await?;
        Ok(len)
    }

    async fn take_token(&self, key: &str, capacity: u32, window: Duration) -> StoreResult<bool> {
        let mut conn = self.conn.clone();
        let refill_per_sec = f64::from(capacity) / window.as_secs_f64();
        let now_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;
        // Bucket state outlives the window by one extra period, then expires.
        let ttl_secs = window.as_secs().max(1) * 2;
        let allowed: i64 = redis::Script::new(TAKE_TOKEN_SCRIPT)
            .key(key)
            .arg(capacity)
            .arg(refill_per_sec)
            .arg(now_ms)
            .arg(ttl_secs)
            .invoke_async(&mut conn)
            .await?;
        Ok(allowed == 1)
    }
}

// ---------------------------------------------------------------------------
// In-memory implementation (tests, single-process fallback)
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct ValueEntry {
    value: String,
    expires_at: Option<Instant>,
}

impl ValueEntry {
    fn live(&self) -> bool {
        self.expires_at.map(|t| Instant::now() < t).unwrap_or(true)
    }
}

#[derive(Debug, Default)]
struct MemoryInner {
    values: HashMap<String, ValueEntry>,
    lists: HashMap<String, VecDeque<String>>,
    buckets: HashMap<String, (f64, Instant)>,
}

/// In-process [`CoordStore`] with the same observable semantics as the
/// Redis implementation. `set_failing(true)` makes every operation return
/// [`StoreError`], which tests use to exercise degraded modes.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryInner>,
    failing: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip the store into (or out of) a hard-failure state.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> StoreResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            Err(StoreError("store unavailable".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl CoordStore for MemoryStore {
    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> StoreResult<bool> {
        self.check()?;
        let mut inner = self.inner.lock().await;
        if inner.values.get(key).map(ValueEntry::live).unwrap_or(false) {
            return Ok(false);
        }
        inner.values.insert(
            key.to_string(),
            ValueEntry {
                value: value.to_string(),
                expires_at: Some(Instant::now() + ttl),
            },
        );
        Ok(true)
    }

    async fn del(&self, key: &str) -> StoreResult<bool> {
        self.check()?;
        let mut inner = self.inner.lock().await;
        let had_value = inner.values.remove(key).map(|e| e.live()).unwrap_or(false);
        let had_list = inner.lists.remove(key).is_some();
        Ok(had_value || had_list)
    }

    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        self.check()?;
        let inner = self.inner.lock().await;
        Ok(inner
            .values
            .get(key)
            .filter(|e| e.live())
            .map(|e| e.value.clone()))
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> StoreResult<()> {
        self.check()?;
        let mut inner = self.inner.lock().await;
        inner.values.insert(
            key.to_string(),
            ValueEntry {
                value: value.to_string(),
                expires_at: Some(Instant::now() + ttl),
            },
        );
        Ok(())
    }

    async fn exists(&self, key: &str) -> StoreResult<bool> {
        self.check()?;
        let inner = self.inner.lock().await;
        Ok(inner.values.get(key).map(ValueEntry::live).unwrap_or(false))
    }

    async fn del_prefix(&self, prefix: &str) -> StoreResult<u64> {
        self.check()?;
        let mut inner = self.inner.lock().await;
        let before = inner.values.len();
        inner.values.retain(|k, _| !k.starts_with(prefix));
        Ok((before - inner.values.len()) as u64)
    }

    async fn list_push_left(&self, key: &str, value: &str) -> StoreResult<()> {
        self.check()?;
        let mut inner = self.inner.lock().await;
        inner
            .lists
            .entry(key.to_string())
            .or_default()
            .push_front(value.to_string());
        Ok(())
    }

    async fn list_pop_right(&self, key: &str) -> StoreResult<Option<String>> {
        self.check()?;
        let mut inner = self.inner.lock().await;
        Ok(inner.lists.get_mut(key).and_then(VecDeque::pop_back))
    }

    async fn list_pop_right_blocking(
        &self,
        key: &str,
        timeout: Duration,
    ) -> StoreResult<Option<String>> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(value) = self.list_pop_right(key).await? {
                return Ok(Some(value));
            }
            if Instant::now() >= deadline {
                return Ok(None);
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }

    async fn list_range(&self, key: &str) -> StoreResult<Vec<String>> {
        self.check()?;
        let inner = self.inner.lock().await;
        Ok(inner
            .lists
            .get(key)
            .map(|l| l.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn list_len(&self, key: &str) -> StoreResult<i64> {
        self.check()?;
        let inner = self.inner.lock().await;
        Ok(inner.lists.get(key).map(|l| l.len() as i64).unwrap_or(0))
    }

    async fn take_token(&self, key: &str, capacity: u32, window: Duration) -> StoreResult<bool> {
        self.check()?;
        let mut inner = self.inner.lock().await;
        let now = Instant::now();
        let refill_per_sec = f64::from(capacity) / window.as_secs_f64();
        let (tokens, ts) = inner
            .buckets
            .get(key)
            .copied()
            .unwrap_or((f64::from(capacity), now));
        let elapsed = now.saturating_duration_since(ts).as_secs_f64();
        let mut tokens = (tokens + elapsed * refill_per_sec).min(f64::from(capacity));
        let allowed = tokens >= 1.0;
        if allowed {
            tokens -= 1.0;
        }
        inner.buckets.insert(key.to_string(), (tokens, now));
        Ok(allowed)
    }
}
