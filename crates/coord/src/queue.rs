//! Named FIFO work queues.
//!
//! Messages are JSON envelopes `{type, payload, timestamp}`; serde_json
//! preserves maps and primitives across producer and consumer. Pops are
//! destructive: a handler that fails after popping loses the message. All
//! current message types are idempotent or advisory, so redelivery
//! machinery is not worth its complexity here.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::store::CoordStore;

const QUEUE_PREFIX: &str = "queue:";

/// How long a blocking dequeue waits before giving up.
const BLOCKING_POP_TIMEOUT: Duration = Duration::from_secs(10);

/// Envelope carried on every queue.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueueMessage {
    /// Message discriminator (e.g. `CARD_CREATED`, `CLEAR_ALL`, `SYSTEM`).
    #[serde(rename = "type")]
    pub message_type: String,
    /// Free-form payload; producers put maps or strings here.
    #[serde(default)]
    pub payload: serde_json::Value,
    /// Producer-side enqueue time, Unix milliseconds.
    pub timestamp: i64,
}

impl QueueMessage {
    /// Build an envelope stamped with the current time.
    pub fn new(message_type: &str, payload: serde_json::Value) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as i64;
        Self {
            message_type: message_type.to_string(),
            payload,
            timestamp,
        }
    }
}

/// FIFO push/pop over named queues in the coordination store.
pub struct WorkQueue {
    store: Arc<dyn CoordStore>,
}

impl WorkQueue {
    pub fn new(store: Arc<dyn CoordStore>) -> Self {
        Self { store }
    }

    fn queue_key(queue: &str) -> String {
        format!("{QUEUE_PREFIX}{queue}")
    }

    /// Append a message to the queue. Best-effort: a store failure is
    /// logged and the message dropped (degraded mode).
    pub async fn enqueue(&self, queue: &str, message: &QueueMessage) {
        let raw = match serde_json::to_string(message) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::error!(queue, error = %e, "Failed to serialize queue message");
                return;
            }
        };
        match self.store.list_push_left(&Self::queue_key(queue), &raw).await {
            Ok(()) => {
                tracing::info!(queue, message_type = %message.message_type, "Message enqueued");
            }
            Err(e) => {
                tracing::error!(queue, error = %e, "Failed to enqueue message");
            }
        }
    }

    /// Pop the oldest message, waiting up to 10 seconds for one to arrive.
    /// For dedicated worker loops that should park instead of spinning.
    pub async fn dequeue_blocking(&self, queue: &str) -> Option<QueueMessage> {
        let raw = self
            .store
            .list_pop_right_blocking(&Self::queue_key(queue), BLOCKING_POP_TIMEOUT)
            .await;
        self.decode(queue, raw)
    }

    /// Pop the oldest message without waiting. The dispatcher polls with
    /// this so its cycle never blocks on an empty queue.
    pub async fn dequeue(&self, queue: &str) -> Option<QueueMessage> {
        let raw = self.store.list_pop_right(&Self::queue_key(queue)).await;
        self.decode(queue, raw)
    }

    /// Read-only snapshot of the queue, newest first.
    pub async fn peek(&self, queue: &str) -> Vec<QueueMessage> {
        match self.store.list_range(&Self::queue_key(queue)).await {
            Ok(raws) => raws
                .iter()
                .filter_map(|raw| serde_json::from_str(raw).ok())
                .collect(),
            Err(e) => {
                tracing::error!(queue, error = %e, "Failed to peek queue");
                Vec::new()
            }
        }
    }

    /// Number of pending messages. 0 on store failure.
    pub async fn len(&self, queue: &str) -> i64 {
        match self.store.list_len(&Self::queue_key(queue)).await {
            Ok(len) => len,
            Err(e) => {
                tracing::error!(queue, error = %e, "Failed to read queue length");
                0
            }
        }
    }

    /// Drop every pending message in the queue.
    pub async fn clear(&self, queue: &str) {
        match self.store.del(&Self::queue_key(queue)).await {
            Ok(_) => tracing::info!(queue, "Queue cleared"),
            Err(e) => tracing::error!(queue, error = %e, "Failed to clear queue"),
        }
    }

    fn decode(
        &self,
        queue: &str,
        raw: Result<Option<String>, crate::store::StoreError>,
    ) -> Option<QueueMessage> {
        match raw {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(message) => Some(message),
                Err(e) => {
                    tracing::error!(queue, error = %e, "Dropping undecodable queue message");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                tracing::error!(queue, error = %e, "Failed to dequeue message");
                None
            }
        }
    }
}
