//! Background queue dispatcher.
//!
//! Every 5 seconds, drains up to 10 messages from each known queue with
//! non-blocking pops and routes them to a typed handler. A handler failure
//! aborts the remainder of that queue's batch for the cycle so one bad
//! message cannot cascade; the other queues still run. Replicas contend on
//! the same queues, which is the intended fan-out.

use std::sync::Arc;
use std::time::Duration;

use deckforge_coord::{CacheNamespace, QueueMessage, WorkQueue};
use tokio_util::sync::CancellationToken;

use crate::services::{QUEUE_CACHE_OPERATIONS, QUEUE_CARD_OPERATIONS, QUEUE_NOTIFICATIONS};

/// Fixed delay between dispatch cycles.
const DISPATCH_INTERVAL: Duration = Duration::from_secs(5);

/// Upper bound on messages drained per queue per cycle.
const MAX_MESSAGES_PER_CYCLE: usize = 10;

/// The queues a cycle visits, in order.
const KNOWN_QUEUES: [&str; 3] = [
    QUEUE_CARD_OPERATIONS,
    QUEUE_CACHE_OPERATIONS,
    QUEUE_NOTIFICATIONS,
];

/// Periodic bounded-batch drainer for the side-effect queues.
pub struct QueueDispatcher {
    queue: Arc<WorkQueue>,
    cache: Arc<CacheNamespace>,
}

impl QueueDispatcher {
    pub fn new(queue: Arc<WorkQueue>, cache: Arc<CacheNamespace>) -> Self {
        Self { queue, cache }
    }

    /// Run the dispatch loop until the cancellation token fires.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(DISPATCH_INTERVAL);
        tracing::info!(
            interval_secs = DISPATCH_INTERVAL.as_secs(),
            "Queue dispatcher started"
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Queue dispatcher shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    self.run_cycle().await;
                }
            }
        }
    }

    /// One dispatch cycle over every known queue.
    pub async fn run_cycle(&self) {
        for queue_name in KNOWN_QUEUES {
            self.drain_queue(queue_name).await;
        }
    }

    async fn drain_queue(&self, queue_name: &str) {
        let mut processed = 0;
        while processed < MAX_MESSAGES_PER_CYCLE {
            let Some(message) = self.queue.dequeue(queue_name).await else {
                break;
            };

            tracing::info!(
                queue = queue_name,
                message_type = %message.message_type,
                "Processing job"
            );

            if let Err(e) = self.dispatch(queue_name, &message).await {
                // Abort this queue's batch; a poisoned message should not
                // take the rest of the cycle down with it.
                tracing::error!(queue = queue_name, error = %e, "Handler failed, aborting batch");
                break;
            }
            processed += 1;
        }

        if processed > 0 {
            tracing::debug!(queue = queue_name, processed, "Drained queue batch");
        }
    }

    async fn dispatch(&self, queue_name: &str, message: &QueueMessage) -> Result<(), String> {
        match queue_name {
            QUEUE_CARD_OPERATIONS => self.handle_card_operation(message),
            QUEUE_CACHE_OPERATIONS => self.handle_cache_operation(message).await,
            QUEUE_NOTIFICATIONS => self.handle_notification(message),
            other => {
                tracing::warn!(queue = other, "Unknown queue");
                Ok(())
            }
        }
    }

    /// Post-mutation hooks for catalog writes.
    fn handle_card_operation(&self, message: &QueueMessage) -> Result<(), String> {
        let card_name = message
            .payload
            .get("cardName")
            .and_then(|v| v.as_str())
            .unwrap_or("<unknown>");
        match message.message_type.as_str() {
            "CARD_CREATED" => tracing::info!(card_name, "Processing card creation"),
            "CARD_UPDATED" => tracing::info!(card_name, "Processing card update"),
            "CARD_DELETED" => tracing::info!(card_name, "Processing card deletion"),
            other => tracing::warn!(message_type = other, "Unknown card operation type"),
        }
        Ok(())
    }

    /// Cache maintenance commands.
    async fn handle_cache_operation(&self, message: &QueueMessage) -> Result<(), String> {
        match message.message_type.as_str() {
            "CLEAR_ALL" => {
                tracing::info!("Clearing card caches on queue command");
                self.cache.evict_all().await;
            }
            other => tracing::warn!(message_type = other, "Unknown cache operation type"),
        }
        Ok(())
    }

    /// Notification sink. Delivery is a log line; wiring a real channel in
    /// means replacing this handler only.
    fn handle_notification(&self, message: &QueueMessage) -> Result<(), String> {
        let content = message
            .payload
            .get("content")
            .and_then(|v| v.as_str())
            .unwrap_or("");
        match message.message_type.as_str() {
            "EMAIL" => tracing::info!(content, "Would send email"),
            "SYSTEM" => tracing::info!(content, "System notification"),
            other => tracing::warn!(message_type = other, "Unknown notification type"),
        }
        Ok(())
    }
}
