//! Service layer: components built at startup with their collaborators.

pub mod archetype;
pub mod batch;
pub mod catalog;
pub mod deck;
pub mod seed;
pub mod token;

/// Queue drained for post-mutation catalog hooks.
pub const QUEUE_CARD_OPERATIONS: &str = "card-operations";
/// Queue drained for cache maintenance commands.
pub const QUEUE_CACHE_OPERATIONS: &str = "cache-operations";
/// Queue drained for the notification sink.
pub const QUEUE_NOTIFICATIONS: &str = "notifications";
