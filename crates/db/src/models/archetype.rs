//! Archetype grouping model.

use deckforge_core::types::DbId;
use serde::Serialize;
use sqlx::FromRow;

/// Archetype row. Created lazily when a card first references the name,
/// garbage-collected once the last referencing card is deleted.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Archetype {
    pub id: DbId,
    pub name: String,
}
