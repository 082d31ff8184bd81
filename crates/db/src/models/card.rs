//! Catalog entry model and write DTO.

use deckforge_core::types::DbId;
use sqlx::FromRow;

/// Card row joined with its archetype name.
///
/// Every card query goes through the same LEFT JOIN so the API layer can
/// build the nested archetype object without a second round trip.
#[derive(Debug, Clone, FromRow)]
pub struct CardRecord {
    pub name: String,
    pub card_type: Option<String>,
    pub description: Option<String>,
    pub race: Option<String>,
    pub attribute: Option<String>,
    pub archetype_id: Option<DbId>,
    pub archetype_name: Option<String>,
}

/// DTO for inserting or updating a card. The archetype is already resolved
/// to a row id by the archetype upsert before this reaches the repository.
#[derive(Debug, Clone)]
pub struct UpsertCard {
    pub name: String,
    pub card_type: Option<String>,
    pub description: Option<String>,
    pub race: Option<String>,
    pub attribute: Option<String>,
    pub archetype_id: Option<DbId>,
}
