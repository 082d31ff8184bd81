//! Deck model and DTOs.

use deckforge_core::types::DbId;
use sqlx::FromRow;

/// Deck row. `username` is the owning principal.
#[derive(Debug, Clone, FromRow)]
pub struct Deck {
    pub id: DbId,
    pub name: String,
    pub username: String,
}

/// DTO for creating a deck. The owner comes from the authenticated
/// principal, never from the request body.
#[derive(Debug)]
pub struct CreateDeck {
    pub name: String,
    pub username: String,
}
