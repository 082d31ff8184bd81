//! Repository for the `deck` and `deck_card` tables.
//!
//! Card-membership operations take any `PgExecutor` so the deck service can
//! run them inside the transaction that revalidates the deck invariants.

use deckforge_core::types::DbId;
use sqlx::{PgExecutor, PgPool};

use crate::models::card::CardRecord;
use crate::models::deck::{CreateDeck, Deck};

const COLUMNS: &str = "id, name, username";

const CARD_COLUMNS: &str = "c.name, c.card_type, c.description, c.race, c.attribute, \
     c.archetype_id, a.name AS archetype_name";

/// Provides CRUD and membership operations for decks.
pub struct DeckRepo;

impl DeckRepo {
    /// List all decks.
    pub async fn find_all(pool: &PgPool) -> Result<Vec<Deck>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM deck ORDER BY id ASC");
        sqlx::query_as::<_, Deck>(&query).fetch_all(pool).await
    }

    /// Find a deck by id.
    pub async fn find_by_id<'e>(
        exec: impl PgExecutor<'e>,
        id: DbId,
    ) -> Result<Option<Deck>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM deck WHERE id = $1");
        sqlx::query_as::<_, Deck>(&query)
            .bind(id)
            .fetch_optional(exec)
            .await
    }

    /// Insert a new deck, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateDeck) -> Result<Deck, sqlx::Error> {
        let query = format!(
            "INSERT INTO deck (name, username) VALUES ($1, $2) RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Deck>(&query)
            .bind(&input.name)
            .bind(&input.username)
            .fetch_one(pool)
            .await
    }

    /// Rename a deck, returning the updated row.
    pub async fn update_name(
        pool: &PgPool,
        id: DbId,
        name: &str,
    ) -> Result<Option<Deck>, sqlx::Error> {
        let query = format!("UPDATE deck SET name = $2 WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, Deck>(&query)
            .bind(id)
            .bind(name)
            .fetch_optional(pool)
            .await
    }

    /// Delete a deck (memberships cascade). Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM deck WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// List the cards of a deck in insertion order (duplicates included).
    pub async fn cards_for_deck<'e>(
        exec: impl PgExecutor<'e>,
        deck_id: DbId,
    ) -> Result<Vec<CardRecord>, sqlx::Error> {
        let query = format!(
            "SELECT {CARD_COLUMNS} FROM deck_card dc \
             JOIN card c ON c.name = dc.card_name \
             LEFT JOIN archetype a ON a.id = c.archetype_id \
             WHERE dc.deck_id = $1 \
             ORDER BY dc.id ASC"
        );
        sqlx::query_as::<_, CardRecord>(&query)
            .bind(deck_id)
            .fetch_all(exec)
            .await
    }

    /// Total number of cards in a deck.
    pub async fn card_count<'e>(
        exec: impl PgExecutor<'e>,
        deck_id: DbId,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM deck_card WHERE deck_id = $1")
            .bind(deck_id)
            .fetch_one(exec)
            .await
    }

    /// Number of copies of one card in a deck.
    pub async fn copy_count<'e>(
        exec: impl PgExecutor<'e>,
        deck_id: DbId,
        card_name: &str,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM deck_card WHERE deck_id = $1 AND card_name = $2",
        )
        .bind(deck_id)
        .bind(card_name)
        .fetch_one(exec)
        .await
    }

    /// Append one copy of a card to a deck.
    pub async fn add_card<'e>(
        exec: impl PgExecutor<'e>,
        deck_id: DbId,
        card_name: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("INSERT INTO deck_card (deck_id, card_name) VALUES ($1, $2)")
            .bind(deck_id)
            .bind(card_name)
            .execute(exec)
            .await?;
        Ok(())
    }

    /// Remove the first occurrence of a card from a deck.
    ///
    /// Returns `false` (no-op) when the deck holds no copy of the card.
    pub async fn remove_first_card<'e>(
        exec: impl PgExecutor<'e>,
        deck_id: DbId,
        card_name: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM deck_card WHERE id = ( \
                SELECT id FROM deck_card \
                WHERE deck_id = $1 AND card_name = $2 \
                ORDER BY id ASC LIMIT 1)",
        )
        .bind(deck_id)
        .bind(card_name)
        .execute(exec)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Whether any deck still references the card. Gates card deletion.
    pub async fn card_in_any_deck(pool: &PgPool, card_name: &str) -> Result<bool, sqlx::Error> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM deck_card WHERE card_name = $1")
                .bind(card_name)
                .fetch_one(pool)
                .await?;
        Ok(count > 0)
    }
}
