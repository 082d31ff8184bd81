//! Repository for the `card` table.
//!
//! Every read goes through the same LEFT JOIN against `archetype` so callers
//! always receive the archetype name alongside the row. Listing uses
//! `UPPER(name) COLLATE "C"` for a deterministic, case-insensitive order that
//! keeps pagination stable across requests.

use sqlx::{PgExecutor, PgPool};

use crate::models::card::{CardRecord, UpsertCard};

/// Column list for joined card queries.
const COLUMNS: &str = "c.name, c.card_type, c.description, c.race, c.attribute, \
     c.archetype_id, a.name AS archetype_name";

/// Provides CRUD operations for catalog entries.
pub struct CardRepo;

impl CardRepo {
    /// Find a card by its name (primary key).
    pub async fn find_by_name<'e>(
        exec: impl PgExecutor<'e>,
        name: &str,
    ) -> Result<Option<CardRecord>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM card c \
             LEFT JOIN archetype a ON a.id = c.archetype_id \
             WHERE c.name = $1"
        );
        sqlx::query_as::<_, CardRecord>(&query)
            .bind(name)
            .fetch_optional(exec)
            .await
    }

    /// List one page of the catalog in stable alphabetical order.
    pub async fn list_page(
        pool: &PgPool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<CardRecord>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM card c \
             LEFT JOIN archetype a ON a.id = c.archetype_id \
             ORDER BY UPPER(c.name) COLLATE \"C\" \
             LIMIT $1 OFFSET $2"
        );
        sqlx::query_as::<_, CardRecord>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Total number of catalog entries.
    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM card")
            .fetch_one(pool)
            .await
    }

    /// Case-insensitive substring search over card and archetype names.
    pub async fn search(
        pool: &PgPool,
        term: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<CardRecord>, sqlx::Error> {
        let pattern = like_pattern(term);
        let query = format!(
            "SELECT {COLUMNS} FROM card c \
             LEFT JOIN archetype a ON a.id = c.archetype_id \
             WHERE LOWER(c.name) LIKE $1 OR LOWER(a.name) LIKE $1 \
             ORDER BY UPPER(c.name) COLLATE \"C\" \
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, CardRecord>(&query)
            .bind(&pattern)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Number of rows the corresponding [`CardRepo::search`] would match.
    pub async fn search_count(pool: &PgPool, term: &str) -> Result<i64, sqlx::Error> {
        let pattern = like_pattern(term);
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM card c \
             LEFT JOIN archetype a ON a.id = c.archetype_id \
             WHERE LOWER(c.name) LIKE $1 OR LOWER(a.name) LIKE $1",
        )
        .bind(&pattern)
        .fetch_one(pool)
        .await
    }

    /// Insert a card or overwrite the mutable columns of an existing row.
    pub async fn upsert<'e>(
        exec: impl PgExecutor<'e>,
        input: &UpsertCard,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO card (name, card_type, description, race, attribute, archetype_id) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (name) DO UPDATE SET \
                card_type = EXCLUDED.card_type, \
                description = EXCLUDED.description, \
                race = EXCLUDED.race, \
                attribute = EXCLUDED.attribute, \
                archetype_id = EXCLUDED.archetype_id",
        )
        .bind(&input.name)
        .bind(&input.card_type)
        .bind(&input.description)
        .bind(&input.race)
        .bind(&input.attribute)
        .bind(input.archetype_id)
        .execute(exec)
        .await?;
        Ok(())
    }

    /// Delete a card by name. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, name: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM card WHERE name = $1")
            .bind(name)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Count cards still referencing an archetype, for orphan collection.
    pub async fn count_by_archetype_name(
        pool: &PgPool,
        archetype_name: &str,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM card c \
             JOIN archetype a ON a.id = c.archetype_id \
             WHERE a.name = $1",
        )
        .bind(archetype_name)
        .fetch_one(pool)
        .await
    }
}

fn like_pattern(term: &str) -> String {
    format!("%{}%", term.to_lowercase())
}
