//! Repository for the `archetype` table.

use deckforge_core::types::DbId;
use sqlx::{PgExecutor, PgPool};

use crate::models::archetype::Archetype;

const COLUMNS: &str = "id, name";

/// Provides CRUD operations for archetypes.
pub struct ArchetypeRepo;

impl ArchetypeRepo {
    /// List all archetypes in alphabetical order.
    pub async fn find_all(pool: &PgPool) -> Result<Vec<Archetype>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM archetype ORDER BY name ASC");
        sqlx::query_as::<_, Archetype>(&query).fetch_all(pool).await
    }

    /// Find an archetype by id.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Archetype>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM archetype WHERE id = $1");
        sqlx::query_as::<_, Archetype>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find an archetype by its unique name.
    pub async fn find_by_name<'e>(
        exec: impl PgExecutor<'e>,
        name: &str,
    ) -> Result<Option<Archetype>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM archetype WHERE name = $1");
        sqlx::query_as::<_, Archetype>(&query)
            .bind(name)
            .fetch_optional(exec)
            .await
    }

    /// Find every archetype whose name appears in `names`.
    pub async fn find_by_names<'e>(
        exec: impl PgExecutor<'e>,
        names: &[String],
    ) -> Result<Vec<Archetype>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM archetype WHERE name = ANY($1)");
        sqlx::query_as::<_, Archetype>(&query)
            .bind(names)
            .fetch_all(exec)
            .await
    }

    /// Bulk-insert archetype names, skipping any that already exist.
    ///
    /// Returns only the rows this call actually created; a concurrent
    /// writer's rows must be picked up with [`ArchetypeRepo::find_by_names`].
    pub async fn insert_missing<'e>(
        exec: impl PgExecutor<'e>,
        names: &[String],
    ) -> Result<Vec<Archetype>, sqlx::Error> {
        let query = format!(
            "INSERT INTO archetype (name) \
             SELECT unnest($1::varchar[]) \
             ON CONFLICT (name) DO NOTHING \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Archetype>(&query)
            .bind(names)
            .fetch_all(exec)
            .await
    }

    /// Delete an archetype by id. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM archetype WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
