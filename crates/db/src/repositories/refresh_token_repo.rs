//! Repository for the `refresh_token` table.

use deckforge_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::refresh_token::RefreshToken;

const COLUMNS: &str =
    "id, token_hash, user_id, created_at, expires_at, last_used_at, revoked";

/// Provides lifecycle operations for refresh tokens.
pub struct RefreshTokenRepo;

impl RefreshTokenRepo {
    /// Persist a new token digest for a user, returning the created row.
    pub async fn create(
        pool: &PgPool,
        user_id: DbId,
        token_hash: &str,
        expires_at: Timestamp,
    ) -> Result<RefreshToken, sqlx::Error> {
        let query = format!(
            "INSERT INTO refresh_token (token_hash, user_id, expires_at) \
             VALUES ($1, $2, $3) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, RefreshToken>(&query)
            .bind(token_hash)
            .bind(user_id)
            .bind(expires_at)
            .fetch_one(pool)
            .await
    }

    /// Look up a token row by its digest.
    pub async fn find_by_hash(
        pool: &PgPool,
        token_hash: &str,
    ) -> Result<Option<RefreshToken>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM refresh_token WHERE token_hash = $1");
        sqlx::query_as::<_, RefreshToken>(&query)
            .bind(token_hash)
            .fetch_optional(pool)
            .await
    }

    /// Mark a token revoked. Already-revoked and unknown tokens are a no-op,
    /// which makes logout idempotent.
    pub async fn revoke(pool: &PgPool, token_hash: &str) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE refresh_token SET revoked = TRUE WHERE token_hash = $1")
            .bind(token_hash)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Revoke every token belonging to a user. Returns the number revoked.
    pub async fn revoke_all_for_user(pool: &PgPool, user_id: DbId) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE refresh_token SET revoked = TRUE WHERE user_id = $1 AND revoked = FALSE",
        )
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Record a successful use of the token.
    pub async fn touch_last_used(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE refresh_token SET last_used_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Bulk-delete revoked and expired rows. Returns the number deleted.
    pub async fn delete_expired_and_revoked(
        pool: &PgPool,
        now: Timestamp,
    ) -> Result<u64, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM refresh_token WHERE revoked = TRUE OR expires_at < $1")
                .bind(now)
                .execute(pool)
                .await?;
        Ok(result.rows_affected())
    }
}
