//! Refresh token model.

use deckforge_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// Refresh token row. `token_hash` is the SHA-256 digest of the opaque
/// token handed to the client; the plaintext is never stored.
#[derive(Debug, Clone, FromRow)]
pub struct RefreshToken {
    pub id: DbId,
    pub token_hash: String,
    pub user_id: DbId,
    pub created_at: Timestamp,
    pub expires_at: Timestamp,
    pub last_used_at: Option<Timestamp>,
    pub revoked: bool,
}

impl RefreshToken {
    /// A token is usable iff it is neither revoked nor past its expiry.
    pub fn is_active(&self, now: Timestamp) -> bool {
        !self.revoked && now < self.expires_at
    }
}
