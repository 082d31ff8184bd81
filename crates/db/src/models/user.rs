//! Principal account model and DTOs.

use deckforge_core::types::DbId;
use serde::Serialize;
use sqlx::FromRow;

/// Full user row from `app_user`.
///
/// Contains the password hash -- NEVER serialize this to API responses
/// directly. Use [`UserResponse`] for external-facing output.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: DbId,
    pub username: String,
    pub password_hash: String,
    /// Stored role name, `ROLE_` prefixed (e.g. `"ROLE_ADMIN"`).
    pub role: String,
    pub enabled: bool,
}

/// Safe user representation for API responses (no password hash).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: DbId,
    pub username: String,
    /// Role name without the storage prefix (e.g. `"ADMIN"`).
    pub role: String,
    pub enabled: bool,
}

/// DTO for creating a new user.
#[derive(Debug)]
pub struct CreateUser {
    pub username: String,
    pub password_hash: String,
    pub role: String,
}
