//! Token service: signed access tokens plus revocable refresh tokens.
//!
//! Access tokens are stateless RS256 JWTs (15 minutes); refresh tokens are
//! opaque UUIDs stored hashed with a 7-day expiry. A refresh token answers
//! `refresh` only while Active: revocation (logout) and expiry are both
//! terminal, and logout is idempotent.

use std::sync::Arc;

use chrono::Utc;
use deckforge_core::error::CoreError;
use deckforge_core::roles::display_role;
use deckforge_db::repositories::{RefreshTokenRepo, UserRepo};
use deckforge_db::DbPool;
use serde::Serialize;

use crate::auth::jwt::{
    generate_access_token, generate_refresh_token, hash_refresh_token, JwtKeys,
};
use crate::auth::password::verify_password;
use crate::error::{AppError, AppResult};

/// Successful login payload.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginData {
    pub access_token: String,
    pub refresh_token: String,
    pub username: String,
    /// Display-form roles (no `ROLE_` prefix).
    pub roles: Vec<String>,
    pub authenticated: bool,
}

/// Successful refresh payload. The refresh token is returned unchanged;
/// rotation is not required here.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshData {
    pub access_token: String,
    pub refresh_token: String,
}

/// Issues and validates the two token kinds.
pub struct TokenService {
    pool: DbPool,
    jwt: Arc<JwtKeys>,
}

impl TokenService {
    pub fn new(pool: DbPool, jwt: Arc<JwtKeys>) -> Self {
        Self { pool, jwt }
    }

    /// Verify credentials and mint a fresh access + refresh token pair.
    pub async fn login(&self, username: &str, password: &str) -> AppResult<LoginData> {
        let invalid = || AppError::Core(CoreError::Unauthorized("Invalid credentials".into()));

        let user = UserRepo::find_by_username(&self.pool, username)
            .await?
            .ok_or_else(invalid)?;

        if !user.enabled {
            return Err(invalid());
        }

        let password_ok = verify_password(password, &user.password_hash)
            .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;
        if !password_ok {
            return Err(invalid());
        }

        let roles = vec![user.role.clone()];
        let access_token = generate_access_token(&self.jwt, &user.username, &roles)
            .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;

        let (refresh_plaintext, refresh_hash) = generate_refresh_token();
        let expires_at = Utc::now() + chrono::Duration::milliseconds(self.jwt.refresh_ttl_ms);
        RefreshTokenRepo::create(&self.pool, user.id, &refresh_hash, expires_at).await?;

        tracing::info!(username = %user.username, "Login successful");
        Ok(LoginData {
            access_token,
            refresh_token: refresh_plaintext,
            username: user.username,
            roles: roles.iter().map(|r| display_role(r).to_string()).collect(),
            authenticated: true,
        })
    }

    /// Exchange an Active refresh token for a new access token.
    pub async fn refresh(&self, refresh_token: &str) -> AppResult<RefreshData> {
        let rejected = || {
            AppError::Core(CoreError::Unauthorized(
                "Invalid refresh token - please login again".into(),
            ))
        };

        let token_hash = hash_refresh_token(refresh_token);
        let row = RefreshTokenRepo::find_by_hash(&self.pool, &token_hash)
            .await?
            .ok_or_else(rejected)?;

        if !row.is_active(Utc::now()) {
            return Err(rejected());
        }

        RefreshTokenRepo::touch_last_used(&self.pool, row.id).await?;

        let user = UserRepo::find_by_id(&self.pool, row.user_id)
            .await?
            .ok_or_else(rejected)?;
        if !user.enabled {
            return Err(rejected());
        }

        let access_token = generate_access_token(&self.jwt, &user.username, &[user.role.clone()])
            .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;

        Ok(RefreshData {
            access_token,
            refresh_token: refresh_token.to_string(),
        })
    }

    /// Revoke a refresh token. Idempotent: revoking an unknown or already
    /// revoked token succeeds silently.
    pub async fn logout(&self, refresh_token: &str) -> AppResult<()> {
        let token_hash = hash_refresh_token(refresh_token);
        RefreshTokenRepo::revoke(&self.pool, &token_hash).await?;
        Ok(())
    }

    /// Bulk-delete revoked and expired rows. Returns the number removed.
    pub async fn cleanup_expired(&self) -> AppResult<u64> {
        Ok(RefreshTokenRepo::delete_expired_and_revoked(&self.pool, Utc::now()).await?)
    }
}
