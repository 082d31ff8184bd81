//! JWT-based authentication extractors for axum handlers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use deckforge_core::error::CoreError;
use deckforge_core::roles::ROLE_ADMIN;

use crate::auth::jwt::validate_token;
use crate::error::AppError;
use crate::state::AppState;

/// Authenticated principal extracted from a Bearer token in the
/// `Authorization` header. Rejects with 401 when the token is missing or
/// invalid; use [`MaybeUser`] on endpoints that allow anonymous access.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub username: String,
    /// Stored-form role names (e.g. `["ROLE_USER"]`).
    pub roles: Vec<String>,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.roles.iter().any(|r| r == ROLE_ADMIN)
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        extract_user(parts, state)?.ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Authentication required".into(),
            ))
        })
    }
}

/// Optional principal: `None` when the request carries no usable token.
///
/// The request proceeds anonymously; access control happens downstream at
/// the endpoints that need it.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<AuthUser>);

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(extract_user(parts, state).unwrap_or(None)))
    }
}

/// Pull and validate the Bearer token, if one is present.
///
/// A malformed header or a token that fails validation yields `Ok(None)`
/// rather than an error: unauthenticated requests stay anonymous and the
/// route decides whether that is acceptable.
fn extract_user(parts: &Parts, state: &AppState) -> Result<Option<AuthUser>, AppError> {
    let Some(header) = parts
        .headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
    else {
        return Ok(None);
    };

    let Some(token) = header.strip_prefix("Bearer ") else {
        return Ok(None);
    };

    match validate_token(&state.jwt, token) {
        Ok(claims) => Ok(Some(AuthUser {
            username: claims.sub,
            roles: claims.roles,
        })),
        Err(e) => {
            tracing::debug!(error = %e, "Rejected bearer token");
            Ok(None)
        }
    }
}
