//! Handlers for the `/auth` resource (login, refresh, logout, whoami).

use axum::extract::State;
use axum::Json;
use deckforge_core::roles::display_role;
use serde::Deserialize;
use serde_json::json;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::MaybeUser;
use crate::response::Envelope;
use crate::services::token::{LoginData, RefreshData};
use crate::state::AppState;

/// Request body for `POST /auth/login`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Request body for `POST /auth/refresh` and `POST /auth/logout`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenRequest {
    pub refresh_token: Option<String>,
}

/// POST /api/auth/login
///
/// Authenticate with username + password. Returns a short-lived access
/// token and a stateful refresh token.
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> AppResult<Json<Envelope<LoginData>>> {
    let (Some(username), Some(password)) = (input.username, input.password) else {
        return Err(AppError::BadRequest("Username and password required".into()));
    };

    let data = state.tokens.login(&username, &password).await?;
    Ok(Json(Envelope::ok("Login successful", data)))
}

/// POST /api/auth/refresh
///
/// Exchange an Active refresh token for a new access token. The refresh
/// token itself is returned unchanged.
pub async fn refresh(
    State(state): State<AppState>,
    Json(input): Json<RefreshTokenRequest>,
) -> AppResult<Json<Envelope<RefreshData>>> {
    let Some(token) = input.refresh_token else {
        return Err(AppError::BadRequest("Refresh token required".into()));
    };

    let data = state.tokens.refresh(&token).await?;
    Ok(Json(Envelope::ok("Token refreshed", data)))
}

/// POST /api/auth/logout
///
/// Revoke the refresh token. Access tokens are stateless and simply age
/// out. Idempotent: logging out twice succeeds both times.
pub async fn logout(
    State(state): State<AppState>,
    Json(input): Json<RefreshTokenRequest>,
) -> AppResult<Json<Envelope<serde_json::Value>>> {
    if let Some(token) = input.refresh_token {
        state.tokens.logout(&token).await?;
    }
    Ok(Json(Envelope::ok_message("Logged out successfully")))
}

/// GET /api/auth/user
///
/// Current principal info, or a guest payload when unauthenticated.
pub async fn current_user(
    MaybeUser(user): MaybeUser,
) -> Json<Envelope<serde_json::Value>> {
    match user {
        Some(user) => {
            let roles: Vec<&str> = user.roles.iter().map(|r| display_role(r)).collect();
            Json(Envelope::ok(
                "User authenticated",
                json!({
                    "username": user.username,
                    "roles": roles,
                    "authenticated": true,
                }),
            ))
        }
        None => Json(Envelope::ok(
            "Guest user",
            json!({
                "username": "guest",
                "roles": ["GUEST"],
                "authenticated": false,
            }),
        )),
    }
}
