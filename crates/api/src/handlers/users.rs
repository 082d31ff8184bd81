//! Handler for the admin `/users` listing.

use axum::extract::State;
use axum::Json;
use deckforge_core::roles::display_role;
use deckforge_db::models::user::UserResponse;
use deckforge_db::repositories::UserRepo;

use crate::error::AppResult;
use crate::middleware::rbac::RequireAdmin;
use crate::response::Envelope;
use crate::state::AppState;

/// GET /api/users (ADMIN)
///
/// Lists principals without password hashes; roles in display form.
pub async fn list(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> AppResult<Json<Envelope<Vec<UserResponse>>>> {
    let users = UserRepo::find_all(&state.pool)
        .await?
        .into_iter()
        .map(|u| UserResponse {
            id: u.id,
            username: u.username,
            role: display_role(&u.role).to_string(),
            enabled: u.enabled,
        })
        .collect();
    Ok(Json(Envelope::ok("Users fetched", users)))
}
