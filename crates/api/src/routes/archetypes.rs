//! Route definitions for the `/archetypes` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::archetypes;
use crate::state::AppState;

/// Routes mounted at `/archetypes` (read-only).
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(archetypes::list))
        .route("/{id}", get(archetypes::get))
}
