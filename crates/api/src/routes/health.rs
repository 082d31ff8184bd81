//! Readiness probe route, mounted at root level (not under `/api`), so it
//! bypasses rate limiting and auth entirely.

use axum::routing::get;
use axum::Router;

use crate::handlers::health;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/actuator/health", get(health::health))
}
