//! Readiness probe.
//!
//! Reports DOWN until the catalog holds the configured minimum number of
//! cards, which makes it usable as a Kubernetes readiness probe: a replica
//! that has not finished seeding takes no traffic.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use deckforge_db::repositories::CardRepo;
use serde_json::json;

use crate::state::AppState;

/// GET /actuator/health
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let required = state.config.min_healthy_card_count;
    match CardRepo::count(&state.pool).await {
        Ok(count) if count >= required => (
            StatusCode::OK,
            Json(json!({
                "status": "UP",
                "details": { "cardsLoaded": count },
            })),
        ),
        Ok(count) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "DOWN",
                "details": {
                    "cardsLoaded": count,
                    "required": required,
                    "reason": "insufficient-cards",
                },
            })),
        ),
        Err(e) => {
            tracing::error!(error = %e, "Health check database query failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "DOWN",
                    "details": { "reason": "database-unreachable" },
                })),
            )
        }
    }
}
