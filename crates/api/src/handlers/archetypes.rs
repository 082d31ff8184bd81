//! Handlers for the `/archetypes` resource (read-only; rows are created
//! lazily by card saves and collected when their last card goes away).

use axum::extract::{Path, State};
use axum::Json;
use deckforge_core::error::CoreError;
use deckforge_core::types::DbId;
use deckforge_db::models::archetype::Archetype;
use deckforge_db::repositories::ArchetypeRepo;

use crate::error::AppResult;
use crate::response::Envelope;
use crate::state::AppState;

/// GET /api/archetypes
pub async fn list(State(state): State<AppState>) -> AppResult<Json<Envelope<Vec<Archetype>>>> {
    let archetypes = ArchetypeRepo::find_all(&state.pool).await?;
    Ok(Json(Envelope::ok("Archetypes fetched", archetypes)))
}

/// GET /api/archetypes/{id}
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<Envelope<Archetype>>> {
    let archetype = ArchetypeRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| CoreError::not_found("Archetype", id.to_string()))?;
    Ok(Json(Envelope::ok("Archetype fetched", archetype)))
}
