//! Handlers for the `/decks` resource.
//!
//! Reads are public; mutations require `USER` or `ADMIN` and pass the
//! ownership check (owner or admin). Invariant violations surface as 400
//! with the rule spelled out in the message.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use deckforge_core::error::CoreError;
use deckforge_core::types::DbId;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireUser;
use crate::response::Envelope;
use crate::services::deck::{DeckDto, DeckOperationData};
use crate::state::AppState;

/// Body for `POST /decks` and `PUT /decks/{id}`.
#[derive(Debug, Deserialize)]
pub struct DeckRequest {
    pub name: Option<String>,
}

/// GET /api/decks
///
/// Everyone can see all decks (with owner info); only the owner or an
/// admin can modify them.
pub async fn list(State(state): State<AppState>) -> AppResult<Json<Envelope<Vec<DeckDto>>>> {
    let decks = state.decks.list().await?;
    Ok(Json(Envelope::ok("Decks fetched", decks)))
}

/// GET /api/decks/{id}
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<Envelope<DeckDto>>> {
    let deck = state
        .decks
        .get(id)
        .await?
        .ok_or_else(|| CoreError::not_found("Deck", id.to_string()))?;
    Ok(Json(Envelope::ok("Deck fetched", deck)))
}

/// POST /api/decks
///
/// The owner is always the authenticated principal. The per-user creation
/// lock turns rapid double-submits into a 409.
pub async fn create(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    Json(input): Json<DeckRequest>,
) -> AppResult<(StatusCode, Json<Envelope<DeckDto>>)> {
    let name = input.name.unwrap_or_default();
    let deck = state.decks.create(&name, &user.username).await?;
    Ok((StatusCode::CREATED, Json(Envelope::ok("Deck created", deck))))
}

/// PUT /api/decks/{id}
pub async fn update(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<DeckRequest>,
) -> AppResult<Json<Envelope<DeckDto>>> {
    authorize_deck_mutation(&state, id, &user, "modify").await?;

    let name = input.name.unwrap_or_default();
    let deck = state.decks.update(id, &name).await?;
    Ok(Json(Envelope::ok("Deck updated", deck)))
}

/// DELETE /api/decks/{id}
pub async fn delete(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<Envelope<serde_json::Value>>> {
    authorize_deck_mutation(&state, id, &user, "delete").await?;

    state.decks.delete(id).await?;
    Ok(Json(Envelope::ok_message("Deck deleted")))
}

/// POST /api/decks/{deckId}/cards/{cardName}
pub async fn add_card(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    Path((deck_id, card_name)): Path<(DbId, String)>,
) -> AppResult<Json<Envelope<DeckOperationData>>> {
    authorize_deck_mutation(&state, deck_id, &user, "modify").await?;

    let data = state.decks.add_card(deck_id, &card_name).await?;
    Ok(Json(Envelope::ok("Card added to deck", data)))
}

/// DELETE /api/decks/{deckId}/cards/{cardName}
pub async fn remove_card(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    Path((deck_id, card_name)): Path<(DbId, String)>,
) -> AppResult<Json<Envelope<DeckOperationData>>> {
    authorize_deck_mutation(&state, deck_id, &user, "modify").await?;

    let data = state.decks.remove_card(deck_id, &card_name).await?;
    Ok(Json(Envelope::ok("Card removed from deck", data)))
}

/// 404 for a missing deck, 403 for a principal that is neither the owner
/// nor an admin. State is left untouched on rejection.
async fn authorize_deck_mutation(
    state: &AppState,
    deck_id: DbId,
    user: &AuthUser,
    verb: &str,
) -> AppResult<()> {
    if !state.decks.exists(deck_id).await? {
        return Err(AppError::Core(CoreError::not_found(
            "Deck",
            deck_id.to_string(),
        )));
    }
    if !state
        .decks
        .can_modify(deck_id, &user.username, user.is_admin())
        .await?
    {
        return Err(AppError::Core(CoreError::Forbidden(format!(
            "You don't have permission to {verb} this deck"
        ))));
    }
    Ok(())
}
