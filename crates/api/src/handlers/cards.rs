//! Handlers for the `/cards` resource: catalog CRUD plus the admin cache,
//! queue, batch, and reload endpoints.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use deckforge_core::error::CoreError;
use deckforge_coord::QueueMessage;
use serde::Deserialize;
use serde_json::json;

use crate::error::AppResult;
use crate::middleware::rbac::RequireAdmin;
use crate::query::CardListParams;
use crate::response::{Envelope, PaginatedResponse};
use crate::services::catalog::{CardDto, CardMutation};
use crate::services::seed::CardImporter;
use crate::state::AppState;

/// Query for `GET /cards/by-name`.
#[derive(Debug, Deserialize)]
pub struct ByNameParams {
    pub name: String,
}

/// Body for `PATCH /cards/{name}`: partial update of the mutable fields.
/// The archetype is intentionally not patchable; use PUT for that.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchCardRequest {
    pub human_readable_card_type: Option<String>,
    pub description: Option<String>,
    pub race: Option<String>,
    pub attribute: Option<String>,
}

/// Body for `POST /cards/queue/{queue}/send`.
#[derive(Debug, Deserialize)]
pub struct QueueSendRequest {
    #[serde(rename = "type")]
    pub message_type: Option<String>,
    pub payload: Option<serde_json::Value>,
}

/// Body for `POST /cards/notification/send`.
#[derive(Debug, Deserialize)]
pub struct NotificationRequest {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub content: Option<String>,
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// GET /api/cards?page&size&query
///
/// Paginated browsing is cached per (page, size); a non-empty `query`
/// switches to the uncached search path.
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<CardListParams>,
) -> AppResult<Json<Envelope<PaginatedResponse<CardDto>>>> {
    let (page, size) = params.page_and_size();

    let paginated = match params.search_term() {
        Some(term) => state.catalog.search_page(term, page, size).await?,
        None => state.catalog.list_page(page, size).await?,
    };

    Ok(Json(Envelope::ok("Cards fetched", paginated)))
}

/// GET /api/cards/by-name?name=...
///
/// Query-parameter variant that survives names containing `/` (e.g. `D/D`).
pub async fn get_by_name(
    State(state): State<AppState>,
    Query(params): Query<ByNameParams>,
) -> AppResult<Json<Envelope<CardDto>>> {
    fetch_card(&state, &params.name).await
}

/// GET /api/cards/{name}
///
/// Legacy path-variable variant, kept for backward compatibility. Known to
/// be unreliable for names containing `/`; prefer `/cards/by-name`.
pub async fn get_legacy(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> AppResult<Json<Envelope<CardDto>>> {
    fetch_card(&state, &name).await
}

async fn fetch_card(state: &AppState, name: &str) -> AppResult<Json<Envelope<CardDto>>> {
    let card = state
        .catalog
        .get_by_name(name)
        .await?
        .ok_or_else(|| CoreError::not_found("Card", name))?;
    Ok(Json(Envelope::ok("Card fetched", card)))
}

// ---------------------------------------------------------------------------
// Writes (admin)
// ---------------------------------------------------------------------------

/// POST /api/cards
pub async fn create(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Json(card): Json<CardDto>,
) -> AppResult<(StatusCode, Json<Envelope<CardDto>>)> {
    card.validate()?;
    let saved = state.catalog.save(card, CardMutation::Created).await?;
    Ok((
        StatusCode::CREATED,
        Json(Envelope::ok("Card created", saved)),
    ))
}

/// PUT /api/cards/{name}
pub async fn update(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(mut card): Json<CardDto>,
) -> AppResult<Json<Envelope<CardDto>>> {
    card.name = name;
    card.validate()?;
    let saved = state.catalog.save(card, CardMutation::Updated).await?;
    Ok(Json(Envelope::ok("Card updated", saved)))
}

/// PATCH /api/cards/{name}
pub async fn patch(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(patch): Json<PatchCardRequest>,
) -> AppResult<Json<Envelope<CardDto>>> {
    let mut existing = state
        .catalog
        .get_by_name(&name)
        .await?
        .ok_or_else(|| CoreError::not_found("Card", name.as_str()))?;

    if let Some(card_type) = patch.human_readable_card_type {
        existing.human_readable_card_type = Some(card_type);
    }
    if let Some(description) = patch.description {
        existing.description = Some(description);
    }
    if let Some(race) = patch.race {
        existing.race = Some(race);
    }
    if let Some(attribute) = patch.attribute {
        existing.attribute = Some(attribute);
    }

    existing.validate()?;
    let saved = state.catalog.save(existing, CardMutation::Updated).await?;
    Ok(Json(Envelope::ok("Card patched", saved)))
}

/// DELETE /api/cards/{name}
///
/// 404 when the card does not exist, 409 while any deck references it.
pub async fn delete(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> AppResult<Json<Envelope<serde_json::Value>>> {
    state.catalog.delete(&name).await?;
    Ok(Json(Envelope::ok_message("Card deleted")))
}

// ---------------------------------------------------------------------------
// Cache management (admin)
// ---------------------------------------------------------------------------

/// POST /api/cards/cache/clear
pub async fn cache_clear(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> Json<Envelope<serde_json::Value>> {
    state.catalog.clear_cache().await;
    Json(Envelope::ok_message("All caches cleared successfully"))
}

/// GET /api/cards/cache/stats
pub async fn cache_stats(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> AppResult<Json<Envelope<serde_json::Value>>> {
    let total = state.catalog.count().await?;
    let cache_hit = state.catalog.is_count_cached().await;
    Ok(Json(Envelope::ok(
        "Cache stats fetched",
        json!({ "totalCards": total, "cacheHit": cache_hit }),
    )))
}

// ---------------------------------------------------------------------------
// Batch jobs and reload (admin)
// ---------------------------------------------------------------------------

/// POST /api/cards/batch/warmup-cache
///
/// Pre-loads the hot cache set. Call after startup, a cache clear, or a
/// bulk reload.
pub async fn warmup_cache(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> Json<Envelope<serde_json::Value>> {
    state.batch.spawn_warmup();
    Json(Envelope::ok_message("Cache warmup started in background"))
}

/// POST /api/cards/batch/statistics
pub async fn generate_statistics(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> Json<Envelope<serde_json::Value>> {
    state.batch.spawn_statistics();
    Json(Envelope::ok_message(
        "Card statistics generation started in background",
    ))
}

/// POST /api/cards/run-batch-job
pub async fn run_batch_job(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> Json<Envelope<serde_json::Value>> {
    state.batch.spawn_log_job();
    Json(Envelope::ok_message("Simple batch job started"))
}

/// POST /api/cards/async-reload
///
/// Kick off a catalog reload from the upstream API and return 202.
pub async fn async_reload(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> (StatusCode, Json<Envelope<serde_json::Value>>) {
    let importer = CardImporter::new(state.pool.clone(), &state.config.card_source_url);
    tokio::spawn(async move {
        match importer.import("Async").await {
            Ok(total) => tracing::info!(total, "Async catalog reload completed"),
            Err(e) => tracing::error!(error = %e, "Async catalog reload failed"),
        }
    });
    (
        StatusCode::ACCEPTED,
        Json(Envelope::ok_message("Card reload started in background")),
    )
}

// ---------------------------------------------------------------------------
// Events, queues, notifications (admin)
// ---------------------------------------------------------------------------

/// POST /api/cards/publish-event
///
/// Demonstration hook: card events are queue messages, so publishing is
/// just an enqueue.
pub async fn publish_event(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> Json<Envelope<serde_json::Value>> {
    state
        .catalog
        .enqueue_notification("SYSTEM", "Hello from card event!")
        .await;
    Json(Envelope::ok_message("Event published"))
}

/// POST /api/cards/queue/{queue}/send
pub async fn queue_send(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(queue): Path<String>,
    Json(input): Json<QueueSendRequest>,
) -> Json<Envelope<serde_json::Value>> {
    let message = QueueMessage::new(
        input.message_type.as_deref().unwrap_or("CUSTOM"),
        input.payload.unwrap_or(serde_json::Value::Null),
    );
    state.queue.enqueue(&queue, &message).await;
    Json(Envelope::ok_message(format!("Message sent to queue {queue}")))
}

/// GET /api/cards/queue/{queue}/peek
pub async fn queue_peek(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(queue): Path<String>,
) -> Json<Envelope<serde_json::Value>> {
    let messages = state.queue.peek(&queue).await;
    Json(Envelope::ok(
        "Queue peeked",
        json!({
            "queueName": queue,
            "count": messages.len(),
            "messages": messages,
        }),
    ))
}

/// GET /api/cards/queue/{queue}/size
pub async fn queue_size(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(queue): Path<String>,
) -> Json<Envelope<serde_json::Value>> {
    let size = state.queue.len(&queue).await;
    Json(Envelope::ok(
        "Queue size fetched",
        json!({ "queueName": queue, "size": size }),
    ))
}

/// POST /api/cards/queue/{queue}/clear
pub async fn queue_clear(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(queue): Path<String>,
) -> Json<Envelope<serde_json::Value>> {
    state.queue.clear(&queue).await;
    Json(Envelope::ok_message(format!(
        "Queue {queue} cleared successfully"
    )))
}

/// POST /api/cards/notification/send
pub async fn send_notification(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<NotificationRequest>,
) -> Json<Envelope<serde_json::Value>> {
    let kind = input.kind.as_deref().unwrap_or("SYSTEM");
    let content = input.content.as_deref().unwrap_or("Test notification");
    state.catalog.enqueue_notification(kind, content).await;
    Json(Envelope::ok_message("Notification queued successfully"))
}
