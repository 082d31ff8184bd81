//! HTTP-level integration tests for the catalog: CRUD, search, cache
//! consistency, archetype lifecycle, and the admin queue endpoints.

mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use common::{
    body_json, delete_auth, get, get_auth, login_for_token, patch_json_auth, post_json_auth,
};
use deckforge_core::roles::{ROLE_ADMIN, ROLE_USER};
use deckforge_coord::MemoryStore;
use serde_json::json;
use sqlx::PgPool;

async fn admin_token(pool: &PgPool, app: axum::Router) -> String {
    let (_admin, password) = common::create_test_user(pool, "admin1", ROLE_ADMIN).await;
    login_for_token(app, "admin1", &password).await
}

// ---------------------------------------------------------------------------
// CRUD
// ---------------------------------------------------------------------------

/// Create, fetch, delete, fetch-again lifecycle as an admin.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_card_crud_lifecycle(pool: PgPool) {
    let app = common::build_test_app(pool.clone()).await;
    let token = admin_token(&pool, app.clone()).await;

    let response = post_json_auth(
        app.clone(),
        "/api/cards",
        json!({
            "name": "Dark Magician",
            "humanReadableCardType": "Effect Monster",
            "race": "Spellcaster",
            "attribute": "DARK",
        }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["name"], "Dark Magician");

    let response = get(app.clone(), "/api/cards/by-name?name=Dark%20Magician").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["humanReadableCardType"], "Effect Monster");
    assert_eq!(body["data"]["race"], "Spellcaster");
    assert_eq!(body["data"]["attribute"], "DARK");

    let response = delete_auth(app.clone(), "/api/cards/Dark%20Magician", &token).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = get(app, "/api/cards/by-name?name=Dark%20Magician").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Card not found");
}

/// Catalog mutations require the ADMIN role; USER gets 403, anonymous 401.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_card_create_requires_admin(pool: PgPool) {
    let (_user, password) = common::create_test_user(&pool, "user1", ROLE_USER).await;
    let app = common::build_test_app(pool).await;

    let card = json!({ "name": "Kuriboh" });

    let response = common::post_json(app.clone(), "/api/cards", card.clone()).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let token = login_for_token(app.clone(), "user1", &password).await;
    let response = post_json_auth(app.clone(), "/api/cards", card, &token).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // State unchanged: the card was never created.
    let response = get(app, "/api/cards/by-name?name=Kuriboh").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

/// Validation failures report the first offending field.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_card_validation(pool: PgPool) {
    let app = common::build_test_app(pool.clone()).await;
    let token = admin_token(&pool, app.clone()).await;

    let response = post_json_auth(app.clone(), "/api/cards", json!({ "name": "" }), &token).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Card name is required");

    let response = post_json_auth(
        app,
        "/api/cards",
        json!({ "name": "x".repeat(256) }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

/// PATCH merges only the provided fields.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_card_patch(pool: PgPool) {
    common::seed_card(&pool, "Dark Magician").await;
    let app = common::build_test_app(pool.clone()).await;
    let token = admin_token(&pool, app.clone()).await;

    let response = patch_json_auth(
        app.clone(),
        "/api/cards/Dark%20Magician",
        json!({ "description": "The ultimate wizard." }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["description"], "The ultimate wizard.");
    // Untouched fields survive.
    assert_eq!(body["data"]["race"], "Spellcaster");

    let response = patch_json_auth(app, "/api/cards/Nobody", json!({}), &token).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

/// The legacy path-variable endpoint works for plain names.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_legacy_get_by_path(pool: PgPool) {
    common::seed_card(&pool, "Kuriboh").await;
    let app = common::build_test_app(pool).await;

    let response = get(app, "/api/cards/Kuriboh").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["name"], "Kuriboh");
}

// ---------------------------------------------------------------------------
// Listing and search
// ---------------------------------------------------------------------------

/// Pagination metadata and the size clamp.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_card_listing_pagination(pool: PgPool) {
    for i in 0..25 {
        common::seed_card(&pool, &format!("Card{i:02}")).await;
    }
    let app = common::build_test_app(pool).await;

    let response = get(app.clone(), "/api/cards?page=0&size=10").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let data = &body["data"];
    assert_eq!(data["items"].as_array().unwrap().len(), 10);
    assert_eq!(data["currentPage"], 0);
    assert_eq!(data["pageSize"], 10);
    assert_eq!(data["totalItems"], 25);
    assert_eq!(data["totalPages"], 3);
    assert_eq!(data["hasNext"], true);
    assert_eq!(data["hasPrevious"], false);

    // Oversized requests are clamped to 200, not rejected.
    let response = get(app, "/api/cards?size=5000").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["pageSize"], 200);
}

/// Search matches card names and archetype names, case-insensitively.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_card_search(pool: PgPool) {
    let app = common::build_test_app(pool.clone()).await;
    let token = admin_token(&pool, app.clone()).await;

    post_json_auth(
        app.clone(),
        "/api/cards",
        json!({ "name": "Blue-Eyes White Dragon", "archetype": { "name": "Blue-Eyes" } }),
        &token,
    )
    .await;
    common::seed_card(&pool, "Dark Magician").await;

    let response = get(app.clone(), "/api/cards?query=magician").await;
    let body = body_json(response).await;
    assert_eq!(body["data"]["totalItems"], 1);
    assert_eq!(body["data"]["items"][0]["name"], "Dark Magician");

    // Archetype-name match finds the card too.
    let response = get(app, "/api/cards?query=blue-eyes").await;
    let body = body_json(response).await;
    assert_eq!(body["data"]["totalItems"], 1);
    assert_eq!(body["data"]["items"][0]["name"], "Blue-Eyes White Dragon");
}

// ---------------------------------------------------------------------------
// Cache consistency
// ---------------------------------------------------------------------------

/// A successful save invalidates cached pages and count: readers issued
/// after the mutating request returns observe the new state.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_cache_evicted_on_write(pool: PgPool) {
    common::seed_card(&pool, "Kuriboh").await;
    let store = Arc::new(MemoryStore::new());
    let (state, app) = common::build_test_app_with_state(pool.clone(), store).await;
    let token = admin_token(&pool, app.clone()).await;

    // Populate the page and count cache entries.
    let response = get(app.clone(), "/api/cards?page=0&size=20").await;
    assert_eq!(body_json(response).await["data"]["totalItems"], 1);
    assert!(state.cache.probe("page:0:size:20").await);

    // A write empties the whole namespace before returning.
    let response = post_json_auth(
        app.clone(),
        "/api/cards",
        json!({ "name": "Dark Magician" }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert!(!state.cache.probe("page:0:size:20").await);
    assert!(!state.cache.probe("count").await);

    // The next read sees the fresh state.
    let response = get(app, "/api/cards?page=0&size=20").await;
    assert_eq!(body_json(response).await["data"]["totalItems"], 2);
}

/// Warm-up leaves the count and the first five pages resident; running it
/// again is a no-op.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_warmup_populates_hot_set(pool: PgPool) {
    for i in 0..30 {
        common::seed_card(&pool, &format!("Card{i:02}")).await;
    }
    let store = Arc::new(MemoryStore::new());
    let (state, _app) = common::build_test_app_with_state(pool, store).await;

    state.catalog.warmup().await;

    assert!(state.cache.probe("count").await);
    for page in 0..5 {
        assert!(state.cache.probe(&format!("page:{page}:size:20")).await);
    }

    // Idempotent: a second run changes nothing and does not error.
    state.catalog.warmup().await;
    assert!(state.cache.probe("count").await);
}

/// Cache stats report the (now cached) count.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_cache_stats_and_clear(pool: PgPool) {
    common::seed_card(&pool, "Kuriboh").await;
    let store = Arc::new(MemoryStore::new());
    let (state, app) = common::build_test_app_with_state(pool.clone(), store).await;
    let token = admin_token(&pool, app.clone()).await;

    let response = get_auth(app.clone(), "/api/cards/cache/stats", &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["totalCards"], 1);
    assert_eq!(body["data"]["cacheHit"], true);

    let response = post_json_auth(app, "/api/cards/cache/clear", json!({}), &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(!state.cache.probe("count").await);
}

// ---------------------------------------------------------------------------
// Deck references and archetype lifecycle
// ---------------------------------------------------------------------------

/// Deleting a card still referenced by a deck is a 409 and changes nothing.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_delete_refused_while_deck_references(pool: PgPool) {
    common::seed_card(&pool, "Kuriboh").await;
    let (_user, password) = common::create_test_user(&pool, "user1", ROLE_USER).await;
    let app = common::build_test_app(pool.clone()).await;
    let admin = admin_token(&pool, app.clone()).await;
    let user = login_for_token(app.clone(), "user1", &password).await;

    let response = post_json_auth(
        app.clone(),
        "/api/decks",
        json!({ "name": "My Deck" }),
        &user,
    )
    .await;
    let deck_id = body_json(response).await["data"]["id"].as_i64().unwrap();

    let response = post_json_auth(
        app.clone(),
        &format!("/api/decks/{deck_id}/cards/Kuriboh"),
        json!({}),
        &user,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = delete_auth(app.clone(), "/api/cards/Kuriboh", &admin).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = body_json(response).await;
    assert!(body["message"].as_str().unwrap().contains("used in one or more decks"));

    let response = get(app, "/api/cards/by-name?name=Kuriboh").await;
    assert_eq!(response.status(), StatusCode::OK);
}

/// Archetypes appear lazily with the first referencing card and are
/// collected when the last referencing card is deleted.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_archetype_lifecycle(pool: PgPool) {
    let app = common::build_test_app(pool.clone()).await;
    let token = admin_token(&pool, app.clone()).await;

    for name in ["Blue-Eyes White Dragon", "Blue-Eyes Ultimate Dragon"] {
        let response = post_json_auth(
            app.clone(),
            "/api/cards",
            json!({ "name": name, "archetype": { "name": "Blue-Eyes" } }),
            &token,
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    // Two cards, one archetype row.
    let response = get(app.clone(), "/api/archetypes").await;
    let body = body_json(response).await;
    let archetypes = body["data"].as_array().unwrap();
    assert_eq!(archetypes.len(), 1);
    assert_eq!(archetypes[0]["name"], "Blue-Eyes");
    let archetype_id = archetypes[0]["id"].as_i64().unwrap();

    let response = get(app.clone(), &format!("/api/archetypes/{archetype_id}")).await;
    assert_eq!(response.status(), StatusCode::OK);

    // Deleting one card leaves the archetype alive.
    delete_auth(
        app.clone(),
        "/api/cards/Blue-Eyes%20Ultimate%20Dragon",
        &token,
    )
    .await;
    let response = get(app.clone(), "/api/archetypes").await;
    assert_eq!(body_json(response).await["data"].as_array().unwrap().len(), 1);

    // Deleting the last referencing card collects the orphan.
    delete_auth(app.clone(), "/api/cards/Blue-Eyes%20White%20Dragon", &token).await;
    let response = get(app, "/api/archetypes").await;
    assert_eq!(body_json(response).await["data"].as_array().unwrap().len(), 0);
}

// ---------------------------------------------------------------------------
// Queues and background hooks
// ---------------------------------------------------------------------------

/// Card writes enqueue a post-mutation hook and a notification.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_save_enqueues_side_effects(pool: PgPool) {
    let store = Arc::new(MemoryStore::new());
    let (state, app) = common::build_test_app_with_state(pool.clone(), store).await;
    let token = admin_token(&pool, app.clone()).await;

    post_json_auth(
        app,
        "/api/cards",
        json!({ "name": "Dark Magician" }),
        &token,
    )
    .await;

    assert_eq!(state.queue.len("card-operations").await, 1);
    let message = state.queue.dequeue("card-operations").await.unwrap();
    assert_eq!(message.message_type, "CARD_CREATED");
    assert_eq!(message.payload["cardName"], "Dark Magician");

    assert_eq!(state.queue.len("notifications").await, 1);
}

/// Admin queue endpoints: send, peek, size, clear; messages are observed
/// in enqueue order.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_queue_admin_endpoints(pool: PgPool) {
    let app = common::build_test_app(pool.clone()).await;
    let token = admin_token(&pool, app.clone()).await;

    for i in 0..2 {
        let response = post_json_auth(
            app.clone(),
            "/api/cards/queue/test-queue/send",
            json!({ "type": "SYSTEM", "payload": { "n": i } }),
            &token,
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = get_auth(app.clone(), "/api/cards/queue/test-queue/size", &token).await;
    assert_eq!(body_json(response).await["data"]["size"], 2);

    let response = get_auth(app.clone(), "/api/cards/queue/test-queue/peek", &token).await;
    let body = body_json(response).await;
    assert_eq!(body["data"]["count"], 2);

    let response = post_json_auth(
        app.clone(),
        "/api/cards/queue/test-queue/clear",
        json!({}),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = get_auth(app, "/api/cards/queue/test-queue/size", &token).await;
    assert_eq!(body_json(response).await["data"]["size"], 0);
}

/// Queue management is admin-only.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_queue_endpoints_admin_only(pool: PgPool) {
    let (_user, password) = common::create_test_user(&pool, "user1", ROLE_USER).await;
    let app = common::build_test_app(pool).await;
    let token = login_for_token(app.clone(), "user1", &password).await;

    let response = get_auth(app, "/api/cards/queue/test-queue/size", &token).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

/// Notification send defaults to a SYSTEM test message.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_notification_send(pool: PgPool) {
    let store = Arc::new(MemoryStore::new());
    let (state, app) = common::build_test_app_with_state(pool.clone(), store).await;
    let token = admin_token(&pool, app.clone()).await;

    let response = post_json_auth(
        app,
        "/api/cards/notification/send",
        json!({ "type": "EMAIL", "content": "hello" }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let message = state.queue.dequeue("notifications").await.unwrap();
    assert_eq!(message.message_type, "EMAIL");
    assert_eq!(message.payload["content"], "hello");
}

// ---------------------------------------------------------------------------
// Readiness probe
// ---------------------------------------------------------------------------

/// DOWN with an empty catalog, UP once the minimum card count is present.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_health_reflects_card_count(pool: PgPool) {
    let app = common::build_test_app(pool.clone()).await;

    let response = get(app.clone(), "/actuator/health").await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = body_json(response).await;
    assert_eq!(body["status"], "DOWN");

    common::seed_card(&pool, "Kuriboh").await;
    let response = get(app, "/actuator/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "UP");
    assert_eq!(body["details"]["cardsLoaded"], 1);
}
