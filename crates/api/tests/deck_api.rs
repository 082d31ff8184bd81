//! HTTP-level integration tests for decks: ownership, the two domain
//! invariants, membership operations, and name sanitization.

mod common;

use axum::http::StatusCode;
use common::{body_json, delete_auth, get, login_for_token, post_json_auth, put_json_auth};
use deckforge_core::roles::{ROLE_ADMIN, ROLE_USER};
use serde_json::json;
use sqlx::PgPool;

async fn user_token(pool: &PgPool, app: axum::Router, username: &str) -> String {
    let (_user, password) = common::create_test_user(pool, username, ROLE_USER).await;
    login_for_token(app, username, &password).await
}

async fn create_deck(app: axum::Router, token: &str, name: &str) -> i64 {
    let response = post_json_auth(app, "/api/decks", json!({ "name": name }), token).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"]["id"].as_i64().unwrap()
}

// ---------------------------------------------------------------------------
// CRUD and ownership
// ---------------------------------------------------------------------------

/// Deck creation requires authentication and stamps the owner.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_create_deck(pool: PgPool) {
    let app = common::build_test_app(pool.clone()).await;

    let response = common::post_json(app.clone(), "/api/decks", json!({ "name": "X" })).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let token = user_token(&pool, app.clone(), "user1").await;
    let response = post_json_auth(
        app.clone(),
        "/api/decks",
        json!({ "name": "My First Deck" }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["data"]["name"], "My First Deck");
    assert_eq!(body["data"]["username"], "user1");
    assert_eq!(body["data"]["cards"], json!([]));
}

/// Deck names are sanitized on persist.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_deck_name_sanitized(pool: PgPool) {
    let app = common::build_test_app(pool.clone()).await;
    let token = user_token(&pool, app.clone(), "user1").await;

    let response = post_json_auth(
        app,
        "/api/decks",
        json!({ "name": "<script>alert(1)</script>Safe Deck" }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["data"]["name"], "Safe Deck");
}

/// A missing or blank deck name is rejected.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_deck_name_required(pool: PgPool) {
    let app = common::build_test_app(pool.clone()).await;
    let token = user_token(&pool, app.clone(), "user1").await;

    let response = post_json_auth(app, "/api/decks", json!({}), &token).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Deck name is required");
}

/// Everyone can list and read decks; only the owner or an admin mutates.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_deck_reads_are_public(pool: PgPool) {
    let app = common::build_test_app(pool.clone()).await;
    let token = user_token(&pool, app.clone(), "user1").await;
    let deck_id = create_deck(app.clone(), &token, "Visible Deck").await;

    let response = get(app.clone(), "/api/decks").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"].as_array().unwrap().len(), 1);

    let response = get(app.clone(), &format!("/api/decks/{deck_id}")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = get(app, "/api/decks/999999").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

/// Rename and delete, owner-only paths.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_deck_update_and_delete(pool: PgPool) {
    let app = common::build_test_app(pool.clone()).await;
    let token = user_token(&pool, app.clone(), "user1").await;
    let deck_id = create_deck(app.clone(), &token, "Old Name").await;

    let response = put_json_auth(
        app.clone(),
        &format!("/api/decks/{deck_id}"),
        json!({ "name": "New Name" }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["name"], "New Name");
    // Owner survives the update.
    assert_eq!(body["data"]["username"], "user1");

    let response = delete_auth(app.clone(), &format!("/api/decks/{deck_id}"), &token).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = get(app, &format!("/api/decks/{deck_id}")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

/// Only the owner or an admin can mutate a deck; others get 403 and the
/// deck is left unchanged.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_deck_ownership_enforced(pool: PgPool) {
    common::seed_card(&pool, "Kuriboh").await;
    let app = common::build_test_app(pool.clone()).await;

    let owner = user_token(&pool, app.clone(), "user1").await;
    let other = user_token(&pool, app.clone(), "user2").await;
    let (_admin, admin_pw) = common::create_test_user(&pool, "admin1", ROLE_ADMIN).await;
    let admin = login_for_token(app.clone(), "admin1", &admin_pw).await;

    let deck_id = create_deck(app.clone(), &owner, "user1 deck").await;
    let add_uri = format!("/api/decks/{deck_id}/cards/Kuriboh");

    // A different user is refused.
    let response = post_json_auth(app.clone(), &add_uri, json!({}), &other).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let response = get(app.clone(), &format!("/api/decks/{deck_id}")).await;
    assert_eq!(body_json(response).await["data"]["cards"], json!([]));

    // An admin is allowed.
    let response = post_json_auth(app.clone(), &add_uri, json!({}), &admin).await;
    assert_eq!(response.status(), StatusCode::OK);

    // So is the owner.
    let response = post_json_auth(app, &add_uri, json!({}), &owner).await;
    assert_eq!(response.status(), StatusCode::OK);
}

// ---------------------------------------------------------------------------
// Membership operations
// ---------------------------------------------------------------------------

/// Adding to a missing deck or adding a missing card is a 404.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_add_card_not_found_cases(pool: PgPool) {
    common::seed_card(&pool, "Kuriboh").await;
    let app = common::build_test_app(pool.clone()).await;
    let token = user_token(&pool, app.clone(), "user1").await;
    let deck_id = create_deck(app.clone(), &token, "Deck").await;

    let response = post_json_auth(
        app.clone(),
        "/api/decks/999999/cards/Kuriboh",
        json!({}),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = post_json_auth(
        app,
        &format!("/api/decks/{deck_id}/cards/NoSuchCard"),
        json!({}),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

/// Add/remove round trip reports size and copy counts; removing an absent
/// card is a no-op.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_add_and_remove_card(pool: PgPool) {
    common::seed_card(&pool, "Kuriboh").await;
    common::seed_card(&pool, "Dark Magician").await;
    let app = common::build_test_app(pool.clone()).await;
    let token = user_token(&pool, app.clone(), "user1").await;
    let deck_id = create_deck(app.clone(), &token, "Deck").await;
    let uri = format!("/api/decks/{deck_id}/cards/Kuriboh");

    let response = post_json_auth(app.clone(), &uri, json!({}), &token).await;
    let body = body_json(response).await;
    assert_eq!(body["data"]["deckSize"], 1);
    assert_eq!(body["data"]["copies"], 1);

    let response = post_json_auth(app.clone(), &uri, json!({}), &token).await;
    let body = body_json(response).await;
    assert_eq!(body["data"]["deckSize"], 2);
    assert_eq!(body["data"]["copies"], 2);

    let response = delete_auth(app.clone(), &uri, &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["deckSize"], 1);
    assert_eq!(body["data"]["copies"], 1);

    // Removing a card the deck does not hold changes nothing.
    let response = delete_auth(
        app,
        &format!("/api/decks/{deck_id}/cards/Dark%20Magician"),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["deckSize"], 1);
    assert_eq!(body["data"]["copies"], 0);
}

/// No committed sequence of adds can put a fourth copy in a deck.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_copy_limit(pool: PgPool) {
    common::seed_card(&pool, "Blue-Eyes White Dragon").await;
    let app = common::build_test_app(pool.clone()).await;
    let token = user_token(&pool, app.clone(), "user1").await;
    let deck_id = create_deck(app.clone(), &token, "Dragons").await;
    let uri = format!("/api/decks/{deck_id}/cards/Blue-Eyes%20White%20Dragon");

    for expected_copies in 1..=3 {
        let response = post_json_auth(app.clone(), &uri, json!({}), &token).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["data"]["copies"], expected_copies);
    }

    let response = post_json_auth(app.clone(), &uri, json!({}), &token).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(
        body["message"].as_str().unwrap().contains("3 copies"),
        "message should name the copy limit: {}",
        body["message"]
    );

    // The failed add left the deck at three copies.
    let response = get(app, &format!("/api/decks/{deck_id}")).await;
    assert_eq!(body_json(response).await["data"]["cards"].as_array().unwrap().len(), 3);
}

/// No committed sequence of adds can grow a deck past 60 cards.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_deck_size_limit(pool: PgPool) {
    for i in 1..=60 {
        common::seed_card(&pool, &format!("Card{i}")).await;
    }
    let app = common::build_test_app(pool.clone()).await;
    let token = user_token(&pool, app.clone(), "user1").await;
    let deck_id = create_deck(app.clone(), &token, "Everything Deck").await;

    for i in 1..=60 {
        let response = post_json_auth(
            app.clone(),
            &format!("/api/decks/{deck_id}/cards/Card{i}"),
            json!({}),
            &token,
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK, "add {i} should succeed");
    }

    // Card60 has only one copy, so the copy rule would allow it; the size
    // rule must refuse first.
    let response = post_json_auth(
        app.clone(),
        &format!("/api/decks/{deck_id}/cards/Card60"),
        json!({}),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(
        body["message"].as_str().unwrap().contains("maximum"),
        "message should name the size limit: {}",
        body["message"]
    );

    let response = get(app, &format!("/api/decks/{deck_id}")).await;
    assert_eq!(
        body_json(response).await["data"]["cards"].as_array().unwrap().len(),
        60
    );
}
