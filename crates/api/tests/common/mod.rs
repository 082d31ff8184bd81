// All functions in this module are shared test helpers. Not every test binary
// uses every helper, so we suppress dead_code warnings at the module level.
#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use deckforge_api::auth::jwt::{JwtConfig, JwtKeys};
use deckforge_api::auth::password::hash_password_with_cost;
use deckforge_api::config::ServerConfig;
use deckforge_api::router::build_app_router;
use deckforge_api::state::AppState;
use deckforge_coord::MemoryStore;
use deckforge_db::models::card::UpsertCard;
use deckforge_db::models::user::{CreateUser, User};
use deckforge_db::repositories::{CardRepo, UserRepo};

/// RSA-2048 key pair for tests only. Never deploy these.
const TEST_PRIVATE_PEM: &str = include_str!("../keys/jwt_private.pem");
const TEST_PUBLIC_PEM: &str = include_str!("../keys/jwt_public.pem");

/// Low bcrypt cost keeps the auth-heavy tests fast.
const TEST_BCRYPT_COST: u32 = 4;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        redis_url: "redis://127.0.0.1:6379".to_string(),
        cache_ttl_secs: 3600,
        min_healthy_card_count: 1,
        card_source_url: "http://127.0.0.1:0/unused".to_string(),
        jwt: JwtConfig {
            private_key_path: "tests/keys/jwt_private.pem".to_string(),
            public_key_path: "tests/keys/jwt_public.pem".to_string(),
            access_ttl_ms: 900_000,
            refresh_ttl_ms: 604_800_000,
        },
    }
}

fn test_jwt_keys() -> JwtKeys {
    JwtKeys::from_pems(
        TEST_PRIVATE_PEM.as_bytes(),
        TEST_PUBLIC_PEM.as_bytes(),
        900_000,
        604_800_000,
    )
}

/// Build the full application state over an in-memory coordination store.
///
/// Returned separately from the router so tests can reach the cache and
/// queue primitives directly.
pub fn build_test_state(pool: PgPool, store: Arc<MemoryStore>) -> AppState {
    let config = Arc::new(test_config());
    AppState::build(pool, config, Arc::new(test_jwt_keys()), store)
}

/// Build the full application router with all middleware layers, backed by
/// an in-memory coordination store.
pub async fn build_test_app(pool: PgPool) -> Router {
    let state = build_test_state(pool, Arc::new(MemoryStore::new()));
    let config = test_config();
    build_app_router(state, &config)
}

/// Build both the state and the router over a caller-provided store, so
/// the test can inspect queues and cache entries the app writes.
pub async fn build_test_app_with_state(
    pool: PgPool,
    store: Arc<MemoryStore>,
) -> (AppState, Router) {
    let state = build_test_state(pool, store);
    let config = test_config();
    (state.clone(), build_app_router(state, &config))
}

// ---------------------------------------------------------------------------
// Shared HTTP test helpers
// ---------------------------------------------------------------------------

/// Collect the response body into a `serde_json::Value`.
pub async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Send a JSON request with the given HTTP method.
pub async fn send_json(
    app: Router,
    method: Method,
    uri: &str,
    body: serde_json::Value,
) -> axum::response::Response {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// POST JSON to the given URI and return the response.
pub async fn post_json(
    app: Router,
    uri: &str,
    body: serde_json::Value,
) -> axum::response::Response {
    send_json(app, Method::POST, uri, body).await
}

/// GET from the given URI.
pub async fn get(app: Router, uri: &str) -> axum::response::Response {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    app.oneshot(request).await.unwrap()
}

/// DELETE the given URI.
pub async fn delete(app: Router, uri: &str) -> axum::response::Response {
    let request = Request::builder()
        .method(Method::DELETE)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

// ---------------------------------------------------------------------------
// Authenticated HTTP test helpers
// ---------------------------------------------------------------------------

/// Send a JSON request with the given HTTP method and a Bearer token.
pub async fn send_json_auth(
    app: Router,
    method: Method,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> axum::response::Response {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {token}"))
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// POST JSON with a Bearer token.
pub async fn post_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> axum::response::Response {
    send_json_auth(app, Method::POST, uri, body, token).await
}

/// PUT JSON with a Bearer token.
pub async fn put_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> axum::response::Response {
    send_json_auth(app, Method::PUT, uri, body, token).await
}

/// PATCH JSON with a Bearer token.
pub async fn patch_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> axum::response::Response {
    send_json_auth(app, Method::PATCH, uri, body, token).await
}

/// GET from the given URI with a Bearer token.
pub async fn get_auth(app: Router, uri: &str, token: &str) -> axum::response::Response {
    let request = Request::builder()
        .uri(uri)
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// DELETE the given URI with a Bearer token.
pub async fn delete_auth(app: Router, uri: &str, token: &str) -> axum::response::Response {
    let request = Request::builder()
        .method(Method::DELETE)
        .uri(uri)
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

// ---------------------------------------------------------------------------
// Shared data helpers
// ---------------------------------------------------------------------------

/// Create a test user directly in the database and return the user row plus
/// the plaintext password used.
pub async fn create_test_user(pool: &PgPool, username: &str, role: &str) -> (User, String) {
    let password = "test_password_123!";
    let hashed =
        hash_password_with_cost(password, TEST_BCRYPT_COST).expect("hashing should succeed");
    let input = CreateUser {
        username: username.to_string(),
        password_hash: hashed,
        role: role.to_string(),
    };
    let user = UserRepo::create(pool, &input)
        .await
        .expect("user creation should succeed");
    (user, password.to_string())
}

/// Insert a catalog card directly, bypassing the API and its rate limits.
pub async fn seed_card(pool: &PgPool, name: &str) {
    let input = UpsertCard {
        name: name.to_string(),
        card_type: Some("Effect Monster".to_string()),
        description: Some(format!("{name} description")),
        race: Some("Spellcaster".to_string()),
        attribute: Some("DARK".to_string()),
        archetype_id: None,
    };
    CardRepo::upsert(pool, &input)
        .await
        .expect("card seed should succeed");
}

/// Log in a user via the API and return the envelope's `data` payload.
pub async fn login_user(app: Router, username: &str, password: &str) -> serde_json::Value {
    let body = serde_json::json!({ "username": username, "password": password });
    let response = post_json(app, "/api/auth/login", body).await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await["data"].clone()
}

/// Convenience: log in and return just the access token string.
pub async fn login_for_token(app: Router, username: &str, password: &str) -> String {
    let data = login_user(app, username, password).await;
    data["accessToken"]
        .as_str()
        .expect("accessToken should be a string")
        .to_string()
}
