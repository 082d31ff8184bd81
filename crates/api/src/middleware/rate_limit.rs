//! Rate-limiting middleware.
//!
//! Picks the most specific policy for the request, derives the bucket
//! identity from the authenticated principal (falling back to the client
//! IP), and consumes one token. An empty bucket answers 429 with the
//! standard failure envelope; the request never reaches its handler.
//!
//! Per-(identity, endpoint-class) limits:
//!
//! | Endpoint                                   | Capacity | Window |
//! |--------------------------------------------|----------|--------|
//! | `POST /api/auth/login`                     | 5        | 1 min  |
//! | `GET /api/cards?query=...` (non-empty)     | 20       | 1 min  |
//! | `POST/PUT/PATCH/DELETE /api/cards/**`      | 30       | 1 min  |
//! | `/actuator/**`                             | bypass   | --     |
//! | everything else                            | 100      | 1 min  |

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Request, State};
use axum::http::{Method, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use deckforge_coord::RatePolicy;

use crate::auth::jwt::validate_token;
use crate::response::Envelope;
use crate::state::AppState;

/// Policy for a request, or `None` to bypass rate limiting entirely.
fn policy_for(method: &Method, path: &str, has_query_term: bool) -> Option<RatePolicy> {
    if path.starts_with("/actuator/") {
        return None;
    }
    if path.starts_with("/api/auth/login") && method == Method::POST {
        // Strict limit against credential brute force.
        return Some(RatePolicy::per_minute(5));
    }
    if path.starts_with("/api/cards") && method == Method::GET && has_query_term {
        // Search queries bypass the cache and hit the database.
        return Some(RatePolicy::per_minute(20));
    }
    if path.starts_with("/api/cards")
        && (method == Method::POST
            || method == Method::PUT
            || method == Method::PATCH
            || method == Method::DELETE)
    {
        return Some(RatePolicy::per_minute(30));
    }
    Some(RatePolicy::per_minute(100))
}

/// Collapse id-carrying paths so one endpoint class shares one bucket
/// (`/api/cards/Dark Magician` -> `/api/cards/*`).
fn normalize_path(path: &str) -> String {
    for resource in ["cards", "decks", "archetypes"] {
        let prefix = format!("/api/{resource}/");
        if let Some(rest) = path.strip_prefix(&prefix) {
            if !rest.is_empty() && !rest.contains('/') {
                return format!("/api/{resource}/*");
            }
        }
    }
    path.to_string()
}

/// Bucket identity: authenticated username when available, else the first
/// hop of `X-Forwarded-For`, else the peer address.
fn client_identity(state: &AppState, request: &Request) -> String {
    let bearer = request
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));
    if let Some(token) = bearer {
        if let Ok(claims) = validate_token(&state.jwt, token) {
            return claims.sub;
        }
    }

    if let Some(forwarded) = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
    {
        if let Some(first_hop) = forwarded.split(',').next() {
            let first_hop = first_hop.trim();
            if !first_hop.is_empty() {
                return first_hop.to_string();
            }
        }
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

pub async fn rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let has_query_term = request
        .uri()
        .query()
        .map(|q| {
            q.split('&')
                .any(|pair| matches!(pair.split_once('='), Some(("query", v)) if !v.is_empty()))
        })
        .unwrap_or(false);

    let Some(policy) = policy_for(&method, &path, has_query_term) else {
        return next.run(request).await;
    };

    let identity = format!("{}:{}", client_identity(&state, &request), normalize_path(&path));

    if state.limiter.try_consume(&identity, policy).await {
        next.run(request).await
    } else {
        tracing::warn!(%identity, %path, "Rate limit exceeded");
        (
            StatusCode::TOO_MANY_REQUESTS,
            axum::Json(Envelope::<serde_json::Value>::failed(
                "Rate limit exceeded. Please try again later.",
            )),
        )
            .into_response()
    }
}
