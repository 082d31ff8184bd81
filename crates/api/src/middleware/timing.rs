//! Request timing middleware.
//!
//! Stamps `X-Response-Time: <ms>ms` on every `/api/*` response and logs the
//! duration alongside method and path.

use std::time::Instant;

use axum::extract::Request;
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;

pub async fn response_time(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let is_api = path.starts_with("/api/");

    let start = Instant::now();
    let mut response = next.run(request).await;
    let elapsed_ms = start.elapsed().as_millis() as u64;

    if is_api {
        tracing::info!(%method, %path, elapsed_ms, "API response time");
        if let Ok(value) = HeaderValue::from_str(&format!("{elapsed_ms}ms")) {
            response.headers_mut().insert("X-Response-Time", value);
        }
    }

    response
}
