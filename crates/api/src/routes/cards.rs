//! Route definitions for the `/cards` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::cards;
use crate::state::AppState;

/// Routes mounted at `/cards`. Static segments take precedence over the
/// legacy `/{name}` path variable.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(cards::list).post(cards::create))
        .route("/by-name", get(cards::get_by_name))
        // Cache management.
        .route("/cache/clear", post(cards::cache_clear))
        .route("/cache/stats", get(cards::cache_stats))
        // Batch jobs and data reload.
        .route("/batch/warmup-cache", post(cards::warmup_cache))
        .route("/batch/statistics", post(cards::generate_statistics))
        .route("/run-batch-job", post(cards::run_batch_job))
        .route("/async-reload", post(cards::async_reload))
        // Events, queues, notifications.
        .route("/publish-event", post(cards::publish_event))
        .route("/queue/{queue}/send", post(cards::queue_send))
        .route("/queue/{queue}/peek", get(cards::queue_peek))
        .route("/queue/{queue}/size", get(cards::queue_size))
        .route("/queue/{queue}/clear", post(cards::queue_clear))
        .route("/notification/send", post(cards::send_notification))
        // Legacy path-variable endpoint; unreliable for names with '/'.
        .route(
            "/{name}",
            get(cards::get_legacy)
                .put(cards::update)
                .patch(cards::patch)
                .delete(cards::delete),
        )
}
