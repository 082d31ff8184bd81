pub mod archetypes;
pub mod auth;
pub mod cards;
pub mod decks;
pub mod health;
pub mod users;

use axum::Router;

use crate::state::AppState;

/// Build the `/api` route tree.
///
/// ```text
/// /auth/login                        login (public)
/// /auth/refresh                      refresh (public)
/// /auth/logout                       logout (public, idempotent)
/// /auth/user                         current principal or guest payload
///
/// /cards                             list / search (GET), create (ADMIN)
/// /cards/by-name?name=               single card (GET)
/// /cards/{name}                      legacy single card (GET),
///                                    update / patch / delete (ADMIN)
/// /cards/cache/clear                 evict namespace (POST, ADMIN)
/// /cards/cache/stats                 cache stats (GET, ADMIN)
/// /cards/batch/warmup-cache          warm-up (POST, ADMIN)
/// /cards/batch/statistics            statistics job (POST, ADMIN)
/// /cards/run-batch-job               demo job (POST, ADMIN)
/// /cards/async-reload                catalog reload (POST, ADMIN, 202)
/// /cards/publish-event               demo event (POST, ADMIN)
/// /cards/queue/{q}/send              enqueue (POST, ADMIN)
/// /cards/queue/{q}/peek              snapshot (GET, ADMIN)
/// /cards/queue/{q}/size              length (GET, ADMIN)
/// /cards/queue/{q}/clear             drop all (POST, ADMIN)
/// /cards/notification/send           queue notification (POST, ADMIN)
///
/// /archetypes                        list (GET)
/// /archetypes/{id}                   single (GET)
///
/// /decks                             list (GET), create (USER/ADMIN)
/// /decks/{id}                        get (GET), update / delete (owner or ADMIN)
/// /decks/{id}/cards/{cardName}       add (POST) / remove (DELETE) one copy
///
/// /users                             list principals (GET, ADMIN)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/cards", cards::router())
        .nest("/archetypes", archetypes::router())
        .nest("/decks", decks::router())
        .nest("/users", users::router())
}
