//! Route definitions for the `/decks` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::decks;
use crate::state::AppState;

/// Routes mounted at `/decks`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(decks::list).post(decks::create))
        .route(
            "/{id}",
            get(decks::get).put(decks::update).delete(decks::delete),
        )
        .route(
            "/{id}/cards/{card_name}",
            axum::routing::post(decks::add_card).delete(decks::remove_card),
        )
}
