//! HTTP surface of the deckforge service.
//!
//! Handlers stay thin: they parse input, check authorization, and delegate
//! to the services constructed at startup in [`state::AppState`]. The
//! concurrency-sensitive pieces (cache, locks, rate limiting, queues) live
//! in `deckforge_coord`; persistence lives in `deckforge_db`.

pub mod auth;
pub mod background;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod query;
pub mod response;
pub mod router;
pub mod routes;
pub mod services;
pub mod state;
