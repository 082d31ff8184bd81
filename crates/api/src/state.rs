use std::sync::Arc;
use std::time::Duration;

use deckforge_coord::{CacheNamespace, CoordStore, DistributedLock, RateLimiter, WorkQueue};
use deckforge_db::DbPool;

use crate::auth::jwt::JwtKeys;
use crate::config::ServerConfig;
use crate::services::batch::BatchJobService;
use crate::services::catalog::{CatalogService, CARDS_CACHE_NAMESPACE};
use crate::services::deck::DeckService;
use crate::services::token::TokenService;

/// Shared application state available to all axum handlers via
/// `State<AppState>`. Cheaply cloneable: everything is behind `Arc`.
///
/// Services are composed here, at startup, with their collaborators --
/// there is no framework wiring to look through.
#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub config: Arc<ServerConfig>,
    pub jwt: Arc<JwtKeys>,
    /// The `cards` cache namespace (shared with the dispatcher).
    pub cache: Arc<CacheNamespace>,
    pub queue: Arc<WorkQueue>,
    pub limiter: Arc<RateLimiter>,
    pub catalog: Arc<CatalogService>,
    pub decks: Arc<DeckService>,
    pub tokens: Arc<TokenService>,
    pub batch: Arc<BatchJobService>,
}

impl AppState {
    /// Wire every service against the given pool and coordination store.
    pub fn build(
        pool: DbPool,
        config: Arc<ServerConfig>,
        jwt: Arc<JwtKeys>,
        store: Arc<dyn CoordStore>,
    ) -> Self {
        let cache = Arc::new(CacheNamespace::new(
            Arc::clone(&store),
            CARDS_CACHE_NAMESPACE,
            Duration::from_secs(config.cache_ttl_secs),
        ));
        let queue = Arc::new(WorkQueue::new(Arc::clone(&store)));
        let limiter = Arc::new(RateLimiter::new(Arc::clone(&store)));
        let lock = DistributedLock::new(store);

        let catalog = Arc::new(CatalogService::new(
            pool.clone(),
            Arc::clone(&cache),
            Arc::clone(&queue),
        ));
        let decks = Arc::new(DeckService::new(pool.clone(), lock));
        let tokens = Arc::new(TokenService::new(pool.clone(), Arc::clone(&jwt)));
        let batch = Arc::new(BatchJobService::new(pool.clone(), Arc::clone(&catalog)));

        Self {
            pool,
            config,
            jwt,
            cache,
            queue,
            limiter,
            catalog,
            decks,
            tokens,
            batch,
        }
    }
}
