//! Admin-triggered batch jobs: statistics, warm-up, ad-hoc work.
//!
//! Every job runs on a spawned task and reports through logs; the trigger
//! endpoints return immediately.

use std::sync::Arc;
use std::time::Instant;

use deckforge_db::DbPool;

use crate::services::catalog::CatalogService;

/// Runs one-off background jobs over the catalog.
pub struct BatchJobService {
    pool: DbPool,
    catalog: Arc<CatalogService>,
}

impl BatchJobService {
    pub fn new(pool: DbPool, catalog: Arc<CatalogService>) -> Self {
        Self { pool, catalog }
    }

    /// Spawn the cache warm-up (count + first five pages).
    pub fn spawn_warmup(&self) {
        let catalog = Arc::clone(&self.catalog);
        tokio::spawn(async move {
            catalog.warmup().await;
        });
    }

    /// Spawn catalog statistics generation.
    pub fn spawn_statistics(&self) {
        let pool = self.pool.clone();
        tokio::spawn(async move {
            let started = Instant::now();
            tracing::info!("Starting card statistics generation");
            match card_statistics(&pool).await {
                Ok((total, types, races, attributes)) => {
                    tracing::info!(
                        total,
                        types,
                        races,
                        attributes,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "Card statistics generation completed"
                    );
                }
                Err(e) => {
                    tracing::error!(error = %e, "Card statistics generation failed");
                }
            }
        });
    }

    /// Spawn a trivial demonstration job that just logs its runtime.
    pub fn spawn_log_job(&self) {
        tokio::spawn(async {
            let started = Instant::now();
            tracing::info!("Starting custom batch job");
            tracing::info!(
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Custom batch job completed"
            );
        });
    }
}

/// Total cards plus distinct type/race/attribute counts.
async fn card_statistics(pool: &DbPool) -> Result<(i64, i64, i64, i64), sqlx::Error> {
    sqlx::query_as(
        "SELECT COUNT(*), \
                COUNT(DISTINCT card_type), \
                COUNT(DISTINCT race), \
                COUNT(DISTINCT attribute) \
         FROM card",
    )
    .fetch_one(pool)
    .await
}
