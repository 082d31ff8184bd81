//! Periodic refresh-token cleanup.
//!
//! Deletes revoked and expired refresh-token rows on a fixed interval so
//! the table tracks only live sessions. Runs until cancelled.

use std::time::Duration;

use chrono::Utc;
use deckforge_db::repositories::RefreshTokenRepo;
use deckforge_db::DbPool;
use tokio_util::sync::CancellationToken;

/// How often the cleanup job runs.
const CLEANUP_INTERVAL: Duration = Duration::from_secs(3600);

/// Run the refresh-token cleanup loop.
pub async fn run(pool: DbPool, cancel: CancellationToken) {
    tracing::info!(
        interval_secs = CLEANUP_INTERVAL.as_secs(),
        "Refresh-token cleanup job started"
    );

    let mut interval = tokio::time::interval(CLEANUP_INTERVAL);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Refresh-token cleanup job stopping");
                break;
            }
            _ = interval.tick() => {
                match RefreshTokenRepo::delete_expired_and_revoked(&pool, Utc::now()).await {
                    Ok(deleted) => {
                        if deleted > 0 {
                            tracing::info!(deleted, "Purged expired/revoked refresh tokens");
                        } else {
                            tracing::debug!("No refresh tokens to purge");
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Refresh-token cleanup failed");
                    }
                }
            }
        }
    }
}
