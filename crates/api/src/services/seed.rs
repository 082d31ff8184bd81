//! Data seeding: initial principals and the one-shot catalog import.
//!
//! Both run at most once per startup, guarded by an emptiness check, so a
//! restarted replica never duplicates data. The importer is also reachable
//! from the admin async-reload endpoint.

use std::time::Duration;

use deckforge_core::roles::{ROLE_ADMIN, ROLE_USER};
use deckforge_db::models::card::UpsertCard;
use deckforge_db::models::user::CreateUser;
use deckforge_db::repositories::{CardRepo, UserRepo};
use deckforge_db::DbPool;

use crate::auth::password::hash_password;
use crate::services::archetype::ensure_archetypes;

/// Rows per insert transaction during bulk import.
const IMPORT_BATCH_SIZE: usize = 100;

/// Timeout for the upstream catalog request.
const IMPORT_TIMEOUT: Duration = Duration::from_secs(30);

/// Create the initial principals when the user table is empty.
pub async fn seed_users(pool: &DbPool) -> Result<(), sqlx::Error> {
    if UserRepo::count(pool).await? > 0 {
        tracing::debug!("Users already exist, skipping initialization");
        return Ok(());
    }

    let seeds = [
        ("user1", "password1", ROLE_USER),
        ("user2", "password2", ROLE_USER),
        ("admin1", "password1", ROLE_ADMIN),
        ("admin2", "password2", ROLE_ADMIN),
    ];

    for (username, password, role) in seeds {
        let password_hash = hash_password(password)
            .unwrap_or_else(|e| panic!("Failed to hash seed password for {username}: {e}"));
        UserRepo::create(
            pool,
            &CreateUser {
                username: username.to_string(),
                password_hash,
                role: role.to_string(),
            },
        )
        .await?;
        tracing::info!(username, role, "Created seed user");
    }

    tracing::info!("Initial users created");
    Ok(())
}

/// Error type for catalog import failures.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    /// The upstream HTTP request failed (network, DNS, timeout, non-2xx).
    #[error("Catalog request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Persisting the imported rows failed.
    #[error("Catalog persistence failed: {0}")]
    Database(#[from] sqlx::Error),
}

/// Imports the card catalog from the upstream API.
pub struct CardImporter {
    pool: DbPool,
    client: reqwest::Client,
    source_url: String,
}

impl CardImporter {
    pub fn new(pool: DbPool, source_url: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(IMPORT_TIMEOUT)
            .build()
            .expect("Failed to build catalog HTTP client");
        Self {
            pool,
            client,
            source_url: source_url.to_string(),
        }
    }

    /// One-shot startup import: only runs against an empty catalog.
    pub async fn run_if_empty(&self) {
        match CardRepo::count(&self.pool).await {
            Ok(0) => {
                tracing::info!("Card table empty, loading catalog from upstream API");
                match self.import("Startup").await {
                    Ok(total) => tracing::info!(total, "Startup catalog import finished"),
                    Err(e) => tracing::error!(error = %e, "Startup catalog import failed"),
                }
            }
            Ok(count) => {
                tracing::debug!(count, "Catalog already loaded, skipping import");
            }
            Err(e) => {
                tracing::error!(error = %e, "Could not check catalog count before import");
            }
        }
    }

    /// Fetch the upstream catalog and upsert it in batches.
    ///
    /// Archetypes are ensured first so every card insert can reference a
    /// resolved row id. Returns the number of cards written.
    pub async fn import(&self, context: &str) -> Result<usize, ImportError> {
        let body: serde_json::Value = self
            .client
            .get(&self.source_url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let Some(data) = body.get("data").and_then(|d| d.as_array()) else {
            tracing::warn!(context, "Upstream catalog response carried no data array");
            return Ok(0);
        };

        let archetype_names = data
            .iter()
            .filter_map(|node| node.get("archetype").and_then(|a| a.as_str()))
            .map(str::to_string);
        let archetypes = ensure_archetypes(&self.pool, archetype_names).await?;

        let mut cards = Vec::new();
        for node in data {
            let Some(name) = node.get("name").and_then(|n| n.as_str()) else {
                continue;
            };
            let archetype_id = node
                .get("archetype")
                .and_then(|a| a.as_str())
                .and_then(|a| archetypes.get(a.trim()))
                .map(|row| row.id);

            cards.push(UpsertCard {
                name: name.to_string(),
                card_type: json_str(node, "type"),
                description: json_str(node, "desc"),
                race: json_str(node, "race"),
                attribute: json_str(node, "attribute"),
                archetype_id,
            });
        }

        let mut written = 0;
        for chunk in cards.chunks(IMPORT_BATCH_SIZE) {
            let mut tx = self.pool.begin().await?;
            for card in chunk {
                CardRepo::upsert(&mut *tx, card).await?;
            }
            tx.commit().await?;
            written += chunk.len();
            tracing::info!(context, written, "Saved card batch");
        }

        Ok(written)
    }
}

fn json_str(node: &serde_json::Value, key: &str) -> Option<String> {
    node.get(key).and_then(|v| v.as_str()).map(str::to_string)
}
