//! Catalog service: cached reads, write-through mutations, warm-up.
//!
//! Reads go through the `cards` cache namespace; every mutation commits to
//! the database first, then evicts the whole namespace before the request
//! returns, so a reader never sees a stale count next to a fresh page.
//! Eviction is deliberately coarse -- writes are rare and warm-up reloads
//! the hot set.

use std::sync::Arc;

use deckforge_core::error::CoreError;
use deckforge_core::types::DbId;
use deckforge_coord::{CacheNamespace, QueueMessage, WorkQueue};
use deckforge_db::models::card::{CardRecord, UpsertCard};
use deckforge_db::repositories::{ArchetypeRepo, CardRepo, DeckRepo};
use deckforge_db::DbPool;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::{AppError, AppResult};
use crate::response::PaginatedResponse;
use crate::services::archetype::ensure_archetypes;
use crate::services::{QUEUE_CARD_OPERATIONS, QUEUE_NOTIFICATIONS};

/// Cache namespace holding `name:*`, `page:*:size:*`, and `count` keys.
pub const CARDS_CACHE_NAMESPACE: &str = "cards";

/// Pages pre-loaded by warm-up (page size 20).
const WARMUP_PAGES: i64 = 5;

/// Archetype reference embedded in a card payload.
///
/// Requests carry only the name; responses carry the resolved row id too.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ArchetypeRef {
    #[serde(default)]
    pub id: Option<DbId>,
    pub name: String,
}

/// External card representation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardDto {
    pub name: String,
    #[serde(default)]
    pub human_readable_card_type: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub race: Option<String>,
    #[serde(default)]
    pub attribute: Option<String>,
    #[serde(default)]
    pub archetype: Option<ArchetypeRef>,
}

impl From<CardRecord> for CardDto {
    fn from(record: CardRecord) -> Self {
        let archetype = match (record.archetype_id, record.archetype_name) {
            (Some(id), Some(name)) => Some(ArchetypeRef { id: Some(id), name }),
            _ => None,
        };
        Self {
            name: record.name,
            human_readable_card_type: record.card_type,
            description: record.description,
            race: record.race,
            attribute: record.attribute,
            archetype,
        }
    }
}

impl CardDto {
    /// Field-level validation, first failure wins.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.name.trim().is_empty() {
            return Err(CoreError::Validation("Card name is required".into()));
        }
        if self.name.len() > 255 {
            return Err(CoreError::Validation(
                "Card name must not exceed 255 characters".into(),
            ));
        }
        if let Some(t) = &self.human_readable_card_type {
            if t.len() > 100 {
                return Err(CoreError::Validation(
                    "Card type must not exceed 100 characters".into(),
                ));
            }
        }
        if let Some(d) = &self.description {
            if d.len() > 10_000 {
                return Err(CoreError::Validation(
                    "Description must not exceed 10000 characters".into(),
                ));
            }
        }
        if let Some(r) = &self.race {
            if r.len() > 50 {
                return Err(CoreError::Validation(
                    "Race must not exceed 50 characters".into(),
                ));
            }
        }
        if let Some(a) = &self.attribute {
            if a.len() > 50 {
                return Err(CoreError::Validation(
                    "Attribute must not exceed 50 characters".into(),
                ));
            }
        }
        if let Some(archetype) = &self.archetype {
            if archetype.name.len() > 100 {
                return Err(CoreError::Validation(
                    "Archetype name must not exceed 100 characters".into(),
                ));
            }
        }
        Ok(())
    }
}

/// Which mutation produced a save, for the post-mutation hooks.
#[derive(Debug, Clone, Copy)]
pub enum CardMutation {
    Created,
    Updated,
}

impl CardMutation {
    fn queue_type(self) -> &'static str {
        match self {
            CardMutation::Created => "CARD_CREATED",
            CardMutation::Updated => "CARD_UPDATED",
        }
    }

    fn notification(self, name: &str) -> String {
        match self {
            CardMutation::Created => format!("New card created: {name}"),
            CardMutation::Updated => format!("Card updated: {name}"),
        }
    }
}

/// Composes the card repository with the cache namespace and work queue.
pub struct CatalogService {
    pool: DbPool,
    cache: Arc<CacheNamespace>,
    queue: Arc<WorkQueue>,
}

impl CatalogService {
    pub fn new(pool: DbPool, cache: Arc<CacheNamespace>, queue: Arc<WorkQueue>) -> Self {
        Self { pool, cache, queue }
    }

    // --- Reads ---

    /// Fetch a single card by name, cached under `name:<n>`.
    ///
    /// Negative lookups are cached too; the namespace eviction on every
    /// write clears them along with everything else.
    pub async fn get_by_name(&self, name: &str) -> AppResult<Option<CardDto>> {
        let key = format!("name:{name}");
        self.cache
            .get_or_compute(&key, move || async move {
                let record = CardRepo::find_by_name(&self.pool, name).await?;
                Ok::<_, AppError>(record.map(CardDto::from))
            })
            .await
    }

    /// Fetch one catalog page, cached under `page:<p>:size:<s>`.
    pub async fn list_page(&self, page: i64, size: i64) -> AppResult<PaginatedResponse<CardDto>> {
        let key = format!("page:{page}:size:{size}");
        self.cache
            .get_or_compute(&key, move || async move {
                let items = CardRepo::list_page(&self.pool, size, page * size).await?;
                let total = CardRepo::count(&self.pool).await?;
                let items = items.into_iter().map(CardDto::from).collect();
                Ok::<_, AppError>(PaginatedResponse::from_page(items, page, size, total))
            })
            .await
    }

    /// Search by card or archetype name. Never cached: the result space is
    /// too large to be worth page keys.
    pub async fn search_page(
        &self,
        term: &str,
        page: i64,
        size: i64,
    ) -> AppResult<PaginatedResponse<CardDto>> {
        let items = CardRepo::search(&self.pool, term, size, page * size).await?;
        let total = CardRepo::search_count(&self.pool, term).await?;
        let items = items.into_iter().map(CardDto::from).collect();
        Ok(PaginatedResponse::from_page(items, page, size, total))
    }

    /// Total card count, cached under `count`.
    pub async fn count(&self) -> AppResult<i64> {
        self.cache
            .get_or_compute("count", move || async move {
                Ok::<_, AppError>(CardRepo::count(&self.pool).await?)
            })
            .await
    }

    /// Whether the count entry is currently resident, for cache stats.
    pub async fn is_count_cached(&self) -> bool {
        self.cache.probe("count").await
    }

    // --- Writes ---

    /// Create or update a card, then evict the namespace and enqueue the
    /// post-mutation hooks.
    pub async fn save(&self, mut card: CardDto, mutation: CardMutation) -> AppResult<CardDto> {
        tracing::info!(name = %card.name, "Saving card");

        let archetype_id = match card
            .archetype
            .as_ref()
            .map(|a| a.name.trim().to_string())
            .filter(|n| !n.is_empty())
        {
            Some(archetype_name) => {
                let resolved = ensure_archetypes(&self.pool, [archetype_name.clone()]).await?;
                let row = resolved.get(&archetype_name).ok_or_else(|| {
                    AppError::InternalError(format!(
                        "Archetype '{archetype_name}' could not be resolved"
                    ))
                })?;
                card.archetype = Some(ArchetypeRef {
                    id: Some(row.id),
                    name: row.name.clone(),
                });
                Some(row.id)
            }
            None => {
                card.archetype = None;
                None
            }
        };

        let input = UpsertCard {
            name: card.name.clone(),
            card_type: card.human_readable_card_type.clone(),
            description: card.description.clone(),
            race: card.race.clone(),
            attribute: card.attribute.clone(),
            archetype_id,
        };
        CardRepo::upsert(&self.pool, &input).await?;

        // Coarse by intent: clears pages, count, and per-card entries so no
        // stale combination survives the write.
        self.cache.evict_all().await;

        self.enqueue_card_operation(mutation.queue_type(), &card.name).await;
        self.enqueue_notification("SYSTEM", &mutation.notification(&card.name))
            .await;

        let saved = CardRepo::find_by_name(&self.pool, &card.name)
            .await?
            .map(CardDto::from)
            .ok_or_else(|| AppError::InternalError("Card vanished after save".into()))?;
        Ok(saved)
    }

    /// Delete a card, refusing while any deck still references it.
    /// Orphaned archetypes are collected best-effort afterwards.
    pub async fn delete(&self, name: &str) -> AppResult<()> {
        tracing::info!(name, "Deleting card");

        let record = CardRepo::find_by_name(&self.pool, name)
            .await?
            .ok_or_else(|| CoreError::not_found("Card", name))?;

        if DeckRepo::card_in_any_deck(&self.pool, name).await? {
            return Err(AppError::Core(CoreError::Conflict(
                "Cannot delete card: it is currently used in one or more decks. \
                 Remove it from all decks first."
                    .into(),
            )));
        }

        let archetype_name = record.archetype_name;
        CardRepo::delete(&self.pool, name).await?;
        self.cache.evict_all().await;

        if let Some(archetype_name) = archetype_name {
            self.collect_orphan_archetype(&archetype_name).await;
        }

        self.enqueue_card_operation("CARD_DELETED", name).await;
        self.enqueue_notification("SYSTEM", &format!("Card deleted: {name}"))
            .await;
        Ok(())
    }

    /// Delete the archetype when its last card is gone. Failures are logged
    /// and never fail the card deletion that triggered the collection.
    async fn collect_orphan_archetype(&self, archetype_name: &str) {
        let remaining = match CardRepo::count_by_archetype_name(&self.pool, archetype_name).await {
            Ok(remaining) => remaining,
            Err(e) => {
                tracing::warn!(archetype_name, error = %e, "Orphan check failed");
                return;
            }
        };
        if remaining > 0 {
            return;
        }
        match ArchetypeRepo::find_by_name(&self.pool, archetype_name).await {
            Ok(Some(archetype)) => match ArchetypeRepo::delete(&self.pool, archetype.id).await {
                Ok(true) => {
                    tracing::info!(archetype_name, "Deleted orphan archetype after card deletion");
                }
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!(archetype_name, error = %e, "Could not delete orphan archetype");
                }
            },
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(archetype_name, error = %e, "Orphan archetype lookup failed");
            }
        }
    }

    // --- Cache maintenance ---

    /// Evict every entry in the `cards` namespace.
    pub async fn clear_cache(&self) {
        self.cache.evict_all().await;
    }

    /// Pre-load the hot set: the count plus the first five pages of 20.
    /// Idempotent; safe to run concurrently with mutations.
    pub async fn warmup(&self) {
        tracing::info!("Starting cache warmup");
        if let Err(e) = self.count().await {
            tracing::error!(error = %e, "Cache warmup failed on count");
            return;
        }
        for page in 0..WARMUP_PAGES {
            if let Err(e) = self.list_page(page, 20).await {
                tracing::error!(page, error = %e, "Cache warmup failed on page");
                return;
            }
        }
        tracing::info!("Cache warmup completed");
    }

    // --- Background hooks ---

    async fn enqueue_card_operation(&self, operation: &str, card_name: &str) {
        self.queue
            .enqueue(
                QUEUE_CARD_OPERATIONS,
                &QueueMessage::new(operation, json!({ "cardName": card_name })),
            )
            .await;
    }

    /// Queue a notification for background delivery.
    pub async fn enqueue_notification(&self, kind: &str, content: &str) {
        self.queue
            .enqueue(
                QUEUE_NOTIFICATIONS,
                &QueueMessage::new(kind, json!({ "content": content })),
            )
            .await;
    }
}
