//! Deck service: transactional mutations guarded by distributed locks.
//!
//! The per-deck lock serializes rapid double-submits across replicas; the
//! deck-size and copy limits are still revalidated inside the transaction,
//! which is the authority under concurrency.

use std::sync::Arc;
use std::time::Duration;

use deckforge_core::error::CoreError;
use deckforge_core::rules::{check_add_card, DeckRuleCheck, MAX_COPIES_PER_CARD, MAX_DECK_SIZE};
use deckforge_core::sanitize::sanitize;
use deckforge_core::types::DbId;
use deckforge_coord::DistributedLock;
use deckforge_db::models::deck::{CreateDeck, Deck};
use deckforge_db::repositories::{CardRepo, DeckRepo};
use deckforge_db::DbPool;
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::services::catalog::CardDto;

/// Lease for per-deck mutation locks.
const DECK_LOCK_LEASE: Duration = Duration::from_secs(5);

/// Lease for the per-user deck-creation lock.
const CREATE_LOCK_LEASE: Duration = Duration::from_secs(10);

const LOCK_DENIED_MESSAGE: &str =
    "Deck is being modified by another request. Please try again.";

/// External deck representation, cards in insertion order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckDto {
    pub id: DbId,
    pub name: String,
    pub username: String,
    pub cards: Vec<CardDto>,
}

/// Result payload for add/remove card operations.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckOperationData {
    pub deck: DeckDto,
    pub deck_size: i64,
    pub copies: i64,
}

/// Transactional deck mutations behind per-resource locks.
pub struct DeckService {
    pool: DbPool,
    lock: DistributedLock,
}

impl DeckService {
    pub fn new(pool: DbPool, lock: DistributedLock) -> Self {
        Self { pool, lock }
    }

    /// Ownership check: the owner or an admin may modify a deck.
    /// A missing deck yields `false`; the caller decides between 403/404.
    pub async fn can_modify(
        &self,
        deck_id: DbId,
        username: &str,
        is_admin: bool,
    ) -> AppResult<bool> {
        if is_admin {
            return Ok(true);
        }
        let deck = DeckRepo::find_by_id(&self.pool, deck_id).await?;
        Ok(deck.map(|d| d.username == username).unwrap_or(false))
    }

    pub async fn exists(&self, deck_id: DbId) -> AppResult<bool> {
        Ok(DeckRepo::find_by_id(&self.pool, deck_id).await?.is_some())
    }

    pub async fn list(&self) -> AppResult<Vec<DeckDto>> {
        let decks = DeckRepo::find_all(&self.pool).await?;
        let mut out = Vec::with_capacity(decks.len());
        for deck in decks {
            out.push(self.to_dto(deck).await?);
        }
        Ok(out)
    }

    pub async fn get(&self, deck_id: DbId) -> AppResult<Option<DeckDto>> {
        match DeckRepo::find_by_id(&self.pool, deck_id).await? {
            Some(deck) => Ok(Some(self.to_dto(deck).await?)),
            None => Ok(None),
        }
    }

    /// Create a deck owned by `username`.
    ///
    /// The per-user creation lock absorbs double-clicks, duplicate tabs,
    /// and network retries; a denied acquire maps to 409.
    pub async fn create(&self, name: &str, username: &str) -> AppResult<DeckDto> {
        let name = validated_name(name)?;

        let lock_key = format!("user:{username}:create_deck");
        if !self.lock.acquire(&lock_key, CREATE_LOCK_LEASE).await {
            return Err(AppError::Core(CoreError::Conflict(
                "Another deck creation is in progress. Please wait and try again.".into(),
            )));
        }

        let result = DeckRepo::create(
            &self.pool,
            &CreateDeck {
                name,
                username: username.to_string(),
            },
        )
        .await;
        self.lock.release(&lock_key).await;

        let deck = result?;
        tracing::info!(deck_id = deck.id, username, "Deck created");
        self.to_dto(deck).await
    }

    /// Rename a deck. The owner is preserved; membership changes go through
    /// [`DeckService::add_card`] / [`DeckService::remove_card`].
    pub async fn update(&self, deck_id: DbId, name: &str) -> AppResult<DeckDto> {
        let name = validated_name(name)?;

        let lock_key = format!("deck:{deck_id}");
        if !self.lock.acquire(&lock_key, DECK_LOCK_LEASE).await {
            return Err(AppError::Core(CoreError::Conflict(LOCK_DENIED_MESSAGE.into())));
        }

        let result = DeckRepo::update_name(&self.pool, deck_id, &name).await;
        self.lock.release(&lock_key).await;

        let deck = result?.ok_or_else(|| CoreError::not_found("Deck", deck_id.to_string()))?;
        self.to_dto(deck).await
    }

    pub async fn delete(&self, deck_id: DbId) -> AppResult<()> {
        let lock_key = format!("deck:{deck_id}");
        if !self.lock.acquire(&lock_key, DECK_LOCK_LEASE).await {
            return Err(AppError::Core(CoreError::Conflict(LOCK_DENIED_MESSAGE.into())));
        }

        let result = DeckRepo::delete(&self.pool, deck_id).await;
        self.lock.release(&lock_key).await;

        if result? {
            tracing::info!(deck_id, "Deck deleted");
            Ok(())
        } else {
            Err(AppError::Core(CoreError::not_found(
                "Deck",
                deck_id.to_string(),
            )))
        }
    }

    /// Add one copy of a card, enforcing both deck invariants.
    pub async fn add_card(&self, deck_id: DbId, card_name: &str) -> AppResult<DeckOperationData> {
        let lock_key = format!("deck:{deck_id}");
        if !self.lock.acquire(&lock_key, DECK_LOCK_LEASE).await {
            return Err(AppError::Core(CoreError::Conflict(LOCK_DENIED_MESSAGE.into())));
        }

        let result = self.add_card_locked(deck_id, card_name).await;
        self.lock.release(&lock_key).await;
        result
    }

    async fn add_card_locked(
        &self,
        deck_id: DbId,
        card_name: &str,
    ) -> AppResult<DeckOperationData> {
        let mut tx = self.pool.begin().await?;

        let deck = DeckRepo::find_by_id(&mut *tx, deck_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Deck", deck_id.to_string()))?;
        CardRepo::find_by_name(&mut *tx, card_name)
            .await?
            .ok_or_else(|| CoreError::not_found("Card", card_name))?;

        let size = DeckRepo::card_count(&mut *tx, deck_id).await?;
        let copies = DeckRepo::copy_count(&mut *tx, deck_id, card_name).await?;

        match check_add_card(size, copies) {
            DeckRuleCheck::DeckFull => {
                return Err(AppError::Core(CoreError::Validation(format!(
                    "Deck already has maximum allowed {MAX_DECK_SIZE} cards"
                ))));
            }
            DeckRuleCheck::TooManyCopies => {
                return Err(AppError::Core(CoreError::Validation(format!(
                    "Deck already contains {MAX_COPIES_PER_CARD} copies of this card"
                ))));
            }
            DeckRuleCheck::Ok => {}
        }

        DeckRepo::add_card(&mut *tx, deck_id, card_name).await?;
        tx.commit().await?;

        tracing::info!(deck_id, card_name, size = size + 1, "Card added to deck");
        Ok(DeckOperationData {
            deck: self.to_dto(deck).await?,
            deck_size: size + 1,
            copies: copies + 1,
        })
    }

    /// Remove the first occurrence of a card; a deck without the card is a
    /// no-op that still reports the current size and copy count.
    pub async fn remove_card(
        &self,
        deck_id: DbId,
        card_name: &str,
    ) -> AppResult<DeckOperationData> {
        let lock_key = format!("deck:{deck_id}");
        if !self.lock.acquire(&lock_key, DECK_LOCK_LEASE).await {
            return Err(AppError::Core(CoreError::Conflict(LOCK_DENIED_MESSAGE.into())));
        }

        let result = self.remove_card_locked(deck_id, card_name).await;
        self.lock.release(&lock_key).await;
        result
    }

    async fn remove_card_locked(
        &self,
        deck_id: DbId,
        card_name: &str,
    ) -> AppResult<DeckOperationData> {
        let mut tx = self.pool.begin().await?;

        let deck = DeckRepo::find_by_id(&mut *tx, deck_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Deck", deck_id.to_string()))?;
        CardRepo::find_by_name(&mut *tx, card_name)
            .await?
            .ok_or_else(|| CoreError::not_found("Card", card_name))?;

        let removed = DeckRepo::remove_first_card(&mut *tx, deck_id, card_name).await?;
        tx.commit().await?;

        if removed {
            tracing::info!(deck_id, card_name, "Card removed from deck");
        }

        let deck_size = DeckRepo::card_count(&self.pool, deck_id).await?;
        let copies = DeckRepo::copy_count(&self.pool, deck_id, card_name).await?;
        Ok(DeckOperationData {
            deck: self.to_dto(deck).await?,
            deck_size,
            copies,
        })
    }

    async fn to_dto(&self, deck: Deck) -> AppResult<DeckDto> {
        let cards = DeckRepo::cards_for_deck(&self.pool, deck.id)
            .await?
            .into_iter()
            .map(CardDto::from)
            .collect();
        Ok(DeckDto {
            id: deck.id,
            name: deck.name,
            username: deck.username,
            cards,
        })
    }
}

/// Sanitize and validate a deck name.
fn validated_name(raw: &str) -> Result<String, CoreError> {
    let name = sanitize(raw.trim());
    if name.is_empty() {
        return Err(CoreError::Validation("Deck name is required".into()));
    }
    if name.len() > 100 {
        return Err(CoreError::Validation(
            "Deck name must be between 1 and 100 characters".into(),
        ));
    }
    Ok(name)
}
