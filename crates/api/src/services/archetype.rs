//! Archetype upsert.
//!
//! Cards reference archetypes by id, so the rows must exist before a card
//! insert. Concurrent callers may race to create the same name; the winner's
//! row is semantically equivalent, so every path converges on returning it
//! instead of surfacing the conflict.

use std::collections::HashMap;

use deckforge_db::models::archetype::Archetype;
use deckforge_db::repositories::ArchetypeRepo;
use deckforge_db::DbPool;

/// Ensure a row exists for every name, returning name -> row.
///
/// Blank names are ignored. The bulk insert skips names that already exist;
/// anything a concurrent writer slipped in is picked up by re-query, with a
/// per-name insert-or-fetch as the last resort.
pub async fn ensure_archetypes<I>(
    pool: &DbPool,
    raw_names: I,
) -> Result<HashMap<String, Archetype>, sqlx::Error>
where
    I: IntoIterator<Item = String>,
{
    let mut names: Vec<String> = raw_names
        .into_iter()
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .collect();
    names.sort();
    names.dedup();

    let mut map = HashMap::new();
    if names.is_empty() {
        return Ok(map);
    }

    for archetype in ArchetypeRepo::find_by_names(pool, &names).await? {
        map.insert(archetype.name.clone(), archetype);
    }

    let missing: Vec<String> = names
        .iter()
        .filter(|n| !map.contains_key(*n))
        .cloned()
        .collect();
    if missing.is_empty() {
        return Ok(map);
    }

    for archetype in ArchetypeRepo::insert_missing(pool, &missing).await? {
        tracing::info!(name = %archetype.name, "Created archetype");
        map.insert(archetype.name.clone(), archetype);
    }

    // Names skipped by ON CONFLICT belong to a concurrent writer; fetch them.
    let lost: Vec<String> = missing
        .iter()
        .filter(|n| !map.contains_key(*n))
        .cloned()
        .collect();
    if !lost.is_empty() {
        tracing::warn!(count = lost.len(), "Concurrent archetype inserts, re-querying");
        for archetype in ArchetypeRepo::find_by_names(pool, &lost).await? {
            map.insert(archetype.name.clone(), archetype);
        }
        for name in lost {
            if map.contains_key(&name) {
                continue;
            }
            // The winner vanished between insert and re-query; take one
            // more turn at creating the row ourselves.
            match ArchetypeRepo::insert_missing(pool, std::slice::from_ref(&name)).await {
                Ok(created) => {
                    if let Some(archetype) = created.into_iter().next() {
                        tracing::info!(name = %archetype.name, "Created archetype (retry)");
                        map.insert(archetype.name.clone(), archetype);
                    } else if let Some(archetype) = ArchetypeRepo::find_by_name(pool, &name).await?
                    {
                        map.insert(archetype.name.clone(), archetype);
                    } else {
                        tracing::error!(name, "Failed to create or find archetype after conflict");
                    }
                }
                Err(e) => {
                    tracing::error!(name, error = %e, "Archetype retry insert failed");
                    return Err(e);
                }
            }
        }
    }

    Ok(map)
}
