//! Serialization of the two ladder documents
//!
//! The ratings snapshot is a JSON object of name to `{mu, sigma}`; the
//! History Log is a JSON array of `{timestamp, ratings}`. The History Log
//! is rewritten in full on every append.

use crate::error::{LadderError, Result};
use crate::storage::fallback::{FallbackStore, RemoteRevision, WriteReceipt};
use crate::storage::StorageKey;
use crate::types::{HistoryEntry, Ratings};
use tracing::{debug, info};

/// Reads and writes ratings and history through a [`FallbackStore`]
pub struct Persistence {
    store: FallbackStore,
}

impl Persistence {
    pub fn new(store: FallbackStore) -> Self {
        Self { store }
    }

    /// Last observed state of the remote copy of `key`
    pub fn remote_revision(&self, key: StorageKey) -> RemoteRevision {
        self.store.remote_revision(key)
    }

    /// Load the latest ratings snapshot
    pub async fn load_ratings(&self) -> Result<Ratings> {
        let ratings = self
            .store
            .read_decoded(StorageKey::Ratings, decode_ratings)
            .await?;

        info!("Loaded ratings for {} players", ratings.len());
        Ok(ratings)
    }

    /// Load the full History Log
    pub async fn load_history(&self) -> Result<Vec<HistoryEntry>> {
        let entries = self
            .store
            .read_decoded(StorageKey::History, decode_history)
            .await?;

        info!("Loaded {} history entries", entries.len());
        Ok(entries)
    }

    /// Overwrite the ratings snapshot
    pub async fn save_ratings(&self, ratings: &Ratings) -> Result<WriteReceipt> {
        let bytes = serde_json::to_vec_pretty(ratings)?;
        self.save(StorageKey::Ratings, &bytes).await
    }

    /// Rewrite the whole History Log
    pub async fn save_history(&self, entries: &[HistoryEntry]) -> Result<WriteReceipt> {
        let bytes = serde_json::to_vec_pretty(entries)?;
        self.save(StorageKey::History, &bytes).await
    }

    async fn save(&self, key: StorageKey, bytes: &[u8]) -> Result<WriteReceipt> {
        let receipt = self.store.write_document(key, bytes).await?;

        debug!(
            "Saved {} ({} bytes) to {} backend",
            key,
            bytes.len(),
            receipt.backend
        );
        Ok(receipt)
    }
}

/// Parse a ratings snapshot, rejecting ratings with non-positive sigma
pub fn decode_ratings(bytes: &[u8]) -> Result<Ratings> {
    let ratings: Ratings = serde_json::from_slice(bytes)?;
    for (name, rating) in &ratings {
        validate_stored(name, rating.mu, rating.sigma)?;
    }
    Ok(ratings)
}

/// Parse a History Log
pub fn decode_history(bytes: &[u8]) -> Result<Vec<HistoryEntry>> {
    let entries: Vec<HistoryEntry> = serde_json::from_slice(bytes)?;
    for entry in &entries {
        for (name, rating) in &entry.ratings {
            validate_stored(name, rating.mu, rating.sigma)?;
        }
    }
    Ok(entries)
}

fn validate_stored(name: &str, mu: f64, sigma: f64) -> Result<()> {
    if name.trim().is_empty() || !mu.is_finite() || !(sigma > 0.0 && sigma.is_finite()) {
        return Err(LadderError::InvalidRating {
            reason: format!(
                "stored rating for {:?} is unusable (mu={}, sigma={})",
                name, mu, sigma
            ),
        });
    }
    Ok(())
}
