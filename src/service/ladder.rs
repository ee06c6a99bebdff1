//! Ladder service
//!
//! `LadderService` is the only thing a caller talks to. It owns the Rating
//! Store, the History Log and the persistence layer, and sequences every
//! mutation the same way: validate, compute, commit in memory, append to
//! the History Log, then persist the ratings snapshot followed by the full
//! History Log.
//!
//! Mutations take `&mut self`, so only one operation runs at a time
//! against a given ladder.

use crate::config::AppConfig;
use crate::error::Result;
use crate::rating::{HistoryLog, RatingCalculator, RatingStore, TrueSkillCalculator};
use crate::storage::{
    FallbackStore, LocalFileBackend, Persistence, RemoteFileBackend, StorageBackend,
};
use crate::types::{
    HistoryEntry, MatchOutcome, MatchReport, PlayerName, Prediction, Rating, Ratings, Standing,
};
use chrono::{DateTime, Utc};
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Skill ladder with durable history
pub struct LadderService {
    calculator: Box<dyn RatingCalculator>,
    store: RatingStore,
    history: HistoryLog,
    persistence: Persistence,
}

impl LadderService {
    /// Load the ladder from storage
    ///
    /// Ratings come from the stored snapshot, else from the last History
    /// Log entry, else every bootstrap player starts at the prior. A
    /// bootstrapped ladder is not written until its first mutation.
    pub async fn open(
        calculator: Box<dyn RatingCalculator>,
        persistence: Persistence,
        bootstrap_players: &[PlayerName],
    ) -> Self {
        let history = match persistence.load_history().await {
            Ok(entries) => HistoryLog::from_entries(entries),
            Err(e) if e.is_not_found() => {
                info!("No history found, starting an empty log");
                HistoryLog::new()
            }
            Err(e) => {
                warn!("Failed to load history, starting an empty log: {}", e);
                HistoryLog::new()
            }
        };

        let store = match persistence.load_ratings().await {
            Ok(ratings) => RatingStore::from_ratings(ratings),
            Err(e) => {
                if e.is_not_found() {
                    info!("No ratings snapshot found");
                } else {
                    warn!("Failed to load ratings snapshot: {}", e);
                }

                match history.latest() {
                    Some(entry) => {
                        info!(
                            "Restoring ratings from history entry at {}",
                            entry.timestamp.to_rfc3339()
                        );
                        RatingStore::from_ratings(entry.ratings.clone())
                    }
                    None => {
                        info!(
                            "Bootstrapping ladder with {} players",
                            bootstrap_players.len()
                        );
                        RatingStore::bootstrap(
                            bootstrap_players.iter().cloned(),
                            calculator.initial_rating(),
                        )
                    }
                }
            }
        };

        info!(
            "Ladder ready: {} players, {} history entries",
            store.len(),
            history.len()
        );

        Self {
            calculator,
            store,
            history,
            persistence,
        }
    }

    /// Build the ladder described by `config`
    ///
    /// The remote backend is used only when a token is configured; the
    /// local data directory is always the fallback.
    pub async fn from_config(config: &AppConfig) -> Result<Self> {
        let calculator = TrueSkillCalculator::new(config.rating.clone())?;

        let local = LocalFileBackend::with_file_names(
            config.storage.data_dir.clone(),
            config.storage.ratings_file.clone(),
            config.storage.history_file.clone(),
        );

        let remote: Option<Box<dyn StorageBackend>> = match config.storage.remote_credentials() {
            Some(settings) => match RemoteFileBackend::new(settings.clone()) {
                Ok(backend) => Some(Box::new(backend)),
                Err(e) => {
                    warn!("Remote store unavailable, using local files only: {}", e);
                    None
                }
            },
            None => None,
        };

        let persistence = Persistence::new(FallbackStore::new(remote, Box::new(local)));
        Ok(Self::open(
            Box::new(calculator),
            persistence,
            &config.storage.bootstrap_players,
        )
        .await)
    }

    /// Snapshot of every player's current rating
    pub fn get_all_ratings(&self) -> Ratings {
        self.store.get_all().clone()
    }

    pub fn get_rating(&self, name: &str) -> Option<Rating> {
        self.store.get(name)
    }

    /// Add a player at the prior rating
    ///
    /// Fails with `EmptyPlayerName` or `DuplicatePlayer` without touching
    /// any state. A storage error after the in-memory commit is returned,
    /// but the player stays added.
    pub async fn add_player(&mut self, name: &str) -> Result<Rating> {
        let rating = self
            .store
            .add_player(name, self.calculator.initial_rating())?;

        info!(
            "Added player '{}' at mu={:.3}, sigma={:.3}",
            name, rating.mu, rating.sigma
        );

        self.commit().await?;
        Ok(rating)
    }

    /// Record a match given the finishing order, winner first
    ///
    /// Every participant must already be on the ladder. On success the
    /// returned report carries the full updated mapping and each
    /// participant's change.
    pub async fn record_match<I, S>(&mut self, finishing_order: I) -> Result<MatchReport>
    where
        I: IntoIterator<Item = S>,
        S: Into<PlayerName>,
    {
        let start_time = Instant::now();

        let outcome = MatchOutcome::new(finishing_order)?;
        let changes = self
            .store
            .record_match(&outcome, self.calculator.as_ref())?;

        info!(
            "Recorded match of {} players, winner '{}', time: {:.2}ms",
            outcome.len(),
            changes[0].name,
            start_time.elapsed().as_secs_f64() * 1000.0
        );

        self.commit().await?;

        Ok(MatchReport {
            ratings: self.get_all_ratings(),
            changes,
        })
    }

    /// Rating trajectory of one player, oldest first
    pub fn get_history<'a>(
        &'a self,
        name: &'a str,
    ) -> Result<impl Iterator<Item = (DateTime<Utc>, Rating)> + 'a> {
        self.store.require(name)?;
        Ok(self.history.for_player(name))
    }

    /// Every History Log entry, oldest first
    pub fn history(&self) -> &[HistoryEntry] {
        self.history.all()
    }

    /// Players ordered by conservative score, best first
    pub fn leaderboard(&self) -> Vec<Standing> {
        self.store.standings()
    }

    /// Forecast a game between two players
    pub fn head_to_head(&self, first: &str, second: &str) -> Result<Prediction> {
        // Reuse the match validation for the repeated-name case
        MatchOutcome::new([first, second])?;

        let first_rating = self.store.require(first)?;
        let second_rating = self.store.require(second)?;
        Ok(self.calculator.predict(&first_rating, &second_rating))
    }

    pub fn calculator(&self) -> &dyn RatingCalculator {
        self.calculator.as_ref()
    }

    /// Append the current ladder to the History Log and persist both
    /// documents
    async fn commit(&mut self) -> Result<()> {
        let snapshot = self.store.get_all().clone();
        let recorded = self.history.append(snapshot);
        debug!("History entry appended at {}", recorded.to_rfc3339());

        let receipt = match self.persistence.save_ratings(self.store.get_all()).await {
            Ok(receipt) => receipt,
            Err(e) => {
                error!("Failed to persist ratings, ladder is ahead of storage: {}", e);
                return Err(e);
            }
        };

        if let Err(e) = self.persistence.save_history(self.history.all()).await {
            warn!(
                "Ratings saved to {} but history write failed: {}",
                receipt.backend, e
            );
            return Err(e);
        }

        debug!("Ladder persisted to {}", receipt.backend);
        Ok(())
    }
}
