//! In-memory Rating Store
//!
//! The store maps player names to their current ratings. It is the unit
//! of mutation: adding a player inserts the prior, recording a match
//! replaces the rating of every participant at once. Players are never
//! removed.

use crate::error::{LadderError, Result};
use crate::rating::calculator::RatingCalculator;
use crate::types::{MatchOutcome, PlayerName, Rating, RatingChange, Ratings, Standing};
use std::cmp::Ordering;

/// Current rating of every known player
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RatingStore {
    ratings: Ratings,
}

impl RatingStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a previously persisted snapshot
    pub fn from_ratings(ratings: Ratings) -> Self {
        Self { ratings }
    }

    /// Seed a fresh store with the given players at the prior rating
    pub fn bootstrap<I, S>(players: I, prior: Rating) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<PlayerName>,
    {
        Self {
            ratings: players
                .into_iter()
                .map(|name| (name.into(), prior))
                .collect(),
        }
    }

    /// Read-only view of every rating
    pub fn get_all(&self) -> &Ratings {
        &self.ratings
    }

    /// Rating of a single player
    pub fn get(&self, name: &str) -> Option<Rating> {
        self.ratings.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.ratings.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.ratings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ratings.is_empty()
    }

    /// Rating of a known player, or `UnknownPlayer`
    pub fn require(&self, name: &str) -> Result<Rating> {
        self.get(name).ok_or_else(|| LadderError::UnknownPlayer {
            name: name.to_string(),
        })
    }

    /// Check a name could be added without changing the store
    pub fn validate_new_player(&self, name: &str) -> Result<()> {
        if name.trim().is_empty() {
            return Err(LadderError::EmptyPlayerName);
        }
        if self.contains(name) {
            return Err(LadderError::DuplicatePlayer {
                name: name.to_string(),
            });
        }
        Ok(())
    }

    /// Insert a new player at `prior`
    pub fn add_player(&mut self, name: &str, prior: Rating) -> Result<Rating> {
        self.validate_new_player(name)?;
        self.ratings.insert(name.to_string(), prior);
        Ok(prior)
    }

    /// Compute the rating changes a match would cause, without applying them
    pub fn preview_match(
        &self,
        outcome: &MatchOutcome,
        calculator: &dyn RatingCalculator,
    ) -> Result<Vec<RatingChange>> {
        let participants = outcome
            .players()
            .iter()
            .map(|name| Ok((name.clone(), self.require(name)?)))
            .collect::<Result<Vec<_>>>()?;

        calculator.calculate_rating_changes(&participants)
    }

    /// Record a match: every participant is updated, or none is
    pub fn record_match(
        &mut self,
        outcome: &MatchOutcome,
        calculator: &dyn RatingCalculator,
    ) -> Result<Vec<RatingChange>> {
        let changes = self.preview_match(outcome, calculator)?;
        self.apply(&changes);
        Ok(changes)
    }

    /// Replace the ratings named in `changes`
    pub fn apply(&mut self, changes: &[RatingChange]) {
        for change in changes {
            self.ratings.insert(change.name.clone(), change.new_rating);
        }
    }

    /// Players ordered by conservative score, best first
    ///
    /// Ties fall back to the higher mean, then to the name.
    pub fn standings(&self) -> Vec<Standing> {
        let mut rows: Vec<(&PlayerName, &Rating)> = self.ratings.iter().collect();
        rows.sort_by(|(name_a, a), (name_b, b)| {
            b.conservative_score()
                .partial_cmp(&a.conservative_score())
                .unwrap_or(Ordering::Equal)
                .then_with(|| b.mu.partial_cmp(&a.mu).unwrap_or(Ordering::Equal))
                .then_with(|| name_a.cmp(name_b))
        });

        rows.into_iter()
            .enumerate()
            .map(|(index, (name, rating))| Standing {
                position: index + 1,
                name: name.clone(),
                mu: rating.mu,
                sigma: rating.sigma,
                conservative: rating.conservative_score(),
            })
            .collect()
    }

    pub fn into_ratings(self) -> Ratings {
        self.ratings
    }
}
