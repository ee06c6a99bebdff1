//! Rating calculator trait
//!
//! This module defines the interface the Rating Store uses to turn a
//! finishing order into new ratings, so the update algorithm can be
//! swapped without touching storage or the service.

use crate::error::{LadderError, Result};
use crate::types::{PlayerName, Prediction, Rating, RatingChange};
use std::collections::HashSet;

/// Trait for calculating rating changes after a match
pub trait RatingCalculator: Send + Sync {
    /// Calculate new ratings for every participant of a match
    ///
    /// # Arguments
    /// * `participants` - (name, current rating) pairs in finishing order,
    ///   index 0 being the winner; every participant holds a distinct rank
    ///
    /// # Returns
    /// One change per participant, index-aligned with the input
    fn calculate_rating_changes(
        &self,
        participants: &[(PlayerName, Rating)],
    ) -> Result<Vec<RatingChange>>;

    /// Prior rating given to new players
    fn initial_rating(&self) -> Rating;

    /// Forecast a head-to-head game between two ratings
    fn predict(&self, first: &Rating, second: &Rating) -> Prediction;

    /// Current configuration as JSON
    fn config(&self) -> serde_json::Value;
}

/// Checks shared by every calculator: at least two distinct participants
/// with usable ratings
pub fn validate_participants(participants: &[(PlayerName, Rating)]) -> Result<()> {
    if participants.len() < 2 {
        return Err(LadderError::TooFewParticipants {
            count: participants.len(),
        });
    }

    let mut seen = HashSet::with_capacity(participants.len());
    for (name, rating) in participants {
        if !seen.insert(name.as_str()) {
            return Err(LadderError::DuplicateParticipant { name: name.clone() });
        }
        Rating::new(rating.mu, rating.sigma)?;
    }

    Ok(())
}
