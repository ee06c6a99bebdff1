//! Common types used throughout the ladder

use crate::error::{LadderError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use skillratings::trueskill::TrueSkillRating;
use std::collections::{BTreeMap, HashSet};

/// Unique, case-sensitive player name
pub type PlayerName = String;

/// Every player's current rating, keyed by name
pub type Ratings = BTreeMap<PlayerName, Rating>;

/// Gaussian belief over one player's skill
///
/// Ratings are value objects: an update always produces a new `Rating`,
/// so a copy held by a caller stays a valid historical snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub mu: f64,
    pub sigma: f64,
}

impl Rating {
    /// Create a rating, rejecting non-finite values and non-positive sigma
    pub fn new(mu: f64, sigma: f64) -> Result<Self> {
        if !mu.is_finite() {
            return Err(LadderError::InvalidRating {
                reason: format!("mu must be finite, got {}", mu),
            });
        }
        if !sigma.is_finite() || sigma <= 0.0 {
            return Err(LadderError::InvalidRating {
                reason: format!("sigma must be positive, got {}", sigma),
            });
        }
        Ok(Self { mu, sigma })
    }

    /// Lower confidence bound `mu - 3*sigma`, used for ranking
    pub fn conservative_score(&self) -> f64 {
        self.mu - 3.0 * self.sigma
    }
}

/// Free-function form of [`Rating::conservative_score`]
pub fn conservative_score(rating: &Rating) -> f64 {
    rating.conservative_score()
}

impl From<TrueSkillRating> for Rating {
    fn from(rating: TrueSkillRating) -> Self {
        Self {
            mu: rating.rating,
            sigma: rating.uncertainty,
        }
    }
}

impl From<Rating> for TrueSkillRating {
    fn from(rating: Rating) -> Self {
        Self {
            rating: rating.mu,
            uncertainty: rating.sigma,
        }
    }
}

/// One History Log entry: the whole ladder at a point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub timestamp: DateTime<Utc>,
    pub ratings: Ratings,
}

/// Finishing order of a single match, winner first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchOutcome {
    players: Vec<PlayerName>,
}

impl MatchOutcome {
    /// Validate the shape of an outcome: at least two players, no repeats
    ///
    /// Whether the players exist is checked against the store, not here.
    pub fn new<I, S>(players: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<PlayerName>,
    {
        let players: Vec<PlayerName> = players.into_iter().map(Into::into).collect();

        if players.len() < 2 {
            return Err(LadderError::TooFewParticipants {
                count: players.len(),
            });
        }

        let mut seen = HashSet::with_capacity(players.len());
        for name in &players {
            if !seen.insert(name.as_str()) {
                return Err(LadderError::DuplicateParticipant { name: name.clone() });
            }
        }

        Ok(Self { players })
    }

    /// Players in finishing order
    pub fn players(&self) -> &[PlayerName] {
        &self.players
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

/// Rating movement of one participant in a recorded match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingChange {
    pub name: PlayerName,
    /// Finishing position, 0 is the winner
    pub rank: usize,
    pub old_rating: Rating,
    pub new_rating: Rating,
}

impl RatingChange {
    pub fn mu_delta(&self) -> f64 {
        self.new_rating.mu - self.old_rating.mu
    }

    pub fn sigma_delta(&self) -> f64 {
        self.new_rating.sigma - self.old_rating.sigma
    }
}

/// Result of recording a match
#[derive(Debug, Clone, PartialEq)]
pub struct MatchReport {
    /// Full ladder after the match
    pub ratings: Ratings,
    /// Participant changes, in finishing order
    pub changes: Vec<RatingChange>,
}

/// A leaderboard row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Standing {
    /// 1-based position
    pub position: usize,
    pub name: PlayerName,
    pub mu: f64,
    pub sigma: f64,
    pub conservative: f64,
}

/// Outcome forecast for a head-to-head game
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Probability that the first player beats the second
    pub win_probability: f64,
    /// Draw-based match quality in `[0, 1]`, higher means more even
    pub match_quality: f64,
}
