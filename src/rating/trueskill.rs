//! TrueSkill rating system implementation
//!
//! This module provides the concrete update algorithm for the ladder:
//! every participant is a one-player team, the finishing order is fed
//! through the TrueSkill factor graph from the skillratings crate, and
//! the draw probability is pinned to zero.

use crate::error::{LadderError, Result};
use crate::rating::calculator::{validate_participants, RatingCalculator};
use crate::types::{PlayerName, Prediction, Rating, RatingChange};
use serde::{Deserialize, Serialize};
use skillratings::trueskill::{
    expected_score, match_quality, trueskill_multi_team, TrueSkillConfig, TrueSkillRating,
};
use skillratings::MultiTeamOutcome;
use tracing::debug;

/// Parameters of the TrueSkill model
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrueSkillSettings {
    /// Prior mean given to new players
    pub initial_mu: f64,
    /// Prior standard deviation given to new players
    pub initial_sigma: f64,
    /// Per-performance standard deviation, `initial_sigma / 2` when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub beta: Option<f64>,
    /// Dynamics factor added to every participant before each update,
    /// `initial_sigma / 100` when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tau: Option<f64>,
}

impl Default for TrueSkillSettings {
    fn default() -> Self {
        Self::with_prior(25.0, 25.0 / 3.0)
    }
}

impl TrueSkillSettings {
    /// Prior with beta and tau left to follow sigma
    pub fn with_prior(initial_mu: f64, initial_sigma: f64) -> Self {
        Self {
            initial_mu,
            initial_sigma,
            beta: None,
            tau: None,
        }
    }

    /// Effective beta: the configured value, else `initial_sigma / 2`
    pub fn beta(&self) -> f64 {
        self.beta.unwrap_or(self.initial_sigma / 2.0)
    }

    /// Effective tau: the configured value, else `initial_sigma / 100`
    pub fn tau(&self) -> f64 {
        self.tau.unwrap_or(self.initial_sigma / 100.0)
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if !self.initial_mu.is_finite() {
            return Err(LadderError::Configuration {
                message: "Initial mu must be finite".to_string(),
            });
        }

        if !(self.initial_sigma > 0.0 && self.initial_sigma.is_finite()) {
            return Err(LadderError::Configuration {
                message: "Initial sigma must be positive".to_string(),
            });
        }

        let beta = self.beta();
        if !(beta > 0.0 && beta.is_finite()) {
            return Err(LadderError::Configuration {
                message: "Beta must be positive".to_string(),
            });
        }

        let tau = self.tau();
        if !(tau >= 0.0 && tau.is_finite()) {
            return Err(LadderError::Configuration {
                message: "Tau must be non-negative".to_string(),
            });
        }

        Ok(())
    }

    fn to_config(&self) -> TrueSkillConfig {
        TrueSkillConfig {
            draw_probability: 0.0,
            beta: self.beta(),
            default_dynamics: self.tau(),
        }
    }
}

/// TrueSkill rating calculator
#[derive(Debug)]
pub struct TrueSkillCalculator {
    settings: TrueSkillSettings,
    config: TrueSkillConfig,
}

impl TrueSkillCalculator {
    /// Create a new TrueSkill calculator
    pub fn new(settings: TrueSkillSettings) -> Result<Self> {
        settings.validate()?;
        let config = settings.to_config();

        Ok(Self { settings, config })
    }

    pub fn settings(&self) -> &TrueSkillSettings {
        &self.settings
    }

    /// Prior rating for new players
    pub fn default_rating(&self) -> Rating {
        Rating {
            mu: self.settings.initial_mu,
            sigma: self.settings.initial_sigma,
        }
    }
}

impl Default for TrueSkillCalculator {
    fn default() -> Self {
        let settings = TrueSkillSettings::default();
        let config = settings.to_config();
        Self { settings, config }
    }
}

impl RatingCalculator for TrueSkillCalculator {
    fn calculate_rating_changes(
        &self,
        participants: &[(PlayerName, Rating)],
    ) -> Result<Vec<RatingChange>> {
        validate_participants(participants)?;

        // One single-player team per participant, ranked by finishing position
        let teams: Vec<[TrueSkillRating; 1]> = participants
            .iter()
            .map(|(_, rating)| [(*rating).into()])
            .collect();
        let teams_and_ranks: Vec<(&[TrueSkillRating], MultiTeamOutcome)> = teams
            .iter()
            .enumerate()
            .map(|(rank, team)| (team.as_slice(), MultiTeamOutcome::new(rank + 1)))
            .collect();

        let new_teams = trueskill_multi_team(&teams_and_ranks, &self.config);
        if new_teams.len() != participants.len() {
            return Err(LadderError::InvalidRating {
                reason: format!(
                    "expected {} updated ratings, got {}",
                    participants.len(),
                    new_teams.len()
                ),
            });
        }

        let mut changes = Vec::with_capacity(participants.len());
        for (rank, ((name, old_rating), team)) in participants.iter().zip(new_teams).enumerate() {
            let updated = team
                .first()
                .copied()
                .ok_or_else(|| LadderError::InvalidRating {
                    reason: format!("no updated rating for {}", name),
                })?;
            // Reject NaN or collapsed sigma before it reaches the store
            let new_rating = Rating::new(updated.rating, updated.uncertainty)?;

            debug!(
                "{} (rank {}): mu {:.3} -> {:.3}, sigma {:.3} -> {:.3}",
                name, rank, old_rating.mu, new_rating.mu, old_rating.sigma, new_rating.sigma
            );

            changes.push(RatingChange {
                name: name.clone(),
                rank,
                old_rating: *old_rating,
                new_rating,
            });
        }

        Ok(changes)
    }

    fn initial_rating(&self) -> Rating {
        self.default_rating()
    }

    fn predict(&self, first: &Rating, second: &Rating) -> Prediction {
        let first: TrueSkillRating = (*first).into();
        let second: TrueSkillRating = (*second).into();

        let (win_probability, _) = expected_score(&first, &second, &self.config);

        Prediction {
            win_probability,
            match_quality: match_quality(&first, &second, &self.config),
        }
    }

    fn config(&self) -> serde_json::Value {
        serde_json::to_value(&self.settings).unwrap_or(serde_json::Value::Null)
    }
}
