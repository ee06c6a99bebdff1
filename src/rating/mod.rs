//! Rating engine using the TrueSkill algorithm
//!
//! This module provides the rating calculator, the in-memory Rating Store
//! and the append-only History Log.

pub mod calculator;
pub mod history;
pub mod store;
pub mod trueskill;

// Re-export commonly used types
pub use calculator::RatingCalculator;
pub use history::HistoryLog;
pub use store::RatingStore;
pub use trueskill::{TrueSkillCalculator, TrueSkillSettings};
