//! Skill Ladder - TrueSkill ratings for free-for-all games
//!
//! This crate keeps a ladder of players whose skill is tracked as a
//! Gaussian belief, updates it from finishing orders with the TrueSkill
//! algorithm, and persists both the current ratings and the full rating
//! history to a remote versioned file store with a local-file fallback.

pub mod config;
pub mod error;
pub mod rating;
pub mod service;
pub mod storage;
pub mod types;

// Re-export commonly used types and traits
pub use error::{ErrorKind, LadderError, Result};
pub use types::*;

// Re-export key components
pub use rating::{RatingCalculator, TrueSkillCalculator, TrueSkillSettings};
pub use service::LadderService;
pub use storage::{FallbackStore, Persistence, StorageBackend};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
