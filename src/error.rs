//! Error types for the ladder
//!
//! This module defines the error taxonomy shared by the rating engine,
//! the storage backends and the ladder service.

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, LadderError>;

/// Broad error category, used by callers to decide how to react
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed request; the caller must resubmit a corrected one
    Validation,
    /// No persisted document exists yet
    NotFound,
    /// Local or remote I/O failed
    Storage,
    /// Invalid configuration
    Configuration,
}

/// Custom error types for specific ladder scenarios
#[derive(Debug, thiserror::Error)]
pub enum LadderError {
    #[error("Player name must not be empty")]
    EmptyPlayerName,

    #[error("Duplicate player: {name}")]
    DuplicatePlayer { name: String },

    #[error("Unknown player: {name}")]
    UnknownPlayer { name: String },

    #[error("A match needs at least 2 players, got {count}")]
    TooFewParticipants { count: usize },

    #[error("Player {name} appears more than once in the match")]
    DuplicateParticipant { name: String },

    #[error("Invalid rating: {reason}")]
    InvalidRating { reason: String },

    #[error("No stored document for {key}")]
    NotFound { key: String },

    #[error("Revision conflict while writing {key}")]
    Conflict { key: String },

    #[error("Storage failure in {backend} backend: {message}")]
    Storage {
        backend: &'static str,
        message: String,
    },

    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl LadderError {
    /// Category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            LadderError::EmptyPlayerName
            | LadderError::DuplicatePlayer { .. }
            | LadderError::UnknownPlayer { .. }
            | LadderError::TooFewParticipants { .. }
            | LadderError::DuplicateParticipant { .. }
            | LadderError::InvalidRating { .. } => ErrorKind::Validation,
            LadderError::NotFound { .. } => ErrorKind::NotFound,
            LadderError::Conflict { .. }
            | LadderError::Storage { .. }
            | LadderError::Serialization(_) => ErrorKind::Storage,
            LadderError::Configuration { .. } => ErrorKind::Configuration,
        }
    }

    pub fn is_validation(&self) -> bool {
        self.kind() == ErrorKind::Validation
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    pub(crate) fn storage(backend: &'static str, message: impl Into<String>) -> Self {
        LadderError::Storage {
            backend,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(LadderError::EmptyPlayerName.kind(), ErrorKind::Validation);
        assert_eq!(
            LadderError::DuplicateParticipant {
                name: "Sam".to_string()
            }
            .kind(),
            ErrorKind::Validation
        );
        assert!(LadderError::NotFound {
            key: "ratings".to_string()
        }
        .is_not_found());
        assert_eq!(
            LadderError::Conflict {
                key: "history".to_string()
            }
            .kind(),
            ErrorKind::Storage
        );
        assert_eq!(
            LadderError::storage("local", "disk full").kind(),
            ErrorKind::Storage
        );
    }

    #[test]
    fn test_error_messages() {
        let err = LadderError::TooFewParticipants { count: 1 };
        assert_eq!(err.to_string(), "A match needs at least 2 players, got 1");

        let err = LadderError::storage("remote", "HTTP 500");
        assert_eq!(
            err.to_string(),
            "Storage failure in remote backend: HTTP 500"
        );
    }
}
