//! Tournament error types.

use super::models::PlayerStatus;
use crate::draft::DraftError;
use serde::{Deserialize, Serialize};
use std::{fmt, io};
use thiserror::Error;

/// Tournament and store errors
#[derive(Debug, Error)]
pub enum TournamentError {
    /// Tournament name already in use
    #[error("Tournament \"{0}\" already exists")]
    NameTaken(String),

    /// Player id already registered in the tournament
    #[error("Player \"{player}\" is already registered in \"{tournament}\"")]
    PlayerIdTaken { tournament: String, player: String },

    /// No tournament with this name
    #[error("Tournament \"{0}\" not found")]
    TournamentNotFound(String),

    /// No player with this id in the tournament
    #[error("Player \"{player}\" not found in \"{tournament}\"")]
    PlayerNotFound { tournament: String, player: String },

    /// Operation not allowed in the player's current phase
    #[error("Player \"{player}\" is {actual}, expected {expected}")]
    IllegalState {
        player: String,
        expected: String,
        actual: PlayerStatus,
    },

    /// Tournament was already started
    #[error("Tournament \"{0}\" already started")]
    AlreadyStarted(String),

    /// A player cannot battle themselves
    #[error("Player \"{0}\" cannot battle themselves")]
    SelfPairing(String),

    /// Selection of candidate ids is the wrong size, unknown, or repeated
    #[error("Invalid choice: {0}")]
    InvalidChoice(String),

    /// Tournament name or settings rejected
    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    /// Draft generation failed
    #[error(transparent)]
    Draft(#[from] DraftError),

    /// Snapshot or snapshot document failed validation or decoding
    #[error("Corrupt snapshot: {0}")]
    CorruptSnapshot(String),

    /// Snapshot document I/O failure
    #[error("Persistence error: {0}")]
    Persistence(#[from] io::Error),
}

/// Coarse error classification exposed to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NameTaken,
    NotFound,
    IllegalState,
    InvalidChoice,
    InsufficientCandidates,
    TierUnavailable,
    InvalidSettings,
    CorruptSnapshot,
    Persistence,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            ErrorKind::NameTaken => "name_taken",
            ErrorKind::NotFound => "not_found",
            ErrorKind::IllegalState => "illegal_state",
            ErrorKind::InvalidChoice => "invalid_choice",
            ErrorKind::InsufficientCandidates => "insufficient_candidates",
            ErrorKind::TierUnavailable => "tier_unavailable",
            ErrorKind::InvalidSettings => "invalid_settings",
            ErrorKind::CorruptSnapshot => "corrupt_snapshot",
            ErrorKind::Persistence => "persistence",
        };
        write!(f, "{kind}")
    }
}

/// Renderable error: kind plus client-safe message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub kind: ErrorKind,
    pub message: String,
}

impl TournamentError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TournamentError::NameTaken(_) | TournamentError::PlayerIdTaken { .. } => {
                ErrorKind::NameTaken
            }
            TournamentError::TournamentNotFound(_)
            | TournamentError::PlayerNotFound { .. }
            | TournamentError::Draft(DraftError::SpeciesNotFound { .. }) => ErrorKind::NotFound,
            TournamentError::IllegalState { .. }
            | TournamentError::AlreadyStarted(_)
            | TournamentError::SelfPairing(_) => ErrorKind::IllegalState,
            TournamentError::InvalidChoice(_) => ErrorKind::InvalidChoice,
            TournamentError::InvalidSettings(_) => ErrorKind::InvalidSettings,
            TournamentError::Draft(DraftError::InsufficientCandidates { .. }) => {
                ErrorKind::InsufficientCandidates
            }
            TournamentError::Draft(DraftError::TierUnavailable(_)) => ErrorKind::TierUnavailable,
            TournamentError::Draft(DraftError::InvalidSpread(_))
            | TournamentError::CorruptSnapshot(_) => ErrorKind::CorruptSnapshot,
            TournamentError::Persistence(_) => ErrorKind::Persistence,
        }
    }

    /// Get a client-safe error message
    ///
    /// I/O errors are replaced with a generic message so file paths and OS
    /// details stay out of client output.
    pub fn client_message(&self) -> String {
        match self {
            TournamentError::Persistence(_) => "Internal storage error".to_string(),
            _ => self.to_string(),
        }
    }

    pub fn report(&self) -> ErrorReport {
        ErrorReport {
            kind: self.kind(),
            message: self.client_message(),
        }
    }

    pub(crate) fn illegal_state(
        player: &str,
        expected: impl Into<String>,
        actual: PlayerStatus,
    ) -> Self {
        TournamentError::IllegalState {
            player: player.to_string(),
            expected: expected.into(),
            actual,
        }
    }
}

/// Result type for tournament operations
pub type TournamentResult<T> = Result<T, TournamentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(
            TournamentError::NameTaken("cup1".into()).kind(),
            ErrorKind::NameTaken
        );
        assert_eq!(
            TournamentError::PlayerNotFound {
                tournament: "cup1".into(),
                player: "p9".into()
            }
            .kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            TournamentError::SelfPairing("p1".into()).kind(),
            ErrorKind::IllegalState
        );
        assert_eq!(
            TournamentError::from(DraftError::InsufficientCandidates {
                requested: 9,
                available: 2
            })
            .kind(),
            ErrorKind::InsufficientCandidates
        );
        assert_eq!(
            TournamentError::from(DraftError::TierUnavailable("gen8lc".into())).kind(),
            ErrorKind::TierUnavailable
        );
        assert_eq!(
            TournamentError::from(DraftError::SpeciesNotFound {
                tier: "gen8ou".into(),
                species: "Pikachu".into()
            })
            .kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn test_client_message_hides_io_details() {
        let err = TournamentError::from(io::Error::new(
            io::ErrorKind::PermissionDenied,
            "/srv/draft/tournaments.json: permission denied",
        ));
        let report = err.report();

        assert_eq!(report.kind, ErrorKind::Persistence);
        assert!(!report.message.contains("/srv"));
    }

    #[test]
    fn test_report_serializes_snake_case_kind() {
        let err = TournamentError::InvalidChoice("expected 2 ids, got 3".into());
        let json = serde_json::to_value(err.report()).unwrap();

        assert_eq!(json["kind"], "invalid_choice");
        assert_eq!(json["message"], "Invalid choice: expected 2 ids, got 3");
        assert_eq!(ErrorKind::InvalidChoice.to_string(), "invalid_choice");
    }
}
