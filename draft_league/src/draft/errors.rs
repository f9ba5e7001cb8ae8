//! Draft error types.

use thiserror::Error;

/// Draft errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DraftError {
    /// Not enough eligible species left to fill the draw
    #[error("Not enough candidates left: requested {requested}, available {available}")]
    InsufficientCandidates { requested: usize, available: usize },

    /// The usage source has no data for this tier
    #[error("Tier \"{0}\" is unavailable")]
    TierUnavailable(String),

    /// The tier has no usage entry for this species
    #[error("Species \"{species}\" not in {tier}")]
    SpeciesNotFound { tier: String, species: String },

    /// Malformed stat spread text
    #[error("Invalid spread \"{0}\"")]
    InvalidSpread(String),
}

/// Result type for draft operations
pub type DraftResult<T> = Result<T, DraftError>;
