//! Weighted multi-tier draft generation.
//!
//! This module provides:
//! - Candidate and usage-pool data models
//! - The [`DraftGenerator`], which samples distinct candidates from several
//!   tiers at once
//!
//! ## Example
//!
//! ```
//! use draft_league::draft::{CandidatePool, DraftGenerator, SpeciesTemplate, TierDraw};
//! use rand::{SeedableRng, rngs::StdRng};
//! use std::collections::BTreeSet;
//!
//! let ou: CandidatePool = [
//!     (0.4, SpeciesTemplate::new("Landorus-Therian").with_moves([(0.9, "Earthquake")])),
//!     (0.3, SpeciesTemplate::new("Clefable").with_moves([(0.8, "Moonblast")])),
//! ]
//! .into_iter()
//! .collect();
//!
//! let tiers = [TierDraw { tier: "gen8ou", pool: &ou, scale: 1.0 }];
//! let mut rng = StdRng::seed_from_u64(1);
//! let drawn = DraftGenerator::default()
//!     .draw(2, &tiers, &BTreeSet::new(), &mut rng)
//!     .unwrap();
//! assert_eq!(drawn.len(), 2);
//! ```

pub mod errors;
pub mod generator;
pub mod models;

pub use errors::{DraftError, DraftResult};
pub use generator::{
    DEFAULT_CUTOFF, DEFAULT_SHINY_RATE, DraftGenerator, DraftWeight, MIN_CUTOFF,
    MOVES_PER_CANDIDATE, TierDraw,
};
pub use models::{
    Candidate, CandidatePool, Gender, PoolEntry, SpeciesId, SpeciesTemplate, Spread, TierId,
    Weighted,
};
