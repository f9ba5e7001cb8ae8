//! Drafting tournaments.
//!
//! This module provides:
//! - The [`Player`] state machine (draft, choose, battle, steal, swap)
//! - The [`Tournament`] aggregate, which owns players and the species ledger
//! - Settings, snapshots and the error taxonomy shared with the store
//!
//! ## Example
//!
//! ```
//! use draft_league::draft::{CandidatePool, DraftGenerator, SpeciesTemplate};
//! use draft_league::tournament::{
//!     DraftContext, PlayerStatus, SettingsOverrides, Tournament, TournamentSettings,
//! };
//! use draft_league::usage::StaticUsage;
//! use rand::{SeedableRng, rngs::StdRng};
//!
//! let pool: CandidatePool = (0..10)
//!     .map(|i| (0.1, SpeciesTemplate::new(format!("Mon{i}"))))
//!     .collect();
//! let usage = StaticUsage::new().with_tier("gen8ou", pool);
//! let generator = DraftGenerator::default();
//! let mut rng = StdRng::seed_from_u64(7);
//! let mut ctx = DraftContext::new(&usage, &generator, &mut rng);
//!
//! let settings = TournamentSettings::from_overrides(
//!     SettingsOverrides::with_sizes(2, 3).with_tier("gen8ou", 1.0),
//! );
//! let mut tour = Tournament::new("cup1", settings).unwrap();
//! tour.add_player("p1", &mut ctx).unwrap();
//! tour.start(&mut ctx).unwrap();
//!
//! assert_eq!(tour.player("p1").unwrap().status, PlayerStatus::ChoosingPokemon);
//! ```

pub mod errors;
pub mod models;
pub mod player;
pub mod state;

pub use errors::{ErrorKind, ErrorReport, TournamentError, TournamentResult};
pub use models::{
    PlayerId, PlayerStatus, SettingsOverrides, TournamentSettings, TournamentSnapshot,
};
pub use player::Player;
pub use state::{DraftContext, Tournament};
