//! # Draft League
//!
//! A multiplayer drafting tournament engine. Players are handed weighted-random
//! offers of candidate team members drawn from several usage tiers, choose a
//! team, battle, and after each battle the winner may steal from the loser
//! while the loser rebuilds.
//!
//! ## Architecture
//!
//! Leaves first:
//!
//! - **DraftGenerator**: pure weighted sampling of distinct candidates from
//!   several tiers, with an exclusion ledger and injected randomness
//! - **UsageSource**: per-tier usage pools consumed through a lookup trait
//! - **Player**: per-participant state machine
//! - **Tournament**: players, settings and the ledger of offered species
//! - **TournamentStore**: named tournaments behind a directory gate, with
//!   per-tournament writer leases that commit on success and persist the
//!   whole store as one JSON document
//!
//! ## Core Modules
//!
//! - [`draft`]: candidate models and the draft generator
//! - [`usage`]: usage pool lookup (in-memory and directory-backed)
//! - [`tournament`]: player state machine and tournament aggregate
//! - [`store`]: concurrent store, leases, persistence and configuration

/// Candidate models and weighted multi-tier drafting.
pub mod draft;
pub use draft::{Candidate, CandidatePool, DraftError, DraftGenerator, SpeciesTemplate};

/// Usage statistics lookup.
pub mod usage;
pub use usage::{StaticUsage, UsageDirectory, UsageSource};

/// Players and tournaments.
pub mod tournament;
pub use tournament::{
    ErrorKind, Player, PlayerStatus, SettingsOverrides, Tournament, TournamentError,
    TournamentResult, TournamentSettings, TournamentSnapshot,
};

/// Concurrent tournament store.
pub mod store;
pub use store::{StoreConfig, StoreOptions, TournamentStore};
