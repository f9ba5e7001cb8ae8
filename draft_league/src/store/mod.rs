//! Concurrent tournament store.
//!
//! This module provides:
//! - A directory of tournaments keyed by name behind an async read/write gate
//! - Per-tournament writer leases with commit-on-success
//! - Lock-free point-in-time read handles
//! - Whole-store persistence through a [`SnapshotRepository`]
//!
//! ## Example
//!
//! ```no_run
//! use draft_league::store::{JsonFileRepository, StoreConfig, StoreOptions, TournamentStore};
//! use draft_league::tournament::SettingsOverrides;
//! use draft_league::usage::UsageDirectory;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = StoreConfig::from_env(None, None)?;
//!     let store = TournamentStore::open(
//!         Arc::new(JsonFileRepository::new(&config.state_file)),
//!         Arc::new(UsageDirectory::new(&config.usage_dir)),
//!         StoreOptions { generator: config.generator(), seed: config.seed },
//!     )
//!     .await?;
//!
//!     store.create_tournament("cup1", SettingsOverrides::default()).await?;
//!     store.register_player("cup1", "ash").await?;
//!     store.start_tournament("cup1").await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod handles;
pub mod manager;
pub mod ops;
pub mod repository;

pub use config::{ConfigError, StoreConfig};
pub use handles::{ReadHandle, WriterLease};
pub use manager::{StoreOptions, TournamentStore};
pub use repository::{JsonFileRepository, MemoryRepository, SnapshotDocument, SnapshotRepository};
