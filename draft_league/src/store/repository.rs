//! Snapshot document persistence.
//!
//! The store persists its whole directory as one JSON document. Repositories
//! are trait objects so tests can swap the file for memory.

use crate::tournament::{TournamentError, TournamentResult, TournamentSnapshot};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{
    io,
    path::{Path, PathBuf},
    sync::atomic::{AtomicUsize, Ordering},
};
use tokio::sync::Mutex;

/// Persisted form of the whole store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotDocument {
    #[serde(default = "Utc::now")]
    pub saved_at: DateTime<Utc>,
    #[serde(default)]
    pub tournaments: Vec<TournamentSnapshot>,
}

impl SnapshotDocument {
    pub fn empty() -> Self {
        Self {
            saved_at: Utc::now(),
            tournaments: Vec::new(),
        }
    }
}

/// Trait for snapshot document storage
#[async_trait]
pub trait SnapshotRepository: Send + Sync {
    /// Load the document; an absent document loads as empty
    async fn load(&self) -> TournamentResult<SnapshotDocument>;

    /// Replace the stored document
    async fn save(&self, document: &SnapshotDocument) -> TournamentResult<()>;
}

/// JSON file repository.
///
/// Saves write a sibling temporary file and rename it over the target, so a
/// crash mid-write never leaves a truncated document behind.
#[derive(Debug, Clone)]
pub struct JsonFileRepository {
    path: PathBuf,
}

impl JsonFileRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "tournaments.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl SnapshotRepository for JsonFileRepository {
    async fn load(&self) -> TournamentResult<SnapshotDocument> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::info!(
                    "No snapshot document at {}, starting empty",
                    self.path.display()
                );
                return Ok(SnapshotDocument::empty());
            }
            Err(e) => return Err(e.into()),
        };

        serde_json::from_slice(&raw).map_err(|e| {
            TournamentError::CorruptSnapshot(format!("{}: {}", self.path.display(), e))
        })
    }

    async fn save(&self, document: &SnapshotDocument) -> TournamentResult<()> {
        let encoded = serde_json::to_vec_pretty(document).map_err(io::Error::other)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let temp = self.temp_path();
        tokio::fs::write(&temp, &encoded).await?;
        tokio::fs::rename(&temp, &self.path).await?;

        log::debug!(
            "Saved {} tournaments to {}",
            document.tournaments.len(),
            self.path.display()
        );
        Ok(())
    }
}

/// In-memory repository for tests and embedding
#[derive(Debug, Default)]
pub struct MemoryRepository {
    document: Mutex<Option<SnapshotDocument>>,
    saves: AtomicUsize,
    failures_left: AtomicUsize,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(document: SnapshotDocument) -> Self {
        Self {
            document: Mutex::new(Some(document)),
            ..Self::default()
        }
    }

    /// Last saved document, if any
    pub async fn document(&self) -> Option<SnapshotDocument> {
        self.document.lock().await.clone()
    }

    /// Number of successful saves
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Make the next `count` saves fail with an I/O error
    ///
    /// Only built for unit tests and under the `test-util` feature.
    #[cfg(any(test, feature = "test-util"))]
    pub fn fail_next_saves(&self, count: usize) {
        self.failures_left.store(count, Ordering::SeqCst);
    }
}

#[async_trait]
impl SnapshotRepository for MemoryRepository {
    async fn load(&self) -> TournamentResult<SnapshotDocument> {
        Ok(self
            .document
            .lock()
            .await
            .clone()
            .unwrap_or_else(SnapshotDocument::empty))
    }

    async fn save(&self, document: &SnapshotDocument) -> TournamentResult<()> {
        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(io::Error::other("injected save failure").into());
        }

        *self.document.lock().await = Some(document.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
