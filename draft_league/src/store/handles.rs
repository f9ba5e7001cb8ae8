//! Scoped access to a stored tournament.

use super::manager::{Slot, TournamentStore};
use crate::tournament::{Tournament, TournamentError, TournamentResult, TournamentSnapshot};
use std::{
    ops::{Deref, DerefMut},
    sync::Arc,
};
use tokio::sync::OwnedMutexGuard;

/// Read-only view of the latest committed snapshot.
///
/// Holds no lock; later commits are not reflected.
#[derive(Debug, Clone)]
pub struct ReadHandle {
    snapshot: Arc<TournamentSnapshot>,
}

impl ReadHandle {
    pub(crate) fn new(snapshot: Arc<TournamentSnapshot>) -> Self {
        Self { snapshot }
    }

    pub fn into_snapshot(self) -> TournamentSnapshot {
        Arc::unwrap_or_clone(self.snapshot)
    }
}

impl Deref for ReadHandle {
    type Target = TournamentSnapshot;

    fn deref(&self) -> &Self::Target {
        &self.snapshot
    }
}

/// Exclusive writer access to one tournament.
///
/// Mutations go to a private copy. [`WriterLease::commit`] publishes the copy
/// and persists the store; dropping the lease without committing releases it
/// and throws the copy away.
pub struct WriterLease<'s> {
    store: &'s TournamentStore,
    slot: Arc<Slot>,
    tournament: Tournament,
    guard: Option<OwnedMutexGuard<()>>,
}

impl<'s> WriterLease<'s> {
    pub(crate) fn new(
        store: &'s TournamentStore,
        slot: Arc<Slot>,
        tournament: Tournament,
        guard: OwnedMutexGuard<()>,
    ) -> Self {
        Self {
            store,
            slot,
            tournament,
            guard: Some(guard),
        }
    }

    /// Publish the changes, release the lease, then persist.
    ///
    /// # Errors
    ///
    /// * `TournamentError::TournamentNotFound` - the tournament was cleared while leased;
    ///   nothing is written
    pub async fn commit(mut self) -> TournamentResult<TournamentSnapshot> {
        let snapshot = self.tournament.snapshot();

        {
            let directory = self.store.directory.read().await;
            let still_listed = directory
                .get(&snapshot.name)
                .is_some_and(|current| Arc::ptr_eq(current, &self.slot));
            if !still_listed {
                return Err(TournamentError::TournamentNotFound(snapshot.name));
            }
            self.slot.replace(snapshot.clone());
        }

        self.guard = None;
        log::debug!("Committed {}", snapshot.name);

        self.store.persist().await;
        Ok(snapshot)
    }
}

impl Deref for WriterLease<'_> {
    type Target = Tournament;

    fn deref(&self) -> &Self::Target {
        &self.tournament
    }
}

impl DerefMut for WriterLease<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.tournament
    }
}

impl Drop for WriterLease<'_> {
    fn drop(&mut self) {
        if self.guard.is_some() {
            log::debug!(
                "Writer lease on {} released without commit",
                self.tournament.name()
            );
        }
    }
}
