//! Tournament store: the directory of tournaments and its locking discipline.
//!
//! Lock order is gate, then lease, never the reverse: a lease is always
//! acquired after the gate guard used to find its slot has been dropped.

use super::{
    handles::{ReadHandle, WriterLease},
    repository::{MemoryRepository, SnapshotDocument, SnapshotRepository},
};
use crate::{
    draft::{CandidatePool, DraftError, DraftGenerator, DraftResult, TierId},
    tournament::{
        DraftContext, Tournament, TournamentError, TournamentResult, TournamentSnapshot,
    },
    usage::{StaticUsage, UsageSource},
};
use chrono::Utc;
use rand::{RngCore, SeedableRng, rngs::StdRng};
use std::{
    collections::HashMap,
    sync::{Arc, PoisonError},
};
use tokio::sync::{Mutex, RwLock};

/// Store construction options
#[derive(Debug, Clone, Default)]
pub struct StoreOptions {
    pub generator: DraftGenerator,
    /// Draft RNG seed; `None` seeds from the OS
    pub seed: Option<u64>,
}

/// One tournament's entry in the directory
#[derive(Debug)]
pub(crate) struct Slot {
    /// Writer lease, held for the whole scope of a writer
    pub(crate) lease: Arc<Mutex<()>>,
    /// Latest committed snapshot
    snapshot: std::sync::RwLock<Arc<TournamentSnapshot>>,
}

impl Slot {
    fn new(snapshot: TournamentSnapshot) -> Self {
        Self {
            lease: Arc::new(Mutex::new(())),
            snapshot: std::sync::RwLock::new(Arc::new(snapshot)),
        }
    }

    pub(crate) fn latest(&self) -> Arc<TournamentSnapshot> {
        Arc::clone(&self.snapshot.read().unwrap_or_else(PoisonError::into_inner))
    }

    pub(crate) fn replace(&self, snapshot: TournamentSnapshot) {
        *self.snapshot.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(snapshot);
    }
}

/// Concurrent directory of named tournaments
pub struct TournamentStore {
    /// Directory gate: shared for lookups, exclusive for create and clear
    pub(crate) directory: RwLock<HashMap<String, Arc<Slot>>>,

    /// Snapshot document storage
    repository: Arc<dyn SnapshotRepository>,

    /// Usage pools for drafts
    usage: Arc<dyn UsageSource>,

    /// Draft generator
    generator: DraftGenerator,

    /// Parent RNG; every writer forks a child from it
    rng: std::sync::Mutex<StdRng>,

    /// Serializes document writes
    persist_lock: Mutex<()>,
}

impl TournamentStore {
    /// Open a store over the document held by `repository`
    ///
    /// # Errors
    ///
    /// * `TournamentError::Persistence` - the document cannot be read
    /// * `TournamentError::CorruptSnapshot` - the document or a snapshot in it is invalid
    pub async fn open(
        repository: Arc<dyn SnapshotRepository>,
        usage: Arc<dyn UsageSource>,
        options: StoreOptions,
    ) -> TournamentResult<Self> {
        let document = repository.load().await?;

        let mut directory = HashMap::with_capacity(document.tournaments.len());
        for snapshot in document.tournaments {
            let tournament = Tournament::restore(snapshot)?;
            let name = tournament.name().to_string();
            let slot = Arc::new(Slot::new(tournament.into_snapshot()));
            if directory.insert(name.clone(), slot).is_some() {
                return Err(TournamentError::CorruptSnapshot(format!(
                    "tournament \"{name}\" appears twice"
                )));
            }
        }

        log::info!("Loaded {} tournaments", directory.len());
        Ok(Self::from_parts(directory, repository, usage, options))
    }

    /// Empty store backed by a [`MemoryRepository`]
    pub fn in_memory(usage: Arc<dyn UsageSource>, options: StoreOptions) -> Self {
        Self::from_parts(
            HashMap::new(),
            Arc::new(MemoryRepository::new()),
            usage,
            options,
        )
    }

    fn from_parts(
        directory: HashMap<String, Arc<Slot>>,
        repository: Arc<dyn SnapshotRepository>,
        usage: Arc<dyn UsageSource>,
        options: StoreOptions,
    ) -> Self {
        let rng = match options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        Self {
            directory: RwLock::new(directory),
            repository,
            usage,
            generator: options.generator,
            rng: std::sync::Mutex::new(rng),
            persist_lock: Mutex::new(()),
        }
    }

    pub fn generator(&self) -> &DraftGenerator {
        &self.generator
    }

    /// Point-in-time read of a tournament; never waits on a writer lease
    ///
    /// # Errors
    ///
    /// * `TournamentError::TournamentNotFound` - unknown name
    pub async fn read(&self, name: &str) -> TournamentResult<ReadHandle> {
        let slot = self.slot(name).await?;
        Ok(ReadHandle::new(slot.latest()))
    }

    /// Acquire the writer lease of a tournament.
    ///
    /// Waits for any other writer of the same tournament. The returned lease
    /// holds a private copy restored from the latest snapshot; nothing is
    /// visible to others until [`WriterLease::commit`].
    ///
    /// # Errors
    ///
    /// * `TournamentError::TournamentNotFound` - unknown name, or cleared while waiting
    /// * `TournamentError::CorruptSnapshot` - stored snapshot fails validation
    pub async fn lease(&self, name: &str) -> TournamentResult<WriterLease<'_>> {
        let slot = self.slot(name).await?;
        let guard = Arc::clone(&slot.lease).lock_owned().await;

        let latest = {
            let directory = self.directory.read().await;
            match directory.get(name) {
                Some(current) if Arc::ptr_eq(current, &slot) => current.latest(),
                _ => return Err(TournamentError::TournamentNotFound(name.to_string())),
            }
        };
        let tournament = Tournament::restore((*latest).clone())?;

        log::debug!("Writer lease acquired for {}", name);
        Ok(WriterLease::new(self, slot, tournament, guard))
    }

    /// Run `op` under the tournament's writer lease and commit if it succeeds.
    ///
    /// The operation gets a draft context with a child RNG forked from the
    /// store's generator. Its usage pools are resolved by
    /// [`TournamentStore::resolve_usage`] before the lease is requested.
    ///
    /// # Returns
    ///
    /// * `TournamentResult<TournamentSnapshot>` - The committed snapshot
    pub async fn write<F>(&self, name: &str, op: F) -> TournamentResult<TournamentSnapshot>
    where
        F: FnOnce(&mut Tournament, &mut DraftContext<'_>) -> TournamentResult<()>,
    {
        let usage = self.resolve_usage(name).await?;
        let mut lease = self.lease(name).await?;
        {
            let mut rng = self.fork_rng();
            let mut ctx = DraftContext::new(&usage, &self.generator, &mut rng);
            op(&mut *lease, &mut ctx)?;
        }
        lease.commit().await
    }

    /// Fetch the pools of every tier a tournament drafts from.
    ///
    /// Lookups run on the blocking pool while no lock is held, so a usage
    /// source that reads files never stalls a lease holder. Tiers that fail to
    /// resolve are left out and surface as `TierUnavailable` if a draw needs
    /// them.
    ///
    /// # Errors
    ///
    /// * `TournamentError::TournamentNotFound` - unknown name
    pub async fn resolve_usage(&self, name: &str) -> TournamentResult<StaticUsage> {
        let tiers: Vec<TierId> = self
            .read(name)
            .await?
            .settings
            .tiers
            .iter()
            .filter(|&(_, &scale)| scale > 0.0)
            .map(|(tier, _)| tier.clone())
            .collect();

        let mut resolved = StaticUsage::new();
        for (tier, pool) in self.lookup_tiers(tiers).await {
            match pool {
                Ok(pool) => resolved.insert_shared(tier, pool),
                Err(err) => log::debug!("Tier {} not resolved for {}: {}", tier, name, err),
            }
        }
        Ok(resolved)
    }

    /// Look up tiers through the usage source on the blocking pool
    pub(crate) async fn lookup_tiers(
        &self,
        tiers: Vec<TierId>,
    ) -> Vec<(TierId, DraftResult<Arc<CandidatePool>>)> {
        let usage = Arc::clone(&self.usage);
        let requested = tiers.clone();
        let lookup = tokio::task::spawn_blocking(move || {
            tiers
                .into_iter()
                .map(|tier| {
                    let pool = usage.weights_for_tier(&tier);
                    (tier, pool)
                })
                .collect::<Vec<_>>()
        });

        match lookup.await {
            Ok(pools) => pools,
            Err(err) => {
                log::error!("Usage lookup task failed: {}", err);
                requested
                    .into_iter()
                    .map(|tier| {
                        let unavailable = Err(DraftError::TierUnavailable(tier.clone()));
                        (tier, unavailable)
                    })
                    .collect()
            }
        }
    }

    /// Sorted names of all tournaments
    pub async fn list_tournaments(&self) -> Vec<String> {
        let mut names: Vec<String> = self.directory.read().await.keys().cloned().collect();
        names.sort_unstable();
        names
    }

    pub(crate) async fn slot(&self, name: &str) -> TournamentResult<Arc<Slot>> {
        self.directory
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| TournamentError::TournamentNotFound(name.to_string()))
    }

    pub(crate) fn fork_rng(&self) -> StdRng {
        let mut parent = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        StdRng::seed_from_u64(parent.next_u64())
    }

    /// Write the whole directory to the repository.
    ///
    /// Runs outside every lease. A failed save is retried once; failures are
    /// logged and never touch the in-memory directory.
    pub(crate) async fn persist(&self) {
        let _serial = self.persist_lock.lock().await;
        let document = self.document().await;

        if let Err(first) = self.repository.save(&document).await {
            log::warn!(
                "Saving {} tournaments failed, retrying: {}",
                document.tournaments.len(),
                first
            );
            if let Err(second) = self.repository.save(&document).await {
                log::error!("Saving tournaments failed: {}", second);
            }
        }
    }

    /// Current directory as a snapshot document, sorted by name
    pub async fn document(&self) -> SnapshotDocument {
        let mut tournaments: Vec<TournamentSnapshot> = {
            let directory = self.directory.read().await;
            directory
                .values()
                .map(|slot| (*slot.latest()).clone())
                .collect()
        };
        tournaments.sort_by(|a, b| a.name.cmp(&b.name));

        SnapshotDocument {
            saved_at: Utc::now(),
            tournaments,
        }
    }

    pub(crate) fn insert_slot(
        directory: &mut HashMap<String, Arc<Slot>>,
        snapshot: TournamentSnapshot,
    ) -> TournamentResult<()> {
        if directory.contains_key(&snapshot.name) {
            return Err(TournamentError::NameTaken(snapshot.name));
        }
        directory.insert(snapshot.name.clone(), Arc::new(Slot::new(snapshot)));
        Ok(())
    }
}
