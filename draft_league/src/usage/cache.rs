//! Directory-backed usage source with an in-process cache.

use super::{UsageSource, is_valid_tier_name};
use crate::draft::{CandidatePool, DraftError, DraftResult, TierId};
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    sync::{Arc, PoisonError, RwLock},
};

/// Usage pools stored as `<root>/<tier>.json`.
///
/// Each file holds a [`CandidatePool`] as JSON. A tier is read from disk the
/// first time it is requested and served from memory afterwards. The store
/// resolves tiers on the blocking pool before a writer takes its lease;
/// [`UsageDirectory::preload`] warms the cache up front.
#[derive(Debug)]
pub struct UsageDirectory {
    root: PathBuf,
    cache: RwLock<HashMap<TierId, Arc<CandidatePool>>>,
}

impl UsageDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Read the given tiers into the cache
    ///
    /// # Returns
    ///
    /// * `DraftResult<usize>` - Number of species loaded across all tiers
    pub fn preload<I, S>(&self, tiers: I) -> DraftResult<usize>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut species = 0;
        for tier in tiers {
            species += self.weights_for_tier(tier.as_ref())?.len();
        }
        Ok(species)
    }

    /// Number of cached tiers
    pub fn cached_tiers(&self) -> usize {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn load(&self, tier: &str) -> DraftResult<CandidatePool> {
        let path = self.root.join(format!("{tier}.json"));
        let unavailable = || DraftError::TierUnavailable(tier.to_string());

        let raw = fs::read_to_string(&path).map_err(|e| {
            log::warn!("Usage data for {} unreadable at {}: {}", tier, path.display(), e);
            unavailable()
        })?;
        let parsed: CandidatePool = serde_json::from_str(&raw).map_err(|e| {
            log::warn!("Usage data for {} malformed at {}: {}", tier, path.display(), e);
            unavailable()
        })?;

        // Re-key by the template's own species id
        let pool: CandidatePool = parsed
            .entries()
            .map(|entry| (entry.weight, entry.template.clone()))
            .collect();

        log::info!("Loaded {} species for tier {}", pool.len(), tier);
        Ok(pool)
    }
}

impl UsageSource for UsageDirectory {
    fn weights_for_tier(&self, tier: &str) -> DraftResult<Arc<CandidatePool>> {
        if !is_valid_tier_name(tier) {
            return Err(DraftError::TierUnavailable(tier.to_string()));
        }

        if let Some(pool) = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(tier)
        {
            return Ok(Arc::clone(pool));
        }

        let pool = Arc::new(self.load(tier)?);
        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        // A concurrent loader may have won the race; keep its copy
        Ok(Arc::clone(cache.entry(tier.to_string()).or_insert(pool)))
    }
}
