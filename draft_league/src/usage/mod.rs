//! Usage statistics lookup.
//!
//! Tournaments never compute usage weights themselves; they consume them
//! through [`UsageSource`]. Two sources are provided:
//! - [`StaticUsage`]: pools held in memory, for tests and embedding
//! - [`UsageDirectory`]: one JSON file per tier, read once and cached

pub mod cache;

pub use cache::UsageDirectory;

use crate::draft::{CandidatePool, DraftError, DraftResult, TierId};
use std::{collections::HashMap, sync::Arc};

/// Per-tier usage lookup
pub trait UsageSource: Send + Sync {
    /// Candidate pool of a tier
    ///
    /// # Errors
    ///
    /// * `DraftError::TierUnavailable` - no data for this tier
    fn weights_for_tier(&self, tier: &str) -> DraftResult<Arc<CandidatePool>>;
}

/// Check that a tier identifier is non-empty and made of `[a-z0-9_-]`
pub fn is_valid_tier_name(tier: &str) -> bool {
    !tier.is_empty()
        && tier
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_' || b == b'-')
}

/// In-memory usage pools
#[derive(Debug, Clone, Default)]
pub struct StaticUsage {
    tiers: HashMap<TierId, Arc<CandidatePool>>,
}

impl StaticUsage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tier(mut self, tier: impl Into<TierId>, pool: CandidatePool) -> Self {
        self.insert(tier, pool);
        self
    }

    pub fn insert(&mut self, tier: impl Into<TierId>, pool: CandidatePool) {
        self.insert_shared(tier, Arc::new(pool));
    }

    /// Insert a pool already shared with another source
    pub fn insert_shared(&mut self, tier: impl Into<TierId>, pool: Arc<CandidatePool>) {
        self.tiers.insert(tier.into(), pool);
    }

    /// Known tiers, sorted
    pub fn tiers(&self) -> Vec<&str> {
        let mut tiers: Vec<&str> = self.tiers.keys().map(String::as_str).collect();
        tiers.sort_unstable();
        tiers
    }
}

impl UsageSource for StaticUsage {
    fn weights_for_tier(&self, tier: &str) -> DraftResult<Arc<CandidatePool>> {
        self.tiers
            .get(tier)
            .cloned()
            .ok_or_else(|| DraftError::TierUnavailable(tier.to_string()))
    }
}
