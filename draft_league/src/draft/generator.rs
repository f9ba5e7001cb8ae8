//! Multi-tier weighted draft generator.
//!
//! A draw turns the usage pools of several tiers into a list of distinct
//! candidates:
//!
//! 1. entries at or below the cutoff weight are dropped
//! 2. the lower half of the global weight ranking gets its weight inverted,
//!    which flattens the long tail of rarely used species
//! 3. each tier is renormalized to its configured scale
//! 4. excluded species are removed and the remainder renormalized to 1
//! 5. species are sampled without replacement, proportionally to weight
//! 6. every chosen species is rolled into a concrete [`Candidate`]

use super::{
    errors::{DraftError, DraftResult},
    models::{Candidate, CandidatePool, Gender, SpeciesId, SpeciesTemplate, Weighted},
};
use rand::Rng;
use std::collections::{BTreeSet, HashSet};

/// Minimum usage weight for a species to be draftable
pub const DEFAULT_CUTOFF: f64 = 0.03;

/// Smallest cutoff a generator accepts; keeps inverted weights finite
pub const MIN_CUTOFF: f64 = 1e-9;

/// Default probability of a shiny roll
pub const DEFAULT_SHINY_RATE: f64 = 1.0 / 4096.0;

/// Moves rolled per candidate
pub const MOVES_PER_CANDIDATE: usize = 4;

/// One tier's contribution to a draw
#[derive(Debug, Clone, Copy)]
pub struct TierDraw<'a> {
    pub tier: &'a str,
    pub pool: &'a CandidatePool,
    /// Share of the total draft probability given to this tier
    pub scale: f64,
}

/// A draftable species with its final selection probability
#[derive(Debug, Clone)]
pub struct DraftWeight<'a> {
    pub tier: &'a str,
    pub probability: f64,
    pub template: &'a SpeciesTemplate,
}

/// Draft generator configuration
#[derive(Debug, Clone, PartialEq)]
pub struct DraftGenerator {
    cutoff: f64,
    shiny_rate: f64,
}

impl Default for DraftGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_CUTOFF, DEFAULT_SHINY_RATE)
    }
}

impl DraftGenerator {
    /// Create a generator. The cutoff is floored at [`MIN_CUTOFF`] and the
    /// shiny rate clamped to `[0, 1]`.
    pub fn new(cutoff: f64, shiny_rate: f64) -> Self {
        let shiny_rate = if shiny_rate.is_nan() {
            0.0
        } else {
            shiny_rate.clamp(0.0, 1.0)
        };

        Self {
            cutoff: cutoff.max(MIN_CUTOFF),
            shiny_rate,
        }
    }

    pub fn cutoff(&self) -> f64 {
        self.cutoff
    }

    pub fn shiny_rate(&self) -> f64 {
        self.shiny_rate
    }

    /// Compute the final selection probabilities of every draftable species.
    ///
    /// Probabilities of the returned entries sum to 1 (or the list is empty).
    /// A species listed in several tiers appears once per tier.
    pub fn weigh<'a>(
        &self,
        tiers: &[TierDraw<'a>],
        excluded: &BTreeSet<SpeciesId>,
    ) -> Vec<DraftWeight<'a>> {
        let mut weights: Vec<(usize, f64, &'a SpeciesTemplate)> = Vec::new();
        for (tier_idx, tier) in tiers.iter().enumerate() {
            let pool: &'a CandidatePool = tier.pool;
            weights.extend(
                pool.entries()
                    .filter(|entry| entry.weight.is_finite() && entry.weight > self.cutoff)
                    .map(|entry| (tier_idx, entry.weight, &entry.template)),
            );
        }

        // Lower half of the global ranking, heaviest first; ties keep tier order.
        let mut ranking: Vec<usize> = (0..weights.len()).collect();
        ranking.sort_by(|&a, &b| weights[b].1.total_cmp(&weights[a].1));
        let upper_half = weights.len() - weights.len() / 2;
        for &idx in &ranking[upper_half..] {
            weights[idx].1 = weights[idx].1.recip();
        }

        let mut tier_sums = vec![0.0; tiers.len()];
        for &(tier_idx, weight, _) in &weights {
            tier_sums[tier_idx] += weight;
        }
        for entry in &mut weights {
            let sum = tier_sums[entry.0];
            let scale = tiers[entry.0].scale.max(0.0);
            entry.1 = if sum > 0.0 { entry.1 * scale / sum } else { 0.0 };
        }

        weights.retain(|(_, weight, template)| {
            weight.is_finite() && *weight > 0.0 && !excluded.contains(&template.species)
        });

        let total: f64 = weights.iter().map(|(_, weight, _)| weight).sum();

        weights
            .into_iter()
            .map(|(tier_idx, weight, template)| DraftWeight {
                tier: tiers[tier_idx].tier,
                probability: weight / total,
                template,
            })
            .collect()
    }

    /// Draw `count` candidates of distinct species.
    ///
    /// # Errors
    ///
    /// * `DraftError::InsufficientCandidates` - fewer than `count` draftable species
    pub fn draw<R: Rng + ?Sized>(
        &self,
        count: usize,
        tiers: &[TierDraw<'_>],
        excluded: &BTreeSet<SpeciesId>,
        rng: &mut R,
    ) -> DraftResult<Vec<Candidate>> {
        let weighted = self.weigh(tiers, excluded);

        let available = weighted
            .iter()
            .map(|w| w.template.species.as_str())
            .collect::<HashSet<_>>()
            .len();
        if available < count {
            return Err(DraftError::InsufficientCandidates {
                requested: count,
                available,
            });
        }

        let mut pool = WeightedPool::new(weighted.into_iter().map(|w| (w.probability, w.template)));
        let mut chosen: Vec<&SpeciesTemplate> = Vec::with_capacity(count);
        while chosen.len() < count {
            let template = pool.take(rng).ok_or(DraftError::InsufficientCandidates {
                requested: count,
                available: chosen.len(),
            })?;
            pool.remove_where(|other| other.species == template.species);
            chosen.push(template);
        }

        Ok(chosen
            .into_iter()
            .map(|template| self.materialize(template, rng))
            .collect())
    }

    /// Roll one candidate from a single tier: the named species, or a species
    /// picked uniformly when `species` is `None`. Usage weights and the cutoff
    /// play no part.
    ///
    /// # Errors
    ///
    /// * `DraftError::SpeciesNotFound` - the named species is not in the pool
    /// * `DraftError::InsufficientCandidates` - the pool is empty
    pub fn roll<R: Rng + ?Sized>(
        &self,
        tier: &str,
        pool: &CandidatePool,
        species: Option<&str>,
        rng: &mut R,
    ) -> DraftResult<Candidate> {
        let entry = match species {
            Some(species) => pool.get(species).ok_or_else(|| DraftError::SpeciesNotFound {
                tier: tier.to_string(),
                species: species.to_string(),
            })?,
            None if pool.is_empty() => {
                return Err(DraftError::InsufficientCandidates {
                    requested: 1,
                    available: 0,
                });
            }
            None => {
                let idx = rng.random_range(0..pool.len());
                pool.entries()
                    .nth(idx)
                    .ok_or(DraftError::InsufficientCandidates {
                        requested: 1,
                        available: 0,
                    })?
            }
        };

        Ok(self.materialize(&entry.template, rng))
    }

    /// Roll a concrete candidate from a species template
    pub fn materialize<R: Rng + ?Sized>(
        &self,
        template: &SpeciesTemplate,
        rng: &mut R,
    ) -> Candidate {
        let ability = pick_distinct(&template.abilities, 1, rng).pop();
        let item = pick_distinct(&template.items, 1, rng).pop();
        let spread = pick_distinct(&template.spreads, 1, rng).pop();
        let moves = pick_distinct(&template.moves, MOVES_PER_CANDIDATE, rng);

        let gender = template.male_ratio.map(|ratio| {
            if rng.random::<f64>() < ratio {
                Gender::Male
            } else {
                Gender::Female
            }
        });
        let shiny = rng.random::<f64>() < self.shiny_rate;

        Candidate {
            species: template.species.clone(),
            moves,
            ability,
            item,
            spread,
            gender,
            shiny,
        }
    }
}

/// Weighted draw of up to `n` distinct values
fn pick_distinct<T, R>(options: &[Weighted<T>], n: usize, rng: &mut R) -> Vec<T>
where
    T: Clone + PartialEq,
    R: Rng + ?Sized,
{
    let mut pool = WeightedPool::new(options.iter().map(|o| (o.weight, &o.value)));
    let mut picked = Vec::with_capacity(n);
    while picked.len() < n {
        let Some(value) = pool.take(rng) else {
            break;
        };
        pool.remove_where(|other| *other == value);
        picked.push(value.clone());
    }
    picked
}

/// Items with selection weights, sampled without replacement.
///
/// Each pick builds the prefix sums of the remaining weights, draws uniformly
/// in `[0, total)` and binary searches for the first prefix sum above the draw.
#[derive(Debug, Clone)]
pub(crate) struct WeightedPool<T> {
    entries: Vec<(f64, T)>,
}

impl<T> WeightedPool<T> {
    /// Build a pool, dropping non-positive and non-finite weights
    pub(crate) fn new(items: impl IntoIterator<Item = (f64, T)>) -> Self {
        Self {
            entries: items
                .into_iter()
                .filter(|(weight, _)| weight.is_finite() && *weight > 0.0)
                .collect(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    fn pick_index<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<usize> {
        let mut running = 0.0;
        let prefix: Vec<f64> = self
            .entries
            .iter()
            .map(|(weight, _)| {
                running += weight;
                running
            })
            .collect();

        let total = *prefix.last()?;
        if total <= 0.0 {
            return None;
        }

        let target = rng.random::<f64>() * total;
        let idx = prefix.partition_point(|&sum| sum <= target);
        Some(idx.min(self.entries.len() - 1))
    }

    /// Remove and return one item, chosen proportionally to weight
    pub(crate) fn take<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<T> {
        let idx = self.pick_index(rng)?;
        Some(self.entries.remove(idx).1)
    }

    /// Drop every remaining item matching the predicate
    pub(crate) fn remove_where(&mut self, mut predicate: impl FnMut(&T) -> bool) {
        self.entries.retain(|(_, item)| !predicate(item));
    }
}
