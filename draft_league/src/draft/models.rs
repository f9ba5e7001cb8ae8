//! Draft data models: drafted candidates and the usage pools they come from.

use super::errors::DraftError;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt, str::FromStr};

/// Species identifier type
pub type SpeciesId = String;

/// Tier identifier type
pub type TierId = String;

/// Number of stats in a spread (HP, Atk, Def, SpA, SpD, Spe)
pub const STAT_COUNT: usize = 6;

/// Gender tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gender::Male => write!(f, "M"),
            Gender::Female => write!(f, "F"),
        }
    }
}

/// Nature plus effort values, in usage-stats notation `Nature:hp/atk/def/spa/spd/spe`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Spread {
    pub nature: String,
    pub evs: [u16; STAT_COUNT],
}

impl Spread {
    /// Sum of all effort values
    pub fn total_evs(&self) -> u32 {
        self.evs.iter().map(|&ev| u32::from(ev)).sum()
    }
}

impl fmt::Display for Spread {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [hp, atk, def, spa, spd, spe] = self.evs;
        write!(f, "{}:{hp}/{atk}/{def}/{spa}/{spd}/{spe}", self.nature)
    }
}

impl FromStr for Spread {
    type Err = DraftError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || DraftError::InvalidSpread(s.to_string());

        let (nature, values) = s.trim().split_once(':').ok_or_else(invalid)?;
        if nature.is_empty() {
            return Err(invalid());
        }

        let parsed = values
            .split('/')
            .map(|v| v.trim().parse::<u16>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| invalid())?;
        let evs: [u16; STAT_COUNT] = parsed.try_into().map_err(|_| invalid())?;

        Ok(Self {
            nature: nature.to_string(),
            evs,
        })
    }
}

/// A value with a usage weight attached
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weighted<T> {
    pub weight: f64,
    pub value: T,
}

impl<T> Weighted<T> {
    pub fn new(weight: f64, value: T) -> Self {
        Self { weight, value }
    }
}

/// Usage data for one species: the sub-distributions a candidate is rolled from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesTemplate {
    pub species: SpeciesId,
    #[serde(default)]
    pub moves: Vec<Weighted<String>>,
    #[serde(default)]
    pub abilities: Vec<Weighted<String>>,
    #[serde(default)]
    pub items: Vec<Weighted<String>>,
    #[serde(default)]
    pub spreads: Vec<Weighted<Spread>>,
    /// Probability of a male roll; `None` for genderless or fixed-gender species
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub male_ratio: Option<f64>,
}

impl SpeciesTemplate {
    /// Create a template with no sub-distributions
    pub fn new(species: impl Into<SpeciesId>) -> Self {
        Self {
            species: species.into(),
            moves: Vec::new(),
            abilities: Vec::new(),
            items: Vec::new(),
            spreads: Vec::new(),
            male_ratio: None,
        }
    }

    pub fn with_moves<I, S>(mut self, moves: I) -> Self
    where
        I: IntoIterator<Item = (f64, S)>,
        S: Into<String>,
    {
        self.moves = moves
            .into_iter()
            .map(|(w, m)| Weighted::new(w, m.into()))
            .collect();
        self
    }

    pub fn with_abilities<I, S>(mut self, abilities: I) -> Self
    where
        I: IntoIterator<Item = (f64, S)>,
        S: Into<String>,
    {
        self.abilities = abilities
            .into_iter()
            .map(|(w, a)| Weighted::new(w, a.into()))
            .collect();
        self
    }

    pub fn with_items<I, S>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = (f64, S)>,
        S: Into<String>,
    {
        self.items = items
            .into_iter()
            .map(|(w, i)| Weighted::new(w, i.into()))
            .collect();
        self
    }

    pub fn with_spreads<I>(mut self, spreads: I) -> Self
    where
        I: IntoIterator<Item = (f64, Spread)>,
    {
        self.spreads = spreads
            .into_iter()
            .map(|(w, s)| Weighted::new(w, s))
            .collect();
        self
    }

    pub fn with_male_ratio(mut self, ratio: f64) -> Self {
        self.male_ratio = Some(ratio);
        self
    }
}

/// One entry of a tier's candidate pool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolEntry {
    /// Usage weight (not necessarily normalized)
    pub weight: f64,
    pub template: SpeciesTemplate,
}

/// Usage pool of one tier, keyed by species
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CandidatePool {
    entries: BTreeMap<SpeciesId, PoolEntry>,
}

impl CandidatePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a template with its usage weight, replacing any previous entry
    pub fn insert(&mut self, weight: f64, template: SpeciesTemplate) {
        self.entries
            .insert(template.species.clone(), PoolEntry { weight, template });
    }

    pub fn with_entry(mut self, weight: f64, template: SpeciesTemplate) -> Self {
        self.insert(weight, template);
        self
    }

    pub fn get(&self, species: &str) -> Option<&PoolEntry> {
        self.entries.get(species)
    }

    /// Entries in species order
    pub fn entries(&self) -> impl Iterator<Item = &PoolEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(f64, SpeciesTemplate)> for CandidatePool {
    fn from_iter<I: IntoIterator<Item = (f64, SpeciesTemplate)>>(iter: I) -> Self {
        let mut pool = Self::new();
        for (weight, template) in iter {
            pool.insert(weight, template);
        }
        pool
    }
}

/// A drafted team member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub species: SpeciesId,
    pub moves: Vec<String>,
    pub ability: Option<String>,
    pub item: Option<String>,
    pub spread: Option<Spread>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(default)]
    pub shiny: bool,
}

impl Candidate {
    /// A bare candidate carrying only its species
    pub fn bare(species: impl Into<SpeciesId>) -> Self {
        Self {
            species: species.into(),
            moves: Vec::new(),
            ability: None,
            item: None,
            spread: None,
            gender: None,
            shiny: false,
        }
    }
}
