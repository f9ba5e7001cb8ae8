//! Tournament data models: player phases, settings and snapshots.

use super::{
    errors::{TournamentError, TournamentResult},
    player::Player,
};
use crate::{draft::SpeciesId, usage::is_valid_tier_name};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
};

/// Player identifier type
pub type PlayerId = String;

/// Player phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerStatus {
    /// Registered, tournament not started
    WaitingStart,
    /// Holding a draft offer
    ChoosingPokemon,
    /// Team locked in, ready to be paired
    WaitingBattle,
    /// Paired with an opponent
    Battling,
    /// Won the last battle, may steal from the loser
    Stealing,
    /// Lost the last battle, waiting for the winner to steal
    WaitingStolen,
    /// Stolen from, rebuilding the team
    Swapping,
}

impl PlayerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlayerStatus::WaitingStart => "waiting_start",
            PlayerStatus::ChoosingPokemon => "choosing_pokemon",
            PlayerStatus::WaitingBattle => "waiting_battle",
            PlayerStatus::Battling => "battling",
            PlayerStatus::Stealing => "stealing",
            PlayerStatus::WaitingStolen => "waiting_stolen",
            PlayerStatus::Swapping => "swapping",
        }
    }

    /// Whether the phase implies a bound opponent
    pub fn is_in_battle(&self) -> bool {
        matches!(
            self,
            PlayerStatus::Battling | PlayerStatus::Stealing | PlayerStatus::WaitingStolen
        )
    }
}

impl fmt::Display for PlayerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Tournament settings, fixed at creation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TournamentSettings {
    /// Team members each player keeps
    pub team_size: usize,
    /// Candidates offered per draft
    pub draw_size: usize,
    /// Maximum members a winner may steal
    pub steal_size: usize,
    /// Tier identifier to draft scale
    pub tiers: BTreeMap<String, f64>,
}

impl Default for TournamentSettings {
    fn default() -> Self {
        Self {
            team_size: 6,
            draw_size: 9,
            steal_size: 2,
            tiers: BTreeMap::from([
                ("gen8ou".to_string(), 0.6),
                ("gen8uu".to_string(), 1.0),
                ("gen8ru".to_string(), 0.9),
                ("gen8nu".to_string(), 0.6),
            ]),
        }
    }
}

impl TournamentSettings {
    /// Check internal consistency
    ///
    /// # Errors
    ///
    /// * `TournamentError::InvalidSettings` - describing the first violation
    pub fn validate(&self) -> TournamentResult<()> {
        let invalid = |msg: String| Err(TournamentError::InvalidSettings(msg));

        if self.team_size == 0 {
            return invalid("team_size must be at least 1".to_string());
        }
        if self.draw_size < self.team_size {
            return invalid(format!(
                "draw_size {} is smaller than team_size {}",
                self.draw_size, self.team_size
            ));
        }
        if self.steal_size > self.team_size {
            return invalid(format!(
                "steal_size {} exceeds team_size {}",
                self.steal_size, self.team_size
            ));
        }
        if self.tiers.is_empty() {
            return invalid("at least one tier is required".to_string());
        }
        for (tier, scale) in &self.tiers {
            if !is_valid_tier_name(tier) {
                return invalid(format!("tier \"{tier}\" must match [a-z0-9_-]+"));
            }
            if !scale.is_finite() || *scale < 0.0 {
                return invalid(format!("scale of tier \"{tier}\" must be finite and >= 0"));
            }
        }
        if !self.tiers.values().any(|&scale| scale > 0.0) {
            return invalid("at least one tier needs a positive scale".to_string());
        }

        Ok(())
    }

    /// Apply overrides on top of the defaults
    pub fn from_overrides(overrides: SettingsOverrides) -> Self {
        let defaults = Self::default();
        Self {
            team_size: overrides.team_size.unwrap_or(defaults.team_size),
            draw_size: overrides.draw_size.unwrap_or(defaults.draw_size),
            steal_size: overrides.steal_size.unwrap_or(defaults.steal_size),
            tiers: overrides.tiers.unwrap_or(defaults.tiers),
        }
    }
}

/// Partial settings supplied at creation; missing fields take defaults.
/// A provided tier map replaces the default one entirely.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsOverrides {
    pub team_size: Option<usize>,
    pub draw_size: Option<usize>,
    pub steal_size: Option<usize>,
    pub tiers: Option<BTreeMap<String, f64>>,
}

impl SettingsOverrides {
    pub fn with_sizes(team_size: usize, draw_size: usize) -> Self {
        Self {
            team_size: Some(team_size),
            draw_size: Some(draw_size),
            ..Self::default()
        }
    }

    pub fn with_steal_size(mut self, steal_size: usize) -> Self {
        self.steal_size = Some(steal_size);
        self
    }

    pub fn with_tier(mut self, tier: impl Into<String>, scale: f64) -> Self {
        self.tiers
            .get_or_insert_with(BTreeMap::new)
            .insert(tier.into(), scale);
        self
    }
}

/// Serializable record of a tournament; the unit of persistence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TournamentSnapshot {
    pub name: String,
    /// Players in registration order
    pub players: Vec<Player>,
    /// Every species ever offered in this tournament
    pub used_species: BTreeSet<SpeciesId>,
    pub settings: TournamentSettings,
    pub started: bool,
    pub created_at: DateTime<Utc>,
}

impl TournamentSnapshot {
    pub fn player(&self, player_id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.player_id == player_id)
    }
}
