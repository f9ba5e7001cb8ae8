//! Store configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use crate::draft::{DEFAULT_CUTOFF, DEFAULT_SHINY_RATE, DraftGenerator};
use std::{path::PathBuf, str::FromStr};

/// Store configuration loaded from environment variables
#[derive(Debug, Clone, PartialEq)]
pub struct StoreConfig {
    /// Snapshot document path
    pub state_file: PathBuf,
    /// Directory holding `<tier>.json` usage files
    pub usage_dir: PathBuf,
    /// Minimum usage weight for a species to be draftable
    pub cutoff: f64,
    /// Probability of a shiny candidate
    pub shiny_rate: f64,
    /// Draft RNG seed; `None` seeds from the OS
    pub seed: Option<u64>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            state_file: PathBuf::from("data/tournaments.json"),
            usage_dir: PathBuf::from("data/usage"),
            cutoff: DEFAULT_CUTOFF,
            shiny_rate: DEFAULT_SHINY_RATE,
            seed: None,
        }
    }
}

impl StoreConfig {
    /// Load configuration from environment variables
    ///
    /// Expected environment variables:
    /// - `DRAFT_STATE_FILE`: snapshot document (default: `data/tournaments.json`)
    /// - `DRAFT_USAGE_DIR`: usage directory (default: `data/usage`)
    /// - `DRAFT_CUTOFF`: usage cutoff (default: 0.03)
    /// - `DRAFT_SHINY_RATE`: shiny probability, decimal or `1/N` (default: 1/4096)
    /// - `DRAFT_SEED`: RNG seed (default: OS entropy)
    ///
    /// # Arguments
    ///
    /// * `state_file_override` - Optional snapshot path override (from CLI args)
    /// * `seed_override` - Optional seed override (from CLI args)
    ///
    /// # Errors
    ///
    /// Returns error if a variable is set but cannot be parsed
    pub fn from_env(
        state_file_override: Option<PathBuf>,
        seed_override: Option<u64>,
    ) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let state_file = state_file_override
            .or_else(|| std::env::var_os("DRAFT_STATE_FILE").map(PathBuf::from))
            .unwrap_or(defaults.state_file);
        let usage_dir = std::env::var_os("DRAFT_USAGE_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.usage_dir);

        let cutoff = parse_env_or("DRAFT_CUTOFF", defaults.cutoff)?;
        let shiny_rate = match std::env::var("DRAFT_SHINY_RATE") {
            Ok(raw) => parse_rate(&raw).ok_or_else(|| ConfigError::Invalid {
                var: "DRAFT_SHINY_RATE".to_string(),
                reason: format!("\"{raw}\" is neither a decimal nor 1/N"),
            })?,
            Err(_) => defaults.shiny_rate,
        };

        let seed = match seed_override {
            Some(seed) => Some(seed),
            None => parse_env_opt("DRAFT_SEED")?,
        };

        Ok(StoreConfig {
            state_file,
            usage_dir,
            cutoff,
            shiny_rate,
            seed,
        })
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.state_file.as_os_str().is_empty() {
            return Err(ConfigError::Invalid {
                var: "DRAFT_STATE_FILE".to_string(),
                reason: "Must not be empty".to_string(),
            });
        }

        if !(self.cutoff > 0.0 && self.cutoff < 1.0) {
            return Err(ConfigError::Invalid {
                var: "DRAFT_CUTOFF".to_string(),
                reason: format!("Must be in (0, 1), got {}", self.cutoff),
            });
        }

        if !(0.0..=1.0).contains(&self.shiny_rate) {
            return Err(ConfigError::Invalid {
                var: "DRAFT_SHINY_RATE".to_string(),
                reason: format!("Must be in [0, 1], got {}", self.shiny_rate),
            });
        }

        Ok(())
    }

    /// Generator configured with this cutoff and shiny rate
    pub fn generator(&self) -> DraftGenerator {
        DraftGenerator::new(self.cutoff, self.shiny_rate)
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Parse an environment variable, falling back to `default` when unset
fn parse_env_or<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
{
    Ok(parse_env_opt(key)?.unwrap_or(default))
}

fn parse_env_opt<T>(key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid {
                var: key.to_string(),
                reason: format!("Cannot parse \"{raw}\""),
            }),
        Err(_) => Ok(None),
    }
}

/// Parse `0.00024` or `1/4096`
fn parse_rate(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    match raw.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.trim().parse().ok()?;
            let den: f64 = den.trim().parse().ok()?;
            (den != 0.0).then(|| num / den)
        }
        None => raw.parse().ok(),
    }
}
