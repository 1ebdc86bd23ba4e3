//! Director tuning. Every threshold the pacing channels use lives here with
//! its shipped default; a TOML file may override any subset.

use gm_state::RateLimits;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;

/// Boredom and mood dynamics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoredomConfig {
    /// Fraction of the gap to the target closed on each tick.
    pub smoothing_rate: f64,
    /// Multiplier applied to transient mood once per new turn.
    pub transient_decay: f64,
}

impl Default for BoredomConfig {
    fn default() -> Self {
        Self {
            smoothing_rate: 0.15,
            transient_decay: 0.9,
        }
    }
}

/// Entrance flavor channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntranceConfig {
    /// Turns between flavors outside settlements.
    pub cooldown_turns: u32,
    /// In settlements only every n-th entry (1, 1+n, 1+2n, ...) is eligible.
    pub settlement_entry_period: u32,
    /// Boredom above which a restive mood asks for a shake-up.
    pub restive_boredom: f64,
    /// Boredom above which a receptive mood accepts variety.
    pub receptive_boredom: f64,
    /// Turns of history needed before suggesting another mode.
    pub variety_min_turns: u32,
    /// Share of turns one mode must hold before variety is suggested.
    pub variety_dominance: f64,
    /// The one-time opening rumor is only offered before this many turns.
    pub general_rumor_max_turns: u32,
    pub general_rumor_boredom: f64,
    /// Number of phrasings the presentation layer has per topic.
    pub variants: u32,
}

impl Default for EntranceConfig {
    fn default() -> Self {
        Self {
            cooldown_turns: 60,
            settlement_entry_period: 4,
            restive_boredom: 0.5,
            receptive_boredom: 0.3,
            variety_min_turns: 100,
            variety_dominance: 0.7,
            general_rumor_max_turns: 50,
            general_rumor_boredom: 0.2,
            variants: 4,
        }
    }
}

/// Mechanic hint channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HintConfig {
    /// Hints stay silent until this many turns have passed...
    pub early_game_turns: u32,
    /// ...or the player has entered town this many times.
    pub early_game_town_entries: u32,
    /// Town entries needed to allow a second hint on the same turn.
    pub entry_cooldown: u32,
    pub cooldown_turns: u32,
    /// Score at which a hint is delivered with medium strength.
    pub medium_score: u32,
    pub variants: u32,
}

impl Default for HintConfig {
    fn default() -> Self {
        Self {
            early_game_turns: 30,
            early_game_town_entries: 2,
            entry_cooldown: 4,
            cooldown_turns: 80,
            medium_score: 9,
            variants: 3,
        }
    }
}

/// Scheduler rate limits and guard-fine heat.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub rate_limits: RateLimits,
    /// Turns without a new refusal after which refusal heat is forgiven.
    pub heat_decay_turns: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            rate_limits: RateLimits::default(),
            heat_decay_turns: 300,
        }
    }
}

/// Durable record handling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistConfig {
    /// Name of the durable record.
    pub record_key: String,
    /// Minimum turns between opportunistic writes.
    pub min_turns_between_saves: u32,
}

impl Default for PersistConfig {
    fn default() -> Self {
        Self {
            record_key: "gm.state".to_string(),
            min_turns_between_saves: 1,
        }
    }
}

/// Complete director configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DirectorConfig {
    pub boredom: BoredomConfig,
    pub entrance: EntranceConfig,
    pub hint: HintConfig,
    pub scheduler: SchedulerConfig,
    pub persist: PersistConfig,
}

impl DirectorConfig {
    /// Parse a TOML document; missing keys keep their defaults.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    /// Read and parse a TOML config file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }
}
