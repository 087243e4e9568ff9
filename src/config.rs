//! Configuration
//!
//! Layered with figment: built-in defaults, then an optional TOML file, then
//! `SKIRMISH_*` environment variables (nested keys split on `__`, e.g.
//! `SKIRMISH_RULES__CRIT_CHANCE=0.1`).

use std::path::Path;
use std::time::Duration;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::combat::DropChances;

/// Environment variable prefix
pub const ENV_PREFIX: &str = "SKIRMISH_";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Figment(#[from] figment::Error),

    #[error("{field} must be a probability, got {value}")]
    InvalidProbability { field: &'static str, value: f64 },
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub rules: CombatRules,
    pub pacing: Pacing,
}

impl Config {
    /// Load defaults, then `path` (if given and present), then the environment
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = path {
            figment = figment.merge(Toml::file(path));
        }
        let config: Config = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;
        config.rules.validate()?;
        Ok(config)
    }
}

/// Numeric rules of an encounter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatRules {
    /// Chance that a damaging hit is doubled
    pub crit_chance: f64,
    /// Added to the d20 escape roll
    pub escape_bonus: u32,
    /// Escape succeeds at or above this total
    pub escape_dc: u32,
    /// MP the player recovers after each opponent turn
    pub mp_regen: u32,
    pub player_max_mp: u32,
    /// Floor for the derived player max HP
    pub min_player_hp: u32,
    pub hp_base: u32,
    pub hp_per_con: u32,
    /// Floor for opponent max MP (otherwise half its max HP)
    pub opponent_mp_floor: u32,
    pub second_drop_chance: f64,
    pub rare_drop_chance: f64,
}

impl Default for CombatRules {
    fn default() -> Self {
        Self {
            crit_chance: 0.05,
            escape_bonus: 2,
            escape_dc: 15,
            mp_regen: 5,
            player_max_mp: 50,
            min_player_hp: 30,
            hp_base: 20,
            hp_per_con: 2,
            opponent_mp_floor: 20,
            second_drop_chance: 0.4,
            rare_drop_chance: 0.08,
        }
    }
}

impl CombatRules {
    /// Loot probabilities
    pub fn drop_chances(&self) -> DropChances {
        DropChances {
            second: self.second_drop_chance,
            rare: self.rare_drop_chance,
        }
    }

    /// Reject probabilities outside `0.0..=1.0`
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("crit_chance", self.crit_chance),
            ("second_drop_chance", self.second_drop_chance),
            ("rare_drop_chance", self.rare_drop_chance),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::InvalidProbability { field, value });
            }
        }
        Ok(())
    }
}

/// Presentation delays between resolution phases
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pacing {
    /// Between announcing a player move and applying it
    pub announce_ms: u64,
    /// Between announcing an opponent move and applying it
    pub opponent_announce_ms: u64,
    /// Before the opponent starts its turn
    pub handoff_ms: u64,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            announce_ms: 500,
            opponent_announce_ms: 600,
            handoff_ms: 800,
        }
    }
}

impl Pacing {
    /// No delays at all
    pub fn instant() -> Self {
        Self {
            announce_ms: 0,
            opponent_announce_ms: 0,
            handoff_ms: 0,
        }
    }

    pub fn announce(&self) -> Duration {
        Duration::from_millis(self.announce_ms)
    }

    pub fn opponent_announce(&self) -> Duration {
        Duration::from_millis(self.opponent_announce_ms)
    }

    pub fn handoff(&self) -> Duration {
        Duration::from_millis(self.handoff_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.rules.escape_dc, 15);
        assert_eq!(config.rules.mp_regen, 5);
        assert_eq!(config.pacing.handoff(), Duration::from_millis(800));
        assert!(config.rules.validate().is_ok());
    }

    #[test]
    fn test_load_from_toml() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[rules]\ncrit_chance = 0.25\nmin_player_hp = 40\n\n[pacing]\nhandoff_ms = 0"
        )
        .unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.rules.crit_chance, 0.25);
        assert_eq!(config.rules.min_player_hp, 40);
        // Untouched keys keep their defaults
        assert_eq!(config.rules.escape_bonus, 2);
        assert_eq!(config.pacing.handoff_ms, 0);
        assert_eq!(config.pacing.announce_ms, 500);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(Some(&dir.path().join("absent.toml"))).unwrap();
        assert_eq!(config.rules, CombatRules::default());
    }

    #[test]
    fn test_rejects_bad_probability() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[rules]\nrare_drop_chance = 1.5").unwrap();

        let err = Config::load(Some(file.path())).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidProbability {
                field: "rare_drop_chance",
                ..
            }
        ));
    }
}
