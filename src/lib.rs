//! skirmish - turn-based D&D-style combat engine
//!
//! One player character against one computer-controlled opponent, with
//! dice-driven moves, MP costs, once-per-encounter abilities, standing
//! defenses, escape attempts, item use and weighted loot.

pub mod character;
pub mod combat;
pub mod config;
pub mod inventory;
pub mod session;

pub use character::{Attributes, PlayerStats, Race};
pub use combat::{
    CharacterClass, CombatEvent, Encounter, GameRng, OpponentKind, Outcome, Phase, PlayerAction,
    Rejection, Resolution, Rolls, ScriptedRolls,
};
pub use config::{CombatRules, Config, ConfigError, Pacing};
pub use inventory::{Bag, Inventory, Item};
pub use session::{Command, Session};
