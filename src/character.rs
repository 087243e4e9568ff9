//! Character attributes and derived combat stats
//!
//! Character creation itself happens outside the engine; this module turns
//! a class, race and attribute set into the [`PlayerStats`] an encounter
//! starts from.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::combat::{CharacterClass, Move};
use crate::config::CombatRules;

/// The six ability scores
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attributes {
    pub str: u32,
    pub dex: u32,
    pub con: u32,
    pub int: u32,
    pub wis: u32,
    pub cha: u32,
}

impl Default for Attributes {
    fn default() -> Self {
        Self {
            str: 10,
            dex: 10,
            con: 10,
            int: 10,
            wis: 10,
            cha: 10,
        }
    }
}

impl Attributes {
    /// Starting array for a class
    pub fn for_class(class: CharacterClass) -> Self {
        match class {
            CharacterClass::Warrior => Self {
                str: 15,
                dex: 13,
                con: 14,
                int: 8,
                wis: 12,
                cha: 10,
            },
            CharacterClass::Rogue => Self {
                str: 10,
                dex: 15,
                con: 12,
                int: 13,
                wis: 14,
                cha: 8,
            },
            CharacterClass::Mage => Self {
                str: 8,
                dex: 14,
                con: 13,
                int: 15,
                wis: 12,
                cha: 10,
            },
            CharacterClass::Cleric => Self {
                str: 13,
                dex: 10,
                con: 14,
                int: 8,
                wis: 15,
                cha: 12,
            },
        }
    }

    /// Add racial bonuses
    pub fn with_race(self, race: Race) -> Self {
        let b = race.bonuses();
        Self {
            str: self.str + b.str,
            dex: self.dex + b.dex,
            con: self.con + b.con,
            int: self.int + b.int,
            wis: self.wis + b.wis,
            cha: self.cha + b.cha,
        }
    }
}

/// Playable races
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Race {
    #[default]
    Human,
    Elf,
    Dwarf,
    Halfling,
}

impl Race {
    /// Racial attribute bonuses
    pub fn bonuses(&self) -> Attributes {
        let zero = Attributes {
            str: 0,
            dex: 0,
            con: 0,
            int: 0,
            wis: 0,
            cha: 0,
        };
        match self {
            Race::Human => Attributes {
                str: 1,
                dex: 1,
                con: 1,
                int: 1,
                wis: 1,
                cha: 1,
            },
            Race::Elf => Attributes {
                dex: 2,
                int: 1,
                ..zero
            },
            Race::Dwarf => Attributes {
                con: 2,
                wis: 1,
                ..zero
            },
            Race::Halfling => Attributes {
                dex: 2,
                cha: 1,
                ..zero
            },
        }
    }
}

impl FromStr for Race {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "human" => Ok(Race::Human),
            "elf" => Ok(Race::Elf),
            "dwarf" => Ok(Race::Dwarf),
            "halfling" => Ok(Race::Halfling),
            _ => Err(format!("unknown race: {}", s.trim())),
        }
    }
}

impl fmt::Display for Race {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Race::Human => "Human",
            Race::Elf => "Elf",
            Race::Dwarf => "Dwarf",
            Race::Halfling => "Halfling",
        };
        write!(f, "{}", s)
    }
}

/// Everything an encounter needs to know about the player
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerStats {
    pub name: String,
    pub class: CharacterClass,
    pub max_hp: u32,
    pub max_mp: u32,
    pub moves: Vec<Move>,
}

impl PlayerStats {
    /// Derive combat stats from a character
    pub fn derive(
        name: &str,
        class: CharacterClass,
        attributes: &Attributes,
        rules: &CombatRules,
    ) -> Self {
        Self {
            name: name.to_string(),
            class,
            max_hp: max_hp(attributes.con, rules),
            max_mp: rules.player_max_mp,
            moves: class.moves(),
        }
    }
}

/// `hp_base + hp_per_con × con`, never below `min_player_hp`
pub fn max_hp(con: u32, rules: &CombatRules) -> u32 {
    rules
        .hp_base
        .saturating_add(rules.hp_per_con.saturating_mul(con))
        .max(rules.min_player_hp)
}
