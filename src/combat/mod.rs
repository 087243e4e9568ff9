//! Turn-based combat engine
//!
//! One player against one computer-controlled opponent:
//! - Dice notation and rolling (e.g., "2d6+3", "1d8+2d6", "1d8 adv")
//! - Class and opponent move catalogs
//! - Opponent move selection
//! - Weighted loot drops
//! - The encounter state machine with two-phase move resolution
//!
//! All randomness flows through [`Rolls`], so encounters can be replayed
//! from a seed or scripted outright in tests.

mod dice;
mod events;
mod loot;
mod moves;
mod policy;
mod rolls;
mod state;

pub use dice::{parse_dice, DiceExpr, DiceParseError, BONUS_DIE_SIDES};
pub use events::{CombatEvent, Resolution, Vitals, VitalsPair};
pub use loot::{DropChances, LootEntry, LootTable, Rarity};
pub use moves::{
    moves_for_class, moves_for_opponent, CharacterClass, Defense, Element, Move, MoveEffect,
    OpponentKind, OpponentTemplate,
};
pub use policy::choose_move;
pub use rolls::{GameRng, Rolls, ScriptedRolls};
pub use state::{Combatant, Encounter, Outcome, Pending, Phase, PlayerAction, Rejection};
