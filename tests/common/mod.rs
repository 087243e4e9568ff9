//! Common test fixtures for building encounters

#![allow(dead_code)]

use skirmish::combat::{DiceExpr, Move, MoveEffect, OpponentTemplate};
use skirmish::{Attributes, CharacterClass, CombatRules, Encounter, OpponentKind, PlayerStats};

/// Player stats for a class with its standard attribute array
pub fn stats(class: CharacterClass) -> PlayerStats {
    PlayerStats::derive(
        "Hero",
        class,
        &Attributes::for_class(class),
        &CombatRules::default(),
    )
}

/// Start an encounter with default rules
pub fn start(class: CharacterClass, kind: OpponentKind) -> Encounter {
    Encounter::start(stats(class), kind.template(), CombatRules::default())
}

/// Start an encounter with custom player stats and opponent template
pub fn start_with(stats: PlayerStats, template: OpponentTemplate) -> Encounter {
    Encounter::start(stats, template, CombatRules::default())
}

/// A move that always deals exactly `amount` damage
pub fn fixed_hit(amount: i32) -> Move {
    Move::new(
        "smite",
        "Smite",
        MoveEffect::PhysicalDamage,
        DiceExpr::new(0, 0, amount),
    )
}
