//! Combat events and resolution results
//!
//! Every accepted operation returns a [`Resolution`]: the ordered events it
//! produced (each displays as a message for the player), the vitals of both
//! sides afterwards, and any loot won.

use std::fmt;

use serde::Serialize;

use super::loot::LootEntry;
use crate::inventory::Resource;

/// Current and maximum HP/MP of one combatant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Vitals {
    pub hp: u32,
    pub max_hp: u32,
    pub mp: u32,
    pub max_mp: u32,
}

/// Vitals of both combatants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VitalsPair {
    pub player: Vitals,
    pub opponent: Vitals,
}

/// Something that happened during resolution
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CombatEvent {
    Challenged { opponent: String },
    ChooseMove,
    Escaped { roll: u32 },
    EscapeFailed { roll: u32 },
    MoveUsed { actor: String, move_name: String },
    Healed { actor: String, amount: u32 },
    Defended { actor: String },
    CriticalHit,
    Damaged { source: String, amount: u32 },
    Drained { actor: String, amount: u32 },
    DefenseWeakened { actor: String, amount: u32 },
    ItemUsed { item: String, resource: Resource, amount: u32 },
    Regenerated { amount: u32 },
    AwaitingAction,
    Victory,
    Defeat,
    LootDropped { items: Vec<String> },
    Abandoned,
}

impl fmt::Display for CombatEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CombatEvent::Challenged { opponent } => {
                write!(f, "A {} challenges you to combat!", opponent)
            }
            CombatEvent::ChooseMove => write!(f, "Choose your attack."),
            CombatEvent::Escaped { .. } => write!(f, "You escaped successfully!"),
            CombatEvent::EscapeFailed { .. } => write!(f, "Failed to escape! Enemy attacks!"),
            CombatEvent::MoveUsed { actor, move_name } => write!(f, "{} used {}!", actor, move_name),
            CombatEvent::Healed { actor, amount } => write!(f, "{} healed for {} HP!", actor, amount),
            CombatEvent::Defended { actor } => write!(f, "{} prepared for defense!", actor),
            CombatEvent::CriticalHit => write!(f, "Critical hit!"),
            CombatEvent::Damaged { source, amount } => write!(f, "{} dealt {} damage!", source, amount),
            CombatEvent::Drained { actor, amount } => write!(f, "{} drained {} HP!", actor, amount),
            CombatEvent::DefenseWeakened { actor, .. } => {
                write!(f, "{} weakened your defenses!", actor)
            }
            CombatEvent::ItemUsed {
                item,
                resource,
                amount,
            } => write!(f, "Used {}, restored {} {}!", item, amount, resource),
            CombatEvent::Regenerated { amount } => write!(f, "You recovered {} MP.", amount),
            CombatEvent::AwaitingAction => write!(f, "Choose your action!"),
            CombatEvent::Victory => write!(f, "Enemy defeated! Victory!"),
            CombatEvent::Defeat => write!(f, "You were defeated..."),
            CombatEvent::LootDropped { items } => write!(f, "Loot: {}", items.join(", ")),
            CombatEvent::Abandoned => write!(f, "You left the battle."),
        }
    }
}

/// Output of one accepted operation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resolution {
    pub events: Vec<CombatEvent>,
    pub vitals: VitalsPair,
    /// Non-empty only on the step that won the encounter
    pub loot: Vec<LootEntry>,
}

impl Resolution {
    /// Messages for display, in order
    pub fn messages(&self) -> Vec<String> {
        self.events.iter().map(|e| e.to_string()).collect()
    }

    /// Append a later resolution; its vitals and loot win
    pub fn then(mut self, later: Resolution) -> Resolution {
        self.events.extend(later.events);
        Resolution {
            events: self.events,
            vitals: later.vitals,
            loot: later.loot,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(
            CombatEvent::MoveUsed {
                actor: "Hero".into(),
                move_name: "Attack".into()
            }
            .to_string(),
            "Hero used Attack!"
        );
        assert_eq!(
            CombatEvent::ItemUsed {
                item: "Minor Mana Potion".into(),
                resource: Resource::Mp,
                amount: 6
            }
            .to_string(),
            "Used Minor Mana Potion, restored 6 MP!"
        );
        assert_eq!(
            CombatEvent::LootDropped {
                items: vec!["Wolf Pelt".into(), "Bite Tusk".into()]
            }
            .to_string(),
            "Loot: Wolf Pelt, Bite Tusk"
        );
    }

    #[test]
    fn test_events_serialize_tagged() {
        let json = serde_json::to_value(CombatEvent::Damaged {
            source: "Dire Wolf".into(),
            amount: 9,
        })
        .unwrap();
        assert_eq!(json["event"], "damaged");
        assert_eq!(json["amount"], 9);
    }
}
