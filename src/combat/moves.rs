//! Moves and the move catalog
//!
//! A [`Move`] describes one action a combatant can take. The catalog maps
//! player classes and opponent kinds to their rosters, falling back to a
//! default roster for names it does not know.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::dice::DiceExpr;
use super::loot::{LootEntry, LootTable, Rarity};
use super::rolls::Rolls;

/// Elements for non-physical damage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Element {
    Fire,
    Force,
    Radiant,
}

/// A standing defense set by a defensive move
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum Defense {
    /// Subtract this much from the next incoming hit
    Flat(u32),
    /// Multiply the next incoming hit by this factor
    Fraction(f64),
}

impl Defense {
    /// Apply this defense to an incoming hit
    pub fn mitigate(&self, damage: u32) -> u32 {
        match self {
            Defense::Flat(amount) => damage.saturating_sub(*amount),
            Defense::Fraction(factor) => (f64::from(damage) * factor.max(0.0)).floor() as u32,
        }
    }
}

/// What a move does when it resolves
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MoveEffect {
    /// Weapon damage against the other combatant
    PhysicalDamage,
    /// Elemental damage against the other combatant
    ElementalDamage { element: Element },
    /// Restore the user's HP
    Heal,
    /// Set the user's standing defense
    Defense { defense: Defense },
    /// Damage the other combatant and heal for half of it
    Drain,
    /// Wear down the other combatant's flat defense
    Debuff,
}

impl MoveEffect {
    /// Whether this effect deals direct damage that can critically hit
    pub fn is_damage(&self) -> bool {
        matches!(
            self,
            MoveEffect::PhysicalDamage | MoveEffect::ElementalDamage { .. }
        )
    }

    /// Short label for menus
    pub fn label(&self) -> &'static str {
        match self {
            MoveEffect::PhysicalDamage => "physical",
            MoveEffect::ElementalDamage { element } => match element {
                Element::Fire => "fire",
                Element::Force => "force",
                Element::Radiant => "radiant",
            },
            MoveEffect::Heal => "heal",
            MoveEffect::Defense { .. } => "defense",
            MoveEffect::Drain => "drain",
            MoveEffect::Debuff => "debuff",
        }
    }
}

/// An action a combatant can take
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Move {
    /// Stable identifier (used for cooldown tracking)
    pub id: String,
    /// Display name
    pub name: String,
    /// Effect category
    pub effect: MoveEffect,
    /// Magnitude roll; `DiceExpr::NONE` for moves without one
    #[serde(default)]
    pub dice: DiceExpr,
    /// MP cost (0 = free)
    #[serde(default)]
    pub mp_cost: u32,
    /// Usable once per encounter
    #[serde(default)]
    pub once_per_encounter: bool,
    /// Menu description
    #[serde(default)]
    pub description: String,
}

impl Move {
    /// Create a new move
    pub fn new(id: &str, name: &str, effect: MoveEffect, dice: DiceExpr) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            effect,
            dice,
            mp_cost: 0,
            once_per_encounter: false,
            description: String::new(),
        }
    }

    /// Set the MP cost
    pub fn costs(mut self, mp: u32) -> Self {
        self.mp_cost = mp;
        self
    }

    /// Mark as usable once per encounter
    pub fn once_per_encounter(mut self) -> Self {
        self.once_per_encounter = true;
        self
    }

    /// Set the description
    pub fn described(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    /// Whether `mp` is enough to pay for this move
    pub fn affordable_with(&self, mp: u32) -> bool {
        self.mp_cost <= mp
    }
}

/// Player character classes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CharacterClass {
    #[default]
    Warrior,
    Rogue,
    Mage,
    Cleric,
}

impl CharacterClass {
    /// All classes
    pub fn all() -> &'static [CharacterClass] {
        &[
            CharacterClass::Warrior,
            CharacterClass::Rogue,
            CharacterClass::Mage,
            CharacterClass::Cleric,
        ]
    }

    /// Parse a class name, falling back to the default class
    pub fn from_name(name: &str) -> Self {
        name.parse().unwrap_or_else(|e| {
            warn!("{}, using default roster", e);
            CharacterClass::default()
        })
    }

    /// This class's move roster
    pub fn moves(&self) -> Vec<Move> {
        match self {
            CharacterClass::Warrior => vec![
                Move::new("attack", "Attack", MoveEffect::PhysicalDamage, DiceExpr::new(1, 8, 2))
                    .described("Longsword attack (1d8+2)."),
                Move::new("second-wind", "Second Wind", MoveEffect::Heal, DiceExpr::new(1, 10, 1))
                    .costs(4)
                    .once_per_encounter()
                    .described("Regain HP (1d10 + level). Once per battle."),
                Move::new("action-surge", "Action Surge", MoveEffect::PhysicalDamage, DiceExpr::new(2, 8, 4))
                    .costs(6)
                    .once_per_encounter()
                    .described("Make two weapon attacks. Once per battle."),
            ],
            CharacterClass::Rogue => vec![
                Move::new(
                    "sneak-attack",
                    "Sneak Attack",
                    MoveEffect::PhysicalDamage,
                    DiceExpr::new(1, 8, 0).with_bonus_d6(2),
                )
                .described("Dagger with sneak attack (1d8 + 2d6)."),
                Move::new(
                    "cunning-action",
                    "Cunning Action",
                    MoveEffect::PhysicalDamage,
                    DiceExpr::new(1, 8, 0).with_advantage(),
                )
                .costs(2)
                .described("Quick attack with advantage."),
                Move::new(
                    "uncanny-dodge",
                    "Uncanny Dodge",
                    MoveEffect::Defense {
                        defense: Defense::Fraction(0.5),
                    },
                    DiceExpr::NONE,
                )
                .described("Halve the next attack's damage."),
            ],
            CharacterClass::Mage => vec![
                Move::new(
                    "fire-bolt",
                    "Fire Bolt",
                    MoveEffect::ElementalDamage { element: Element::Fire },
                    DiceExpr::new(1, 10, 2),
                )
                .costs(3)
                .described("Ranged fire attack (1d10 + 2)."),
                Move::new(
                    "magic-missile",
                    "Magic Missile",
                    MoveEffect::ElementalDamage { element: Element::Force },
                    DiceExpr::new(3, 4, 3),
                )
                .costs(6)
                .once_per_encounter()
                .described("Three force darts that never miss."),
                Move::new(
                    "shield",
                    "Shield",
                    MoveEffect::Defense {
                        defense: Defense::Flat(5),
                    },
                    DiceExpr::NONE,
                )
                .costs(4)
                .described("Magical barrier (+5 AC until next turn)."),
            ],
            CharacterClass::Cleric => vec![
                Move::new(
                    "sacred-flame",
                    "Sacred Flame",
                    MoveEffect::ElementalDamage { element: Element::Radiant },
                    DiceExpr::new(1, 8, 2),
                )
                .described("Divine ranged attack (1d8 + 2)."),
                Move::new("cure-wounds", "Cure Wounds", MoveEffect::Heal, DiceExpr::new(1, 8, 3))
                    .costs(5)
                    .once_per_encounter()
                    .described("Healing touch (1d8 + 3)."),
                Move::new(
                    "spiritual-weapon",
                    "Spiritual Weapon",
                    MoveEffect::ElementalDamage { element: Element::Force },
                    DiceExpr::new(1, 8, 3),
                )
                .costs(6)
                .once_per_encounter()
                .described("Spectral weapon strikes (1d8 + 3)."),
            ],
        }
    }
}

impl FromStr for CharacterClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "warrior" | "fighter" => Ok(CharacterClass::Warrior),
            "rogue" => Ok(CharacterClass::Rogue),
            "mage" | "wizard" => Ok(CharacterClass::Mage),
            "cleric" => Ok(CharacterClass::Cleric),
            _ => Err(format!("unknown class: {}", s.trim())),
        }
    }
}

impl fmt::Display for CharacterClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CharacterClass::Warrior => "Warrior",
            CharacterClass::Rogue => "Rogue",
            CharacterClass::Mage => "Mage",
            CharacterClass::Cleric => "Cleric",
        };
        write!(f, "{}", s)
    }
}

/// Computer-controlled opponent kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum OpponentKind {
    #[default]
    GoblinWarrior,
    DireWolf,
    DarkMage,
    AncientSkeleton,
}

impl OpponentKind {
    /// All opponent kinds
    pub fn all() -> &'static [OpponentKind] {
        &[
            OpponentKind::GoblinWarrior,
            OpponentKind::DireWolf,
            OpponentKind::DarkMage,
            OpponentKind::AncientSkeleton,
        ]
    }

    /// Pick an opponent kind uniformly at random
    pub fn random(rolls: &mut impl Rolls) -> Self {
        let all = Self::all();
        all[rolls.index(all.len())]
    }

    /// Parse an opponent name, falling back to the default opponent
    pub fn from_name(name: &str) -> Self {
        name.parse().unwrap_or_else(|e| {
            warn!("{}, using default template", e);
            OpponentKind::default()
        })
    }

    /// Build this opponent's template
    pub fn template(&self) -> OpponentTemplate {
        match self {
            OpponentKind::GoblinWarrior => OpponentTemplate {
                kind: *self,
                name: "Goblin Warrior".to_string(),
                max_hp: 65,
                glyph: "👹".to_string(),
                moves: vec![
                    Move::new("slash", "Sword Slash", MoveEffect::PhysicalDamage, DiceExpr::new(2, 6, 2))
                        .described("Two-handed sword attack (2d6+2)."),
                    Move::new("thrust", "Shield Thrust", MoveEffect::PhysicalDamage, DiceExpr::new(1, 8, 1))
                        .described("Shield bash (1d8+1)."),
                ],
                loot: LootTable::new(vec![
                    LootEntry::new(
                        "Rusty Longsword",
                        "Old but usable longsword. (1d8 slashing)",
                        Rarity::Common,
                        60,
                    ),
                    LootEntry::new(
                        "Health Potion",
                        "Restores 2d4+2 HP when used.",
                        Rarity::Uncommon,
                        30,
                    ),
                    LootEntry::new("Goblin Ear", "Ugly trophy. Can be traded.", Rarity::Common, 10),
                ]),
            },
            OpponentKind::DireWolf => OpponentTemplate {
                kind: *self,
                name: "Dire Wolf".to_string(),
                max_hp: 75,
                glyph: "🐺".to_string(),
                moves: vec![
                    Move::new("bite", "Savage Bite", MoveEffect::PhysicalDamage, DiceExpr::new(2, 8, 3))
                        .described("Powerful bite attack (2d8+3)."),
                    Move::new("howl", "Intimidating Howl", MoveEffect::Debuff, DiceExpr::new(1, 4, 0))
                        .described("Reduces player defense."),
                ],
                loot: LootTable::new(vec![
                    LootEntry::new(
                        "Wolf Pelt",
                        "Warm pelt; can be sold or crafted into gear.",
                        Rarity::Common,
                        70,
                    ),
                    LootEntry::new(
                        "Bite Tusk",
                        "Sharpened tooth; used in some rituals.",
                        Rarity::Uncommon,
                        30,
                    ),
                ]),
            },
            OpponentKind::DarkMage => OpponentTemplate {
                kind: *self,
                name: "Dark Mage".to_string(),
                max_hp: 55,
                glyph: "🧙".to_string(),
                moves: vec![
                    Move::new("shadow-bolt", "Shadow Bolt", MoveEffect::PhysicalDamage, DiceExpr::new(3, 6, 0))
                        .costs(4)
                        .described("Dark magic blast (3d6)."),
                    Move::new("life-drain", "Life Drain", MoveEffect::Drain, DiceExpr::new(2, 6, 0))
                        .costs(6)
                        .described("Drains life to heal self."),
                ],
                loot: LootTable::new(vec![
                    LootEntry::new(
                        "Spell Component Pouch",
                        "Contains reagents for spells.",
                        Rarity::Common,
                        60,
                    ),
                    LootEntry::new(
                        "Minor Mana Potion",
                        "Restores a small amount of MP.",
                        Rarity::Uncommon,
                        30,
                    ),
                    LootEntry::new(
                        "Corrupted Tome",
                        "A book containing dark lore (story item).",
                        Rarity::Rare,
                        10,
                    ),
                ]),
            },
            OpponentKind::AncientSkeleton => OpponentTemplate {
                kind: *self,
                name: "Ancient Skeleton".to_string(),
                max_hp: 85,
                glyph: "💀".to_string(),
                moves: vec![
                    Move::new("bone-slash", "Bone Blade", MoveEffect::PhysicalDamage, DiceExpr::new(2, 6, 4))
                        .described("Attacks with ancient sword (2d6+4)."),
                    Move::new("reassemble", "Reassemble", MoveEffect::Heal, DiceExpr::new(2, 8, 2))
                        .costs(5)
                        .described("Repairs damage (2d8+2)."),
                ],
                loot: LootTable::new(vec![
                    LootEntry::new(
                        "Ancient Bone",
                        "A strange bone with runes. (quest item)",
                        Rarity::Rare,
                        10,
                    ),
                    LootEntry::new(
                        "Cursed Ring",
                        "A ring that hums with magic. (artifact)",
                        Rarity::Rare,
                        5,
                    ),
                    LootEntry::new(
                        "Shield Fragment",
                        "Part of a broken shield; can be repaired.",
                        Rarity::Uncommon,
                        30,
                    ),
                ]),
            },
        }
    }
}

impl FromStr for OpponentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect();
        match key.as_str() {
            "goblin" | "goblinwarrior" => Ok(OpponentKind::GoblinWarrior),
            "wolf" | "direwolf" => Ok(OpponentKind::DireWolf),
            "mage" | "darkmage" => Ok(OpponentKind::DarkMage),
            "skeleton" | "ancientskeleton" => Ok(OpponentKind::AncientSkeleton),
            _ => Err(format!("unknown opponent: {}", s.trim())),
        }
    }
}

impl fmt::Display for OpponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OpponentKind::GoblinWarrior => "Goblin Warrior",
            OpponentKind::DireWolf => "Dire Wolf",
            OpponentKind::DarkMage => "Dark Mage",
            OpponentKind::AncientSkeleton => "Ancient Skeleton",
        };
        write!(f, "{}", s)
    }
}

/// Fixed stats for an opponent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpponentTemplate {
    pub kind: OpponentKind,
    pub name: String,
    pub max_hp: u32,
    /// Single-glyph portrait for text front ends
    pub glyph: String,
    pub moves: Vec<Move>,
    pub loot: LootTable,
}

impl OpponentTemplate {
    /// Max MP: half of max HP, but never below `floor`
    pub fn max_mp(&self, floor: u32) -> u32 {
        (self.max_hp / 2).max(floor)
    }
}

/// Roster for a class name; unknown names get the default roster
pub fn moves_for_class(name: &str) -> Vec<Move> {
    CharacterClass::from_name(name).moves()
}

/// Roster for an opponent name; unknown names get the default roster
pub fn moves_for_opponent(name: &str) -> Vec<Move> {
    OpponentKind::from_name(name).template().moves
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::rolls::ScriptedRolls;

    #[test]
    fn test_every_class_has_three_moves() {
        for class in CharacterClass::all() {
            let moves = class.moves();
            assert_eq!(moves.len(), 3, "{} roster", class);
            assert!(moves[0].effect.is_damage(), "{} opens with an attack", class);
        }
    }

    #[test]
    fn test_unknown_class_falls_back_to_warrior() {
        let moves = moves_for_class("bard");
        assert_eq!(moves, CharacterClass::Warrior.moves());
        assert_eq!(moves_for_class("ROGUE"), CharacterClass::Rogue.moves());
    }

    #[test]
    fn test_parse_errors_name_the_input() {
        assert_eq!(
            "bard".parse::<CharacterClass>(),
            Err("unknown class: bard".to_string())
        );
        assert_eq!(
            " dragon ".parse::<OpponentKind>(),
            Err("unknown opponent: dragon".to_string())
        );
    }

    #[test]
    fn test_unknown_opponent_falls_back_to_goblin() {
        assert_eq!(OpponentKind::from_name("dragon"), OpponentKind::GoblinWarrior);
        assert_eq!(OpponentKind::from_name("Dire Wolf"), OpponentKind::DireWolf);
        assert_eq!(OpponentKind::from_name("dark-mage"), OpponentKind::DarkMage);
        assert_eq!(moves_for_opponent("???").len(), 2);
    }

    #[test]
    fn test_opponent_templates() {
        let goblin = OpponentKind::GoblinWarrior.template();
        assert_eq!(goblin.max_hp, 65);
        assert_eq!(goblin.max_mp(20), 32);

        let mage = OpponentKind::DarkMage.template();
        assert_eq!(mage.max_mp(20), 27);
        assert!(mage.moves.iter().all(|m| m.mp_cost > 0));

        let wolf = OpponentKind::DireWolf.template();
        assert_eq!(wolf.moves[1].effect, MoveEffect::Debuff);
        assert_eq!(wolf.max_mp(40), 40);
    }

    #[test]
    fn test_random_opponent_uses_index() {
        let mut rolls = ScriptedRolls::new().indices([3]);
        assert_eq!(OpponentKind::random(&mut rolls), OpponentKind::AncientSkeleton);
    }

    #[test]
    fn test_defense_mitigation() {
        assert_eq!(Defense::Flat(5).mitigate(12), 7);
        assert_eq!(Defense::Flat(5).mitigate(3), 0);
        assert_eq!(Defense::Fraction(0.5).mitigate(9), 4);
        assert_eq!(Defense::Fraction(0.5).mitigate(0), 0);
    }

    #[test]
    fn test_effect_labels() {
        let labels: Vec<&str> = CharacterClass::Cleric
            .moves()
            .iter()
            .map(|m| m.effect.label())
            .collect();
        assert_eq!(labels, vec!["radiant", "heal", "force"]);
        assert_eq!(CharacterClass::Rogue.moves()[2].effect.label(), "defense");
    }

    #[test]
    fn test_rogue_defense_is_fractional() {
        let dodge = &CharacterClass::Rogue.moves()[2];
        assert_eq!(
            dodge.effect,
            MoveEffect::Defense {
                defense: Defense::Fraction(0.5)
            }
        );
        assert!(dodge.dice.is_none());
    }
}
