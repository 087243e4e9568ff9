//! Loot tables and drop resolution
//!
//! Each opponent template carries a weighted loot table. Winning an
//! encounter draws up to three entries from it:
//! - one primary drop, weighted
//! - a second, distinct drop with some probability
//! - a bonus rare drop with a small probability

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::rolls::Rolls;

/// Probabilities used when drawing drops
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DropChances {
    /// Chance of a second, distinct drop
    pub second: f64,
    /// Chance of an extra rare drop
    pub rare: f64,
}

impl Default for DropChances {
    fn default() -> Self {
        Self {
            second: 0.4,
            rare: 0.08,
        }
    }
}

/// Item rarity tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
}

impl fmt::Display for Rarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Rarity::Common => "common",
            Rarity::Uncommon => "uncommon",
            Rarity::Rare => "rare",
        };
        write!(f, "{}", s)
    }
}

/// One possible drop
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LootEntry {
    pub name: String,
    pub description: String,
    pub rarity: Rarity,
    /// Relative weight; `None` counts as 1
    #[serde(default)]
    pub weight: Option<u32>,
}

impl LootEntry {
    /// Create a new weighted entry
    pub fn new(name: &str, description: &str, rarity: Rarity, weight: u32) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            rarity,
            weight: Some(weight),
        }
    }

    /// Weight used for picking
    pub fn effective_weight(&self) -> u32 {
        self.weight.unwrap_or(1)
    }
}

/// An opponent's loot pool
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LootTable {
    entries: Vec<LootEntry>,
}

impl LootTable {
    /// Create a table from its entries
    pub fn new(entries: Vec<LootEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[LootEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Draw 0-3 drops from this table
    ///
    /// The second draw excludes the primary drop by name. The rare draw picks
    /// uniformly among rare entries and may repeat an earlier drop.
    pub fn generate_drops(&self, chances: DropChances, rolls: &mut impl Rolls) -> Vec<LootEntry> {
        let mut drops = Vec::new();

        let Some(primary) = weighted_pick(&self.entries, rolls) else {
            return drops;
        };
        drops.push(primary.clone());

        if rolls.chance(chances.second) {
            let remaining: Vec<&LootEntry> = self
                .entries
                .iter()
                .filter(|e| e.name != primary.name)
                .collect();
            if let Some(second) = weighted_pick(&remaining, rolls) {
                drops.push((*second).clone());
            }
        }

        if rolls.chance(chances.rare) {
            let rares: Vec<&LootEntry> = self
                .entries
                .iter()
                .filter(|e| e.rarity == Rarity::Rare)
                .collect();
            if !rares.is_empty() {
                drops.push(rares[rolls.index(rares.len())].clone());
            }
        }

        debug!(
            "generated {} drop(s): {:?}",
            drops.len(),
            drops.iter().map(|d| d.name.as_str()).collect::<Vec<_>>()
        );
        drops
    }
}

/// Anything that can be picked by weight
trait Weighted {
    fn weight(&self) -> u32;
}

impl Weighted for LootEntry {
    fn weight(&self) -> u32 {
        self.effective_weight()
    }
}

impl<T: Weighted> Weighted for &T {
    fn weight(&self) -> u32 {
        (*self).weight()
    }
}

/// Pick an item with probability proportional to its weight
///
/// Walks the list subtracting weights from a uniform draw over the total.
/// If every weight is zero the last item is returned.
fn weighted_pick<'a, T: Weighted>(items: &'a [T], rolls: &mut impl Rolls) -> Option<&'a T> {
    let last = items.last()?;
    let total: u64 = items.iter().map(|i| u64::from(i.weight())).sum();
    let mut r = rolls.fraction(total as f64);

    for item in items {
        let w = f64::from(item.weight());
        if r < w {
            return Some(item);
        }
        r -= w;
    }
    Some(last)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::rolls::{GameRng, ScriptedRolls};

    fn table() -> LootTable {
        LootTable::new(vec![
            LootEntry::new("Spell Component Pouch", "", Rarity::Common, 60),
            LootEntry::new("Minor Mana Potion", "", Rarity::Uncommon, 30),
            LootEntry::new("Corrupted Tome", "", Rarity::Rare, 10),
        ])
    }

    #[test]
    fn test_weighted_pick_walks_cumulative_weights() {
        let entries = table().entries().to_vec();

        let mut rolls = ScriptedRolls::new().fractions([0.0, 59.9, 60.0, 89.9, 90.0, 99.9]);
        let picks: Vec<&str> = (0..6)
            .map(|_| weighted_pick(&entries, &mut rolls).map(|e| e.name.as_str()).unwrap())
            .collect();

        assert_eq!(
            picks,
            vec![
                "Spell Component Pouch",
                "Spell Component Pouch",
                "Minor Mana Potion",
                "Minor Mana Potion",
                "Corrupted Tome",
                "Corrupted Tome",
            ]
        );
    }

    #[test]
    fn test_missing_weight_counts_as_one() {
        let mut entry = LootEntry::new("Pebble", "", Rarity::Common, 0);
        entry.weight = None;
        assert_eq!(entry.effective_weight(), 1);
    }

    #[test]
    fn test_primary_only() {
        let mut rolls = ScriptedRolls::new().fractions([75.0]).chances([false, false]);
        let drops = table().generate_drops(DropChances::default(), &mut rolls);
        assert_eq!(drops.len(), 1);
        assert_eq!(drops[0].name, "Minor Mana Potion");
    }

    #[test]
    fn test_second_drop_excludes_primary() {
        // Primary = pouch; second draw over [potion(30), tome(10)] at 0.0 = potion
        let mut rolls = ScriptedRolls::new()
            .fractions([10.0, 0.0])
            .chances([true, false]);
        let drops = table().generate_drops(DropChances::default(), &mut rolls);
        let names: Vec<&str> = drops.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["Spell Component Pouch", "Minor Mana Potion"]);
    }

    #[test]
    fn test_rare_drop_may_duplicate() {
        // Primary = tome, no second, rare = tome again
        let mut rolls = ScriptedRolls::new()
            .fractions([95.0])
            .chances([false, true])
            .indices([0]);
        let drops = table().generate_drops(DropChances::default(), &mut rolls);
        let names: Vec<&str> = drops.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["Corrupted Tome", "Corrupted Tome"]);
    }

    #[test]
    fn test_rare_roll_without_rares_adds_nothing() {
        let table = LootTable::new(vec![
            LootEntry::new("Wolf Pelt", "", Rarity::Common, 70),
            LootEntry::new("Bite Tusk", "", Rarity::Uncommon, 30),
        ]);
        let mut rolls = ScriptedRolls::new().chances([false, true]);
        let drops = table.generate_drops(DropChances::default(), &mut rolls);
        assert_eq!(drops.len(), 1);
    }

    #[test]
    fn test_single_entry_pool_has_no_second_drop() {
        let table = LootTable::new(vec![LootEntry::new("Goblin Ear", "", Rarity::Common, 10)]);
        let mut rolls = ScriptedRolls::new().chances([true, true]);
        let drops = table.generate_drops(DropChances::default(), &mut rolls);
        assert_eq!(drops.len(), 1);
    }

    #[test]
    fn test_empty_table_drops_nothing() {
        let mut rng = GameRng::from_seed(5);
        assert!(LootTable::default()
            .generate_drops(DropChances::default(), &mut rng)
            .is_empty());
    }

    #[test]
    fn test_drop_count_bounds() {
        let mut rng = GameRng::from_seed(99);
        let chances = DropChances {
            second: 0.5,
            rare: 0.5,
        };
        for _ in 0..500 {
            let drops = table().generate_drops(chances, &mut rng);
            assert!((1..=3).contains(&drops.len()), "got {} drops", drops.len());
            if drops.len() >= 2 && drops[1].rarity != Rarity::Rare {
                assert_ne!(drops[0].name, drops[1].name);
            }
        }
    }
}
