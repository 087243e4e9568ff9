//! Inventory collaborator
//!
//! The engine does not own the player's items. During an encounter it asks
//! an [`Inventory`] for a consumable when the player uses an item, and hands
//! it any loot won. [`Bag`] is a simple in-memory implementation.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::combat::{DiceExpr, LootEntry, Rarity};

/// A restorable resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    Hp,
    Mp,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::Hp => write!(f, "HP"),
            Resource::Mp => write!(f, "MP"),
        }
    }
}

/// An item consumed for its restorative effect
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Consumable {
    pub name: String,
    pub restores: Resource,
    pub dice: DiceExpr,
}

/// Potion strength for both healing and mana potions
pub const POTION_DICE: DiceExpr = DiceExpr::new(2, 4, 2);

/// Item storage used by an encounter
pub trait Inventory {
    /// Remove and return the named item if it can be used in combat
    fn take_consumable(&mut self, name: &str) -> Option<Consumable>;

    /// Store loot won from an encounter
    fn receive_loot(&mut self, drops: &[LootEntry]);
}

/// A carried item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub name: String,
    pub description: String,
    pub rarity: Rarity,
}

impl Item {
    pub fn new(name: &str, description: &str, rarity: Rarity) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            rarity,
        }
    }

    /// What using this item in combat restores, if anything
    pub fn restores(&self) -> Option<Resource> {
        let name = self.name.to_lowercase();
        if name.contains("mana") {
            Some(Resource::Mp)
        } else if name.contains("health") {
            Some(Resource::Hp)
        } else {
            None
        }
    }
}

impl From<&LootEntry> for Item {
    fn from(entry: &LootEntry) -> Self {
        Self {
            name: entry.name.clone(),
            description: entry.description.clone(),
            rarity: entry.rarity,
        }
    }
}

/// In-memory item bag
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bag {
    items: Vec<Item>,
}

impl Bag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an item
    pub fn add(&mut self, item: Item) {
        self.items.push(item);
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items usable in combat
    pub fn usable(&self) -> impl Iterator<Item = &Item> {
        self.items.iter().filter(|i| i.restores().is_some())
    }
}

impl Inventory for Bag {
    fn take_consumable(&mut self, name: &str) -> Option<Consumable> {
        let wanted = name.trim().to_lowercase();
        let pos = self
            .items
            .iter()
            .position(|i| i.name.to_lowercase() == wanted && i.restores().is_some())?;
        let item = self.items.remove(pos);
        let restores = item.restores()?;
        debug!("consumed {} from bag", item.name);
        Some(Consumable {
            name: item.name,
            restores,
            dice: POTION_DICE,
        })
    }

    fn receive_loot(&mut self, drops: &[LootEntry]) {
        self.items.extend(drops.iter().map(Item::from));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_mana_potion() {
        let mut bag = Bag::new();
        bag.add(Item::new("Minor Mana Potion", "", Rarity::Uncommon));
        bag.add(Item::new("Goblin Ear", "", Rarity::Common));

        let potion = bag.take_consumable("minor mana potion").unwrap();
        assert_eq!(potion.restores, Resource::Mp);
        assert_eq!(potion.dice, POTION_DICE);
        assert_eq!(bag.len(), 1);
    }

    #[test]
    fn test_non_consumables_stay_put() {
        let mut bag = Bag::new();
        bag.add(Item::new("Goblin Ear", "", Rarity::Common));
        assert!(bag.take_consumable("Goblin Ear").is_none());
        assert!(bag.take_consumable("Elixir").is_none());
        assert_eq!(bag.len(), 1);
    }

    #[test]
    fn test_health_potion_restores_hp() {
        let mut bag = Bag::new();
        bag.add(Item::new("Health Potion", "", Rarity::Uncommon));
        assert_eq!(bag.usable().count(), 1);
        assert_eq!(bag.take_consumable("Health Potion").unwrap().restores, Resource::Hp);
        assert!(bag.is_empty());
    }

    #[test]
    fn test_receive_loot() {
        let mut bag = Bag::new();
        bag.receive_loot(&[
            LootEntry::new("Wolf Pelt", "Warm pelt.", Rarity::Common, 70),
            LootEntry::new("Bite Tusk", "Sharpened tooth.", Rarity::Uncommon, 30),
        ]);
        assert_eq!(bag.len(), 2);
        assert_eq!(bag.items()[0].description, "Warm pelt.");
    }
}
