//! Encounter state machine
//!
//! An [`Encounter`] owns both combatants, the turn phase and the set of
//! once-per-encounter moves already spent. Phases:
//!
//! ```text
//! PlayerTurn ──select_move──▶ Resolving ──finish──▶ OpponentTurn | Ended(Victory)
//! PlayerTurn ──run/item─────▶ OpponentTurn | Ended(Escaped)
//! OpponentTurn ──begin──────▶ Resolving ──finish──▶ PlayerTurn | Ended(Defeat)
//! ```
//!
//! Resolution is split in two so a front end can pause between announcing a
//! move and applying it. Input arriving while a move is resolving is
//! rejected, and a rejected operation never changes the encounter.

use std::collections::HashSet;

use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use super::events::{CombatEvent, Resolution, Vitals, VitalsPair};
use super::loot::LootEntry;
use super::moves::{Defense, Move, MoveEffect, OpponentTemplate};
use super::policy::choose_move;
use super::rolls::Rolls;
use crate::character::PlayerStats;
use crate::config::CombatRules;
use crate::inventory::{Inventory, Resource};

/// Reasons an operation was refused
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("it is not your turn")]
    NotPlayerTurn,

    #[error("it is not the opponent's turn")]
    NotOpponentTurn,

    #[error("an action is still resolving")]
    Resolving,

    #[error("nothing is waiting to resolve")]
    NothingPending,

    #[error("the encounter is over")]
    Ended,

    #[error("unknown move: {0}")]
    UnknownMove(String),

    #[error("{0} is on cooldown")]
    OnCooldown(String),

    #[error("not enough MP to use {name} (needs {cost}, have {available})")]
    InsufficientMp {
        name: String,
        cost: u32,
        available: u32,
    },

    #[error("no usable item named {0}")]
    NoUsableItem(String),
}

/// How an encounter ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Victory { loot: Vec<LootEntry> },
    Defeat,
    Escaped,
}

/// A committed move waiting to be applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pending {
    PlayerMove(usize),
    OpponentMove(usize),
}

/// Whose turn it is
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    /// Waiting for player input; `selecting_move` after choosing to fight
    PlayerTurn { selecting_move: bool },
    OpponentTurn,
    Resolving(Pending),
    Ended(Outcome),
}

/// Top-level player choices
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerAction {
    /// Open the move menu
    Fight,
    /// Try to escape
    Run,
    /// Use a named item from the inventory
    UseItem(String),
}

/// One side of the encounter
#[derive(Debug, Clone, PartialEq)]
pub struct Combatant {
    pub name: String,
    pub hp: u32,
    pub max_hp: u32,
    pub mp: u32,
    pub max_mp: u32,
    /// Single-use mitigation for the next incoming hit
    pub defense: Option<Defense>,
    pub moves: Vec<Move>,
}

impl Combatant {
    /// Build the player side at full HP/MP
    pub fn player(stats: &PlayerStats) -> Self {
        Self {
            name: stats.name.clone(),
            hp: stats.max_hp,
            max_hp: stats.max_hp,
            mp: stats.max_mp,
            max_mp: stats.max_mp,
            defense: None,
            moves: stats.moves.clone(),
        }
    }

    /// Build an opponent from its template
    pub fn opponent(template: &OpponentTemplate, mp_floor: u32) -> Self {
        let max_mp = template.max_mp(mp_floor);
        Self {
            name: template.name.clone(),
            hp: template.max_hp,
            max_hp: template.max_hp,
            mp: max_mp,
            max_mp,
            defense: None,
            moves: template.moves.clone(),
        }
    }

    pub fn is_defeated(&self) -> bool {
        self.hp == 0
    }

    /// Restore HP up to max, returning the amount actually gained
    pub fn heal(&mut self, amount: u32) -> u32 {
        let before = self.hp;
        self.hp = self.hp.saturating_add(amount).min(self.max_hp);
        self.hp - before
    }

    /// Restore MP up to max, returning the amount actually gained
    pub fn restore_mp(&mut self, amount: u32) -> u32 {
        let before = self.mp;
        self.mp = self.mp.saturating_add(amount).min(self.max_mp);
        self.mp - before
    }

    /// Lose HP, never below zero
    pub fn take_damage(&mut self, amount: u32) {
        self.hp = self.hp.saturating_sub(amount);
    }

    /// Current vitals
    pub fn vitals(&self) -> Vitals {
        Vitals {
            hp: self.hp,
            max_hp: self.max_hp,
            mp: self.mp,
            max_mp: self.max_mp,
        }
    }

    fn restore(&mut self, resource: Resource, amount: u32) -> u32 {
        match resource {
            Resource::Hp => self.heal(amount),
            Resource::Mp => self.restore_mp(amount),
        }
    }

    /// Lower a flat standing defense; fractional defenses are unaffected
    fn weaken_defense(&mut self, amount: u32) {
        if let Some(Defense::Flat(flat)) = self.defense {
            let left = flat.saturating_sub(amount);
            self.defense = if left == 0 {
                None
            } else {
                Some(Defense::Flat(left))
            };
        }
    }
}

/// One battle between the player and a single opponent
#[derive(Debug, Clone)]
pub struct Encounter {
    id: Uuid,
    rules: CombatRules,
    player_stats: PlayerStats,
    template: OpponentTemplate,
    player: Combatant,
    opponent: Combatant,
    phase: Phase,
    used_moves: HashSet<String>,
}

impl Encounter {
    /// Start a new encounter on the player's turn
    pub fn start(player_stats: PlayerStats, template: OpponentTemplate, rules: CombatRules) -> Self {
        let player = Combatant::player(&player_stats);
        let opponent = Combatant::opponent(&template, rules.opponent_mp_floor);
        let id = Uuid::new_v4();

        info!(
            encounter = %id,
            "{} (HP {}, MP {}) vs {} (HP {}, MP {})",
            player.name, player.max_hp, player.max_mp, opponent.name, opponent.max_hp, opponent.max_mp
        );

        Self {
            id,
            rules,
            player_stats,
            template,
            player,
            opponent,
            phase: Phase::PlayerTurn {
                selecting_move: false,
            },
            used_moves: HashSet::new(),
        }
    }

    /// The opening announcement
    pub fn announce(&self) -> Resolution {
        self.resolution(
            vec![
                CombatEvent::Challenged {
                    opponent: self.opponent.name.clone(),
                },
                CombatEvent::AwaitingAction,
            ],
            Vec::new(),
        )
    }

    /// Start over against the same opponent with fresh combatants
    pub fn reset(&mut self) -> Resolution {
        self.player = Combatant::player(&self.player_stats);
        self.opponent = Combatant::opponent(&self.template, self.rules.opponent_mp_floor);
        self.phase = Phase::PlayerTurn {
            selecting_move: false,
        };
        self.used_moves.clear();
        self.id = Uuid::new_v4();
        info!(encounter = %self.id, "encounter reset");
        self.announce()
    }

    /// Close the encounter, returning how it ended (`None` if abandoned)
    pub fn end(self) -> Option<Outcome> {
        match self.phase {
            Phase::Ended(outcome) => Some(outcome),
            _ => {
                info!(encounter = %self.id, "encounter abandoned");
                None
            }
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn player(&self) -> &Combatant {
        &self.player
    }

    pub fn opponent(&self) -> &Combatant {
        &self.opponent
    }

    pub fn rules(&self) -> &CombatRules {
        &self.rules
    }

    pub fn player_stats(&self) -> &PlayerStats {
        &self.player_stats
    }

    pub fn template(&self) -> &OpponentTemplate {
        &self.template
    }

    pub fn used_moves(&self) -> &HashSet<String> {
        &self.used_moves
    }

    pub fn is_over(&self) -> bool {
        matches!(self.phase, Phase::Ended(_))
    }

    pub fn outcome(&self) -> Option<&Outcome> {
        match &self.phase {
            Phase::Ended(outcome) => Some(outcome),
            _ => None,
        }
    }

    pub fn vitals(&self) -> VitalsPair {
        VitalsPair {
            player: self.player.vitals(),
            opponent: self.opponent.vitals(),
        }
    }

    /// Check whether a player move could be used right now
    pub fn check_player_move(&self, move_id: &str) -> Result<usize, Rejection> {
        self.ensure_player_turn()?;

        let index = self
            .player
            .moves
            .iter()
            .position(|m| m.id == move_id)
            .ok_or_else(|| Rejection::UnknownMove(move_id.to_string()))?;
        let mv = &self.player.moves[index];

        if mv.once_per_encounter && self.used_moves.contains(&mv.id) {
            return Err(Rejection::OnCooldown(mv.name.clone()));
        }
        if !mv.affordable_with(self.player.mp) {
            return Err(Rejection::InsufficientMp {
                name: mv.name.clone(),
                cost: mv.mp_cost,
                available: self.player.mp,
            });
        }
        Ok(index)
    }

    /// Handle a top-level player choice
    pub fn submit_player_action(
        &mut self,
        action: PlayerAction,
        inventory: &mut dyn Inventory,
        rolls: &mut impl Rolls,
    ) -> Result<Resolution, Rejection> {
        self.ensure_player_turn()?;

        let events = match action {
            PlayerAction::Fight => {
                self.phase = Phase::PlayerTurn {
                    selecting_move: true,
                };
                vec![CombatEvent::ChooseMove]
            }
            PlayerAction::Run => {
                let roll = rolls.die(20) + self.rules.escape_bonus;
                if roll >= self.rules.escape_dc {
                    info!(encounter = %self.id, roll, "player escaped");
                    self.phase = Phase::Ended(Outcome::Escaped);
                    vec![CombatEvent::Escaped { roll }]
                } else {
                    debug!(encounter = %self.id, roll, "escape failed");
                    self.phase = Phase::OpponentTurn;
                    vec![CombatEvent::EscapeFailed { roll }]
                }
            }
            PlayerAction::UseItem(name) => {
                let consumable = inventory
                    .take_consumable(&name)
                    .ok_or(Rejection::NoUsableItem(name))?;
                let amount = consumable.dice.roll(rolls);
                self.player.restore(consumable.restores, amount);
                debug!(encounter = %self.id, item = %consumable.name, amount, "item used");
                self.phase = Phase::OpponentTurn;
                vec![CombatEvent::ItemUsed {
                    item: consumable.name,
                    resource: consumable.restores,
                    amount,
                }]
            }
        };

        Ok(self.resolution(events, Vec::new()))
    }

    /// Commit a player move: pay its cost and start resolving it
    pub fn select_move(&mut self, move_id: &str) -> Result<Resolution, Rejection> {
        let index = self.check_player_move(move_id)?;
        let mv = &self.player.moves[index];

        self.player.mp -= mv.mp_cost;
        let event = CombatEvent::MoveUsed {
            actor: self.player.name.clone(),
            move_name: mv.name.clone(),
        };
        debug!(encounter = %self.id, move_id, mp = self.player.mp, "player move committed");

        self.phase = Phase::Resolving(Pending::PlayerMove(index));
        Ok(self.resolution(vec![event], Vec::new()))
    }

    /// Commit the opponent's move for this turn
    pub fn begin_opponent_turn(&mut self, rolls: &mut impl Rolls) -> Result<Resolution, Rejection> {
        match self.phase {
            Phase::OpponentTurn => {}
            Phase::Resolving(_) => return Err(Rejection::Resolving),
            Phase::Ended(_) => return Err(Rejection::Ended),
            Phase::PlayerTurn { .. } => return Err(Rejection::NotOpponentTurn),
        }

        let Some(index) = choose_move(&self.opponent.moves, self.opponent.mp, rolls) else {
            // Nothing to do; the turn still ends normally
            let events = self.end_opponent_turn();
            return Ok(self.resolution(events, Vec::new()));
        };

        let mv = &self.opponent.moves[index];
        debug!(encounter = %self.id, move_id = %mv.id, mp = self.opponent.mp, "opponent move chosen");
        let event = CombatEvent::MoveUsed {
            actor: self.opponent.name.clone(),
            move_name: mv.name.clone(),
        };
        self.phase = Phase::Resolving(Pending::OpponentMove(index));
        Ok(self.resolution(vec![event], Vec::new()))
    }

    /// Apply the committed move and advance the phase
    pub fn finish_resolution(&mut self, rolls: &mut impl Rolls) -> Result<Resolution, Rejection> {
        match self.phase {
            Phase::Resolving(Pending::PlayerMove(index)) => Ok(self.resolve_player_move(index, rolls)),
            Phase::Resolving(Pending::OpponentMove(index)) => {
                Ok(self.resolve_opponent_move(index, rolls))
            }
            Phase::Ended(_) => Err(Rejection::Ended),
            _ => Err(Rejection::NothingPending),
        }
    }

    /// Select and resolve a player move in one step
    pub fn perform_player_move(
        &mut self,
        move_id: &str,
        rolls: &mut impl Rolls,
    ) -> Result<Resolution, Rejection> {
        let announced = self.select_move(move_id)?;
        let applied = self.finish_resolution(rolls)?;
        Ok(announced.then(applied))
    }

    /// Choose and resolve the opponent's move in one step
    pub fn resolve_opponent_turn(&mut self, rolls: &mut impl Rolls) -> Result<Resolution, Rejection> {
        let announced = self.begin_opponent_turn(rolls)?;
        if !matches!(self.phase, Phase::Resolving(_)) {
            return Ok(announced);
        }
        let applied = self.finish_resolution(rolls)?;
        Ok(announced.then(applied))
    }

    fn ensure_player_turn(&self) -> Result<(), Rejection> {
        match self.phase {
            Phase::PlayerTurn { .. } => Ok(()),
            Phase::OpponentTurn => Err(Rejection::NotPlayerTurn),
            Phase::Resolving(_) => Err(Rejection::Resolving),
            Phase::Ended(_) => Err(Rejection::Ended),
        }
    }

    fn resolve_player_move(&mut self, index: usize, rolls: &mut impl Rolls) -> Resolution {
        let mv = self.player.moves[index].clone();
        let amount = mv.dice.roll(rolls);
        let mut events = Vec::new();

        match mv.effect {
            MoveEffect::Heal => {
                self.player.heal(amount);
                events.push(CombatEvent::Healed {
                    actor: self.player.name.clone(),
                    amount,
                });
            }
            MoveEffect::Defense { defense } => {
                self.player.defense = Some(defense);
                events.push(CombatEvent::Defended {
                    actor: self.player.name.clone(),
                });
            }
            MoveEffect::PhysicalDamage | MoveEffect::ElementalDamage { .. } => {
                let damage = self.roll_crit(amount, rolls, &mut events);
                self.opponent.take_damage(damage);
                events.push(CombatEvent::Damaged {
                    source: mv.name.clone(),
                    amount: damage,
                });
            }
            MoveEffect::Drain => {
                self.opponent.take_damage(amount);
                self.player.heal(amount / 2);
                events.push(CombatEvent::Drained {
                    actor: self.player.name.clone(),
                    amount,
                });
            }
            MoveEffect::Debuff => {
                self.opponent.weaken_defense(amount);
                events.push(CombatEvent::DefenseWeakened {
                    actor: self.player.name.clone(),
                    amount,
                });
            }
        }

        if mv.once_per_encounter {
            self.used_moves.insert(mv.id.clone());
        }
        debug!(
            encounter = %self.id,
            move_id = %mv.id,
            amount,
            opponent_hp = self.opponent.hp,
            "player move resolved"
        );

        if self.opponent.is_defeated() {
            let loot = self
                .template
                .loot
                .generate_drops(self.rules.drop_chances(), rolls);
            info!(encounter = %self.id, drops = loot.len(), "victory");

            events.push(CombatEvent::Victory);
            if !loot.is_empty() {
                events.push(CombatEvent::LootDropped {
                    items: loot.iter().map(|l| l.name.clone()).collect(),
                });
            }
            self.phase = Phase::Ended(Outcome::Victory { loot: loot.clone() });
            return self.resolution(events, loot);
        }

        self.phase = Phase::OpponentTurn;
        self.resolution(events, Vec::new())
    }

    fn resolve_opponent_move(&mut self, index: usize, rolls: &mut impl Rolls) -> Resolution {
        let mv = self.opponent.moves[index].clone();
        let amount = mv.dice.roll(rolls);
        self.opponent.mp = self.opponent.mp.saturating_sub(mv.mp_cost);
        let mut events = Vec::new();

        match mv.effect {
            MoveEffect::Heal => {
                self.opponent.heal(amount);
                events.push(CombatEvent::Healed {
                    actor: self.opponent.name.clone(),
                    amount,
                });
            }
            MoveEffect::Drain => {
                // Only a flat defense blunts a drain, and it is not used up
                let drained = match self.player.defense {
                    Some(Defense::Flat(flat)) => amount.saturating_sub(flat),
                    _ => amount,
                };
                self.player.take_damage(drained);
                self.opponent.heal(drained / 2);
                events.push(CombatEvent::Drained {
                    actor: self.opponent.name.clone(),
                    amount: drained,
                });
            }
            MoveEffect::Debuff => {
                self.player.weaken_defense(amount);
                events.push(CombatEvent::DefenseWeakened {
                    actor: self.opponent.name.clone(),
                    amount,
                });
            }
            // Anything else is a hit, even a defensive move with no dice
            MoveEffect::PhysicalDamage
            | MoveEffect::ElementalDamage { .. }
            | MoveEffect::Defense { .. } => {
                let mut damage = self.roll_crit(amount, rolls, &mut events);
                if let Some(defense) = self.player.defense.take() {
                    damage = defense.mitigate(damage);
                }
                self.player.take_damage(damage);
                events.push(CombatEvent::Damaged {
                    source: self.opponent.name.clone(),
                    amount: damage,
                });
            }
        }

        debug!(
            encounter = %self.id,
            move_id = %mv.id,
            amount,
            player_hp = self.player.hp,
            "opponent move resolved"
        );

        if self.player.is_defeated() {
            info!(encounter = %self.id, "defeat");
            events.push(CombatEvent::Defeat);
            self.phase = Phase::Ended(Outcome::Defeat);
            return self.resolution(events, Vec::new());
        }

        events.extend(self.end_opponent_turn());
        self.resolution(events, Vec::new())
    }

    /// Regenerate player MP and hand the turn back
    fn end_opponent_turn(&mut self) -> Vec<CombatEvent> {
        let mut events = Vec::new();
        let gained = self.player.restore_mp(self.rules.mp_regen);
        if gained > 0 {
            events.push(CombatEvent::Regenerated { amount: gained });
        }
        events.push(CombatEvent::AwaitingAction);
        self.phase = Phase::PlayerTurn {
            selecting_move: false,
        };
        events
    }

    fn roll_crit(&self, amount: u32, rolls: &mut impl Rolls, events: &mut Vec<CombatEvent>) -> u32 {
        if rolls.chance(self.rules.crit_chance) {
            events.push(CombatEvent::CriticalHit);
            amount.saturating_mul(2)
        } else {
            amount
        }
    }

    fn resolution(&self, events: Vec<CombatEvent>, loot: Vec<LootEntry>) -> Resolution {
        Resolution {
            events,
            vitals: self.vitals(),
            loot,
        }
    }
}
