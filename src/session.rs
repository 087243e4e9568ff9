//! Interactive encounter driver
//!
//! A [`Session`] turns text commands into encounter operations, runs the
//! opponent's turn after the player's, and sleeps between resolution phases
//! according to [`Pacing`]. Output goes to a caller-provided sink as
//! [`Resolution`]s so front ends decide how to render them.

use std::str::FromStr;

use tracing::debug;

use crate::combat::{
    CombatEvent, Encounter, Outcome, Phase, PlayerAction, Rejection, Resolution, Rolls,
};
use crate::config::Pacing;
use crate::inventory::{Bag, Inventory};

/// A line of player input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Fight,
    Run,
    Item(String),
    /// Move by menu number (1-based), id or display name
    Move(String),
    Status,
    /// Restart against the same opponent
    Again,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let line = s.trim();
        let (head, rest) = match line.split_once(char::is_whitespace) {
            Some((head, rest)) => (head, rest.trim()),
            None => (line, ""),
        };
        match head.to_lowercase().as_str() {
            "" => Err("empty command".to_string()),
            "fight" | "f" => Ok(Command::Fight),
            "run" | "r" | "flee" => Ok(Command::Run),
            "item" | "use" | "i" if !rest.is_empty() => Ok(Command::Item(rest.to_string())),
            "status" | "s" => Ok(Command::Status),
            "again" => Ok(Command::Again),
            "help" | "?" => Ok(Command::Help),
            "quit" | "q" | "exit" => Ok(Command::Quit),
            _ => Ok(Command::Move(line.to_string())),
        }
    }
}

/// One encounter plus the player's bag and dice
pub struct Session<R: Rolls> {
    encounter: Encounter,
    bag: Bag,
    rolls: R,
    pacing: Pacing,
}

impl<R: Rolls> Session<R> {
    pub fn new(encounter: Encounter, bag: Bag, rolls: R, pacing: Pacing) -> Self {
        Self {
            encounter,
            bag,
            rolls,
            pacing,
        }
    }

    pub fn encounter(&self) -> &Encounter {
        &self.encounter
    }

    pub fn bag(&self) -> &Bag {
        &self.bag
    }

    /// Close the session, returning the outcome (if any) and the bag
    pub fn finish(self) -> (Option<Outcome>, Bag) {
        (self.encounter.end(), self.bag)
    }

    /// Run one command to completion, including the opponent's reply
    ///
    /// Returns `Ok(false)` when the player quits.
    pub async fn handle(
        &mut self,
        command: Command,
        emit: &mut impl FnMut(&Resolution),
    ) -> Result<bool, Rejection> {
        debug!(encounter = %self.encounter.id(), ?command, "command");
        match command {
            Command::Quit => {
                emit(&Resolution {
                    events: vec![CombatEvent::Abandoned],
                    vitals: self.encounter.vitals(),
                    loot: Vec::new(),
                });
                return Ok(false);
            }
            Command::Help => {}
            Command::Status => {
                emit(&Resolution {
                    events: Vec::new(),
                    vitals: self.encounter.vitals(),
                    loot: Vec::new(),
                });
            }
            Command::Again => emit(&self.encounter.reset()),
            Command::Fight => self.act(PlayerAction::Fight, emit).await?,
            Command::Run => self.act(PlayerAction::Run, emit).await?,
            Command::Item(name) => self.act(PlayerAction::UseItem(name), emit).await?,
            Command::Move(choice) => {
                let id = self.move_id(&choice)?;
                let announced = self.encounter.select_move(&id)?;
                emit(&announced);
                tokio::time::sleep(self.pacing.announce()).await;

                let applied = self.encounter.finish_resolution(&mut self.rolls)?;
                self.collect_loot(&applied);
                emit(&applied);
                self.opponent_turn(emit).await?;
            }
        }
        Ok(true)
    }

    /// One menu line per player move, numbered from 1
    ///
    /// Each line shows the effect tag, dice, MP cost and why the move is
    /// unavailable right now, if it is.
    pub fn move_menu(&self) -> Vec<String> {
        self.encounter
            .player()
            .moves
            .iter()
            .enumerate()
            .map(|(i, mv)| {
                let cost = if mv.mp_cost > 0 {
                    format!(", {} MP", mv.mp_cost)
                } else {
                    String::new()
                };
                let status = match self.encounter.check_player_move(&mv.id) {
                    Ok(_) => String::new(),
                    Err(rejection) => format!(" ({})", rejection),
                };
                format!(
                    "{}. {} ({}) [{}{}] {}{}",
                    i + 1,
                    mv.name,
                    mv.effect.label(),
                    mv.dice,
                    cost,
                    mv.description,
                    status
                )
            })
            .collect()
    }

    /// Pick a command for an unattended player
    pub fn autoplay_command(&mut self) -> Command {
        if matches!(self.encounter.phase(), Phase::Ended(_)) {
            return Command::Quit;
        }

        let player = self.encounter.player();
        if player.hp * 3 < player.max_hp {
            if let Some(item) = self.bag.usable().find(|i| i.name.to_lowercase().contains("health")) {
                return Command::Item(item.name.clone());
            }
        }

        let usable: Vec<String> = player
            .moves
            .iter()
            .filter(|m| self.encounter.check_player_move(&m.id).is_ok())
            .map(|m| m.id.clone())
            .collect();
        if usable.is_empty() {
            return Command::Run;
        }
        Command::Move(usable[self.rolls.index(usable.len())].clone())
    }

    async fn act(
        &mut self,
        action: PlayerAction,
        emit: &mut impl FnMut(&Resolution),
    ) -> Result<(), Rejection> {
        let resolution = self
            .encounter
            .submit_player_action(action, &mut self.bag, &mut self.rolls)?;
        emit(&resolution);
        self.opponent_turn(emit).await
    }

    async fn opponent_turn(&mut self, emit: &mut impl FnMut(&Resolution)) -> Result<(), Rejection> {
        if *self.encounter.phase() != Phase::OpponentTurn {
            return Ok(());
        }
        tokio::time::sleep(self.pacing.handoff()).await;

        let announced = self.encounter.begin_opponent_turn(&mut self.rolls)?;
        emit(&announced);
        if !matches!(self.encounter.phase(), Phase::Resolving(_)) {
            return Ok(());
        }
        tokio::time::sleep(self.pacing.opponent_announce()).await;

        let applied = self.encounter.finish_resolution(&mut self.rolls)?;
        emit(&applied);
        Ok(())
    }

    fn collect_loot(&mut self, resolution: &Resolution) {
        if !resolution.loot.is_empty() {
            self.bag.receive_loot(&resolution.loot);
        }
    }

    /// Map a menu number, id or display name to a move id
    fn move_id(&self, choice: &str) -> Result<String, Rejection> {
        let moves = &self.encounter.player().moves;
        if let Ok(n) = choice.parse::<usize>() {
            return n
                .checked_sub(1)
                .and_then(|i| moves.get(i))
                .map(|m| m.id.clone())
                .ok_or_else(|| Rejection::UnknownMove(choice.to_string()));
        }
        let wanted = choice.to_lowercase();
        moves
            .iter()
            .find(|m| m.id == wanted || m.name.to_lowercase() == wanted)
            .map(|m| m.id.clone())
            .ok_or_else(|| Rejection::UnknownMove(choice.to_string()))
    }
}
