//! skirmish - play a single encounter in the terminal

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use skirmish::combat::{Phase, Rarity};
use skirmish::{
    Attributes, Bag, CharacterClass, Command, Config, Encounter, GameRng, Item, OpponentKind,
    Outcome, Pacing, PlayerStats, Race, Rejection, Resolution, Rolls, Session,
};

/// Turn-based combat in the terminal
#[derive(Parser, Debug)]
#[command(name = "skirmish", version, about = "Fight a single D&D-style encounter")]
struct Args {
    /// Character name
    #[arg(long, default_value = "Adventurer")]
    name: String,

    /// Character class (warrior, rogue, mage, cleric)
    #[arg(long, default_value = "warrior")]
    class: String,

    /// Character race (human, elf, dwarf, halfling)
    #[arg(long, default_value = "human")]
    race: String,

    /// Opponent (goblin, wolf, mage, skeleton); random if omitted
    #[arg(long)]
    opponent: Option<String>,

    /// Seed for a reproducible encounter
    #[arg(long)]
    seed: Option<u64>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Let the computer pick the player's moves
    #[arg(long)]
    autoplay: bool,

    /// Print each resolution as a JSON line
    #[arg(long)]
    json: bool,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Logs go to stderr so stdout stays clean for play and --json
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "skirmish=info".into()),
        )
        .with(
            args.log_json
                .then(|| tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr)),
        )
        .with(
            (!args.log_json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr)),
        )
        .init();

    let config = Config::load(args.config.as_deref()).context("failed to load configuration")?;

    let mut rng = match args.seed {
        Some(seed) => GameRng::from_seed(seed),
        None => GameRng::from_entropy(),
    };

    let class = CharacterClass::from_name(&args.class);
    let race: Race = args.race.parse().unwrap_or_else(|e| {
        tracing::warn!("{}, using Human", e);
        Race::Human
    });
    let attributes = Attributes::for_class(class).with_race(race);
    let stats = PlayerStats::derive(&args.name, class, &attributes, &config.rules);

    let kind = match &args.opponent {
        Some(name) => OpponentKind::from_name(name),
        None => OpponentKind::random(&mut rng),
    };
    info!(class = %class, race = %race, opponent = %kind, seed = ?rng.seed(), "starting encounter");

    let mut bag = Bag::new();
    bag.add(Item::new(
        "Minor Mana Potion",
        "Restores a small amount of MP.",
        Rarity::Uncommon,
    ));

    let encounter = Encounter::start(stats, kind.template(), config.rules.clone());
    let pacing = if args.autoplay && args.json {
        Pacing::instant()
    } else {
        config.pacing.clone()
    };
    let out = Renderer { json: args.json };
    let mut emit = |resolution: &Resolution| out.print(out.resolution(resolution));

    emit(&encounter.announce());
    let mut session = Session::new(encounter, bag, rng, pacing);
    out.print(out.menu(&session));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let command = if args.autoplay {
            session.autoplay_command()
        } else {
            match lines.next_line().await? {
                Some(line) => match line.parse::<Command>() {
                    Ok(command) => command,
                    Err(_) => continue,
                },
                None => Command::Quit,
            }
        };

        if command == Command::Help {
            out.print(out.menu(&session));
            continue;
        }

        match session.handle(command, &mut emit).await {
            Ok(true) => {}
            Ok(false) => break,
            Err(rejection) => {
                out.print(out.rejection(&rejection));
                continue;
            }
        }

        if session.encounter().is_over() {
            if args.autoplay {
                break;
            }
            out.print(out.text(["Type 'again' to fight again or 'quit' to leave.".to_string()]));
        } else if matches!(session.encounter().phase(), Phase::PlayerTurn { selecting_move: true }) {
            out.print(out.moves(&session));
        }
    }

    let (outcome, bag) = session.finish();
    out.print(out.summary(outcome.as_ref(), &bag));
    Ok(())
}

/// Turns engine output into stdout lines, either text or one JSON object per line
struct Renderer {
    json: bool,
}

impl Renderer {
    fn print(&self, lines: Vec<String>) {
        for line in lines {
            println!("{}", line);
        }
    }

    /// Lines only shown in text mode
    fn text(&self, lines: impl IntoIterator<Item = String>) -> Vec<String> {
        if self.json {
            Vec::new()
        } else {
            lines.into_iter().collect()
        }
    }

    fn resolution(&self, resolution: &Resolution) -> Vec<String> {
        if self.json {
            return match serde_json::to_string(resolution) {
                Ok(line) => vec![line],
                Err(e) => {
                    tracing::error!("failed to encode resolution: {}", e);
                    Vec::new()
                }
            };
        }
        let v = resolution.vitals;
        let mut lines = resolution.messages();
        lines.push(format!(
            "  [you HP {}/{} MP {}/{}]  [enemy HP {}/{} MP {}/{}]",
            v.player.hp,
            v.player.max_hp,
            v.player.mp,
            v.player.max_mp,
            v.opponent.hp,
            v.opponent.max_hp,
            v.opponent.mp,
            v.opponent.max_mp
        ));
        lines
    }

    fn rejection(&self, rejection: &Rejection) -> Vec<String> {
        if self.json {
            vec![serde_json::json!({ "rejected": rejection.to_string() }).to_string()]
        } else {
            vec![rejection.to_string()]
        }
    }

    fn menu<R: Rolls>(&self, session: &Session<R>) -> Vec<String> {
        let enc = session.encounter();
        let mut lines = vec![
            format!(
                "{} {} vs {} the {}",
                enc.template().glyph,
                enc.opponent().name,
                enc.player().name,
                enc.player_stats().class
            ),
            "Commands: fight, run, item <name>, <move number>, status, again, quit".to_string(),
        ];
        lines.extend(self.moves(session));
        let usable: Vec<&str> = session.bag().usable().map(|i| i.name.as_str()).collect();
        if !usable.is_empty() {
            lines.push(format!("Items: {}", usable.join(", ")));
        }
        self.text(lines)
    }

    fn moves<R: Rolls>(&self, session: &Session<R>) -> Vec<String> {
        self.text(session.move_menu().into_iter().map(|line| format!("  {}", line)))
    }

    fn summary(&self, outcome: Option<&Outcome>, bag: &Bag) -> Vec<String> {
        let mut lines = Vec::new();
        match outcome {
            Some(Outcome::Victory { .. }) => lines.push("You won.".to_string()),
            Some(Outcome::Defeat) => lines.push("You lost.".to_string()),
            Some(Outcome::Escaped) => lines.push("You got away.".to_string()),
            None => {}
        }
        let items: Vec<&str> = bag.items().iter().map(|i| i.name.as_str()).collect();
        lines.push(format!(
            "Bag: {}",
            if items.is_empty() { "empty".to_string() } else { items.join(", ") }
        ));
        self.text(lines)
    }
}
