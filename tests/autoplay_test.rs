//! Seeded autoplay sessions run to completion

mod common;

use skirmish::combat::Rarity;
use skirmish::{
    Bag, CharacterClass, Command, GameRng, Item, OpponentKind, Outcome, Pacing, Resolution,
    Session,
};

async fn autoplay(class: CharacterClass, kind: OpponentKind, seed: u64) -> (Vec<Resolution>, Session<GameRng>) {
    let mut bag = Bag::new();
    bag.add(Item::new("Minor Mana Potion", "", Rarity::Uncommon));
    let mut session = Session::new(
        common::start(class, kind),
        bag,
        GameRng::from_seed(seed),
        Pacing::instant(),
    );

    let mut log = Vec::new();
    for _ in 0..500 {
        if session.encounter().is_over() {
            break;
        }
        let command = session.autoplay_command();
        assert_ne!(command, Command::Quit);
        session
            .handle(command, &mut |r| log.push(r.clone()))
            .await
            .expect("autoplay only issues valid commands");
    }
    (log, session)
}

#[tokio::test]
async fn test_autoplay_finishes_every_matchup() {
    for &class in CharacterClass::all() {
        for &kind in OpponentKind::all() {
            let (log, session) = autoplay(class, kind, 7).await;
            assert!(session.encounter().is_over(), "{} vs {} never ended", class, kind);
            assert!(!log.is_empty());
        }
    }
}

#[tokio::test]
async fn test_victory_loot_lands_in_bag() {
    for seed in 0..40 {
        let (log, session) = autoplay(CharacterClass::Warrior, OpponentKind::GoblinWarrior, seed).await;
        let won: usize = log.iter().map(|r| r.loot.len()).sum();
        let starting = session.bag().len();
        let (outcome, bag) = session.finish();

        if let Some(Outcome::Victory { loot }) = outcome {
            assert!(!loot.is_empty());
            assert_eq!(won, loot.len());
            assert_eq!(bag.len(), starting);
            assert!(bag.items().iter().any(|i| i.name == loot[0].name));
            return;
        }
    }
    panic!("no seed produced a victory");
}

#[tokio::test]
async fn test_same_seed_same_story() {
    let (a, _) = autoplay(CharacterClass::Rogue, OpponentKind::DireWolf, 99).await;
    let (b, _) = autoplay(CharacterClass::Rogue, OpponentKind::DireWolf, 99).await;
    let messages = |log: &[Resolution]| log.iter().flat_map(|r| r.messages()).collect::<Vec<_>>();
    assert_eq!(messages(&a), messages(&b));
}
