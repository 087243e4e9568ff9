//! Opponent move selection

use tracing::debug;

use super::moves::{Move, MoveEffect};
use super::rolls::Rolls;

/// Choose the index of the opponent's next move
///
/// Picks uniformly among moves the opponent can afford. With nothing
/// affordable it falls back to free-standing physical attacks, and failing
/// that to the first move in the list. Returns `None` only for an empty
/// roster.
pub fn choose_move(moves: &[Move], mp: u32, rolls: &mut impl Rolls) -> Option<usize> {
    if moves.is_empty() {
        return None;
    }

    let mut eligible: Vec<usize> = moves
        .iter()
        .enumerate()
        .filter(|(_, m)| m.affordable_with(mp))
        .map(|(i, _)| i)
        .collect();

    if eligible.is_empty() {
        eligible = moves
            .iter()
            .enumerate()
            .filter(|(_, m)| m.effect == MoveEffect::PhysicalDamage)
            .map(|(i, _)| i)
            .collect();
        debug!(mp, fallback = eligible.len(), "no affordable moves");
    }

    if eligible.is_empty() {
        return Some(0);
    }

    Some(eligible[rolls.index(eligible.len())])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::dice::DiceExpr;
    use crate::combat::moves::OpponentKind;
    use crate::combat::rolls::{GameRng, ScriptedRolls};

    #[test]
    fn test_only_affordable_moves_are_chosen() {
        let moves = OpponentKind::AncientSkeleton.template().moves;
        let mut rng = GameRng::from_seed(17);
        // Reassemble costs 5
        for _ in 0..100 {
            assert_eq!(choose_move(&moves, 4, &mut rng), Some(0));
        }
    }

    #[test]
    fn test_uniform_pick_among_affordable() {
        let moves = OpponentKind::AncientSkeleton.template().moves;
        let mut rolls = ScriptedRolls::new().indices([1, 0]);
        assert_eq!(choose_move(&moves, 10, &mut rolls), Some(1));
        assert_eq!(choose_move(&moves, 10, &mut rolls), Some(0));
    }

    #[test]
    fn test_falls_back_to_physical_when_broke() {
        // Both Dark Mage moves cost MP; Shadow Bolt is physical
        let moves = OpponentKind::DarkMage.template().moves;
        let mut rolls = ScriptedRolls::new().indices([0]);
        assert_eq!(choose_move(&moves, 0, &mut rolls), Some(0));
    }

    #[test]
    fn test_falls_back_to_first_move() {
        let moves = vec![
            Move::new("drain", "Drain", MoveEffect::Drain, DiceExpr::new(1, 4, 0)).costs(3),
            Move::new("mend", "Mend", MoveEffect::Heal, DiceExpr::new(1, 4, 0)).costs(3),
        ];
        let mut rolls = ScriptedRolls::new().indices([1]);
        assert_eq!(choose_move(&moves, 0, &mut rolls), Some(0));
    }

    #[test]
    fn test_empty_roster() {
        let mut rolls = ScriptedRolls::new();
        assert_eq!(choose_move(&[], 10, &mut rolls), None);
    }
}
