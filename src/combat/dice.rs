//! Dice rolling system
//!
//! Parses and rolls dice notation like "2d6+3", "1d8+2d6" (bonus d6 pool)
//! and "1d8 adv" (roll twice, keep the higher).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::trace;

use super::rolls::Rolls;

/// Sides of the dice in the bonus pool (sneak-attack style dice)
pub const BONUS_DIE_SIDES: u32 = 6;

/// Errors from parsing dice notation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiceParseError {
    #[error("missing 'd' in dice notation: {0}")]
    MissingSeparator(String),

    #[error("invalid dice count: {0}")]
    InvalidCount(String),

    #[error("invalid die sides: {0}")]
    InvalidSides(String),

    #[error("invalid modifier: {0}")]
    InvalidModifier(String),

    #[error("bonus dice must be d6, got d{0}")]
    UnsupportedBonusDie(u32),
}

/// A dice expression: `count`d`sides`, plus bonus d6s, plus a static bonus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct DiceExpr {
    /// Number of dice to roll
    pub count: u32,
    /// Number of sides per die
    pub sides: u32,
    /// Static bonus added last
    #[serde(default)]
    pub bonus: i32,
    /// Roll the whole expression twice and keep the higher result
    #[serde(default)]
    pub advantage: bool,
    /// Extra d6 dice added to the total
    #[serde(default)]
    pub bonus_d6: u32,
}

impl DiceExpr {
    /// An expression with no dice; always rolls 0
    pub const NONE: DiceExpr = DiceExpr {
        count: 0,
        sides: 0,
        bonus: 0,
        advantage: false,
        bonus_d6: 0,
    };

    /// Create a new dice expression
    pub const fn new(count: u32, sides: u32, bonus: i32) -> Self {
        Self {
            count,
            sides,
            bonus,
            advantage: false,
            bonus_d6: 0,
        }
    }

    /// Roll with advantage
    pub const fn with_advantage(mut self) -> Self {
        self.advantage = true;
        self
    }

    /// Add a pool of bonus d6 dice
    pub const fn with_bonus_d6(mut self, dice: u32) -> Self {
        self.bonus_d6 = dice;
        self
    }

    /// Whether this expression rolls nothing and adds nothing
    pub fn is_none(&self) -> bool {
        (self.count == 0 || self.sides == 0) && self.bonus_d6 == 0 && self.bonus == 0
    }

    /// Roll the expression. Totals below zero are clamped to zero.
    pub fn roll(&self, rolls: &mut impl Rolls) -> u32 {
        if self.advantage {
            let plain = DiceExpr {
                advantage: false,
                ..*self
            };
            let first = plain.roll(rolls);
            let second = plain.roll(rolls);
            trace!(expr = %self, first, second, "advantage roll");
            return first.max(second);
        }

        let mut total: i64 = 0;
        if self.sides > 0 {
            for _ in 0..self.count {
                total += i64::from(rolls.die(self.sides));
            }
        }
        for _ in 0..self.bonus_d6 {
            total += i64::from(rolls.die(BONUS_DIE_SIDES));
        }
        total += i64::from(self.bonus);

        let total = total.clamp(0, i64::from(u32::MAX)) as u32;
        trace!(expr = %self, total, "dice roll");
        total
    }

    /// Lowest possible result, ignoring advantage
    pub fn min(&self) -> u32 {
        let dice = if self.sides > 0 { self.count } else { 0 };
        clamp_total(i64::from(dice) + i64::from(self.bonus_d6) + i64::from(self.bonus))
    }

    /// Highest possible result, ignoring advantage
    pub fn max(&self) -> u32 {
        let dice = i64::from(self.count) * i64::from(self.sides);
        let pool = i64::from(self.bonus_d6) * i64::from(BONUS_DIE_SIDES);
        clamp_total(dice + pool + i64::from(self.bonus))
    }
}

fn clamp_total(total: i64) -> u32 {
    total.clamp(0, i64::from(u32::MAX)) as u32
}

impl fmt::Display for DiceExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.count == 0 || self.sides == 0 {
            write!(f, "{}", self.bonus)?;
        } else {
            write!(f, "{}d{}", self.count, self.sides)?;
            if self.bonus_d6 > 0 {
                write!(f, "+{}d{}", self.bonus_d6, BONUS_DIE_SIDES)?;
            }
            if self.bonus > 0 {
                write!(f, "+{}", self.bonus)?;
            } else if self.bonus < 0 {
                write!(f, "{}", self.bonus)?;
            }
        }
        if self.advantage {
            write!(f, " adv")?;
        }
        Ok(())
    }
}

impl FromStr for DiceExpr {
    type Err = DiceParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_dice(s)
    }
}

/// Parse a dice notation string like "2d6+3", "1d8+2d6" or "1d8 adv"
pub fn parse_dice(notation: &str) -> Result<DiceExpr, DiceParseError> {
    let lowered = notation.trim().to_lowercase();

    let (body, advantage) = match lowered.strip_suffix("adv") {
        Some(rest) => (rest.trim_end(), true),
        None => (lowered.as_str(), false),
    };
    let body: String = body.chars().filter(|c| !c.is_whitespace()).collect();

    if body == "0" {
        return Ok(DiceExpr {
            advantage,
            ..DiceExpr::NONE
        });
    }

    let terms = split_terms(&body);
    let (first_sign, first) = terms
        .first()
        .ok_or_else(|| DiceParseError::MissingSeparator(notation.to_string()))?;
    if *first_sign < 0 {
        return Err(DiceParseError::InvalidCount(first.to_string()));
    }

    let (count, sides) = parse_die_term(first)?
        .ok_or_else(|| DiceParseError::MissingSeparator(notation.to_string()))?;

    let mut expr = DiceExpr::new(count, sides, 0);
    expr.advantage = advantage;

    for (sign, term) in terms.iter().skip(1) {
        match parse_die_term(term)? {
            Some((dice, BONUS_DIE_SIDES)) if *sign > 0 => expr.bonus_d6 += dice,
            Some((_, other)) => return Err(DiceParseError::UnsupportedBonusDie(other)),
            None => {
                let value: i32 = term
                    .parse()
                    .map_err(|_| DiceParseError::InvalidModifier(term.to_string()))?;
                expr.bonus += sign * value;
            }
        }
    }

    Ok(expr)
}

/// Split "1d8+2d6-1" into signed terms: [(1, "1d8"), (1, "2d6"), (-1, "1")]
fn split_terms(body: &str) -> Vec<(i32, &str)> {
    let mut terms = Vec::new();
    let mut sign = 1;
    let mut start = 0;

    for (i, c) in body.char_indices() {
        if c == '+' || c == '-' {
            if i > start {
                terms.push((sign, &body[start..i]));
            }
            sign = if c == '-' { -1 } else { 1 };
            start = i + 1;
        }
    }
    if start < body.len() {
        terms.push((sign, &body[start..]));
    }
    terms
}

/// Parse "NdS" into (count, sides); `Ok(None)` if the term has no 'd'
fn parse_die_term(term: &str) -> Result<Option<(u32, u32)>, DiceParseError> {
    let Some(d_pos) = term.find('d') else {
        return Ok(None);
    };

    let count_str = &term[..d_pos];
    let count: u32 = if count_str.is_empty() {
        1 // "d6" means "1d6"
    } else {
        count_str
            .parse()
            .map_err(|_| DiceParseError::InvalidCount(count_str.to_string()))?
    };
    if count == 0 {
        return Err(DiceParseError::InvalidCount(count_str.to_string()));
    }

    let sides_str = &term[d_pos + 1..];
    let sides: u32 = sides_str
        .parse()
        .map_err(|_| DiceParseError::InvalidSides(sides_str.to_string()))?;
    if sides == 0 {
        return Err(DiceParseError::InvalidSides(sides_str.to_string()));
    }

    Ok(Some((count, sides)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::rolls::{GameRng, ScriptedRolls};

    #[test]
    fn test_parse_basic() {
        let expr: DiceExpr = "2d6".parse().unwrap();
        assert_eq!(expr, DiceExpr::new(2, 6, 0));
    }

    #[test]
    fn test_parse_with_modifiers() {
        assert_eq!(parse_dice("1d20+5").unwrap(), DiceExpr::new(1, 20, 5));
        assert_eq!(parse_dice("3d8-2").unwrap(), DiceExpr::new(3, 8, -2));
        assert_eq!(parse_dice("  2D10 + 3 ").unwrap(), DiceExpr::new(2, 10, 3));
        assert_eq!(parse_dice("d6").unwrap(), DiceExpr::new(1, 6, 0));
    }

    #[test]
    fn test_parse_bonus_pool_and_advantage() {
        let sneak = parse_dice("1d8+2d6").unwrap();
        assert_eq!(sneak, DiceExpr::new(1, 8, 0).with_bonus_d6(2));

        let quick = parse_dice("1d8 adv").unwrap();
        assert_eq!(quick, DiceExpr::new(1, 8, 0).with_advantage());

        assert_eq!(parse_dice("0").unwrap(), DiceExpr::NONE);
    }

    #[test]
    fn test_parse_invalid() {
        assert!(matches!(parse_dice("abc"), Err(DiceParseError::MissingSeparator(_))));
        assert!(matches!(parse_dice("2d"), Err(DiceParseError::InvalidSides(_))));
        assert!(matches!(parse_dice("0d6"), Err(DiceParseError::InvalidCount(_))));
        assert!(matches!(parse_dice("2d0"), Err(DiceParseError::InvalidSides(_))));
        assert!(matches!(parse_dice("1d8+x"), Err(DiceParseError::InvalidModifier(_))));
        assert_eq!(
            parse_dice("1d8+1d4"),
            Err(DiceParseError::UnsupportedBonusDie(4))
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(DiceExpr::new(2, 6, 0).to_string(), "2d6");
        assert_eq!(DiceExpr::new(1, 20, 5).to_string(), "1d20+5");
        assert_eq!(DiceExpr::new(3, 8, -2).to_string(), "3d8-2");
        assert_eq!(DiceExpr::new(1, 8, 0).with_bonus_d6(2).to_string(), "1d8+2d6");
        assert_eq!(DiceExpr::new(1, 8, 0).with_advantage().to_string(), "1d8 adv");
    }

    #[test]
    fn test_roll_bounds() {
        let mut rng = GameRng::from_seed(11);
        let expr = DiceExpr::new(2, 6, 3);
        for _ in 0..200 {
            let result = expr.roll(&mut rng);
            assert!(result >= 5, "roll {} below minimum 5", result);
            assert!(result <= 15, "roll {} above maximum 15", result);
        }
        assert_eq!(expr.min(), 5);
        assert_eq!(expr.max(), 15);
    }

    #[test]
    fn test_roll_sums_faces_then_pool_then_bonus() {
        let mut rolls = ScriptedRolls::new().faces([7, 2, 5]);
        let expr = DiceExpr::new(1, 8, 1).with_bonus_d6(2);
        assert_eq!(expr.roll(&mut rolls), 7 + 2 + 5 + 1);
    }

    #[test]
    fn test_advantage_keeps_higher() {
        let expr = DiceExpr::new(1, 8, 0).with_advantage();

        let mut rolls = ScriptedRolls::new().faces([3, 6]);
        assert_eq!(expr.roll(&mut rolls), 6);

        let mut rolls = ScriptedRolls::new().faces([8, 2]);
        assert_eq!(expr.roll(&mut rolls), 8);
    }

    #[test]
    fn test_advantage_with_pool_rolls_whole_expression_twice() {
        // Each side rolls 1d8 + 1d6 + 1
        let expr = DiceExpr::new(1, 8, 1).with_bonus_d6(1).with_advantage();
        let mut rolls = ScriptedRolls::new().faces([2, 2, 4, 3]);
        assert_eq!(expr.roll(&mut rolls), 8);
        assert!(rolls.is_exhausted());
    }

    #[test]
    fn test_none_rolls_zero() {
        let mut rng = GameRng::from_seed(3);
        assert!(DiceExpr::NONE.is_none());
        assert_eq!(DiceExpr::NONE.roll(&mut rng), 0);
        assert_eq!(DiceExpr::default().roll(&mut rng), 0);
    }

    #[test]
    fn test_negative_total_clamps_to_zero() {
        let mut rolls = ScriptedRolls::new().faces([1]);
        assert_eq!(DiceExpr::new(1, 4, -3).roll(&mut rolls), 0);
        assert_eq!(DiceExpr::new(1, 4, -3).min(), 0);
    }
}
