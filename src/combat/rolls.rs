//! Sources of randomness for combat resolution
//!
//! Every random decision the engine makes (dice faces, critical hits, escape
//! checks, opponent move choice, loot draws) goes through the [`Rolls`]
//! trait. Production code uses [`GameRng`]; tests and replays can use
//! [`ScriptedRolls`] to force specific outcomes.

use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Primitive random draws used by the engine
pub trait Rolls {
    /// Uniform face in `1..=sides`. Returns 0 for a zero-sided die.
    fn die(&mut self, sides: u32) -> u32;

    /// True with probability `p` (clamped to `0.0..=1.0`)
    fn chance(&mut self, p: f64) -> bool;

    /// Uniform index in `0..len`. Returns 0 when `len` is 0.
    fn index(&mut self, len: usize) -> usize;

    /// Uniform value in `0.0..upper`. Returns 0.0 when `upper` is not positive.
    fn fraction(&mut self, upper: f64) -> f64;
}

/// Seedable RNG backed by `StdRng`
#[derive(Debug, Clone)]
pub struct GameRng {
    rng: StdRng,
    seed: Option<u64>,
}

impl GameRng {
    /// Create an RNG seeded from the operating system
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
            seed: None,
        }
    }

    /// Create a deterministic RNG from a seed
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            seed: Some(seed),
        }
    }

    /// The seed this RNG was created with, if any
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }
}

impl Default for GameRng {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl Rolls for GameRng {
    fn die(&mut self, sides: u32) -> u32 {
        if sides == 0 {
            return 0;
        }
        self.rng.random_range(1..=sides)
    }

    fn chance(&mut self, p: f64) -> bool {
        self.rng.random_bool(p.clamp(0.0, 1.0))
    }

    fn index(&mut self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        self.rng.random_range(0..len)
    }

    fn fraction(&mut self, upper: f64) -> f64 {
        if upper <= 0.0 || !upper.is_finite() {
            return 0.0;
        }
        self.rng.random_range(0.0..upper)
    }
}

/// Deterministic rolls fed from queues of predetermined outcomes
///
/// Each queue is consumed front to back. An exhausted queue yields the lowest
/// outcome: face 1, `false`, index 0, or 0.0. Faces are clamped to the die
/// being rolled and indices to the length asked for.
#[derive(Debug, Clone, Default)]
pub struct ScriptedRolls {
    faces: VecDeque<u32>,
    chances: VecDeque<bool>,
    indices: VecDeque<usize>,
    fractions: VecDeque<f64>,
}

impl ScriptedRolls {
    /// Create an empty script (every draw yields its lowest outcome)
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue die faces
    pub fn faces(mut self, faces: impl IntoIterator<Item = u32>) -> Self {
        self.faces.extend(faces);
        self
    }

    /// Queue chance outcomes
    pub fn chances(mut self, chances: impl IntoIterator<Item = bool>) -> Self {
        self.chances.extend(chances);
        self
    }

    /// Queue uniform index picks
    pub fn indices(mut self, indices: impl IntoIterator<Item = usize>) -> Self {
        self.indices.extend(indices);
        self
    }

    /// Queue fractional draws
    pub fn fractions(mut self, fractions: impl IntoIterator<Item = f64>) -> Self {
        self.fractions.extend(fractions);
        self
    }

    /// Whether every queued outcome has been consumed
    pub fn is_exhausted(&self) -> bool {
        self.faces.is_empty()
            && self.chances.is_empty()
            && self.indices.is_empty()
            && self.fractions.is_empty()
    }
}

impl Rolls for ScriptedRolls {
    fn die(&mut self, sides: u32) -> u32 {
        if sides == 0 {
            return 0;
        }
        self.faces.pop_front().unwrap_or(1).clamp(1, sides)
    }

    fn chance(&mut self, _p: f64) -> bool {
        self.chances.pop_front().unwrap_or(false)
    }

    fn index(&mut self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        self.indices.pop_front().unwrap_or(0).min(len - 1)
    }

    fn fraction(&mut self, upper: f64) -> f64 {
        if upper <= 0.0 {
            return 0.0;
        }
        self.fractions.pop_front().unwrap_or(0.0).clamp(0.0, upper)
    }
}
