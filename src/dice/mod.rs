//! Injectable dice source
//!
//! All randomness in the engine and the AI flows through the
//! [`DiceRoller`] trait so behavior is reproducible: seed a
//! [`SeededDice`] for deterministic play, or script exact rolls with
//! [`ScriptedDice`] for tests and replays.

use crate::core::error::{GridspireError, Result};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::VecDeque;

/// Die faces recognized by content (standard polyhedral set)
const LEGAL_FACES: [u32; 7] = [4, 6, 8, 10, 12, 20, 100];

/// Maximum dice per roll; more than this is a content bug
const MAX_DICE_COUNT: u32 = 100;

/// Source of dice rolls and uniform random draws
pub trait DiceRoller {
    /// Roll `count` dice with `faces` sides and sum them
    fn roll_dice(&mut self, count: u32, faces: u32) -> Result<i32>;

    /// Roll standard notation: `NdM`, `NdM+K`, `NdM-K`, or `dM`
    fn roll_notation(&mut self, notation: &str) -> Result<i32> {
        let parsed = parse_notation(notation)?;
        let rolled = self.roll_dice(parsed.count, parsed.faces)?;
        Ok(rolled + parsed.modifier)
    }

    /// Uniform draw in [0, 1)
    fn uniform(&mut self) -> f64;
}

/// Parsed dice notation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiceNotation {
    pub count: u32,
    pub faces: u32,
    pub modifier: i32,
}

/// Parse `NdM[+/-K]` notation
///
/// The count defaults to 1 when omitted (`d20` == `1d20`).
pub fn parse_notation(notation: &str) -> Result<DiceNotation> {
    let trimmed = notation.trim();
    let lower = trimmed.to_ascii_lowercase();

    let d_index = lower
        .find('d')
        .ok_or_else(|| GridspireError::BadDiceNotation(trimmed.to_string()))?;

    let count_part = &lower[..d_index];
    let rest = &lower[d_index + 1..];

    let count: u32 = if count_part.is_empty() {
        1
    } else {
        count_part
            .parse()
            .map_err(|_| GridspireError::BadDiceNotation(trimmed.to_string()))?
    };

    let (faces_part, modifier) = if let Some(plus) = rest.find('+') {
        let modifier: i32 = rest[plus + 1..]
            .parse()
            .map_err(|_| GridspireError::BadDiceNotation(trimmed.to_string()))?;
        (&rest[..plus], modifier)
    } else if let Some(minus) = rest.find('-') {
        let modifier: i32 = rest[minus + 1..]
            .parse()
            .map_err(|_| GridspireError::BadDiceNotation(trimmed.to_string()))?;
        (&rest[..minus], -modifier)
    } else {
        (rest, 0)
    };

    let faces: u32 = faces_part
        .parse()
        .map_err(|_| GridspireError::BadDiceNotation(trimmed.to_string()))?;

    validate_roll(count, faces)?;

    Ok(DiceNotation {
        count,
        faces,
        modifier,
    })
}

fn validate_roll(count: u32, faces: u32) -> Result<()> {
    if !LEGAL_FACES.contains(&faces) {
        return Err(GridspireError::UnknownDieType(faces));
    }
    if count == 0 || count > MAX_DICE_COUNT {
        return Err(GridspireError::BadDiceCount(count));
    }
    Ok(())
}

/// Deterministic dice source backed by a seeded ChaCha8 stream
#[derive(Debug, Clone)]
pub struct SeededDice {
    rng: ChaCha8Rng,
}

impl SeededDice {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl DiceRoller for SeededDice {
    fn roll_dice(&mut self, count: u32, faces: u32) -> Result<i32> {
        validate_roll(count, faces)?;
        let mut total = 0;
        for _ in 0..count {
            total += self.rng.gen_range(1..=faces) as i32;
        }
        Ok(total)
    }

    fn uniform(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}

/// Dice source replaying a fixed sequence
///
/// Dice rolls pop from the front of the queue; when the queue runs dry
/// every die comes up 1. Uniform draws replay a separate queue and
/// fall back to 0.0. Used by tests and replay tooling.
#[derive(Debug, Clone, Default)]
pub struct ScriptedDice {
    rolls: VecDeque<i32>,
    uniforms: VecDeque<f64>,
}

impl ScriptedDice {
    pub fn new(rolls: Vec<i32>) -> Self {
        Self {
            rolls: rolls.into(),
            uniforms: VecDeque::new(),
        }
    }

    pub fn with_uniforms(mut self, uniforms: Vec<f64>) -> Self {
        self.uniforms = uniforms.into();
        self
    }
}

impl DiceRoller for ScriptedDice {
    fn roll_dice(&mut self, count: u32, faces: u32) -> Result<i32> {
        validate_roll(count, faces)?;
        // One scripted value stands in for the whole roll
        Ok(self.rolls.pop_front().unwrap_or(count as i32))
    }

    fn uniform(&mut self) -> f64 {
        self.uniforms.pop_front().unwrap_or(0.0)
    }
}
