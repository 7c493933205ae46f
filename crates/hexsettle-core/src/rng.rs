//! Injected randomness.
//!
//! The engine never touches a global generator. Dice, theft and bot
//! tie-breaking all draw from a [`RandomSource`] handed in by the caller,
//! so a fixed seed replays a whole match.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// Source of every random decision the engine makes
pub trait RandomSource {
    /// One six-sided die, 1..=6
    fn draw_die(&mut self) -> u8;

    /// Uniform index in `0..len`. `len` is never zero.
    fn pick_index(&mut self, len: usize) -> usize;

    /// Uniform float in `[0, 1)`
    fn next_unit(&mut self) -> f64;

    /// Shuffle a sequence in place
    fn shuffle<T>(&mut self, items: &mut [T])
    where
        Self: Sized,
    {
        for i in (1..items.len()).rev() {
            let j = self.pick_index(i + 1);
            items.swap(i, j);
        }
    }

    /// Two dice, summed
    fn roll_dice(&mut self) -> (u8, u8) {
        (self.draw_die(), self.draw_die())
    }
}

/// `StdRng`-backed source for real play and reproducible simulations
#[derive(Debug, Clone)]
pub struct SeededRandom {
    rng: StdRng,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl RandomSource for SeededRandom {
    fn draw_die(&mut self) -> u8 {
        self.rng.gen_range(1..=6)
    }

    fn pick_index(&mut self, len: usize) -> usize {
        self.rng.gen_range(0..len.max(1))
    }

    fn next_unit(&mut self) -> f64 {
        self.rng.gen()
    }

    fn shuffle<T>(&mut self, items: &mut [T]) {
        items.shuffle(&mut self.rng);
    }
}

/// Replays fixed scripts, cycling when a script runs out.
///
/// Dice default to 1, picks to 0 and unit draws to 0.0 (always "accept").
#[derive(Debug, Clone, Default)]
pub struct ScriptedDice {
    dice: Vec<u8>,
    picks: Vec<usize>,
    units: Vec<f64>,
    dice_at: usize,
    picks_at: usize,
    units_at: usize,
}

impl ScriptedDice {
    /// Script of single-die faces; pairs of entries make one roll
    pub fn new(dice: Vec<u8>) -> Self {
        Self {
            dice,
            ..Self::default()
        }
    }

    /// Script the whole-roll totals instead of single faces
    pub fn rolls(totals: &[u8]) -> Self {
        let dice = totals
            .iter()
            .flat_map(|&total| {
                let first = total.saturating_sub(1).clamp(1, 6);
                [first, total.saturating_sub(first).max(1)]
            })
            .collect();
        Self::new(dice)
    }

    pub fn with_picks(mut self, picks: Vec<usize>) -> Self {
        self.picks = picks;
        self
    }

    pub fn with_units(mut self, units: Vec<f64>) -> Self {
        self.units = units;
        self
    }
}

fn cycle<T: Copy>(script: &[T], at: &mut usize) -> Option<T> {
    if script.is_empty() {
        return None;
    }
    let value = script[*at % script.len()];
    *at += 1;
    Some(value)
}

impl RandomSource for ScriptedDice {
    fn draw_die(&mut self) -> u8 {
        cycle(&self.dice, &mut self.dice_at).unwrap_or(1)
    }

    fn pick_index(&mut self, len: usize) -> usize {
        cycle(&self.picks, &mut self.picks_at).unwrap_or(0) % len.max(1)
    }

    fn next_unit(&mut self) -> f64 {
        cycle(&self.units, &mut self.units_at).unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_seeded_random_is_reproducible() {
        let mut a = SeededRandom::new(42);
        let mut b = SeededRandom::new(42);
        let rolls_a: Vec<_> = (0..50).map(|_| a.roll_dice()).collect();
        let rolls_b: Vec<_> = (0..50).map(|_| b.roll_dice()).collect();
        assert_eq!(rolls_a, rolls_b);
        assert!(rolls_a.iter().all(|(x, y)| (1..=6).contains(x) && (1..=6).contains(y)));
    }

    #[test]
    fn test_seeded_shuffle_is_a_permutation() {
        let mut rng = SeededRandom::new(3);
        let mut items: Vec<u32> = (0..20).collect();
        rng.shuffle(&mut items);
        let mut sorted = items.clone();
        sorted.sort();
        assert_eq!(sorted, (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn test_scripted_rolls_hit_totals() {
        let mut dice = ScriptedDice::rolls(&[2, 7, 12, 8]);
        let totals: Vec<u8> = (0..4)
            .map(|_| {
                let (a, b) = dice.roll_dice();
                a + b
            })
            .collect();
        assert_eq!(totals, vec![2, 7, 12, 8]);
    }

    #[test]
    fn test_scripted_cycles_and_defaults() {
        let mut dice = ScriptedDice::new(vec![3, 4]).with_picks(vec![5]);
        assert_eq!([dice.draw_die(), dice.draw_die(), dice.draw_die()], [3, 4, 3]);
        assert_eq!(dice.pick_index(3), 2);
        assert_eq!(dice.next_unit(), 0.0);
    }

    #[test]
    fn test_default_shuffle_uses_picks() {
        let mut dice = ScriptedDice::default();
        let mut items = vec!['a', 'b', 'c'];
        dice.shuffle(&mut items);
        // pick 0 every step: swap(2,0) then swap(1,0)
        assert_eq!(items, vec!['b', 'c', 'a']);
    }
}
