//! Injectable randomness.
//!
//! Every engine draws dice, shuffles and opponent choices through
//! [`RandomSource`], so a host can swap in [`ScriptedRandom`] to replay an
//! exact game or [`SeededRandom`] for reproducible simulations.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// A uniform integer generator
pub trait RandomSource {
    /// Uniform integer in `min..=max`
    fn rand_int(&mut self, min: i64, max: i64) -> i64;

    /// Uniform index into a collection of `len` items (`len` must be > 0)
    fn pick_index(&mut self, len: usize) -> usize {
        debug_assert!(len > 0, "pick_index on empty collection");
        self.rand_int(0, len as i64 - 1) as usize
    }

    /// Fisher-Yates shuffle
    fn shuffle<T>(&mut self, items: &mut [T])
    where
        Self: Sized,
    {
        for i in (1..items.len()).rev() {
            let j = self.rand_int(0, i as i64) as usize;
            items.swap(i, j);
        }
    }
}

/// Random source backed by `StdRng`
pub struct SeededRandom {
    rng: StdRng,
}

impl SeededRandom {
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl RandomSource for SeededRandom {
    fn rand_int(&mut self, min: i64, max: i64) -> i64 {
        if min >= max {
            return min;
        }
        self.rng.gen_range(min..=max)
    }
}

/// Replays a fixed sequence of values, cycling when exhausted.
///
/// Values outside the requested range are clamped, so a script of `[6, 6]`
/// always rolls double sixes and a script of `[0]` always picks the first
/// candidate.
#[derive(Debug, Clone)]
pub struct ScriptedRandom {
    values: Vec<i64>,
    cursor: usize,
}

impl ScriptedRandom {
    pub fn new(values: Vec<i64>) -> Self {
        Self { values, cursor: 0 }
    }
}

impl RandomSource for ScriptedRandom {
    fn rand_int(&mut self, min: i64, max: i64) -> i64 {
        if self.values.is_empty() {
            return min;
        }
        let value = self.values[self.cursor % self.values.len()];
        self.cursor += 1;
        value.clamp(min, max.max(min))
    }
}

impl<R: RandomSource + ?Sized> RandomSource for Box<R> {
    fn rand_int(&mut self, min: i64, max: i64) -> i64 {
        (**self).rand_int(min, max)
    }
}
