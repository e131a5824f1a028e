//! Randomness seam for the weather model.
//!
//! Every random draw the model makes goes through [`RandomSource`], so the
//! tick function is a pure function of `(state, draws)`. Production code
//! uses [`RngSource`]; the unit tests replay pinned draws instead.

#[cfg(test)]
use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

/// A source of the random draws the weather model needs.
pub trait RandomSource: Send {
    /// A real drawn uniformly from `[low, high]`.
    fn uniform(&mut self, low: f64, high: f64) -> f64;

    /// A real drawn from a normal distribution.
    fn normal(&mut self, mean: f64, std_dev: f64) -> f64;

    /// An integer drawn uniformly from `[low, high]`, both ends inclusive.
    fn int_inclusive(&mut self, low: i32, high: i32) -> i32;

    /// A fair coin flip.
    fn coin(&mut self) -> bool;
}

/// [`RandomSource`] backed by a `rand` generator.
#[derive(Debug, Clone)]
pub struct RngSource<R> {
    rng: R,
}

impl<R: Rng> RngSource<R> {
    /// Wrap an existing generator.
    pub const fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RngSource<StdRng> {
    /// A reproducible source seeded from `seed`.
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    /// A source seeded from operating system entropy.
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_os_rng())
    }
}

impl<R: Rng + Send> RandomSource for RngSource<R> {
    fn uniform(&mut self, low: f64, high: f64) -> f64 {
        if low >= high {
            return low;
        }
        self.rng.random_range(low..=high)
    }

    fn normal(&mut self, mean: f64, std_dev: f64) -> f64 {
        Normal::new(mean, std_dev).map_or(mean, |dist| dist.sample(&mut self.rng))
    }

    fn int_inclusive(&mut self, low: i32, high: i32) -> i32 {
        if low >= high {
            return low;
        }
        self.rng.random_range(low..=high)
    }

    fn coin(&mut self) -> bool {
        self.rng.random_bool(0.5)
    }
}

/// [`RandomSource`] that replays queued draws.
///
/// Each kind of draw has its own queue. When a queue runs dry the source
/// falls back to a neutral value: the midpoint for `uniform`, the mean for
/// `normal`, `low` for `int_inclusive`, and `true` for `coin`. Queued
/// values are returned as-is, without being forced into the requested
/// range, so tests can drive the model's clamps.
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub struct ScriptedRandom {
    uniforms: VecDeque<f64>,
    normals: VecDeque<f64>,
    ints: VecDeque<i32>,
    coins: VecDeque<bool>,
}

#[cfg(test)]
impl ScriptedRandom {
    /// A source with every queue empty.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue uniform draws.
    #[must_use]
    pub fn with_uniforms(mut self, draws: impl IntoIterator<Item = f64>) -> Self {
        self.uniforms.extend(draws);
        self
    }

    /// Queue normal draws.
    #[must_use]
    pub fn with_normals(mut self, draws: impl IntoIterator<Item = f64>) -> Self {
        self.normals.extend(draws);
        self
    }

    /// Queue integer draws.
    #[must_use]
    pub fn with_ints(mut self, draws: impl IntoIterator<Item = i32>) -> Self {
        self.ints.extend(draws);
        self
    }

    /// Queue coin flips.
    #[must_use]
    pub fn with_coins(mut self, flips: impl IntoIterator<Item = bool>) -> Self {
        self.coins.extend(flips);
        self
    }
}

#[cfg(test)]
impl RandomSource for ScriptedRandom {
    fn uniform(&mut self, low: f64, high: f64) -> f64 {
        self.uniforms
            .pop_front()
            .unwrap_or_else(|| low.midpoint(high))
    }

    fn normal(&mut self, mean: f64, _std_dev: f64) -> f64 {
        self.normals.pop_front().unwrap_or(mean)
    }

    fn int_inclusive(&mut self, low: i32, _high: i32) -> i32 {
        self.ints.pop_front().unwrap_or(low)
    }

    fn coin(&mut self) -> bool {
        self.coins.pop_front().unwrap_or(true)
    }
}
