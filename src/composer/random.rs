// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Injectable randomness.
//!
//! All stochastic choices in the composer go through [`RandomSource`] so a
//! run can be seeded, and tests can script the exact draws.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of uniform random draws
pub trait RandomSource {
    /// Uniform draw in `[0, 1)`
    fn next_f64(&mut self) -> f64;

    /// Uniform integer in `[0, n)`; returns 0 when `n` is 0
    fn below(&mut self, n: u32) -> u32 {
        if n == 0 {
            return 0;
        }
        ((self.next_f64() * n as f64) as u32).min(n - 1)
    }
}

impl RandomSource for StdRng {
    fn next_f64(&mut self) -> f64 {
        self.gen::<f64>()
    }
}

/// Create a standard RNG, seeded when a seed is given
pub fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Replays a fixed sequence of draws, wrapping around at the end
#[derive(Debug, Clone)]
pub struct ScriptedRandom {
    values: Vec<f64>,
    position: usize,
    draws: usize,
}

impl ScriptedRandom {
    /// Create a source that returns `values` in order
    pub fn new(values: Vec<f64>) -> Self {
        Self {
            values,
            position: 0,
            draws: 0,
        }
    }

    /// Number of draws taken so far
    pub fn draws(&self) -> usize {
        self.draws
    }
}

impl RandomSource for ScriptedRandom {
    fn next_f64(&mut self) -> f64 {
        self.draws += 1;
        if self.values.is_empty() {
            return 0.0;
        }
        let value = self.values[self.position % self.values.len()];
        self.position += 1;
        value.clamp(0.0, 1.0 - f64::EPSILON)
    }
}
