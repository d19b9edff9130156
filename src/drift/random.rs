//! Random source injected into the engine.
//!
//! Spawn and modifier decisions each draw one uniform value in `[0, 1)`.
//! Any `rand::RngCore` works; the browser host seeds a ChaCha8 generator from
//! the clock so runs differ, tests seed it with a constant so they don't.

use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

pub trait RandomSource {
    /// Uniform draw in `[0, 1)`.
    fn next_unit(&mut self) -> f64;
}

impl<R: RngCore> RandomSource for R {
    fn next_unit(&mut self) -> f64 {
        self.gen::<f64>()
    }
}

/// Reproducible generator for a given seed.
pub fn seeded(seed: u64) -> Box<dyn RandomSource> {
    Box::new(ChaCha8Rng::seed_from_u64(seed))
}

/// Replays a fixed list of draws, then repeats the last one.
#[cfg(test)]
pub struct Scripted {
    values: Vec<f64>,
    next: usize,
}

#[cfg(test)]
impl Scripted {
    pub fn new(values: &[f64]) -> Self {
        Self {
            values: values.to_vec(),
            next: 0,
        }
    }
}

#[cfg(test)]
impl RandomSource for Scripted {
    fn next_unit(&mut self) -> f64 {
        let v = self
            .values
            .get(self.next)
            .or_else(|| self.values.last())
            .copied()
            .unwrap_or(0.5);
        self.next += 1;
        v
    }
}
