//! Seeded stream contract and its ChaCha-backed implementation.

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use rand_seeder::Seeder;

use crate::error::WorldGenError;

/// A source of uniform floats in `[0, 1)`.
///
/// Consumption order is part of the determinism contract: callers must draw
/// in the same order to reproduce a world.
pub trait RandomStream {
    /// Next uniform value in `[0, 1)`.
    fn next_f64(&mut self) -> f64;

    /// Uniform integer in `[min, exclusive_max)`.
    fn int_between(&mut self, min: i64, exclusive_max: i64) -> Result<i64, WorldGenError> {
        if min >= exclusive_max {
            return Err(WorldGenError::config(format!(
                "empty integer range [{}, {})",
                min, exclusive_max
            )));
        }
        let span = (exclusive_max - min) as f64;
        let offset = (self.next_f64() * span).floor() as i64;
        Ok((min + offset).min(exclusive_max - 1))
    }

    /// Uniform index into a collection of length `len`.
    fn array_index(&mut self, len: usize) -> Result<usize, WorldGenError> {
        if len == 0 {
            return Err(WorldGenError::config("cannot pick an index from an empty collection"));
        }
        Ok(self.int_between(0, len as i64)? as usize)
    }
}

/// Production stream: a seed string hashed into a ChaCha8 generator.
#[derive(Debug, Clone)]
pub struct SeededStream {
    seed: String,
    rng: ChaCha8Rng,
}

impl SeededStream {
    /// Creates a stream for the given seed string.
    pub fn new(seed: &str) -> Self {
        let rng: ChaCha8Rng = Seeder::from(seed).make_rng();
        Self {
            seed: seed.to_string(),
            rng,
        }
    }

    /// The seed string this stream was built from.
    pub fn seed(&self) -> &str {
        &self.seed
    }

    /// Independent child stream keyed by `label`.
    ///
    /// Drawing from the child never advances the parent.
    pub fn derive(&self, label: &str) -> Self {
        Self::new(&format!("{}/{}", self.seed, label))
    }

    /// Draws a 32-bit seed suitable for a noise function.
    pub fn next_seed(&mut self) -> i32 {
        self.rng.gen::<i32>()
    }
}

impl RandomStream for SeededStream {
    fn next_f64(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}

/// Replays a fixed list of values cyclically.
///
/// Used by tests to force particular draws.
#[derive(Debug, Clone)]
pub struct ScriptedStream {
    values: Vec<f64>,
    cursor: usize,
}

impl ScriptedStream {
    pub fn new(values: Vec<f64>) -> Self {
        assert!(!values.is_empty(), "scripted stream needs at least one value");
        Self { values, cursor: 0 }
    }

    /// A stream that always returns `value`.
    pub fn constant(value: f64) -> Self {
        Self::new(vec![value])
    }

    /// Number of values drawn so far.
    pub fn draws(&self) -> usize {
        self.cursor
    }
}

impl RandomStream for ScriptedStream {
    fn next_f64(&mut self) -> f64 {
        let v = self.values[self.cursor % self.values.len()];
        self.cursor += 1;
        v.clamp(0.0, 1.0 - f64::EPSILON)
    }
}
