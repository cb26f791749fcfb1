//! Multi-octave fractal Brownian motion (fBm) noise on the plane.

use serde::{Deserialize, Serialize};
use simdnoise::NoiseBuilder;

/// Configuration for multi-octave fractal noise generation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FractalNoiseConfig {
    /// Number of noise octaves.
    pub octaves: u8,
    /// Base frequency in cycles per tile. A field with a "divisor" of 60
    /// uses `1.0 / 60.0`.
    pub frequency: f32,
    /// Frequency multiplier per octave (typically 2.0).
    pub lacunarity: f32,
    /// Amplitude decay per octave (0.4-0.6 typical).
    pub persistence: f32,
    /// Random seed for reproducible generation.
    pub seed: i32,
}

impl Default for FractalNoiseConfig {
    fn default() -> Self {
        Self {
            octaves: 4,
            frequency: 1.0 / 50.0,
            lacunarity: 2.0,
            persistence: 0.5,
            seed: 42,
        }
    }
}

impl FractalNoiseConfig {
    pub fn with_seed(seed: i32) -> Self {
        Self {
            seed,
            ..Default::default()
        }
    }

    /// Field sampled at `(x / divisor, y / divisor)`.
    pub fn from_divisor(divisor: f32, octaves: u8, seed: i32) -> Self {
        Self {
            octaves,
            frequency: 1.0 / divisor,
            seed,
            ..Default::default()
        }
    }
}

/// Samples fractal noise at a plane position.
///
/// Each octave is a single simplex evaluation with its own seed offset.
///
/// # Returns
/// A noise value in approximately [-1, 1] range (normalized by amplitude sum)
pub fn sample_fractal_noise_2d(x: f32, y: f32, config: &FractalNoiseConfig) -> f32 {
    let mut total = 0.0f32;
    let mut amplitude = 1.0f32;
    let mut frequency = config.frequency;
    let mut max_amplitude = 0.0f32;

    for octave in 0..config.octaves.max(1) {
        let octave_seed = config.seed.wrapping_add(octave as i32 * 31337);

        let noise_value = NoiseBuilder::fbm_2d_offset(x * frequency, 1, y * frequency, 1)
            .with_seed(octave_seed)
            .with_freq(1.0)
            .with_octaves(1)
            .generate()
            .0[0];

        total += noise_value * amplitude;
        max_amplitude += amplitude;
        amplitude *= config.persistence;
        frequency *= config.lacunarity;
    }

    total / max_amplitude
}

/// Fractal noise mapped from `[-1, 1]` to `[0, 1]`, clamped.
pub fn sample_unit(x: f32, y: f32, config: &FractalNoiseConfig) -> f64 {
    let n = sample_fractal_noise_2d(x, y, config) as f64;
    ((n + 1.0) * 0.5).clamp(0.0, 1.0)
}
