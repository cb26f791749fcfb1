//! Noise generation for the tile property fields.
//!
//! Uses simdnoise for the underlying simplex evaluation.

mod fractal;

pub use fractal::{FractalNoiseConfig, sample_fractal_noise_2d, sample_unit};
