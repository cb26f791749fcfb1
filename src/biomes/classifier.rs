//! Fuzzy multi-dimensional biome classification.

use serde::{Deserialize, Serialize};

use super::config::BiomeConfig;
use super::table::{Biome, Range};
use crate::error::WorldGenError;
use crate::tiles::TileProperties;

/// One ranked classification candidate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BiomeGuess {
    pub biome_id: u32,
    /// Geometric mean of the five per-dimension fits, in `[0, 1]`.
    pub confidence: f64,
    /// Summed distance outside the biome's ranges; 0 when every value is
    /// inside.
    pub distance: f64,
}

/// Fit of one value against one range: 1 inside, falling linearly to 0
/// across `buffer` outside, 0 beyond.
pub fn fit_score(value: f64, range: Range, buffer: f64) -> f64 {
    let outside = range.distance_outside(value);
    if outside == 0.0 {
        1.0
    } else if buffer <= 0.0 || outside >= buffer {
        0.0
    } else {
        1.0 - outside / buffer
    }
}

/// Scores tile properties against a fixed biome table.
#[derive(Debug, Clone)]
pub struct BiomeClassifier {
    biomes: Vec<Biome>,
    buffer: f64,
}

impl BiomeClassifier {
    pub fn new(config: &BiomeConfig) -> Result<Self, WorldGenError> {
        config.validate()?;
        Ok(Self {
            biomes: config.table.clone(),
            buffer: config.buffer,
        })
    }

    /// Classifier over the built-in table.
    pub fn with_default_table() -> Self {
        let config = BiomeConfig::default();
        Self {
            biomes: config.table,
            buffer: config.buffer,
        }
    }

    pub fn biomes(&self) -> &[Biome] {
        &self.biomes
    }

    pub fn buffer(&self) -> f64 {
        self.buffer
    }

    pub fn biome(&self, id: u32) -> Option<&Biome> {
        self.biomes.iter().find(|b| b.id == id)
    }

    /// Confidence and out-of-range distance of `props` for one biome.
    pub fn score(&self, biome: &Biome, props: &TileProperties) -> BiomeGuess {
        let values = props.as_array();
        let ranges = biome.ranges();
        let mut product = 1.0f64;
        let mut distance = 0.0f64;
        for (v, r) in values.iter().zip(ranges) {
            product *= fit_score(*v, r, self.buffer);
            distance += r.distance_outside(*v);
        }
        BiomeGuess {
            biome_id: biome.id,
            confidence: product.powf(1.0 / values.len() as f64),
            distance,
        }
    }

    /// The `top_n` best candidates: by confidence descending, then by
    /// distance ascending, then table order.
    ///
    /// Never empty; with every confidence at 0 the closest biomes come
    /// first.
    pub fn classify(&self, props: &TileProperties, top_n: usize) -> Result<Vec<BiomeGuess>, WorldGenError> {
        if top_n == 0 {
            return Err(WorldGenError::config("top_n must be positive"));
        }
        let mut guesses: Vec<BiomeGuess> = self.biomes.iter().map(|b| self.score(b, props)).collect();
        guesses.sort_by(|a, b| {
            b.confidence
                .total_cmp(&a.confidence)
                .then_with(|| a.distance.total_cmp(&b.distance))
        });
        guesses.truncate(top_n);
        Ok(guesses)
    }

    /// The single best candidate.
    pub fn best(&self, props: &TileProperties) -> Result<BiomeGuess, WorldGenError> {
        let guesses = self.classify(props, 1)?;
        guesses
            .into_iter()
            .next()
            .ok_or_else(|| WorldGenError::config("biome table is empty"))
    }
}
