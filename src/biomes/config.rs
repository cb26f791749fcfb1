//! Biome table and classifier configuration.

use serde::{Deserialize, Serialize};

use super::table::{default_biomes, validate_biomes, Biome};
use crate::error::WorldGenError;

/// Configuration for biome classification.
///
/// Notes:
/// - Ranges and `buffer` are on the normalized `[0, 1]` property scale.
/// - Biome ids must be unique; they are what the tile grid stores.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BiomeConfig {
    /// The biome table, in tie-break order.
    pub table: Vec<Biome>,
    /// Width of the linear falloff outside each range.
    pub buffer: f64,
}

impl Default for BiomeConfig {
    fn default() -> Self {
        Self {
            table: default_biomes(),
            buffer: 0.5,
        }
    }
}

impl BiomeConfig {
    pub fn validate(&self) -> Result<(), WorldGenError> {
        validate_biomes(&self.table)?;
        if !self.buffer.is_finite() || self.buffer < 0.0 {
            return Err(WorldGenError::config(format!(
                "classifier buffer must be non-negative, got {}",
                self.buffer
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let cfg = BiomeConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.table.len(), 10);
    }

    #[test]
    fn negative_buffer_is_rejected() {
        let cfg = BiomeConfig {
            buffer: -0.1,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }
}
