//! Top-level world configuration record.

use serde::{Deserialize, Serialize};

use crate::biomes::BiomeConfig;
use crate::error::WorldGenError;
use crate::regions::RegionConfig;
use crate::tiles::{FieldConfig, TileGridConfig};

/// Size of the optional rasterized feature map, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureMapConfig {
    pub width: u32,
    pub height: u32,
}

/// Everything a world is generated from.
///
/// All sections fall back to their defaults when missing from a JSON file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Seed string for the shared random stream.
    pub seed: String,
    /// Plane, tessellation, clustering, land and ridge parameters.
    pub regions: RegionConfig,
    /// Tile grid size and biome growth parameters.
    pub tiles: TileGridConfig,
    /// Noise parameters of the tile property fields.
    pub fields: FieldConfig,
    /// Biome table and classifier buffer.
    pub biomes: BiomeConfig,
    /// Rasterize regions and ridges when set.
    pub feature_map: Option<FeatureMapConfig>,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            seed: "1234".to_string(),
            regions: RegionConfig::default(),
            tiles: TileGridConfig::default(),
            fields: FieldConfig::default(),
            biomes: BiomeConfig::default(),
            feature_map: None,
        }
    }
}

impl WorldConfig {
    pub fn with_seed(seed: impl Into<String>) -> Self {
        Self {
            seed: seed.into(),
            ..Default::default()
        }
    }

    /// A quick preview world: default plane, small tile grid, feature map.
    pub fn small(seed: impl Into<String>) -> Self {
        Self {
            seed: seed.into(),
            tiles: TileGridConfig::small(),
            feature_map: Some(FeatureMapConfig {
                width: 160,
                height: 120,
            }),
            ..Default::default()
        }
    }

    /// Parses a JSON document; missing fields take their defaults.
    pub fn from_json(text: &str) -> Result<Self, WorldGenError> {
        serde_json::from_str(text).map_err(|e| WorldGenError::config(format!("invalid config JSON: {}", e)))
    }

    pub fn to_json(&self) -> Result<String, WorldGenError> {
        serde_json::to_string_pretty(self).map_err(|e| WorldGenError::config(format!("cannot encode config: {}", e)))
    }

    /// Checks every parameter before any stage runs.
    pub fn validate(&self) -> Result<(), WorldGenError> {
        if self.seed.is_empty() {
            return Err(WorldGenError::config("seed must not be empty"));
        }
        self.regions.validate()?;
        self.tiles.validate()?;
        self.fields.validate()?;
        self.biomes.validate()?;
        if self.tiles.top_n > self.biomes.table.len() {
            return Err(WorldGenError::config(format!(
                "top_n {} exceeds the {} biomes in the table",
                self.tiles.top_n,
                self.biomes.table.len()
            )));
        }
        if let Some(fm) = self.feature_map {
            if fm.width == 0 || fm.height == 0 {
                return Err(WorldGenError::config(format!(
                    "feature map must be non-empty, got {}x{}",
                    fm.width, fm.height
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_mirror_the_reference_world() {
        let cfg = WorldConfig::default();
        assert_eq!(cfg.seed, "1234");
        assert_eq!(cfg.regions.width, 800.0);
        assert_eq!(cfg.regions.height, 600.0);
        assert_eq!(cfg.regions.point_count, 50);
        assert_eq!(cfg.regions.cluster_count, 10);
        assert_eq!(cfg.regions.land_ratio, 0.85);
        assert_eq!((cfg.tiles.width, cfg.tiles.height), (200, 200));
        assert!(cfg.validate().is_ok());
        assert!(WorldConfig::small("x").validate().is_ok());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let cfg = WorldConfig::from_json(r#"{ "seed": "abc", "regions": { "land_ratio": 0.5 } }"#).unwrap();
        assert_eq!(cfg.seed, "abc");
        assert_eq!(cfg.regions.land_ratio, 0.5);
        assert_eq!(cfg.regions.point_count, 50);
        assert_eq!(cfg.biomes.table.len(), 10);
    }

    #[test]
    fn json_round_trip_keeps_shape() {
        let cfg = WorldConfig::small("round");
        let back = WorldConfig::from_json(&cfg.to_json().unwrap()).unwrap();
        assert_eq!(back.seed, "round");
        assert_eq!(back.feature_map, cfg.feature_map);
        assert_eq!(back.tiles.width, cfg.tiles.width);
        assert_eq!(back.biomes.table.len(), cfg.biomes.table.len());
    }

    #[test]
    fn invalid_configs_are_rejected() {
        let mut cfg = WorldConfig::default();
        cfg.regions.land_ratio = 1.2;
        assert!(matches!(cfg.validate(), Err(WorldGenError::Configuration(_))));

        let mut cfg = WorldConfig::default();
        cfg.tiles.top_n = 11;
        assert!(cfg.validate().is_err());

        let mut cfg = WorldConfig::default();
        cfg.seed.clear();
        assert!(cfg.validate().is_err());

        assert!(WorldConfig::from_json("{ not json").is_err());
    }
}
