//! Per-tile property fields from independent noise functions.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::config::FieldConfig;
use super::grid::{SoilComponents, Tile, TileGrid, TileProperties};
use crate::error::WorldGenError;
use crate::noise::{sample_fractal_noise_2d, sample_unit, FractalNoiseConfig};
use crate::random::SeededStream;

/// One noise seed per field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSeeds {
    pub temperature: i32,
    pub moisture: i32,
    pub light: i32,
    pub altitude: i32,
    pub seasonality: i32,
    pub temperature_overlay: i32,
    pub moisture_overlay: i32,
    pub sand: i32,
    pub silt: i32,
    pub clay: i32,
    pub organic: i32,
}

impl FieldSeeds {
    /// Seeds from labelled child streams of `stream`. The parent is not
    /// advanced.
    pub fn derive(stream: &SeededStream) -> Self {
        let seed = |label: &str| stream.derive(label).next_seed();
        Self {
            temperature: seed("temperature"),
            moisture: seed("moisture"),
            light: seed("light"),
            altitude: seed("altitude"),
            seasonality: seed("seasonality"),
            temperature_overlay: seed("temperature-overlay"),
            moisture_overlay: seed("moisture-overlay"),
            sand: seed("sand"),
            silt: seed("silt"),
            clay: seed("clay"),
            organic: seed("organic"),
        }
    }
}

/// Per-field noise configurations, built once per grid.
struct FieldSamplers {
    temperature: FractalNoiseConfig,
    moisture: FractalNoiseConfig,
    light: FractalNoiseConfig,
    altitude: FractalNoiseConfig,
    seasonality: FractalNoiseConfig,
    temperature_overlay: FractalNoiseConfig,
    moisture_overlay: FractalNoiseConfig,
    sand: FractalNoiseConfig,
    silt: FractalNoiseConfig,
    clay: FractalNoiseConfig,
    organic: FractalNoiseConfig,
}

impl FieldSamplers {
    fn new(cfg: &FieldConfig, seeds: &FieldSeeds) -> Self {
        let base = |divisor, seed| FractalNoiseConfig::from_divisor(divisor, cfg.octaves, seed);
        let single = |divisor, seed| FractalNoiseConfig::from_divisor(divisor, 1, seed);
        Self {
            temperature: base(cfg.temperature_divisor, seeds.temperature),
            moisture: base(cfg.moisture_divisor, seeds.moisture),
            light: base(cfg.light_divisor, seeds.light),
            altitude: base(cfg.altitude_divisor, seeds.altitude),
            seasonality: base(cfg.seasonality_divisor, seeds.seasonality),
            temperature_overlay: single(cfg.overlay_divisor, seeds.temperature_overlay),
            moisture_overlay: single(cfg.overlay_divisor, seeds.moisture_overlay),
            sand: single(cfg.sand_divisor, seeds.sand),
            silt: single(cfg.silt_divisor, seeds.silt),
            clay: single(cfg.clay_divisor, seeds.clay),
            organic: single(cfg.organic_divisor, seeds.organic),
        }
    }

    fn base(&self, x: f32, y: f32) -> TileProperties {
        TileProperties {
            temperature: sample_unit(x, y, &self.temperature),
            moisture: sample_unit(x, y, &self.moisture),
            light: sample_unit(x, y, &self.light),
            altitude: sample_unit(x, y, &self.altitude),
            seasonality: sample_unit(x, y, &self.seasonality),
        }
    }

    fn overlay(&self, x: f32, y: f32, props: &mut TileProperties, cfg: &FieldConfig) {
        if cfg.temperature_overlay_factor != 0.0 {
            let n = sample_fractal_noise_2d(x, y, &self.temperature_overlay) as f64;
            let t = props.temperature;
            props.temperature = (t + t * n * cfg.temperature_overlay_factor).clamp(0.0, 1.0);
        }
        if cfg.moisture_overlay_amount != 0.0 {
            let n = sample_fractal_noise_2d(x, y, &self.moisture_overlay) as f64;
            props.moisture = (props.moisture + cfg.moisture_overlay_amount * n).clamp(0.0, 1.0);
        }
    }

    fn soil(&self, x: f32, y: f32) -> SoilComponents {
        SoilComponents::normalized(
            sample_unit(x, y, &self.sand),
            sample_unit(x, y, &self.silt),
            sample_unit(x, y, &self.clay),
            sample_unit(x, y, &self.organic),
        )
    }
}

/// Properties and soil of a single tile.
pub fn sample_tile(x: u32, y: u32, cfg: &FieldConfig, seeds: &FieldSeeds) -> (TileProperties, SoilComponents) {
    let samplers = FieldSamplers::new(cfg, seeds);
    sample_with(&samplers, x, y, cfg)
}

fn sample_with(samplers: &FieldSamplers, x: u32, y: u32, cfg: &FieldConfig) -> (TileProperties, SoilComponents) {
    let (fx, fy) = (x as f32, y as f32);
    let mut props = samplers.base(fx, fy);
    samplers.overlay(fx, fy, &mut props, cfg);
    let soil = if cfg.soil {
        samplers.soil(fx, fy)
    } else {
        SoilComponents::default()
    };
    (props, soil)
}

/// Generates a `width x height` grid of unresolved tiles.
///
/// Tiles are independent, so they are evaluated in parallel; results are
/// collected in row-major order and do not depend on the thread count.
pub fn generate_tile_fields(
    width: u32,
    height: u32,
    cfg: &FieldConfig,
    seeds: &FieldSeeds,
) -> Result<TileGrid, WorldGenError> {
    cfg.validate()?;
    if width == 0 || height == 0 {
        return Err(WorldGenError::config(format!(
            "tile grid must be non-empty, got {}x{}",
            width, height
        )));
    }

    let samplers = FieldSamplers::new(cfg, seeds);
    let count = width as usize * height as usize;
    let tiles: Vec<Tile> = (0..count)
        .into_par_iter()
        .map(|i| {
            let x = (i % width as usize) as u32;
            let y = (i / width as usize) as u32;
            let (properties, soil) = sample_with(&samplers, x, y, cfg);
            Tile {
                x,
                y,
                properties,
                soil,
                biome_id: None,
            }
        })
        .collect();

    debug!(width, height, "tile fields generated");
    TileGrid::from_tiles(width, height, tiles)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeds(s: &str) -> FieldSeeds {
        FieldSeeds::derive(&SeededStream::new(s))
    }

    #[test]
    fn values_stay_in_unit_range() {
        let grid = generate_tile_fields(24, 16, &FieldConfig::default(), &seeds("range")).unwrap();
        assert_eq!(grid.len(), 24 * 16);
        for tile in grid.tiles() {
            for v in tile.properties.as_array() {
                assert!((0.0..=1.0).contains(&v), "value {} out of range", v);
            }
            assert!((tile.soil.total() - 1.0).abs() < 1e-9);
            assert!(tile.biome_id.is_none());
        }
    }

    #[test]
    fn same_seeds_same_fields() {
        let a = generate_tile_fields(16, 16, &FieldConfig::default(), &seeds("same")).unwrap();
        let b = generate_tile_fields(16, 16, &FieldConfig::default(), &seeds("same")).unwrap();
        for (ta, tb) in a.tiles().iter().zip(b.tiles()) {
            assert_eq!(ta.properties, tb.properties);
            assert_eq!(ta.soil, tb.soil);
        }
    }

    #[test]
    fn different_seeds_differ() {
        let a = generate_tile_fields(16, 16, &FieldConfig::default(), &seeds("one")).unwrap();
        let b = generate_tile_fields(16, 16, &FieldConfig::default(), &seeds("two")).unwrap();
        assert!(a.tiles().iter().zip(b.tiles()).any(|(x, y)| x.properties != y.properties));
    }

    #[test]
    fn grid_matches_single_tile_sampling() {
        let cfg = FieldConfig::default();
        let s = seeds("single");
        let grid = generate_tile_fields(8, 5, &cfg, &s).unwrap();
        let (props, soil) = sample_tile(6, 3, &cfg, &s);
        assert_eq!(grid.get(6, 3).properties, props);
        assert_eq!(grid.get(6, 3).soil, soil);
    }

    #[test]
    fn overlay_only_nudges_temperature_and_moisture() {
        let s = seeds("overlay");
        let base = generate_tile_fields(12, 12, &FieldConfig::without_overlay(), &s).unwrap();
        let with = generate_tile_fields(12, 12, &FieldConfig::default(), &s).unwrap();
        for (b, w) in base.tiles().iter().zip(with.tiles()) {
            assert_eq!(b.properties.light, w.properties.light);
            assert_eq!(b.properties.altitude, w.properties.altitude);
            assert_eq!(b.properties.seasonality, w.properties.seasonality);
            assert!((b.properties.temperature - w.properties.temperature).abs() < 0.05);
            assert!((b.properties.moisture - w.properties.moisture).abs() < 0.1);
        }
    }

    #[test]
    fn deriving_seeds_does_not_touch_parent() {
        use crate::random::RandomStream;
        let mut a = SeededStream::new("parent");
        let mut b = SeededStream::new("parent");
        let _ = FieldSeeds::derive(&a);
        assert_eq!(a.next_f64(), b.next_f64());
    }

    #[test]
    fn empty_grid_is_rejected() {
        assert!(generate_tile_fields(0, 4, &FieldConfig::default(), &seeds("x")).is_err());
    }
}
