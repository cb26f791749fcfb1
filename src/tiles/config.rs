//! Tile grid and property-field configuration.

use serde::{Deserialize, Serialize};

use crate::error::WorldGenError;

/// Noise parameters for the per-tile property fields.
///
/// Divisors are in tiles: a field with divisor 60 is sampled at
/// `(x / 60, y / 60)`, so larger divisors give broader features.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldConfig {
    /// Octaves per base field.
    pub octaves: u8,

    // --- Base fields ---
    pub temperature_divisor: f32,
    pub moisture_divisor: f32,
    pub light_divisor: f32,
    pub altitude_divisor: f32,
    pub seasonality_divisor: f32,

    // --- Overlay ---
    /// Divisor for the overlay fields. 1 gives per-tile jitter.
    pub overlay_divisor: f32,
    /// `temperature' = t + t * noise * factor`.
    pub temperature_overlay_factor: f64,
    /// `moisture' = m + noise * amount`.
    pub moisture_overlay_amount: f64,

    // --- Soil ---
    pub soil: bool,
    pub sand_divisor: f32,
    pub silt_divisor: f32,
    pub clay_divisor: f32,
    pub organic_divisor: f32,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            octaves: 4,

            temperature_divisor: 60.0,
            moisture_divisor: 40.0,
            light_divisor: 80.0,
            altitude_divisor: 50.0,
            seasonality_divisor: 70.0,

            overlay_divisor: 1.0,
            temperature_overlay_factor: 0.01,
            moisture_overlay_amount: 0.02,

            soil: true,
            sand_divisor: 15.0,
            silt_divisor: 20.0,
            clay_divisor: 17.0,
            organic_divisor: 20.0,
        }
    }
}

impl FieldConfig {
    /// Base fields only: no overlay, no soil.
    pub fn without_overlay() -> Self {
        Self {
            temperature_overlay_factor: 0.0,
            moisture_overlay_amount: 0.0,
            soil: false,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), WorldGenError> {
        if self.octaves == 0 {
            return Err(WorldGenError::config("field octaves must be positive"));
        }
        let divisors = [
            ("temperature", self.temperature_divisor),
            ("moisture", self.moisture_divisor),
            ("light", self.light_divisor),
            ("altitude", self.altitude_divisor),
            ("seasonality", self.seasonality_divisor),
            ("overlay", self.overlay_divisor),
            ("sand", self.sand_divisor),
            ("silt", self.silt_divisor),
            ("clay", self.clay_divisor),
            ("organic", self.organic_divisor),
        ];
        for (name, d) in divisors {
            if !d.is_finite() || d <= 0.0 {
                return Err(WorldGenError::config(format!(
                    "{} divisor must be positive, got {}",
                    name, d
                )));
            }
        }
        if !self.temperature_overlay_factor.is_finite() || !self.moisture_overlay_amount.is_finite() {
            return Err(WorldGenError::config("overlay amplitudes must be finite"));
        }
        Ok(())
    }
}

/// Tile grid size and biome growth parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TileGridConfig {
    pub width: u32,
    pub height: u32,
    /// Number of sparse growth start points.
    pub start_points: usize,
    /// Minimum Euclidean spacing between start points, in tiles.
    pub min_start_distance: f64,
    /// Candidate draws per requested start point before giving up.
    pub start_attempts_per_point: usize,
    /// Classifier candidates considered for fresh picks.
    pub top_n: usize,
}

impl Default for TileGridConfig {
    fn default() -> Self {
        Self {
            width: 200,
            height: 200,
            start_points: 8,
            min_start_distance: 20.0,
            start_attempts_per_point: 1000,
            top_n: 3,
        }
    }
}

impl TileGridConfig {
    /// A small grid for previews and tests.
    pub fn small() -> Self {
        Self {
            width: 48,
            height: 32,
            start_points: 4,
            min_start_distance: 6.0,
            ..Default::default()
        }
    }

    pub fn tile_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn max_start_attempts(&self) -> usize {
        self.start_points.saturating_mul(self.start_attempts_per_point)
    }

    pub fn validate(&self) -> Result<(), WorldGenError> {
        if self.width == 0 || self.height == 0 {
            return Err(WorldGenError::config(format!(
                "tile grid must be non-empty, got {}x{}",
                self.width, self.height
            )));
        }
        if self.start_points == 0 {
            return Err(WorldGenError::config("start point count must be positive"));
        }
        if self.start_points > self.tile_count() {
            return Err(WorldGenError::config(format!(
                "{} start points do not fit in {} tiles",
                self.start_points,
                self.tile_count()
            )));
        }
        if !self.min_start_distance.is_finite() || self.min_start_distance < 0.0 {
            return Err(WorldGenError::config(format!(
                "minimum start distance must be non-negative, got {}",
                self.min_start_distance
            )));
        }
        if self.start_attempts_per_point == 0 {
            return Err(WorldGenError::config("start attempts per point must be positive"));
        }
        if self.top_n == 0 {
            return Err(WorldGenError::config("top_n must be positive"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(FieldConfig::default().validate().is_ok());
        assert!(FieldConfig::without_overlay().validate().is_ok());
        assert!(TileGridConfig::default().validate().is_ok());
        assert!(TileGridConfig::small().validate().is_ok());
        assert_eq!(TileGridConfig::default().tile_count(), 40_000);
    }

    #[test]
    fn bad_field_values_are_rejected() {
        let cfg = FieldConfig {
            moisture_divisor: 0.0,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
        let cfg = FieldConfig {
            octaves: 0,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn bad_grid_values_are_rejected() {
        let bad = [
            TileGridConfig { width: 0, ..Default::default() },
            TileGridConfig { start_points: 0, ..Default::default() },
            TileGridConfig { top_n: 0, ..Default::default() },
            TileGridConfig { width: 2, height: 2, start_points: 5, ..Default::default() },
            TileGridConfig { min_start_distance: -1.0, ..Default::default() },
        ];
        for cfg in bad {
            assert!(matches!(cfg.validate(), Err(WorldGenError::Configuration(_))));
        }
    }
}
