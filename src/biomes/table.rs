//! The biome table: ids, names, preview colours and property ranges.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::WorldGenError;
use crate::tiles::TileProperties;

/// Closed interval `[min, max]` on the normalized property scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Range {
    pub min: f64,
    pub max: f64,
}

impl Range {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    pub fn midpoint(&self) -> f64 {
        (self.min + self.max) * 0.5
    }

    /// Distance from `value` to the nearest end of the range; 0 inside.
    pub fn distance_outside(&self, value: f64) -> f64 {
        if value < self.min {
            self.min - value
        } else if value > self.max {
            value - self.max
        } else {
            0.0
        }
    }
}

/// Serde helper for `#RRGGBB` colour strings.
mod hex_color {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(rgb: &[u8; 3], s: S) -> Result<S::Ok, S::Error> {
        super::format_hex_color(*rgb).serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<[u8; 3], D::Error> {
        let text = String::deserialize(d)?;
        super::parse_hex_color(&text).map_err(serde::de::Error::custom)
    }
}

/// Parses `#RRGGBB` (the leading `#` is optional).
pub fn parse_hex_color(text: &str) -> Result<[u8; 3], WorldGenError> {
    let hex = text.strip_prefix('#').unwrap_or(text);
    if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(WorldGenError::config(format!("invalid colour '{}'", text)));
    }
    let channel = |i: usize| {
        u8::from_str_radix(&hex[i..i + 2], 16)
            .map_err(|_| WorldGenError::config(format!("invalid colour '{}'", text)))
    };
    Ok([channel(0)?, channel(2)?, channel(4)?])
}

pub fn format_hex_color(rgb: [u8; 3]) -> String {
    format!("#{:02X}{:02X}{:02X}", rgb[0], rgb[1], rgb[2])
}

/// A named terrain classification defined by five property ranges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Biome {
    pub id: u32,
    pub name: String,
    #[serde(with = "hex_color")]
    pub color: [u8; 3],
    pub temperature: Range,
    pub moisture: Range,
    pub light: Range,
    pub altitude: Range,
    pub seasonality: Range,
}

impl Biome {
    /// Ranges in [`TileProperties::DIMENSIONS`] order.
    pub fn ranges(&self) -> [Range; 5] {
        [
            self.temperature,
            self.moisture,
            self.light,
            self.altitude,
            self.seasonality,
        ]
    }

    /// Properties sitting at the middle of every range.
    pub fn midpoint(&self) -> TileProperties {
        TileProperties::new(
            self.temperature.midpoint(),
            self.moisture.midpoint(),
            self.light.midpoint(),
            self.altitude.midpoint(),
            self.seasonality.midpoint(),
        )
    }
}

/// Maps a temperature in °C onto the normalized scale: -10 °C is 0,
/// 35 °C is 1.
pub fn normalize_celsius(celsius: f64) -> f64 {
    (celsius + 10.0) / 45.0
}

/// Raw row: name, colour, temperature in °C, then moisture, light,
/// altitude and seasonality on a 0..4 scale.
type RawBiome = (&'static str, &'static str, [f64; 2], [f64; 2], [f64; 2], [f64; 2], [f64; 2]);

const RAW_BIOMES: [RawBiome; 10] = [
    ("Tropical Rainforest", "#228B22", [20.0, 30.0], [3.0, 4.0], [2.0, 4.0], [1.0, 2.0], [1.0, 2.0]),
    ("Tropical Dry Forest", "#A0522D", [20.0, 30.0], [2.0, 3.0], [2.0, 3.0], [1.0, 2.0], [2.0, 3.0]),
    ("Savanna", "#FFD700", [20.0, 30.0], [1.5, 2.5], [2.0, 4.0], [1.0, 2.0], [2.0, 3.0]),
    ("Desert", "#EDC9AF", [15.0, 35.0], [1.0, 1.5], [3.0, 4.0], [1.0, 2.0], [1.0, 3.0]),
    ("Temperate Forest", "#6B8E23", [5.0, 20.0], [2.5, 4.0], [2.0, 3.0], [1.0, 3.0], [2.0, 4.0]),
    ("Grassland", "#7CFC00", [5.0, 25.0], [1.5, 2.5], [2.0, 4.0], [1.0, 3.0], [3.0, 4.0]),
    ("Mediterranean", "#FF6347", [15.0, 25.0], [1.5, 2.5], [3.0, 4.0], [1.0, 2.0], [3.0, 4.0]),
    ("Taiga (Boreal Forest)", "#4682B4", [-5.0, 5.0], [2.0, 3.0], [1.0, 2.0], [2.0, 4.0], [3.0, 4.0]),
    ("Tundra", "#B0E0E6", [-10.0, 5.0], [1.5, 2.5], [2.0, 4.0], [3.0, 4.0], [3.0, 4.0]),
    ("Alpine", "#ADD8E6", [-5.0, 10.0], [2.0, 3.0], [2.0, 4.0], [3.0, 4.0], [3.0, 4.0]),
];

/// The built-in ten-biome table, ids 1..=10 in table order.
pub fn default_biomes() -> Vec<Biome> {
    let quarter = |r: [f64; 2]| Range::new(r[0] / 4.0, r[1] / 4.0);
    RAW_BIOMES
        .iter()
        .enumerate()
        .map(|(i, &(name, color, temp, moist, light, alt, season))| Biome {
            id: i as u32 + 1,
            name: name.to_string(),
            // Table colours are literals above.
            color: parse_hex_color(color).unwrap_or([255, 0, 255]),
            temperature: Range::new(normalize_celsius(temp[0]), normalize_celsius(temp[1])),
            moisture: quarter(moist),
            light: quarter(light),
            altitude: quarter(alt),
            seasonality: quarter(season),
        })
        .collect()
}

/// Checks that a table is usable: non-empty, unique ids, ordered finite
/// ranges.
pub fn validate_biomes(biomes: &[Biome]) -> Result<(), WorldGenError> {
    if biomes.is_empty() {
        return Err(WorldGenError::config("biome table is empty"));
    }
    let mut ids = HashSet::new();
    for biome in biomes {
        if !ids.insert(biome.id) {
            return Err(WorldGenError::config(format!("duplicate biome id {}", biome.id)));
        }
        for (dim, range) in TileProperties::DIMENSIONS.iter().zip(biome.ranges()) {
            if !(range.min.is_finite() && range.max.is_finite()) || range.min > range.max {
                return Err(WorldGenError::config(format!(
                    "biome '{}' has an invalid {} range [{}, {}]",
                    biome.name, dim, range.min, range.max
                )));
            }
        }
    }
    Ok(())
}
