//! Tile grid and per-tile property fields.
//!
//! Every tile carries five normalized environmental properties
//! (temperature, moisture, light, altitude, seasonality) and a soil mix, all
//! sampled from independent seeded noise fields, plus a biome id that stays
//! unset until biome growth resolves it.

mod config;
mod grid;
mod fields;

pub use config::{FieldConfig, TileGridConfig};
pub use grid::{SoilComponents, Tile, TileGrid, TileProperties};
pub use fields::{FieldSeeds, generate_tile_fields, sample_tile};
