//! Biome classification and growth.
//!
//! - a static biome table (ids, preview colours, five property ranges)
//! - a fuzzy classifier ranking biomes for a tile's properties
//! - a seeded work-queue resolver that grows biomes outward from sparse
//!   start points until every tile has an id

mod config;
mod table;
mod classifier;
mod growth;

pub use config::BiomeConfig;
pub use table::{
    Biome, Range, default_biomes, format_hex_color, normalize_celsius, parse_hex_color,
    validate_biomes,
};
pub use classifier::{BiomeClassifier, BiomeGuess, fit_score};
pub use growth::{GrowthSummary, TileState, pick_sparse_points, resolve_biomes};

/// RGB preview colour for a biome id, magenta for unknown ids.
pub fn biome_preview_rgb(biomes: &[Biome], biome_id: u32) -> [u8; 3] {
    biomes
        .iter()
        .find(|b| b.id == biome_id)
        .map_or([255, 0, 255], |b| b.color)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_colors_come_from_the_table() {
        let table = default_biomes();
        assert_eq!(biome_preview_rgb(&table, 3), [0xFF, 0xD7, 0x00]);
        assert_eq!(biome_preview_rgb(&table, 99), [255, 0, 255]);
    }
}
