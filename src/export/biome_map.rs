//! Biome preview map export.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ImageBuffer, ImageEncoder, Rgb};

use super::ExportError;
use crate::biomes::{Biome, biome_preview_rgb};
use crate::tiles::TileGrid;

/// Options for biome map export.
#[derive(Debug, Clone)]
pub struct BiomeMapOptions {
    pub compression: CompressionType,
    pub filter: FilterType,
    /// RGB color used for tiles without a biome.
    pub unresolved_color: [u8; 3],
    /// Square pixel block drawn per tile.
    pub scale: u32,
}

impl Default for BiomeMapOptions {
    fn default() -> Self {
        Self {
            compression: CompressionType::Default,
            filter: FilterType::Adaptive,
            unresolved_color: [0, 0, 0],
            scale: 1,
        }
    }
}

/// Export the tile grid's biomes as an RGB PNG, one `scale x scale` block
/// per tile, coloured from `biomes`.
pub fn export_biome_map_png(
    grid: &TileGrid,
    biomes: &[Biome],
    path: &Path,
    options: &BiomeMapOptions,
) -> Result<(), ExportError> {
    if grid.resolved_count() == 0 {
        return Err(ExportError::MissingData("biome data"));
    }

    let scale = options.scale.max(1);
    let (width, height) = (grid.width() * scale, grid.height() * scale);
    let img: ImageBuffer<Rgb<u8>, Vec<u8>> = ImageBuffer::from_fn(width, height, |px, py| {
        let tile = grid.get(px / scale, py / scale);
        Rgb(tile
            .biome_id
            .map_or(options.unresolved_color, |id| biome_preview_rgb(biomes, id)))
    });

    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let encoder = PngEncoder::new_with_quality(writer, options.compression, options.filter);
    encoder.write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::biomes::default_biomes;
    use crate::tiles::TileProperties;
    use tempfile::tempdir;

    #[test]
    fn export_biome_map_smoke() {
        let mut grid = TileGrid::uniform(16, 8, TileProperties::default()).unwrap();
        for tile in grid.tiles_mut() {
            tile.biome_id = Some(4);
        }

        let dir = tempdir().unwrap();
        let path = dir.path().join("biomes.png");
        let options = BiomeMapOptions {
            scale: 2,
            ..Default::default()
        };
        export_biome_map_png(&grid, &default_biomes(), &path, &options).unwrap();

        let img = image::open(&path).unwrap().to_rgb8();
        assert_eq!(img.dimensions(), (32, 16));
        assert_eq!(img.get_pixel(31, 15).0, default_biomes()[3].color);
    }

    #[test]
    fn unresolved_grid_is_rejected() {
        let grid = TileGrid::uniform(4, 4, TileProperties::default()).unwrap();
        let dir = tempdir().unwrap();
        let err = export_biome_map_png(
            &grid,
            &default_biomes(),
            &dir.path().join("none.png"),
            &BiomeMapOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ExportError::MissingData(_)));
    }
}
