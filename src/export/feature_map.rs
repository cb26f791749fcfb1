//! Feature map and world summary export.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ImageBuffer, ImageEncoder, Rgb};

use super::ExportError;
use crate::pipeline::WorldSummary;
use crate::raster::FeatureMap;

/// Export a feature map as an RGB PNG using each feature's preview colour.
pub fn export_feature_map_png(map: &FeatureMap, path: &Path) -> Result<(), ExportError> {
    if map.cells.is_empty() {
        return Err(ExportError::MissingData("feature map"));
    }

    let img: ImageBuffer<Rgb<u8>, Vec<u8>> =
        ImageBuffer::from_fn(map.width, map.height, |x, y| Rgb(map.get(x, y).preview_rgb()));

    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let encoder = PngEncoder::new_with_quality(writer, CompressionType::Default, FilterType::Adaptive);
    encoder.write_image(img.as_raw(), map.width, map.height, image::ExtendedColorType::Rgb8)?;

    Ok(())
}

/// Write the world summary as pretty-printed JSON.
pub fn export_summary_json(summary: &WorldSummary, path: &Path) -> Result<(), ExportError> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, summary)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::Feature;
    use tempfile::tempdir;

    #[test]
    fn export_feature_map_smoke() {
        let mut map = FeatureMap::new(10, 5);
        map.set(2, 3, Feature::Mountain);
        map.set(0, 0, Feature::Land);

        let dir = tempdir().unwrap();
        let path = dir.path().join("features.png");
        export_feature_map_png(&map, &path).unwrap();

        let img = image::open(&path).unwrap().to_rgb8();
        assert_eq!(img.dimensions(), (10, 5));
        assert_eq!(img.get_pixel(2, 3).0, Feature::Mountain.preview_rgb());
        assert_eq!(img.get_pixel(0, 0).0, Feature::Land.preview_rgb());
        assert_eq!(img.get_pixel(9, 4).0, Feature::Water.preview_rgb());
    }

    #[test]
    fn summary_json_round_trips() {
        let mut summary = WorldSummary {
            regions: 7,
            land_regions: 5,
            ..Default::default()
        };
        summary.biome_counts.insert(3, 12);

        let dir = tempdir().unwrap();
        let path = dir.path().join("summary.json");
        export_summary_json(&summary, &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let back: WorldSummary = serde_json::from_str(&text).unwrap();
        assert_eq!(back, summary);
    }
}
