//! Export module for writing world previews to disk.
//!
//! RGB PNG previews of the biome tile grid and the feature map, plus a
//! JSON dump of the world summary.

mod biome_map;
mod feature_map;

use thiserror::Error;

pub use biome_map::{BiomeMapOptions, export_biome_map_png};
pub use feature_map::{export_feature_map_png, export_summary_json};

/// Errors that can occur during export.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image encoding error: {0}")]
    Image(#[from] image::ImageError),
    #[error("JSON encoding error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("No {0} available - run its stage first")]
    MissingData(&'static str),
}
