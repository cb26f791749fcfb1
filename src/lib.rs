//! Seeded procedural world generator.
//!
//! This crate builds a 2D world from a seed string: a Voronoi tessellation
//! of a rectangle is clustered into regions, a share of the regions becomes
//! land, mountain ridges are picked from land cell edges, and a separate
//! tile grid is filled with noise-driven properties and grown into biomes.

pub mod error;
pub mod random;
pub mod geometry;
pub mod regions;
pub mod noise;
pub mod tiles;
pub mod biomes;
pub mod raster;
pub mod pipeline;
pub mod export;

pub use error::WorldGenError;
pub use random::{RandomStream, SeededStream};
pub use geometry::{Bounds, Edge, Tessellation};
pub use regions::{MountainRidge, Region, RegionConfig};
pub use noise::FractalNoiseConfig;
pub use tiles::{FieldConfig, Tile, TileGrid, TileGridConfig, TileProperties};
pub use biomes::{Biome, BiomeClassifier, BiomeConfig};
pub use raster::{Feature, FeatureMap};
pub use pipeline::{GenerationStage, Pipeline, PipelineError, World, WorldConfig, generate_world};
