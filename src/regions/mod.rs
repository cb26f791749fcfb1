//! Region layer: clustering cells into regions, region adjacency,
//! land/water selection and mountain ridge extraction.
//!
//! - k-means grouping of tessellation sites, repaired so every group is a
//!   connected, hole-free patch of cells
//! - merged outer polygons per region
//! - seeded land growth over the region graph
//! - ridge edges drawn from land cell boundaries

mod config;
mod cluster;
mod region;
mod land;
mod ridge;

pub use config::RegionConfig;
pub use cluster::{KMeansResult, enforce_contiguity, group_by_cluster, kmeans};
pub use region::{Region, build_regions, cell_region_lookup};
pub use land::{LandSummary, resolve_land};
pub use ridge::{MountainRidge, extract_ridges, ridge_edge_pool};
