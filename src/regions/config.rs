//! Configuration for the region layer.

use serde::{Deserialize, Serialize};

use crate::error::WorldGenError;

/// Parameters for tessellation, clustering, land selection and ridges.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionConfig {
    /// Plane width in map units.
    pub width: f64,
    /// Plane height in map units.
    pub height: f64,
    /// Number of Voronoi sites.
    pub point_count: usize,
    /// Number of k-means clusters (regions before repair).
    pub cluster_count: usize,
    /// Iteration cap for k-means.
    pub kmeans_iterations: usize,
    /// Target fraction of regions that become land, in `[0, 1]`.
    pub land_ratio: f64,
    /// Number of cell edges drawn as mountain ridges.
    pub mountain_ridge_count: usize,
}

impl Default for RegionConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            point_count: 50,
            cluster_count: 10,
            kmeans_iterations: 100,
            land_ratio: 0.85,
            mountain_ridge_count: 10,
        }
    }
}

impl RegionConfig {
    /// Cluster count derived the way the map layer picks it: one region per
    /// five sites, at least one.
    pub fn with_points(point_count: usize) -> Self {
        Self {
            point_count,
            cluster_count: (point_count as f64 / 5.0).round().max(1.0) as usize,
            ..Default::default()
        }
    }

    /// A larger archipelago-style map with less land.
    pub fn archipelago() -> Self {
        Self {
            width: 1600.0,
            height: 1200.0,
            point_count: 600,
            cluster_count: 60,
            land_ratio: 0.35,
            mountain_ridge_count: 40,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), WorldGenError> {
        if !(self.width.is_finite() && self.height.is_finite()) || self.width <= 0.0 || self.height <= 0.0 {
            return Err(WorldGenError::config(format!(
                "plane size must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        if self.point_count == 0 {
            return Err(WorldGenError::config("point count must be positive"));
        }
        if self.cluster_count == 0 {
            return Err(WorldGenError::config("cluster count must be positive"));
        }
        if self.cluster_count > self.point_count {
            return Err(WorldGenError::config(format!(
                "cluster count {} exceeds point count {}",
                self.cluster_count, self.point_count
            )));
        }
        if self.kmeans_iterations == 0 {
            return Err(WorldGenError::config("k-means iteration cap must be positive"));
        }
        if !(0.0..=1.0).contains(&self.land_ratio) {
            return Err(WorldGenError::config(format!(
                "land ratio {} is outside [0, 1]",
                self.land_ratio
            )));
        }
        if self.mountain_ridge_count == 0 {
            return Err(WorldGenError::config("mountain ridge count must be positive"));
        }
        Ok(())
    }
}
