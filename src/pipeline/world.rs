//! The products of a generation run.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::biomes::GrowthSummary;
use crate::geometry::Tessellation;
use crate::raster::FeatureMap;
use crate::regions::{LandSummary, MountainRidge, Region};
use crate::tiles::TileGrid;

/// World state built up stage by stage. Each product stays `None` until
/// the stage that owns it has run.
#[derive(Debug, Clone, Default)]
pub struct World {
    pub seed: String,
    pub tessellation: Option<Tessellation>,
    pub regions: Option<Vec<Region>>,
    pub land: Option<LandSummary>,
    pub ridges: Option<MountainRidge>,
    pub tiles: Option<TileGrid>,
    pub growth: Option<GrowthSummary>,
    pub feature_map: Option<FeatureMap>,
}

/// Counts for reporting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldSummary {
    pub cells: usize,
    pub regions: usize,
    pub land_regions: usize,
    pub land_area: f64,
    pub ridge_edges: usize,
    pub tiles: usize,
    /// Tile count per biome id, ascending by id.
    pub biome_counts: BTreeMap<u32, usize>,
}

impl World {
    pub fn new(seed: impl Into<String>) -> Self {
        Self {
            seed: seed.into(),
            ..Default::default()
        }
    }

    pub fn land_regions(&self) -> impl Iterator<Item = &Region> {
        self.regions.iter().flatten().filter(|r| r.is_land)
    }

    pub fn summary(&self) -> WorldSummary {
        let mut biome_counts = BTreeMap::new();
        if let Some(tiles) = &self.tiles {
            for id in tiles.tiles().iter().filter_map(|t| t.biome_id) {
                *biome_counts.entry(id).or_insert(0) += 1;
            }
        }
        WorldSummary {
            cells: self.tessellation.as_ref().map_or(0, |t| t.len()),
            regions: self.regions.as_ref().map_or(0, |r| r.len()),
            land_regions: self.land_regions().count(),
            land_area: self.land_regions().map(|r| r.area()).sum(),
            ridge_edges: self.ridges.as_ref().map_or(0, |r| r.len()),
            tiles: self.tiles.as_ref().map_or(0, |t| t.len()),
            biome_counts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tiles::TileProperties;

    #[test]
    fn empty_world_summary() {
        let world = World::new("s");
        let summary = world.summary();
        assert_eq!(summary, WorldSummary::default());
        assert_eq!(world.seed, "s");
    }

    #[test]
    fn summary_counts_biomes() {
        let mut world = World::new("s");
        let mut grid = TileGrid::uniform(3, 1, TileProperties::default()).unwrap();
        grid.get_mut(0, 0).biome_id = Some(2);
        grid.get_mut(1, 0).biome_id = Some(2);
        grid.get_mut(2, 0).biome_id = Some(5);
        world.tiles = Some(grid);
        let summary = world.summary();
        assert_eq!(summary.tiles, 3);
        assert_eq!(summary.biome_counts.get(&2), Some(&2));
        assert_eq!(summary.biome_counts.get(&5), Some(&1));
    }
}
