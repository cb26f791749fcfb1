//! Tile and TileGrid data structures.

use serde::{Deserialize, Serialize};

use crate::error::WorldGenError;

/// The five environmental dimensions a biome is matched against.
///
/// All values are normalized to `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TileProperties {
    pub temperature: f64,
    pub moisture: f64,
    pub light: f64,
    pub altitude: f64,
    pub seasonality: f64,
}

impl TileProperties {
    pub const DIMENSIONS: [&'static str; 5] =
        ["temperature", "moisture", "light", "altitude", "seasonality"];

    pub fn new(temperature: f64, moisture: f64, light: f64, altitude: f64, seasonality: f64) -> Self {
        Self {
            temperature,
            moisture,
            light,
            altitude,
            seasonality,
        }
    }

    /// Values in [`Self::DIMENSIONS`] order.
    pub fn as_array(&self) -> [f64; 5] {
        [
            self.temperature,
            self.moisture,
            self.light,
            self.altitude,
            self.seasonality,
        ]
    }
}

/// Soil makeup of a tile; the four fractions sum to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SoilComponents {
    pub sand: f64,
    pub silt: f64,
    pub clay: f64,
    pub organic: f64,
}

impl Default for SoilComponents {
    fn default() -> Self {
        Self {
            sand: 0.25,
            silt: 0.25,
            clay: 0.25,
            organic: 0.25,
        }
    }
}

impl SoilComponents {
    /// Scales raw non-negative weights so they sum to 1. All-zero weights
    /// give an even split.
    pub fn normalized(sand: f64, silt: f64, clay: f64, organic: f64) -> Self {
        let total = sand + silt + clay + organic;
        if total <= 0.0 || !total.is_finite() {
            return Self::default();
        }
        Self {
            sand: sand / total,
            silt: silt / total,
            clay: clay / total,
            organic: organic / total,
        }
    }

    pub fn total(&self) -> f64 {
        self.sand + self.silt + self.clay + self.organic
    }
}

/// One grid cell of the tile map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tile {
    pub x: u32,
    pub y: u32,
    pub properties: TileProperties,
    pub soil: SoilComponents,
    /// Set exactly once by biome growth.
    pub biome_id: Option<u32>,
}

/// Dense row-major tile grid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TileGrid {
    width: u32,
    height: u32,
    tiles: Vec<Tile>,
}

impl TileGrid {
    /// Wraps row-major tiles. The tile count must be `width * height` and
    /// every tile must sit at its own index.
    pub fn from_tiles(width: u32, height: u32, tiles: Vec<Tile>) -> Result<Self, WorldGenError> {
        if width == 0 || height == 0 {
            return Err(WorldGenError::config(format!(
                "tile grid must be non-empty, got {}x{}",
                width, height
            )));
        }
        let expected = width as usize * height as usize;
        if tiles.len() != expected {
            return Err(WorldGenError::config(format!(
                "tile grid {}x{} needs {} tiles, got {}",
                width,
                height,
                expected,
                tiles.len()
            )));
        }
        for (i, tile) in tiles.iter().enumerate() {
            let (x, y) = ((i % width as usize) as u32, (i / width as usize) as u32);
            if tile.x != x || tile.y != y {
                return Err(WorldGenError::config(format!(
                    "tile at index {} claims ({}, {}), expected ({}, {})",
                    i, tile.x, tile.y, x, y
                )));
            }
        }
        Ok(Self { width, height, tiles })
    }

    /// Grid where every tile has the same properties.
    pub fn uniform(width: u32, height: u32, properties: TileProperties) -> Result<Self, WorldGenError> {
        let tiles = (0..height)
            .flat_map(|y| (0..width).map(move |x| (x, y)))
            .map(|(x, y)| Tile {
                x,
                y,
                properties,
                soil: SoilComponents::default(),
                biome_id: None,
            })
            .collect();
        Self::from_tiles(width, height, tiles)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    #[inline]
    pub fn index(&self, x: u32, y: u32) -> usize {
        (y * self.width + x) as usize
    }

    #[inline]
    pub fn coords(&self, index: usize) -> (u32, u32) {
        (index as u32 % self.width, index as u32 / self.width)
    }

    pub fn contains(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && x < self.width as i64 && y < self.height as i64
    }

    pub fn get(&self, x: u32, y: u32) -> &Tile {
        &self.tiles[self.index(x, y)]
    }

    pub fn get_mut(&mut self, x: u32, y: u32) -> &mut Tile {
        let i = self.index(x, y);
        &mut self.tiles[i]
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn tiles_mut(&mut self) -> &mut [Tile] {
        &mut self.tiles
    }

    /// In-bounds 4-connected neighbours in (-x, +x, -y, +y) order.
    pub fn neighbors4(&self, x: u32, y: u32) -> impl Iterator<Item = (u32, u32)> + '_ {
        const OFFSETS: [(i64, i64); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];
        OFFSETS.iter().filter_map(move |&(dx, dy)| {
            let (nx, ny) = (x as i64 + dx, y as i64 + dy);
            self.contains(nx, ny).then_some((nx as u32, ny as u32))
        })
    }

    pub fn resolved_count(&self) -> usize {
        self.tiles.iter().filter(|t| t.biome_id.is_some()).count()
    }

    pub fn is_resolved(&self) -> bool {
        self.tiles.iter().all(|t| t.biome_id.is_some())
    }

    /// Row-major biome ids, or `None` while any tile is unresolved.
    pub fn biome_ids(&self) -> Option<Vec<u32>> {
        self.tiles.iter().map(|t| t.biome_id).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn soil_normalizes_to_one() {
        let soil = SoilComponents::normalized(1.0, 2.0, 3.0, 4.0);
        assert!((soil.total() - 1.0).abs() < 1e-12);
        assert!((soil.organic - 0.4).abs() < 1e-12);
        assert_eq!(SoilComponents::normalized(0.0, 0.0, 0.0, 0.0), SoilComponents::default());
    }

    #[test]
    fn grid_is_row_major() {
        let grid = TileGrid::uniform(4, 3, TileProperties::default()).unwrap();
        assert_eq!(grid.len(), 12);
        assert_eq!(grid.index(1, 2), 9);
        assert_eq!(grid.coords(9), (1, 2));
        let t = grid.get(3, 1);
        assert_eq!((t.x, t.y), (3, 1));
    }

    #[test]
    fn neighbors_stay_in_bounds_and_keep_order() {
        let grid = TileGrid::uniform(3, 3, TileProperties::default()).unwrap();
        let corner: Vec<_> = grid.neighbors4(0, 0).collect();
        assert_eq!(corner, vec![(1, 0), (0, 1)]);
        let center: Vec<_> = grid.neighbors4(1, 1).collect();
        assert_eq!(center, vec![(0, 1), (2, 1), (1, 0), (1, 2)]);
    }

    #[test]
    fn biome_ids_require_full_resolution() {
        let mut grid = TileGrid::uniform(2, 1, TileProperties::default()).unwrap();
        assert!(grid.biome_ids().is_none());
        grid.get_mut(0, 0).biome_id = Some(3);
        assert_eq!(grid.resolved_count(), 1);
        grid.get_mut(1, 0).biome_id = Some(4);
        assert_eq!(grid.biome_ids(), Some(vec![3, 4]));
        assert!(grid.is_resolved());
    }

    #[test]
    fn mismatched_tiles_are_rejected() {
        assert!(TileGrid::uniform(0, 3, TileProperties::default()).is_err());
        let grid = TileGrid::uniform(2, 2, TileProperties::default()).unwrap();
        let mut tiles = grid.tiles().to_vec();
        tiles.swap(0, 1);
        assert!(TileGrid::from_tiles(2, 2, tiles).is_err());
    }
}
