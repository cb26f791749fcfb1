//! Region arena and region adjacency.

use std::collections::BTreeSet;

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::error::WorldGenError;
use crate::geometry::{merge_polygons, polygon_area, Tessellation};

/// A contiguous group of cells with its merged outline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Region {
    /// Index of this region in the arena.
    pub id: usize,
    /// Member cell indices into the tessellation.
    pub cells: Vec<usize>,
    /// Outer boundary loop.
    pub polygon: Vec<DVec2>,
    /// Regions with at least one adjacent member cell, ascending.
    pub neighbors: BTreeSet<usize>,
    /// Set by land/water resolution.
    pub is_land: bool,
}

impl Region {
    pub fn area(&self) -> f64 {
        polygon_area(&self.polygon)
    }

    pub fn is_neighbor(&self, other: usize) -> bool {
        self.neighbors.contains(&other)
    }
}

/// Maps every cell to the group that contains it.
///
/// Fails if a cell is missing from every group or listed twice.
pub fn cell_region_lookup(cell_count: usize, groups: &[Vec<usize>]) -> Result<Vec<usize>, WorldGenError> {
    let mut lookup = vec![usize::MAX; cell_count];
    for (g, group) in groups.iter().enumerate() {
        for &cell in group {
            if cell >= cell_count {
                return Err(WorldGenError::config(format!(
                    "group {} references unknown cell {}",
                    g, cell
                )));
            }
            if lookup[cell] != usize::MAX {
                return Err(WorldGenError::config(format!(
                    "cell {} belongs to groups {} and {}",
                    cell, lookup[cell], g
                )));
            }
            lookup[cell] = g;
        }
    }
    if let Some(cell) = lookup.iter().position(|&g| g == usize::MAX) {
        return Err(WorldGenError::config(format!("cell {} belongs to no group", cell)));
    }
    Ok(lookup)
}

/// Builds one region per group: merged outline plus adjacency derived
/// from cell adjacency.
pub fn build_regions(tessellation: &Tessellation, groups: &[Vec<usize>]) -> Result<Vec<Region>, WorldGenError> {
    let lookup = cell_region_lookup(tessellation.len(), groups)?;

    let mut regions = Vec::with_capacity(groups.len());
    for (id, group) in groups.iter().enumerate() {
        if group.is_empty() {
            return Err(WorldGenError::config(format!("group {} has no cells", id)));
        }
        let polygons: Vec<Vec<DVec2>> = group
            .iter()
            .map(|&c| tessellation.cell(c).polygon.clone())
            .collect();
        let polygon = merge_polygons(&polygons).map_err(|e| match e {
            WorldGenError::Geometry(msg) => WorldGenError::geometry(format!("region {}: {}", id, msg)),
            other => other,
        })?;

        let mut neighbors = BTreeSet::new();
        for &cell in group {
            for &nb in tessellation.neighbors(cell) {
                if lookup[nb] != id {
                    neighbors.insert(lookup[nb]);
                }
            }
        }

        regions.push(Region {
            id,
            cells: group.clone(),
            polygon,
            neighbors,
            is_land: false,
        });
    }
    Ok(regions)
}
