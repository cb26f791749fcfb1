//! Mountain ridges drawn from land-region cell edges.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::region::Region;
use crate::error::WorldGenError;
use crate::geometry::{polygon_to_edges, Edge, Tessellation};
use crate::random::RandomStream;

/// Edges picked as ridge markers. No ordering or connectivity between
/// edges is implied.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MountainRidge {
    pub edges: Vec<Edge>,
}

impl MountainRidge {
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

/// Every distinct cell edge of every land region, in region then cell order.
///
/// An edge shared by two land cells appears once.
pub fn ridge_edge_pool(tessellation: &Tessellation, regions: &[Region]) -> Vec<Edge> {
    let mut seen = HashSet::new();
    let mut pool = Vec::new();
    for region in regions.iter().filter(|r| r.is_land) {
        for &cell in &region.cells {
            for edge in polygon_to_edges(&tessellation.cell(cell).polygon) {
                if !edge.is_degenerate() && seen.insert(edge.key()) {
                    pool.push(edge);
                }
            }
        }
    }
    pool
}

/// Removes `count` uniformly random edges from the land edge pool.
///
/// Asking for more edges than the pool holds fails before anything is
/// drawn.
pub fn extract_ridges(
    tessellation: &Tessellation,
    regions: &[Region],
    count: usize,
    rng: &mut dyn RandomStream,
) -> Result<MountainRidge, WorldGenError> {
    if count == 0 {
        return Err(WorldGenError::config("mountain ridge count must be positive"));
    }

    let mut pool = ridge_edge_pool(tessellation, regions);
    if count > pool.len() {
        return Err(WorldGenError::ResourceExhaustion {
            what: "ridge edges",
            requested: count,
            available: pool.len(),
        });
    }

    let mut edges = Vec::with_capacity(count);
    for _ in 0..count {
        let idx = rng.array_index(pool.len())?;
        edges.push(pool.remove(idx));
    }

    debug!(count, remaining = pool.len(), "ridge edges extracted");
    Ok(MountainRidge { edges })
}
