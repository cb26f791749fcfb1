//! Land/water selection over the region graph.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::region::Region;
use crate::error::WorldGenError;
use crate::random::RandomStream;

/// Outcome of [`resolve_land`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LandSummary {
    /// Total number of regions.
    pub total: usize,
    /// `round(total * ratio)`.
    pub target: usize,
    /// Regions flagged as land. May exceed `target` because every pick also
    /// pulls in its unpicked neighbours.
    pub picked: usize,
    /// Largest number of neighbours pulled in by a single pick.
    pub largest_pull: usize,
}

/// Flags roughly `ratio` of the regions as land.
///
/// A uniformly random region is picked together with all of its unpicked
/// neighbours; this repeats (redrawing when the draw hits a region that is
/// already picked) until at least `round(total * ratio)` regions are
/// picked. Picked regions get `is_land = true`, all others `false`.
///
/// `ratio` outside `[0, 1]` fails before any region is touched.
pub fn resolve_land(
    regions: &mut [Region],
    ratio: f64,
    rng: &mut dyn RandomStream,
) -> Result<LandSummary, WorldGenError> {
    if !(0.0..=1.0).contains(&ratio) {
        return Err(WorldGenError::config(format!(
            "land ratio {} is outside [0, 1]",
            ratio
        )));
    }

    let total = regions.len();
    let target = (total as f64 * ratio).round() as usize;
    let mut picked = vec![false; total];
    let mut picked_count = 0;
    let mut largest_pull = 0;

    while picked_count < target {
        let idx = rng.array_index(total)?;
        if picked[idx] {
            continue;
        }
        picked[idx] = true;
        picked_count += 1;

        let mut pulled = 0;
        for &nb in &regions[idx].neighbors {
            if !picked[nb] {
                picked[nb] = true;
                picked_count += 1;
                pulled += 1;
            }
        }
        largest_pull = largest_pull.max(pulled);
    }

    for (region, &land) in regions.iter_mut().zip(&picked) {
        region.is_land = land;
    }

    debug!(total, target, picked = picked_count, "land regions resolved");
    Ok(LandSummary {
        total,
        target,
        picked: picked_count,
        largest_pull,
    })
}
