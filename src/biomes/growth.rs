//! Biome growth: sparse start points, then neighbour-voted spread.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::classifier::{BiomeClassifier, BiomeGuess};
use crate::error::WorldGenError;
use crate::random::RandomStream;
use crate::tiles::TileGrid;

/// Resolution state of one tile. Terminal once resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileState {
    Unresolved,
    Resolved(u32),
}

impl From<Option<u32>> for TileState {
    fn from(id: Option<u32>) -> Self {
        match id {
            Some(id) => TileState::Resolved(id),
            None => TileState::Unresolved,
        }
    }
}

/// Counters from one growth run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrowthSummary {
    /// Distinct start tiles.
    pub starts: usize,
    /// Tiles resolved from the classifier.
    pub classified: usize,
    /// Tiles resolved by neighbour vote.
    pub voted: usize,
}

impl GrowthSummary {
    pub fn resolved(&self) -> usize {
        self.classified + self.voted
    }
}

/// Picks `count` tiles that are pairwise at least `min_distance` apart.
///
/// Candidates are drawn as `(int_between(0, width), int_between(0, height))`
/// and kept when far enough from every kept point. Gives up with a
/// configuration error after `max_attempts` candidates.
pub fn pick_sparse_points(
    width: u32,
    height: u32,
    count: usize,
    min_distance: f64,
    max_attempts: usize,
    rng: &mut dyn RandomStream,
) -> Result<Vec<(u32, u32)>, WorldGenError> {
    if width == 0 || height == 0 {
        return Err(WorldGenError::config("cannot pick points on an empty grid"));
    }
    let min_sq = min_distance * min_distance;
    let mut points: Vec<(u32, u32)> = Vec::with_capacity(count);
    let mut attempts = 0;

    while points.len() < count {
        if attempts >= max_attempts {
            return Err(WorldGenError::config(format!(
                "placed only {} of {} start points at spacing {} after {} attempts",
                points.len(),
                count,
                min_distance,
                attempts
            )));
        }
        attempts += 1;

        let x = rng.int_between(0, width as i64)? as u32;
        let y = rng.int_between(0, height as i64)? as u32;
        let far_enough = points.iter().all(|&(px, py)| {
            let dx = px as f64 - x as f64;
            let dy = py as f64 - y as f64;
            dx * dx + dy * dy >= min_sq
        });
        if far_enough {
            points.push((x, y));
        }
    }

    debug!(count, attempts, "sparse start points picked");
    Ok(points)
}

/// Picks one guess with probability proportional to confidence. All-zero
/// confidences fall back to the first (closest) guess. Always consumes one
/// draw.
fn pick_weighted(guesses: &[BiomeGuess], rng: &mut dyn RandomStream) -> Result<u32, WorldGenError> {
    let first = guesses
        .first()
        .ok_or_else(|| WorldGenError::config("classifier returned no candidates"))?;
    let total: f64 = guesses.iter().map(|g| g.confidence).sum();
    let r = rng.next_f64() * total;
    if total <= 0.0 {
        return Ok(first.biome_id);
    }
    let mut cumulative = 0.0;
    for g in guesses {
        cumulative += g.confidence;
        if r < cumulative {
            return Ok(g.biome_id);
        }
    }
    // r == total only through rounding; the last positive weight wins.
    Ok(guesses
        .iter()
        .rev()
        .find(|g| g.confidence > 0.0)
        .map_or(first.biome_id, |g| g.biome_id))
}

/// Resolved biome ids around `(x, y)`, grouped in first-seen order.
fn neighbor_votes(grid: &TileGrid, x: u32, y: u32) -> Vec<(u32, usize)> {
    let mut votes: Vec<(u32, usize)> = Vec::with_capacity(4);
    for (nx, ny) in grid.neighbors4(x, y) {
        if let TileState::Resolved(id) = TileState::from(grid.get(nx, ny).biome_id) {
            match votes.iter_mut().find(|(v, _)| *v == id) {
                Some((_, n)) => *n += 1,
                None => votes.push((id, 1)),
            }
        }
    }
    votes
}

fn pick_vote(votes: &[(u32, usize)], rng: &mut dyn RandomStream) -> u32 {
    let total: usize = votes.iter().map(|(_, n)| n).sum();
    let r = rng.next_f64() * total as f64;
    let mut cumulative = 0.0;
    for &(id, n) in votes {
        cumulative += n as f64;
        if r < cumulative {
            return id;
        }
    }
    votes[votes.len() - 1].0
}

/// Assigns a biome id to every tile of `grid`.
///
/// Start tiles are classified and resolved with a confidence-weighted
/// draw. The work queue then spreads outward: each unresolved 4-neighbour
/// of a dequeued tile takes a biome from its own resolved neighbours,
/// weighted by how often each id occurs, and is queued in turn. A tile
/// with no resolved neighbours is classified fresh. Every tile is resolved
/// exactly once.
pub fn resolve_biomes(
    grid: &mut TileGrid,
    classifier: &BiomeClassifier,
    starts: &[(u32, u32)],
    top_n: usize,
    rng: &mut dyn RandomStream,
) -> Result<GrowthSummary, WorldGenError> {
    if starts.is_empty() {
        return Err(WorldGenError::config("biome growth needs at least one start point"));
    }
    if top_n == 0 {
        return Err(WorldGenError::config("top_n must be positive"));
    }
    if let Some(&(x, y)) = starts.iter().find(|&&(x, y)| x >= grid.width() || y >= grid.height()) {
        return Err(WorldGenError::config(format!(
            "start point ({}, {}) is outside the {}x{} grid",
            x,
            y,
            grid.width(),
            grid.height()
        )));
    }

    let mut summary = GrowthSummary::default();
    let mut queue: VecDeque<(u32, u32)> = VecDeque::new();

    for &(x, y) in starts {
        if TileState::from(grid.get(x, y).biome_id) != TileState::Unresolved {
            continue;
        }
        let guesses = classifier.classify(&grid.get(x, y).properties, top_n)?;
        grid.get_mut(x, y).biome_id = Some(pick_weighted(&guesses, rng)?);
        summary.starts += 1;
        summary.classified += 1;
        queue.push_back((x, y));
    }

    let mut pending: Vec<(u32, u32)> = Vec::with_capacity(4);
    while let Some((x, y)) = queue.pop_front() {
        pending.clear();
        pending.extend(grid.neighbors4(x, y));
        for &(nx, ny) in &pending {
            if TileState::from(grid.get(nx, ny).biome_id) != TileState::Unresolved {
                continue;
            }
            let votes = neighbor_votes(grid, nx, ny);
            let id = if votes.is_empty() {
                let guesses = classifier.classify(&grid.get(nx, ny).properties, top_n)?;
                summary.classified += 1;
                pick_weighted(&guesses, rng)?
            } else {
                summary.voted += 1;
                pick_vote(&votes, rng)
            };
            grid.get_mut(nx, ny).biome_id = Some(id);
            queue.push_back((nx, ny));
        }
    }

    let unresolved = grid.len() - grid.resolved_count();
    if unresolved > 0 {
        return Err(WorldGenError::geometry(format!(
            "{} tiles are unreachable from the start points",
            unresolved
        )));
    }

    debug!(
        starts = summary.starts,
        classified = summary.classified,
        voted = summary.voted,
        "biomes resolved"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::biomes::BiomeConfig;
    use crate::random::{ScriptedStream, SeededStream};
    use crate::tiles::TileProperties;

    fn two_biome_classifier() -> BiomeClassifier {
        let mut table = crate::biomes::default_biomes();
        table.truncate(2);
        BiomeClassifier::new(&BiomeConfig { table, buffer: 0.5 }).unwrap()
    }

    #[test]
    fn single_start_fills_the_grid_with_its_biome() {
        let classifier = BiomeClassifier::with_default_table();
        let props = classifier.biomes()[4].midpoint();
        let mut grid = TileGrid::uniform(5, 5, props).unwrap();
        let mut rng = ScriptedStream::constant(0.0);
        let summary = resolve_biomes(&mut grid, &classifier, &[(2, 2)], 3, &mut rng).unwrap();

        let start_id = grid.get(2, 2).biome_id.unwrap();
        let ids = grid.biome_ids().unwrap();
        assert_eq!(ids.len(), 25);
        assert!(ids.iter().all(|&id| id == start_id));
        assert_eq!(summary.resolved(), 25);
        assert_eq!(summary.voted, 24);
    }

    #[test]
    fn every_tile_resolved_exactly_once() {
        let classifier = BiomeClassifier::with_default_table();
        let mut grid = TileGrid::uniform(30, 20, TileProperties::new(0.5, 0.5, 0.5, 0.5, 0.5)).unwrap();
        let mut rng = SeededStream::new("growth");
        let starts = [(0, 0), (29, 19), (15, 10), (15, 10)];
        let summary = resolve_biomes(&mut grid, &classifier, &starts, 3, &mut rng).unwrap();
        assert!(grid.is_resolved());
        assert_eq!(summary.starts, 3);
        assert_eq!(summary.resolved(), 600);
        for id in grid.biome_ids().unwrap() {
            assert!(classifier.biome(id).is_some());
        }
    }

    #[test]
    fn growth_is_deterministic() {
        let classifier = two_biome_classifier();
        let props = TileProperties::new(0.8, 0.7, 0.6, 0.35, 0.4);
        let run = || {
            let mut grid = TileGrid::uniform(12, 12, props).unwrap();
            let mut rng = SeededStream::new("repeat");
            resolve_biomes(&mut grid, &classifier, &[(1, 1), (10, 10)], 2, &mut rng).unwrap();
            grid.biome_ids().unwrap()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn votes_follow_neighbor_counts() {
        let mut grid = TileGrid::uniform(3, 1, TileProperties::default()).unwrap();
        grid.get_mut(0, 0).biome_id = Some(4);
        grid.get_mut(2, 0).biome_id = Some(9);
        let votes = neighbor_votes(&grid, 1, 0);
        assert_eq!(votes, vec![(4, 1), (9, 1)]);

        let mut low = ScriptedStream::constant(0.2);
        let mut high = ScriptedStream::constant(0.7);
        assert_eq!(pick_vote(&votes, &mut low), 4);
        assert_eq!(pick_vote(&votes, &mut high), 9);
    }

    #[test]
    fn weighted_pick_falls_back_to_closest() {
        let guesses = [
            BiomeGuess { biome_id: 5, confidence: 0.0, distance: 0.1 },
            BiomeGuess { biome_id: 6, confidence: 0.0, distance: 0.4 },
        ];
        let mut rng = ScriptedStream::constant(0.9);
        assert_eq!(pick_weighted(&guesses, &mut rng).unwrap(), 5);
        assert_eq!(rng.draws(), 1);

        let guesses = [
            BiomeGuess { biome_id: 1, confidence: 0.25, distance: 0.0 },
            BiomeGuess { biome_id: 2, confidence: 0.75, distance: 0.0 },
        ];
        let mut rng = ScriptedStream::new(vec![0.1, 0.5]);
        assert_eq!(pick_weighted(&guesses, &mut rng).unwrap(), 1);
        assert_eq!(pick_weighted(&guesses, &mut rng).unwrap(), 2);
    }

    #[test]
    fn sparse_points_keep_their_distance() {
        let mut rng = SeededStream::new("sparse");
        let points = pick_sparse_points(100, 100, 6, 15.0, 6000, &mut rng).unwrap();
        assert_eq!(points.len(), 6);
        for (i, a) in points.iter().enumerate() {
            for b in &points[i + 1..] {
                let dx = a.0 as f64 - b.0 as f64;
                let dy = a.1 as f64 - b.1 as f64;
                assert!((dx * dx + dy * dy).sqrt() >= 15.0);
            }
        }
    }

    #[test]
    fn infeasible_spacing_gives_up() {
        let mut rng = SeededStream::new("crowded");
        let err = pick_sparse_points(4, 4, 5, 10.0, 500, &mut rng).unwrap_err();
        assert!(matches!(err, WorldGenError::Configuration(_)));
    }

    #[test]
    fn bad_inputs_are_rejected() {
        let classifier = BiomeClassifier::with_default_table();
        let mut grid = TileGrid::uniform(4, 4, TileProperties::default()).unwrap();
        let mut rng = ScriptedStream::constant(0.5);
        assert!(resolve_biomes(&mut grid, &classifier, &[], 3, &mut rng).is_err());
        assert!(resolve_biomes(&mut grid, &classifier, &[(4, 0)], 3, &mut rng).is_err());
        assert!(resolve_biomes(&mut grid, &classifier, &[(0, 0)], 0, &mut rng).is_err());
        assert_eq!(grid.resolved_count(), 0);
        assert_eq!(rng.draws(), 0);
    }

    #[test]
    fn tile_state_from_option() {
        assert_eq!(TileState::from(None), TileState::Unresolved);
        assert_eq!(TileState::from(Some(3)), TileState::Resolved(3));
    }
}
