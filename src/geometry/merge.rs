//! Merging a group of cell polygons into one outer boundary loop.

use std::collections::HashMap;

use glam::DVec2;

use super::polygon::{point_key, polygon_to_edges, Edge, EdgeKey};
use crate::error::WorldGenError;

/// Merges adjacent polygons into the loop that encloses all of them.
///
/// Edges shared by two member polygons are interior and cancel out; edges
/// that appear once form the outer boundary, which is then stitched into a
/// single closed loop. The loop follows the direction of the first boundary
/// edge and does not repeat its first point at the end.
///
/// Fails with a geometry error when the boundary does not form exactly one
/// closed loop (disconnected members, holes, or malformed input).
pub fn merge_polygons(polygons: &[Vec<DVec2>]) -> Result<Vec<DVec2>, WorldGenError> {
    let all_edges: Vec<Edge> = polygons.iter().flat_map(|p| polygon_to_edges(p)).collect();

    let mut counts: HashMap<EdgeKey, usize> = HashMap::with_capacity(all_edges.len());
    for edge in &all_edges {
        *counts.entry(edge.key()).or_insert(0) += 1;
    }
    if let Some((_, n)) = counts.iter().find(|(_, &n)| n > 2) {
        return Err(WorldGenError::geometry(format!(
            "an edge is shared by {} polygons",
            n
        )));
    }

    let boundary: Vec<Edge> = all_edges
        .into_iter()
        .filter(|e| counts[&e.key()] == 1)
        .filter(|e| !e.is_degenerate())
        .collect();

    stitch_loop(&boundary)
}

/// Walks every boundary edge exactly once, returning to the start point.
///
/// Edges may be traversed in either direction. A vertex touched twice by the
/// boundary (two members meeting at a single corner) is handled by splicing
/// the sub-loops together, so the result is still one loop.
fn stitch_loop(edges: &[Edge]) -> Result<Vec<DVec2>, WorldGenError> {
    if edges.is_empty() {
        return Err(WorldGenError::geometry("no boundary edges to stitch"));
    }

    let mut vertex_ids: HashMap<(u64, u64), usize> = HashMap::new();
    let mut vertices: Vec<DVec2> = Vec::new();
    let mut id_of = |p: DVec2| -> usize {
        *vertex_ids.entry(point_key(p)).or_insert_with(|| {
            vertices.push(p);
            vertices.len() - 1
        })
    };

    // Incident (edge, other endpoint) lists in edge order.
    let endpoints: Vec<(usize, usize)> = edges.iter().map(|e| (id_of(e.start), id_of(e.end))).collect();
    let mut incident: Vec<Vec<(usize, usize)>> = vec![Vec::new(); vertices.len()];
    for (ei, &(a, b)) in endpoints.iter().enumerate() {
        incident[a].push((ei, b));
        incident[b].push((ei, a));
    }

    if let Some(v) = incident.iter().position(|inc| inc.len() % 2 != 0) {
        let p = vertices[v];
        return Err(WorldGenError::geometry(format!(
            "boundary is open at ({}, {})",
            p.x, p.y
        )));
    }

    let start = endpoints[0].0;
    let mut used = vec![false; edges.len()];
    let mut cursor = vec![0usize; vertices.len()];
    let mut stack = vec![start];
    let mut circuit: Vec<usize> = Vec::with_capacity(edges.len() + 1);

    while let Some(&v) = stack.last() {
        while cursor[v] < incident[v].len() && used[incident[v][cursor[v]].0] {
            cursor[v] += 1;
        }
        if cursor[v] < incident[v].len() {
            let (ei, next) = incident[v][cursor[v]];
            used[ei] = true;
            stack.push(next);
        } else {
            circuit.push(v);
            stack.pop();
        }
    }

    let consumed = used.iter().filter(|&&u| u).count();
    if consumed != edges.len() {
        return Err(WorldGenError::geometry(format!(
            "boundary splits into several loops ({} of {} edges reachable)",
            consumed,
            edges.len()
        )));
    }

    circuit.reverse();
    circuit.pop();
    if circuit.len() < 3 {
        return Err(WorldGenError::geometry("not enough points to close a loop"));
    }
    Ok(circuit.into_iter().map(|id| vertices[id]).collect())
}
