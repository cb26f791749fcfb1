//! Voronoi tessellation of a bounded rectangle.
//!
//! Each cell is the rectangle clipped by the perpendicular bisectors between
//! its site and every other site. Vertices are welded into one shared table
//! afterwards so a vertex shared by several cells has identical coordinates in
//! each of them, which is what polygon merging and adjacency rely on.

use std::collections::{BTreeSet, HashMap, HashSet};

use glam::DVec2;
use tracing::debug;

use super::polygon::{point_key, Bounds};
use crate::error::WorldGenError;
use crate::random::RandomStream;

/// Relative tolerance used to weld nearly-coincident vertices.
const WELD_TOLERANCE: f64 = 1e-9;

/// One Voronoi cell.
#[derive(Debug, Clone)]
pub struct Cell {
    /// Generating site.
    pub point: DVec2,
    /// Boundary loop, positively oriented, clipped to the bounds.
    pub polygon: Vec<DVec2>,
    /// Indices into the shared vertex table, parallel to `polygon`.
    pub vertex_ids: Vec<usize>,
    /// Cells sharing at least one boundary edge, ascending.
    pub neighbors: Vec<usize>,
}

/// Planar subdivision of the bounds, one cell per site.
#[derive(Debug, Clone)]
pub struct Tessellation {
    bounds: Bounds,
    cells: Vec<Cell>,
    vertices: Vec<DVec2>,
}

impl Tessellation {
    /// Draws `count` sites from the stream (x then y per site) and
    /// tessellates them.
    pub fn generate(
        bounds: Bounds,
        count: usize,
        rng: &mut dyn RandomStream,
    ) -> Result<Self, WorldGenError> {
        if count == 0 {
            return Err(WorldGenError::config("point count must be positive"));
        }
        let points: Vec<DVec2> = (0..count)
            .map(|_| {
                let x = rng.next_f64() * bounds.width;
                let y = rng.next_f64() * bounds.height;
                DVec2::new(x, y)
            })
            .collect();
        Self::new(bounds, points)
    }

    /// Tessellates the given sites. Sites must be distinct and inside
    /// `bounds`.
    pub fn new(bounds: Bounds, points: Vec<DVec2>) -> Result<Self, WorldGenError> {
        validate_points(&bounds, &points)?;

        let raw: Vec<Vec<DVec2>> = (0..points.len())
            .map(|i| clip_cell(&bounds, &points, i))
            .collect();

        let tolerance = WELD_TOLERANCE * bounds.width.max(bounds.height);
        let mut welder = VertexWelder::new(tolerance);
        let mut cells = Vec::with_capacity(points.len());

        for (i, poly) in raw.into_iter().enumerate() {
            let mut ids: Vec<usize> = Vec::with_capacity(poly.len());
            for p in poly {
                let id = welder.weld(p);
                if ids.last() != Some(&id) {
                    ids.push(id);
                }
            }
            while ids.len() > 1 && ids.first() == ids.last() {
                ids.pop();
            }
            if ids.len() < 3 {
                return Err(WorldGenError::geometry(format!(
                    "cell {} collapsed to {} vertices",
                    i,
                    ids.len()
                )));
            }
            cells.push(Cell {
                point: points[i],
                polygon: ids.iter().map(|&id| welder.vertices[id]).collect(),
                vertex_ids: ids,
                neighbors: Vec::new(),
            });
        }

        link_neighbors(&mut cells);

        debug!(
            cells = cells.len(),
            vertices = welder.vertices.len(),
            "tessellation built"
        );

        Ok(Self {
            bounds,
            cells,
            vertices: welder.vertices,
        })
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn cell(&self, idx: usize) -> &Cell {
        &self.cells[idx]
    }

    pub fn points(&self) -> Vec<DVec2> {
        self.cells.iter().map(|c| c.point).collect()
    }

    /// Shared vertex table.
    pub fn vertices(&self) -> &[DVec2] {
        &self.vertices
    }

    pub fn neighbors(&self, idx: usize) -> &[usize] {
        &self.cells[idx].neighbors
    }

    pub fn are_neighbors(&self, a: usize, b: usize) -> bool {
        self.cells[a].neighbors.binary_search(&b).is_ok()
    }

    /// True if any vertex of the cell lies on the rectangle border.
    pub fn touches_border(&self, idx: usize) -> bool {
        let tolerance = WELD_TOLERANCE * self.bounds.width.max(self.bounds.height);
        self.cells[idx]
            .polygon
            .iter()
            .any(|&p| self.bounds.on_border(p, tolerance))
    }
}

fn validate_points(bounds: &Bounds, points: &[DVec2]) -> Result<(), WorldGenError> {
    if points.is_empty() {
        return Err(WorldGenError::config("point count must be positive"));
    }
    let mut seen = HashSet::with_capacity(points.len());
    for (i, &p) in points.iter().enumerate() {
        if !p.is_finite() || !bounds.contains(p) {
            return Err(WorldGenError::config(format!(
                "point {} at ({}, {}) lies outside the plane",
                i, p.x, p.y
            )));
        }
        if !seen.insert(point_key(p)) {
            return Err(WorldGenError::config(format!(
                "duplicate point {} at ({}, {})",
                i, p.x, p.y
            )));
        }
    }
    Ok(())
}

/// Clips the bounding rectangle down to the Voronoi cell of `points[idx]`.
fn clip_cell(bounds: &Bounds, points: &[DVec2], idx: usize) -> Vec<DVec2> {
    let site = points[idx];
    let mut order: Vec<(f64, usize)> = points
        .iter()
        .enumerate()
        .filter(|&(j, _)| j != idx)
        .map(|(j, p)| (site.distance_squared(*p), j))
        .collect();
    order.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

    let mut poly = bounds.corners();
    for (dist_sq, j) in order {
        // A site farther than twice the cell radius cannot cut the cell.
        let radius_sq = poly
            .iter()
            .map(|v| site.distance_squared(*v))
            .fold(0.0, f64::max);
        if dist_sq > 4.0 * radius_sq {
            break;
        }
        let other = points[j];
        poly = clip_half_plane(&poly, (site + other) * 0.5, other - site);
        if poly.is_empty() {
            break;
        }
    }
    poly
}

/// Keeps the part of `poly` where `(x - origin) . normal <= 0`.
fn clip_half_plane(poly: &[DVec2], origin: DVec2, normal: DVec2) -> Vec<DVec2> {
    let n = poly.len();
    let mut out = Vec::with_capacity(n + 1);
    for i in 0..n {
        let cur = poly[i];
        let next = poly[(i + 1) % n];
        let dc = (cur - origin).dot(normal);
        let dn = (next - origin).dot(normal);
        let cur_in = dc <= 0.0;
        let next_in = dn <= 0.0;
        if cur_in {
            out.push(cur);
        }
        if cur_in != next_in {
            let t = dc / (dc - dn);
            out.push(cur + (next - cur) * t);
        }
    }
    out
}

/// Snaps points within `tolerance` of an existing vertex onto it.
struct VertexWelder {
    tolerance: f64,
    buckets: HashMap<(i64, i64), Vec<usize>>,
    vertices: Vec<DVec2>,
}

impl VertexWelder {
    fn new(tolerance: f64) -> Self {
        Self {
            tolerance,
            buckets: HashMap::new(),
            vertices: Vec::new(),
        }
    }

    fn bucket(&self, p: DVec2) -> (i64, i64) {
        (
            (p.x / self.tolerance).floor() as i64,
            (p.y / self.tolerance).floor() as i64,
        )
    }

    fn weld(&mut self, p: DVec2) -> usize {
        let (bx, by) = self.bucket(p);
        let mut best: Option<(f64, usize)> = None;
        for dx in -1..=1 {
            for dy in -1..=1 {
                if let Some(ids) = self.buckets.get(&(bx + dx, by + dy)) {
                    for &id in ids {
                        let d = self.vertices[id].distance(p);
                        if d <= self.tolerance && best.map_or(true, |(bd, bid)| (d, id) < (bd, bid)) {
                            best = Some((d, id));
                        }
                    }
                }
            }
        }
        if let Some((_, id)) = best {
            return id;
        }
        let id = self.vertices.len();
        self.vertices.push(p);
        self.buckets.entry((bx, by)).or_default().push(id);
        id
    }
}

/// Cells are neighbours when they share an edge of welded vertices.
fn link_neighbors(cells: &mut [Cell]) {
    let mut edge_owners: HashMap<(usize, usize), Vec<usize>> = HashMap::new();
    for (ci, cell) in cells.iter().enumerate() {
        let ids = &cell.vertex_ids;
        for k in 0..ids.len() {
            let a = ids[k];
            let b = ids[(k + 1) % ids.len()];
            let key = if a < b { (a, b) } else { (b, a) };
            edge_owners.entry(key).or_default().push(ci);
        }
    }

    let mut sets: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); cells.len()];
    for owners in edge_owners.values() {
        for &a in owners {
            for &b in owners {
                if a != b {
                    sets[a].insert(b);
                }
            }
        }
    }
    for (cell, set) in cells.iter_mut().zip(sets) {
        cell.neighbors = set.into_iter().collect();
    }
}
