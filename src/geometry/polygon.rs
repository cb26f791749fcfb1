//! Polygon primitives: bounds, edges, area and containment.

use std::hash::{Hash, Hasher};

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::error::WorldGenError;

/// Axis-aligned rectangle `[0, width] x [0, height]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub fn new(width: f64, height: f64) -> Result<Self, WorldGenError> {
        if !(width.is_finite() && height.is_finite()) || width <= 0.0 || height <= 0.0 {
            return Err(WorldGenError::config(format!(
                "plane must have positive finite size, got {}x{}",
                width, height
            )));
        }
        Ok(Self { width, height })
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    pub fn contains(&self, p: DVec2) -> bool {
        p.x >= 0.0 && p.x <= self.width && p.y >= 0.0 && p.y <= self.height
    }

    /// True if `p` lies on the rectangle border (within `tolerance`).
    pub fn on_border(&self, p: DVec2, tolerance: f64) -> bool {
        p.x.abs() <= tolerance
            || p.y.abs() <= tolerance
            || (p.x - self.width).abs() <= tolerance
            || (p.y - self.height).abs() <= tolerance
    }

    /// Counter-clockwise corner loop.
    pub fn corners(&self) -> Vec<DVec2> {
        vec![
            DVec2::new(0.0, 0.0),
            DVec2::new(self.width, 0.0),
            DVec2::new(self.width, self.height),
            DVec2::new(0.0, self.height),
        ]
    }
}

/// Bit-exact hash key of a point. `-0.0` and `0.0` map to the same key.
pub fn point_key(p: DVec2) -> (u64, u64) {
    ((p.x + 0.0).to_bits(), (p.y + 0.0).to_bits())
}

/// Order-insensitive key of an edge.
pub type EdgeKey = ((u64, u64), (u64, u64));

/// A segment between two points.
///
/// Two edges are equal when their endpoint sets match, regardless of
/// direction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Edge {
    pub start: DVec2,
    pub end: DVec2,
}

impl Edge {
    pub fn new(start: DVec2, end: DVec2) -> Self {
        Self { start, end }
    }

    pub fn key(&self) -> EdgeKey {
        let a = point_key(self.start);
        let b = point_key(self.end);
        if a <= b { (a, b) } else { (b, a) }
    }

    /// Both endpoints coincide.
    pub fn is_degenerate(&self) -> bool {
        point_key(self.start) == point_key(self.end)
    }

    pub fn length(&self) -> f64 {
        self.start.distance(self.end)
    }

    pub fn reversed(&self) -> Self {
        Self::new(self.end, self.start)
    }
}

impl PartialEq for Edge {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Edge {}

impl Hash for Edge {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

/// Decomposes a closed polygon into its boundary edges, last vertex
/// wrapping to the first.
pub fn polygon_to_edges(polygon: &[DVec2]) -> Vec<Edge> {
    let n = polygon.len();
    (0..n)
        .map(|i| Edge::new(polygon[i], polygon[(i + 1) % n]))
        .collect()
}

/// Shoelace area; positive for counter-clockwise loops in a y-up frame.
pub fn signed_area(polygon: &[DVec2]) -> f64 {
    let n = polygon.len();
    if n < 3 {
        return 0.0;
    }
    let twice: f64 = (0..n)
        .map(|i| polygon[i].perp_dot(polygon[(i + 1) % n]))
        .sum();
    twice * 0.5
}

/// Unsigned polygon area.
pub fn polygon_area(polygon: &[DVec2]) -> f64 {
    signed_area(polygon).abs()
}

/// Even-odd containment test.
pub fn point_in_polygon(p: DVec2, polygon: &[DVec2]) -> bool {
    let n = polygon.len();
    let mut inside = false;
    let mut j = n.wrapping_sub(1);
    for i in 0..n {
        let a = polygon[i];
        let b = polygon[j];
        if (a.y > p.y) != (b.y > p.y) {
            let x_cross = (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x;
            if p.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}
