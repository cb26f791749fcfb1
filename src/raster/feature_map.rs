//! Feature grid data structure and rasterizer.

use glam::DVec2;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::WorldGenError;
use crate::geometry::{Bounds, Edge};
use crate::regions::Region;

/// Per-pixel terrain feature. `as_u8()` is stable and used for export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Feature {
    #[default]
    Water = 0,
    Land = 1,
    Mountain = 2,
}

impl Feature {
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// RGB preview color for this feature.
    pub fn preview_rgb(self) -> [u8; 3] {
        match self {
            Feature::Water => [15, 40, 90],
            Feature::Land => [90, 150, 70],
            Feature::Mountain => [120, 110, 100],
        }
    }
}

/// Dense row-major grid of features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureMap {
    pub width: u32,
    pub height: u32,
    pub cells: Vec<Feature>,
}

impl FeatureMap {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            cells: vec![Feature::Water; width as usize * height as usize],
        }
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32) -> Feature {
        self.cells[(y * self.width + x) as usize]
    }

    #[inline]
    pub fn set(&mut self, x: u32, y: u32, feature: Feature) {
        self.cells[(y * self.width + x) as usize] = feature;
    }

    pub fn count(&self, feature: Feature) -> usize {
        self.cells.iter().filter(|&&f| f == feature).count()
    }

    /// Row-major feature codes.
    pub fn to_u8(&self) -> Vec<u8> {
        self.cells.iter().map(|f| f.as_u8()).collect()
    }
}

/// Fills the pixels whose centres lie inside `polygon` (even-odd rule).
/// `scale` maps plane units to pixels.
fn fill_polygon(map: &mut FeatureMap, polygon: &[DVec2], scale: DVec2, feature: Feature) {
    if polygon.len() < 3 {
        return;
    }
    let pts: Vec<DVec2> = polygon.iter().map(|p| *p * scale).collect();
    let (min_y, max_y) = pts
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| (lo.min(p.y), hi.max(p.y)));

    let row_start = (min_y - 0.5).ceil().max(0.0) as u32;
    let row_end = ((max_y - 0.5).floor() as i64).min(map.height as i64 - 1);
    let mut crossings: Vec<f64> = Vec::new();

    for row in row_start as i64..=row_end {
        let cy = row as f64 + 0.5;
        crossings.clear();
        let n = pts.len();
        for i in 0..n {
            let a = pts[i];
            let b = pts[(i + 1) % n];
            if (a.y > cy) != (b.y > cy) {
                crossings.push(a.x + (cy - a.y) * (b.x - a.x) / (b.y - a.y));
            }
        }
        crossings.sort_by(|a, b| a.total_cmp(b));
        for pair in crossings.chunks_exact(2) {
            let start = (pair[0] - 0.5).ceil().max(0.0) as i64;
            let end = ((pair[1] - 0.5).floor() as i64).min(map.width as i64 - 1);
            for col in start..=end {
                map.set(col as u32, row as u32, feature);
            }
        }
    }
}

/// Strokes a segment with Bresenham's line algorithm, clipped to the map.
fn stroke_edge(map: &mut FeatureMap, edge: &Edge, scale: DVec2, feature: Feature) {
    let to_pixel = |p: DVec2| {
        let q = p * scale;
        (
            (q.x.floor() as i64).clamp(0, map.width as i64 - 1),
            (q.y.floor() as i64).clamp(0, map.height as i64 - 1),
        )
    };
    let (mut x0, mut y0) = to_pixel(edge.start);
    let (x1, y1) = to_pixel(edge.end);

    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        map.set(x0 as u32, y0 as u32, feature);
        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

/// Rasterizes regions and ridges into a `width x height` feature map
/// covering `bounds`.
///
/// Land regions become [`Feature::Land`], everything else stays
/// [`Feature::Water`]; ridge edges are drawn last as
/// [`Feature::Mountain`].
pub fn rasterize_features(
    regions: &[Region],
    ridges: &[Edge],
    bounds: Bounds,
    width: u32,
    height: u32,
) -> Result<FeatureMap, WorldGenError> {
    if width == 0 || height == 0 {
        return Err(WorldGenError::config(format!(
            "feature map must be non-empty, got {}x{}",
            width, height
        )));
    }
    let scale = DVec2::new(width as f64 / bounds.width, height as f64 / bounds.height);
    let mut map = FeatureMap::new(width, height);

    for region in regions.iter().filter(|r| r.is_land) {
        fill_polygon(&mut map, &region.polygon, scale, Feature::Land);
    }
    for edge in ridges {
        stroke_edge(&mut map, edge, scale, Feature::Mountain);
    }

    debug!(
        width,
        height,
        land = map.count(Feature::Land),
        mountain = map.count(Feature::Mountain),
        "feature map rasterized"
    );
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn region(polygon: Vec<DVec2>, is_land: bool) -> Region {
        Region {
            id: 0,
            cells: vec![0],
            polygon,
            neighbors: BTreeSet::new(),
            is_land,
        }
    }

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Vec<DVec2> {
        vec![
            DVec2::new(x0, y0),
            DVec2::new(x1, y0),
            DVec2::new(x1, y1),
            DVec2::new(x0, y1),
        ]
    }

    #[test]
    fn land_rectangle_fills_covered_pixels() {
        let bounds = Bounds::new(10.0, 10.0).unwrap();
        let regions = vec![region(rect(0.0, 0.0, 5.0, 10.0), true)];
        let map = rasterize_features(&regions, &[], bounds, 10, 10).unwrap();
        assert_eq!(map.count(Feature::Land), 50);
        assert_eq!(map.get(4, 9), Feature::Land);
        assert_eq!(map.get(5, 0), Feature::Water);
    }

    #[test]
    fn water_regions_are_not_filled() {
        let bounds = Bounds::new(10.0, 10.0).unwrap();
        let regions = vec![region(rect(0.0, 0.0, 10.0, 10.0), false)];
        let map = rasterize_features(&regions, &[], bounds, 10, 10).unwrap();
        assert_eq!(map.count(Feature::Water), 100);
    }

    #[test]
    fn scaling_maps_plane_to_pixels() {
        let bounds = Bounds::new(800.0, 600.0).unwrap();
        let regions = vec![region(rect(0.0, 0.0, 400.0, 600.0), true)];
        let map = rasterize_features(&regions, &[], bounds, 80, 60).unwrap();
        assert_eq!(map.count(Feature::Land), 40 * 60);
    }

    #[test]
    fn ridges_are_stroked_over_land() {
        let bounds = Bounds::new(10.0, 10.0).unwrap();
        let regions = vec![region(rect(0.0, 0.0, 10.0, 10.0), true)];
        let ridge = Edge::new(DVec2::new(0.5, 0.5), DVec2::new(9.5, 9.5));
        let map = rasterize_features(&regions, &[ridge], bounds, 10, 10).unwrap();
        assert_eq!(map.count(Feature::Mountain), 10);
        for i in 0..10 {
            assert_eq!(map.get(i, i), Feature::Mountain);
        }
        // Endpoints on the far border are clamped into the map.
        let border = Edge::new(DVec2::new(10.0, 0.0), DVec2::new(10.0, 10.0));
        let map = rasterize_features(&regions, &[border], bounds, 10, 10).unwrap();
        assert_eq!(map.get(9, 9), Feature::Mountain);
    }

    #[test]
    fn same_input_same_raster() {
        let bounds = Bounds::new(20.0, 20.0).unwrap();
        let tri = vec![DVec2::new(1.0, 1.0), DVec2::new(19.0, 3.0), DVec2::new(7.0, 18.0)];
        let regions = vec![region(tri, true)];
        let a = rasterize_features(&regions, &[], bounds, 37, 23).unwrap();
        let b = rasterize_features(&regions, &[], bounds, 37, 23).unwrap();
        assert_eq!(a, b);
        assert!(a.count(Feature::Land) > 0);
    }

    #[test]
    fn empty_map_is_rejected() {
        let bounds = Bounds::new(10.0, 10.0).unwrap();
        assert!(rasterize_features(&[], &[], bounds, 0, 10).is_err());
    }
}
