//! Planar geometry: clipped Voronoi tessellation and polygon merging.
//!
//! All coordinates are `DVec2` in plane units with the origin at the top-left
//! corner of the bounding rectangle.

mod polygon;
mod tessellation;
mod merge;

pub use polygon::{
    Bounds, Edge, EdgeKey, point_in_polygon, point_key, polygon_area, polygon_to_edges,
    signed_area,
};
pub use tessellation::{Cell, Tessellation};
pub use merge::merge_polygons;
