//! Rasterized land/water/mountain feature grid.
//!
//! Region polygons are scan-converted at pixel centres, then ridge edges
//! are stroked on top. The result depends only on the input polygons and
//! edges.

mod feature_map;

pub use feature_map::{Feature, FeatureMap, rasterize_features};
