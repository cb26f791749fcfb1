//! Error taxonomy shared by every generation stage.

use thiserror::Error;

/// Errors raised by the world generation core.
///
/// Every stage validates its own preconditions and fails fast with one of
/// these; nothing is substituted or swallowed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WorldGenError {
    /// Invalid parameters (ratios out of range, zero counts, infeasible
    /// spacing constraints, malformed biome tables).
    #[error("Configuration error: {0}")]
    Configuration(String),
    /// Polygon stitching could not close a single loop, or the tessellation
    /// input was malformed.
    #[error("Geometry error: {0}")]
    Geometry(String),
    /// More items were requested than the pool holds.
    #[error("Resource exhausted: requested {requested} {what}, only {available} available")]
    ResourceExhaustion {
        what: &'static str,
        requested: usize,
        available: usize,
    },
}

impl WorldGenError {
    pub fn config(msg: impl Into<String>) -> Self {
        WorldGenError::Configuration(msg.into())
    }

    pub fn geometry(msg: impl Into<String>) -> Self {
        WorldGenError::Geometry(msg.into())
    }
}
