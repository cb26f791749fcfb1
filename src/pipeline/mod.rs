//! Pipeline module for orchestrating world generation stages.
//!
//! A world is built by running a fixed sequence of stages over a single
//! seeded random stream. Stages draw from the stream in a fixed order, so
//! the same seed and configuration always produce the same world.

mod config;
mod stage;
mod world;

pub use config::{FeatureMapConfig, WorldConfig};
pub use stage::{
    BiomeStage, FeatureMapStage, GenerationStage, LandWaterStage, Pipeline, PipelineError,
    RegionStage, RidgeStage, StageId, TessellationStage, TileFieldStage,
};
pub use world::{World, WorldSummary};

use tracing::info;

use crate::random::SeededStream;

/// Generates a complete world from `config`.
///
/// The configuration is validated before any stage runs. A failing stage
/// aborts the run and no partial world is returned.
pub fn generate_world(config: &WorldConfig) -> Result<World, PipelineError> {
    config.validate()?;
    let pipeline = Pipeline::standard(config);
    let mut rng = SeededStream::new(&config.seed);
    let mut world = World::new(config.seed.clone());
    pipeline.run(&mut world, &mut rng)?;
    info!(seed = %config.seed, stages = pipeline.stage_count(), "world generated");
    Ok(world)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WorldGenError;

    #[test]
    fn same_seed_same_world() {
        let config = WorldConfig::small("det");
        let a = generate_world(&config).unwrap();
        let b = generate_world(&config).unwrap();

        let ra = a.regions.as_ref().unwrap();
        let rb = b.regions.as_ref().unwrap();
        assert_eq!(ra.len(), rb.len());
        for (x, y) in ra.iter().zip(rb) {
            assert_eq!(x.polygon, y.polygon);
            assert_eq!(x.cells, y.cells);
            assert_eq!(x.is_land, y.is_land);
        }
        assert_eq!(a.ridges.as_ref().unwrap().edges.len(), b.ridges.as_ref().unwrap().edges.len());
        for (x, y) in a.ridges.as_ref().unwrap().edges.iter().zip(&b.ridges.as_ref().unwrap().edges) {
            assert_eq!(x.start, y.start);
            assert_eq!(x.end, y.end);
        }
        assert_eq!(a.tiles.as_ref().unwrap().biome_ids(), b.tiles.as_ref().unwrap().biome_ids());
        assert_eq!(a.feature_map, b.feature_map);
    }

    #[test]
    fn different_seeds_differ() {
        let a = generate_world(&WorldConfig::small("one")).unwrap();
        let b = generate_world(&WorldConfig::small("two")).unwrap();
        let pa: Vec<_> = a.tessellation.as_ref().unwrap().points();
        let pb: Vec<_> = b.tessellation.as_ref().unwrap().points();
        assert_ne!(pa, pb);
    }

    #[test]
    fn every_tile_gets_a_biome() {
        let world = generate_world(&WorldConfig::small("full")).unwrap();
        let grid = world.tiles.as_ref().unwrap();
        assert!(grid.is_resolved());
        let growth = world.growth.unwrap();
        assert_eq!(growth.resolved(), grid.len());

        let summary = world.summary();
        assert_eq!(summary.biome_counts.values().sum::<usize>(), grid.len());
        assert!(summary.biome_counts.keys().all(|id| (1..=10).contains(id)));
    }

    #[test]
    fn reference_world_land_target() {
        let config = WorldConfig {
            feature_map: None,
            ..WorldConfig::with_seed("1234")
        };
        let world = generate_world(&config).unwrap();
        let regions = world.regions.as_ref().unwrap();
        let land = world.land.unwrap();

        assert_eq!(land.total, regions.len());
        assert_eq!(land.target, (regions.len() as f64 * 0.85).round() as usize);
        let max_neighbors = regions.iter().map(|r| r.neighbors.len()).max().unwrap_or(0);
        assert!(land.picked >= land.target);
        assert!(land.picked <= land.target + max_neighbors);
        assert_eq!(world.land_regions().count(), land.picked);
        assert_eq!(world.ridges.as_ref().unwrap().len(), 10);
    }

    #[test]
    fn ridge_exhaustion_fails_the_run() {
        let mut config = WorldConfig::small("tiny");
        config.regions.point_count = 5;
        config.regions.cluster_count = 2;
        config.regions.mountain_ridge_count = 10_000;
        let err = generate_world(&config).unwrap_err();
        assert!(matches!(
            err.world_error(),
            Some(WorldGenError::ResourceExhaustion { what: "ridge edges", .. })
        ));
    }

    #[test]
    fn invalid_config_fails_before_generation() {
        let mut config = WorldConfig::small("bad");
        config.regions.land_ratio = -0.1;
        assert!(matches!(generate_world(&config), Err(PipelineError::Config(_))));
    }

    #[test]
    fn standard_pipeline_shape() {
        assert_eq!(Pipeline::standard(&WorldConfig::default()).stage_count(), 6);
        assert_eq!(Pipeline::standard(&WorldConfig::small("s")).stage_count(), 7);
    }
}
