//! Generation stage trait and pipeline orchestration.

use std::time::Instant;

use thiserror::Error;
use tracing::{info, info_span};

use super::config::{FeatureMapConfig, WorldConfig};
use super::world::World;
use crate::biomes::{BiomeClassifier, BiomeConfig, pick_sparse_points, resolve_biomes};
use crate::error::WorldGenError;
use crate::geometry::{Bounds, Tessellation};
use crate::random::{RandomStream, SeededStream};
use crate::raster::rasterize_features;
use crate::regions::{
    RegionConfig, build_regions, enforce_contiguity, extract_ridges, group_by_cluster, kmeans,
    resolve_land,
};
use crate::tiles::{FieldConfig, FieldSeeds, TileGridConfig, generate_tile_fields};

/// Unique identifier for generation stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageId {
    /// Voronoi tessellation of the plane.
    Tessellation,
    /// Clustering cells into merged regions.
    Regions,
    /// Land/water selection.
    LandWater,
    /// Mountain ridge edges.
    Ridges,
    /// Per-tile property fields.
    TileFields,
    /// Biome growth over the tile grid.
    Biomes,
    /// Rasterized feature grid.
    FeatureMap,
}

impl StageId {
    /// Returns the name of the stage.
    pub fn name(&self) -> &'static str {
        match self {
            StageId::Tessellation => "tessellation",
            StageId::Regions => "regions",
            StageId::LandWater => "land-water",
            StageId::Ridges => "ridges",
            StageId::TileFields => "tile-fields",
            StageId::Biomes => "biomes",
            StageId::FeatureMap => "feature-map",
        }
    }
}

/// Errors that can occur during pipeline execution.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] WorldGenError),
    #[error("Stage '{stage}' failed: {source}")]
    Stage {
        stage: String,
        #[source]
        source: WorldGenError,
    },
    #[error("Missing dependency: stage '{0}' requires '{1}'")]
    MissingDependency(String, String),
    #[error("Stage '{stage}' needs {what}, which no earlier stage produced")]
    MissingInput { stage: String, what: &'static str },
}

impl PipelineError {
    pub fn stage(stage: &str, source: WorldGenError) -> Self {
        PipelineError::Stage {
            stage: stage.to_string(),
            source,
        }
    }

    fn missing(stage: &str, what: &'static str) -> Self {
        PipelineError::MissingInput {
            stage: stage.to_string(),
            what,
        }
    }

    /// The underlying generation error, if any.
    pub fn world_error(&self) -> Option<&WorldGenError> {
        match self {
            PipelineError::Config(e) | PipelineError::Stage { source: e, .. } => Some(e),
            _ => None,
        }
    }
}

/// Trait for implementing generation stages.
///
/// Each stage reads the products of earlier stages from the world and adds
/// its own. Stages that need randomness draw from the shared stream passed
/// to `execute`; the order in which stages draw is part of what makes a
/// seed reproducible.
pub trait GenerationStage: Send + Sync {
    /// Returns the unique identifier for this stage.
    fn id(&self) -> StageId;

    /// Returns a human-readable name for the stage.
    fn name(&self) -> &str;

    /// Returns the stage IDs that must be executed before this stage.
    fn dependencies(&self) -> &[StageId] {
        &[]
    }

    /// Executes the generation stage, adding its products to the world.
    fn execute(&self, world: &mut World, rng: &mut dyn RandomStream) -> Result<(), PipelineError>;
}

/// Orchestrates multiple generation stages into a complete pipeline.
#[derive(Default)]
pub struct Pipeline {
    stages: Vec<Box<dyn GenerationStage>>,
}

impl Pipeline {
    /// Creates a new empty pipeline.
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    /// The standard stage sequence for `config`. The feature map stage is
    /// included only when the config asks for one.
    pub fn standard(config: &WorldConfig) -> Self {
        let mut pipeline = Self::new();
        pipeline
            .add_stage(TessellationStage::new(config.regions.clone()))
            .add_stage(RegionStage::new(config.regions.clone()))
            .add_stage(LandWaterStage::new(config.regions.land_ratio))
            .add_stage(RidgeStage::new(config.regions.mountain_ridge_count))
            .add_stage(TileFieldStage::new(config.tiles.clone(), config.fields.clone()))
            .add_stage(BiomeStage::new(config.tiles.clone(), config.biomes.clone()));
        if let Some(size) = config.feature_map {
            pipeline.add_stage(FeatureMapStage::new(size));
        }
        pipeline
    }

    /// Adds a stage to the pipeline.
    pub fn add_stage<S: GenerationStage + 'static>(&mut self, stage: S) -> &mut Self {
        self.stages.push(Box::new(stage));
        self
    }

    /// Returns the number of stages in the pipeline.
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Executes all stages in order on the given world.
    pub fn run(&self, world: &mut World, rng: &mut dyn RandomStream) -> Result<(), PipelineError> {
        self.run_with_callbacks(world, rng, |_, _, _| {}, |_, _, _| {})
    }

    /// Executes all stages with progress callbacks.
    ///
    /// # Arguments
    /// * `world` - The world to generate into
    /// * `rng` - The shared random stream
    /// * `on_stage_start` - Called when each stage begins
    /// * `on_stage_complete` - Called when each stage finishes
    pub fn run_with_callbacks<F1, F2>(
        &self,
        world: &mut World,
        rng: &mut dyn RandomStream,
        mut on_stage_start: F1,
        mut on_stage_complete: F2,
    ) -> Result<(), PipelineError>
    where
        F1: FnMut(&str, usize, usize),
        F2: FnMut(&str, usize, usize),
    {
        let total = self.stages.len();
        let mut completed: Vec<StageId> = Vec::new();

        for (i, stage) in self.stages.iter().enumerate() {
            on_stage_start(stage.name(), i, total);

            for dep in stage.dependencies() {
                if !completed.contains(dep) {
                    return Err(PipelineError::MissingDependency(
                        stage.name().to_string(),
                        dep.name().to_string(),
                    ));
                }
            }

            let span = info_span!("stage", name = stage.id().name());
            let _guard = span.enter();
            let start = Instant::now();
            stage.execute(world, rng)?;
            info!(elapsed_ms = start.elapsed().as_millis() as u64, "stage complete");
            completed.push(stage.id());

            on_stage_complete(stage.name(), i, total);
        }

        Ok(())
    }
}

/// Scatters the sites and builds the Voronoi tessellation.
pub struct TessellationStage {
    pub config: RegionConfig,
}

impl TessellationStage {
    pub fn new(config: RegionConfig) -> Self {
        Self { config }
    }
}

impl GenerationStage for TessellationStage {
    fn id(&self) -> StageId {
        StageId::Tessellation
    }

    fn name(&self) -> &str {
        "Tessellation"
    }

    fn execute(&self, world: &mut World, rng: &mut dyn RandomStream) -> Result<(), PipelineError> {
        let tessellation = Bounds::new(self.config.width, self.config.height)
            .and_then(|bounds| Tessellation::generate(bounds, self.config.point_count, rng))
            .map_err(|e| PipelineError::stage(self.name(), e))?;
        info!(cells = tessellation.len(), "tessellated plane");
        world.tessellation = Some(tessellation);
        Ok(())
    }
}

/// Clusters cells with k-means, repairs contiguity and merges each cluster
/// into a region.
pub struct RegionStage {
    pub config: RegionConfig,
}

impl RegionStage {
    pub fn new(config: RegionConfig) -> Self {
        Self { config }
    }
}

impl GenerationStage for RegionStage {
    fn id(&self) -> StageId {
        StageId::Regions
    }

    fn name(&self) -> &str {
        "Region Clustering"
    }

    fn dependencies(&self) -> &[StageId] {
        &[StageId::Tessellation]
    }

    fn execute(&self, world: &mut World, rng: &mut dyn RandomStream) -> Result<(), PipelineError> {
        let tessellation = world
            .tessellation
            .as_ref()
            .ok_or_else(|| PipelineError::missing(self.name(), "a tessellation"))?;

        let clusters = kmeans(
            &tessellation.points(),
            self.config.cluster_count,
            self.config.kmeans_iterations,
            rng,
        )
        .map_err(|e| PipelineError::stage(self.name(), e))?;

        let mut assignments = clusters.assignments;
        let moved = enforce_contiguity(tessellation, &mut assignments);
        let groups = group_by_cluster(&assignments);
        let regions = build_regions(tessellation, &groups).map_err(|e| PipelineError::stage(self.name(), e))?;

        info!(
            regions = regions.len(),
            kmeans_iterations = clusters.iterations,
            moved_cells = moved,
            "regions built"
        );
        world.regions = Some(regions);
        Ok(())
    }
}

/// Flags a fraction of the regions as land.
pub struct LandWaterStage {
    pub ratio: f64,
}

impl LandWaterStage {
    pub fn new(ratio: f64) -> Self {
        Self { ratio }
    }
}

impl GenerationStage for LandWaterStage {
    fn id(&self) -> StageId {
        StageId::LandWater
    }

    fn name(&self) -> &str {
        "Land/Water"
    }

    fn dependencies(&self) -> &[StageId] {
        &[StageId::Regions]
    }

    fn execute(&self, world: &mut World, rng: &mut dyn RandomStream) -> Result<(), PipelineError> {
        let regions = world
            .regions
            .as_mut()
            .ok_or_else(|| PipelineError::missing(self.name(), "regions"))?;
        let summary = resolve_land(regions, self.ratio, rng).map_err(|e| PipelineError::stage(self.name(), e))?;
        info!(land_target = summary.target, picked = summary.picked, total = summary.total, "land resolved");
        world.land = Some(summary);
        Ok(())
    }
}

/// Picks mountain ridge edges from land cells.
pub struct RidgeStage {
    pub count: usize,
}

impl RidgeStage {
    pub fn new(count: usize) -> Self {
        Self { count }
    }
}

impl GenerationStage for RidgeStage {
    fn id(&self) -> StageId {
        StageId::Ridges
    }

    fn name(&self) -> &str {
        "Mountain Ridges"
    }

    fn dependencies(&self) -> &[StageId] {
        &[StageId::LandWater]
    }

    fn execute(&self, world: &mut World, rng: &mut dyn RandomStream) -> Result<(), PipelineError> {
        let tessellation = world
            .tessellation
            .as_ref()
            .ok_or_else(|| PipelineError::missing(self.name(), "a tessellation"))?;
        let regions = world
            .regions
            .as_ref()
            .ok_or_else(|| PipelineError::missing(self.name(), "regions"))?;
        let ridges =
            extract_ridges(tessellation, regions, self.count, rng).map_err(|e| PipelineError::stage(self.name(), e))?;
        info!(edges = ridges.len(), "ridges extracted");
        world.ridges = Some(ridges);
        Ok(())
    }
}

/// Samples the tile property fields. Noise seeds come from child streams
/// of the world seed, so the shared stream is not consumed.
pub struct TileFieldStage {
    pub tiles: TileGridConfig,
    pub fields: FieldConfig,
}

impl TileFieldStage {
    pub fn new(tiles: TileGridConfig, fields: FieldConfig) -> Self {
        Self { tiles, fields }
    }
}

impl GenerationStage for TileFieldStage {
    fn id(&self) -> StageId {
        StageId::TileFields
    }

    fn name(&self) -> &str {
        "Tile Fields"
    }

    fn execute(&self, world: &mut World, _rng: &mut dyn RandomStream) -> Result<(), PipelineError> {
        let seeds = FieldSeeds::derive(&SeededStream::new(&world.seed));
        let grid = generate_tile_fields(self.tiles.width, self.tiles.height, &self.fields, &seeds)
            .map_err(|e| PipelineError::stage(self.name(), e))?;
        info!(width = grid.width(), height = grid.height(), "tile fields generated");
        world.tiles = Some(grid);
        Ok(())
    }
}

/// Picks sparse start tiles and grows biomes over the whole grid.
pub struct BiomeStage {
    pub tiles: TileGridConfig,
    pub biomes: BiomeConfig,
}

impl BiomeStage {
    pub fn new(tiles: TileGridConfig, biomes: BiomeConfig) -> Self {
        Self { tiles, biomes }
    }
}

impl GenerationStage for BiomeStage {
    fn id(&self) -> StageId {
        StageId::Biomes
    }

    fn name(&self) -> &str {
        "Biome Growth"
    }

    fn dependencies(&self) -> &[StageId] {
        &[StageId::TileFields]
    }

    fn execute(&self, world: &mut World, rng: &mut dyn RandomStream) -> Result<(), PipelineError> {
        let grid = world
            .tiles
            .as_mut()
            .ok_or_else(|| PipelineError::missing(self.name(), "a tile grid"))?;
        let classifier = BiomeClassifier::new(&self.biomes).map_err(|e| PipelineError::stage(self.name(), e))?;

        let starts = pick_sparse_points(
            grid.width(),
            grid.height(),
            self.tiles.start_points,
            self.tiles.min_start_distance,
            self.tiles.max_start_attempts(),
            rng,
        )
        .map_err(|e| PipelineError::stage(self.name(), e))?;

        let summary = resolve_biomes(grid, &classifier, &starts, self.tiles.top_n, rng)
            .map_err(|e| PipelineError::stage(self.name(), e))?;
        info!(
            starts = summary.starts,
            voted = summary.voted,
            classified = summary.classified,
            "biomes grown"
        );
        world.growth = Some(summary);
        Ok(())
    }
}

/// Rasterizes land regions and ridges.
pub struct FeatureMapStage {
    pub size: FeatureMapConfig,
}

impl FeatureMapStage {
    pub fn new(size: FeatureMapConfig) -> Self {
        Self { size }
    }
}

impl GenerationStage for FeatureMapStage {
    fn id(&self) -> StageId {
        StageId::FeatureMap
    }

    fn name(&self) -> &str {
        "Feature Map"
    }

    fn dependencies(&self) -> &[StageId] {
        &[StageId::LandWater, StageId::Ridges]
    }

    fn execute(&self, world: &mut World, _rng: &mut dyn RandomStream) -> Result<(), PipelineError> {
        let tessellation = world
            .tessellation
            .as_ref()
            .ok_or_else(|| PipelineError::missing(self.name(), "a tessellation"))?;
        let regions = world
            .regions
            .as_ref()
            .ok_or_else(|| PipelineError::missing(self.name(), "regions"))?;
        let ridges = world
            .ridges
            .as_ref()
            .ok_or_else(|| PipelineError::missing(self.name(), "ridges"))?;
        let map = rasterize_features(
            regions,
            &ridges.edges,
            tessellation.bounds(),
            self.size.width,
            self.size.height,
        )
        .map_err(|e| PipelineError::stage(self.name(), e))?;
        info!(width = map.width, height = map.height, "feature map rasterized");
        world.feature_map = Some(map);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::ScriptedStream;

    fn small_regions() -> RegionConfig {
        RegionConfig {
            width: 200.0,
            height: 150.0,
            point_count: 30,
            cluster_count: 6,
            mountain_ridge_count: 5,
            ..Default::default()
        }
    }

    #[test]
    fn test_pipeline_execution() {
        let mut pipeline = Pipeline::new();
        pipeline
            .add_stage(TessellationStage::new(small_regions()))
            .add_stage(RegionStage::new(small_regions()));
        assert_eq!(pipeline.stage_count(), 2);

        let mut world = World::new("pipe");
        let mut rng = SeededStream::new("pipe");
        pipeline.run(&mut world, &mut rng).unwrap();

        assert_eq!(world.tessellation.as_ref().unwrap().len(), 30);
        let regions = world.regions.as_ref().unwrap();
        assert!(!regions.is_empty());
        let cells: usize = regions.iter().map(|r| r.cells.len()).sum();
        assert_eq!(cells, 30);
    }

    #[test]
    fn test_missing_dependency() {
        let mut pipeline = Pipeline::new();
        pipeline.add_stage(LandWaterStage::new(0.5));
        let mut world = World::new("x");
        let mut rng = ScriptedStream::constant(0.5);
        let err = pipeline.run(&mut world, &mut rng).unwrap_err();
        assert!(matches!(err, PipelineError::MissingDependency(..)));
    }

    #[test]
    fn test_pipeline_with_callbacks() {
        let mut pipeline = Pipeline::new();
        pipeline
            .add_stage(TessellationStage::new(small_regions()))
            .add_stage(TileFieldStage::new(TileGridConfig::small(), FieldConfig::default()));

        let mut started = Vec::new();
        let mut finished = 0;
        let mut world = World::new("cb");
        let mut rng = SeededStream::new("cb");
        pipeline
            .run_with_callbacks(
                &mut world,
                &mut rng,
                |name, i, total| started.push((name.to_string(), i, total)),
                |_, _, _| finished += 1,
            )
            .unwrap();

        assert_eq!(started[0], ("Tessellation".to_string(), 0, 2));
        assert_eq!(started[1].0, "Tile Fields");
        assert_eq!(finished, 2);
        assert!(world.tiles.is_some());
    }

    #[test]
    fn test_stage_failure_is_typed() {
        let mut pipeline = Pipeline::new();
        let config = RegionConfig {
            mountain_ridge_count: 100_000,
            ..small_regions()
        };
        pipeline
            .add_stage(TessellationStage::new(config.clone()))
            .add_stage(RegionStage::new(config.clone()))
            .add_stage(LandWaterStage::new(config.land_ratio))
            .add_stage(RidgeStage::new(config.mountain_ridge_count));
        let mut world = World::new("fail");
        let mut rng = SeededStream::new("fail");
        let err = pipeline.run(&mut world, &mut rng).unwrap_err();
        assert!(matches!(
            err.world_error(),
            Some(WorldGenError::ResourceExhaustion { requested: 100_000, .. })
        ));
        assert!(world.ridges.is_none());
    }

    #[test]
    fn test_tile_fields_do_not_consume_the_stream() {
        let mut pipeline = Pipeline::new();
        pipeline.add_stage(TileFieldStage::new(TileGridConfig::small(), FieldConfig::default()));
        let mut world = World::new("quiet");
        let mut rng = ScriptedStream::constant(0.5);
        pipeline.run(&mut world, &mut rng).unwrap();
        assert_eq!(rng.draws(), 0);
    }
}
