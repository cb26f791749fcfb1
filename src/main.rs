//! Tileworld CLI - seeded procedural world generator.
//!
//! Generates a Voronoi region map with land, water and mountain ridges,
//! plus a biome tile grid, and writes PNG previews of both.

use clap::{Parser, Subcommand};
use std::error::Error;
use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use tileworld::biomes::{BiomeClassifier, format_hex_color};
use tileworld::export::{
    BiomeMapOptions, export_biome_map_png, export_feature_map_png, export_summary_json,
};
use tileworld::pipeline::{FeatureMapConfig, Pipeline, World, WorldConfig};
use tileworld::random::SeededStream;
use tileworld::regions::RegionConfig;
use tileworld::tiles::TileProperties;

/// Seeded procedural world generator.
#[derive(Parser)]
#[command(name = "tileworld")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log filter (e.g. "debug", "tileworld=trace"); RUST_LOG takes precedence.
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a world and export previews.
    Generate {
        /// JSON configuration file; flags below override its values.
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Seed string for reproducible generation.
        #[arg(short, long)]
        seed: Option<String>,

        /// Number of Voronoi sites.
        #[arg(long)]
        points: Option<usize>,

        /// Number of k-means clusters (defaults to points / 5 when --points is set).
        #[arg(long)]
        clusters: Option<usize>,

        /// Fraction of regions that become land (0.0-1.0).
        #[arg(long)]
        land_ratio: Option<f64>,

        /// Number of mountain ridge edges.
        #[arg(long)]
        ridges: Option<usize>,

        /// Tile grid size, e.g. 200x200.
        #[arg(long, value_parser = parse_size)]
        tiles: Option<(u32, u32)>,

        /// Rasterize a feature map of the given size, e.g. 800x600.
        #[arg(long, value_parser = parse_size)]
        feature_map: Option<(u32, u32)>,

        /// Pixels per tile in the biome preview.
        #[arg(long, default_value = "2")]
        scale: u32,

        /// Output directory for generated files.
        #[arg(short, long, default_value = "./output")]
        output: PathBuf,

        /// Base name for output files.
        #[arg(short, long, default_value = "world")]
        name: String,

        /// Also write the world summary as JSON.
        #[arg(long)]
        dump_json: bool,
    },

    /// Display the effective configuration and biome table.
    Info {
        /// JSON configuration file.
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Classify a property tuple against the biome table.
    Biomes {
        /// Temperature in [0, 1].
        temperature: f64,
        /// Moisture in [0, 1].
        moisture: f64,
        /// Light in [0, 1].
        light: f64,
        /// Altitude in [0, 1].
        altitude: f64,
        /// Seasonality in [0, 1].
        seasonality: f64,

        /// Number of guesses to print.
        #[arg(long, default_value = "3")]
        top: usize,

        /// JSON configuration file providing the biome table.
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn parse_size(s: &str) -> Result<(u32, u32), String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{}'", s))?;
    let w = w.trim().parse::<u32>().map_err(|e| format!("bad width '{}': {}", w, e))?;
    let h = h.trim().parse::<u32>().map_err(|e| format!("bad height '{}': {}", h, e))?;
    Ok((w, h))
}

fn init_logging(level: Option<&str>) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.unwrap_or("info")));
    let console_layer = fmt::layer()
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .with_timer(fmt::time::uptime());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref());

    let result = match cli.command {
        Commands::Generate {
            config,
            seed,
            points,
            clusters,
            land_ratio,
            ridges,
            tiles,
            feature_map,
            scale,
            output,
            name,
            dump_json,
        } => load_config(config.as_deref()).and_then(|mut cfg| {
            if let Some(seed) = seed {
                cfg.seed = seed;
            }
            if let Some(points) = points {
                cfg.regions.point_count = points;
                cfg.regions.cluster_count = RegionConfig::with_points(points).cluster_count;
            }
            if let Some(clusters) = clusters {
                cfg.regions.cluster_count = clusters;
            }
            if let Some(ratio) = land_ratio {
                cfg.regions.land_ratio = ratio;
            }
            if let Some(ridges) = ridges {
                cfg.regions.mountain_ridge_count = ridges;
            }
            if let Some((width, height)) = tiles {
                cfg.tiles.width = width;
                cfg.tiles.height = height;
            }
            if let Some((width, height)) = feature_map {
                cfg.feature_map = Some(FeatureMapConfig { width, height });
            }
            run_generate(&cfg, &output, &name, scale, dump_json)
        }),
        Commands::Info { config } => load_config(config.as_deref()).and_then(|cfg| run_info(&cfg)),
        Commands::Biomes {
            temperature,
            moisture,
            light,
            altitude,
            seasonality,
            top,
            config,
        } => load_config(config.as_deref()).and_then(|cfg| {
            let props = TileProperties::new(temperature, moisture, light, altitude, seasonality);
            run_biomes(&cfg, props, top)
        }),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn load_config(path: Option<&Path>) -> Result<WorldConfig, Box<dyn Error>> {
    match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .map_err(|e| format!("cannot read {}: {}", path.display(), e))?;
            Ok(WorldConfig::from_json(&text)?)
        }
        None => Ok(WorldConfig::default()),
    }
}

fn run_generate(
    config: &WorldConfig,
    output: &Path,
    name: &str,
    scale: u32,
    dump_json: bool,
) -> Result<(), Box<dyn Error>> {
    config.validate()?;

    println!("Tileworld - Procedural World Generator");
    println!("======================================");
    println!("Seed: {}", config.seed);
    println!(
        "Plane: {}x{}, {} points, {} clusters",
        config.regions.width, config.regions.height, config.regions.point_count, config.regions.cluster_count
    );
    println!("Tiles: {}x{}", config.tiles.width, config.tiles.height);
    println!("Output: {}", output.display());

    let start = Instant::now();
    println!("\nRunning generation pipeline...");
    let pipeline = Pipeline::standard(config);
    let mut world = World::new(config.seed.clone());
    let mut rng = SeededStream::new(&config.seed);
    pipeline.run_with_callbacks(
        &mut world,
        &mut rng,
        |name, i, total| {
            println!("  [{}/{}] Starting: {}", i + 1, total, name);
        },
        |name, i, total| {
            println!("  [{}/{}] Completed: {}", i + 1, total, name);
        },
    )?;
    println!("Generation completed in {:.2?}", start.elapsed());

    let summary = world.summary();
    println!("\nRegions: {} ({} land)", summary.regions, summary.land_regions);
    println!("Land area: {:.1}", summary.land_area);
    println!("Ridge edges: {}", summary.ridge_edges);
    println!("Biomes:");
    for (id, count) in &summary.biome_counts {
        let biome_name = config
            .biomes
            .table
            .iter()
            .find(|b| b.id == *id)
            .map_or("?", |b| b.name.as_str());
        println!("  {:>2} {:<24} {:>8} tiles", id, biome_name, count);
    }

    println!("\nExporting previews...");
    let export_start = Instant::now();
    std::fs::create_dir_all(output)?;

    if let Some(grid) = &world.tiles {
        let path = output.join(format!("{}_biomes.png", name));
        let options = BiomeMapOptions {
            scale,
            ..Default::default()
        };
        export_biome_map_png(grid, &config.biomes.table, &path, &options)?;
        println!("  Exported biome map: {}", path.display());
    }
    if let Some(map) = &world.feature_map {
        let path = output.join(format!("{}_features.png", name));
        export_feature_map_png(map, &path)?;
        println!("  Exported feature map: {}", path.display());
    }
    if dump_json {
        let path = output.join(format!("{}_summary.json", name));
        export_summary_json(&summary, &path)?;
        println!("  Exported summary: {}", path.display());
    }

    println!("Export completed in {:.2?}", export_start.elapsed());
    println!("\nTotal time: {:.2?}", start.elapsed());
    println!("Done!");
    Ok(())
}

fn run_info(config: &WorldConfig) -> Result<(), Box<dyn Error>> {
    println!("Tileworld - Configuration Info");
    println!("==============================");
    println!();
    println!("{}", config.to_json()?);
    println!();
    println!("Tile count: {}", config.tiles.tile_count());
    println!("Start points: {} (min spacing {})", config.tiles.start_points, config.tiles.min_start_distance);
    println!();
    println!("Biome table:");
    println!(
        "  {:>2} {:<24} {:<8} {:>11} {:>11} {:>11} {:>11} {:>11}",
        "id", "name", "color", "temp", "moisture", "light", "altitude", "season"
    );
    for b in &config.biomes.table {
        let r = b.ranges();
        println!(
            "  {:>2} {:<24} {:<8} {:>5.2}-{:<5.2} {:>5.2}-{:<5.2} {:>5.2}-{:<5.2} {:>5.2}-{:<5.2} {:>5.2}-{:<5.2}",
            b.id,
            b.name,
            format_hex_color(b.color),
            r[0].min,
            r[0].max,
            r[1].min,
            r[1].max,
            r[2].min,
            r[2].max,
            r[3].min,
            r[3].max,
            r[4].min,
            r[4].max,
        );
    }
    Ok(())
}

fn run_biomes(config: &WorldConfig, props: TileProperties, top: usize) -> Result<(), Box<dyn Error>> {
    let classifier = BiomeClassifier::new(&config.biomes)?;
    let guesses = classifier.classify(&props, top)?;
    println!(
        "Properties: temperature={:.3} moisture={:.3} light={:.3} altitude={:.3} seasonality={:.3}",
        props.temperature, props.moisture, props.light, props.altitude, props.seasonality
    );
    for (rank, guess) in guesses.iter().enumerate() {
        let biome_name = classifier.biome(guess.biome_id).map_or("?", |b| b.name.as_str());
        println!(
            "  {}. {:<24} confidence {:.3}  distance {:.3}",
            rank + 1,
            biome_name,
            guess.confidence,
            guess.distance
        );
    }
    Ok(())
}
