mod assets;
mod config;
mod watch;

use std::error::Error;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};
use simplelog::{ColorChoice, LevelFilter, TermLogger, TerminalMode};
use veld_geom::{Aabb, Camera, Vec3};
use veld_gpu::{GpuDevice, HeadlessDevice};
use veld_grass::{GrassGenerator, GrassMap, HeightSampler, SourceMesh, TriangleCollider};
use veld_runtime::{GeneratorSettings, TerrainGenerator, TickStats};
use veld_world::DensitySource;
use veld_world::worldgen::TerrainConfig;

#[derive(Parser, Debug)]
#[command(name = "veld", version, about = "Density-source terrain with baked, streamed grass")]
struct Cli {
    /// off, error, warn, info, debug or trace
    #[arg(long, global = true, default_value = "info")]
    log_level: LevelFilter,
    /// Assets root; searched for upwards from the working directory when unset
    #[arg(long, global = true)]
    assets: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate every terrain chunk the density sources touch
    Terrain {
        #[arg(long)]
        world: Option<PathBuf>,
        /// Keep running and regenerate changed sources when the world config is saved
        #[arg(long)]
        watch: bool,
    },
    /// Generate the terrain and bake a grass map on its surface
    BakeGrass {
        #[arg(long)]
        world: Option<PathBuf>,
        #[arg(long)]
        grass: Option<PathBuf>,
        #[arg(long, default_value = "terrain")]
        name: String,
        /// Map corner on the XZ plane; defaults to the terrain's minimum corner
        #[arg(long, num_args = 2, value_names = ["X", "Z"], allow_negative_numbers = true)]
        origin: Option<Vec<f32>>,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Walk a straight line over baked maps, streaming and drawing grass blocks
    StreamGrass {
        #[arg(long = "map", required = true)]
        maps: Vec<PathBuf>,
        #[arg(long)]
        grass: Option<PathBuf>,
        #[arg(long, num_args = 2, value_names = ["X", "Z"], allow_negative_numbers = true, default_values_t = [0.0, 0.0])]
        from: Vec<f32>,
        #[arg(long, num_args = 2, value_names = ["X", "Z"], allow_negative_numbers = true, default_values_t = [64.0, 64.0])]
        to: Vec<f32>,
        #[arg(long, default_value_t = 16)]
        steps: u32,
    },
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = TermLogger::init(
        cli.log_level,
        simplelog::Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    ) {
        eprintln!("failed to initialise logging: {}", e);
    }
    let root = assets::resolve_assets_root(cli.assets);
    log::debug!("assets root {:?}", root);

    let result = match cli.command {
        Command::Terrain { world, watch } => {
            run_terrain(&world.unwrap_or_else(|| assets::world_config_path(&root)), watch)
        }
        Command::BakeGrass {
            world,
            grass,
            name,
            origin,
            out,
        } => bake_grass(
            &world.unwrap_or_else(|| assets::world_config_path(&root)),
            &grass.unwrap_or_else(|| assets::grass_config_path(&root)),
            &name,
            origin.map(|v| Vec3::new(v[0], 0.0, v[1])),
            &out.unwrap_or_else(|| assets::grass_map_path(&root, &name)),
        ),
        Command::StreamGrass {
            maps,
            grass,
            from,
            to,
            steps,
        } => stream_grass(
            &maps,
            &grass.unwrap_or_else(|| assets::grass_config_path(&root)),
            Vec3::new(from[0], 0.0, from[1]),
            Vec3::new(to[0], 0.0, to[1]),
            steps,
        ),
    };
    if let Err(e) = result {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

fn sources(cfg: &TerrainConfig) -> Vec<DensitySource> {
    cfg.sources.iter().map(|def| def.to_source()).collect()
}

fn build_terrain(cfg: &TerrainConfig) -> TerrainGenerator {
    let mut terrain = TerrainGenerator::with_cpu_pipeline(GeneratorSettings::from_config(cfg));
    terrain.attach_device(Box::new(HeadlessDevice::new()));
    terrain.sync_sources(sources(cfg));
    terrain
}

fn report(terrain: &TerrainGenerator, stats: TickStats, elapsed: Duration) {
    let (vertices, triangles) = terrain.chunks().fold((0, 0), |(v, t), c| {
        (v + c.mesh.vertex_count(), t + c.mesh.triangle_count())
    });
    log::info!(
        "terrain: {} chunks ({} rebuilt, {} removed), {} vertices, {} triangles in {:.1}ms",
        stats.live_chunks,
        stats.meshed,
        stats.destroyed,
        vertices,
        triangles,
        elapsed.as_secs_f64() * 1000.0
    );
}

fn run_terrain(world: &Path, watch: bool) -> Result<(), Box<dyn Error>> {
    let cfg = config::load_terrain(world)?;
    let mut terrain = build_terrain(&cfg);
    let t0 = Instant::now();
    terrain.generate_world();
    let stats = terrain.flush();
    report(&terrain, stats, t0.elapsed());

    if watch {
        let (_watcher, rx) = watch::watch_file(world)?;
        log::info!("watching {:?} for changes", world);
        while rx.recv().is_ok() {
            // Saves arrive as bursts of events
            std::thread::sleep(Duration::from_millis(100));
            while rx.try_recv().is_ok() {}
            match config::load_terrain(world) {
                Ok(cfg) => {
                    let t0 = Instant::now();
                    if terrain.set_settings(GeneratorSettings::from_config(&cfg)) {
                        log::info!("extraction settings changed; rebuilding every source");
                    }
                    let touched = terrain.sync_sources(sources(&cfg));
                    log::info!("reloaded {:?}: {} sources changed", world, touched);
                    let stats = terrain.flush();
                    report(&terrain, stats, t0.elapsed());
                }
                Err(e) => log::warn!("keeping the current terrain: {}", e),
            }
        }
    }
    terrain.shutdown();
    Ok(())
}

/// One grass source per non-empty chunk, in chunk order.
fn terrain_meshes(terrain: &TerrainGenerator) -> Vec<SourceMesh> {
    let mut chunks: Vec<_> = terrain.chunks().collect();
    chunks.sort_by_key(|c| c.coord);
    chunks
        .into_iter()
        .map(|c| SourceMesh::from_corners(format!("chunk {}", c.coord), c.world_triangles()))
        .filter(|m| m.triangle_count() > 0)
        .collect()
}

fn bake_grass(
    world: &Path,
    grass: &Path,
    name: &str,
    origin: Option<Vec3>,
    out: &Path,
) -> Result<(), Box<dyn Error>> {
    let terrain_cfg = config::load_terrain(world)?;
    let grass_cfg = config::load_grass(grass)?;

    let mut terrain = build_terrain(&terrain_cfg);
    let t0 = Instant::now();
    terrain.generate_world();
    let stats = terrain.flush();
    report(&terrain, stats, t0.elapsed());
    let meshes = terrain_meshes(&terrain);
    terrain.shutdown();

    let Some(surface) = Aabb::from_points(meshes.iter().flat_map(|m| m.positions.iter().copied()))
    else {
        return Err("the terrain has no surface to grow grass on".into());
    };
    let origin = origin.unwrap_or_else(|| {
        let bs = grass_cfg.block_size;
        Vec3::new(
            (surface.min.x / bs).floor() * bs,
            0.0,
            (surface.min.z / bs).floor() * bs,
        )
    });
    let extent = grass_cfg.map_extent();
    if surface.max.x > origin.x + extent || surface.max.z > origin.z + extent {
        log::warn!(
            "grass map covers {}x{} from ({}, {}); terrain beyond it gets no grass",
            extent,
            extent,
            origin.x,
            origin.z
        );
    }

    let artifact = veld_grass::bake(name, origin, &meshes, &grass_cfg);
    if let Some(dir) = out.parent() {
        std::fs::create_dir_all(dir)?;
    }
    artifact.save(out)?;
    log::info!(
        "wrote grass map '{}' ({} triangles) to {:?}",
        name,
        artifact.triangle_count(),
        out
    );
    Ok(())
}

/// Collider over every map's baked surface, used as the terrain height source.
fn map_surface(maps: &[GrassMap]) -> TriangleCollider {
    let mut triangles = Vec::new();
    for map in maps {
        let a = map.artifact();
        for t in a.indices.chunks_exact(3) {
            let corner = |i: u32| a.positions.get(i as usize).copied().map(Vec3::from);
            if let (Some(p0), Some(p1), Some(p2)) = (corner(t[0]), corner(t[1]), corner(t[2])) {
                triangles.push([p0, p1, p2]);
            }
        }
    }
    TriangleCollider::new(triangles)
}

fn stream_grass(
    paths: &[PathBuf],
    grass: &Path,
    from: Vec3,
    to: Vec3,
    steps: u32,
) -> Result<(), Box<dyn Error>> {
    let cfg = config::load_grass(grass)?;
    let mut maps = Vec::with_capacity(paths.len());
    for p in paths {
        let map = GrassMap::load(p).map_err(|e| format!("grass map {:?}: {}", p, e))?;
        log::info!(
            "loaded grass map '{}' with {} triangles",
            map.name(),
            map.artifact().triangle_count()
        );
        maps.push(map);
    }
    let ground = map_surface(&maps);

    let mut device = HeadlessDevice::new();
    let mut grass = GrassGenerator::new(cfg, maps, &mut device);
    let heading = if (to - from).length_sq() > 0.0 {
        (to - from).normalized()
    } else {
        Vec3::new(0.0, 0.0, 1.0)
    };
    let steps = steps.max(1);
    for step in 0..=steps {
        let mut p = from.lerp(to, step as f32 / steps as f32);
        p.y = ground.sample_height(p.x, p.z);
        let stream = grass.update(p, &ground, &mut device);
        let eye = p + Vec3::new(0.0, 1.7, 0.0);
        let cam = Camera::looking_at(eye, eye + heading);
        let frame = grass.render(Some(&cam), p, step as f32 * 0.1, &mut device);
        log::info!(
            "step {}: ({:.1}, {:.1}, {:.1}) +{} -{} blocks, {} uncovered, {} live, {} visible",
            step,
            p.x,
            p.y,
            p.z,
            stream.created,
            stream.removed,
            stream.uncovered,
            frame.live,
            frame.visible
        );
    }
    grass.shutdown(&mut device);
    device.stats().log_summary();
    Ok(())
}
