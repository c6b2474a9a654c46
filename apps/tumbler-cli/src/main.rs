use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;
use tumbler_assets::{GltfFile, ModelSource};
use tumbler_common::SceneConfig;
use tumbler_render::{DebugTextRenderer, RenderView, Renderer};
use tumbler_scene::{FrameTimer, Scene};

#[derive(Parser)]
#[command(name = "tumbler-cli", about = "Headless tools for the tumbler scene")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Tick the scene headlessly and dump its state
    Simulate {
        /// Number of ticks to run
        #[arg(short, long, default_value = "60")]
        ticks: u64,
        /// Seconds per tick
        #[arg(long, default_value = "0.016")]
        dt: f32,
        /// RNG seed for the surface waves
        #[arg(short, long, default_value = "42")]
        seed: u64,
        /// Scene configuration file (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Load this model before ticking and wait for it to settle
        #[arg(short, long)]
        model: Option<PathBuf>,
        /// Surface vertices listed in the dump
        #[arg(long, default_value = "4")]
        samples: usize,
    },
    /// Print what a glTF model provides: mesh size and clips
    InspectModel {
        path: PathBuf,
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Write the default scene configuration as TOML
    DefaultConfig {
        /// Output file; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Most recent ticks the timing summary covers.
const TIMING_WINDOW: u64 = 1024;

fn timing_window(ticks: u64) -> usize {
    ticks.clamp(1, TIMING_WINDOW) as usize
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<SceneConfig> {
    match path {
        Some(path) => SceneConfig::load(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(SceneConfig::default()),
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("tumbler-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("terrain: {}", tumbler_terrain::crate_info());
            println!("assets: {}", tumbler_assets::crate_info());
            println!("scene: {}", tumbler_scene::crate_info());
            println!("render: {}", tumbler_render::crate_info());
        }
        Commands::Simulate {
            ticks,
            dt,
            seed,
            config,
            model,
            samples,
        } => {
            let config = load_config(config.as_ref())?;
            let mut scene = Scene::new(config, seed)?;
            println!("Simulate: seed={seed}, ticks={ticks}, dt={dt}");

            if let Some(path) = model {
                tracing::debug!(path = %path.display(), "waiting for model load");
                scene.load_player_model_from(GltfFile::new(path));
                let mut waits = 0u32;
                while scene.rig().is_loading() {
                    std::thread::sleep(Duration::from_millis(5));
                    scene.tick(0.0);
                    waits += 1;
                }
                println!(
                    "Model settled as '{}' after {waits} zero-length frames",
                    scene.rig().visual().label()
                );
            }

            let mut timer = FrameTimer::new(timing_window(ticks));
            for _ in 0..ticks {
                let start = Instant::now();
                scene.tick(dt);
                timer.record(start.elapsed());
            }

            let view = RenderView::from_scene(&scene);
            print!("{}", DebugTextRenderer::with_samples(samples).render(&scene, &view));
            println!(
                "Tick cost over the last {} ticks: avg={:?} min={:?} max={:?}",
                ticks.min(TIMING_WINDOW),
                timer.average(),
                timer.min(),
                timer.max()
            );
        }
        Commands::InspectModel { path, json } => {
            let source = GltfFile::new(&path);
            let bundle = source.fetch()?;
            let summary = bundle.summary();
            if json {
                println!("{}", summary.to_json()?);
            } else {
                println!("Model: {} (id {:#018x})", summary.name, summary.id.0);
                println!(
                    "Mesh: vertices={} triangles={}",
                    summary.vertex_count, summary.triangle_count
                );
                if let Some((min, max)) = bundle.mesh.bounds() {
                    println!(
                        "Bounds: ({:.3}, {:.3}, {:.3}) .. ({:.3}, {:.3}, {:.3})",
                        min.x, min.y, min.z, max.x, max.y, max.z
                    );
                }
                println!("Clips: {}", summary.clips.len());
                for (i, clip) in summary.clips.iter().enumerate() {
                    println!(
                        "  #{i}: {} ({:.3}s)",
                        clip.name.as_deref().unwrap_or("<unnamed>"),
                        clip.duration
                    );
                }
            }
        }
        Commands::DefaultConfig { output } => {
            let config = SceneConfig::default();
            match output {
                Some(path) => {
                    config.save(&path)?;
                    println!("wrote {}", path.display());
                }
                None => print!("{}", config.to_toml_string()?),
            }
        }
    }

    Ok(())
}
