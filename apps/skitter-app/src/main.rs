//! Skitter locomotion CLI.
//!
//! Provides two modes of operation:
//! - `run`: Walk a body across a test terrain and print a summary, or one
//!   timestamped JSON snapshot per tick
//! - `info`: Print workspace crate versions and the default configuration

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use nalgebra::Vector3;
use serde_json::json;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use skitter_core::prelude::*;
use skitter_locomotion::prelude::*;
use skitter_test_utils::{FlatGround, StepGround, seeded_pit};

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

/// Procedural legged locomotion driver.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Walk a body forward over a terrain.
    Run {
        /// Number of legs (4, 6 or 8). Overrides the body plan from `--config`.
        #[arg(short, long)]
        legs: Option<usize>,

        /// Number of ticks to simulate.
        #[arg(short, long, default_value_t = 200)]
        ticks: u64,

        /// Terrain to walk on.
        #[arg(long, value_enum, default_value_t = TerrainKind::Flat)]
        terrain: TerrainKind,

        /// Seed for the pit terrain.
        #[arg(short, long, default_value_t = 0)]
        seed: u64,

        /// Forward speed per tick (default: the active gait's max speed).
        #[arg(long)]
        speed: Option<f64>,

        /// Use the gallop gait.
        #[arg(long)]
        gallop: bool,

        /// TOML configuration file.
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Print a JSON snapshot, stamped with its time in seconds, after every tick.
        #[arg(long)]
        json: bool,
    },

    /// Print crate information.
    Info,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum TerrainKind {
    Flat,
    Pit,
    Steps,
}

struct RunArgs {
    legs: Option<usize>,
    ticks: u64,
    terrain: TerrainKind,
    seed: u64,
    speed: Option<f64>,
    gallop: bool,
    config: Option<PathBuf>,
    json: bool,
}

// ---------------------------------------------------------------------------
// Mode implementations
// ---------------------------------------------------------------------------

fn body_plan(legs: usize) -> Result<BodyPlan> {
    match legs {
        4 => Ok(BodyPlan::quadruped()),
        6 => Ok(BodyPlan::hexapod()),
        8 => Ok(BodyPlan::octopod()),
        other => bail!("no built-in body plan with {other} legs (expected 4, 6 or 8)"),
    }
}

fn terrain(kind: TerrainKind, seed: u64) -> Box<dyn GroundQuery> {
    match kind {
        TerrainKind::Flat => Box::new(FlatGround::default()),
        TerrainKind::Pit => Box::new(seeded_pit(seed)),
        TerrainKind::Steps => Box::new(StepGround::new(0.0, 0.3, 3.0)),
    }
}

/// Simulated time after `tick` ticks.
#[allow(clippy::cast_precision_loss)]
fn time_at(tick: u64, tick_dt: f64) -> f64 {
    tick as f64 * tick_dt
}

fn run(args: RunArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => SpiderConfig::from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => SpiderConfig::default(),
    };
    if let Some(legs) = args.legs {
        config.body_plan = body_plan(legs)?;
    }

    let ground = terrain(args.terrain, args.seed);
    let tick_dt = config.tick_dt();
    let spawn = Vector3::new(0.0, config.walk.body_height, 0.0);
    let mut body = SpiderBody::from_config(config, spawn)?;
    body.set_gallop(args.gallop);

    let speed = args.speed.unwrap_or(body.active_gait().max_speed);
    let motion = DesiredMotion::new(Vector3::z() * speed, Vector3::z());
    info!(
        legs = body.legs().len(),
        terrain = ground.name(),
        ticks = args.ticks,
        tick_rate_hz = 1.0 / tick_dt,
        speed,
        "starting run"
    );

    let mut steps = 0_usize;
    let mut stranded_ticks = 0_usize;
    for _ in 0..args.ticks {
        body.tick(&motion, ground.as_ref());

        for event in body.drain_events() {
            match event {
                SpiderEvent::LegStep { .. } => steps += 1,
                SpiderEvent::HitGround { speed, .. } => {
                    info!(time = time_at(body.tick_count(), tick_dt), speed, "body hit ground");
                }
                other => debug!(?other, "event"),
            }
        }
        stranded_ticks += body.legs().iter().filter(|l| l.is_stranded()).count();

        if args.json {
            let record = json!({
                "time": time_at(body.tick_count(), tick_dt),
                "snapshot": body.snapshot(),
            });
            println!("{}", serde_json::to_string(&record)?);
        }
    }

    if !args.json {
        let position = body.position();
        println!(
            "ticks={}, time={:.2}s, position=({:.3}, {:.3}, {:.3}), yaw={:.3}",
            body.tick_count(),
            time_at(body.tick_count(), tick_dt),
            position.x,
            position.y,
            position.z,
            body.yaw()
        );
        println!("steps={steps}, stranded_leg_ticks={stranded_ticks}, gait={:?}", body.gait_kind());
    }
    Ok(())
}

fn run_info() {
    println!("skitter v{}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("crates:");
    println!("  skitter-core        {}", env!("CARGO_PKG_VERSION"));
    println!("  skitter-ik          {}", env!("CARGO_PKG_VERSION"));
    println!("  skitter-gait        {}", env!("CARGO_PKG_VERSION"));
    println!("  skitter-locomotion  {}", env!("CARGO_PKG_VERSION"));
    println!();

    let config = SpiderConfig::default();
    println!("tick rate: {} Hz ({} s per tick)", config.tick_rate_hz, config.tick_dt());
    println!("default legs: {}", config.body_plan.leg_count());
    for gait in [&config.walk, &config.gallop] {
        println!(
            "  {:?}: max_speed={}, leg_speed={}..{}, trigger={}..{}",
            gait.kind,
            gait.max_speed,
            gait.stationary_leg_speed,
            gait.moving_leg_speed,
            gait.stationary_trigger_zone.horizontal,
            gait.moving_trigger_zone.horizontal
        );
    }
    println!();
    println!("edition: 2024");
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Run {
            legs,
            ticks,
            terrain,
            seed,
            speed,
            gallop,
            config,
            json,
        }) => run(RunArgs {
            legs,
            ticks,
            terrain,
            seed,
            speed,
            gallop,
            config,
            json,
        }),
        Some(Commands::Info) => {
            run_info();
            Ok(())
        }
        None => run(RunArgs {
            legs: None,
            ticks: 200,
            terrain: TerrainKind::Flat,
            seed: 0,
            speed: None,
            gallop: false,
            config: None,
            json: false,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn ticks_map_onto_configured_rate() {
        let config = SpiderConfig::default();
        assert_relative_eq!(time_at(0, config.tick_dt()), 0.0);
        assert_relative_eq!(time_at(40, config.tick_dt()), 2.0, epsilon = 1e-12);
        assert_relative_eq!(time_at(40, 1.0 / 50.0), 0.8, epsilon = 1e-12);
    }

    #[test]
    fn only_built_in_leg_counts_have_plans() {
        assert_eq!(body_plan(6).unwrap().leg_count(), 6);
        assert!(body_plan(5).is_err());
    }
}
