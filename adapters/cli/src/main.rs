#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs headless Tile Arena episodes.

mod arena;
mod config;
mod policy;
mod state_transfer;

use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use arena::{Arena, EffectTally, EpisodeSettings, Side};
use policy::PolicyKind;

/// Headless tile arena runner.
#[derive(Debug, Parser)]
#[command(name = "tile-arena", version, about = "Headless tile arena simulation")]
struct Cli {
    /// Optional TOML file overriding the default arena configuration.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Mode>,
}

#[derive(Debug, Subcommand)]
enum Mode {
    /// Runs one episode and prints its summary.
    Run(RunArgs),
    /// Prints the state transfer string of the freshly built arena.
    Export,
}

#[derive(Clone, Debug, Args)]
struct RunArgs {
    /// Maximum number of simulated frames.
    #[arg(long, default_value_t = 3600)]
    frames: u32,
    /// Length of a simulated frame in milliseconds.
    #[arg(long, default_value_t = 16)]
    frame_ms: u64,
    /// Frames simulated per policy decision.
    #[arg(long, default_value_t = 4)]
    frame_skip: u32,
    /// Seed of the random and heuristic policies.
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Policy driving the controlled entity.
    #[arg(long, value_enum, default_value_t = PolicyKind::Heuristic)]
    policy: PolicyKind,
    /// Entity handed to the policy.
    #[arg(long, value_enum, default_value_t = Side::Player)]
    side: Side,
    /// Comma-separated action codes replayed by the scripted policy.
    #[arg(long, value_delimiter = ',', default_value = "5")]
    script: Vec<u8>,
    /// Decisions without damage before the episode is called a stalemate; zero disables.
    #[arg(long, default_value_t = 900)]
    stalemate_frames: u32,
    /// State transfer string to start from instead of the default layout.
    #[arg(long)]
    state: Option<String>,
    /// Prints the state transfer string after the episode.
    #[arg(long)]
    print_state: bool,
}

impl Default for RunArgs {
    fn default() -> Self {
        Self {
            frames: 3600,
            frame_ms: 16,
            frame_skip: 4,
            seed: 0,
            policy: PolicyKind::Heuristic,
            side: Side::Player,
            script: vec![5],
            stalemate_frames: 900,
            state: None,
            print_state: false,
        }
    }
}

/// Entry point for the Tile Arena command-line interface.
fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = config::load(cli.config.as_deref())?;

    match cli.command.unwrap_or(Mode::Run(RunArgs::default())) {
        Mode::Run(args) => run(config, &args),
        Mode::Export => {
            let arena = Arena::build(config, Side::Player)?;
            let encoded = state_transfer::encode(&arena.simulation.snapshot())
                .context("failed to encode arena state")?;
            println!("{encoded}");
            Ok(())
        }
    }
}

fn run(config: tile_arena_core::config::ArenaConfig, args: &RunArgs) -> Result<()> {
    let mut arena = match args.state.as_deref() {
        Some(state) => {
            let snapshot =
                state_transfer::decode(state).context("failed to decode state string")?;
            Arena::restore(config, &snapshot)?
        }
        None => Arena::build(config, args.side)?,
    };

    let mut policy = policy::build(args.policy, args.seed, &args.script);
    let mut effects = EffectTally::default();
    let settings = EpisodeSettings {
        frames: args.frames,
        frame_skip: args.frame_skip,
        dt: Duration::from_millis(args.frame_ms),
        stalemate_frames: args.stalemate_frames,
    };
    let summary = arena::run_episode(
        &mut arena,
        args.side,
        policy.as_mut(),
        settings,
        &mut effects,
    )?;

    println!("outcome: {:?}", summary.outcome);
    println!(
        "frames: {} ({} ms simulated)",
        summary.frames,
        summary.clock.as_millis()
    );
    println!("player health: {}", format_health(summary.player_health));
    println!("boss health: {}", format_health(summary.boss_health));
    if let Some(phase) = summary.boss_phase {
        println!("boss phase: {}", phase.number());
    }
    for (effect, count) in &effects.counts {
        println!("effect {effect}: {count}");
    }
    if args.print_state {
        let encoded = state_transfer::encode(&arena.simulation.snapshot())
            .context("failed to encode arena state")?;
        println!("{encoded}");
    }
    Ok(())
}

fn format_health(health: Option<f32>) -> String {
    health.map_or_else(|| "dead".to_owned(), |health| format!("{health:.1}"))
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}
