mod render;

use anyhow::{Context, Result};
use bevy::app::ScheduleRunnerPlugin;
use bevy::log::LogPlugin;
use bevy::prelude::*;
use bevy_egui::EguiPlugin;
use clap::Parser;
use rand::Rng;
use render::ViewerPlugin;
use rps_swarm::config::{SimConfig, DEFAULT_KIND_COUNT};
use rps_swarm::plugin::{SimulationPlugin, Stepping};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "rps-swarm")]
#[command(version, about = "Rock-paper-scissors swarm simulation", long_about = None)]
struct Cli {
    /// Initial number of scissors
    #[arg(default_value_t = DEFAULT_KIND_COUNT)]
    scissors: usize,

    /// Initial number of rocks
    #[arg(default_value_t = DEFAULT_KIND_COUNT)]
    rock: usize,

    /// Initial number of papers
    #[arg(default_value_t = DEFAULT_KIND_COUNT)]
    paper: usize,

    /// Random seed (random when omitted)
    #[arg(long)]
    seed: Option<u64>,

    /// Ticks before the run is declared a draw
    #[arg(long)]
    max_ticks: Option<u64>,

    /// TOML file overriding the default tuning
    #[arg(long)]
    config: Option<PathBuf>,

    /// Run without a window, as fast as possible, and exit when finished
    #[arg(long)]
    headless: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => SimConfig::from_toml_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => SimConfig::default(),
    };
    if let Some(max_ticks) = cli.max_ticks {
        config.max_ticks = max_ticks;
    }

    let seed = cli
        .seed
        .unwrap_or_else(|| rand::thread_rng().gen_range(0..u64::MAX));
    let simulation = SimulationPlugin::new([cli.scissors, cli.rock, cli.paper], config.clone(), seed)
        .context("initializing simulation")?;

    if cli.headless {
        App::new()
            .add_plugins(MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(Duration::ZERO)))
            .add_plugins(LogPlugin::default())
            .add_plugins(
                simulation
                    .with_stepping(Stepping::EveryFrame)
                    .exit_on_finish(),
            )
            .run();
    } else {
        App::new()
            .add_plugins(DefaultPlugins.set(WindowPlugin {
                primary_window: Some(Window {
                    title: "Rock Paper Scissors Simulation".to_string(),
                    resolution: (config.width as f32, config.height as f32).into(),
                    ..default()
                }),
                ..default()
            }))
            .add_plugins(EguiPlugin)
            .add_plugins((simulation, ViewerPlugin))
            .run();
    }

    Ok(())
}
