//! Headless host driver: builds a colony, runs it for a fixed number of ticks
//! and reports the run summary as JSON.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use antsim_core::{Colony, ColonyConfig, SteeringMode};
use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ModeArg {
    Direct,
    Trail,
}

impl From<ModeArg> for SteeringMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Direct => SteeringMode::Direct,
            ModeArg::Trail => SteeringMode::Trail,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "antsim")]
#[command(about = "Run a foraging colony headless and print its run summary")]
struct Cli {
    /// JSON colony configuration; missing fields take their defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of ticks to simulate
    #[arg(short, long, default_value = "3000")]
    ticks: u64,

    /// Sample metrics every N ticks
    #[arg(long, default_value = "100")]
    sample_every: u64,

    /// Override the configured seed
    #[arg(long)]
    seed: Option<u64>,

    /// Override the configured agent count
    #[arg(short, long)]
    agents: Option<usize>,

    /// Override the initial steering mode
    #[arg(short, long, value_enum)]
    mode: Option<ModeArg>,

    /// Toggle between direct and trail steering every N ticks
    #[arg(long)]
    toggle_every: Option<u64>,

    /// Move agents on the rayon thread pool
    #[arg(long)]
    parallel: bool,

    /// Write the summary here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write the final colony snapshot (agents, food, field) to this path
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, short)]
    verbose: bool,
}

fn load_config(cli: &Cli) -> Result<ColonyConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("parsing config {}", path.display()))?
        }
        None => ColonyConfig::default(),
    };
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }
    if let Some(agents) = cli.agents {
        config.agent_count = agents;
    }
    if let Some(mode) = cli.mode {
        config.initial_mode = mode.into();
    }
    if cli.parallel {
        config.parallel = true;
    }
    Ok(config)
}

fn write_json<T: serde::Serialize>(value: &T, path: Option<&PathBuf>) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    match path {
        Some(path) => fs::write(path, json).with_context(|| format!("writing {}", path.display())),
        None => {
            println!("{json}");
            Ok(())
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(&cli)?;
    let mut colony = Colony::try_new(config).context("building colony")?;
    info!(
        agents = colony.agents().len(),
        ticks = cli.ticks,
        mode = ?colony.mode(),
        "starting run"
    );

    let toggle_every = cli.toggle_every.filter(|n| *n > 0);
    let summary = colony.try_run_with(cli.ticks, cli.sample_every, |colony, tick| {
        if let Some(every) = toggle_every {
            if tick.tick % every == 0 {
                colony.toggle_mode();
            }
        }
    })?;

    let accounting = colony.food_accounting();
    info!(
        delivered = summary.total_delivered,
        remaining = accounting.remaining,
        carried = accounting.carried,
        "run finished"
    );

    write_json(&summary, cli.output.as_ref())?;
    if let Some(path) = &cli.snapshot {
        write_json(&colony.snapshot(), Some(path))?;
    }
    Ok(())
}
