// main.rs - Command line front end for the ring simulator
//
// The grid report goes to stdout; logs go to stderr.

use std::io::{self, BufWriter};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use conway_ring::{Aggregation, SimConfig, Simulation, TextReporter, patterns};

/// Distributed Conway's Game of Life on a ring of ranks
#[derive(Parser)]
#[command(name = "conway_ring")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// TOML file with simulation parameters
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Grid side length
    #[arg(short, long)]
    dimension: Option<usize>,

    /// Number of ranks in the ring (must divide the dimension)
    #[arg(short, long)]
    processes: Option<usize>,

    /// Generations to simulate
    #[arg(short, long)]
    iterations: Option<u64>,

    /// When the coordinator reports the global grid
    #[arg(short, long, value_enum)]
    aggregation: Option<Aggregation>,

    /// Named seed pattern
    #[arg(long)]
    pattern: Option<String>,

    /// Pattern corner as ROW,COL
    #[arg(long, value_parser = parse_origin)]
    origin: Option<(usize, usize)>,

    /// Seed matrix file (lines of comma-separated 0/1)
    #[arg(long)]
    seed_file: Option<PathBuf>,

    /// Fill the grid pseudo-randomly from this seed
    #[arg(long)]
    random: Option<u64>,

    /// Print the available patterns and exit
    #[arg(long)]
    list_patterns: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn apply(&self, config: &mut SimConfig) {
        if let Some(dimension) = self.dimension {
            config.dimension = dimension;
        }
        if let Some(processes) = self.processes {
            config.processes = processes;
        }
        if let Some(iterations) = self.iterations {
            config.iterations = iterations;
        }
        if let Some(aggregation) = self.aggregation {
            config.aggregation = aggregation;
        }
        if let Some(pattern) = &self.pattern {
            config.pattern = pattern.clone();
        }
        if let Some(origin) = self.origin {
            config.origin = origin;
        }
        if let Some(path) = &self.seed_file {
            config.seed_file = Some(path.clone());
        }
        if let Some(value) = self.random {
            config.random_seed = Some(value);
        }
    }
}

fn parse_origin(text: &str) -> Result<(usize, usize), String> {
    let (row, col) = text
        .split_once(',')
        .ok_or_else(|| format!("expected ROW,COL, got `{text}`"))?;
    let row = row.trim().parse().map_err(|e| format!("row: {e}"))?;
    let col = col.trim().parse().map_err(|e| format!("col: {e}"))?;
    Ok((row, col))
}

fn setup_logging(verbose: bool) {
    let fallback = if verbose { "conway_ring=debug" } else { "conway_ring=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    if cli.list_patterns {
        for pattern in patterns::PATTERNS {
            println!("{:<12} {} cells", pattern.name, pattern.cells.len());
        }
        return Ok(());
    }

    let mut config = match &cli.config {
        Some(path) => SimConfig::load(path)
            .with_context(|| format!("reading {}", path.display()))?,
        None => SimConfig::default(),
    };
    cli.apply(&mut config);
    config.validate()?;

    let seed = config.build_seed().context("building the seed grid")?;
    let simulation = Simulation::from_config(&config);

    let mut reporter = TextReporter::new(BufWriter::new(io::stdout()));
    let summary = simulation.run(&seed, &mut reporter).await?;
    reporter.finish().context("writing the grid report")?;

    info!(
        generations = summary.generations,
        frames = summary.frames_observed,
        live = summary.final_grid.live_count(),
        "done"
    );
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}
