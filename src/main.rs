//! Life-cycle portfolio CLI
//!
//! Solves and simulates the consumer, then writes the age-profile charts
//! (and optionally the aggregate tables) to disk.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use lifecycle_portfolio::{pipeline, Calibration, OutputLocation, RunConfig};

#[derive(Parser, Debug)]
#[command(name = "lifecycle_portfolio")]
#[command(about = "Simulate a life-cycle portfolio consumer and plot age profiles")]
struct Args {
    /// Project root; outputs go to <root>/Figures and <root>/Tables
    #[arg(long)]
    root: Option<PathBuf>,

    /// Directory for the charts (overrides --root)
    #[arg(long)]
    figures_dir: Option<PathBuf>,

    /// Directory for the CSV tables and run summary (overrides --root)
    #[arg(long)]
    tables_dir: Option<PathBuf>,

    /// Skip writing the CSV tables and run summary
    #[arg(long)]
    no_tables: bool,

    /// JSON calibration file; missing fields keep their defaults
    #[arg(long)]
    calibration: Option<PathBuf>,

    /// CSV survival table (age,female,male one-year death probabilities)
    #[arg(long)]
    survival_csv: Option<PathBuf>,

    /// Number of simulated agents
    #[arg(long)]
    agents: Option<usize>,

    /// Simulated life cycles
    #[arg(long)]
    cycles: Option<usize>,

    /// Random seed
    #[arg(short, long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let location = match &args.root {
        Some(root) => OutputLocation::Root(root.clone()),
        None => OutputLocation::Standalone,
    };
    let mut config = RunConfig::new(&location);

    if let Some(path) = &args.calibration {
        config.calibration = Calibration::from_json_path(path)
            .with_context(|| format!("Failed to load calibration from {}", path.display()))?;
    }
    if let Some(path) = &args.survival_csv {
        config.calibration = config
            .calibration
            .with_survival_csv(path)
            .with_context(|| format!("Failed to load survival table from {}", path.display()))?;
    }

    if let Some(agents) = args.agents {
        config.simulation.agent_count = agents;
    }
    if let Some(cycles) = args.cycles {
        config.simulation.cycles = cycles;
    }
    if let Some(seed) = args.seed {
        config.simulation.seed = seed;
    }

    if let Some(dir) = args.figures_dir {
        config.figures_dir = dir;
    }
    if args.no_tables {
        config.tables_dir = None;
    } else if let Some(dir) = args.tables_dir {
        config.tables_dir = Some(dir);
    }

    info!("Figures directory: {}", config.figures_dir.display());
    let report = pipeline::run(&config).context("Life-cycle run failed")?;

    println!("Wrote {} figures to {}", report.figures.len(), config.figures_dir.display());
    if let Some(dir) = &config.tables_dir {
        println!("Wrote {} tables to {}", report.tables.len(), dir.display());
    }
    println!(
        "{} observations over {} ages in {:.2}s",
        report.observations, report.ages_aggregated, report.elapsed_secs
    );

    Ok(())
}
