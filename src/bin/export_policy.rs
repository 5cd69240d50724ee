//! Solve the model and export the policy functions
//!
//! Writes consumption and risky share on a grid of normalized market
//! resources for every age, one CSV row per (age, m) point.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;

use lifecycle_portfolio::{Calibration, PortfolioConsumer};

#[derive(Parser, Debug)]
#[command(name = "export_policy")]
#[command(about = "Export solved consumption and risky-share functions to CSV")]
struct Args {
    /// JSON calibration file; missing fields keep their defaults
    #[arg(long)]
    calibration: Option<PathBuf>,

    /// Output CSV path
    #[arg(short, long, default_value = "policy_functions.csv")]
    output: PathBuf,

    /// Largest normalized market resources on the export grid
    #[arg(long, default_value = "20.0")]
    m_max: f64,

    /// Points on the export grid
    #[arg(long, default_value = "100")]
    m_count: usize,
}

#[derive(Debug, Serialize)]
struct PolicyRow {
    #[serde(rename = "Age")]
    age: u32,
    #[serde(rename = "mNrm")]
    m_nrm: f64,
    #[serde(rename = "cNrm")]
    c_nrm: f64,
    #[serde(rename = "RiskyShare")]
    risky_share: f64,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    anyhow::ensure!(args.m_count >= 2, "--m-count must be at least 2");
    anyhow::ensure!(args.m_max > 0.0, "--m-max must be positive");

    let calibration = match &args.calibration {
        Some(path) => Calibration::from_json_path(path)
            .with_context(|| format!("Failed to load calibration from {}", path.display()))?,
        None => Calibration::cgm_baseline(),
    };

    let start = Instant::now();
    let mut consumer = PortfolioConsumer::new(calibration).context("Invalid calibration")?;
    let solution = consumer.solve();
    println!("Solved {} periods in {:?}", solution.len(), start.elapsed());

    let step = args.m_max / (args.m_count - 1) as f64;
    let m_grid: Vec<f64> = (0..args.m_count).map(|i| i as f64 * step).collect();

    let mut writer = csv::Writer::from_path(&args.output)
        .with_context(|| format!("Failed to create {}", args.output.display()))?;
    let mut rows = 0usize;
    for period in solution.periods() {
        for &m in &m_grid {
            writer.serialize(PolicyRow {
                age: period.age,
                m_nrm: m,
                c_nrm: period.consumption(m),
                risky_share: period.risky_share(m),
            })?;
            rows += 1;
        }
    }
    writer.flush()?;

    println!("Wrote {} rows to {}", rows, args.output.display());
    Ok(())
}
