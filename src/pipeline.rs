//! End-to-end run: calibrate, solve, simulate, aggregate by age, plot
//!
//! The stages run strictly in sequence; every failure aborts the run.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::{DateTime, Utc};
use log::info;
use serde::Serialize;

use crate::aggregation::{AgeSummary, DerivedTable};
use crate::calibration::{Calibration, LifecycleAges};
use crate::error::Result;
use crate::heuristic::hundred_minus_age_rule;
use crate::model::PortfolioConsumer;
use crate::plotting::render_all;
use crate::simulation::SimulationConfig;

const FIGURES_DIR: &str = "Figures";
const TABLES_DIR: &str = "Tables";
const SUMMARY_FILE: &str = "run_summary.json";

/// Where output directories resolve when not given explicitly
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputLocation {
    /// Invoked on its own: outputs live next to this crate
    Standalone,
    /// Invoked by a caller that supplies a project root
    Root(PathBuf),
}

impl OutputLocation {
    pub fn root(&self) -> PathBuf {
        match self {
            OutputLocation::Standalone => PathBuf::from(env!("CARGO_MANIFEST_DIR")),
            OutputLocation::Root(root) => root.clone(),
        }
    }

    pub fn figures_dir(&self) -> PathBuf {
        self.root().join(FIGURES_DIR)
    }

    pub fn tables_dir(&self) -> PathBuf {
        self.root().join(TABLES_DIR)
    }
}

/// Everything a run needs
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub calibration: Calibration,
    pub simulation: SimulationConfig,
    pub figures_dir: PathBuf,
    /// `None` skips the CSV tables and the JSON summary
    pub tables_dir: Option<PathBuf>,
}

impl RunConfig {
    /// Baseline calibration and simulation with directories from `location`
    pub fn new(location: &OutputLocation) -> Self {
        Self {
            calibration: Calibration::cgm_baseline(),
            simulation: SimulationConfig::default(),
            figures_dir: location.figures_dir(),
            tables_dir: Some(location.tables_dir()),
        }
    }
}

/// What a run produced; serialized as `run_summary.json`
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub generated_at: DateTime<Utc>,
    pub ages: LifecycleAges,
    pub seed: u64,
    pub agent_count: usize,
    pub simulated_periods: usize,
    pub observations: usize,
    pub ages_aggregated: usize,
    pub figures: Vec<PathBuf>,
    pub tables: Vec<PathBuf>,
    pub elapsed_secs: f64,
}

impl RunReport {
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let file = fs::File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }
}

/// Solve, simulate and aggregate; returns the age tables and the number of
/// panel observations they were computed from
pub fn simulate_summary(
    calibration: &Calibration,
    simulation: &SimulationConfig,
) -> Result<(AgeSummary, usize)> {
    let mut consumer = PortfolioConsumer::new(calibration.clone())?;
    consumer.solve();

    let panel = consumer.simulate(simulation)?;
    info!(
        "Simulated {} agents over {} periods",
        panel.agent_count(),
        panel.periods()
    );

    let data = DerivedTable::from_panel(&panel, calibration.ages.age_born)?;
    let summary = AgeSummary::from_table(&data);
    info!(
        "Aggregated {} observations into {} ages",
        data.len(),
        summary.means.len()
    );
    Ok((summary, data.len()))
}

/// Write the mean and percentile tables as CSV into `dir`
pub fn write_tables(summary: &AgeSummary, dir: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;
    summary
        .tables()
        .iter()
        .map(|table| -> Result<PathBuf> {
            let path = dir.join(format!("{}.csv", table.statistic().file_stem()));
            table.write_csv(&path)?;
            Ok(path)
        })
        .collect()
}

/// Run the whole pipeline
pub fn run(config: &RunConfig) -> Result<RunReport> {
    let start = Instant::now();
    let ages = config.calibration.ages;
    info!(
        "Starting run: ages {}/{}/{}, {} agents, {} cycles, seed {}",
        ages.age_born,
        ages.age_retire,
        ages.age_death,
        config.simulation.agent_count,
        config.simulation.cycles,
        config.simulation.seed
    );

    let (summary, observations) = simulate_summary(&config.calibration, &config.simulation)?;

    let rule = hundred_minus_age_rule(&ages);
    let figures = render_all(&summary, &rule, &config.figures_dir)?;

    let tables = match &config.tables_dir {
        Some(dir) => write_tables(&summary, dir)?,
        None => Vec::new(),
    };

    let report = RunReport {
        generated_at: Utc::now(),
        ages,
        seed: config.simulation.seed,
        agent_count: config.simulation.agent_count,
        simulated_periods: config.simulation.t_sim(ages.periods()),
        observations,
        ages_aggregated: summary.means.len(),
        figures,
        tables,
        elapsed_secs: start.elapsed().as_secs_f64(),
    };

    if let Some(dir) = &config.tables_dir {
        let path = dir.join(SUMMARY_FILE);
        report.write_json(&path)?;
        info!("Run summary written to {}", path.display());
    }

    info!("Run complete in {:.2}s", report.elapsed_secs);
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plotting::fonts_available;

    fn small_calibration() -> Calibration {
        let mut cal = Calibration::cgm_baseline();
        cal.ages = LifecycleAges {
            age_born: 20,
            age_retire: 30,
            age_death: 40,
        };
        cal.model.a_count = 30;
        cal
    }

    fn small_simulation(seed: u64) -> SimulationConfig {
        SimulationConfig {
            agent_count: 10,
            cycles: 2,
            seed,
            ..SimulationConfig::default()
        }
    }

    #[test]
    fn test_output_locations() {
        let root = OutputLocation::Root(PathBuf::from("/tmp/project"));
        assert_eq!(root.figures_dir(), PathBuf::from("/tmp/project/Figures"));
        assert_eq!(root.tables_dir(), PathBuf::from("/tmp/project/Tables"));

        let standalone = OutputLocation::Standalone;
        assert!(standalone.figures_dir().ends_with("Figures"));
        assert_eq!(standalone.root(), PathBuf::from(env!("CARGO_MANIFEST_DIR")));
    }

    #[test]
    fn test_summary_is_deterministic() {
        let cal = small_calibration();
        let (first, n1) = simulate_summary(&cal, &small_simulation(3)).unwrap();
        let (second, n2) = simulate_summary(&cal, &small_simulation(3)).unwrap();
        assert_eq!(n1, 10 * 40);
        assert_eq!(n1, n2);
        assert_eq!(first, second);

        let ages = first.means.ages();
        assert!(ages.windows(2).all(|w| w[0] < w[1]));
        assert!(ages.iter().all(|a| (20..40).contains(a)));
    }

    #[test]
    fn test_write_tables() {
        let dir = tempfile::tempdir().unwrap();
        let (summary, _) = simulate_summary(&small_calibration(), &small_simulation(1)).unwrap();

        let paths = write_tables(&summary, &dir.path().join("Tables")).unwrap();
        let names: Vec<String> = paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["age_means.csv", "age_p05.csv", "age_p95.csv"]);

        let text = fs::read_to_string(&paths[0]).unwrap();
        assert_eq!(text.lines().count(), summary.means.len() + 1);
    }

    #[test]
    fn test_full_run_writes_figures_and_summary() {
        if !fonts_available() {
            eprintln!("skipping: no sans-serif font available");
            return;
        }

        let dir = tempfile::tempdir().unwrap();
        let location = OutputLocation::Root(dir.path().to_path_buf());
        let config = RunConfig {
            calibration: small_calibration(),
            simulation: small_simulation(5),
            ..RunConfig::new(&location)
        };

        let report = run(&config).unwrap();
        assert_eq!(report.figures.len(), 12);
        assert!(report.figures.iter().all(|p| p.starts_with(location.figures_dir())));
        assert_eq!(report.tables.len(), 3);
        assert_eq!(report.simulated_periods, 40);

        let json = fs::read_to_string(location.tables_dir().join("run_summary.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["seed"], 5);
        assert_eq!(value["agent_count"], 10);
    }

    #[test]
    fn test_run_without_tables() {
        if !fonts_available() {
            return;
        }

        let dir = tempfile::tempdir().unwrap();
        let config = RunConfig {
            calibration: small_calibration(),
            simulation: small_simulation(2),
            figures_dir: dir.path().join("figs"),
            tables_dir: None,
        };

        let report = run(&config).unwrap();
        assert!(report.tables.is_empty());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
