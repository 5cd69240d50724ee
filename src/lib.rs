//! Life-cycle portfolio choice - solve, simulate and summarise a CGM-style consumer
//!
//! This library provides:
//! - Calibration of ages, preferences, returns, income and survival
//! - A finite-horizon consumption / risky-share solver (endogenous grid method)
//! - Monte Carlo simulation of an agent population with death and replacement
//! - Age-indexed aggregation (means and percentiles) of the simulated panel
//! - Chart rendering to PNG, JPG, PDF and SVG

pub mod error;
pub mod calibration;
pub mod model;
pub mod simulation;
pub mod aggregation;
pub mod heuristic;
pub mod plotting;
pub mod pipeline;

// Re-export commonly used types
pub use error::{PortfolioError, Result};
pub use calibration::{Calibration, LifecycleAges, ModelParams};
pub use model::{PortfolioConsumer, Solution};
pub use simulation::{SimulatedPanel, SimulationConfig, TrackedVar};
pub use aggregation::{AgeSummary, AgeTable, DerivedTable};
pub use heuristic::hundred_minus_age_rule;
pub use pipeline::{OutputLocation, RunConfig, RunReport};
