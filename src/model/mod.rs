//! Life-cycle consumption / portfolio model
//!
//! `PortfolioConsumer` is configured from a `Calibration`, solved once by
//! backward induction, then used to simulate a population of agents.

mod interp;
mod solution;
mod solver;
pub mod shocks;

pub use interp::{Extrapolation, LinearInterp};
pub use solution::{PeriodSolution, Solution};
pub use solver::{asset_grid, Solver};

use log::info;
use std::time::Instant;

use crate::calibration::Calibration;
use crate::error::{PortfolioError, Result};
use crate::simulation::{SimulatedPanel, SimulationConfig, Simulator};

/// A consumer type: calibration plus (once solved) its policy functions
#[derive(Debug, Clone)]
pub struct PortfolioConsumer {
    calibration: Calibration,
    solution: Option<Solution>,
}

impl PortfolioConsumer {
    /// Create a consumer; rejects inconsistent calibrations
    pub fn new(calibration: Calibration) -> Result<Self> {
        calibration.validate()?;
        Ok(Self {
            calibration,
            solution: None,
        })
    }

    pub fn calibration(&self) -> &Calibration {
        &self.calibration
    }

    /// Solved policy functions, if `solve` has run
    pub fn solution(&self) -> Option<&Solution> {
        self.solution.as_ref()
    }

    /// Solve the life-cycle problem by backward induction
    pub fn solve(&mut self) -> &Solution {
        let start = Instant::now();
        let solution = Solver::new(&self.calibration).solve();
        info!(
            "Solved {} periods (ages {}-{}) in {:?}",
            solution.len(),
            self.calibration.ages.age_born,
            self.calibration.ages.age_death - 1,
            start.elapsed()
        );
        self.solution.insert(solution)
    }

    /// Simulate a population using the solved policy functions
    pub fn simulate(&self, config: &SimulationConfig) -> Result<SimulatedPanel> {
        let solution = self.solution.as_ref().ok_or(PortfolioError::Unsolved)?;
        Simulator::new(&self.calibration, solution, config).run()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simulate_requires_solution() {
        let consumer = PortfolioConsumer::new(Calibration::cgm_baseline()).unwrap();
        let err = consumer.simulate(&SimulationConfig::default()).unwrap_err();
        assert!(matches!(err, PortfolioError::Unsolved));
    }

    #[test]
    fn test_invalid_calibration_is_rejected() {
        let mut cal = Calibration::cgm_baseline();
        cal.model.crra = -1.0;
        assert!(matches!(
            PortfolioConsumer::new(cal),
            Err(PortfolioError::InvalidCalibration(_))
        ));
    }
}
