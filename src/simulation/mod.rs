//! Monte Carlo simulation of a consumer population
//!
//! Agents follow the solved policy functions, face drawn income and return
//! shocks, and die according to the survival schedule. A dead agent is
//! replaced by a newborn in the next period, so the population size is
//! constant and the panel is rectangular (periods x agents).

mod panel;
mod simulator;

pub use panel::SimulatedPanel;
pub use simulator::Simulator;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Variables that can be recorded each period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TrackedVar {
    /// Normalized end-of-period assets
    ANrm,
    /// Normalized consumption
    CNrm,
    /// Permanent income level
    PLvl,
    /// Periods lived, 1 in the birth period
    TAge,
    /// Risky portfolio share
    RiskyShare,
    /// Normalized market resources
    MNrm,
}

impl TrackedVar {
    pub const ALL: [TrackedVar; 6] = [
        TrackedVar::ANrm,
        TrackedVar::CNrm,
        TrackedVar::PLvl,
        TrackedVar::TAge,
        TrackedVar::RiskyShare,
        TrackedVar::MNrm,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            TrackedVar::ANrm => "aNrm",
            TrackedVar::CNrm => "cNrm",
            TrackedVar::PLvl => "pLvl",
            TrackedVar::TAge => "t_age",
            TrackedVar::RiskyShare => "RiskyShare",
            TrackedVar::MNrm => "mNrm",
        }
    }
}

impl fmt::Display for TrackedVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Population size, horizon and recorded variables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Number of agents alive in every period
    pub agent_count: usize,
    /// Simulated periods as a multiple of one life cycle
    pub cycles: usize,
    pub track_vars: Vec<TrackedVar>,
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            agent_count: 50,
            cycles: 50,
            track_vars: TrackedVar::ALL.to_vec(),
            seed: 0,
        }
    }
}

impl SimulationConfig {
    /// Number of simulated periods for a life cycle of `t_cycle` periods
    pub fn t_sim(&self, t_cycle: usize) -> usize {
        t_cycle * self.cycles
    }
}
