//! Simulated panel storage

use std::collections::BTreeMap;

use super::TrackedVar;
use crate::error::{PortfolioError, Result};

/// Recorded histories, flattened period-major: the value of agent `i` in
/// period `k` sits at index `k * agent_count + i`
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedPanel {
    agent_count: usize,
    periods: usize,
    histories: BTreeMap<TrackedVar, Vec<f64>>,
}

impl SimulatedPanel {
    pub fn new(agent_count: usize, periods: usize) -> Self {
        Self {
            agent_count,
            periods,
            histories: BTreeMap::new(),
        }
    }

    pub fn agent_count(&self) -> usize {
        self.agent_count
    }

    pub fn periods(&self) -> usize {
        self.periods
    }

    /// Observations per tracked variable
    pub fn len(&self) -> usize {
        self.agent_count * self.periods
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Store a flattened history
    pub fn insert(&mut self, var: TrackedVar, values: Vec<f64>) -> Result<()> {
        if values.len() != self.len() {
            return Err(PortfolioError::ColumnLength {
                column: var.name(),
                expected: self.len(),
                found: values.len(),
            });
        }
        self.histories.insert(var, values);
        Ok(())
    }

    pub fn tracked(&self) -> impl Iterator<Item = TrackedVar> + '_ {
        self.histories.keys().copied()
    }

    /// Flattened history of a variable, if it was tracked
    pub fn history(&self, var: TrackedVar) -> Option<&[f64]> {
        self.histories.get(&var).map(Vec::as_slice)
    }

    /// Flattened history of a variable that must have been tracked
    pub fn require(&self, var: TrackedVar) -> Result<&[f64]> {
        self.history(var)
            .ok_or(PortfolioError::MissingTrackedVariable(var))
    }

    /// Value of one agent in one period
    pub fn value(&self, var: TrackedVar, period: usize, agent: usize) -> Option<f64> {
        if agent >= self.agent_count {
            return None;
        }
        self.history(var)?.get(period * self.agent_count + agent).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_major_layout() {
        let mut panel = SimulatedPanel::new(2, 3);
        panel
            .insert(TrackedVar::MNrm, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0])
            .unwrap();

        assert_eq!(panel.len(), 6);
        assert_eq!(panel.value(TrackedVar::MNrm, 0, 1), Some(2.0));
        assert_eq!(panel.value(TrackedVar::MNrm, 2, 0), Some(5.0));
        assert_eq!(panel.value(TrackedVar::MNrm, 0, 2), None);
        assert_eq!(panel.value(TrackedVar::CNrm, 0, 0), None);
    }

    #[test]
    fn test_rejects_wrong_length() {
        let mut panel = SimulatedPanel::new(2, 3);
        let err = panel.insert(TrackedVar::PLvl, vec![1.0; 5]).unwrap_err();
        assert!(matches!(
            err,
            PortfolioError::ColumnLength { expected: 6, found: 5, .. }
        ));
    }

    #[test]
    fn test_require_missing_variable() {
        let panel = SimulatedPanel::new(1, 1);
        assert!(matches!(
            panel.require(TrackedVar::RiskyShare),
            Err(PortfolioError::MissingTrackedVariable(TrackedVar::RiskyShare))
        ));
    }
}
