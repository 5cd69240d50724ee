//! Policy functions produced by the solver

use super::interp::{Extrapolation, LinearInterp};

/// Consumption and risky-share policy for one age
#[derive(Debug, Clone)]
pub struct PeriodSolution {
    /// Age the policy applies to
    pub age: u32,
    /// Normalized consumption as a function of normalized market resources
    pub c_func: LinearInterp,
    /// Risky portfolio share as a function of normalized market resources
    pub share_func: LinearInterp,
}

impl PeriodSolution {
    /// Last period of life: consume everything, hold nothing
    pub fn terminal(age: u32) -> Self {
        Self {
            age,
            c_func: LinearInterp::new(vec![0.0, 1.0], vec![0.0, 1.0], Extrapolation::Linear),
            share_func: LinearInterp::constant(0.0),
        }
    }

    pub fn consumption(&self, m_nrm: f64) -> f64 {
        self.c_func.eval(m_nrm)
    }

    pub fn risky_share(&self, m_nrm: f64) -> f64 {
        self.share_func.eval(m_nrm)
    }
}

/// Full life-cycle solution, one entry per model period (index 0 = age born)
#[derive(Debug, Clone)]
pub struct Solution {
    periods: Vec<PeriodSolution>,
}

impl Solution {
    pub fn new(periods: Vec<PeriodSolution>) -> Self {
        Self { periods }
    }

    pub fn len(&self) -> usize {
        self.periods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    /// Policy for model period `t`
    pub fn period(&self, t: usize) -> &PeriodSolution {
        &self.periods[t]
    }

    pub fn periods(&self) -> &[PeriodSolution] {
        &self.periods
    }
}
