//! Backward induction for the consumption / portfolio problem
//!
//! Each non-terminal period is solved with the endogenous grid method on a
//! fixed grid of end-of-period assets `a`:
//! 1. the risky share solves E[(G psi)^-rho (R - Rf) c'(m')^-rho] = 0,
//!    with corner solutions when the sign does not change on [0, 1];
//! 2. consumption inverts the Euler equation at that share;
//! 3. market resources follow as m = a + c.
//!
//! Grid points are independent, so a period is solved in parallel.

use log::debug;
use rayon::prelude::*;

use super::interp::{Extrapolation, LinearInterp};
use super::shocks::{DiscreteDistribution, IncomeShocks, ShockNode};
use super::solution::{PeriodSolution, Solution};
use crate::calibration::Calibration;

const SHARE_TOLERANCE: f64 = 1e-10;
const SHARE_MAX_ITERATIONS: usize = 100;

/// Exponentially spaced asset grid: uniform in log(1 + a)
pub fn asset_grid(a_min: f64, a_max: f64, count: usize) -> Vec<f64> {
    let lo = a_min.ln_1p();
    let hi = a_max.ln_1p();
    let step = (hi - lo) / (count - 1) as f64;
    (0..count)
        .map(|i| {
            if i + 1 == count {
                a_max
            } else {
                (lo + step * i as f64).exp_m1()
            }
        })
        .collect()
}

/// Precomputed inputs shared by every period
pub struct Solver {
    crra: f64,
    disc_fac: f64,
    rfree: f64,
    a_grid: Vec<f64>,
    liv_prb: Vec<f64>,
    perm_gro_fac: Vec<f64>,
    /// Joint shock nodes faced on arrival in each period (index 0 unused)
    arrival_shocks: Vec<Vec<ShockNode>>,
    ages: Vec<u32>,
}

impl Solver {
    pub fn new(calibration: &Calibration) -> Self {
        let m = &calibration.model;
        let periods = calibration.ages.periods();

        let risky = DiscreteDistribution::lognormal_from_moments(m.risky_avg, m.risky_std, m.risky_count);
        let working = IncomeShocks::working(m.perm_shk_std, m.perm_shk_count, m.tran_shk_std, m.tran_shk_count)
            .joint_with(&risky);
        let retired = IncomeShocks::retired().joint_with(&risky);

        let arrival_shocks = (0..periods)
            .map(|t| {
                if calibration.ages.is_working(t) {
                    working.clone()
                } else {
                    retired.clone()
                }
            })
            .collect();

        Self {
            crra: m.crra,
            disc_fac: m.disc_fac,
            rfree: m.rfree,
            a_grid: asset_grid(m.a_min, m.a_max, m.a_count),
            liv_prb: calibration.liv_prb(),
            perm_gro_fac: calibration.perm_gro_fac(),
            arrival_shocks,
            ages: (0..periods).map(|t| calibration.ages.age_at(t)).collect(),
        }
    }

    /// Solve every period from the last age backwards
    pub fn solve(&self) -> Solution {
        let periods = self.ages.len();
        let mut solved: Vec<PeriodSolution> = Vec::with_capacity(periods);
        let mut next = PeriodSolution::terminal(self.ages[periods - 1]);

        for t in (0..periods - 1).rev() {
            let period = self.solve_period(t, &next);
            debug!(
                "Solved age {}: c(1) = {:.4}, share(1) = {:.4}",
                period.age,
                period.consumption(1.0),
                period.risky_share(1.0)
            );
            solved.push(std::mem::replace(&mut next, period));
        }
        solved.push(next);

        solved.reverse();
        Solution::new(solved)
    }

    /// Solve period `t` given the policy of period `t + 1`
    fn solve_period(&self, t: usize, next: &PeriodSolution) -> PeriodSolution {
        let age = self.ages[t];
        let beta_liv = self.disc_fac * self.liv_prb[t];
        if beta_liv <= 0.0 {
            return PeriodSolution::terminal(age);
        }

        let ctx = PeriodContext {
            crra: self.crra,
            rfree: self.rfree,
            gro: self.perm_gro_fac[t],
            nodes: &self.arrival_shocks[t + 1],
            next,
        };

        let points: Vec<(f64, f64)> = self
            .a_grid
            .par_iter()
            .map(|&a| {
                let share = ctx.optimal_share(a);
                let dvda = beta_liv * ctx.expected_marginal_value(a, share);
                (share, dvda.powf(-1.0 / self.crra))
            })
            .collect();

        let mut m_grid = Vec::with_capacity(points.len() + 1);
        let mut c_grid = Vec::with_capacity(points.len() + 1);
        let mut share_grid = Vec::with_capacity(points.len());
        m_grid.push(0.0);
        c_grid.push(0.0);
        for (&a, &(share, c)) in self.a_grid.iter().zip(&points) {
            m_grid.push(a + c);
            c_grid.push(c);
            share_grid.push(share);
        }

        let share_func = LinearInterp::new(m_grid[1..].to_vec(), share_grid, Extrapolation::Flat);
        PeriodSolution {
            age,
            c_func: LinearInterp::new(m_grid, c_grid, Extrapolation::Linear),
            share_func,
        }
    }
}

/// Everything needed to evaluate expectations over next period's shocks
struct PeriodContext<'a> {
    crra: f64,
    rfree: f64,
    gro: f64,
    nodes: &'a [ShockNode],
    next: &'a PeriodSolution,
}

impl PeriodContext<'_> {
    /// Next-period marginal utility at each node, weighted by probability
    /// and the growth-adjusted discounting term (G psi)^-rho
    fn weighted_marginal_utility(&self, node: &ShockNode, a: f64, share: f64) -> (f64, f64) {
        let growth = self.gro * node.perm;
        let r_port = self.rfree + share * (node.risky - self.rfree);
        let m_next = r_port * a / growth + node.tran;
        let c_next = self.next.consumption(m_next);
        let weight = node.prob * growth.powf(-self.crra) * c_next.powf(-self.crra);
        (weight, r_port)
    }

    /// Derivative of expected value with respect to the share, up to a positive factor
    fn share_foc(&self, a: f64, share: f64) -> f64 {
        self.nodes
            .iter()
            .map(|node| {
                let (weight, _) = self.weighted_marginal_utility(node, a, share);
                weight * (node.risky - self.rfree)
            })
            .sum()
    }

    /// E[(G psi)^-rho R_port c'(m')^-rho]
    fn expected_marginal_value(&self, a: f64, share: f64) -> f64 {
        self.nodes
            .iter()
            .map(|node| {
                let (weight, r_port) = self.weighted_marginal_utility(node, a, share);
                weight * r_port
            })
            .sum()
    }

    fn optimal_share(&self, a: f64) -> f64 {
        if self.share_foc(a, 1.0) >= 0.0 {
            return 1.0;
        }
        if self.share_foc(a, 0.0) <= 0.0 {
            return 0.0;
        }

        let mut lo = 0.0;
        let mut hi = 1.0;
        for _ in 0..SHARE_MAX_ITERATIONS {
            let mid = 0.5 * (lo + hi);
            if self.share_foc(a, mid) > 0.0 {
                lo = mid;
            } else {
                hi = mid;
            }
            if hi - lo < SHARE_TOLERANCE {
                break;
            }
        }
        0.5 * (lo + hi)
    }
}
