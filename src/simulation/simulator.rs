//! Per-agent simulation driven by the solved policy functions
//!
//! Each agent draws from its own ChaCha stream (seed, stream = agent index),
//! so agents are simulated in parallel and the panel is identical for a given
//! seed regardless of thread scheduling.

use log::info;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, LogNormal};
use rayon::prelude::*;
use std::time::Instant;

use super::{SimulatedPanel, SimulationConfig, TrackedVar};
use crate::calibration::Calibration;
use crate::error::{PortfolioError, Result};
use crate::model::shocks::{lognormal_params, IncomeShocks};
use crate::model::Solution;

/// State carried from one period to the next by a surviving agent
#[derive(Debug, Clone, Copy)]
struct AgentState {
    /// Model period (0 = age born)
    t: usize,
    p_lvl: f64,
    a_nrm: f64,
    share: f64,
}

/// One agent's recorded values, one entry per simulated period
#[derive(Debug, Default)]
struct AgentHistory {
    t_age: Vec<f64>,
    m_nrm: Vec<f64>,
    c_nrm: Vec<f64>,
    a_nrm: Vec<f64>,
    p_lvl: Vec<f64>,
    share: Vec<f64>,
}

impl AgentHistory {
    fn with_capacity(n: usize) -> Self {
        Self {
            t_age: Vec::with_capacity(n),
            m_nrm: Vec::with_capacity(n),
            c_nrm: Vec::with_capacity(n),
            a_nrm: Vec::with_capacity(n),
            p_lvl: Vec::with_capacity(n),
            share: Vec::with_capacity(n),
        }
    }

    fn column(&self, var: TrackedVar) -> &[f64] {
        match var {
            TrackedVar::ANrm => &self.a_nrm,
            TrackedVar::CNrm => &self.c_nrm,
            TrackedVar::PLvl => &self.p_lvl,
            TrackedVar::TAge => &self.t_age,
            TrackedVar::RiskyShare => &self.share,
            TrackedVar::MNrm => &self.m_nrm,
        }
    }
}

/// Simulates a population from a solved model
pub struct Simulator<'a> {
    calibration: &'a Calibration,
    solution: &'a Solution,
    config: &'a SimulationConfig,
}

impl<'a> Simulator<'a> {
    pub fn new(calibration: &'a Calibration, solution: &'a Solution, config: &'a SimulationConfig) -> Self {
        Self {
            calibration,
            solution,
            config,
        }
    }

    /// Run the simulation and collect the tracked variables
    pub fn run(&self) -> Result<SimulatedPanel> {
        let start = Instant::now();
        let t_cycle = self.calibration.ages.periods();
        let t_sim = self.config.t_sim(t_cycle);
        let agents = self.config.agent_count;

        info!("Simulating {} agents over {} periods", agents, t_sim);

        let draws = ShockDraws::new(self.calibration)?;
        let histories: Vec<AgentHistory> = (0..agents)
            .into_par_iter()
            .map(|agent| self.simulate_agent(agent, t_sim, &draws))
            .collect();

        let mut panel = SimulatedPanel::new(agents, t_sim);
        for &var in &self.config.track_vars {
            let mut values = Vec::with_capacity(agents * t_sim);
            for k in 0..t_sim {
                values.extend(histories.iter().map(|h| h.column(var)[k]));
            }
            panel.insert(var, values)?;
        }

        info!("Simulation complete in {:?}", start.elapsed());
        Ok(panel)
    }

    fn simulate_agent(&self, agent: usize, t_sim: usize, draws: &ShockDraws) -> AgentHistory {
        let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed);
        rng.set_stream(agent as u64);

        let liv_prb = &draws.liv_prb;
        let mut history = AgentHistory::with_capacity(t_sim);
        let mut alive: Option<AgentState> = None;

        for _ in 0..t_sim {
            let (t, p_lvl, m_nrm) = match alive {
                None => {
                    // Newborn: initial assets plus first-period income
                    let p_lvl = draws.p_lvl_init.sample(&mut rng);
                    let tran = draws.income_for(0).tran_draw(&mut rng);
                    (0, p_lvl, self.calibration.model.a_nrm_init + tran)
                }
                Some(state) => {
                    let t = state.t + 1;
                    let shocks = draws.income_for(t);
                    let perm = shocks.perm_draw(&mut rng);
                    let tran = shocks.tran_draw(&mut rng);
                    let risky = draws.risky.sample(&mut rng);

                    let growth = draws.perm_gro_fac[state.t] * perm;
                    let rfree = self.calibration.model.rfree;
                    let r_port = rfree + state.share * (risky - rfree);
                    (t, state.p_lvl * growth, r_port * state.a_nrm / growth + tran)
                }
            };

            let policy = self.solution.period(t);
            let c_nrm = policy.consumption(m_nrm).min(m_nrm);
            let share = policy.risky_share(m_nrm);
            let a_nrm = (m_nrm - c_nrm).max(0.0);

            history.t_age.push((t + 1) as f64);
            history.m_nrm.push(m_nrm);
            history.c_nrm.push(c_nrm);
            history.a_nrm.push(a_nrm);
            history.p_lvl.push(p_lvl);
            history.share.push(share);

            let survives = rng.gen::<f64>() < liv_prb[t];
            alive = survives.then_some(AgentState {
                t,
                p_lvl,
                a_nrm,
                share,
            });
        }

        history
    }
}

/// Shock distributions used while simulating
struct ShockDraws {
    working: DiscreteIncome,
    retired: DiscreteIncome,
    is_working: Vec<bool>,
    risky: LogNormal<f64>,
    p_lvl_init: LogNormal<f64>,
    liv_prb: Vec<f64>,
    perm_gro_fac: Vec<f64>,
}

impl ShockDraws {
    fn new(calibration: &Calibration) -> Result<Self> {
        let m = &calibration.model;
        let (risky_mu, risky_sigma) = lognormal_params(m.risky_avg, m.risky_std);
        let risky = LogNormal::new(risky_mu, risky_sigma)
            .map_err(|e| PortfolioError::InvalidCalibration(format!("risky return: {e}")))?;

        let p_init_mu = calibration.p_lvl_init().ln() - 0.5 * m.p_lvl_init_std.powi(2);
        let p_lvl_init = LogNormal::new(p_init_mu, m.p_lvl_init_std)
            .map_err(|e| PortfolioError::InvalidCalibration(format!("initial income: {e}")))?;

        let periods = calibration.ages.periods();
        Ok(Self {
            working: DiscreteIncome(IncomeShocks::working(
                m.perm_shk_std,
                m.perm_shk_count,
                m.tran_shk_std,
                m.tran_shk_count,
            )),
            retired: DiscreteIncome(IncomeShocks::retired()),
            is_working: (0..periods).map(|t| calibration.ages.is_working(t)).collect(),
            risky,
            p_lvl_init,
            liv_prb: calibration.liv_prb(),
            perm_gro_fac: calibration.perm_gro_fac(),
        })
    }

    fn income_for(&self, t: usize) -> &DiscreteIncome {
        if self.is_working[t] {
            &self.working
        } else {
            &self.retired
        }
    }
}

/// Income shocks are drawn from the same discrete nodes the solver integrates over
struct DiscreteIncome(IncomeShocks);

impl DiscreteIncome {
    fn perm_draw<R: Rng>(&self, rng: &mut R) -> f64 {
        let dist = &self.0.perm;
        dist.values[dist.draw_index(rng.gen())]
    }

    fn tran_draw<R: Rng>(&self, rng: &mut R) -> f64 {
        let dist = &self.0.tran;
        dist.values[dist.draw_index(rng.gen())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::LifecycleAges;
    use crate::model::PortfolioConsumer;

    fn small_consumer() -> PortfolioConsumer {
        let mut cal = Calibration::cgm_baseline();
        cal.ages = LifecycleAges {
            age_born: 20,
            age_retire: 30,
            age_death: 40,
        };
        cal.model.a_count = 30;
        let mut consumer = PortfolioConsumer::new(cal).unwrap();
        consumer.solve();
        consumer
    }

    fn small_config(seed: u64) -> SimulationConfig {
        SimulationConfig {
            agent_count: 12,
            cycles: 3,
            seed,
            ..SimulationConfig::default()
        }
    }

    #[test]
    fn test_panel_shape() {
        let consumer = small_consumer();
        let panel = consumer.simulate(&small_config(7)).unwrap();
        assert_eq!(panel.agent_count(), 12);
        assert_eq!(panel.periods(), 60);
        assert_eq!(panel.tracked().count(), 6);
        for var in TrackedVar::ALL {
            assert_eq!(panel.require(var).unwrap().len(), 720);
        }
    }

    #[test]
    fn test_same_seed_same_panel() {
        let consumer = small_consumer();
        let a = consumer.simulate(&small_config(42)).unwrap();
        let b = consumer.simulate(&small_config(42)).unwrap();
        assert_eq!(a, b);

        let c = consumer.simulate(&small_config(43)).unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn test_everybody_starts_newborn_and_dies_by_death_age() {
        let consumer = small_consumer();
        let panel = consumer.simulate(&small_config(1)).unwrap();
        let t_age = panel.require(TrackedVar::TAge).unwrap();

        // First period is the birth period for every agent
        assert!(t_age[..12].iter().all(|&t| t == 1.0));
        // Nobody outlives the last model period
        assert!(t_age.iter().all(|&t| (1.0..=20.0).contains(&t)));

        // Ages advance by one or restart at birth
        for agent in 0..12 {
            for k in 1..60 {
                let prev = panel.value(TrackedVar::TAge, k - 1, agent).unwrap();
                let now = panel.value(TrackedVar::TAge, k, agent).unwrap();
                assert!(now == prev + 1.0 || now == 1.0);
            }
        }
    }

    #[test]
    fn test_budget_identity_holds() {
        let consumer = small_consumer();
        let panel = consumer.simulate(&small_config(3)).unwrap();
        let m = panel.require(TrackedVar::MNrm).unwrap();
        let c = panel.require(TrackedVar::CNrm).unwrap();
        let a = panel.require(TrackedVar::ANrm).unwrap();
        let s = panel.require(TrackedVar::RiskyShare).unwrap();

        for i in 0..panel.len() {
            assert!(c[i] > 0.0 && c[i] <= m[i]);
            assert!((m[i] - c[i] - a[i]).abs() < 1e-9);
            assert!((0.0..=1.0).contains(&s[i]));
        }
    }

    #[test]
    fn test_partial_tracking() {
        let consumer = small_consumer();
        let config = SimulationConfig {
            track_vars: vec![TrackedVar::TAge, TrackedVar::MNrm],
            ..small_config(5)
        };
        let panel = consumer.simulate(&config).unwrap();
        assert_eq!(panel.tracked().collect::<Vec<_>>(), vec![TrackedVar::TAge, TrackedVar::MNrm]);
        assert!(panel.history(TrackedVar::PLvl).is_none());
    }
}
