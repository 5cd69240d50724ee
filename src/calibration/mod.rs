//! Calibration: life-cycle ages, preferences, returns, income and survival
//!
//! Defaults reproduce the Cocco-Gomes-Maenhout baseline (high-school income
//! profile). A JSON file with the same shape overrides any subset of fields.

mod income;
mod survival;
pub mod loader;

pub use income::IncomeProfile;
pub use survival::{Sex, SurvivalTable};

use log::debug;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{PortfolioError, Result};

/// Named integer ages bounding the life cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleAges {
    pub age_born: u32,
    pub age_retire: u32,
    pub age_death: u32,
}

impl Default for LifecycleAges {
    fn default() -> Self {
        Self {
            age_born: 20,
            age_retire: 65,
            age_death: 100,
        }
    }
}

impl LifecycleAges {
    /// Number of model periods in one life (T_cycle)
    pub fn periods(&self) -> usize {
        self.age_death.saturating_sub(self.age_born) as usize
    }

    /// Age during model period `t` (0-indexed)
    pub fn age_at(&self, t: usize) -> u32 {
        self.age_born + t as u32
    }

    /// Whether period `t` is a working (pre-retirement) period
    pub fn is_working(&self, t: usize) -> bool {
        self.age_at(t) < self.age_retire
    }
}

/// Parameters consumed by the solver and simulator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelParams {
    /// Coefficient of relative risk aversion
    pub crra: f64,
    /// Intertemporal discount factor
    pub disc_fac: f64,
    /// Gross risk-free return
    pub rfree: f64,
    /// Arithmetic mean of the gross risky return
    pub risky_avg: f64,
    /// Standard deviation of the gross risky return
    pub risky_std: f64,
    /// Quadrature nodes for the risky return
    pub risky_count: usize,

    /// Log standard deviation of permanent income shocks while working
    pub perm_shk_std: f64,
    pub perm_shk_count: usize,
    /// Log standard deviation of transitory income shocks while working
    pub tran_shk_std: f64,
    pub tran_shk_count: usize,

    /// End-of-period asset grid (normalized by permanent income)
    pub a_min: f64,
    pub a_max: f64,
    pub a_count: usize,

    pub income: IncomeProfile,

    /// Sex column used from the mortality table
    pub sex: Sex,
    /// Multiplier applied to one-year death probabilities
    pub mortality_scale: f64,

    /// Normalized assets of a newborn agent
    pub a_nrm_init: f64,
    /// Log standard deviation of newborn permanent income around the profile
    pub p_lvl_init_std: f64,
}

impl Default for ModelParams {
    fn default() -> Self {
        Self {
            crra: 10.0,
            disc_fac: 0.96,
            rfree: 1.02,
            risky_avg: 1.06,
            risky_std: 0.157,
            risky_count: 5,
            perm_shk_std: 0.1029563,
            perm_shk_count: 3,
            tran_shk_std: 0.2716616,
            tran_shk_count: 3,
            a_min: 0.001,
            a_max: 100.0,
            a_count: 100,
            income: IncomeProfile::default(),
            sex: Sex::Male,
            mortality_scale: 1.0,
            a_nrm_init: 0.0,
            p_lvl_init_std: 0.0,
        }
    }
}

/// Complete calibration for one run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Calibration {
    pub ages: LifecycleAges,
    pub model: ModelParams,
    #[serde(skip)]
    pub survival: SurvivalTable,
}

impl Calibration {
    /// CGM baseline calibration
    pub fn cgm_baseline() -> Self {
        Self::default()
    }

    /// Load a calibration from a JSON file; absent fields keep their defaults
    pub fn from_json_path(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let calibration: Calibration = serde_json::from_reader(std::io::BufReader::new(file))?;
        debug!("Loaded calibration from {}", path.display());
        Ok(calibration)
    }

    /// Replace the survival table with one read from a CSV file
    pub fn with_survival_csv(mut self, path: &Path) -> Result<Self> {
        self.survival = SurvivalTable::from_csv_path(path)?;
        Ok(self)
    }

    /// Check parameter consistency before solving
    pub fn validate(&self) -> Result<()> {
        let ages = &self.ages;
        let m = &self.model;
        let invalid = |msg: String| Err(PortfolioError::InvalidCalibration(msg));

        if ages.age_born >= ages.age_retire || ages.age_retire >= ages.age_death {
            return invalid(format!(
                "ages must satisfy born < retire < death (got {}, {}, {})",
                ages.age_born, ages.age_retire, ages.age_death
            ));
        }
        if !(m.crra > 0.0) {
            return invalid(format!("CRRA must be positive (got {})", m.crra));
        }
        if !(m.disc_fac > 0.0 && m.disc_fac <= 1.0) {
            return invalid(format!("discount factor must lie in (0, 1] (got {})", m.disc_fac));
        }
        if !(m.rfree > 0.0) || !(m.risky_avg > 0.0) {
            return invalid("gross returns must be positive".to_string());
        }
        if m.risky_std < 0.0 || m.perm_shk_std < 0.0 || m.tran_shk_std < 0.0 || m.p_lvl_init_std < 0.0 {
            return invalid("standard deviations must be non-negative".to_string());
        }
        if m.risky_count == 0 || m.perm_shk_count == 0 || m.tran_shk_count == 0 {
            return invalid("quadrature node counts must be at least 1".to_string());
        }
        if !(m.a_min > 0.0) || !(m.a_max > m.a_min) || m.a_count < 2 {
            return invalid(format!(
                "asset grid needs 0 < a_min < a_max and at least 2 points (got {}..{} x {})",
                m.a_min, m.a_max, m.a_count
            ));
        }
        if !(m.income.replacement_rate > 0.0) {
            return invalid("retirement replacement rate must be positive".to_string());
        }
        if m.mortality_scale < 0.0 {
            return invalid("mortality scale must be non-negative".to_string());
        }
        if m.a_nrm_init < 0.0 {
            return invalid("initial assets must be non-negative".to_string());
        }
        Ok(())
    }

    /// Survival probability from period t to t+1, one entry per period.
    /// The last period always ends in death.
    pub fn liv_prb(&self) -> Vec<f64> {
        let periods = self.ages.periods();
        (0..periods)
            .map(|t| {
                if t + 1 == periods {
                    0.0
                } else {
                    self.survival.liv_prb(
                        self.ages.age_at(t),
                        self.model.sex,
                        self.model.mortality_scale,
                    )
                }
            })
            .collect()
    }

    /// Deterministic permanent income growth from period t to t+1.
    /// The entry for the last period is unused and set to 1.
    pub fn perm_gro_fac(&self) -> Vec<f64> {
        let periods = self.ages.periods();
        (0..periods)
            .map(|t| {
                if t + 1 == periods {
                    return 1.0;
                }
                let age = self.ages.age_at(t);
                let next = age + 1;
                if next < self.ages.age_retire {
                    self.model.income.level(next) / self.model.income.level(age)
                } else if next == self.ages.age_retire {
                    self.model.income.replacement_rate
                } else {
                    1.0
                }
            })
            .collect()
    }

    /// Mean permanent income level of a newborn
    pub fn p_lvl_init(&self) -> f64 {
        self.model.income.level(self.ages.age_born)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_default_ages() {
        let cal = Calibration::cgm_baseline();
        assert_eq!(cal.ages.periods(), 80);
        assert_eq!(cal.ages.age_at(0), 20);
        assert!(cal.ages.is_working(44));
        assert!(!cal.ages.is_working(45));
        assert!(cal.validate().is_ok());
    }

    #[test]
    fn test_growth_factors_switch_at_retirement() {
        let cal = Calibration::cgm_baseline();
        let gro = cal.perm_gro_fac();
        assert_eq!(gro.len(), 80);

        // Transition into age 65 applies the replacement rate
        assert_relative_eq!(gro[44], 0.68212);
        // Flat pension afterwards
        assert_relative_eq!(gro[50], 1.0);
        // Hump-shaped profile: growth early, decline before retirement
        assert!(gro[0] > 1.0);
        assert!(gro[43] < 1.0);
    }

    #[test]
    fn test_liv_prb_ends_in_death() {
        let cal = Calibration::cgm_baseline();
        let liv = cal.liv_prb();
        assert_eq!(liv.len(), 80);
        assert_eq!(*liv.last().unwrap(), 0.0);
        assert!(liv.iter().all(|p| (0.0..=1.0).contains(p)));
        assert!(liv[0] > liv[70]);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let json = r#"{ "ages": { "age_retire": 60 }, "model": { "crra": 5.0 } }"#;
        let cal: Calibration = serde_json::from_str(json).unwrap();
        assert_eq!(cal.ages.age_born, 20);
        assert_eq!(cal.ages.age_retire, 60);
        assert_eq!(cal.model.crra, 5.0);
        assert_eq!(cal.model.disc_fac, 0.96);
    }

    #[test]
    fn test_validate_rejects_bad_ages() {
        let mut cal = Calibration::cgm_baseline();
        cal.ages.age_retire = 110;
        assert!(matches!(cal.validate(), Err(PortfolioError::InvalidCalibration(_))));

        let mut cal = Calibration::cgm_baseline();
        cal.model.a_count = 1;
        assert!(cal.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_disc_fac() {
        for disc_fac in [0.0, -0.5, 1.5, f64::NAN] {
            let mut cal = Calibration::cgm_baseline();
            cal.model.disc_fac = disc_fac;
            assert!(
                matches!(cal.validate(), Err(PortfolioError::InvalidCalibration(_))),
                "disc_fac {} accepted",
                disc_fac
            );
        }

        let mut cal = Calibration::cgm_baseline();
        cal.model.disc_fac = 1.0;
        assert!(cal.validate().is_ok());
    }

    #[test]
    fn test_load_json_and_survival_files() {
        let dir = tempfile::tempdir().unwrap();
        let json_path = dir.path().join("calibration.json");
        std::fs::write(
            &json_path,
            r#"{ "ages": { "age_born": 60, "age_retire": 65, "age_death": 63 } }"#,
        )
        .unwrap();
        let cal = Calibration::from_json_path(&json_path).unwrap();
        assert_eq!(cal.ages.age_born, 60);
        assert_eq!(cal.model.crra, 10.0);
        assert!(cal.validate().is_err());

        std::fs::write(
            &json_path,
            r#"{ "ages": { "age_born": 60, "age_retire": 62, "age_death": 64 } }"#,
        )
        .unwrap();
        let csv_path = dir.path().join("mortality.csv");
        std::fs::write(
            &csv_path,
            "Age,Female,Male\n60,0.01,0.1\n61,0.02,0.2\n62,0.03,0.3\n63,0.04,0.4\n",
        )
        .unwrap();

        let cal = Calibration::from_json_path(&json_path)
            .unwrap()
            .with_survival_csv(&csv_path)
            .unwrap();
        assert!(cal.validate().is_ok());
        assert_eq!(cal.survival.max_age(), 63);

        let liv = cal.liv_prb();
        assert_eq!(liv.len(), 4);
        assert_relative_eq!(liv[0], 0.9);
        assert_relative_eq!(liv[2], 0.7);
        assert_eq!(liv[3], 0.0);

        let missing = dir.path().join("absent.csv");
        assert!(matches!(
            Calibration::cgm_baseline().with_survival_csv(&missing),
            Err(PortfolioError::Io(_))
        ));
    }
}
