//! Survival probabilities from a one-year mortality table
//!
//! Base rates are the IAM 2012 Basic table, stored per age as
//! (female_rate, male_rate). A scalar multiplier adjusts all rates for
//! sensitivity runs. Ages beyond the table die with certainty.

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::loader;
use crate::error::Result;

/// Sex column to read from the mortality table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sex {
    Female,
    Male,
}

/// One-year death probabilities by age
#[derive(Debug, Clone, PartialEq)]
pub struct SurvivalTable {
    /// Annual death probability by age (index = age)
    /// Stored as (female_rate, male_rate)
    base_rates: Vec<(f64, f64)>,
}

impl Default for SurvivalTable {
    fn default() -> Self {
        Self::iam_2012()
    }
}

impl SurvivalTable {
    /// IAM 2012 Basic table
    pub fn iam_2012() -> Self {
        Self {
            base_rates: Self::iam_2012_base_rates(),
        }
    }

    /// Create from explicit rates indexed by age
    pub fn new(base_rates: Vec<(f64, f64)>) -> Self {
        Self { base_rates }
    }

    /// Load rates from `age,female,male` CSV
    pub fn from_csv_path(path: &Path) -> Result<Self> {
        Ok(Self {
            base_rates: loader::load_mortality_rates(path)?,
        })
    }

    /// Highest age covered by the table
    pub fn max_age(&self) -> u32 {
        self.base_rates.len().saturating_sub(1) as u32
    }

    /// Annual death probability at an age, before scaling
    pub fn death_rate(&self, age: u32, sex: Sex) -> f64 {
        match self.base_rates.get(age as usize) {
            Some(&(female, male)) => match sex {
                Sex::Female => female,
                Sex::Male => male,
            },
            None => 1.0,
        }
    }

    /// Probability of surviving from `age` to `age + 1`
    pub fn liv_prb(&self, age: u32, sex: Sex, scale: f64) -> f64 {
        let q = (self.death_rate(age, sex) * scale).clamp(0.0, 1.0);
        1.0 - q
    }

    /// IAM 2012 Basic mortality table
    fn iam_2012_base_rates() -> Vec<(f64, f64)> {
        vec![
            // Age 0-9
            (0.001801, 0.001783), (0.00045, 0.000446), (0.000287, 0.000306),
            (0.000199, 0.000254), (0.000152, 0.000193), (0.000139, 0.000186),
            (0.00013, 0.000184), (0.000122, 0.000177), (0.000105, 0.000159),
            (0.000098, 0.000143),
            // Age 10-19
            (0.000094, 0.000126), (0.000096, 0.000123), (0.000105, 0.000147),
            (0.00012, 0.000188), (0.000146, 0.000236), (0.000174, 0.000282),
            (0.000199, 0.000325), (0.00022, 0.000364), (0.000234, 0.000399),
            (0.000245, 0.00043),
            // Age 20-29
            (0.000253, 0.000459), (0.00026, 0.000492), (0.000266, 0.000526),
            (0.000272, 0.000569), (0.000275, 0.000616), (0.000277, 0.000669),
            (0.000284, 0.000728), (0.00029, 0.000764), (0.0003, 0.000789),
            (0.000313, 0.000808),
            // Age 30-39
            (0.000333, 0.000824), (0.000357, 0.000834), (0.000375, 0.000838),
            (0.00039, 0.000828), (0.000405, 0.000808), (0.000424, 0.000789),
            (0.000447, 0.000783), (0.000476, 0.0008), (0.000514, 0.000837),
            (0.00056, 0.000889),
            // Age 40-49
            (0.000613, 0.000955), (0.000667, 0.001029), (0.000723, 0.00111),
            (0.000774, 0.001188), (0.000823, 0.001268), (0.000866, 0.001355),
            (0.000917, 0.001464), (0.000983, 0.001615), (0.001072, 0.001808),
            (0.001168, 0.002032),
            // Age 50-59
            (0.00129, 0.002285), (0.001453, 0.002557), (0.001622, 0.002828),
            (0.001792, 0.003088), (0.001972, 0.003345), (0.002166, 0.003616),
            (0.002393, 0.003922), (0.002666, 0.004272), (0.003, 0.004681),
            (0.003393, 0.005146),
            // Age 60-69
            (0.003844, 0.005662), (0.004352, 0.006237), (0.004899, 0.006854),
            (0.005482, 0.00751), (0.006118, 0.00822), (0.006829, 0.009007),
            (0.007279, 0.009497), (0.007821, 0.010085), (0.008475, 0.010787),
            (0.009234, 0.011625),
            // Age 70-79
            (0.010083, 0.012619), (0.011011, 0.013798), (0.01203, 0.015195),
            (0.013154, 0.016834), (0.014415, 0.018733), (0.015869, 0.020905),
            (0.017555, 0.023367), (0.0195, 0.026155), (0.021758, 0.029306),
            (0.024412, 0.032858),
            // Age 80-89
            (0.027579, 0.036927), (0.031501, 0.041703), (0.036122, 0.046957),
            (0.041477, 0.052713), (0.047589, 0.059148), (0.054441, 0.066505),
            (0.061972, 0.075015), (0.070155, 0.084823), (0.078963, 0.095987),
            (0.088336, 0.108482),
            // Age 90-99
            (0.098197, 0.122214), (0.108323, 0.136799), (0.119188, 0.152409),
            (0.131334, 0.169078), (0.145521, 0.186882), (0.162722, 0.205844),
            (0.18212, 0.219247), (0.199661, 0.238612), (0.217946, 0.258341),
            (0.236834, 0.278219),
            // Age 100-109
            (0.256357, 0.298452), (0.283802, 0.32361), (0.304716, 0.344191),
            (0.325819, 0.364633), (0.346936, 0.384783), (0.367898, 0.4),
            (0.387607, 0.4), (0.4, 0.4), (0.4, 0.4), (0.4, 0.4),
            // Age 110-120
            (0.4, 0.4), (0.4, 0.4), (0.4, 0.4), (0.4, 0.4), (0.4, 0.4),
            (0.4, 0.4), (0.4, 0.4), (0.4, 0.4), (0.4, 0.4), (0.4, 0.4),
            (0.4, 0.4),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_table_lookup() {
        let table = SurvivalTable::iam_2012();
        assert_eq!(table.max_age(), 120);
        assert_abs_diff_eq!(table.death_rate(77, Sex::Male), 0.026155);
        assert_abs_diff_eq!(table.death_rate(77, Sex::Female), 0.0195);
    }

    #[test]
    fn test_liv_prb_with_scale() {
        let table = SurvivalTable::iam_2012();
        let base = table.liv_prb(60, Sex::Male, 1.0);
        assert_abs_diff_eq!(base, 1.0 - 0.005662, epsilon = 1e-12);

        let doubled = table.liv_prb(60, Sex::Male, 2.0);
        assert_abs_diff_eq!(doubled, 1.0 - 2.0 * 0.005662, epsilon = 1e-12);

        // Scaled rates never exceed certainty
        assert_eq!(table.liv_prb(110, Sex::Male, 5.0), 0.0);
    }

    #[test]
    fn test_beyond_table_is_certain_death() {
        let table = SurvivalTable::new(vec![(0.01, 0.02); 10]);
        assert_eq!(table.liv_prb(10, Sex::Female, 1.0), 0.0);
        assert_abs_diff_eq!(table.liv_prb(9, Sex::Male, 1.0), 0.98);
    }
}
