//! Deterministic labour income profile
//!
//! Log permanent income while working is a cubic polynomial in age:
//! f(age) = constant + b1 * age + b2 * age^2 / 10 + b3 * age^3 / 100.
//! Retirement income is a fixed fraction of the last working permanent income.

use serde::{Deserialize, Serialize};

/// Cubic log-income profile with a retirement replacement rate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IncomeProfile {
    pub constant: f64,
    pub age_coef: f64,
    pub age2_coef: f64,
    pub age3_coef: f64,
    pub replacement_rate: f64,
}

impl Default for IncomeProfile {
    /// High-school profile from Cocco, Gomes and Maenhout (2005)
    fn default() -> Self {
        Self {
            constant: -2.170042 + 2.700381,
            age_coef: 0.16818,
            age2_coef: -0.0323371,
            age3_coef: 0.0019704,
            replacement_rate: 0.68212,
        }
    }
}

impl IncomeProfile {
    /// Log permanent income at a working age
    pub fn log_level(&self, age: u32) -> f64 {
        let a = age as f64;
        self.constant + self.age_coef * a + self.age2_coef * a * a / 10.0
            + self.age3_coef * a * a * a / 100.0
    }

    /// Permanent income level at a working age
    pub fn level(&self, age: u32) -> f64 {
        self.log_level(age).exp()
    }
}
