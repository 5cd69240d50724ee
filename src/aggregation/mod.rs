//! Reshape the simulated panel and aggregate it by age
//!
//! `DerivedTable` holds one row per (period, agent) observation with the two
//! level variables added (`Cons = nrmC * pIncome`, `M = nrmM * pIncome`).
//! Grouping by age yields `AgeTable`s of means and percentiles.

mod stats;
mod table;

pub use stats::{mean, quantile};
pub use table::{AgeTable, Column, Statistic};

use log::debug;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{PortfolioError, Result};
use crate::simulation::{SimulatedPanel, TrackedVar};

/// Lower percentile plotted around the mean
pub const LOWER_QUANTILE: f64 = 0.05;
/// Upper percentile plotted around the mean
pub const UPPER_QUANTILE: f64 = 0.95;

/// One observation of the derived table (also used for aggregated rows)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PanelRow {
    #[serde(rename = "Age")]
    pub age: u32,
    #[serde(rename = "pIncome")]
    pub p_income: f64,
    #[serde(rename = "rShare")]
    pub r_share: f64,
    #[serde(rename = "nrmM")]
    pub nrm_m: f64,
    #[serde(rename = "nrmC")]
    pub nrm_c: f64,
    #[serde(rename = "Cons")]
    pub cons: f64,
    #[serde(rename = "M")]
    pub m: f64,
}

impl PanelRow {
    /// Build a row from the raw tracked values, adding the level columns
    pub fn new(age: u32, p_income: f64, r_share: f64, nrm_m: f64, nrm_c: f64) -> Self {
        Self {
            age,
            p_income,
            r_share,
            nrm_m,
            nrm_c,
            cons: nrm_c * p_income,
            m: nrm_m * p_income,
        }
    }
}

/// Row-wise view of the simulated panel
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedTable {
    rows: Vec<PanelRow>,
}

impl DerivedTable {
    /// Flatten a panel into rows. Age is `t_age + age_born - 1`.
    pub fn from_panel(panel: &SimulatedPanel, age_born: u32) -> Result<Self> {
        if panel.is_empty() {
            return Err(PortfolioError::EmptyPanel);
        }

        let expected = panel.len();
        let column = |var: TrackedVar| -> Result<&[f64]> {
            let values = panel.require(var)?;
            if values.len() != expected {
                return Err(PortfolioError::ColumnLength {
                    column: var.name(),
                    expected,
                    found: values.len(),
                });
            }
            Ok(values)
        };

        let t_age = column(TrackedVar::TAge)?;
        let p_lvl = column(TrackedVar::PLvl)?;
        let share = column(TrackedVar::RiskyShare)?;
        let m_nrm = column(TrackedVar::MNrm)?;
        let c_nrm = column(TrackedVar::CNrm)?;

        let rows = (0..expected)
            .map(|i| {
                let age = (t_age[i].round() as u32 + age_born).saturating_sub(1);
                PanelRow::new(age, p_lvl[i], share[i], m_nrm[i], c_nrm[i])
            })
            .collect();

        Ok(Self { rows })
    }

    pub fn from_rows(rows: Vec<PanelRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[PanelRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Distinct ages in ascending order
    pub fn ages(&self) -> Vec<u32> {
        self.group_by_age().into_iter().map(|(age, _)| age).collect()
    }

    /// Mean of every column at each age
    pub fn age_means(&self) -> AgeTable {
        self.aggregate(Statistic::Mean)
    }

    /// Quantile `q` of every column at each age
    pub fn age_quantile(&self, q: f64) -> AgeTable {
        self.aggregate(Statistic::Quantile(q))
    }

    fn aggregate(&self, statistic: Statistic) -> AgeTable {
        let groups = self.group_by_age();
        let rows: Vec<PanelRow> = groups
            .par_iter()
            .map(|(age, rows)| aggregate_group(*age, rows, statistic))
            .collect();
        debug!("Aggregated {} observations into {} ages ({})", self.len(), rows.len(), statistic);
        AgeTable::new(statistic, rows)
    }

    /// Rows grouped by age, ages ascending
    fn group_by_age(&self) -> Vec<(u32, Vec<&PanelRow>)> {
        let mut groups: BTreeMap<u32, Vec<&PanelRow>> = BTreeMap::new();
        for row in &self.rows {
            groups.entry(row.age).or_default().push(row);
        }
        groups.into_iter().collect()
    }
}

fn aggregate_group(age: u32, rows: &[&PanelRow], statistic: Statistic) -> PanelRow {
    let reduce = |get: fn(&PanelRow) -> f64| -> f64 {
        let mut values: Vec<f64> = rows.iter().map(|r| get(r)).collect();
        match statistic {
            Statistic::Mean => mean(&values),
            Statistic::Quantile(q) => quantile(&mut values, q),
        }
    };

    PanelRow {
        age,
        p_income: reduce(|r| r.p_income),
        r_share: reduce(|r| r.r_share),
        nrm_m: reduce(|r| r.nrm_m),
        nrm_c: reduce(|r| r.nrm_c),
        cons: reduce(|r| r.cons),
        m: reduce(|r| r.m),
    }
}

/// The three age tables used for plotting
#[derive(Debug, Clone, PartialEq)]
pub struct AgeSummary {
    pub means: AgeTable,
    pub lower: AgeTable,
    pub upper: AgeTable,
}

impl AgeSummary {
    /// Means plus the 5th and 95th percentiles by age
    pub fn from_table(data: &DerivedTable) -> Self {
        Self {
            means: data.age_means(),
            lower: data.age_quantile(LOWER_QUANTILE),
            upper: data.age_quantile(UPPER_QUANTILE),
        }
    }

    pub fn tables(&self) -> [&AgeTable; 3] {
        [&self.means, &self.lower, &self.upper]
    }
}
