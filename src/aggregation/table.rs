//! Age-indexed aggregate tables

use std::fmt;
use std::path::Path;

use super::PanelRow;
use crate::error::Result;

/// Statistic an `AgeTable` was reduced with
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Statistic {
    Mean,
    Quantile(f64),
}

impl Statistic {
    /// File stem for CSV output, e.g. `age_means` or `age_p05`
    pub fn file_stem(&self) -> String {
        match self {
            Statistic::Mean => "age_means".to_string(),
            Statistic::Quantile(q) => format!("age_p{:02}", (q * 100.0).round() as u32),
        }
    }
}

impl fmt::Display for Statistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statistic::Mean => write!(f, "mean"),
            Statistic::Quantile(q) => write!(f, "quantile {}", q),
        }
    }
}

/// Numeric columns of a panel row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    PIncome,
    RShare,
    NrmM,
    NrmC,
    Cons,
    M,
}

impl Column {
    pub fn value(&self, row: &PanelRow) -> f64 {
        match self {
            Column::PIncome => row.p_income,
            Column::RShare => row.r_share,
            Column::NrmM => row.nrm_m,
            Column::NrmC => row.nrm_c,
            Column::Cons => row.cons,
            Column::M => row.m,
        }
    }
}

/// One aggregated row per age, ages ascending
#[derive(Debug, Clone, PartialEq)]
pub struct AgeTable {
    statistic: Statistic,
    rows: Vec<PanelRow>,
}

impl AgeTable {
    pub fn new(statistic: Statistic, rows: Vec<PanelRow>) -> Self {
        Self { statistic, rows }
    }

    pub fn statistic(&self) -> Statistic {
        self.statistic
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

    pub fn ages(&self) -> Vec<u32> {
        self.rows.iter().map(|r| r.age).collect()
    }

    /// (age, value) points of one column, ready for plotting
    pub fn series(&self, column: Column) -> Vec<(f64, f64)> {
        self.rows
            .iter()
            .map(|r| (r.age as f64, column.value(r)))
            .collect()
    }

    /// Write the table as CSV with the panel column names
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)?;
        for row in &self.rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> AgeTable {
        AgeTable::new(
            Statistic::Mean,
            vec![
                PanelRow::new(20, 10.0, 1.0, 1.0, 0.5),
                PanelRow::new(21, 11.0, 0.9, 2.0, 0.6),
            ],
        )
    }

    #[test]
    fn test_file_stems() {
        assert_eq!(Statistic::Mean.file_stem(), "age_means");
        assert_eq!(Statistic::Quantile(0.05).file_stem(), "age_p05");
        assert_eq!(Statistic::Quantile(0.95).file_stem(), "age_p95");
    }

    #[test]
    fn test_series() {
        let t = table();
        assert_eq!(t.series(Column::Cons), vec![(20.0, 5.0), (21.0, 0.6 * 11.0)]);
        assert_eq!(t.series(Column::M), vec![(20.0, 10.0), (21.0, 22.0)]);
    }

    #[test]
    fn test_write_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("age_means.csv");
        table().write_csv(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("Age,pIncome,rShare,nrmM,nrmC,Cons,M"));
        assert!(lines.next().unwrap().starts_with("20,10.0,1.0,1.0,0.5,5.0,10.0"));
        assert_eq!(lines.count(), 1);
    }
}
