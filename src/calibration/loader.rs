//! CSV-based mortality loader
//!
//! Reads one-year death probabilities in the `age,female,male` layout.

use std::fs::File;
use std::path::Path;

use crate::error::{PortfolioError, Result};

/// Highest age a table may cover
pub const MAX_TABLE_AGE: usize = 120;

/// Load mortality rates from CSV
/// Returns Vec<(female_rate, male_rate)> indexed by age. Ages missing from
/// the file default to certain death.
pub fn load_mortality_rates(path: &Path) -> Result<Vec<(f64, f64)>> {
    let file = File::open(path)?;
    let mut reader = csv::Reader::from_reader(file);

    let mut rates = vec![(1.0, 1.0); MAX_TABLE_AGE + 1];
    let mut max_age = 0;
    let mut loaded = 0usize;

    for result in reader.records() {
        let record = result?;
        let age: usize = parse_field(&record, 0, path)?;
        let female: f64 = parse_field(&record, 1, path)?;
        let male: f64 = parse_field(&record, 2, path)?;

        if age < rates.len() {
            rates[age] = (female, male);
            max_age = max_age.max(age);
            loaded += 1;
        }
    }

    if loaded == 0 {
        return Err(PortfolioError::InvalidCalibration(format!(
            "{}: no mortality rates for ages 0-{}",
            path.display(),
            MAX_TABLE_AGE
        )));
    }

    rates.truncate(max_age + 1);
    Ok(rates)
}

fn parse_field<T: std::str::FromStr>(record: &csv::StringRecord, idx: usize, path: &Path) -> Result<T> {
    record
        .get(idx)
        .and_then(|s| s.trim().parse().ok())
        .ok_or_else(|| {
            PortfolioError::InvalidCalibration(format!(
                "{}: bad value in column {} of record {:?}",
                path.display(),
                idx,
                record
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_mortality_rates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mortality.csv");
        let mut file = File::create(&path).unwrap();
        writeln!(file, "Age,Female,Male").unwrap();
        writeln!(file, "0,0.002,0.003").unwrap();
        writeln!(file, "1,0.001,0.0015").unwrap();
        writeln!(file, "3,0.5,0.6").unwrap();
        drop(file);

        let rates = load_mortality_rates(&path).unwrap();
        assert_eq!(rates.len(), 4);
        assert_eq!(rates[0], (0.002, 0.003));
        assert_eq!(rates[2], (1.0, 1.0));
        assert_eq!(rates[3], (0.5, 0.6));
    }

    #[test]
    fn test_bad_value_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mortality.csv");
        std::fs::write(&path, "Age,Female,Male\n20,abc,0.1\n").unwrap();

        let err = load_mortality_rates(&path).unwrap_err();
        assert!(matches!(err, PortfolioError::InvalidCalibration(_)));
    }

    #[test]
    fn test_header_only_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mortality.csv");
        std::fs::write(&path, "Age,Female,Male\n").unwrap();
        assert!(matches!(
            load_mortality_rates(&path),
            Err(PortfolioError::InvalidCalibration(_))
        ));

        // Ages beyond the table limit alone leave nothing usable
        std::fs::write(&path, "Age,Female,Male\n130,0.5,0.5\n").unwrap();
        assert!(matches!(
            load_mortality_rates(&path),
            Err(PortfolioError::InvalidCalibration(_))
        ));
    }
}
