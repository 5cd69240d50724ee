//! Crate-wide error type

use thiserror::Error;

use crate::simulation::TrackedVar;

/// Errors raised while calibrating, solving, simulating, aggregating or plotting
#[derive(Debug, Error)]
pub enum PortfolioError {
    #[error("invalid calibration: {0}")]
    InvalidCalibration(String),

    #[error("model has not been solved; call solve() before simulate()")]
    Unsolved,

    #[error("simulated panel does not track required variable {0}")]
    MissingTrackedVariable(TrackedVar),

    #[error("column {column} has {found} observations, expected {expected}")]
    ColumnLength {
        column: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("simulated panel is empty")]
    EmptyPanel,

    #[error("failed to draw figure {figure}: {message}")]
    Plot { figure: String, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Image(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, PortfolioError>;
