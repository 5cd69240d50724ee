//! Piecewise-linear interpolation on a sorted grid

/// Behaviour outside the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extrapolation {
    /// Extend the first / last segment
    Linear,
    /// Hold the boundary value
    Flat,
}

/// Linear interpolant through (x, y) points with non-decreasing x
#[derive(Debug, Clone, PartialEq)]
pub struct LinearInterp {
    x: Vec<f64>,
    y: Vec<f64>,
    extrapolation: Extrapolation,
}

impl LinearInterp {
    pub fn new(x: Vec<f64>, y: Vec<f64>, extrapolation: Extrapolation) -> Self {
        assert_eq!(x.len(), y.len(), "interpolation grid and values differ in length");
        assert!(!x.is_empty(), "interpolation grid is empty");
        debug_assert!(x.windows(2).all(|w| w[0] <= w[1]), "grid must be sorted");
        Self { x, y, extrapolation }
    }

    /// Constant function
    pub fn constant(value: f64) -> Self {
        Self::new(vec![0.0], vec![value], Extrapolation::Flat)
    }

    pub fn x(&self) -> &[f64] {
        &self.x
    }

    pub fn y(&self) -> &[f64] {
        &self.y
    }

    pub fn eval(&self, x: f64) -> f64 {
        let n = self.x.len();
        if n == 1 {
            return self.y[0];
        }

        if self.extrapolation == Extrapolation::Flat {
            if x <= self.x[0] {
                return self.y[0];
            }
            if x >= self.x[n - 1] {
                return self.y[n - 1];
            }
        }

        let hi = self.x.partition_point(|&v| v <= x).clamp(1, n - 1);
        let lo = hi - 1;
        let dx = self.x[hi] - self.x[lo];
        if dx <= 0.0 {
            return self.y[lo];
        }
        let w = (x - self.x[lo]) / dx;
        self.y[lo] + w * (self.y[hi] - self.y[lo])
    }
}
