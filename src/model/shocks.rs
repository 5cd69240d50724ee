//! Discrete approximations of income and return shocks
//!
//! Lognormal variables are discretised into equiprobable nodes: the support
//! is cut at the normal quantiles i/n and each node takes the conditional mean
//! of its slice, so the discrete mean equals the continuous mean exactly.

/// Discrete distribution with explicit probabilities
#[derive(Debug, Clone, PartialEq)]
pub struct DiscreteDistribution {
    pub probs: Vec<f64>,
    pub values: Vec<f64>,
}

impl DiscreteDistribution {
    /// Point mass at `value`
    pub fn degenerate(value: f64) -> Self {
        Self {
            probs: vec![1.0],
            values: vec![value],
        }
    }

    /// Equiprobable approximation of exp(N(mu, sigma^2)) with `n` nodes
    pub fn lognormal(mu: f64, sigma: f64, n: usize) -> Self {
        let mean = (mu + 0.5 * sigma * sigma).exp();
        if n <= 1 || sigma <= 0.0 {
            return Self::degenerate(mean);
        }

        let nf = n as f64;
        // Cut points in standard-normal space, shifted by sigma for the
        // partial expectation of the lognormal
        let cdf_shifted: Vec<f64> = (0..=n)
            .map(|i| match i {
                0 => 0.0,
                i if i == n => 1.0,
                i => norm_cdf(norm_ppf(i as f64 / nf) - sigma),
            })
            .collect();

        let values = cdf_shifted
            .windows(2)
            .map(|w| nf * mean * (w[1] - w[0]))
            .collect();

        Self {
            probs: vec![1.0 / nf; n],
            values,
        }
    }

    /// Mean-one lognormal with log standard deviation `sigma`
    pub fn mean_one_lognormal(sigma: f64, n: usize) -> Self {
        Self::lognormal(-0.5 * sigma * sigma, sigma, n)
    }

    /// Lognormal matching an arithmetic mean and standard deviation
    pub fn lognormal_from_moments(avg: f64, std: f64, n: usize) -> Self {
        let (mu, sigma) = lognormal_params(avg, std);
        Self::lognormal(mu, sigma, n)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn mean(&self) -> f64 {
        self.probs.iter().zip(&self.values).map(|(p, v)| p * v).sum()
    }

    /// Node index for a uniform draw `u` in [0, 1)
    pub fn draw_index(&self, u: f64) -> usize {
        let mut cum = 0.0;
        for (idx, p) in self.probs.iter().enumerate() {
            cum += p;
            if u < cum {
                return idx;
            }
        }
        self.len() - 1
    }
}

/// Underlying normal parameters of a lognormal with given mean and std
pub fn lognormal_params(avg: f64, std: f64) -> (f64, f64) {
    let sigma2 = (1.0 + (std / avg).powi(2)).ln();
    (avg.ln() - 0.5 * sigma2, sigma2.sqrt())
}

/// One joint realisation of (permanent, transitory, risky) shocks
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShockNode {
    pub prob: f64,
    pub perm: f64,
    pub tran: f64,
    pub risky: f64,
}

/// Income shocks faced on arrival in a period
#[derive(Debug, Clone, PartialEq)]
pub struct IncomeShocks {
    pub perm: DiscreteDistribution,
    pub tran: DiscreteDistribution,
}

impl IncomeShocks {
    /// Shocks during working life
    pub fn working(perm_std: f64, perm_count: usize, tran_std: f64, tran_count: usize) -> Self {
        Self {
            perm: DiscreteDistribution::mean_one_lognormal(perm_std, perm_count),
            tran: DiscreteDistribution::mean_one_lognormal(tran_std, tran_count),
        }
    }

    /// Retirement: income is the deterministic pension
    pub fn retired() -> Self {
        Self {
            perm: DiscreteDistribution::degenerate(1.0),
            tran: DiscreteDistribution::degenerate(1.0),
        }
    }

    /// Cartesian product with an independent risky return distribution
    pub fn joint_with(&self, risky: &DiscreteDistribution) -> Vec<ShockNode> {
        let mut nodes = Vec::with_capacity(self.perm.len() * self.tran.len() * risky.len());
        for (pp, &perm) in self.perm.probs.iter().zip(&self.perm.values) {
            for (pt, &tran) in self.tran.probs.iter().zip(&self.tran.values) {
                for (pr, &r) in risky.probs.iter().zip(&risky.values) {
                    nodes.push(ShockNode {
                        prob: pp * pt * pr,
                        perm,
                        tran,
                        risky: r,
                    });
                }
            }
        }
        nodes
    }
}

/// Standard normal CDF
pub fn norm_cdf(x: f64) -> f64 {
    0.5 * erfc(-x / std::f64::consts::SQRT_2)
}

/// Complementary error function (Chebyshev fit, fractional error < 1.2e-7)
fn erfc(x: f64) -> f64 {
    let z = x.abs();
    let t = 1.0 / (1.0 + 0.5 * z);
    let poly = -z * z - 1.26551223
        + t * (1.00002368
            + t * (0.37409196
                + t * (0.09678418
                    + t * (-0.18628806
                        + t * (0.27886807
                            + t * (-1.13520398
                                + t * (1.48851587 + t * (-0.82215223 + t * 0.17087277))))))));
    let r = t * poly.exp();
    if x >= 0.0 {
        r
    } else {
        2.0 - r
    }
}

/// Standard normal quantile (Acklam's rational approximation)
pub fn norm_ppf(p: f64) -> f64 {
    const A: [f64; 6] = [
        -3.969683028665376e+01,
        2.209460984245205e+02,
        -2.759285104469687e+02,
        1.383577518672690e+02,
        -3.066479806614716e+01,
        2.506628277459239e+00,
    ];
    const B: [f64; 5] = [
        -5.447609879822406e+01,
        1.615858368580409e+02,
        -1.556989798598866e+02,
        6.680131188771972e+01,
        -1.328068155288572e+01,
    ];
    const C: [f64; 6] = [
        -7.784894002430293e-03,
        -3.223964580411365e-01,
        -2.400758277161838e+00,
        -2.549732539343734e+00,
        4.374664141464968e+00,
        2.938163982698783e+00,
    ];
    const D: [f64; 4] = [
        7.784695709041462e-03,
        3.224671290700398e-01,
        2.445134137142996e+00,
        3.754408661907416e+00,
    ];
    const P_LOW: f64 = 0.02425;

    if p <= 0.0 {
        return f64::NEG_INFINITY;
    }
    if p >= 1.0 {
        return f64::INFINITY;
    }

    if p < P_LOW {
        let q = (-2.0 * p.ln()).sqrt();
        (((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    } else if p <= 1.0 - P_LOW {
        let q = p - 0.5;
        let r = q * q;
        (((((A[0] * r + A[1]) * r + A[2]) * r + A[3]) * r + A[4]) * r + A[5]) * q
            / (((((B[0] * r + B[1]) * r + B[2]) * r + B[3]) * r + B[4]) * r + 1.0)
    } else {
        let q = (-2.0 * (1.0 - p).ln()).sqrt();
        -(((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    }
}
