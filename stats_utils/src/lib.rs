// Copyright (c) 2018 10X Genomics, Inc. All rights reserved.

// Summary statistics shared by the calibration, set-aggregation and
// correlation code.

use statrs::distribution::{ContinuousCDF, StudentsT};
use std::f64;
use std::fmt;

// Compute mean of some numbers, returning zero on empty slice.

pub fn mean(v: &[f64]) -> f64 {
    if v.is_empty() {
        return 0_f64;
    }
    v.iter().sum::<f64>() / v.len() as f64
}

// Compute the sample standard deviation (n - 1 denominator).  Returns zero if
// fewer than two values are given.

pub fn std_dev(v: &[f64]) -> f64 {
    if v.len() < 2 {
        return 0_f64;
    }
    let m = mean(v);
    let ss: f64 = v.iter().map(|x| (x - m) * (x - m)).sum();
    (ss / (v.len() - 1) as f64).sqrt()
}

/// Mean and standard deviation computed in one call.
pub fn mean_and_std_dev(v: &[f64]) -> (f64, f64) {
    (mean(v), std_dev(v))
}

// Coefficient of variation, stddev / mean.  Zero when the mean is zero.

pub fn coefficient_of_variation(v: &[f64]) -> f64 {
    let (m, sd) = mean_and_std_dev(v);
    if m == 0_f64 {
        return 0_f64;
    }
    sd / m
}

/// Result of a linear (Pearson) correlation between two paired series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Correlation {
    /// Pearson product-moment coefficient in [-1, 1].
    pub r: f64,
    /// Number of pairs used.
    pub n: usize,
    /// Student t statistic for H0: r == 0, with n - 2 degrees of freedom.
    pub t: f64,
    /// Two-sided p-value of `t`.
    pub p_value: f64,
}

impl Correlation {
    fn degenerate(n: usize) -> Self {
        Correlation {
            r: 0.0,
            n,
            t: 0.0,
            p_value: 1.0,
        }
    }
}

impl fmt::Display for Correlation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "r={:.4} n={} t={:.4} p={:.3e}",
            self.r, self.n, self.t, self.p_value
        )
    }
}

/// Pearson correlation of `x` against `y` with its significance.
///
/// Only the first `min(x.len(), y.len())` pairs are used. A series with zero
/// variance, or fewer than three pairs, gives `r = 0` and `p = 1`.
pub fn linear_correlation(x: &[f64], y: &[f64]) -> Correlation {
    let n = x.len().min(y.len());
    if n < 3 {
        return Correlation::degenerate(n);
    }
    let (x, y) = (&x[..n], &y[..n]);
    let mx = mean(x);
    let my = mean(y);
    let mut sxy = 0_f64;
    let mut sxx = 0_f64;
    let mut syy = 0_f64;
    for (xi, yi) in x.iter().zip(y) {
        let dx = xi - mx;
        let dy = yi - my;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    let denom = (sxx * syy).sqrt();
    if denom == 0_f64 || !denom.is_finite() {
        return Correlation::degenerate(n);
    }
    let r = (sxy / denom).clamp(-1.0, 1.0);
    let df = (n - 2) as f64;
    if 1.0 - r.abs() < 1e-12 {
        return Correlation {
            r,
            n,
            t: f64::INFINITY.copysign(r),
            p_value: 0.0,
        };
    }
    let t = r * (df / (1.0 - r * r)).sqrt();
    let p_value = match StudentsT::new(0.0, 1.0, df) {
        Ok(dist) => 2.0 * (1.0 - dist.cdf(t.abs())),
        Err(_) => 1.0,
    };
    Correlation { r, n, t, p_value }
}
