//! Return-series statistics.
//!
//! Degenerate inputs (empty series, a single observation, zero variance) are not
//! errors here: they propagate as NaN so callers can flag an asset as having no
//! usable data.

mod aggregate;

pub use aggregate::aggregate_daily;

use serde::{Deserialize, Serialize};

use crate::types::AssetStatistics;

/// Percentage period-over-period changes of a price series.
///
/// Entries whose previous price is zero are dropped, so the result holds at
/// most `prices.len() - 1` values.
///
/// # Example
///
/// ```rust
/// use equifi_core::stats::compute_returns;
///
/// let returns = compute_returns(&[100.0, 110.0, 105.0]);
/// assert!((returns[0] - 10.0).abs() < 1e-12);
/// assert!((returns[1] + 4.545454).abs() < 1e-6);
/// ```
pub fn compute_returns(prices: &[f64]) -> Vec<f64> {
    if prices.len() < 2 {
        return Vec::new();
    }

    prices
        .windows(2)
        .filter(|pair| pair[0] != 0.0)
        .map(|pair| (pair[1] - pair[0]) / pair[0] * 100.0)
        .collect()
}

/// Arithmetic mean. NaN for an empty series.
pub fn mean_return(returns: &[f64]) -> f64 {
    returns.iter().sum::<f64>() / returns.len() as f64
}

/// Sample standard deviation (n - 1 denominator). NaN when fewer than two values.
pub fn standard_deviation(returns: &[f64]) -> f64 {
    let n = returns.len() as f64;
    let mean = mean_return(returns);
    let sum_sq = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>();
    (sum_sq / (n - 1.0)).sqrt()
}

/// Sample covariance (n - 1 denominator).
///
/// Both series must be aligned observation by observation; mismatched lengths
/// yield NaN.
pub fn covariance(x: &[f64], y: &[f64]) -> f64 {
    if x.len() != y.len() {
        return f64::NAN;
    }

    let n = x.len() as f64;
    let mean_x = mean_return(x);
    let mean_y = mean_return(y);

    x.iter()
        .zip(y)
        .map(|(a, b)| (a - mean_x) * (b - mean_y))
        .sum::<f64>()
        / (n - 1.0)
}

impl AssetStatistics {
    /// Mean and sample volatility of a return series.
    pub fn from_returns(returns: &[f64]) -> Self {
        Self {
            mean_return: mean_return(returns),
            volatility: standard_deviation(returns),
        }
    }
}

/// Square, symmetric matrix of pairwise correlations indexed by asset position.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct CorrelationMatrix {
    rows: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    /// Wrap pre-computed rows. Every row must have one entry per asset.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> crate::Result<Self> {
        let k = rows.len();
        if rows.iter().any(|row| row.len() != k) {
            return Err(crate::Error::InvalidOperation(format!(
                "Correlation matrix must be {k}x{k}"
            )));
        }
        Ok(Self { rows })
    }

    /// Uncorrelated assets.
    pub fn identity(size: usize) -> Self {
        let rows = (0..size)
            .map(|i| (0..size).map(|j| if i == j { 1.0 } else { 0.0 }).collect())
            .collect();
        Self { rows }
    }

    /// Number of assets.
    pub fn size(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Correlation between assets `i` and `j`.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.rows[i][j]
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    /// Symmetry check within `tolerance`. NaN entries compare by NaN-ness.
    pub fn is_symmetric(&self, tolerance: f64) -> bool {
        let k = self.size();
        (0..k).all(|i| {
            (0..k).all(|j| {
                let (a, b) = (self.rows[i][j], self.rows[j][i]);
                (a.is_nan() && b.is_nan()) || (a - b).abs() <= tolerance
            })
        })
    }

    pub fn has_unit_diagonal(&self) -> bool {
        (0..self.size()).all(|i| self.rows[i][i] == 1.0)
    }
}

/// Pairwise correlation matrix over the return series of `k` assets.
///
/// The diagonal is fixed to 1. Off-diagonal entries are
/// `cov(i, j) / (sd(i) * sd(j))`; a zero-variance asset makes its row NaN.
pub fn correlation_matrix(all_returns: &[Vec<f64>]) -> CorrelationMatrix {
    let k = all_returns.len();
    let mut rows = vec![vec![0.0; k]; k];
    let std_devs: Vec<f64> = all_returns.iter().map(|r| standard_deviation(r)).collect();

    for i in 0..k {
        rows[i][i] = 1.0;
        for j in (i + 1)..k {
            let cov = covariance(&all_returns[i], &all_returns[j]);
            let corr = cov / (std_devs[i] * std_devs[j]);
            rows[i][j] = corr;
            rows[j][i] = corr;
        }
    }

    CorrelationMatrix { rows }
}
