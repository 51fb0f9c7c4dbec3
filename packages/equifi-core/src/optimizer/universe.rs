//! Asset universe and portfolio metrics.

use serde::{Deserialize, Serialize};

use crate::stats::{correlation_matrix, CorrelationMatrix};
use crate::types::{AssetStatistics, PortfolioMetrics};
use crate::{Error, Result};

/// Return statistics and correlations of the assets a portfolio is built from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssetUniverse {
    mean_returns: Vec<f64>,
    volatilities: Vec<f64>,
    correlation: CorrelationMatrix,
}

impl AssetUniverse {
    /// Create a universe, checking that every input covers the same assets.
    pub fn new(
        mean_returns: Vec<f64>,
        volatilities: Vec<f64>,
        correlation: CorrelationMatrix,
    ) -> Result<Self> {
        if mean_returns.len() != volatilities.len() || mean_returns.len() != correlation.size() {
            return Err(Error::InvalidOperation(format!(
                "Universe inputs disagree on asset count: {} returns, {} volatilities, {}x{} correlations",
                mean_returns.len(),
                volatilities.len(),
                correlation.size(),
                correlation.size()
            )));
        }

        Ok(Self {
            mean_returns,
            volatilities,
            correlation,
        })
    }

    /// Build the universe straight from per-asset return series.
    pub fn from_returns(all_returns: &[Vec<f64>]) -> Self {
        let stats: Vec<AssetStatistics> = all_returns
            .iter()
            .map(|r| AssetStatistics::from_returns(r))
            .collect();

        Self {
            mean_returns: stats.iter().map(|s| s.mean_return).collect(),
            volatilities: stats.iter().map(|s| s.volatility).collect(),
            correlation: correlation_matrix(all_returns),
        }
    }

    /// Number of assets.
    pub fn len(&self) -> usize {
        self.mean_returns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mean_returns.is_empty()
    }

    pub fn mean_returns(&self) -> &[f64] {
        &self.mean_returns
    }

    pub fn volatilities(&self) -> &[f64] {
        &self.volatilities
    }

    pub fn correlation(&self) -> &CorrelationMatrix {
        &self.correlation
    }

    /// Per-asset statistics in universe order.
    pub fn statistics(&self) -> Vec<AssetStatistics> {
        self.mean_returns
            .iter()
            .zip(&self.volatilities)
            .map(|(&mean_return, &volatility)| AssetStatistics {
                mean_return,
                volatility,
            })
            .collect()
    }

    /// Weighted sum of asset mean returns. `weights` has one entry per asset.
    pub(crate) fn portfolio_return(&self, weights: &[f64]) -> f64 {
        weights
            .iter()
            .zip(&self.mean_returns)
            .map(|(w, r)| w * r)
            .sum()
    }

    /// `sum_i sum_j w_i w_j s_i s_j p_ij`.
    ///
    /// Not clamped: a correlation matrix that is not positive semi-definite
    /// can make this negative. `weights` has one entry per asset.
    pub(crate) fn portfolio_variance(&self, weights: &[f64]) -> f64 {
        let mut variance = 0.0;
        for (i, wi) in weights.iter().enumerate() {
            for (j, wj) in weights.iter().enumerate() {
                variance += wi
                    * wj
                    * self.volatilities[i]
                    * self.volatilities[j]
                    * self.correlation.get(i, j);
            }
        }
        variance
    }

    /// Return, volatility and Sharpe ratio of a weighting.
    ///
    /// Fails unless there is exactly one weight per asset.
    pub fn metrics(&self, weights: &[f64], risk_free_rate: f64) -> Result<PortfolioMetrics> {
        if weights.len() != self.len() {
            return Err(Error::InvalidOperation(format!(
                "Expected {} weights, got {}",
                self.len(),
                weights.len()
            )));
        }
        Ok(self.weighted_metrics(weights, risk_free_rate))
    }

    /// [`AssetUniverse::metrics`] for weights built from this universe.
    pub(crate) fn weighted_metrics(
        &self,
        weights: &[f64],
        risk_free_rate: f64,
    ) -> PortfolioMetrics {
        let expected_return = self.portfolio_return(weights);
        let volatility = self.portfolio_variance(weights).sqrt();

        PortfolioMetrics {
            expected_return,
            volatility,
            sharpe_ratio: (expected_return - risk_free_rate) / volatility,
        }
    }
}

/// Metrics of a weighting over loose statistics.
///
/// Degenerate inputs are not trapped: a zero volatility gives an infinite or
/// NaN Sharpe ratio, a negative variance a NaN volatility.
pub fn portfolio_metrics(
    weights: &[f64],
    mean_returns: &[f64],
    volatilities: &[f64],
    correlation: &CorrelationMatrix,
    risk_free_rate: f64,
) -> Result<PortfolioMetrics> {
    let universe = AssetUniverse::new(
        mean_returns.to_vec(),
        volatilities.to_vec(),
        correlation.clone(),
    )?;

    universe.metrics(weights, risk_free_rate)
}
