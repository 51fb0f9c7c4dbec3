//! End-to-end portfolio analysis for one asset selection.
//!
//! Bundles the per-asset statistics, the correlation matrix, the efficient
//! frontier and the Monte Carlo cloud computed for a single query (asset set,
//! date range and interval).

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::optimizer::{
    efficient_frontier, monte_carlo_portfolios, AssetUniverse, OptimizerConfig, FRONTIER_POINTS,
    MONTE_CARLO_SAMPLES,
};
use crate::outcome::{best_outcome, BEST_OUTCOME_PERCENTILE};
use crate::stats::{aggregate_daily, compute_returns, CorrelationMatrix};
use crate::types::{
    AssetStatistics, DateRange, Interval, PortfolioPoint, PriceBar, SavedPortfolio,
};
use crate::{Error, Result};

/// Smallest number of assets a portfolio is built from.
pub const MIN_ASSETS: usize = 2;

/// Largest number of assets a portfolio is built from.
pub const MAX_ASSETS: usize = 4;

/// Tunables of an analysis run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct AnalysisSettings {
    pub frontier_points: usize,
    pub monte_carlo_samples: usize,
    pub best_outcome_percentile: f64,
    pub optimizer: OptimizerConfig,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            frontier_points: FRONTIER_POINTS,
            monte_carlo_samples: MONTE_CARLO_SAMPLES,
            best_outcome_percentile: BEST_OUTCOME_PERCENTILE,
            optimizer: OptimizerConfig::default(),
        }
    }
}

/// Return series of an asset from its price bars.
///
/// Daily series are first collapsed to one average close per day. Bars are
/// used in the order given.
pub fn series_returns(bars: &[PriceBar], interval: Interval) -> Vec<f64> {
    let closes: Vec<f64> = if interval.needs_daily_aggregation() {
        aggregate_daily(bars).iter().map(|b| b.close).collect()
    } else {
        bars.iter().map(|b| b.close).collect()
    };

    compute_returns(&closes)
}

/// Everything derived from one asset selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioAnalysis {
    pub symbols: Vec<String>,
    pub statistics: Vec<AssetStatistics>,
    pub correlation: CorrelationMatrix,
    pub risk_free_rate: f64,
    pub frontier: Vec<PortfolioPoint>,
    pub monte_carlo: Vec<PortfolioPoint>,
    /// Percentile of the asset mean returns, `None` when no asset has data
    pub best_outcome: Option<f64>,
    /// Symbols whose statistics are undefined for lack of data
    pub missing_assets: Vec<String>,
    /// Pairs of assets with data whose correlation is undefined, e.g. series
    /// of different lengths or a constant price
    #[serde(default)]
    pub degenerate_pairs: Vec<[String; 2]>,
}

impl PortfolioAnalysis {
    /// Run statistics, frontier and Monte Carlo sampling over aligned
    /// `symbols` and `return_series`.
    pub fn build<R: Rng>(
        symbols: &[String],
        return_series: &[Vec<f64>],
        risk_free_rate: f64,
        settings: &AnalysisSettings,
        rng: &mut R,
    ) -> Result<Self> {
        if symbols.len() != return_series.len() {
            return Err(Error::InvalidOperation(format!(
                "{} symbols but {} return series",
                symbols.len(),
                return_series.len()
            )));
        }
        if !(MIN_ASSETS..=MAX_ASSETS).contains(&symbols.len()) {
            return Err(Error::InvalidOperation(format!(
                "Portfolios hold {} to {} assets, got {}",
                MIN_ASSETS,
                MAX_ASSETS,
                symbols.len()
            )));
        }

        let universe = AssetUniverse::from_returns(return_series);
        let statistics = universe.statistics();

        let missing_assets: Vec<String> = symbols
            .iter()
            .zip(&statistics)
            .filter(|(_, stats)| !stats.has_data())
            .map(|(symbol, _)| symbol.clone())
            .collect();
        if !missing_assets.is_empty() {
            tracing::warn!(?missing_assets, "assets without usable return data");
        }

        let degenerate_pairs = degenerate_pairs(symbols, &statistics, universe.correlation());
        if !degenerate_pairs.is_empty() {
            tracing::warn!(?degenerate_pairs, "insufficient overlapping data for correlation");
        }

        let frontier = efficient_frontier(
            &universe,
            risk_free_rate,
            settings.frontier_points,
            &settings.optimizer,
        )?;
        let monte_carlo = monte_carlo_portfolios(
            &universe,
            risk_free_rate,
            settings.monte_carlo_samples,
            rng,
        );

        let defined_means: Vec<f64> = universe
            .mean_returns()
            .iter()
            .copied()
            .filter(|r| r.is_finite())
            .collect();
        let best_outcome = best_outcome(settings.best_outcome_percentile, &defined_means);

        tracing::debug!(
            assets = symbols.len(),
            frontier = frontier.len(),
            monte_carlo = monte_carlo.len(),
            "portfolio analysis complete"
        );

        Ok(Self {
            symbols: symbols.to_vec(),
            statistics,
            correlation: universe.correlation().clone(),
            risk_free_rate,
            frontier,
            monte_carlo,
            best_outcome,
            missing_assets,
            degenerate_pairs,
        })
    }

    /// True when every asset had enough data for defined statistics and
    /// every pairwise correlation is defined.
    pub fn is_complete(&self) -> bool {
        self.missing_assets.is_empty() && self.degenerate_pairs.is_empty()
    }

    /// Point with the highest finite Sharpe ratio across frontier and cloud.
    pub fn max_sharpe(&self) -> Option<&PortfolioPoint> {
        self.points()
            .filter(|p| p.metrics.sharpe_ratio.is_finite())
            .max_by(|a, b| a.metrics.sharpe_ratio.total_cmp(&b.metrics.sharpe_ratio))
    }

    /// Point with the lowest finite volatility across frontier and cloud.
    pub fn min_volatility(&self) -> Option<&PortfolioPoint> {
        self.points()
            .filter(|p| p.metrics.volatility.is_finite())
            .min_by(|a, b| a.metrics.volatility.total_cmp(&b.metrics.volatility))
    }

    fn points(&self) -> impl Iterator<Item = &PortfolioPoint> {
        self.frontier.iter().chain(&self.monte_carlo)
    }

    /// Persistence record for a selected point.
    pub fn record_for(
        &self,
        point: &PortfolioPoint,
        range: DateRange,
        interval: Interval,
        now: DateTime<Utc>,
    ) -> Result<SavedPortfolio> {
        let best = self.best_outcome.ok_or_else(|| {
            Error::InsufficientData("No asset has a defined mean return".to_string())
        })?;

        let allocations: Vec<(String, f64)> = self
            .symbols
            .iter()
            .cloned()
            .zip(point.weights.iter().copied())
            .collect();

        SavedPortfolio::new(&allocations, &point.metrics, best, range, interval, now)
    }
}

/// Pairs of assets that both have data but no defined correlation.
fn degenerate_pairs(
    symbols: &[String],
    statistics: &[AssetStatistics],
    correlation: &CorrelationMatrix,
) -> Vec<[String; 2]> {
    let mut pairs = Vec::new();
    for i in 0..symbols.len() {
        for j in (i + 1)..symbols.len() {
            let both_have_data = statistics[i].has_data() && statistics[j].has_data();
            if both_have_data && !correlation.get(i, j).is_finite() {
                pairs.push([symbols[i].clone(), symbols[j].clone()]);
            }
        }
    }
    pairs
}
