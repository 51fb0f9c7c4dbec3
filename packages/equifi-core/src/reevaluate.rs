//! Saved portfolios re-run over a current window.
//!
//! The stored weights are kept fixed; only the statistics they are applied
//! to change. The result carries how far expected return and best outcome
//! moved from the stored values.

use serde::{Deserialize, Serialize};

use crate::optimizer::AssetUniverse;
use crate::outcome::best_outcome;
use crate::types::{DateRange, PortfolioMetrics, SavedPortfolio};
use crate::{Error, Result};

/// Fresh metrics for a saved portfolio and their change against the record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Reevaluation {
    pub range: DateRange,
    pub metrics: PortfolioMetrics,
    pub best_outcome: Option<f64>,
    /// New expected return minus the stored one
    pub expected_return_diff: f64,
    /// New best outcome minus the stored one
    pub best_outcome_diff: Option<f64>,
    pub missing_assets: Vec<String>,
}

impl Reevaluation {
    /// Apply `saved`'s weights to `return_series`, one series per stored
    /// asset in record order.
    pub fn compute(
        saved: &SavedPortfolio,
        range: DateRange,
        return_series: &[Vec<f64>],
        risk_free_rate: f64,
        percentile: f64,
    ) -> Result<Self> {
        let symbols = saved.symbols();
        if symbols.len() != return_series.len() {
            return Err(Error::InvalidOperation(format!(
                "{} stored assets but {} return series",
                symbols.len(),
                return_series.len()
            )));
        }

        let universe = AssetUniverse::from_returns(return_series);
        let metrics = universe.metrics(&saved.weights(), risk_free_rate)?;

        let missing_assets: Vec<String> = symbols
            .into_iter()
            .zip(universe.statistics())
            .filter(|(_, stats)| !stats.has_data())
            .map(|(symbol, _)| symbol)
            .collect();
        if !missing_assets.is_empty() {
            tracing::warn!(?missing_assets, "assets without usable return data");
        }

        let defined_means: Vec<f64> = universe
            .mean_returns()
            .iter()
            .copied()
            .filter(|r| r.is_finite())
            .collect();
        let best_outcome = best_outcome(percentile, &defined_means);

        let reevaluation = Self {
            range,
            metrics,
            best_outcome,
            expected_return_diff: metrics.expected_return - saved.expected_return,
            best_outcome_diff: best_outcome.map(|best| best - saved.best_outcome),
            missing_assets,
        };
        tracing::debug!(
            start = %range.start,
            end = %range.end,
            expected_return_diff = reevaluation.expected_return_diff,
            "portfolio re-evaluated"
        );
        Ok(reevaluation)
    }

    /// True when the new expected return and best outcome are both defined.
    pub fn is_complete(&self) -> bool {
        self.missing_assets.is_empty()
            && self.metrics.expected_return.is_finite()
            && self.best_outcome.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::BEST_OUTCOME_PERCENTILE;
    use crate::stats::compute_returns;
    use crate::types::Interval;
    use chrono::{NaiveDate, Utc};

    fn range() -> DateRange {
        DateRange::new(
            NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 5, 7).unwrap(),
        )
        .unwrap()
    }

    fn saved() -> SavedPortfolio {
        let metrics = PortfolioMetrics {
            expected_return: 1.0,
            volatility: 2.0,
            sharpe_ratio: 0.5,
        };
        SavedPortfolio::new(
            &[("AAA".to_string(), 0.5), ("BBB".to_string(), 0.5)],
            &metrics,
            3.0,
            range(),
            Interval::Daily,
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn test_diffs_against_stored_values() {
        // Mean returns 10% and 2%
        let series = vec![
            compute_returns(&[100.0, 110.0, 121.0]),
            compute_returns(&[100.0, 102.0, 104.04]),
        ];

        let result =
            Reevaluation::compute(&saved(), range(), &series, 0.0, BEST_OUTCOME_PERCENTILE)
                .unwrap();

        assert!((result.metrics.expected_return - 6.0).abs() < 1e-9);
        assert!((result.expected_return_diff - 5.0).abs() < 1e-9);
        assert!((result.best_outcome.unwrap() - 10.0).abs() < 1e-9);
        assert!((result.best_outcome_diff.unwrap() - 7.0).abs() < 1e-9);
        assert!(result.is_complete());
    }

    #[test]
    fn test_missing_asset_is_reported() {
        let series = vec![compute_returns(&[100.0, 110.0, 121.0]), Vec::new()];

        let result =
            Reevaluation::compute(&saved(), range(), &series, 0.0, BEST_OUTCOME_PERCENTILE)
                .unwrap();

        assert_eq!(result.missing_assets, vec!["BBB".to_string()]);
        assert!(result.metrics.expected_return.is_nan());
        assert!(!result.is_complete());
    }

    #[test]
    fn test_series_count_must_match_record() {
        let series = vec![compute_returns(&[100.0, 110.0, 121.0])];
        let result =
            Reevaluation::compute(&saved(), range(), &series, 0.0, BEST_OUTCOME_PERCENTILE);
        assert!(matches!(result, Err(Error::InvalidOperation(_))));
    }
}
