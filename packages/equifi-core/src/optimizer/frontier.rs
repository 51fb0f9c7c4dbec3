//! Efficient frontier construction.

use super::gradient::{optimize_for_target, uniform_weights, OptimizerConfig};
use super::universe::AssetUniverse;
use crate::types::PortfolioPoint;
use crate::Result;

/// Evenly spaced target returns between the lowest and highest defined asset
/// mean return, both ends included.
///
/// Assets whose mean return is NaN (no data) are ignored. Returns an empty
/// vector when no asset has a defined mean return.
pub fn frontier_targets(mean_returns: &[f64], points: usize) -> Vec<f64> {
    let valid: Vec<f64> = mean_returns
        .iter()
        .copied()
        .filter(|r| r.is_finite())
        .collect();

    if valid.is_empty() || points == 0 {
        return Vec::new();
    }

    let min = valid.iter().copied().fold(f64::INFINITY, f64::min);
    let max = valid.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    if points == 1 {
        return vec![min];
    }

    let last = (points - 1) as f64;
    (0..points)
        .map(|i| min + (max - min) * (i as f64 / last))
        .collect()
}

/// Minimum-variance portfolio for each of `points` target returns.
///
/// Every target is optimized from a fresh uniform weighting.
pub fn efficient_frontier(
    universe: &AssetUniverse,
    risk_free_rate: f64,
    points: usize,
    config: &OptimizerConfig,
) -> Result<Vec<PortfolioPoint>> {
    let targets = frontier_targets(universe.mean_returns(), points);
    if targets.is_empty() {
        tracing::debug!("no asset has a defined mean return, frontier is empty");
        return Ok(Vec::new());
    }

    let start = uniform_weights(universe.len());
    targets
        .into_iter()
        .map(|target| {
            optimize_for_target(universe, &start, target, risk_free_rate, config)
                .map(PortfolioPoint::from)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimizer::FRONTIER_POINTS;
    use crate::stats::CorrelationMatrix;
    use approx::assert_relative_eq;

    #[test]
    fn test_targets_are_inclusive_and_even() {
        let targets = frontier_targets(&[1.5, 0.5, 1.0], FRONTIER_POINTS);

        assert_eq!(targets.len(), 100);
        assert_relative_eq!(targets[0], 0.5);
        assert_relative_eq!(targets[99], 1.5, epsilon = 1e-12);
        assert_relative_eq!(targets[1] - targets[0], 1.0 / 99.0, epsilon = 1e-12);
    }

    #[test]
    fn test_targets_skip_undefined_returns() {
        let targets = frontier_targets(&[f64::NAN, 2.0, 1.0], 3);
        assert_eq!(targets, vec![1.0, 1.5, 2.0]);
    }

    #[test]
    fn test_targets_without_valid_returns() {
        assert!(frontier_targets(&[f64::NAN, f64::NAN], 100).is_empty());
        assert!(frontier_targets(&[], 100).is_empty());
    }

    #[test]
    fn test_efficient_frontier_two_assets() {
        let universe =
            AssetUniverse::new(vec![0.5, 1.5], vec![2.0, 2.0], CorrelationMatrix::identity(2))
                .unwrap();

        let frontier =
            efficient_frontier(&universe, 0.0, FRONTIER_POINTS, &OptimizerConfig::default())
                .unwrap();

        assert_eq!(frontier.len(), FRONTIER_POINTS);
        for point in &frontier {
            assert_eq!(point.weights.len(), 2);
            assert_relative_eq!(point.weights.iter().sum::<f64>(), 1.0, epsilon = 1e-9);
            assert!(point.metrics.volatility >= 0.0);
        }
        assert!(
            frontier[0].metrics.expected_return < frontier[99].metrics.expected_return
        );
    }

    #[test]
    fn test_efficient_frontier_with_missing_asset_stops_early() {
        let universe = AssetUniverse::from_returns(&[vec![1.0, 2.0, 3.0], Vec::new()]);

        let frontier =
            efficient_frontier(&universe, 0.0, FRONTIER_POINTS, &OptimizerConfig::default())
                .unwrap();

        assert_eq!(frontier.len(), FRONTIER_POINTS);
        for point in &frontier {
            // Left at the uniform start instead of iterating on NaN
            assert_eq!(point.weights, vec![0.5, 0.5]);
            assert!(!point.metrics.is_finite());
        }
    }

    #[test]
    fn test_efficient_frontier_without_data_is_empty() {
        let universe = AssetUniverse::from_returns(&[Vec::new(), Vec::new()]);

        let frontier =
            efficient_frontier(&universe, 0.0, FRONTIER_POINTS, &OptimizerConfig::default())
                .unwrap();

        assert!(frontier.is_empty());
    }
}
