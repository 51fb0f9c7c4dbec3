//! Monte Carlo sampling of random portfolios.

use rand::Rng;

use super::universe::AssetUniverse;
use crate::types::PortfolioPoint;

/// Half-width of the uniform noise added to each normalized weight.
const WEIGHT_JITTER: f64 = 0.05;

/// Draw one random weighting of `k` assets.
///
/// Uniform draws are normalized, jittered by up to +/-5 percentage points,
/// clipped to [0, 1] and normalized again, in that order.
pub fn sample_weights<R: Rng>(k: usize, rng: &mut R) -> Vec<f64> {
    let mut weights: Vec<f64> = (0..k).map(|_| rng.random::<f64>()).collect();
    normalize(&mut weights);

    for w in weights.iter_mut() {
        *w += (rng.random::<f64>() - 0.5) * 2.0 * WEIGHT_JITTER;
        *w = w.clamp(0.0, 1.0);
    }
    normalize(&mut weights);

    weights
}

/// `count` random portfolios over the universe with their metrics.
pub fn monte_carlo_portfolios<R: Rng>(
    universe: &AssetUniverse,
    risk_free_rate: f64,
    count: usize,
    rng: &mut R,
) -> Vec<PortfolioPoint> {
    if universe.is_empty() {
        return Vec::new();
    }

    (0..count)
        .map(|_| {
            let weights = sample_weights(universe.len(), rng);
            PortfolioPoint {
                metrics: universe.weighted_metrics(&weights, risk_free_rate),
                weights,
            }
        })
        .collect()
}

fn normalize(weights: &mut [f64]) {
    let total: f64 = weights.iter().sum();
    weights.iter_mut().for_each(|w| *w /= total);
}
