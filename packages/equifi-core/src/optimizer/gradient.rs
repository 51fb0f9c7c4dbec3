//! Penalty-method gradient descent for a target return.
//!
//! Minimizes `variance(w) + penalty * (return(w) - target)^2` with a forward
//! finite-difference gradient and an exponentially decaying learning rate.
//! After each step the weights are divided by their sum; they are not clipped,
//! so individual weights may leave [0, 1].

use serde::{Deserialize, Serialize};

use super::universe::AssetUniverse;
use crate::types::{PortfolioMetrics, PortfolioPoint};
use crate::{Error, Result};

/// Iteration schedule of the optimizer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct OptimizerConfig {
    /// Weight of the squared target-return miss in the objective
    pub penalty: f64,
    /// Forward-difference step
    pub delta: f64,
    /// Initial learning rate
    pub learning_rate: f64,
    /// Per-iteration learning-rate multiplier
    pub decay: f64,
    /// L1 weight change below which the search stops
    pub tolerance: f64,
    /// Iteration cap
    pub max_iterations: usize,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            penalty: 100.0,
            delta: 1e-5,
            learning_rate: 0.001,
            decay: 0.99,
            tolerance: 1e-6,
            max_iterations: 10_000,
        }
    }
}

/// Outcome of one optimizer run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OptimizedPortfolio {
    pub weights: Vec<f64>,
    pub metrics: PortfolioMetrics,
    /// Iterations completed before stopping
    pub iterations: usize,
    /// False when the iteration cap was hit first
    pub converged: bool,
}

impl From<OptimizedPortfolio> for PortfolioPoint {
    fn from(optimized: OptimizedPortfolio) -> Self {
        PortfolioPoint {
            metrics: optimized.metrics,
            weights: optimized.weights,
        }
    }
}

/// `1/k` for each of `k` assets.
pub fn uniform_weights(k: usize) -> Vec<f64> {
    vec![1.0 / k as f64; k]
}

/// Find low-variance weights whose return approaches `target_return`.
///
/// Hitting the iteration cap is not an error: the last state is returned with
/// `converged == false`. The same holds when the objective is not finite (an
/// asset without data), in which case the search stops at once.
pub fn optimize_for_target(
    universe: &AssetUniverse,
    initial_weights: &[f64],
    target_return: f64,
    risk_free_rate: f64,
    config: &OptimizerConfig,
) -> Result<OptimizedPortfolio> {
    if initial_weights.len() != universe.len() {
        return Err(Error::InvalidOperation(format!(
            "Expected {} initial weights, got {}",
            universe.len(),
            initial_weights.len()
        )));
    }

    let objective = |weights: &[f64]| {
        let miss = universe.portfolio_return(weights) - target_return;
        universe.portfolio_variance(weights) + config.penalty * miss.powi(2)
    };

    let mut weights = initial_weights.to_vec();
    let mut learning_rate = config.learning_rate;
    let mut iterations = 0;
    let mut converged = false;

    while iterations < config.max_iterations {
        let gradient = forward_gradient(&weights, config.delta, &objective);
        if gradient.iter().any(|g| !g.is_finite()) {
            tracing::debug!(target_return, iterations, "objective is not finite, stopping");
            break;
        }

        let mut updated: Vec<f64> = weights
            .iter()
            .zip(&gradient)
            .map(|(w, g)| w - learning_rate * g)
            .collect();
        let total: f64 = updated.iter().sum();
        updated.iter_mut().for_each(|w| *w /= total);

        let change: f64 = weights
            .iter()
            .zip(&updated)
            .map(|(old, new)| (old - new).abs())
            .sum();

        weights = updated;

        if change < config.tolerance {
            converged = true;
            break;
        }

        iterations += 1;
        learning_rate *= config.decay;
    }

    if !converged {
        tracing::debug!(
            target_return,
            iterations,
            "optimizer stopped at iteration cap"
        );
    }

    let metrics = universe.weighted_metrics(&weights, risk_free_rate);

    Ok(OptimizedPortfolio {
        weights,
        metrics,
        iterations,
        converged,
    })
}

/// Forward-difference gradient of `objective` at `weights`.
fn forward_gradient(weights: &[f64], delta: f64, objective: impl Fn(&[f64]) -> f64) -> Vec<f64> {
    let current = objective(weights);
    let mut bumped = weights.to_vec();

    (0..weights.len())
        .map(|i| {
            bumped[i] += delta;
            let value = objective(&bumped);
            bumped[i] = weights[i];
            (value - current) / delta
        })
        .collect()
}
