//! Mean-variance portfolio optimization.
//!
//! - **Universe**: per-asset statistics plus correlations, and the portfolio metrics they imply
//! - **Gradient descent**: penalty-method minimum variance for a target return
//! - **Frontier**: minimum-variance portfolios across the achievable return range
//! - **Monte Carlo**: randomly weighted portfolios for the feasible region

mod frontier;
mod gradient;
mod monte_carlo;
mod universe;

pub use frontier::{efficient_frontier, frontier_targets};
pub use gradient::{optimize_for_target, uniform_weights, OptimizedPortfolio, OptimizerConfig};
pub use monte_carlo::{monte_carlo_portfolios, sample_weights};
pub use universe::{portfolio_metrics, AssetUniverse};

/// Number of target returns on the efficient frontier.
pub const FRONTIER_POINTS: usize = 100;

/// Number of random portfolios in a Monte Carlo run.
pub const MONTE_CARLO_SAMPLES: usize = 500;
