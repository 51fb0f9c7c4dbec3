//! EquiFi Core - Portfolio statistics and mean-variance optimization.
//!
//! This crate provides the computational core of the EquiFi portfolio tool:
//!
//! - **Statistics**: Percentage returns, sample volatility, covariance, correlation matrices
//! - **Optimizer**: Penalty-method gradient descent for a target return
//! - **Efficient frontier**: Minimum-variance portfolios across the achievable returns
//! - **Monte Carlo**: Randomly weighted portfolios for the feasible return/risk cloud
//! - **Portfolio book**: Saved portfolios and watchlist persisted to JSON
//! - **Re-evaluation**: Saved weights applied to a window ending today
//!
//! # Example
//!
//! ```rust
//! use equifi_core::optimizer::AssetUniverse;
//! use equifi_core::stats::compute_returns;
//!
//! let a = compute_returns(&[100.0, 110.0, 105.0, 108.0]);
//! let b = compute_returns(&[50.0, 49.0, 51.0, 53.0]);
//!
//! let universe = AssetUniverse::from_returns(&[a, b]);
//! let metrics = universe.metrics(&[0.5, 0.5], 0.0)?;
//! println!("return {:.2}% vol {:.2}%", metrics.expected_return, metrics.volatility);
//! # Ok::<(), equifi_core::Error>(())
//! ```

pub mod analysis;
pub mod book;
pub mod optimizer;
pub mod outcome;
pub mod reevaluate;
pub mod stats;
pub mod types;

// Re-export commonly used types
pub use types::{
    ApiResponse, AssetStatistics, DateRange, Interval, PortfolioMetrics, PortfolioPoint,
    PriceBar, SavedAsset, SavedPortfolio,
};

// Re-export main functionality
pub use analysis::{AnalysisSettings, PortfolioAnalysis};
pub use book::PortfolioBook;
pub use optimizer::{
    efficient_frontier, monte_carlo_portfolios, optimize_for_target, AssetUniverse,
    OptimizedPortfolio, OptimizerConfig,
};
pub use outcome::best_outcome;
pub use reevaluate::Reevaluation;
pub use stats::{
    aggregate_daily, compute_returns, correlation_matrix, covariance, mean_return,
    standard_deviation, CorrelationMatrix,
};

/// Error types for equifi-core operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Portfolio not found at index {0}")]
    PortfolioNotFound(usize),

    #[error("Asset is already saved: {0}")]
    AssetAlreadySaved(String),

    #[error("Asset not found in saved assets: {0}")]
    AssetNotFound(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),
}

/// Result type for equifi-core operations.
pub type Result<T> = std::result::Result<T, Error>;
