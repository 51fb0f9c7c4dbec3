//! EquiFi session - market data around the portfolio analysis.
//!
//! Fetches price histories for a selection of two to four assets
//! concurrently, runs [`equifi_core::PortfolioAnalysis`] over them and keeps
//! results keyed by query. A query that is overtaken by a newer one never
//! replaces the newer result. Saved portfolios can be re-run against a
//! window ending today.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use chrono::NaiveDate;
//! use equifi_core::{DateRange, Interval};
//! use equifi_session::{AnalysisQuery, MarketDataClient, Session, SessionConfig};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = SessionConfig::load()?;
//! let client = MarketDataClient::new(&config)?;
//! let session = Session::new(Arc::new(client), config.analysis_settings());
//!
//! let range = DateRange::new(
//!     NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
//!     NaiveDate::from_ymd_opt(2024, 6, 30).unwrap(),
//! )?;
//! let query = AnalysisQuery::new(&["AAPL", "MSFT"], range, Interval::Daily)?;
//! if let Some(analysis) = session.analyze(query).await?.ready() {
//!     println!("{:?}", analysis.max_sharpe());
//! }
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod cache;
pub mod config;
pub mod provider;
pub mod reevaluate;
pub mod search;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

pub use api::{AssetSuggestion, MarketDataClient};
pub use cache::{AnalysisCache, AnalysisQuery};
pub use config::SessionConfig;
pub use provider::MarketData;
pub use session::{AnalysisOutcome, Session};
