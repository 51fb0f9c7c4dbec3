//! Saved portfolios and watchlist.
//!
//! The book persists a user's saved portfolio records and watched assets to a
//! single JSON file.

mod store;

pub use store::{BookData, PortfolioBook};
