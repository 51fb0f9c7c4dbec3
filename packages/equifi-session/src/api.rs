//! HTTP access to the market-data services
//!
//! Price history and symbol search come from one service, the treasury yield
//! used as risk-free rate from another.

pub mod client;
pub mod types;

pub use client::*;
pub use types::*;
