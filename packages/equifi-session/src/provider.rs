//! Source of prices, symbol metadata and the risk-free rate.

use std::future::Future;

use anyhow::Result;

use equifi_core::{DateRange, Interval, PriceBar};

use crate::api::{CompanyProfile, MarketDataClient, SearchHit};

/// Everything a session needs from the outside world.
pub trait MarketData: Send + Sync {
    /// Price bars of `symbol` at `interval` over `range`, in provider order.
    /// Returns are computed over the bars as given; nothing is re-sorted.
    fn price_history(
        &self,
        symbol: &str,
        interval: Interval,
        range: DateRange,
    ) -> impl Future<Output = Result<Vec<PriceBar>>> + Send;

    /// Risk-free rate in percent.
    fn risk_free_rate(&self) -> impl Future<Output = Result<f64>> + Send;

    fn search(&self, query: &str) -> impl Future<Output = Result<Vec<SearchHit>>> + Send;

    fn profile(&self, symbol: &str) -> impl Future<Output = Result<Option<CompanyProfile>>> + Send;
}

impl MarketData for MarketDataClient {
    async fn price_history(
        &self,
        symbol: &str,
        interval: Interval,
        range: DateRange,
    ) -> Result<Vec<PriceBar>> {
        self.price_bars(symbol, interval, range).await
    }

    async fn risk_free_rate(&self) -> Result<f64> {
        self.treasury_yield().await
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchHit>> {
        MarketDataClient::search(self, query).await
    }

    async fn profile(&self, symbol: &str) -> Result<Option<CompanyProfile>> {
        MarketDataClient::profile(self, symbol).await
    }
}
