//! Market-data HTTP client

use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use serde::de::DeserializeOwned;

use equifi_core::{DateRange, Interval, PriceBar};

use super::types::*;
use crate::config::SessionConfig;

/// Number of hits requested per symbol search
pub const SEARCH_LIMIT: usize = 5;

/// HTTP client for the price-history and treasury-yield services
#[derive(Debug, Clone)]
pub struct MarketDataClient {
    base_url: String,
    api_key: String,
    macro_url: String,
    macro_api_key: String,
    client: Client,
}

impl MarketDataClient {
    /// Create a client from the session configuration
    pub fn new(config: &SessionConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .context("building HTTP client")?;

        Ok(Self {
            base_url: config.market_data_url.trim_end_matches('/').to_string(),
            api_key: config.market_data_api_key.clone(),
            macro_url: config.macro_data_url.trim_end_matches('/').to_string(),
            macro_api_key: config.macro_data_api_key.clone(),
            client,
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // ========================================================================
    // Internal HTTP Methods
    // ========================================================================

    /// Make a GET request
    async fn get<T: DeserializeOwned>(&self, url: String, query: &[(&str, &str)]) -> Result<T> {
        let response = self.client.get(&url).query(query).send().await?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "Request failed: {} {}",
                response.status(),
                response.text().await.unwrap_or_default()
            ));
        }

        Ok(response.json().await?)
    }

    // ========================================================================
    // Price History
    // ========================================================================

    /// Raw chart bars for `symbol` over `range`.
    ///
    /// Daily charts are requested at four-hour resolution; the caller
    /// averages them per day.
    pub async fn historical_chart(
        &self,
        symbol: &str,
        interval: Interval,
        range: DateRange,
    ) -> Result<Vec<HistoricalBar>> {
        let from = range.start.format("%Y-%m-%d").to_string();
        let to = range.end.format("%Y-%m-%d").to_string();
        let url = format!(
            "{}/historical-chart/{}/{}",
            self.base_url,
            interval.fetch_token(),
            symbol
        );

        self.get(
            url,
            &[
                ("from", from.as_str()),
                ("to", to.as_str()),
                ("apikey", self.api_key.as_str()),
            ],
        )
        .await
        .with_context(|| format!("fetching {} {} chart", symbol, interval))
    }

    /// Price bars for `symbol`, dropping bars with unreadable timestamps.
    pub async fn price_bars(
        &self,
        symbol: &str,
        interval: Interval,
        range: DateRange,
    ) -> Result<Vec<PriceBar>> {
        let raw = self.historical_chart(symbol, interval, range).await?;
        let total = raw.len();
        let bars: Vec<PriceBar> = raw.iter().filter_map(HistoricalBar::to_price_bar).collect();

        if bars.len() < total {
            tracing::warn!(symbol, dropped = total - bars.len(), "unparseable bar dates");
        }
        Ok(bars)
    }

    // ========================================================================
    // Search
    // ========================================================================

    /// Symbol search.
    pub async fn search(&self, query: &str) -> Result<Vec<SearchHit>> {
        let limit = SEARCH_LIMIT.to_string();
        let url = format!("{}/search", self.base_url);
        self.get(
            url,
            &[
                ("query", query),
                ("limit", limit.as_str()),
                ("apikey", self.api_key.as_str()),
            ],
        )
        .await
    }

    /// Company profile, `None` when the service knows no such symbol.
    pub async fn profile(&self, symbol: &str) -> Result<Option<CompanyProfile>> {
        let url = format!("{}/profile/{}", self.base_url, symbol);
        let profiles: Vec<CompanyProfile> =
            self.get(url, &[("apikey", self.api_key.as_str())]).await?;
        Ok(profiles.into_iter().next())
    }

    // ========================================================================
    // Risk-free Rate
    // ========================================================================

    /// Latest monthly 3-month treasury yield, in percent.
    pub async fn treasury_yield(&self) -> Result<f64> {
        let url = format!("{}/query", self.macro_url);
        let response: TreasuryYieldResponse = self
            .get(
                url,
                &[
                    ("function", "TREASURY_YIELD"),
                    ("interval", "monthly"),
                    ("maturity", "3month"),
                    ("apikey", self.macro_api_key.as_str()),
                ],
            )
            .await?;

        response
            .latest()
            .ok_or_else(|| anyhow!("Treasury yield response has no data"))
    }
}
