//! In-memory market data for session tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use anyhow::{anyhow, bail, Result};
use chrono::{Duration, NaiveDate};
use tokio::sync::Notify;

use equifi_core::{AnalysisSettings, DateRange, Interval, PriceBar};

use crate::api::{CompanyProfile, SearchHit};
use crate::cache::AnalysisQuery;
use crate::provider::MarketData;

pub fn range() -> DateRange {
    DateRange::new(
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
    )
    .unwrap()
}

pub fn query(symbols: &[&str]) -> AnalysisQuery {
    AnalysisQuery::new(symbols, range(), Interval::Daily).unwrap()
}

pub fn quick_settings() -> AnalysisSettings {
    AnalysisSettings {
        frontier_points: 5,
        monte_carlo_samples: 20,
        ..AnalysisSettings::default()
    }
}

/// Daily closes per symbol, with call counters and an optional gate that
/// holds one symbol's fetch until released.
#[derive(Default)]
pub struct FakeMarket {
    closes: HashMap<String, Vec<f64>>,
    failing: HashSet<String>,
    gated: Option<String>,
    entered: Notify,
    gate: Notify,
    rate: Option<f64>,
    hits: Vec<SearchHit>,
    currencies: HashMap<String, String>,
    price_calls: AtomicUsize,
    requested: Mutex<Vec<DateRange>>,
    rate_calls: AtomicUsize,
    search_calls: AtomicUsize,
}

impl FakeMarket {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prices(mut self, symbol: &str, closes: &[f64]) -> Self {
        self.closes.insert(symbol.to_string(), closes.to_vec());
        self
    }

    pub fn with_rate(mut self, rate: f64) -> Self {
        self.rate = Some(rate);
        self
    }

    pub fn failing(mut self, symbol: &str) -> Self {
        self.failing.insert(symbol.to_string());
        self
    }

    pub fn gated(mut self, symbol: &str) -> Self {
        self.gated = Some(symbol.to_string());
        self
    }

    /// Search hit; `currency` of `None` means no profile exists.
    pub fn with_hit(mut self, symbol: &str, name: &str, currency: Option<&str>) -> Self {
        self.hits.push(SearchHit {
            symbol: symbol.to_string(),
            name: name.to_string(),
            currency: None,
            exchange_short_name: None,
        });
        if let Some(currency) = currency {
            self.currencies.insert(symbol.to_string(), currency.to_string());
        }
        self
    }

    /// Resolves once the gated symbol's fetch has started.
    pub async fn wait_until_entered(&self) {
        self.entered.notified().await;
    }

    pub fn release(&self) {
        self.gate.notify_one();
    }

    pub fn price_calls(&self) -> usize {
        self.price_calls.load(Ordering::SeqCst)
    }

    /// Ranges of every price request so far.
    pub fn requested_ranges(&self) -> Vec<DateRange> {
        self.requested.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn rate_calls(&self) -> usize {
        self.rate_calls.load(Ordering::SeqCst)
    }

    pub fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }
}

impl MarketData for FakeMarket {
    async fn price_history(
        &self,
        symbol: &str,
        _interval: Interval,
        range: DateRange,
    ) -> Result<Vec<PriceBar>> {
        self.price_calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut requested) = self.requested.lock() {
            requested.push(range);
        }

        if self.gated.as_deref() == Some(symbol) {
            self.entered.notify_one();
            self.gate.notified().await;
        }
        if self.failing.contains(symbol) {
            bail!("service unavailable for {}", symbol);
        }

        let start = range.start.and_hms_opt(0, 0, 0).ok_or_else(|| anyhow!("bad start"))?;
        Ok(self
            .closes
            .get(symbol)
            .map(|closes| {
                closes
                    .iter()
                    .enumerate()
                    .map(|(day, close)| PriceBar::new(start + Duration::days(day as i64), *close))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn risk_free_rate(&self) -> Result<f64> {
        self.rate_calls.fetch_add(1, Ordering::SeqCst);
        self.rate.ok_or_else(|| anyhow!("treasury yield unavailable"))
    }

    async fn search(&self, _query: &str) -> Result<Vec<SearchHit>> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.hits.clone())
    }

    async fn profile(&self, symbol: &str) -> Result<Option<CompanyProfile>> {
        Ok(self.currencies.get(symbol).map(|currency| CompanyProfile {
            symbol: symbol.to_string(),
            currency: currency.clone(),
            company_name: None,
        }))
    }
}
