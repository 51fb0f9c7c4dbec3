//! Analysis session.
//!
//! Each [`Session::analyze`] call takes a new generation number. Prices for
//! all assets are fetched concurrently, the analysis runs on the blocking
//! pool, and the result becomes the session's current analysis only if no
//! newer call started in the meantime.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use futures::future::join_all;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::{Mutex, OnceCell};

use equifi_core::analysis::series_returns;
use equifi_core::{AnalysisSettings, PortfolioAnalysis};

use crate::api::AssetSuggestion;
use crate::cache::{AnalysisCache, AnalysisQuery};
use crate::provider::MarketData;

/// Result of an [`Session::analyze`] call.
#[derive(Debug, Clone)]
pub enum AnalysisOutcome {
    /// The analysis for the query, now the session's current one
    Ready(Arc<PortfolioAnalysis>),
    /// A newer query started before this one finished; its result was dropped
    Superseded,
}

impl AnalysisOutcome {
    pub fn ready(self) -> Option<Arc<PortfolioAnalysis>> {
        match self {
            Self::Ready(analysis) => Some(analysis),
            Self::Superseded => None,
        }
    }
}

/// Portfolio analyses over one market-data provider.
pub struct Session<P> {
    pub(crate) provider: Arc<P>,
    settings: AnalysisSettings,
    seed: Option<u64>,
    risk_free_rate: OnceCell<f64>,
    generation: AtomicU64,
    cache: Mutex<AnalysisCache>,
    current: Mutex<Option<(AnalysisQuery, Arc<PortfolioAnalysis>)>>,
    pub(crate) suggestions: Mutex<HashMap<String, Vec<AssetSuggestion>>>,
}

impl<P: MarketData> Session<P> {
    pub fn new(provider: Arc<P>, settings: AnalysisSettings) -> Self {
        Self {
            provider,
            settings,
            seed: None,
            risk_free_rate: OnceCell::new(),
            generation: AtomicU64::new(0),
            cache: Mutex::new(AnalysisCache::default()),
            current: Mutex::new(None),
            suggestions: Mutex::new(HashMap::new()),
        }
    }

    /// Seed the Monte Carlo sampler; every analysis then samples the same
    /// weight vectors.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Use a fixed risk-free rate instead of fetching one.
    pub fn with_risk_free_rate(mut self, rate: f64) -> Self {
        self.risk_free_rate = OnceCell::new_with(Some(rate));
        self
    }

    pub fn settings(&self) -> &AnalysisSettings {
        &self.settings
    }

    /// Risk-free rate in percent, fetched once per session.
    ///
    /// A failed fetch is not cached; the next call tries again.
    pub async fn risk_free_rate(&self) -> Result<f64> {
        self.risk_free_rate
            .get_or_try_init(|| async {
                let rate = self
                    .provider
                    .risk_free_rate()
                    .await
                    .context("loading risk-free rate")?;
                tracing::info!(rate, "risk-free rate loaded");
                Ok::<f64, anyhow::Error>(rate)
            })
            .await
            .copied()
    }

    /// Analyze `query`, serving a cached result when one exists.
    pub async fn analyze(&self, query: AnalysisQuery) -> Result<AnalysisOutcome> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let cached = self.cache.lock().await.get(&query);
        if let Some(analysis) = cached {
            tracing::debug!(symbols = ?query.symbols(), "analysis cache hit");
            return Ok(self.commit(generation, query, analysis).await);
        }

        let risk_free_rate = self.risk_free_rate().await?;
        let return_series = self.fetch_returns(&query).await;

        if !self.is_current(generation) {
            tracing::debug!(generation, "query superseded during fetch");
            return Ok(AnalysisOutcome::Superseded);
        }

        let symbols = query.symbols().to_vec();
        let settings = self.settings;
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let analysis = tokio::task::spawn_blocking(move || {
            PortfolioAnalysis::build(&symbols, &return_series, risk_free_rate, &settings, &mut rng)
        })
        .await
        .context("analysis task failed")??;
        let analysis = Arc::new(analysis);

        self.cache.lock().await.insert(query.clone(), analysis.clone());
        Ok(self.commit(generation, query, analysis).await)
    }

    /// Returns for every asset of `query`, in query order. A failed fetch
    /// yields an empty series.
    pub(crate) async fn fetch_returns(&self, query: &AnalysisQuery) -> Vec<Vec<f64>> {
        let interval = query.interval();
        let range = query.range();

        let fetches = query.symbols().iter().map(|symbol| async move {
            match self.provider.price_history(symbol, interval, range).await {
                Ok(bars) => {
                    tracing::debug!(symbol = %symbol, bars = bars.len(), "price history loaded");
                    series_returns(&bars, interval)
                }
                Err(e) => {
                    tracing::warn!(symbol = %symbol, error = %e, "price history unavailable");
                    Vec::new()
                }
            }
        });

        join_all(fetches).await
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    async fn commit(
        &self,
        generation: u64,
        query: AnalysisQuery,
        analysis: Arc<PortfolioAnalysis>,
    ) -> AnalysisOutcome {
        let mut current = self.current.lock().await;
        if !self.is_current(generation) {
            tracing::debug!(generation, "discarding superseded analysis");
            return AnalysisOutcome::Superseded;
        }

        *current = Some((query, analysis.clone()));
        AnalysisOutcome::Ready(analysis)
    }

    /// Most recently committed analysis.
    pub async fn current(&self) -> Option<Arc<PortfolioAnalysis>> {
        self.current
            .lock()
            .await
            .as_ref()
            .map(|(_, analysis)| analysis.clone())
    }

    /// Query of the most recently committed analysis.
    pub async fn current_query(&self) -> Option<AnalysisQuery> {
        self.current.lock().await.as_ref().map(|(query, _)| query.clone())
    }

    pub async fn invalidate(&self, query: &AnalysisQuery) -> bool {
        self.cache.lock().await.invalidate(query)
    }

    /// Drop cached analyses involving `symbol`.
    pub async fn invalidate_symbol(&self, symbol: &str) -> usize {
        self.cache.lock().await.invalidate_symbol(symbol)
    }

    pub async fn clear_cache(&self) {
        self.cache.lock().await.clear();
        self.suggestions.lock().await.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{query, quick_settings, range, FakeMarket};
    use equifi_core::Interval;

    fn market() -> FakeMarket {
        FakeMarket::new()
            .with_rate(4.5)
            .with_prices("AAA", &[100.0, 101.0, 99.5, 102.0, 104.0, 103.0, 106.0])
            .with_prices("BBB", &[50.0, 50.5, 51.5, 51.0, 52.5, 53.5, 53.0])
            .with_prices("CCC", &[20.0, 20.4, 20.1, 20.9, 21.3, 21.0, 21.8])
    }

    #[tokio::test]
    async fn test_analyze_commits_result() {
        let session = Session::new(Arc::new(market()), quick_settings()).with_seed(7);

        let outcome = session.analyze(query(&["AAA", "BBB"])).await.unwrap();
        let analysis = outcome.ready().unwrap();

        assert_eq!(analysis.symbols, vec!["AAA".to_string(), "BBB".to_string()]);
        assert_eq!(analysis.risk_free_rate, 4.5);
        assert_eq!(analysis.frontier.len(), 5);
        assert_eq!(analysis.monte_carlo.len(), 20);
        assert!(analysis.is_complete());

        let current = session.current().await.unwrap();
        assert!(Arc::ptr_eq(&current, &analysis));
        assert_eq!(session.current_query().await, Some(query(&["AAA", "BBB"])));
    }

    #[tokio::test]
    async fn test_cached_result_skips_fetch() {
        let market = Arc::new(market());
        let session = Session::new(market.clone(), quick_settings()).with_seed(7);

        let first = session.analyze(query(&["AAA", "BBB"])).await.unwrap();
        assert_eq!(market.price_calls(), 2);

        let second = session.analyze(query(&["AAA", "BBB"])).await.unwrap();
        assert_eq!(market.price_calls(), 2);
        assert!(Arc::ptr_eq(&first.ready().unwrap(), &second.ready().unwrap()));

        assert!(session.invalidate(&query(&["AAA", "BBB"])).await);
        session.analyze(query(&["AAA", "BBB"])).await.unwrap();
        assert_eq!(market.price_calls(), 4);
    }

    #[tokio::test]
    async fn test_cache_is_keyed_by_interval() {
        let market = Arc::new(market());
        let session = Session::new(market.clone(), quick_settings()).with_seed(7);

        session.analyze(query(&["AAA", "BBB"])).await.unwrap();
        let hourly = AnalysisQuery::new(&["AAA", "BBB"], range(), Interval::OneHour).unwrap();
        session.analyze(hourly).await.unwrap();
        assert_eq!(market.price_calls(), 4);
    }

    #[tokio::test]
    async fn test_superseded_result_is_discarded() {
        let market = Arc::new(market().gated("CCC"));
        let session = Arc::new(Session::new(market.clone(), quick_settings()).with_seed(7));

        let slow = {
            let session = session.clone();
            tokio::spawn(async move { session.analyze(query(&["CCC", "AAA"])).await })
        };
        market.wait_until_entered().await;

        let fast = session.analyze(query(&["AAA", "BBB"])).await.unwrap();
        assert!(matches!(fast, AnalysisOutcome::Ready(_)));

        market.release();
        let slow = slow.await.unwrap().unwrap();
        assert!(matches!(slow, AnalysisOutcome::Superseded));

        let current = session.current().await.unwrap();
        assert_eq!(current.symbols, vec!["AAA".to_string(), "BBB".to_string()]);
    }

    #[tokio::test]
    async fn test_failed_fetch_marks_asset_missing() {
        let session =
            Session::new(Arc::new(market().failing("BBB")), quick_settings()).with_seed(7);

        let analysis = session
            .analyze(query(&["AAA", "BBB"]))
            .await
            .unwrap()
            .ready()
            .unwrap();

        assert_eq!(analysis.missing_assets, vec!["BBB".to_string()]);
        assert!(!analysis.is_complete());
    }

    #[tokio::test]
    async fn test_risk_free_rate_failure_is_retried() {
        let market = Arc::new(
            FakeMarket::new()
                .with_prices("AAA", &[1.0, 2.0, 3.0])
                .with_prices("BBB", &[3.0, 2.0, 1.0]),
        );
        let session = Session::new(market.clone(), quick_settings());

        assert!(session.analyze(query(&["AAA", "BBB"])).await.is_err());
        assert!(session.risk_free_rate().await.is_err());
        assert_eq!(market.rate_calls(), 2);
        assert!(session.current().await.is_none());
    }

    #[tokio::test]
    async fn test_fixed_risk_free_rate() {
        let market = Arc::new(market());
        let session = Session::new(market.clone(), quick_settings()).with_risk_free_rate(1.25);

        assert_eq!(session.risk_free_rate().await.unwrap(), 1.25);
        assert_eq!(market.rate_calls(), 0);
    }

    #[tokio::test]
    async fn test_risk_free_rate_fetched_once() {
        let market = Arc::new(market());
        let session = Session::new(market.clone(), quick_settings()).with_seed(1);

        session.analyze(query(&["AAA", "BBB"])).await.unwrap();
        session.analyze(query(&["AAA", "CCC"])).await.unwrap();
        assert_eq!(market.rate_calls(), 1);
    }
}
