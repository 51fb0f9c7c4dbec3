//! Saved portfolios against current prices.
//!
//! A saved portfolio is re-run over a window of the same length ending
//! today, at its stored interval and with its stored weights. The session's
//! current analysis and cache are left alone.

use anyhow::Result;
use chrono::NaiveDate;

use equifi_core::{Reevaluation, SavedPortfolio};

use crate::cache::AnalysisQuery;
use crate::provider::MarketData;
use crate::session::Session;

impl<P: MarketData> Session<P> {
    /// Fresh metrics for `saved` over the window ending on `today`, with
    /// their change against the stored values.
    pub async fn reevaluate(
        &self,
        saved: &SavedPortfolio,
        today: NaiveDate,
    ) -> Result<Reevaluation> {
        let range = saved.rolled_range(today)?;
        let query = AnalysisQuery::new(saved.symbols().as_slice(), range, saved.interval)?;

        let risk_free_rate = self.risk_free_rate().await?;
        let return_series = self.fetch_returns(&query).await;

        let reevaluation = Reevaluation::compute(
            saved,
            range,
            &return_series,
            risk_free_rate,
            self.settings().best_outcome_percentile,
        )?;
        tracing::info!(
            symbols = ?query.symbols(),
            expected_return_diff = reevaluation.expected_return_diff,
            best_outcome_diff = ?reevaluation.best_outcome_diff,
            "saved portfolio checked"
        );
        Ok(reevaluation)
    }
}
