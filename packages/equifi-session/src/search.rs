//! Asset search.
//!
//! Only assets traded in US dollars are offered. Results are cached per query
//! text for the life of the session.

use anyhow::Result;
use futures::future::join_all;

use crate::api::AssetSuggestion;
use crate::provider::MarketData;
use crate::session::Session;

/// Currency every offered asset trades in
pub const SUPPORTED_CURRENCY: &str = "USD";

impl<P: MarketData> Session<P> {
    /// Suggestions for `query`. Blank queries yield nothing.
    pub async fn search_assets(&self, query: &str) -> Result<Vec<AssetSuggestion>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let cached = self.suggestions.lock().await.get(query).cloned();
        if let Some(suggestions) = cached {
            return Ok(suggestions);
        }

        let hits = self.provider.search(query).await?;
        let profiles = join_all(hits.iter().map(|hit| self.provider.profile(&hit.symbol))).await;

        let suggestions: Vec<AssetSuggestion> = hits
            .into_iter()
            .zip(profiles)
            .filter_map(|(hit, profile)| match profile {
                Ok(Some(profile)) if profile.currency == SUPPORTED_CURRENCY => {
                    Some(AssetSuggestion {
                        symbol: hit.symbol,
                        name: hit.name,
                    })
                }
                Ok(_) => None,
                Err(e) => {
                    tracing::warn!(symbol = %hit.symbol, error = %e, "profile lookup failed");
                    None
                }
            })
            .collect();

        tracing::debug!(query, found = suggestions.len(), "asset search");
        self.suggestions
            .lock()
            .await
            .insert(query.to_string(), suggestions.clone());
        Ok(suggestions)
    }
}
