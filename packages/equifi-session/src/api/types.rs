//! Wire types of the market-data services

use serde::{Deserialize, Serialize};

use equifi_core::PriceBar;

// ============================================================================
// Price History
// ============================================================================

/// One bar of a historical chart response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoricalBar {
    pub date: String,
    pub close: f64,
}

impl HistoricalBar {
    /// Typed bar, `None` when the timestamp does not parse.
    pub fn to_price_bar(&self) -> Option<PriceBar> {
        PriceBar::parse_date(&self.date).map(|date| PriceBar::new(date, self.close))
    }
}

// ============================================================================
// Search Types
// ============================================================================

/// Symbol search hit
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    pub symbol: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exchange_short_name: Option<String>,
}

/// Company profile, used for its trading currency
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CompanyProfile {
    pub symbol: String,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub company_name: Option<String>,
}

/// Search result offered to the user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssetSuggestion {
    pub symbol: String,
    pub name: String,
}

// ============================================================================
// Treasury Yield
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreasuryYieldResponse {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub data: Vec<YieldPoint>,
}

/// Values arrive as strings ("5.25")
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YieldPoint {
    pub date: String,
    pub value: String,
}

impl TreasuryYieldResponse {
    /// Most recent yield in percent.
    pub fn latest(&self) -> Option<f64> {
        self.data.first()?.value.trim().parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_historical_bar_parses() {
        let bars: Vec<HistoricalBar> = serde_json::from_str(
            r#"[{"date":"2024-03-01 15:00:00","open":1.0,"close":180.5,"volume":10},
                {"date":"garbage","close":1.0}]"#,
        )
        .unwrap();

        assert_eq!(bars.len(), 2);
        let bar = bars[0].to_price_bar().unwrap();
        assert_eq!(bar.close, 180.5);
        assert!(bars[1].to_price_bar().is_none());
    }

    #[test]
    fn test_search_hit_camel_case() {
        let hit: SearchHit = serde_json::from_str(
            r#"{"symbol":"AAPL","name":"Apple Inc.","currency":"USD","stockExchange":"NASDAQ","exchangeShortName":"NASDAQ"}"#,
        )
        .unwrap();
        assert_eq!(hit.exchange_short_name.as_deref(), Some("NASDAQ"));
    }

    #[test]
    fn test_treasury_latest() {
        let response: TreasuryYieldResponse = serde_json::from_str(
            r#"{"name":"3-Month Treasury","interval":"monthly","unit":"percent",
                "data":[{"date":"2024-05-01","value":"5.46"},{"date":"2024-04-01","value":"5.44"}]}"#,
        )
        .unwrap();
        assert_eq!(response.latest(), Some(5.46));

        let empty = TreasuryYieldResponse {
            name: None,
            data: Vec::new(),
        };
        assert_eq!(empty.latest(), None);
    }
}
