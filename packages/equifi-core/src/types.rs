//! Core data types for the EquiFi optimizer.

use chrono::{DateTime, Days, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// Sampling interval of a historical price series.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Interval {
    #[serde(rename = "1min")]
    OneMinute,
    #[serde(rename = "5min")]
    FiveMinutes,
    #[serde(rename = "15min")]
    FifteenMinutes,
    #[serde(rename = "30min")]
    ThirtyMinutes,
    #[serde(rename = "1hour")]
    OneHour,
    #[serde(rename = "4hour")]
    FourHours,
    Daily,
}

impl Interval {
    /// Intraday intervals offered for single-day ranges.
    pub const INTRADAY: [Interval; 6] = [
        Interval::OneMinute,
        Interval::FiveMinutes,
        Interval::FifteenMinutes,
        Interval::ThirtyMinutes,
        Interval::OneHour,
        Interval::FourHours,
    ];

    /// Label used in records and on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::OneMinute => "1min",
            Interval::FiveMinutes => "5min",
            Interval::FifteenMinutes => "15min",
            Interval::ThirtyMinutes => "30min",
            Interval::OneHour => "1hour",
            Interval::FourHours => "4hour",
            Interval::Daily => "Daily",
        }
    }

    /// Interval requested from the market-data provider.
    ///
    /// Daily series are built from 4-hour bars, see [`crate::stats::aggregate_daily`].
    pub fn fetch_token(&self) -> &'static str {
        match self {
            Interval::Daily => Interval::FourHours.as_str(),
            other => other.as_str(),
        }
    }

    /// Whether fetched bars must be averaged into one close per day.
    pub fn needs_daily_aggregation(&self) -> bool {
        matches!(self, Interval::Daily)
    }

    /// Intervals that make sense for a date range of the given length.
    pub fn options_for_range(days: i64) -> Vec<Interval> {
        if days <= 1 {
            Self::INTRADAY.to_vec()
        } else if days <= 7 {
            vec![Interval::OneHour, Interval::FourHours, Interval::Daily]
        } else {
            vec![Interval::Daily]
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Interval {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "1min" | "1m" => Ok(Interval::OneMinute),
            "5min" | "5m" => Ok(Interval::FiveMinutes),
            "15min" | "15m" => Ok(Interval::FifteenMinutes),
            "30min" | "30m" => Ok(Interval::ThirtyMinutes),
            "1hour" => Ok(Interval::OneHour),
            "4hour" => Ok(Interval::FourHours),
            "Daily" | "daily" | "1day" => Ok(Interval::Daily),
            other => Err(Error::InvalidOperation(format!("Unknown interval: {}", other))),
        }
    }
}

/// Inclusive calendar range of a historical query.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Create a range, rejecting an end date before the start date.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if end < start {
            return Err(Error::InvalidOperation(format!(
                "End date {} is before start date {}",
                end, start
            )));
        }
        Ok(Self { start, end })
    }

    /// Number of days between start and end.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days()
    }
}

/// One closing price of an asset.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PriceBar {
    pub date: NaiveDateTime,
    pub close: f64,
}

impl PriceBar {
    pub fn new(date: NaiveDateTime, close: f64) -> Self {
        Self { date, close }
    }

    /// Parse a provider date (`YYYY-MM-DD HH:MM:SS` or `YYYY-MM-DD`).
    pub fn parse_date(raw: &str) -> Option<NaiveDateTime> {
        let raw = raw.trim();
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
            .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
            .ok()
            .or_else(|| {
                NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                    .ok()
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
            })
    }
}

/// Return statistics of a single asset.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct AssetStatistics {
    /// Mean period return, in percent
    pub mean_return: f64,
    /// Sample standard deviation of period returns, in percent
    pub volatility: f64,
}

impl AssetStatistics {
    /// False when the asset had no usable data and its statistics are NaN.
    pub fn has_data(&self) -> bool {
        self.mean_return.is_finite() && self.volatility.is_finite()
    }
}

/// Expected return, volatility and Sharpe ratio of a weighted portfolio.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PortfolioMetrics {
    #[serde(rename = "return")]
    pub expected_return: f64,
    pub volatility: f64,
    pub sharpe_ratio: f64,
}

impl PortfolioMetrics {
    /// False when any metric degenerated to NaN or infinity.
    pub fn is_finite(&self) -> bool {
        self.expected_return.is_finite()
            && self.volatility.is_finite()
            && self.sharpe_ratio.is_finite()
    }
}

/// A portfolio on the frontier or in the Monte Carlo cloud.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PortfolioPoint {
    #[serde(flatten)]
    pub metrics: PortfolioMetrics,
    pub weights: Vec<f64>,
}

/// Saved portfolio as handed to persistence.
///
/// Serializes to the flat `asset1Name`/`asset1Percent` record layout; up to
/// four assets are stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SavedPortfolio {
    pub asset1_name: String,
    pub asset1_percent: f64,
    pub asset2_name: String,
    pub asset2_percent: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset3_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset3_percent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset4_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset4_percent: Option<f64>,
    pub expected_return: f64,
    pub risk: f64,
    pub best_outcome: f64,
    pub date_created: DateTime<Utc>,
    pub date_updated: DateTime<Utc>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub interval: Interval,
}

impl SavedPortfolio {
    /// Build a record from symbol/weight pairs. Percentages are `weight * 100`.
    pub fn new(
        allocations: &[(String, f64)],
        metrics: &PortfolioMetrics,
        best_outcome: f64,
        range: DateRange,
        interval: Interval,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        if !(2..=4).contains(&allocations.len()) {
            return Err(Error::InvalidOperation(format!(
                "A saved portfolio holds 2 to 4 assets, got {}",
                allocations.len()
            )));
        }

        let entry = |i: usize| {
            allocations
                .get(i)
                .map(|(name, weight)| (name.to_uppercase(), weight * 100.0))
        };
        let (asset1_name, asset1_percent) = entry(0).unwrap_or_default();
        let (asset2_name, asset2_percent) = entry(1).unwrap_or_default();
        let third = entry(2);
        let fourth = entry(3);

        Ok(Self {
            asset1_name,
            asset1_percent,
            asset2_name,
            asset2_percent,
            asset3_name: third.as_ref().map(|(n, _)| n.clone()),
            asset3_percent: third.map(|(_, p)| p),
            asset4_name: fourth.as_ref().map(|(n, _)| n.clone()),
            asset4_percent: fourth.map(|(_, p)| p),
            expected_return: metrics.expected_return,
            risk: metrics.volatility,
            best_outcome,
            date_created: now,
            date_updated: now,
            start_date: range.start,
            end_date: range.end,
            interval,
        })
    }

    /// Symbol and percentage of every stored asset, in order.
    pub fn allocations(&self) -> Vec<(&str, f64)> {
        let mut out = vec![
            (self.asset1_name.as_str(), self.asset1_percent),
            (self.asset2_name.as_str(), self.asset2_percent),
        ];
        if let (Some(name), Some(pct)) = (&self.asset3_name, self.asset3_percent) {
            out.push((name.as_str(), pct));
        }
        if let (Some(name), Some(pct)) = (&self.asset4_name, self.asset4_percent) {
            out.push((name.as_str(), pct));
        }
        out
    }

    pub fn symbols(&self) -> Vec<String> {
        self.allocations()
            .iter()
            .map(|(name, _)| name.to_string())
            .collect()
    }

    /// Stored percentages as weights summing to about 1.
    pub fn weights(&self) -> Vec<f64> {
        self.allocations().iter().map(|(_, pct)| pct / 100.0).collect()
    }

    /// Range the portfolio was computed over.
    pub fn range(&self) -> DateRange {
        DateRange {
            start: self.start_date,
            end: self.end_date,
        }
    }

    /// A window as long as the saved one, ending on `today`.
    pub fn rolled_range(&self, today: NaiveDate) -> Result<DateRange> {
        let span = self.range().days().unsigned_abs();
        let start = today.checked_sub_days(Days::new(span)).ok_or_else(|| {
            Error::InvalidOperation(format!("Cannot roll a {}-day window back from {}", span, today))
        })?;
        DateRange::new(start, today)
    }
}

/// An asset on the user's watchlist.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SavedAsset {
    pub asset_symbol: String,
    pub interval: Interval,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl SavedAsset {
    pub fn new(symbol: &str, interval: Interval, range: DateRange) -> Self {
        Self {
            asset_symbol: symbol.trim().to_uppercase(),
            interval,
            start_date: range.start,
            end_date: range.end,
        }
    }
}

/// API response wrapper for success cases.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Create a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    /// Create an error response.
    pub fn err(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn range() -> DateRange {
        DateRange::new(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_interval_fetch_token() {
        assert_eq!(Interval::Daily.fetch_token(), "4hour");
        assert_eq!(Interval::OneHour.fetch_token(), "1hour");
        assert!(Interval::Daily.needs_daily_aggregation());
        assert!(!Interval::FourHours.needs_daily_aggregation());
    }

    #[test]
    fn test_interval_options_for_range() {
        assert_eq!(Interval::options_for_range(1).len(), 6);
        assert_eq!(
            Interval::options_for_range(7),
            vec![Interval::OneHour, Interval::FourHours, Interval::Daily]
        );
        assert_eq!(Interval::options_for_range(90), vec![Interval::Daily]);
    }

    #[test]
    fn test_interval_parse_and_serde() {
        assert_eq!("1m".parse::<Interval>().unwrap(), Interval::OneMinute);
        assert_eq!("Daily".parse::<Interval>().unwrap(), Interval::Daily);
        assert!("weekly".parse::<Interval>().is_err());

        let json = serde_json::to_string(&Interval::FifteenMinutes).unwrap();
        assert_eq!(json, "\"15min\"");
    }

    #[test]
    fn test_date_range_rejects_inverted() {
        let start = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert!(matches!(
            DateRange::new(start, end),
            Err(Error::InvalidOperation(_))
        ));
        assert_eq!(range().days(), 60);
    }

    #[test]
    fn test_parse_date_formats() {
        let intraday = PriceBar::parse_date("2024-01-02 15:30:00").unwrap();
        assert_eq!(intraday.date(), NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());

        let daily = PriceBar::parse_date("2024-01-02").unwrap();
        assert_eq!(daily.date(), NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());

        assert!(PriceBar::parse_date("yesterday").is_none());
    }

    #[test]
    fn test_saved_portfolio_layout() {
        let metrics = PortfolioMetrics {
            expected_return: 1.2,
            volatility: 3.4,
            sharpe_ratio: 0.1,
        };
        let now = Utc.with_ymd_and_hms(2024, 3, 2, 12, 0, 0).unwrap();
        let record = SavedPortfolio::new(
            &[
                ("aapl".to_string(), 0.25),
                ("MSFT".to_string(), 0.5),
                ("GOOG".to_string(), 0.25),
            ],
            &metrics,
            2.5,
            range(),
            Interval::Daily,
            now,
        )
        .unwrap();

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["asset1Name"], "AAPL");
        assert_eq!(value["asset2Percent"], 50.0);
        assert_eq!(value["asset3Name"], "GOOG");
        assert!(value.get("asset4Name").is_none());
        assert_eq!(value["risk"], 3.4);
        assert_eq!(value["interval"], "Daily");
        assert_eq!(record.allocations().len(), 3);
    }

    #[test]
    fn test_saved_portfolio_asset_count() {
        let metrics = PortfolioMetrics {
            expected_return: 0.0,
            volatility: 0.0,
            sharpe_ratio: 0.0,
        };
        let result = SavedPortfolio::new(
            &[("AAPL".to_string(), 1.0)],
            &metrics,
            0.0,
            range(),
            Interval::Daily,
            Utc::now(),
        );
        assert!(matches!(result, Err(Error::InvalidOperation(_))));
    }

    #[test]
    fn test_rolled_range_keeps_span() {
        let metrics = PortfolioMetrics {
            expected_return: 0.5,
            volatility: 1.0,
            sharpe_ratio: 0.5,
        };
        let record = SavedPortfolio::new(
            &[("AAPL".to_string(), 0.75), ("MSFT".to_string(), 0.25)],
            &metrics,
            1.0,
            range(),
            Interval::Daily,
            Utc::now(),
        )
        .unwrap();

        let today = NaiveDate::from_ymd_opt(2024, 10, 19).unwrap();
        let rolled = record.rolled_range(today).unwrap();
        assert_eq!(rolled.end, today);
        assert_eq!(rolled.start, NaiveDate::from_ymd_opt(2024, 8, 20).unwrap());
        assert_eq!(rolled.days(), record.range().days());

        assert_eq!(record.symbols(), vec!["AAPL".to_string(), "MSFT".to_string()]);
        assert_eq!(record.weights(), vec![0.75, 0.25]);
    }

    #[test]
    fn test_api_response() {
        let response: ApiResponse<String> = ApiResponse::ok("test".to_string());
        assert!(response.ok);
        assert_eq!(response.data, Some("test".to_string()));

        let err_response: ApiResponse<String> = ApiResponse::err("error");
        assert!(!err_response.ok);
        assert_eq!(err_response.error, Some("error".to_string()));
    }
}
