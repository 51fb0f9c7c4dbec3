//! Daily aggregation of intraday price bars.

use std::collections::HashMap;

use crate::types::PriceBar;

/// Collapse intraday bars into one bar per calendar day.
///
/// The close of each day is the average of that day's closes. Days keep the
/// order in which they first appear, so a descending provider feed stays
/// descending.
pub fn aggregate_daily(bars: &[PriceBar]) -> Vec<PriceBar> {
    let mut order = Vec::new();
    let mut groups: HashMap<_, (f64, usize)> = HashMap::new();

    for bar in bars {
        let day = bar.date.date();
        let entry = groups.entry(day).or_insert_with(|| {
            order.push(day);
            (0.0, 0)
        });
        entry.0 += bar.close;
        entry.1 += 1;
    }

    order
        .into_iter()
        .filter_map(|day| {
            let (sum, count) = groups.get(&day)?;
            let midnight = day.and_hms_opt(0, 0, 0)?;
            Some(PriceBar::new(midnight, sum / *count as f64))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn bar(raw: &str, close: f64) -> PriceBar {
        PriceBar::new(PriceBar::parse_date(raw).unwrap(), close)
    }

    #[test]
    fn test_aggregate_daily_averages_per_day() {
        let bars = vec![
            bar("2024-01-03 16:00:00", 12.0),
            bar("2024-01-03 12:00:00", 10.0),
            bar("2024-01-02 16:00:00", 9.0),
            bar("2024-01-02 12:00:00", 8.0),
            bar("2024-01-02 08:00:00", 7.0),
        ];

        let daily = aggregate_daily(&bars);

        assert_eq!(daily.len(), 2);
        // First-seen order is preserved
        assert_eq!(daily[0].date.date(), NaiveDate::from_ymd_opt(2024, 1, 3).unwrap());
        assert_eq!(daily[0].close, 11.0);
        assert_eq!(daily[1].date.date(), NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(daily[1].close, 8.0);
    }

    #[test]
    fn test_aggregate_daily_empty() {
        assert!(aggregate_daily(&[]).is_empty());
    }
}
