//! Outcome percentiles.

/// Percentile used for the "best outcome" shown next to a saved portfolio.
pub const BEST_OUTCOME_PERCENTILE: f64 = 0.99;

/// Value at the given percentile of `returns` (nearest-rank, ascending).
///
/// The rank is `ceil(percentile * n) - 1`. Returns `None` when that rank falls
/// outside the data: an empty slice, a percentile of zero or below, or one
/// above 1.
///
/// # Example
///
/// ```rust
/// use equifi_core::outcome::best_outcome;
///
/// let returns: Vec<f64> = (1..=100).map(f64::from).collect();
/// assert_eq!(best_outcome(0.99, &returns), Some(99.0));
/// ```
pub fn best_outcome(percentile: f64, returns: &[f64]) -> Option<f64> {
    let mut sorted = returns.to_vec();
    sorted.sort_by(f64::total_cmp);

    let rank = (percentile * sorted.len() as f64).ceil() - 1.0;
    if rank.is_nan() || rank < 0.0 {
        return None;
    }

    sorted.get(rank as usize).copied()
}
