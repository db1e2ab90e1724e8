//! Nearest-rank percentiles.
//!
//! Anomaly flags are cut at a percentile of the run's own score distribution,
//! so the rule used here matters: the value at rank `floor(n * k / 100)` is
//! taken as the `k`-th percentile. With that choice no more than
//! `n * (1 - k / 100)` values can be strictly greater than the cut-off, which
//! is the bound the flag rate relies on.

/// Returns the `percentile`-th (0 to 100) value of `sorted_values` by nearest rank.
///
/// `NaN` for an empty slice. Percentiles at or above 100 return the maximum.
///
/// ```
/// use vistara_stats::percentiles::compute_percentile;
///
/// let scores = [0.31, 0.35, 0.42, 0.47, 0.50, 0.52, 0.55, 0.58, 0.61, 0.83];
/// assert_eq!(compute_percentile(&scores, 50.0), 0.52);
/// assert_eq!(compute_percentile(&scores, 95.0), 0.83);
/// ```
#[expect(
    clippy::cast_sign_loss,
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss
)]
#[must_use]
pub fn compute_percentile(sorted_values: &[f64], percentile: f64) -> f64 {
    debug_assert!(sorted_values.is_sorted_by(|a, b| a <= b));
    let Some(last) = sorted_values.len().checked_sub(1) else {
        return f64::NAN;
    };
    let rank = (sorted_values.len() as f64 * percentile / 100.0) as usize;
    sorted_values[rank.min(last)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_is_nan() {
        assert!(compute_percentile(&[], 50.0).is_nan());
    }

    #[test]
    fn test_hundredth_percentile_is_max() {
        let values = [1.0, 2.0, 3.0];
        assert_eq!(compute_percentile(&values, 100.0), 3.0);
        assert_eq!(compute_percentile(&values, 250.0), 3.0);
        assert_eq!(compute_percentile(&values, 0.0), 1.0);
    }

    #[test]
    fn test_strictly_greater_count_is_bounded() {
        for n in 1..200_u32 {
            let values = (0..n).map(f64::from).collect::<Vec<_>>();
            for p in [0.5, 0.8, 0.9, 0.95, 0.99] {
                let threshold = compute_percentile(&values, p * 100.0);
                let above = values.iter().filter(|&&v| v > threshold).count();
                assert!(
                    f64::from(u32::try_from(above).unwrap()) <= f64::from(n) * (1.0 - p) + 1e-9,
                    "n={n} p={p} above={above}"
                );
            }
        }
    }
}
