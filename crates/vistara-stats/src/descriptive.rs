//! Summary statistics of a population of values.
//!
//! Variance is the population variance (divided by `n`, not `n - 1`): the
//! districts of a run are the whole population being described, not a sample
//! of a larger one.

/// Location and spread of a non-empty set of values.
#[derive(Debug, Clone, PartialEq)]
pub struct DescriptiveStats {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    /// Upper median: the value at index `count / 2` of the sorted values.
    pub median: f64,
    pub variance: f64,
    pub std_dev: f64,
}

impl DescriptiveStats {
    /// Summarizes `values` in any order. `None` when there are none.
    ///
    /// ```
    /// # use vistara_stats::descriptive::DescriptiveStats;
    /// let stats = DescriptiveStats::new([12.0, 3.0, 9.0, 6.0]).unwrap();
    /// assert_eq!((stats.min, stats.max), (3.0, 12.0));
    /// assert_eq!(stats.mean, 7.5);
    /// assert_eq!(stats.median, 9.0);
    /// ```
    #[must_use]
    pub fn new<I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        let mut sorted = values.into_iter().collect::<Vec<_>>();
        sorted.sort_by(f64::total_cmp);
        Self::from_sorted(&sorted)
    }

    /// Summarizes values already in ascending order, skipping the sort.
    ///
    /// # Panics
    ///
    /// If `sorted` is not ascending.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn from_sorted(sorted: &[f64]) -> Option<Self> {
        assert!(
            sorted.is_sorted_by(|a, b| a <= b),
            "values must be sorted in ascending order"
        );
        let (&min, &max) = (sorted.first()?, sorted.last()?);

        let count = sorted.len();
        let n = count as f64;
        let mean = sorted.iter().sum::<f64>() / n;
        let variance = sorted.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;

        Some(Self {
            count,
            min,
            max,
            mean,
            median: sorted[count / 2],
            variance,
            std_dev: variance.sqrt(),
        })
    }

    /// Distance of `value` from the mean in standard deviations, ignoring sign.
    ///
    /// `0.0` when the values have no spread.
    ///
    /// ```
    /// # use vistara_stats::descriptive::DescriptiveStats;
    /// let stats = DescriptiveStats::new([2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
    /// assert_eq!(stats.abs_z_score(1.0), 2.0);
    ///
    /// let flat = DescriptiveStats::new([3.0, 3.0, 3.0]).unwrap();
    /// assert_eq!(flat.abs_z_score(10.0), 0.0);
    /// ```
    #[must_use]
    pub fn abs_z_score(&self, value: f64) -> f64 {
        if self.std_dev > 0.0 && self.std_dev.is_finite() {
            ((value - self.mean) / self.std_dev).abs()
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_has_no_stats() {
        assert!(DescriptiveStats::new(std::iter::empty()).is_none());
    }

    #[test]
    fn test_single_value() {
        let stats = DescriptiveStats::new([7.5]).unwrap();
        assert_eq!(stats.count, 1);
        assert_eq!(stats.min, 7.5);
        assert_eq!(stats.max, 7.5);
        assert_eq!(stats.variance, 0.0);
        assert_eq!(stats.abs_z_score(100.0), 0.0);
    }

    #[test]
    fn test_population_variance() {
        let stats = DescriptiveStats::new([2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert_eq!(stats.mean, 5.0);
        assert_eq!(stats.variance, 4.0);
        assert_eq!(stats.std_dev, 2.0);
    }

    #[test]
    #[should_panic(expected = "values must be sorted")]
    fn test_from_sorted_rejects_unsorted() {
        let _ = DescriptiveStats::from_sorted(&[3.0, 1.0]);
    }
}
