//! Ordinary least-squares line fitting.
//!
//! The forecaster fits `value = intercept + slope * index` where `index` is the
//! zero-based position of each observation in an evenly spaced series. Besides
//! the point prediction, [`LinearFit`] reports the residual standard error and
//! the standard error of a new observation at any index, which is what the
//! confidence bands are built from.

/// A fitted straight line `y = intercept + slope * x`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    /// Value of the line at `x = 0`.
    pub intercept: f64,
    /// Change in `y` per unit of `x`.
    pub slope: f64,
    /// Number of observations the line was fitted on.
    pub count: usize,
    /// Mean of the observed `x` values.
    pub x_mean: f64,
    /// Sum of squared deviations of `x` from its mean.
    pub sxx: f64,
    /// Sum of squared residuals of the fit.
    pub residual_sum_of_squares: f64,
}

impl LinearFit {
    /// Fits a line to `(x, y)` pairs.
    ///
    /// Returns `None` when there are fewer than two points, when any coordinate is
    /// non-finite, or when all `x` values coincide (the slope is undefined).
    ///
    /// # Examples
    ///
    /// ```
    /// use vistara_stats::regression::LinearFit;
    ///
    /// let fit = LinearFit::new(&[(0.0, 1.0), (2.0, 5.0)]).unwrap();
    /// assert_eq!(fit.slope, 2.0);
    /// assert_eq!(fit.intercept, 1.0);
    /// ```
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn new(points: &[(f64, f64)]) -> Option<Self> {
        if points.len() < 2
            || points
                .iter()
                .any(|(x, y)| !x.is_finite() || !y.is_finite())
        {
            return None;
        }

        let n = points.len() as f64;
        let x_mean = points.iter().map(|(x, _)| x).sum::<f64>() / n;
        let y_mean = points.iter().map(|(_, y)| y).sum::<f64>() / n;
        let sxx = points.iter().map(|(x, _)| (x - x_mean).powi(2)).sum::<f64>();
        if sxx <= 0.0 {
            return None;
        }
        let sxy = points
            .iter()
            .map(|(x, y)| (x - x_mean) * (y - y_mean))
            .sum::<f64>();

        let slope = sxy / sxx;
        let intercept = y_mean - slope * x_mean;
        let residual_sum_of_squares = points
            .iter()
            .map(|(x, y)| (y - (intercept + slope * x)).powi(2))
            .sum::<f64>();

        Some(Self {
            intercept,
            slope,
            count: points.len(),
            x_mean,
            sxx,
            residual_sum_of_squares,
        })
    }

    /// Fits a line over an evenly spaced series, using `0, 1, 2, ...` as `x`.
    ///
    /// # Examples
    ///
    /// ```
    /// use vistara_stats::regression::LinearFit;
    ///
    /// let fit = LinearFit::over_index(&[20.0, 25.0, 40.0]).unwrap();
    /// assert!((fit.slope - 10.0).abs() < 1e-9);
    /// ```
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn over_index(values: &[f64]) -> Option<Self> {
        let points = values
            .iter()
            .enumerate()
            .map(|(i, &y)| (i as f64, y))
            .collect::<Vec<_>>();
        Self::new(&points)
    }

    /// Evaluates the fitted line at `x`.
    #[must_use]
    pub fn predict(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }

    /// Residual standard error `sqrt(RSS / (n - 2))`.
    ///
    /// With exactly two points the line passes through both and there are no
    /// degrees of freedom left, so the error is reported as `0.0`.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn residual_std_error(&self) -> f64 {
        if self.count <= 2 {
            return 0.0;
        }
        (self.residual_sum_of_squares / (self.count - 2) as f64).sqrt()
    }

    /// Standard error of a new observation predicted at `x`.
    ///
    /// `s * sqrt(1 + 1/n + (x - x_mean)^2 / Sxx)`, which widens as `x` moves
    /// away from the fitted data.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn prediction_std_error(&self, x: f64) -> f64 {
        let n = self.count as f64;
        self.residual_std_error() * (1.0 + 1.0 / n + (x - self.x_mean).powi(2) / self.sxx).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_rejects_too_few_points() {
        assert!(LinearFit::over_index(&[]).is_none());
        assert!(LinearFit::over_index(&[3.0]).is_none());
    }

    #[test]
    fn test_rejects_non_finite() {
        assert!(LinearFit::over_index(&[1.0, f64::NAN, 3.0]).is_none());
    }

    #[test]
    fn test_rejects_vertical_line() {
        assert!(LinearFit::new(&[(1.0, 2.0), (1.0, 4.0)]).is_none());
    }

    #[test]
    fn test_exact_line_has_zero_error() {
        let fit = LinearFit::over_index(&[10.0, 12.0, 14.0, 16.0]).unwrap();
        assert_close(fit.slope, 2.0);
        assert_close(fit.intercept, 10.0);
        assert_close(fit.residual_std_error(), 0.0);
        assert_close(fit.prediction_std_error(10.0), 0.0);
        assert_close(fit.predict(4.0), 18.0);
    }

    #[test]
    fn test_noisy_fit() {
        // y = [20, 25, 40]: slope 10, intercept 18.333..., residuals [1.667, -3.333, 1.667]
        let fit = LinearFit::over_index(&[20.0, 25.0, 40.0]).unwrap();
        assert_close(fit.slope, 10.0);
        assert_close(fit.intercept, 55.0 / 3.0);
        assert_close(fit.residual_sum_of_squares, 50.0 / 3.0);
        assert_close(fit.residual_std_error(), (50.0_f64 / 3.0).sqrt());
    }

    #[test]
    fn test_prediction_error_widens_with_distance() {
        let fit = LinearFit::over_index(&[5.0, 9.0, 8.0, 12.0, 15.0]).unwrap();
        let near = fit.prediction_std_error(5.0);
        let far = fit.prediction_std_error(8.0);
        assert!(near > 0.0);
        assert!(far > near);
    }

    #[test]
    fn test_two_points_have_zero_error() {
        let fit = LinearFit::over_index(&[3.0, 7.0]).unwrap();
        assert_close(fit.residual_std_error(), 0.0);
        assert_close(fit.predict(2.0), 11.0);
    }
}
