use serde::{Deserialize, Serialize};
use vistara_records::{Period, RegionId};
use vistara_stats::regression::LinearFit;

/// Fewest historical months a trend can be fitted on.
pub const MIN_HISTORY: usize = 2;

/// Parameters shared by every forecast of a run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForecastParams {
    /// Number of months projected past the last observation.
    pub horizon: usize,
    /// Half-width of the prediction band, in standard errors.
    pub band_k: f64,
}

impl Default for ForecastParams {
    fn default() -> Self {
        Self {
            horizon: 3,
            band_k: 1.96,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("{points} distinct historical periods are fewer than the {minimum} needed for a trend")]
pub struct InsufficientHistoryError {
    pub points: usize,
    pub minimum: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistoricalPoint {
    pub period: Period,
    pub value: f64,
}

/// One projected month. `low <= predicted_value <= high`, all `>= 0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HorizonPoint {
    pub period: Period,
    pub predicted_value: f64,
    pub low: f64,
    pub high: f64,
}

/// History and projection of one region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSeries {
    pub region_id: RegionId,
    pub historical_points: Vec<HistoricalPoint>,
    pub horizon_points: Vec<HorizonPoint>,
    /// Fitted change per month.
    pub slope: f64,
    pub residual_std_error: f64,
}

/// Fits a linear trend to `history` and projects `params.horizon` months ahead.
///
/// `history` must be in chronological order. Months missing from the history
/// are skipped over on the time axis rather than interpolated.
pub fn forecast(
    region_id: RegionId,
    history: &[(Period, f64)],
    params: &ForecastParams,
) -> Result<ForecastSeries, InsufficientHistoryError> {
    let (Some(&(first, _)), Some(&(last, _))) = (history.first(), history.last()) else {
        return Err(InsufficientHistoryError {
            points: 0,
            minimum: MIN_HISTORY,
        });
    };

    #[expect(clippy::cast_precision_loss)]
    let x_of = |period: Period| period.months_since(first) as f64;

    let points = history
        .iter()
        .map(|&(period, value)| (x_of(period), value))
        .collect::<Vec<_>>();
    let fit = LinearFit::new(&points).ok_or_else(|| {
        let mut periods = history.iter().map(|(p, _)| *p).collect::<Vec<_>>();
        periods.dedup();
        InsufficientHistoryError {
            points: periods.len(),
            minimum: MIN_HISTORY,
        }
    })?;

    let horizon_points = (1..=params.horizon)
        .map(|step| {
            #[expect(clippy::cast_possible_wrap)]
            let period = last.offset(step as i64);
            let x = x_of(period);
            let predicted = fit.predict(x);
            let margin = params.band_k * fit.prediction_std_error(x);
            // counts are non-negative, so the projection is floored at zero
            HorizonPoint {
                period,
                predicted_value: predicted.max(0.0),
                low: (predicted - margin).max(0.0),
                high: (predicted + margin).max(0.0),
            }
        })
        .collect();

    log::debug!(
        "forecast {region_id}: {} months, slope {:.3}",
        history.len(),
        fit.slope
    );

    Ok(ForecastSeries {
        region_id,
        historical_points: history
            .iter()
            .map(|&(period, value)| HistoricalPoint { period, value })
            .collect(),
        horizon_points,
        slope: fit.slope,
        residual_std_error: fit.residual_std_error(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region() -> RegionId {
        "S/D1".parse().unwrap()
    }

    fn history(start: &str, values: &[f64]) -> Vec<(Period, f64)> {
        let start = start.parse::<Period>().unwrap();
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| (start.offset(i64::try_from(i).unwrap()), v))
            .collect()
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_too_little_history() {
        let params = ForecastParams::default();
        assert_eq!(
            forecast(region(), &[], &params),
            Err(InsufficientHistoryError {
                points: 0,
                minimum: 2
            })
        );
        assert_eq!(
            forecast(region(), &history("2025-01", &[10.0]), &params),
            Err(InsufficientHistoryError {
                points: 1,
                minimum: 2
            })
        );
    }

    #[test]
    fn test_rising_demographic_trend() {
        let series = forecast(
            region(),
            &history("2025-01", &[20.0, 25.0, 40.0]),
            &ForecastParams::default(),
        )
        .unwrap();

        assert_eq!(series.historical_points.len(), 3);
        assert_eq!(series.horizon_points.len(), 3);
        assert_close(series.slope, 10.0);

        let periods = series
            .horizon_points
            .iter()
            .map(|p| p.period.to_string())
            .collect::<Vec<_>>();
        assert_eq!(periods, ["2025-04", "2025-05", "2025-06"]);

        let predicted = series
            .horizon_points
            .iter()
            .map(|p| p.predicted_value)
            .collect::<Vec<_>>();
        assert_close(predicted[0], 18.0 + 1.0 / 3.0 + 30.0);
        assert!(predicted.is_sorted());
        assert!(predicted[0] > 40.0);

        for p in &series.horizon_points {
            assert!(p.low >= 0.0);
            assert!(p.low < p.predicted_value && p.predicted_value < p.high);
        }
        // bands widen with distance from the data
        let widths = series
            .horizon_points
            .iter()
            .map(|p| p.high - p.low)
            .collect::<Vec<_>>();
        assert!(widths.is_sorted());
    }

    #[test]
    fn test_two_points_give_zero_width_band() {
        let series = forecast(
            region(),
            &history("2025-01", &[10.0, 20.0]),
            &ForecastParams::default(),
        )
        .unwrap();
        assert_eq!(series.residual_std_error, 0.0);
        for p in &series.horizon_points {
            assert_eq!(p.low, p.predicted_value);
            assert_eq!(p.high, p.predicted_value);
        }
    }

    #[test]
    fn test_falling_trend_is_floored_at_zero() {
        let series = forecast(
            region(),
            &history("2024-11", &[90.0, 50.0, 12.0]),
            &ForecastParams {
                horizon: 6,
                band_k: 1.96,
            },
        )
        .unwrap();
        assert_eq!(series.horizon_points.len(), 6);
        assert_eq!(series.horizon_points[0].period.to_string(), "2025-02");
        for p in &series.horizon_points {
            assert!(p.predicted_value >= 0.0);
            assert!(p.low >= 0.0);
            assert!(p.high >= 0.0);
        }
        assert_eq!(series.horizon_points[5].predicted_value, 0.0);
    }

    #[test]
    fn test_horizon_length_matches_params() {
        let h = history("2025-01", &[5.0, 7.0, 6.0, 9.0]);
        for horizon in [1, 3, 12] {
            let series = forecast(
                region(),
                &h,
                &ForecastParams {
                    horizon,
                    ..ForecastParams::default()
                },
            )
            .unwrap();
            assert_eq!(series.horizon_points.len(), horizon);
        }
    }

    #[test]
    fn test_gaps_use_month_distance() {
        let h = ["2025-01", "2025-02", "2025-05"]
            .map(|p| p.parse::<Period>().unwrap())
            .into_iter()
            .zip([10.0, 20.0, 50.0])
            .collect::<Vec<_>>();
        let series = forecast(region(), &h, &ForecastParams::default()).unwrap();
        assert_close(series.slope, 10.0);
        assert_close(series.horizon_points[0].predicted_value, 60.0);
    }
}
