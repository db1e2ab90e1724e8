use std::{num::NonZeroUsize, thread};

use serde::{Deserialize, Serialize};
use vistara_anomaly::{EnsembleParamsError, ScorerParams, forest::ForestParams};
use vistara_forecast::{EffectCoefficients, EffectModel, ForecastParams, ForecastTarget};
use vistara_records::PeriodRange;

/// Longest accepted forecast horizon, in months.
pub const MAX_HORIZON: usize = 36;

/// Every recognized option of an analytics run.
///
/// Missing fields take their defaults when deserialized, so a config file only
/// needs to name what it changes:
///
/// ```
/// use vistara_pipeline::AnalyticsConfig;
///
/// let config: AnalyticsConfig =
///     serde_json::from_str(r#"{ "ensemble_size": 200, "seed": 7 }"#).unwrap();
/// assert_eq!(config.ensemble_size, 200);
/// assert_eq!(config.forecast_horizon_periods, 3);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalyticsConfig {
    /// Number of isolation trees.
    pub ensemble_size: usize,
    /// Depth cap of each tree. `None` derives `ceil(log2(subsample size))`.
    pub max_tree_depth: Option<usize>,
    /// Districts drawn (without replacement) to grow each tree.
    pub subsample_size: usize,
    /// Fewest districts the anomaly scorer will run on.
    pub min_population: usize,
    pub anomaly_flag_percentile: f64,
    pub medium_risk_percentile: f64,
    pub forecast_horizon_periods: usize,
    pub confidence_band_k: f64,
    pub forecast_target: ForecastTarget,
    /// Also forecast each state's summed series.
    pub forecast_state_totals: bool,
    pub effect_coefficients: EffectCoefficients,
    pub seed: u64,
    /// Records outside this inclusive range are dropped before derivation.
    pub period_range: Option<PeriodRange>,
    /// `None` uses the available parallelism.
    pub worker_threads: Option<NonZeroUsize>,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        let scorer = ScorerParams::default();
        let forecast = ForecastParams::default();
        Self {
            ensemble_size: scorer.forest.ensemble_size,
            max_tree_depth: scorer.forest.max_tree_depth,
            subsample_size: scorer.forest.subsample_size,
            min_population: scorer.min_population,
            anomaly_flag_percentile: scorer.flag_percentile,
            medium_risk_percentile: scorer.medium_risk_percentile,
            forecast_horizon_periods: forecast.horizon,
            confidence_band_k: forecast.band_k,
            forecast_target: ForecastTarget::default(),
            forecast_state_totals: true,
            effect_coefficients: EffectCoefficients::default(),
            seed: scorer.forest.seed,
            period_range: None,
            worker_threads: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum ConfigError {
    #[display("invalid anomaly settings: {_0}")]
    Ensemble(EnsembleParamsError),
    #[display("forecast horizon {horizon} must be between 1 and 36")]
    Horizon { horizon: usize },
    #[display("confidence band k {k} must be finite and non-negative")]
    BandK { k: f64 },
    #[display("coefficient {value} of effect model '{model}' is not finite")]
    EffectCoefficient { model: EffectModel, value: f64 },
    #[display("period range is inverted")]
    InvertedPeriodRange,
}

impl From<EnsembleParamsError> for ConfigError {
    fn from(err: EnsembleParamsError) -> Self {
        Self::Ensemble(err)
    }
}

impl AnalyticsConfig {
    /// Checks every option; a run never starts with an invalid config.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.scorer_params().validate()?;
        if !(1..=MAX_HORIZON).contains(&self.forecast_horizon_periods) {
            return Err(ConfigError::Horizon {
                horizon: self.forecast_horizon_periods,
            });
        }
        let k = self.confidence_band_k;
        if !k.is_finite() || k < 0.0 {
            return Err(ConfigError::BandK { k });
        }
        if let Some((model, value)) = self.effect_coefficients.first_non_finite() {
            return Err(ConfigError::EffectCoefficient { model, value });
        }
        if self.period_range.is_some_and(|range| !range.is_valid()) {
            return Err(ConfigError::InvertedPeriodRange);
        }
        Ok(())
    }

    #[must_use]
    pub fn worker_threads(&self) -> NonZeroUsize {
        self.worker_threads
            .or_else(|| thread::available_parallelism().ok())
            .unwrap_or(NonZeroUsize::MIN)
    }

    #[must_use]
    pub fn scorer_params(&self) -> ScorerParams {
        ScorerParams {
            forest: ForestParams {
                ensemble_size: self.ensemble_size,
                subsample_size: self.subsample_size,
                max_tree_depth: self.max_tree_depth,
                seed: self.seed,
                worker_threads: self.worker_threads(),
            },
            min_population: self.min_population,
            flag_percentile: self.anomaly_flag_percentile,
            medium_risk_percentile: self.medium_risk_percentile,
        }
    }

    #[must_use]
    pub fn forecast_params(&self) -> ForecastParams {
        ForecastParams {
            horizon: self.forecast_horizon_periods,
            band_k: self.confidence_band_k,
        }
    }
}
