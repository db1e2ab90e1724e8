//! Short-horizon volume forecasts and what-if re-projection.
//!
//! A region's monthly history is fitted with an ordinary least-squares line
//! over the month index and extrapolated a fixed number of months ahead. Each
//! projected month carries a prediction band of `± k` standard errors derived
//! from the residual variance of the fit.
//!
//! Update counts can't be negative, so every projected value and band edge is
//! floored at zero. The floor applies to the output only; the fit itself sees
//! the raw trend.
//!
//! [`simulate`] re-projects a forecast under an [`InterventionScenario`], applying
//! one of the pure [`EffectModel`] functions to every projected value.
//!
//! # Example
//!
//! ```
//! use vistara_forecast::{
//!     EffectCoefficients, EffectModel, ForecastParams, InterventionScenario, forecast, simulate,
//! };
//! use vistara_records::{Period, RegionId};
//!
//! let region: RegionId = "S/D1".parse().unwrap();
//! let history = [("2025-01", 40.0), ("2025-02", 45.0), ("2025-03", 60.0)]
//!     .map(|(p, v)| (p.parse::<Period>().unwrap(), v));
//!
//! let base = forecast(region.clone(), &history, &ForecastParams::default()).unwrap();
//! assert_eq!(base.horizon_points.len(), 3);
//! assert_eq!(base.horizon_points[0].period.to_string(), "2025-04");
//!
//! let scenario = InterventionScenario {
//!     region_id: region,
//!     intervention_magnitude: 2.0,
//!     effect_model: EffectModel::ThroughputBoost,
//! };
//! let boosted = simulate(&base, &scenario, &EffectCoefficients::default()).unwrap();
//! assert!(boosted.horizon_points[0].predicted_value > base.horizon_points[0].predicted_value);
//! ```

pub use self::{scenario::*, target::*, trend::*};

mod scenario;
mod target;
mod trend;
