use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use vistara_records::RegionId;

use crate::{ForecastSeries, HistoricalPoint, HorizonPoint};

/// How an intervention's magnitude changes a projected value.
///
/// Every model is a pure function of `(value, coefficient, magnitude)` and is
/// the identity when `magnitude` is zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EffectModel {
    /// Added capacity speeds up throughput: `value * (1 + c * m)`.
    ThroughputBoost,
    /// Added capacity drains the backlog: `value * max(0, 1 - c * m)`.
    BacklogRelief,
    /// A flat change per unit: `value + c * m`.
    FixedShift,
}

impl EffectModel {
    pub const ALL: [EffectModel; 3] = [
        EffectModel::ThroughputBoost,
        EffectModel::BacklogRelief,
        EffectModel::FixedShift,
    ];

    #[must_use]
    pub fn id(self) -> &'static str {
        match self {
            EffectModel::ThroughputBoost => "throughput-boost",
            EffectModel::BacklogRelief => "backlog-relief",
            EffectModel::FixedShift => "fixed-shift",
        }
    }

    #[must_use]
    pub fn apply(self, value: f64, coefficient: f64, magnitude: f64) -> f64 {
        match self {
            EffectModel::ThroughputBoost => value * (1.0 + coefficient * magnitude),
            EffectModel::BacklogRelief => value * (1.0 - coefficient * magnitude).max(0.0),
            EffectModel::FixedShift => value + coefficient * magnitude,
        }
    }
}

impl fmt::Display for EffectModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for EffectModel {
    type Err = InvalidScenarioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|model| model.id() == s)
            .ok_or_else(|| InvalidScenarioError::UnknownEffectModel { id: s.to_owned() })
    }
}

/// Coefficient of each effect model.
///
/// Serialized as a map keyed by effect-model id; unknown ids are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct EffectCoefficients {
    pub throughput_boost: f64,
    pub backlog_relief: f64,
    pub fixed_shift: f64,
}

impl Default for EffectCoefficients {
    fn default() -> Self {
        Self {
            throughput_boost: 0.05,
            backlog_relief: 0.02,
            fixed_shift: 100.0,
        }
    }
}

impl EffectCoefficients {
    #[must_use]
    pub fn get(&self, model: EffectModel) -> f64 {
        match model {
            EffectModel::ThroughputBoost => self.throughput_boost,
            EffectModel::BacklogRelief => self.backlog_relief,
            EffectModel::FixedShift => self.fixed_shift,
        }
    }

    /// Returns the first model whose coefficient is NaN or infinite.
    #[must_use]
    pub fn first_non_finite(&self) -> Option<(EffectModel, f64)> {
        EffectModel::ALL
            .into_iter()
            .map(|model| (model, self.get(model)))
            .find(|(_, c)| !c.is_finite())
    }
}

/// A hypothetical resource change in one region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterventionScenario {
    pub region_id: RegionId,
    /// Size of the change, e.g. number of added service centres. Must be `>= 0`.
    pub intervention_magnitude: f64,
    pub effect_model: EffectModel,
}

#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum InvalidScenarioError {
    #[display("intervention magnitude {magnitude} is negative")]
    NegativeMagnitude { magnitude: f64 },
    #[display("intervention magnitude {magnitude} is not finite")]
    NonFiniteMagnitude { magnitude: f64 },
    #[display("unknown effect model '{id}'")]
    UnknownEffectModel { id: String },
    #[display("scenario targets {found} but the forecast is for {expected}")]
    RegionMismatch { expected: RegionId, found: RegionId },
}

/// A forecast re-projected under an intervention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioForecast {
    pub region_id: RegionId,
    pub effect_model: EffectModel,
    pub intervention_magnitude: f64,
    pub effect_coefficient: f64,
    pub historical_points: Vec<HistoricalPoint>,
    pub horizon_points: Vec<HorizonPoint>,
}

impl InterventionScenario {
    pub fn validate(&self) -> Result<(), InvalidScenarioError> {
        let magnitude = self.intervention_magnitude;
        if !magnitude.is_finite() {
            return Err(InvalidScenarioError::NonFiniteMagnitude { magnitude });
        }
        if magnitude < 0.0 {
            return Err(InvalidScenarioError::NegativeMagnitude { magnitude });
        }
        Ok(())
    }
}

/// Applies `scenario` to every projected point of `base`.
///
/// The predicted value and both band edges pass through the same effect
/// function and are floored at zero again. History is carried over unchanged.
pub fn simulate(
    base: &ForecastSeries,
    scenario: &InterventionScenario,
    coefficients: &EffectCoefficients,
) -> Result<ScenarioForecast, InvalidScenarioError> {
    scenario.validate()?;
    if scenario.region_id != base.region_id {
        return Err(InvalidScenarioError::RegionMismatch {
            expected: base.region_id.clone(),
            found: scenario.region_id.clone(),
        });
    }

    let model = scenario.effect_model;
    let coefficient = coefficients.get(model);
    let magnitude = scenario.intervention_magnitude;
    let adjust = |value: f64| model.apply(value, coefficient, magnitude).max(0.0);

    let horizon_points = base
        .horizon_points
        .iter()
        .map(|p| HorizonPoint {
            period: p.period,
            predicted_value: adjust(p.predicted_value),
            low: adjust(p.low),
            high: adjust(p.high),
        })
        .collect();

    Ok(ScenarioForecast {
        region_id: base.region_id.clone(),
        effect_model: model,
        intervention_magnitude: magnitude,
        effect_coefficient: coefficient,
        historical_points: base.historical_points.clone(),
        horizon_points,
    })
}
