use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use vistara_anomaly::{AnomalyScore, RiskLevel, ScoreThresholds};
use vistara_features::DistrictFeatures;
use vistara_forecast::{ForecastSeries, InterventionScenario, InvalidScenarioError, ScenarioForecast};
use vistara_records::{DistrictId, RegionId};

use crate::{AnalyticsConfig, EntityOutcome, parallel::map_in_chunks};

/// Everything computed for one district.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistrictResult {
    pub features: EntityOutcome<DistrictFeatures>,
    pub anomaly: EntityOutcome<AnomalyScore>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskCounts {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl RiskCounts {
    pub(crate) fn add(&mut self, level: RiskLevel) {
        match level {
            RiskLevel::High => self.high += 1,
            RiskLevel::Medium => self.medium += 1,
            RiskLevel::Low => self.low += 1,
        }
    }
}

/// Roll-up of the districts of one state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSummary {
    pub district_count: usize,
    /// Districts whose features were derived.
    pub computed_districts: usize,
    /// Mean latest-month velocity over computed districts.
    pub mean_velocity: Option<f64>,
    pub mean_migration_index: Option<f64>,
    pub mean_anomaly_score: Option<f64>,
    pub flagged_count: usize,
    pub risk_counts: RiskCounts,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Features,
    Anomaly,
    Forecast,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageCounts {
    pub computed: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl StageCounts {
    pub(crate) fn count<T>(&mut self, outcome: &EntityOutcome<T>) {
        match outcome {
            EntityOutcome::Computed(_) => self.computed += 1,
            EntityOutcome::Skipped { .. } => self.skipped += 1,
            EntityOutcome::Failed { .. } => self.failed += 1,
        }
    }
}

/// A district or region that was skipped or failed at some stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityIssue {
    pub entity: String,
    pub stage: Stage,
    pub failed: bool,
    pub reason: String,
}

impl EntityIssue {
    pub(crate) fn from_outcome<T>(
        entity: impl ToString,
        stage: Stage,
        outcome: &EntityOutcome<T>,
    ) -> Option<Self> {
        let reason = outcome.reason()?.to_owned();
        Some(Self {
            entity: entity.to_string(),
            stage,
            failed: outcome.is_failed(),
            reason,
        })
    }
}

/// Partial-result summary of a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub input_records: usize,
    /// Records dropped by the period filter.
    pub filtered_records: usize,
    pub features: StageCounts,
    pub anomaly: StageCounts,
    pub forecasts: StageCounts,
    pub issues: Vec<EntityIssue>,
}

impl RunSummary {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.issues.is_empty()
    }
}

/// The output of one pipeline run. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsRunResult {
    pub config: AnalyticsConfig,
    pub districts: BTreeMap<DistrictId, DistrictResult>,
    /// Cut-offs of this run's anomaly scores, when scoring ran.
    pub thresholds: Option<ScoreThresholds>,
    pub forecasts: BTreeMap<RegionId, EntityOutcome<ForecastSeries>>,
    pub states: BTreeMap<String, StateSummary>,
    pub summary: RunSummary,
}

#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum ScenarioError {
    #[display("no forecast exists for region {region_id}")]
    UnknownRegion { region_id: RegionId },
    #[display("forecast for region {region_id} is unavailable: {reason}")]
    ForecastUnavailable { region_id: RegionId, reason: String },
    #[display("{_0}")]
    Invalid(InvalidScenarioError),
}

impl From<InvalidScenarioError> for ScenarioError {
    fn from(err: InvalidScenarioError) -> Self {
        Self::Invalid(err)
    }
}

impl AnalyticsRunResult {
    #[must_use]
    pub fn district(&self, id: &DistrictId) -> Option<&DistrictResult> {
        self.districts.get(id)
    }

    #[must_use]
    pub fn forecast(&self, region_id: &RegionId) -> Option<&ForecastSeries> {
        self.forecasts.get(region_id)?.computed()
    }

    /// The `n` highest anomaly scores, highest first. Ties go to the smaller id.
    #[must_use]
    pub fn priority_districts(&self, n: usize) -> Vec<&AnomalyScore> {
        let mut scores = self
            .districts
            .values()
            .filter_map(|d| d.anomaly.computed())
            .collect::<Vec<_>>();
        scores.sort_by(|a, b| {
            b.assessment
                .score
                .total_cmp(&a.assessment.score)
                .then_with(|| a.district_id.cmp(&b.district_id))
        });
        scores.truncate(n);
        scores
    }

    /// Re-projects one region's forecast under `scenario`.
    pub fn simulate(
        &self,
        scenario: &InterventionScenario,
    ) -> Result<ScenarioForecast, ScenarioError> {
        scenario.validate()?;
        let region_id = &scenario.region_id;
        let outcome = self
            .forecasts
            .get(region_id)
            .ok_or_else(|| ScenarioError::UnknownRegion {
                region_id: region_id.clone(),
            })?;
        let base = match outcome {
            EntityOutcome::Computed(series) => series,
            EntityOutcome::Skipped { reason } | EntityOutcome::Failed { reason } => {
                return Err(ScenarioError::ForecastUnavailable {
                    region_id: region_id.clone(),
                    reason: reason.clone(),
                });
            }
        };
        Ok(vistara_forecast::simulate(
            base,
            scenario,
            &self.config.effect_coefficients,
        )?)
    }

    /// Evaluates independent scenarios concurrently, in input order.
    #[must_use]
    pub fn simulate_all(
        &self,
        scenarios: &[InterventionScenario],
    ) -> Vec<EntityOutcome<ScenarioForecast>> {
        map_in_chunks(scenarios, self.config.worker_threads(), |scenario| {
            match self.simulate(scenario) {
                Ok(forecast) => EntityOutcome::Computed(forecast),
                Err(err @ ScenarioError::ForecastUnavailable { .. }) => {
                    EntityOutcome::skipped(err)
                }
                Err(err) => EntityOutcome::failed(err),
            }
        })
    }
}
