use std::collections::BTreeMap;

use vistara_anomaly::{AnomalyScore, FitError, ScoreThresholds, score_districts};
use vistara_features::{DistrictFeatures, FeatureVector, derive_features};
use vistara_forecast::{ForecastSeries, ForecastTarget, forecast};
use vistara_records::{DistrictId, DistrictPeriodRecord, Period, RegionId, group_by_district};
use vistara_stats::descriptive::DescriptiveStats;

use crate::{
    AnalyticsConfig, ConfigError, DistrictResult, EntityIssue, EntityOutcome, RiskCounts,
    RunSummary, Stage, StateSummary, parallel::map_in_chunks,
    result::AnalyticsRunResult,
};

#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum RunError {
    #[display("invalid configuration: {_0}")]
    Config(ConfigError),
    #[display("no records to analyze ({total} read, none in the selected period range)")]
    NoRecords { total: usize },
}

impl From<ConfigError> for RunError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

/// Runs the whole pipeline over one snapshot of records.
///
/// The configuration is checked before any record is touched. After that,
/// problems with individual districts or regions are recorded in the result
/// and never abort the run.
pub fn run(
    records: &[DistrictPeriodRecord],
    config: &AnalyticsConfig,
) -> Result<AnalyticsRunResult, RunError> {
    config.validate()?;
    let workers = config.worker_threads();

    let selected = records
        .iter()
        .filter(|r| config.period_range.is_none_or(|range| range.contains(r.period)))
        .collect::<Vec<_>>();
    if selected.is_empty() {
        return Err(RunError::NoRecords {
            total: records.len(),
        });
    }
    let groups = group_by_district(selected.iter().copied())
        .into_iter()
        .collect::<Vec<_>>();
    log::info!(
        "analyzing {} records across {} districts with {workers} workers",
        selected.len(),
        groups.len()
    );

    let features = map_in_chunks(&groups, workers, |(id, rows)| {
        match derive_features(id.clone(), rows) {
            Ok(features) => EntityOutcome::Computed(features),
            Err(err) => {
                log::warn!("district {id} rejected: {err}");
                EntityOutcome::failed(err)
            }
        }
    });
    let features = groups
        .into_iter()
        .map(|(id, _)| id)
        .zip(features)
        .collect::<BTreeMap<_, _>>();

    let (mut anomalies, thresholds) = score_anomalies(&features, config);
    let forecasts = forecast_regions(&features, config);

    let districts = features
        .into_iter()
        .map(|(id, features)| {
            let anomaly = anomalies
                .remove(&id)
                .unwrap_or_else(|| EntityOutcome::skipped("features unavailable"));
            (id, DistrictResult { features, anomaly })
        })
        .collect::<BTreeMap<_, _>>();

    let states = summarize_states(&districts);
    let summary = summarize_run(records.len(), selected.len(), &districts, &forecasts);
    log::info!(
        "run finished: {} districts, {} forecasts, {} issues",
        districts.len(),
        forecasts.len(),
        summary.issues.len()
    );

    Ok(AnalyticsRunResult {
        config: config.clone(),
        districts,
        thresholds,
        forecasts,
        states,
        summary,
    })
}

type AnomalyOutcomes = BTreeMap<DistrictId, EntityOutcome<AnomalyScore>>;

/// Scores every district whose features were derived, using its latest month.
fn score_anomalies(
    features: &BTreeMap<DistrictId, EntityOutcome<DistrictFeatures>>,
    config: &AnalyticsConfig,
) -> (AnomalyOutcomes, Option<ScoreThresholds>) {
    let population = features
        .iter()
        .filter_map(|(id, outcome)| {
            let features = outcome.computed()?;
            Some((id.clone(), features.latest().features))
        })
        .collect::<Vec<(DistrictId, FeatureVector)>>();

    match score_districts(&population, &config.scorer_params()) {
        Ok(scored) => {
            let outcomes = scored
                .scores
                .into_iter()
                .map(|score| (score.district_id.clone(), EntityOutcome::Computed(score)))
                .collect();
            (outcomes, Some(scored.thresholds))
        }
        Err(err) => {
            log::warn!("anomaly scoring skipped: {err}");
            let outcome = |err: &FitError| match err {
                FitError::InsufficientData(_) => EntityOutcome::skipped(err),
                FitError::Params(_) => EntityOutcome::failed(err),
            };
            let outcomes = population
                .into_iter()
                .map(|(id, _)| (id, outcome(&err)))
                .collect();
            (outcomes, None)
        }
    }
}

/// Forecasts each district and, when enabled, each state's summed series.
///
/// A state total is only forecast when every member district was derived, and
/// fails if the summed counts overflow.
fn forecast_regions(
    features: &BTreeMap<DistrictId, EntityOutcome<DistrictFeatures>>,
    config: &AnalyticsConfig,
) -> BTreeMap<RegionId, EntityOutcome<ForecastSeries>> {
    let target = config.forecast_target;
    let params = config.forecast_params();

    let mut outcomes = BTreeMap::new();
    let mut jobs: Vec<(RegionId, Vec<(Period, f64)>)> = vec![];
    let mut states: BTreeMap<&str, StateTotals> = BTreeMap::new();

    for (id, outcome) in features {
        let region_id = RegionId::from(id.clone());
        let state = states.entry(id.state()).or_default();
        state.members += 1;
        let Some(features) = outcome.computed() else {
            outcomes.insert(region_id, EntityOutcome::skipped("features unavailable"));
            continue;
        };
        state.derived += 1;
        for row in features.rows() {
            state.add(row.period, target.value(&row.counts));
        }
        jobs.push((region_id, history(features, target)));
    }

    if config.forecast_state_totals {
        for (state, totals) in states {
            let region_id = RegionId::State(state.to_owned());
            if totals.derived < totals.members {
                outcomes.insert(
                    region_id,
                    EntityOutcome::skipped(format!(
                        "state total incomplete: features unavailable for {} of {} districts",
                        totals.members - totals.derived,
                        totals.members
                    )),
                );
                continue;
            }
            let Some(sums) = totals.sums else {
                log::warn!("state total for {state} overflowed");
                outcomes.insert(
                    region_id,
                    EntityOutcome::failed("count overflow while summing the state's districts"),
                );
                continue;
            };
            #[expect(clippy::cast_precision_loss)]
            let history = sums
                .into_iter()
                .map(|(period, total)| (period, total as f64))
                .collect();
            jobs.push((region_id, history));
        }
    }

    let results = map_in_chunks(&jobs, config.worker_threads(), |(region_id, history)| {
        match forecast(region_id.clone(), history, &params) {
            Ok(series) => EntityOutcome::Computed(series),
            Err(err) => {
                log::warn!("forecast for {region_id} skipped: {err}");
                EntityOutcome::skipped(err)
            }
        }
    });
    outcomes.extend(jobs.into_iter().map(|(region_id, _)| region_id).zip(results));
    outcomes
}

/// Per-period sums of one state's districts.
#[derive(Debug)]
struct StateTotals {
    members: usize,
    derived: usize,
    /// `None` once any sum has overflowed.
    sums: Option<BTreeMap<Period, u64>>,
}

impl Default for StateTotals {
    fn default() -> Self {
        Self {
            members: 0,
            derived: 0,
            sums: Some(BTreeMap::new()),
        }
    }
}

impl StateTotals {
    fn add(&mut self, period: Period, value: u64) {
        let Some(sums) = &mut self.sums else {
            return;
        };
        let sum = sums.entry(period).or_default();
        match sum.checked_add(value) {
            Some(total) => *sum = total,
            None => self.sums = None,
        }
    }
}

#[expect(clippy::cast_precision_loss)]
fn history(features: &DistrictFeatures, target: ForecastTarget) -> Vec<(Period, f64)> {
    features
        .rows()
        .iter()
        .map(|row| (row.period, target.value(&row.counts) as f64))
        .collect()
}

fn summarize_states(
    districts: &BTreeMap<DistrictId, DistrictResult>,
) -> BTreeMap<String, StateSummary> {
    let mut by_state: BTreeMap<&str, Vec<&DistrictResult>> = BTreeMap::new();
    for (id, result) in districts {
        by_state.entry(id.state()).or_default().push(result);
    }

    by_state
        .into_iter()
        .map(|(state, members)| {
            let latest = members
                .iter()
                .filter_map(|d| d.features.computed())
                .map(|f| f.latest().features)
                .collect::<Vec<_>>();
            let scores = members
                .iter()
                .filter_map(|d| d.anomaly.computed())
                .collect::<Vec<_>>();

            let mut risk_counts = RiskCounts::default();
            for score in &scores {
                risk_counts.add(score.assessment.risk_level);
            }
            let mean = |values: Vec<f64>| DescriptiveStats::new(values).map(|s| s.mean);

            let summary = StateSummary {
                district_count: members.len(),
                computed_districts: latest.len(),
                mean_velocity: mean(latest.iter().map(|f| f.velocity).collect()),
                mean_migration_index: mean(latest.iter().map(|f| f.migration_index).collect()),
                mean_anomaly_score: mean(scores.iter().map(|s| s.assessment.score).collect()),
                flagged_count: scores.iter().filter(|s| s.assessment.is_flagged).count(),
                risk_counts,
            };
            (state.to_owned(), summary)
        })
        .collect()
}

fn summarize_run(
    input_records: usize,
    selected_records: usize,
    districts: &BTreeMap<DistrictId, DistrictResult>,
    forecasts: &BTreeMap<RegionId, EntityOutcome<ForecastSeries>>,
) -> RunSummary {
    let mut summary = RunSummary {
        input_records,
        filtered_records: input_records - selected_records,
        ..RunSummary::default()
    };

    for (id, district) in districts {
        summary.features.count(&district.features);
        summary.anomaly.count(&district.anomaly);
        summary
            .issues
            .extend(EntityIssue::from_outcome(id, Stage::Features, &district.features));
        summary
            .issues
            .extend(EntityIssue::from_outcome(id, Stage::Anomaly, &district.anomaly));
    }
    for (region_id, outcome) in forecasts {
        summary.forecasts.count(outcome);
        summary
            .issues
            .extend(EntityIssue::from_outcome(region_id, Stage::Forecast, outcome));
    }
    summary
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroUsize;

    use vistara_anomaly::RiskLevel;
    use vistara_forecast::{EffectModel, InterventionScenario};

    use super::*;
    use crate::ScenarioError;

    fn record(
        state: &str,
        district: &str,
        period: &str,
        enrolments: i64,
        bio: i64,
        demo: i64,
    ) -> DistrictPeriodRecord {
        DistrictPeriodRecord {
            state: state.to_owned(),
            district: district.to_owned(),
            period: period.parse().unwrap(),
            enrolments,
            biometric_updates: bio,
            demographic_updates: demo,
        }
    }

    /// `n` well-behaved districts over three months plus one loud outlier.
    fn dataset(n: u32) -> Vec<DistrictPeriodRecord> {
        let mut records = vec![];
        for i in 0..n {
            let state = if i % 2 == 0 { "North" } else { "South" };
            let district = format!("D{i:02}");
            let base = i64::from(100 + i % 7);
            for (m, period) in ["2025-01", "2025-02", "2025-03"].into_iter().enumerate() {
                let m = i64::try_from(m).unwrap();
                records.push(record(
                    state,
                    &district,
                    period,
                    base + 5 * m,
                    20 + m + i64::from(i % 3),
                    22 + 2 * m + i64::from(i % 4),
                ));
            }
        }
        for (m, period) in ["2025-01", "2025-02", "2025-03"].into_iter().enumerate() {
            let m = i64::try_from(m).unwrap();
            records.push(record("North", "Phantom", period, 3, 5, 400 + 900 * m));
        }
        records
    }

    fn config() -> AnalyticsConfig {
        AnalyticsConfig {
            worker_threads: NonZeroUsize::new(4),
            ..AnalyticsConfig::default()
        }
    }

    #[test]
    fn test_full_run() {
        let result = run(&dataset(30), &config()).unwrap();
        assert_eq!(result.districts.len(), 31);
        assert!(result.summary.is_complete());
        assert_eq!(result.summary.features.computed, 31);
        assert_eq!(result.summary.anomaly.computed, 31);
        // 31 districts plus 2 state totals
        assert_eq!(result.summary.forecasts.computed, 33);

        let phantom = DistrictId::new("North", "Phantom");
        let top = result.priority_districts(1);
        assert_eq!(top[0].district_id, phantom);
        assert!(top[0].assessment.is_flagged);
        assert_eq!(top[0].assessment.risk_level, RiskLevel::High);

        for outcome in result.forecasts.values() {
            let series = outcome.computed().unwrap();
            assert_eq!(series.horizon_points.len(), 3);
            assert!(series.horizon_points.iter().all(|p| p.predicted_value >= 0.0));
        }

        let north = &result.states["North"];
        assert_eq!(north.district_count, 16);
        assert_eq!(north.flagged_count, 1);
        assert_eq!(north.risk_counts.high, 1);
        assert!(result.thresholds.is_some());
    }

    #[test]
    fn test_state_total_sums_districts() {
        let result = run(&dataset(12), &config()).unwrap();
        let state = result.forecast(&RegionId::State("South".to_owned())).unwrap();
        let expected = result
            .districts
            .iter()
            .filter(|(id, _)| id.state() == "South")
            .map(|(_, d)| d.features.computed().unwrap().rows()[0].counts.total_updates())
            .sum::<u64>();
        #[expect(clippy::cast_precision_loss)]
        let expected = expected as f64;
        assert_eq!(state.historical_points[0].value, expected);
    }

    #[test]
    fn test_bad_district_does_not_abort_run() {
        let mut records = dataset(20);
        records.push(record("South", "Broken", "2025-01", 10, -4, 3));
        records.push(record("South", "Broken", "2025-02", 10, 4, 3));

        let result = run(&records, &config()).unwrap();
        let broken = result.district(&DistrictId::new("South", "Broken")).unwrap();
        assert!(broken.features.is_failed());
        assert!(broken.anomaly.is_skipped());
        let region = RegionId::District(DistrictId::new("South", "Broken"));
        assert!(result.forecasts[&region].is_skipped());
        let state = &result.forecasts[&RegionId::State("South".to_owned())];
        assert!(state.is_skipped());
        assert!(state.reason().unwrap().contains("1 of 11 districts"));
        assert!(result.forecasts[&RegionId::State("North".to_owned())].is_computed());

        assert_eq!(result.summary.features.failed, 1);
        assert_eq!(result.summary.anomaly.computed, 21);
        let failures = result
            .summary
            .issues
            .iter()
            .filter(|issue| issue.failed)
            .collect::<Vec<_>>();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].entity, "South/Broken");
        assert_eq!(failures[0].stage, Stage::Features);
    }

    #[test]
    fn test_state_total_overflow_fails_only_that_state() {
        let mut records = dataset(12);
        for district in ["Huge1", "Huge2"] {
            for period in ["2025-01", "2025-02", "2025-03"] {
                records.push(record("South", district, period, 10, i64::MAX, 0));
            }
        }

        let result = run(&records, &config()).unwrap();
        let state = &result.forecasts[&RegionId::State("South".to_owned())];
        assert!(state.is_failed());
        assert!(state.reason().unwrap().contains("overflow"));
        assert!(result.forecasts[&RegionId::State("North".to_owned())].is_computed());

        let huge = RegionId::District(DistrictId::new("South", "Huge1"));
        assert!(result.forecasts[&huge].is_computed());
        assert_eq!(result.summary.features.computed, 15);
        assert_eq!(result.summary.forecasts.failed, 1);
    }

    #[test]
    fn test_district_names_with_separator_fail() {
        let mut records = dataset(12);
        records.push(record("North/East", "X", "2025-01", 10, 4, 3));
        records.push(record("North", "East/X", "2025-01", 10, 4, 3));

        let result = run(&records, &config()).unwrap();
        assert_eq!(result.summary.features.failed, 2);
        for id in [DistrictId::new("North/East", "X"), DistrictId::new("North", "East/X")] {
            let district = result.district(&id).unwrap();
            assert!(district.features.is_failed(), "{id:?}");
            assert!(district.features.reason().unwrap().contains("'/'"));
        }
        assert!(result.forecasts[&RegionId::State("North".to_owned())].is_skipped());
    }

    #[test]
    fn test_small_population_skips_anomaly_only() {
        let result = run(&dataset(4), &config()).unwrap();
        assert_eq!(result.summary.anomaly.skipped, 5);
        assert!(result.thresholds.is_none());
        assert!(
            result.districts.values().all(|d| d
                .anomaly
                .reason()
                .is_some_and(|r| r.contains("below the minimum")))
        );
        assert_eq!(result.summary.forecasts.computed, 7);
    }

    #[test]
    fn test_single_month_district_skips_forecast() {
        let mut records = dataset(12);
        records.push(record("East", "New", "2025-03", 10, 4, 3));
        let result = run(&records, &config()).unwrap();
        let district = RegionId::District(DistrictId::new("East", "New"));
        assert!(result.forecasts[&district].is_skipped());
        let state = RegionId::State("East".to_owned());
        assert!(result.forecasts[&state].is_skipped());
        assert!(
            result
                .district(&DistrictId::new("East", "New"))
                .unwrap()
                .anomaly
                .is_computed()
        );
    }

    #[test]
    fn test_invalid_config_is_fatal() {
        let config = AnalyticsConfig {
            ensemble_size: 0,
            ..config()
        };
        assert!(matches!(
            run(&dataset(12), &config),
            Err(RunError::Config(_))
        ));
    }

    #[test]
    fn test_period_filter() {
        let config = AnalyticsConfig {
            period_range: Some(vistara_records::PeriodRange {
                from: "2025-02".parse().ok(),
                to: None,
            }),
            ..config()
        };
        let result = run(&dataset(12), &config).unwrap();
        assert_eq!(result.summary.filtered_records, 13);
        let rows = result.districts.values().next().unwrap().features.computed().unwrap();
        assert_eq!(rows.rows().len(), 2);

        let config = AnalyticsConfig {
            period_range: Some(vistara_records::PeriodRange {
                from: "2030-01".parse().ok(),
                to: None,
            }),
            ..config
        };
        assert_eq!(
            run(&dataset(12), &config),
            Err(RunError::NoRecords { total: 39 })
        );
    }

    #[test]
    fn test_runs_are_reproducible() {
        let a = run(&dataset(25), &config()).unwrap();
        let b = run(
            &dataset(25),
            &AnalyticsConfig {
                worker_threads: NonZeroUsize::new(1),
                ..config()
            },
        )
        .unwrap();
        for (id, da) in &a.districts {
            let sa = da.anomaly.computed().unwrap().assessment.score;
            let sb = b.districts[id].anomaly.computed().unwrap().assessment.score;
            assert_eq!(sa.to_bits(), sb.to_bits(), "{id}");
        }
    }

    #[test]
    fn test_scenarios() {
        let result = run(&dataset(12), &config()).unwrap();
        let region = RegionId::District(DistrictId::new("North", "D00"));
        let scenario = |magnitude, effect_model| InterventionScenario {
            region_id: region.clone(),
            intervention_magnitude: magnitude,
            effect_model,
        };

        let same = result
            .simulate(&scenario(0.0, EffectModel::BacklogRelief))
            .unwrap();
        assert_eq!(
            same.horizon_points,
            result.forecast(&region).unwrap().horizon_points
        );
        assert!(matches!(
            result.simulate(&scenario(-3.0, EffectModel::ThroughputBoost)),
            Err(ScenarioError::Invalid(_))
        ));

        let unknown = InterventionScenario {
            region_id: RegionId::State("Nowhere".to_owned()),
            ..scenario(1.0, EffectModel::FixedShift)
        };
        let outcomes = result.simulate_all(&[
            scenario(2.0, EffectModel::ThroughputBoost),
            unknown,
            scenario(-1.0, EffectModel::FixedShift),
        ]);
        assert!(outcomes[0].is_computed());
        assert!(outcomes[1].is_failed());
        assert!(outcomes[2].is_failed());
    }

    #[test]
    fn test_result_serializes_with_string_keys() {
        let result = run(&dataset(12), &config()).unwrap();
        let json = serde_json::to_value(&result).unwrap();
        assert!(json["districts"]["North/D00"]["anomaly"]["status"] == "computed");
        assert!(json["forecasts"]["South"]["value"]["horizon_points"].is_array());
        let back: AnalyticsRunResult = serde_json::from_value(json).unwrap();
        assert_eq!(back.districts.len(), result.districts.len());
    }
}
