use std::path::PathBuf;

use serde::Serialize;
use vistara_anomaly::AnomalyScore;
use vistara_forecast::{InterventionScenario, ScenarioForecast};
use vistara_pipeline::{AnalyticsRunResult, EntityOutcome};

use super::PipelineArg;
use crate::util::Output;

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct RunArg {
    #[clap(flatten)]
    pipeline: PipelineArg,
    /// Scenario to simulate, as REGION:MAGNITUDE:EFFECT_MODEL (repeatable)
    #[arg(long = "scenario", value_parser = parse_scenario)]
    scenarios: Vec<InterventionScenario>,
    /// Number of highest-scoring districts to list
    #[arg(long, default_value_t = 10)]
    top: usize,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct RunReport<'a> {
    #[serde(flatten)]
    result: &'a AnalyticsRunResult,
    priority_districts: Vec<&'a AnomalyScore>,
    scenarios: Vec<ScenarioReport>,
}

#[derive(Debug, Serialize)]
struct ScenarioReport {
    scenario: InterventionScenario,
    outcome: EntityOutcome<ScenarioForecast>,
}

pub(crate) fn run(arg: &RunArg) -> anyhow::Result<()> {
    let result = arg.pipeline.run_pipeline()?;

    let summary = &result.summary;
    if !summary.is_complete() {
        log::warn!(
            "{} districts or regions were skipped or failed; see summary.issues",
            summary.issues.len()
        );
    }

    let scenarios = arg
        .scenarios
        .iter()
        .cloned()
        .zip(result.simulate_all(&arg.scenarios))
        .map(|(scenario, outcome)| ScenarioReport { scenario, outcome })
        .collect();

    let report = RunReport {
        result: &result,
        priority_districts: result.priority_districts(arg.top),
        scenarios,
    };
    Output::save_json(&report, arg.output.clone())
}

/// Parses `REGION:MAGNITUDE:EFFECT_MODEL`, e.g. `Bihar/Patna:3:throughput-boost`.
fn parse_scenario(s: &str) -> Result<InterventionScenario, String> {
    let mut parts = s.rsplitn(3, ':');
    let (Some(effect_model), Some(magnitude), Some(region)) =
        (parts.next(), parts.next(), parts.next())
    else {
        return Err(format!(
            "expected REGION:MAGNITUDE:EFFECT_MODEL, got '{s}'"
        ));
    };
    Ok(InterventionScenario {
        region_id: region.parse().map_err(|e| format!("{e}"))?,
        intervention_magnitude: magnitude
            .parse()
            .map_err(|e| format!("invalid magnitude '{magnitude}': {e}"))?,
        effect_model: effect_model.parse().map_err(|e| format!("{e}"))?,
    })
}
