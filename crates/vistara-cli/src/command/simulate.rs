use std::path::PathBuf;

use anyhow::Context as _;
use vistara_forecast::{EffectModel, InterventionScenario};
use vistara_records::RegionId;

use super::PipelineArg;
use crate::util::Output;

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct SimulateArg {
    #[clap(flatten)]
    pipeline: PipelineArg,
    /// Region to re-project: STATE or STATE/DISTRICT
    #[arg(long)]
    region: RegionId,
    /// Size of the intervention, e.g. number of added centres
    #[arg(long, allow_negative_numbers = true)]
    magnitude: f64,
    /// One of throughput-boost, backlog-relief, fixed-shift
    #[arg(long)]
    effect_model: EffectModel,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(arg: &SimulateArg) -> anyhow::Result<()> {
    let scenario = InterventionScenario {
        region_id: arg.region.clone(),
        intervention_magnitude: arg.magnitude,
        effect_model: arg.effect_model,
    };
    // reject a bad scenario before paying for a full run
    scenario
        .validate()
        .with_context(|| format!("Invalid scenario for {}", arg.region))?;

    let result = arg.pipeline.run_pipeline()?;
    let forecast = result
        .simulate(&scenario)
        .with_context(|| format!("Failed to simulate scenario for {}", arg.region))?;
    Output::save_json(&forecast, arg.output.clone())
}
