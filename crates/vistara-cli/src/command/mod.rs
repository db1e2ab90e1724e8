use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use vistara_pipeline::AnalyticsConfig;

use self::{generate_records::GenerateRecordsArg, run::RunArg, simulate::SimulateArg};
use crate::util;

mod generate_records;
mod run;
mod simulate;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Derive features, score anomalies and forecast every region
    Run(#[clap(flatten)] RunArg),
    /// Re-project one region's forecast under an intervention
    Simulate(#[clap(flatten)] SimulateArg),
    /// Write a synthetic record set
    GenerateRecords(#[clap(flatten)] GenerateRecordsArg),
}

/// Options shared by every command that runs the pipeline.
#[derive(Debug, Clone, clap::Args)]
pub(crate) struct PipelineArg {
    /// Path to the records JSON file
    #[arg(long)]
    input: PathBuf,
    /// Path to an analytics config JSON file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Random seed for the anomaly ensemble
    #[arg(long)]
    seed: Option<u64>,
    /// Number of months to forecast
    #[arg(long)]
    horizon: Option<usize>,
    /// Number of isolation trees
    #[arg(long)]
    ensemble_size: Option<usize>,
}

impl PipelineArg {
    /// Loads the config file, if any, and applies flag overrides on top.
    fn config(&self) -> anyhow::Result<AnalyticsConfig> {
        let mut config = util::read_config_file(self.config.as_ref())?;
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(horizon) = self.horizon {
            config.forecast_horizon_periods = horizon;
        }
        if let Some(ensemble_size) = self.ensemble_size {
            config.ensemble_size = ensemble_size;
        }
        Ok(config)
    }

    fn run_pipeline(&self) -> anyhow::Result<vistara_pipeline::AnalyticsRunResult> {
        let config = self.config()?;
        let records = util::read_records_file(&self.input)?;
        vistara_pipeline::run(&records, &config).context("Failed to run analytics pipeline")
    }
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    match args.mode {
        Mode::Run(arg) => run::run(&arg)?,
        Mode::Simulate(arg) => simulate::run(&arg)?,
        Mode::GenerateRecords(arg) => generate_records::run(&arg)?,
    }
    Ok(())
}
