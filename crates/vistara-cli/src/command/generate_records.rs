use std::path::PathBuf;

use rand::{Rng, SeedableRng as _};
use rand_distr::{Distribution as _, Normal, Poisson};
use rand_pcg::Pcg64;
use vistara_records::{DistrictPeriodRecord, Period};

use crate::util::Output;

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct GenerateRecordsArg {
    /// Number of states
    #[arg(long, default_value_t = 4)]
    states: usize,
    /// Number of districts across all states
    #[arg(long, default_value_t = 40)]
    districts: usize,
    /// Number of consecutive months per district
    #[arg(long, default_value_t = 12)]
    periods: usize,
    /// First month, as YYYY-MM
    #[arg(long, default_value = "2025-01")]
    start: Period,
    /// Number of districts with injected phantom-growth behavior
    #[arg(long, default_value_t = 2)]
    anomalies: usize,
    /// Random seed
    #[arg(long, default_value_t = 42)]
    seed: u64,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

/// Monthly activity profile of one synthetic district.
#[derive(Debug, Clone, Copy)]
struct DistrictProfile {
    enrolment_rate: f64,
    biometric_rate: f64,
    demographic_rate: f64,
    /// Relative growth per month.
    trend: f64,
}

impl DistrictProfile {
    fn typical<R>(rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        Self {
            enrolment_rate: rng.random_range(80.0..600.0),
            biometric_rate: rng.random_range(30.0..200.0),
            demographic_rate: rng.random_range(30.0..200.0),
            trend: rng.random_range(-0.01..0.04),
        }
    }

    /// Few enrolments, a surge of demographic updates that keeps growing.
    fn phantom_growth<R>(rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        Self {
            enrolment_rate: rng.random_range(2.0..10.0),
            biometric_rate: rng.random_range(5.0..20.0),
            demographic_rate: rng.random_range(800.0..1500.0),
            trend: rng.random_range(0.15..0.30),
        }
    }
}

pub(crate) fn run(arg: &GenerateRecordsArg) -> anyhow::Result<()> {
    let records = generate(arg)?;
    log::info!(
        "generated {} records for {} districts",
        records.len(),
        arg.districts
    );
    Output::save_json(&records, arg.output.clone())
}

fn generate(arg: &GenerateRecordsArg) -> anyhow::Result<Vec<DistrictPeriodRecord>> {
    let mut rng = Pcg64::seed_from_u64(arg.seed);
    let noise = Normal::<f64>::new(1.0, 0.05)
        .map_err(|e| anyhow::anyhow!("invalid noise distribution: {e}"))?;
    let states = arg.states.max(1);

    let mut records = Vec::with_capacity(arg.districts * arg.periods);
    for d in 0..arg.districts {
        let state = format!("State-{}", char::from(b'A' + u8::try_from(d % states % 26)?));
        let district = format!("District-{d:03}");
        let profile = if d < arg.anomalies {
            DistrictProfile::phantom_growth(&mut rng)
        } else {
            DistrictProfile::typical(&mut rng)
        };

        for t in 0..arg.periods {
            let period = arg.start.offset(i64::try_from(t)?);
            #[expect(clippy::cast_precision_loss)]
            let growth = (1.0 + profile.trend).powf(t as f64) * noise.sample(&mut rng).max(0.5);
            records.push(DistrictPeriodRecord {
                state: state.clone(),
                district: district.clone(),
                period,
                enrolments: sample_count(&mut rng, profile.enrolment_rate * growth)?,
                biometric_updates: sample_count(&mut rng, profile.biometric_rate * growth)?,
                demographic_updates: sample_count(&mut rng, profile.demographic_rate * growth)?,
            });
        }
    }
    Ok(records)
}

fn sample_count<R>(rng: &mut R, rate: f64) -> anyhow::Result<i64>
where
    R: Rng + ?Sized,
{
    let poisson =
        Poisson::new(rate).map_err(|e| anyhow::anyhow!("invalid Poisson rate {rate}: {e}"))?;
    #[expect(clippy::cast_possible_truncation)]
    let count = poisson.sample(rng).round() as i64;
    Ok(count)
}
