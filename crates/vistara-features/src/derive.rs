use serde::{Deserialize, Serialize};
use vistara_records::{
    DistrictId, DistrictPeriodRecord, DistrictSeries, Period, UpdateCounts, ValidationError,
};

use crate::FeatureVector;

/// Counts and derived indicators for one month of a district.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeriodFeatures {
    pub period: Period,
    pub counts: UpdateCounts,
    pub features: FeatureVector,
}

/// All derived rows for one district, in chronological order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistrictFeatures {
    id: DistrictId,
    rows: Vec<PeriodFeatures>,
}

impl DistrictFeatures {
    #[must_use]
    pub fn id(&self) -> &DistrictId {
        &self.id
    }

    #[must_use]
    pub fn rows(&self) -> &[PeriodFeatures] {
        &self.rows
    }

    /// Returns the most recent month.
    ///
    /// # Panics
    ///
    /// Never panics for values built by this crate, which always hold at least one row.
    #[must_use]
    pub fn latest(&self) -> &PeriodFeatures {
        self.rows.last().expect("district features are never empty")
    }
}

/// Validates a district's records and derives one feature row per month.
///
/// Fails with [`ValidationError`] on negative counts or non-increasing periods.
pub fn derive_features(
    id: DistrictId,
    records: &[DistrictPeriodRecord],
) -> Result<DistrictFeatures, ValidationError> {
    let series = DistrictSeries::from_records(id, records)?;
    Ok(derive_series_features(&series))
}

/// Derives features from an already validated series.
#[must_use]
pub fn derive_series_features(series: &DistrictSeries) -> DistrictFeatures {
    let mut previous: Option<(Period, UpdateCounts)> = None;
    let rows = series
        .observations()
        .iter()
        .map(|obs| {
            let velocity = previous.map_or(0.0, |(period, counts)| {
                velocity(counts, obs.counts, obs.period.months_since(period))
            });
            previous = Some((obs.period, obs.counts));
            PeriodFeatures {
                period: obs.period,
                counts: obs.counts,
                features: FeatureVector {
                    velocity,
                    divergence_ratio: divergence_ratio(
                        obs.counts.biometric_updates,
                        obs.counts.demographic_updates,
                    ),
                    migration_index: migration_index(
                        obs.counts.demographic_updates,
                        obs.counts.enrolments,
                    ),
                },
            }
        })
        .collect();

    DistrictFeatures {
        id: series.id().clone(),
        rows,
    }
}

/// Change in total updates per elapsed month.
///
/// `months` is at least 1 for a validated series; anything smaller is treated as 1.
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn velocity(previous: UpdateCounts, current: UpdateCounts, months: i64) -> f64 {
    let delta = current.total_updates() as f64 - previous.total_updates() as f64;
    delta / months.max(1) as f64
}

/// `(bio - demo) / (bio + demo)`, or `0.0` when there are no updates.
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn divergence_ratio(biometric: u64, demographic: u64) -> f64 {
    let total = biometric as f64 + demographic as f64;
    if total == 0.0 {
        return 0.0;
    }
    (biometric as f64 - demographic as f64) / total
}

/// `demo / max(enrolments, 1)`.
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn migration_index(demographic: u64, enrolments: u64) -> f64 {
    demographic as f64 / enrolments.max(1) as f64
}
