use serde::{Deserialize, Serialize};

use crate::{DistrictId, DistrictPeriodRecord, Period, UpdateCounts};

/// Reasons a district's records cannot be analysed.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum ValidationError {
    #[display("no records for district")]
    EmptySeries,
    #[display("{field} is negative ({value}) in period {period}")]
    NegativeCount {
        period: Period,
        field: &'static str,
        value: i64,
    },
    #[display("period {period} appears more than once")]
    DuplicatePeriod { period: Period },
    #[display("period {current} follows {previous}; periods must be strictly increasing")]
    NonMonotonicPeriod { previous: Period, current: Period },
    #[display("{field} name '{name}' must be non-empty, without '/' or surrounding whitespace")]
    MalformedName { field: &'static str, name: String },
    #[display("record for {found} grouped under {expected}")]
    MismatchedDistrict {
        expected: DistrictId,
        found: DistrictId,
    },
}

/// A validated observation for one month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    pub period: Period,
    pub counts: UpdateCounts,
}

/// A district's validated time series.
///
/// Invariants: non-empty, strictly increasing periods, all counts non-negative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistrictSeries {
    id: DistrictId,
    observations: Vec<Observation>,
}

impl DistrictSeries {
    /// Validates a district's records, in the order given.
    pub fn from_records(
        id: DistrictId,
        records: &[DistrictPeriodRecord],
    ) -> Result<Self, ValidationError> {
        if records.is_empty() {
            return Err(ValidationError::EmptySeries);
        }
        if let Some((field, name)) = id.malformed_part() {
            return Err(ValidationError::MalformedName {
                field,
                name: name.to_owned(),
            });
        }

        let mut observations: Vec<Observation> = Vec::with_capacity(records.len());
        for record in records {
            let found = record.district_id();
            if found != id {
                return Err(ValidationError::MismatchedDistrict {
                    expected: id,
                    found,
                });
            }
            if let Some(previous) = observations.last().map(|o| o.period) {
                if record.period == previous {
                    return Err(ValidationError::DuplicatePeriod {
                        period: record.period,
                    });
                }
                if record.period < previous {
                    return Err(ValidationError::NonMonotonicPeriod {
                        previous,
                        current: record.period,
                    });
                }
            }
            observations.push(Observation {
                period: record.period,
                counts: validate_counts(record)?,
            });
        }

        Ok(Self { id, observations })
    }

    #[must_use]
    pub fn id(&self) -> &DistrictId {
        &self.id
    }

    #[must_use]
    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }
}

fn validate_counts(record: &DistrictPeriodRecord) -> Result<UpdateCounts, ValidationError> {
    let check = |field: &'static str, value: i64| {
        u64::try_from(value).map_err(|_| ValidationError::NegativeCount {
            period: record.period,
            field,
            value,
        })
    };
    Ok(UpdateCounts {
        enrolments: check("enrolments", record.enrolments)?,
        biometric_updates: check("biometric_updates", record.biometric_updates)?,
        demographic_updates: check("demographic_updates", record.demographic_updates)?,
    })
}
