use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{DistrictId, Period};

/// One aggregated row of administrative activity for a district and month.
///
/// Counts are signed as ingested so that a bad upstream row can be rejected
/// with a [`ValidationError`](crate::ValidationError) for its district instead of failing
/// deserialization of the whole batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistrictPeriodRecord {
    pub state: String,
    pub district: String,
    pub period: Period,
    pub enrolments: i64,
    pub biometric_updates: i64,
    pub demographic_updates: i64,
}

impl DistrictPeriodRecord {
    #[must_use]
    pub fn district_id(&self) -> DistrictId {
        DistrictId::new(self.state.clone(), self.district.clone())
    }
}

/// Validated, non-negative counts for one district and month.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateCounts {
    pub enrolments: u64,
    pub biometric_updates: u64,
    pub demographic_updates: u64,
}

impl UpdateCounts {
    /// Biometric plus demographic updates.
    ///
    /// Cannot overflow for counts validated from `i64` input.
    #[must_use]
    pub fn total_updates(&self) -> u64 {
        self.biometric_updates + self.demographic_updates
    }
}

/// Groups records by district, keeping the input order within each group.
///
/// Ordering is deliberately not repaired here: an out-of-order district is a
/// validation failure for that district, reported by [`DistrictSeries::from_records`](crate::DistrictSeries::from_records).
#[must_use]
pub fn group_by_district<'a, I>(records: I) -> BTreeMap<DistrictId, Vec<DistrictPeriodRecord>>
where
    I: IntoIterator<Item = &'a DistrictPeriodRecord>,
{
    let mut groups = BTreeMap::<DistrictId, Vec<DistrictPeriodRecord>>::new();
    for record in records {
        groups
            .entry(record.district_id())
            .or_default()
            .push(record.clone());
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(district: &str, period: &str, enrolments: i64) -> DistrictPeriodRecord {
        DistrictPeriodRecord {
            state: "GOA".to_owned(),
            district: district.to_owned(),
            period: period.parse().unwrap(),
            enrolments,
            biometric_updates: 0,
            demographic_updates: 0,
        }
    }

    #[test]
    fn test_grouping_preserves_order_within_district() {
        let records = [
            record("NORTH", "2025-02", 2),
            record("SOUTH", "2025-01", 10),
            record("NORTH", "2025-01", 1),
        ];
        let groups = group_by_district(&records);
        assert_eq!(groups.len(), 2);
        let north = &groups[&DistrictId::new("GOA", "NORTH")];
        assert_eq!(
            north.iter().map(|r| r.enrolments).collect::<Vec<_>>(),
            vec![2, 1]
        );
    }

    #[test]
    fn test_record_json_shape() {
        let json = r#"{
            "state": "GOA",
            "district": "NORTH",
            "period": "2025-01",
            "enrolments": 100,
            "biometric_updates": 20,
            "demographic_updates": 20
        }"#;
        let record: DistrictPeriodRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.district_id(), DistrictId::new("GOA", "NORTH"));
        assert_eq!(record.enrolments, 100);
    }

    #[test]
    fn test_counts_total() {
        let a = UpdateCounts {
            enrolments: 1,
            biometric_updates: 2,
            demographic_updates: 3,
        };
        assert_eq!(a.total_updates(), 5);

        let max = u64::try_from(i64::MAX).unwrap();
        let b = UpdateCounts {
            enrolments: 0,
            biometric_updates: max,
            demographic_updates: max,
        };
        assert_eq!(b.total_updates(), u64::MAX - 1);
    }
}
