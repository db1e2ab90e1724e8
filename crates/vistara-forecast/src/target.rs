use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use vistara_records::UpdateCounts;

/// Which monthly count a forecast projects.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum ForecastTarget {
    /// Biometric plus demographic updates.
    #[default]
    TotalUpdates,
    BiometricUpdates,
    DemographicUpdates,
    Enrolments,
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("unknown forecast target '{input}'")]
pub struct ParseForecastTargetError {
    pub input: String,
}

impl ForecastTarget {
    pub const ALL: [ForecastTarget; 4] = [
        ForecastTarget::TotalUpdates,
        ForecastTarget::BiometricUpdates,
        ForecastTarget::DemographicUpdates,
        ForecastTarget::Enrolments,
    ];

    #[must_use]
    pub fn id(self) -> &'static str {
        match self {
            ForecastTarget::TotalUpdates => "total-updates",
            ForecastTarget::BiometricUpdates => "biometric-updates",
            ForecastTarget::DemographicUpdates => "demographic-updates",
            ForecastTarget::Enrolments => "enrolments",
        }
    }

    /// Picks the targeted count out of one month.
    #[must_use]
    pub fn value(self, counts: &UpdateCounts) -> u64 {
        match self {
            ForecastTarget::TotalUpdates => counts.total_updates(),
            ForecastTarget::BiometricUpdates => counts.biometric_updates,
            ForecastTarget::DemographicUpdates => counts.demographic_updates,
            ForecastTarget::Enrolments => counts.enrolments,
        }
    }
}

impl fmt::Display for ForecastTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for ForecastTarget {
    type Err = ParseForecastTargetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|target| target.id() == s)
            .ok_or_else(|| ParseForecastTargetError {
                input: s.to_owned(),
            })
    }
}
