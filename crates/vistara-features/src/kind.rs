use serde::{Deserialize, Serialize};

/// Engineered indicators for one district and month.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    /// Month-over-month change in total updates, per elapsed month.
    pub velocity: f64,
    /// Skew between biometric and demographic updates, in `[-1, 1]`.
    pub divergence_ratio: f64,
    /// Demographic updates per new enrolment. Values well above 1 suggest
    /// population movement rather than organic growth.
    pub migration_index: f64,
}

/// Names one component of a [`FeatureVector`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureKind {
    Velocity,
    DivergenceRatio,
    MigrationIndex,
}

impl FeatureKind {
    pub const ALL: [FeatureKind; 3] = [
        FeatureKind::Velocity,
        FeatureKind::DivergenceRatio,
        FeatureKind::MigrationIndex,
    ];
    pub const LEN: usize = Self::ALL.len();

    #[must_use]
    pub fn id(self) -> &'static str {
        match self {
            FeatureKind::Velocity => "velocity",
            FeatureKind::DivergenceRatio => "divergence_ratio",
            FeatureKind::MigrationIndex => "migration_index",
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            FeatureKind::Velocity => "Update Velocity",
            FeatureKind::DivergenceRatio => "Divergence Ratio",
            FeatureKind::MigrationIndex => "Migration Index",
        }
    }

    #[must_use]
    pub fn index(self) -> usize {
        match self {
            FeatureKind::Velocity => 0,
            FeatureKind::DivergenceRatio => 1,
            FeatureKind::MigrationIndex => 2,
        }
    }
}

impl FeatureVector {
    #[must_use]
    pub fn get(&self, kind: FeatureKind) -> f64 {
        match kind {
            FeatureKind::Velocity => self.velocity,
            FeatureKind::DivergenceRatio => self.divergence_ratio,
            FeatureKind::MigrationIndex => self.migration_index,
        }
    }

    /// Returns the components in [`FeatureKind::ALL`] order.
    #[must_use]
    pub fn to_array(&self) -> [f64; FeatureKind::LEN] {
        FeatureKind::ALL.map(|kind| self.get(kind))
    }

    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.to_array().iter().all(|v| v.is_finite())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_matches_all_order() {
        for (i, kind) in FeatureKind::ALL.into_iter().enumerate() {
            assert_eq!(kind.index(), i);
        }
    }

    #[test]
    fn test_to_array_order() {
        let v = FeatureVector {
            velocity: 1.0,
            divergence_ratio: 2.0,
            migration_index: 3.0,
        };
        assert_eq!(v.to_array(), [1.0, 2.0, 3.0]);
        assert!(v.is_finite());
    }

    #[test]
    fn test_kind_serializes_as_id() {
        for kind in FeatureKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.id()));
        }
    }
}
