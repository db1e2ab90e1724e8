use std::fmt;

use serde::{Deserialize, Serialize};

/// Result of one pipeline stage for one district or region.
///
/// Nothing is dropped from a run: an entity that could not be computed is kept
/// with the reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_more::IsVariant)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum EntityOutcome<T> {
    Computed(T),
    /// The stage did not apply, e.g. an upstream stage failed.
    Skipped { reason: String },
    /// The entity's own input was rejected.
    Failed { reason: String },
}

impl<T> EntityOutcome<T> {
    pub fn skipped(reason: impl fmt::Display) -> Self {
        Self::Skipped {
            reason: reason.to_string(),
        }
    }

    pub fn failed(reason: impl fmt::Display) -> Self {
        Self::Failed {
            reason: reason.to_string(),
        }
    }

    #[must_use]
    pub fn computed(&self) -> Option<&T> {
        match self {
            Self::Computed(value) => Some(value),
            Self::Skipped { .. } | Self::Failed { .. } => None,
        }
    }

    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Computed(_) => None,
            Self::Skipped { reason } | Self::Failed { reason } => Some(reason),
        }
    }
}
