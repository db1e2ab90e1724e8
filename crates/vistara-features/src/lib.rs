//! Feature derivation for district update activity.
//!
//! Turns a district's monthly counts into three engineered indicators, one
//! [`FeatureVector`] per (district, month):
//!
//! | feature            | formula                                              |
//! |--------------------|------------------------------------------------------|
//! | `velocity`         | Δ(biometric + demographic) / months since previous   |
//! | `divergence_ratio` | (biometric − demographic) / (biometric + demographic) |
//! | `migration_index`  | demographic / max(enrolments, 1)                     |
//!
//! # Baselines and sentinels
//!
//! - The first month of a district has no predecessor; its velocity is the
//!   baseline `0.0` and the row is kept, so every input month yields a vector.
//! - `divergence_ratio` is `0.0` when a month has no updates at all.
//! - `migration_index` never divides by zero thanks to the `max(enrolments, 1)` floor.
//!
//! Every value produced is finite.
//!
//! # Example
//!
//! ```
//! use vistara_features::derive_features;
//! use vistara_records::{DistrictId, DistrictPeriodRecord};
//!
//! let rows = [("2025-01", 100, 20), ("2025-02", 120, 40)].map(|(period, enrolments, demo)| {
//!     DistrictPeriodRecord {
//!         state: "S".to_owned(),
//!         district: "D1".to_owned(),
//!         period: period.parse().unwrap(),
//!         enrolments,
//!         biometric_updates: 20,
//!         demographic_updates: demo,
//!     }
//! });
//! let features = derive_features(DistrictId::new("S", "D1"), &rows).unwrap();
//! assert_eq!(features.rows().len(), 2);
//! assert_eq!(features.latest().features.velocity, 20.0);
//! ```

pub use self::{derive::*, kind::*};

mod derive;
mod kind;
