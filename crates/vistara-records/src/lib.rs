//! Core input types for district update analytics.
//!
//! Records arrive from the ingestion collaborator as one row per
//! (district, month), already aggregated and schema-checked. This crate owns
//! the identifiers and the validation step that turns raw rows into
//! per-district series the rest of the pipeline can trust:
//!
//! ```text
//! DistrictPeriodRecord (raw, signed counts)
//!     ↓ group_by_district
//! (DistrictId, Vec<DistrictPeriodRecord>)
//!     ↓ DistrictSeries::from_records  (ValidationError on bad rows)
//! DistrictSeries (non-negative counts, strictly increasing periods)
//! ```
//!
//! # Identifiers
//!
//! - [`Period`]: a calendar month, serialized as `"YYYY-MM"`
//! - [`DistrictId`]: `(state, district)`, serialized as `"STATE/DISTRICT"`
//! - [`RegionId`]: either a district or a whole state, used to key forecasts

pub use self::{period::*, record::*, region::*, series::*};

mod period;
mod record;
mod region;
mod series;
