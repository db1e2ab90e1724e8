//! Orchestration of a full analytics run.
//!
//! [`run`] takes one immutable snapshot of records and an [`AnalyticsConfig`]
//! and produces an [`AnalyticsRunResult`]:
//!
//! ```text
//! records ──filter──▶ group by district
//!                         │ derive features (parallel per district)
//!            ┌────────────┴────────────┐
//!            ▼                         ▼
//!   anomaly scoring              forecasting
//!   (latest month of every       (parallel per district,
//!    computed district)           plus state totals)
//!            └────────────┬────────────┘
//!                         ▼
//!        AnalyticsRunResult ──simulate──▶ ScenarioForecast
//! ```
//!
//! Every district and region is present in the result with an
//! [`EntityOutcome`]: computed, skipped, or failed with a reason. Only an
//! invalid configuration or an empty input stops a run.

pub use self::{config::*, outcome::*, result::*, run::*};

mod config;
mod outcome;
mod parallel;
mod result;
mod run;
