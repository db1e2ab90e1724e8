//! Unsupervised anomaly scoring for district feature vectors.
//!
//! Districts are compared only against the other districts of the same run:
//! there is no training set and nothing is carried over between runs. Each
//! call to [`AnomalyModel::fit`] builds a fresh, immutable model.
//!
//! # How Scoring Works
//!
//! 1. **Ensemble** ([`forest::IsolationForest`]) - Build `T` random partition trees.
//!    Each tree picks a feature uniformly at random and a split value uniformly
//!    inside that feature's observed range, recursively, until a node holds a
//!    single district or the depth cap is hit.
//! 2. **Path length** - Count the splits needed to isolate a district in each
//!    tree and average them. Outliers are isolated in few splits.
//! 3. **Score** - Normalize the average by the expected path length of an
//!    unsuccessful binary-search-tree lookup, `c(n)`, and map it to
//!    `2^(-E[h] / c(n))`, which lies in `(0, 1]`; higher is more anomalous.
//! 4. **Flag** - Flag districts whose score is strictly above the score at the
//!    configured percentile of this run's distribution, so at most
//!    `(1 - percentile)` of the population is flagged.
//! 5. **Explain** - Rank each feature's absolute z-score against the population.
//!
//! # Determinism
//!
//! All randomness flows from an explicit `seed`. Per-tree seeds are drawn from
//! a master generator before trees are distributed over worker threads, and
//! results are joined back in tree order, so the same seed and input always
//! produce bit-identical scores regardless of the worker count.
//!
//! # Example
//!
//! ```
//! use vistara_anomaly::{AnomalyModel, ScorerParams};
//! use vistara_features::FeatureVector;
//!
//! let mut population = (0..30)
//!     .map(|i| FeatureVector {
//!         velocity: f64::from(i % 5),
//!         divergence_ratio: 0.1,
//!         migration_index: 0.3,
//!     })
//!     .collect::<Vec<_>>();
//! population.push(FeatureVector {
//!     velocity: 500.0,
//!     divergence_ratio: -0.9,
//!     migration_index: 40.0,
//! });
//!
//! let model = AnomalyModel::fit(&population, &ScorerParams::default()).unwrap();
//! let outlier = model.assess(&population[30]);
//! let typical = model.assess(&population[0]);
//! assert!(outlier.score > typical.score);
//! assert!(outlier.is_flagged);
//! ```

pub use self::scorer::*;

pub mod forest;
mod scorer;
