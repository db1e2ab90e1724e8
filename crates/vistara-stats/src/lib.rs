//! Statistical building blocks for the Vistara analytics pipeline.
//!
//! This crate provides the small set of numeric tools the pipeline relies on:
//!
//! - **Descriptive statistics**: mean, median, variance, standard deviation and z-scores
//! - **Percentiles**: nearest-rank percentile lookup used for score thresholds
//! - **Linear regression**: ordinary least-squares trend fitting with prediction intervals
//!
//! # Modules
//!
//! - [`descriptive`]: Descriptive statistics for summarizing datasets
//! - [`percentiles`]: Nearest-rank percentiles for score cut-offs
//! - [`regression`]: Least-squares line fitting over an evenly spaced index
//!
//! # Examples
//!
//! ## Computing descriptive statistics
//!
//! ```
//! use vistara_stats::descriptive::DescriptiveStats;
//!
//! let values = [1.0, 2.0, 3.0, 4.0, 5.0];
//! let stats = DescriptiveStats::new(values).unwrap();
//! assert_eq!(stats.mean, 3.0);
//! ```
//!
//! ## Thresholding at a percentile
//!
//! ```
//! use vistara_stats::percentiles::compute_percentile;
//!
//! let mut scores = [0.40, 0.45, 0.41, 0.90, 0.43];
//! scores.sort_by(f64::total_cmp);
//! let cut = compute_percentile(&scores, 80.0);
//! assert_eq!(scores.iter().filter(|&&s| s > cut).count(), 0);
//! ```
//!
//! ## Fitting a trend line
//!
//! ```
//! use vistara_stats::regression::LinearFit;
//!
//! let fit = LinearFit::over_index(&[10.0, 12.0, 14.0]).unwrap();
//! assert!((fit.predict(3.0) - 16.0).abs() < 1e-9);
//! ```

pub mod descriptive;
pub mod percentiles;
pub mod regression;
