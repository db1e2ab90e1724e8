use serde::{Deserialize, Serialize};
use vistara_features::{FeatureKind, FeatureVector};
use vistara_records::DistrictId;
use vistara_stats::{descriptive::DescriptiveStats, percentiles::compute_percentile};

use crate::forest::{ForestParams, IsolationForest};

/// Parameters for fitting an [`AnomalyModel`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScorerParams {
    pub forest: ForestParams,
    /// Smallest population for which ensemble statistics are meaningful.
    pub min_population: usize,
    /// Scores strictly above this percentile (in `(0, 1)`) of the run are flagged.
    pub flag_percentile: f64,
    /// Scores strictly above this percentile, but not flagged, are medium risk.
    pub medium_risk_percentile: f64,
}

impl Default for ScorerParams {
    fn default() -> Self {
        Self {
            forest: ForestParams::default(),
            min_population: 10,
            flag_percentile: 0.95,
            medium_risk_percentile: 0.80,
        }
    }
}

/// Largest accepted ensemble.
pub const MAX_ENSEMBLE_SIZE: usize = 10_000;
/// Largest accepted explicit depth cap.
pub const MAX_TREE_DEPTH: usize = 64;

#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum EnsembleParamsError {
    #[display("ensemble size {size} must be between 1 and 10000")]
    EnsembleSize { size: usize },
    #[display("max tree depth {depth} must be between 1 and 64")]
    TreeDepth { depth: usize },
    #[display("subsample size {size} must be at least 2")]
    SubsampleSize { size: usize },
    #[display("minimum population {size} must be at least 2")]
    MinPopulation { size: usize },
    #[display("{name} {value} must lie strictly between 0 and 1")]
    Percentile { name: &'static str, value: f64 },
    #[display("medium risk percentile {medium} must be below flag percentile {flag}")]
    InvertedPercentiles { medium: f64, flag: f64 },
}

impl ScorerParams {
    pub fn validate(&self) -> Result<(), EnsembleParamsError> {
        let ForestParams {
            ensemble_size,
            subsample_size,
            max_tree_depth,
            ..
        } = self.forest;
        if !(1..=MAX_ENSEMBLE_SIZE).contains(&ensemble_size) {
            return Err(EnsembleParamsError::EnsembleSize {
                size: ensemble_size,
            });
        }
        if let Some(depth) = max_tree_depth
            && !(1..=MAX_TREE_DEPTH).contains(&depth)
        {
            return Err(EnsembleParamsError::TreeDepth { depth });
        }
        if subsample_size < 2 {
            return Err(EnsembleParamsError::SubsampleSize {
                size: subsample_size,
            });
        }
        if self.min_population < 2 {
            return Err(EnsembleParamsError::MinPopulation {
                size: self.min_population,
            });
        }
        for (name, value) in [
            ("anomaly flag percentile", self.flag_percentile),
            ("medium risk percentile", self.medium_risk_percentile),
        ] {
            // also rejects NaN
            if !(value > 0.0 && value < 1.0) {
                return Err(EnsembleParamsError::Percentile { name, value });
            }
        }
        if self.medium_risk_percentile >= self.flag_percentile {
            return Err(EnsembleParamsError::InvertedPercentiles {
                medium: self.medium_risk_percentile,
                flag: self.flag_percentile,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("population of {population} districts is below the minimum of {minimum}")]
pub struct InsufficientDataError {
    pub population: usize,
    pub minimum: usize,
}

/// Why an [`AnomalyModel`] could not be fitted.
#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error, derive_more::IsVariant)]
pub enum FitError {
    #[display("invalid ensemble parameters: {_0}")]
    Params(EnsembleParamsError),
    #[display("{_0}")]
    InsufficientData(InsufficientDataError),
}

impl From<EnsembleParamsError> for FitError {
    fn from(err: EnsembleParamsError) -> Self {
        Self::Params(err)
    }
}

impl From<InsufficientDataError> for FitError {
    fn from(err: InsufficientDataError) -> Self {
        Self::InsufficientData(err)
    }
}

/// Coarse risk bucket derived from the score distribution of a run.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, derive_more::IsVariant,
)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// How far one feature of a district sits from the population mean.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureDeviation {
    pub feature: FeatureKind,
    /// Absolute z-score; `0.0` when the population has no spread in this feature.
    pub deviation: f64,
}

/// Model output for a single feature vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    /// Isolation score in `(0, 1]`; higher is more anomalous.
    pub score: f64,
    /// Average number of splits needed to isolate the vector.
    pub mean_path_length: f64,
    pub is_flagged: bool,
    pub risk_level: RiskLevel,
    /// Features ordered by deviation, largest first.
    pub contributing_features: Vec<FeatureDeviation>,
}

/// Anomaly score of one district.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyScore {
    pub district_id: DistrictId,
    #[serde(flatten)]
    pub assessment: Assessment,
}

/// Score cut-offs computed from one run's score distribution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreThresholds {
    pub flag: f64,
    pub medium_risk: f64,
}

/// A fitted, immutable anomaly model for one run.
#[derive(Debug, Clone)]
pub struct AnomalyModel {
    forest: IsolationForest,
    feature_stats: Vec<DescriptiveStats>,
    thresholds: ScoreThresholds,
    population: usize,
}

impl AnomalyModel {
    /// Fits the ensemble on `population` and derives the run's thresholds.
    ///
    /// `params` are validated first.
    pub fn fit(population: &[FeatureVector], params: &ScorerParams) -> Result<Self, FitError> {
        params.validate()?;
        let insufficient = || InsufficientDataError {
            population: population.len(),
            minimum: params.min_population,
        };
        if population.is_empty() || population.len() < params.min_population {
            return Err(insufficient().into());
        }

        let points = population
            .iter()
            .map(FeatureVector::to_array)
            .collect::<Vec<_>>();
        let forest = IsolationForest::fit(&points, &params.forest);

        let feature_stats = FeatureKind::ALL
            .iter()
            .map(|&kind| DescriptiveStats::new(population.iter().map(|v| v.get(kind))))
            .collect::<Option<Vec<_>>>()
            .ok_or_else(insufficient)?;

        let mut scores = points.iter().map(|p| forest.score(p)).collect::<Vec<_>>();
        scores.sort_by(f64::total_cmp);
        let thresholds = ScoreThresholds {
            flag: compute_percentile(&scores, params.flag_percentile * 100.0),
            medium_risk: compute_percentile(&scores, params.medium_risk_percentile * 100.0),
        };

        log::debug!(
            "fitted anomaly model on {} districts (flag threshold {:.4}, medium threshold {:.4})",
            population.len(),
            thresholds.flag,
            thresholds.medium_risk
        );

        Ok(Self {
            forest,
            feature_stats,
            thresholds,
            population: population.len(),
        })
    }

    #[must_use]
    pub fn thresholds(&self) -> ScoreThresholds {
        self.thresholds
    }

    /// Number of districts the model was fitted on.
    #[must_use]
    pub fn population(&self) -> usize {
        self.population
    }

    /// Scores `vector` against the fitted population.
    #[must_use]
    pub fn assess(&self, vector: &FeatureVector) -> Assessment {
        let point = vector.to_array();
        let mean_path_length = self.forest.mean_path_length(&point);
        let score = self.forest.score(&point);

        let is_flagged = score > self.thresholds.flag;
        let risk_level = if is_flagged {
            RiskLevel::High
        } else if score > self.thresholds.medium_risk {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        };

        let mut contributing_features = FeatureKind::ALL
            .iter()
            .zip(&self.feature_stats)
            .map(|(&feature, stats)| FeatureDeviation {
                feature,
                deviation: stats.abs_z_score(vector.get(feature)),
            })
            .collect::<Vec<_>>();
        contributing_features.sort_by(|a, b| b.deviation.total_cmp(&a.deviation));

        Assessment {
            score,
            mean_path_length,
            is_flagged,
            risk_level,
            contributing_features,
        }
    }
}

/// Scores of a whole population together with the cut-offs they were judged by.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredPopulation {
    pub thresholds: ScoreThresholds,
    /// One entry per input district, in input order.
    pub scores: Vec<AnomalyScore>,
}

/// Fits a model on the given districts and scores each of them.
pub fn score_districts(
    population: &[(DistrictId, FeatureVector)],
    params: &ScorerParams,
) -> Result<ScoredPopulation, FitError> {
    let vectors = population.iter().map(|(_, v)| *v).collect::<Vec<_>>();
    let model = AnomalyModel::fit(&vectors, params)?;
    let scores = population
        .iter()
        .map(|(id, vector)| AnomalyScore {
            district_id: id.clone(),
            assessment: model.assess(vector),
        })
        .collect::<Vec<_>>();

    let flagged = scores.iter().filter(|s| s.assessment.is_flagged).count();
    log::info!(
        "scored {} districts, {flagged} flagged as anomalous",
        model.population()
    );
    Ok(ScoredPopulation {
        thresholds: model.thresholds(),
        scores,
    })
}
