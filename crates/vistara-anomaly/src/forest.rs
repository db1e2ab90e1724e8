//! Isolation forest over fixed-width feature points.
//!
//! The forest is a run-scoped value: it is built once from the population being
//! scored and is never mutated afterwards. Trees hold no reference to the
//! training points, only split thresholds and leaf sizes.

use std::{num::NonZeroUsize, thread};

use rand::{Rng, SeedableRng as _, seq::index};
use rand_pcg::Pcg64;

/// Euler-Mascheroni constant, used in the harmonic number approximation.
const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

/// Parameters controlling how an [`IsolationForest`] is grown.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForestParams {
    /// Number of trees in the ensemble.
    pub ensemble_size: usize,
    /// Number of points drawn (without replacement) to grow each tree.
    /// Capped at the population size.
    pub subsample_size: usize,
    /// Depth cap. `None` derives `ceil(log2(sample size))`.
    pub max_tree_depth: Option<usize>,
    /// Seed for all randomness in the forest.
    pub seed: u64,
    /// Number of worker threads used to grow trees.
    pub worker_threads: NonZeroUsize,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            ensemble_size: 100,
            subsample_size: 256,
            max_tree_depth: None,
            seed: 42,
            worker_threads: NonZeroUsize::MIN,
        }
    }
}

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        size: usize,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

/// A single random partition tree.
#[derive(Debug, Clone)]
pub struct IsolationTree {
    root: Node,
}

impl IsolationTree {
    /// Grows a tree from the points selected by `indices`.
    fn grow<const D: usize, R>(
        points: &[[f64; D]],
        indices: &mut [usize],
        max_depth: usize,
        rng: &mut R,
    ) -> Self
    where
        R: Rng + ?Sized,
    {
        Self {
            root: grow_node(points, indices, 0, max_depth, rng),
        }
    }

    /// Number of splits needed to isolate `point`, with the expected remaining
    /// depth added when the walk ends in a leaf that still holds several points.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn path_length<const D: usize>(&self, point: &[f64; D]) -> f64 {
        let mut node = &self.root;
        let mut depth = 0_usize;
        loop {
            match node {
                Node::Leaf { size } => return depth as f64 + average_path_length(*size),
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if point[*feature] < *threshold {
                        left
                    } else {
                        right
                    };
                    depth += 1;
                }
            }
        }
    }
}

fn grow_node<const D: usize, R>(
    points: &[[f64; D]],
    indices: &mut [usize],
    depth: usize,
    max_depth: usize,
    rng: &mut R,
) -> Node
where
    R: Rng + ?Sized,
{
    if indices.len() <= 1 || depth >= max_depth {
        return Node::Leaf {
            size: indices.len(),
        };
    }

    // features that can still separate this subset
    let mut candidates = [(0_usize, 0.0_f64, 0.0_f64); D];
    let mut num_candidates = 0;
    for feature in 0..D {
        let (min, max) = indices.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &i| {
            (lo.min(points[i][feature]), hi.max(points[i][feature]))
        });
        if min < max {
            candidates[num_candidates] = (feature, min, max);
            num_candidates += 1;
        }
    }
    if num_candidates == 0 {
        return Node::Leaf {
            size: indices.len(),
        };
    }

    let (feature, min, max) = candidates[rng.random_range(0..num_candidates)];
    let threshold = rng.random_range(min..max);

    let split = partition(indices, |i| points[i][feature] < threshold);
    let (left, right) = indices.split_at_mut(split);
    Node::Split {
        feature,
        threshold,
        left: Box::new(grow_node(points, left, depth + 1, max_depth, rng)),
        right: Box::new(grow_node(points, right, depth + 1, max_depth, rng)),
    }
}

/// Reorders `indices` so that entries satisfying `pred` come first; returns their count.
fn partition<F>(indices: &mut [usize], pred: F) -> usize
where
    F: Fn(usize) -> bool,
{
    let mut split = 0;
    for j in 0..indices.len() {
        if pred(indices[j]) {
            indices.swap(split, j);
            split += 1;
        }
    }
    split
}

/// Expected path length `c(n)` of an unsuccessful search in a binary search
/// tree of `n` points: `2 H(n - 1) - 2 (n - 1) / n`.
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}

/// Default depth cap for a tree grown on `sample_size` points.
#[expect(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
#[must_use]
pub fn default_max_depth(sample_size: usize) -> usize {
    (sample_size.max(2) as f64).log2().ceil() as usize
}

/// An ensemble of isolation trees fitted on one population.
#[derive(Debug, Clone)]
pub struct IsolationForest {
    trees: Vec<IsolationTree>,
    sample_size: usize,
    max_depth: usize,
}

impl IsolationForest {
    /// Grows the ensemble.
    ///
    /// Returns an empty forest (which scores every point `1.0`) when `points`
    /// is empty or `ensemble_size` is zero; callers are expected to validate
    /// population size first.
    #[must_use]
    pub fn fit<const D: usize>(points: &[[f64; D]], params: &ForestParams) -> Self {
        let sample_size = params.subsample_size.clamp(1, points.len().max(1));
        let max_depth = params
            .max_tree_depth
            .unwrap_or_else(|| default_max_depth(sample_size))
            .max(1);

        if points.is_empty() {
            return Self {
                trees: vec![],
                sample_size,
                max_depth,
            };
        }

        let mut master = Pcg64::seed_from_u64(params.seed);
        let tree_seeds = (0..params.ensemble_size)
            .map(|_| master.random::<u64>())
            .collect::<Vec<_>>();

        let chunk_size = tree_seeds
            .len()
            .div_ceil(params.worker_threads.get())
            .max(1);
        let grow_chunk = |seeds: &[u64]| {
            seeds
                .iter()
                .map(|&seed| {
                    let mut rng = Pcg64::seed_from_u64(seed);
                    let mut indices = index::sample(&mut rng, points.len(), sample_size).into_vec();
                    IsolationTree::grow(points, &mut indices, max_depth, &mut rng)
                })
                .collect::<Vec<_>>()
        };

        let grow_chunk = &grow_chunk;
        let trees = thread::scope(|s| {
            let handles = tree_seeds
                .chunks(chunk_size)
                .map(|seeds| s.spawn(move || grow_chunk(seeds)))
                .collect::<Vec<_>>();
            handles
                .into_iter()
                .flat_map(|handle| {
                    handle
                        .join()
                        .unwrap_or_else(|panic| std::panic::resume_unwind(panic))
                })
                .collect::<Vec<_>>()
        });

        log::debug!(
            "grew {} isolation trees (sample size {sample_size}, depth cap {max_depth})",
            trees.len()
        );

        Self {
            trees,
            sample_size,
            max_depth,
        }
    }

    #[must_use]
    pub fn trees(&self) -> &[IsolationTree] {
        &self.trees
    }

    #[must_use]
    pub fn sample_size(&self) -> usize {
        self.sample_size
    }

    #[must_use]
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Average path length of `point` over all trees.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn mean_path_length<const D: usize>(&self, point: &[f64; D]) -> f64 {
        if self.trees.is_empty() {
            return 0.0;
        }
        let total = self
            .trees
            .iter()
            .map(|tree| tree.path_length(point))
            .sum::<f64>();
        total / self.trees.len() as f64
    }

    /// Anomaly score `2^(-E[h] / c(sample size))` in `(0, 1]`.
    #[must_use]
    pub fn score<const D: usize>(&self, point: &[f64; D]) -> f64 {
        score_from_path_length(self.mean_path_length(point), self.sample_size)
    }
}

/// Maps an average path length to a score in `(0, 1]`.
#[must_use]
pub fn score_from_path_length(mean_path_length: f64, sample_size: usize) -> f64 {
    let c = average_path_length(sample_size);
    if c <= 0.0 {
        return 1.0;
    }
    2.0_f64.powf(-mean_path_length / c)
}
