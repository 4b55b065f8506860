//! Isolation Forest implementation
//!
//! Anomaly detection using isolation trees. Anomalies are easier to isolate
//! and thus have shorter path lengths in the trees.
//!
//! Scores follow the usual convention: `raw = -2^(-E[h(x)] / c(ψ))`, so lower
//! means more anomalous. The decision boundary (`offset`) is the
//! `contamination` quantile of the training scores.

use ndarray::{ArrayView1, ArrayView2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use rayon::ThreadPool;
use serde::{Deserialize, Serialize};

use super::score::quantile;
use crate::logic::config::ModelConfig;
use crate::logic::error::{PipelineError, PipelineResult};

const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

/// Average path length of an unsuccessful BST search over `n` points (c(n))
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

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IsolationForest {
    trees: Vec<IsolationTree>,
    /// Rows actually drawn per tree (ψ)
    max_samples: usize,
    n_features: usize,
    /// Raw scores below this are outliers
    offset: f64,
}

impl IsolationForest {
    /// Fit a fresh forest. Every tree gets its own seed drawn from
    /// `config.seed`, so the result does not depend on the pool size.
    pub fn fit(
        data: ArrayView2<'_, f64>,
        config: &ModelConfig,
        pool: &ThreadPool,
    ) -> PipelineResult<Self> {
        let (n_rows, n_features) = data.dim();
        if n_rows == 0 || n_features == 0 {
            return Err(PipelineError::EmptyTrainingSet);
        }
        for row in data.rows() {
            check_finite(row)?;
        }

        let max_samples = config.max_samples.min(n_rows);
        let max_depth = (max_samples.max(2) as f64).log2().ceil() as usize;

        let mut master = StdRng::seed_from_u64(config.seed);
        let seeds: Vec<u64> = (0..config.n_estimators).map(|_| master.gen()).collect();

        let trees: Vec<IsolationTree> = pool.install(|| {
            seeds
                .par_iter()
                .map(|&seed| IsolationTree::grow(data, max_samples, max_depth, seed))
                .collect()
        });

        let mut forest = Self {
            trees,
            max_samples,
            n_features,
            offset: 0.0,
        };

        let mut train_scores = forest.score_batch(data, pool);
        train_scores.sort_by(f64::total_cmp);
        forest.offset = quantile(&train_scores, config.contamination);

        log::debug!(
            "Fitted {} trees (psi={}, depth<={}), offset={:.6}",
            forest.trees.len(),
            max_samples,
            max_depth,
            forest.offset
        );

        Ok(forest)
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    /// Raw score of one row; caller checks the row length
    pub fn score_row(&self, row: ArrayView1<'_, f64>) -> f64 {
        if self.trees.is_empty() {
            return 0.0;
        }

        let total: f64 = self.trees.iter().map(|tree| tree.path_length(row)).sum();
        let mean_depth = total / self.trees.len() as f64;
        // c(1) = 0 when the forest was fit on a single row
        let norm = average_path_length(self.max_samples).max(1.0);

        -(2.0_f64).powf(-mean_depth / norm)
    }

    pub fn score_batch(&self, data: ArrayView2<'_, f64>, pool: &ThreadPool) -> Vec<f64> {
        pool.install(|| {
            (0..data.nrows())
                .into_par_iter()
                .map(|i| self.score_row(data.row(i)))
                .collect()
        })
    }

    pub fn is_outlier(&self, raw_score: f64) -> bool {
        raw_score < self.offset
    }

    /// Structural sanity for a forest read back from disk
    pub(crate) fn is_well_formed(&self) -> bool {
        self.n_features > 0
            && self.max_samples > 0
            && self.offset.is_finite()
            && !self.trees.is_empty()
            && self.trees.iter().all(|t| t.is_well_formed(self.n_features))
    }
}

/// Reject NaN / inf; the index is the offending column
pub(crate) fn check_finite(row: ArrayView1<'_, f64>) -> PipelineResult<()> {
    match row.iter().position(|v| !v.is_finite()) {
        Some(index) => Err(PipelineError::NonFiniteFeature { index }),
        None => Ok(()),
    }
}

// ============================================================================
// TREE
// ============================================================================

/// Node in an isolation tree; children are indices into the tree's arena
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        size: usize,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IsolationTree {
    nodes: Vec<Node>,
}

impl IsolationTree {
    fn grow(data: ArrayView2<'_, f64>, max_samples: usize, max_depth: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let rows = rand::seq::index::sample(&mut rng, data.nrows(), max_samples).into_vec();

        let mut tree = Self { nodes: Vec::new() };
        tree.build(data, rows, 0, max_depth, &mut rng);
        tree
    }

    fn build(
        &mut self,
        data: ArrayView2<'_, f64>,
        rows: Vec<usize>,
        depth: usize,
        max_depth: usize,
        rng: &mut StdRng,
    ) -> usize {
        let id = self.nodes.len();
        self.nodes.push(Node::Leaf { size: rows.len() });

        if depth >= max_depth || rows.len() <= 1 {
            return id;
        }

        // only features that still vary inside this node can split it
        let candidates: Vec<(usize, f64, f64)> = (0..data.ncols())
            .filter_map(|feature| {
                let (min, max) = rows.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &r| {
                    let v = data[[r, feature]];
                    (lo.min(v), hi.max(v))
                });
                (max > min).then_some((feature, min, max))
            })
            .collect();

        if candidates.is_empty() {
            return id;
        }

        let (feature, min, max) = candidates[rng.gen_range(0..candidates.len())];
        // interpolate instead of sampling `min..max`, the span can overflow to inf
        let t: f64 = rng.gen();
        let mut threshold = (min * (1.0 - t) + max * t).clamp(min, max);
        if threshold >= max {
            threshold = min;
        }

        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) =
            rows.into_iter().partition(|&r| data[[r, feature]] < threshold);

        let left = self.build(data, left_rows, depth + 1, max_depth, rng);
        let right = self.build(data, right_rows, depth + 1, max_depth, rng);

        self.nodes[id] = Node::Split {
            feature,
            threshold,
            left,
            right,
        };
        id
    }

    /// Edges from root to the leaf reached by `row`, plus c(leaf size)
    fn path_length(&self, row: ArrayView1<'_, f64>) -> f64 {
        let mut id = 0;
        let mut depth = 0.0;

        loop {
            match self.nodes.get(id) {
                Some(Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    id = if row[*feature] < *threshold { *left } else { *right };
                    depth += 1.0;
                }
                Some(Node::Leaf { size }) => return depth + average_path_length(*size),
                None => return depth,
            }
        }
    }

    fn is_well_formed(&self, n_features: usize) -> bool {
        let n = self.nodes.len();
        n > 0
            && self.nodes.iter().enumerate().all(|(id, node)| match node {
                // children always come after their parent, so no cycles
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    *feature < n_features
                        && threshold.is_finite()
                        && *left > id
                        && *right > id
                        && *left < n
                        && *right < n
                }
                Node::Leaf { .. } => true,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2};

    fn pool() -> ThreadPool {
        rayon::ThreadPoolBuilder::new().num_threads(2).build().unwrap()
    }

    fn cluster(n: usize) -> Array2<f64> {
        let mut rng = StdRng::seed_from_u64(7);
        Array2::from_shape_fn((n, 3), |_| rng.gen_range(9.0..11.0))
    }

    #[test]
    fn test_average_path_length() {
        assert_eq!(average_path_length(1), 0.0);
        assert_eq!(average_path_length(2), 1.0);

        let c_10 = average_path_length(10);
        let c_256 = average_path_length(256);
        assert!(c_256 > c_10, "c(256)={} should be > c(10)={}", c_256, c_10);
    }

    #[test]
    fn test_fit_builds_configured_trees() {
        let config = ModelConfig {
            n_estimators: 10,
            ..Default::default()
        };
        let forest = IsolationForest::fit(cluster(50).view(), &config, &pool()).unwrap();

        assert_eq!(forest.n_trees(), 10);
        assert_eq!(forest.n_features(), 3);
        assert!(forest.is_well_formed());
    }

    #[test]
    fn test_outlier_scores_lower() {
        let forest =
            IsolationForest::fit(cluster(200).view(), &ModelConfig::default(), &pool()).unwrap();

        let normal = forest.score_row(array![10.5, 10.5, 10.5].view());
        let outlier = forest.score_row(array![500.0, -300.0, 90.0].view());

        assert!(outlier < normal, "outlier={} normal={}", outlier, normal);
        assert!(forest.is_outlier(outlier));
        assert!((-1.0..0.0).contains(&normal));
    }

    #[test]
    fn test_same_seed_same_forest_any_pool_size() {
        let data = cluster(120);
        let config = ModelConfig::default();
        let single = rayon::ThreadPoolBuilder::new().num_threads(1).build().unwrap();

        let a = IsolationForest::fit(data.view(), &config, &single).unwrap();
        let b = IsolationForest::fit(data.view(), &config, &pool()).unwrap();

        let point = array![11.0, 9.0, 10.2];
        assert_eq!(a.score_row(point.view()), b.score_row(point.view()));
        assert_eq!(a.offset(), b.offset());
    }

    #[test]
    fn test_constant_data_gives_single_leaf_trees() {
        let data = Array2::from_elem((20, 2), 1.0);
        let forest = IsolationForest::fit(data.view(), &ModelConfig::default(), &pool()).unwrap();

        // every point sits in one leaf of size 20, so everything ties
        let a = forest.score_row(array![1.0, 1.0].view());
        let b = forest.score_row(array![99.0, -5.0].view());
        assert_eq!(a, b);
    }

    #[test]
    fn test_non_finite_rejected() {
        let mut data = cluster(10);
        data[[3, 2]] = f64::NAN;
        let err = IsolationForest::fit(data.view(), &ModelConfig::default(), &pool()).unwrap_err();
        assert!(matches!(err, PipelineError::NonFiniteFeature { index: 2 }));
    }

    #[test]
    fn test_extreme_feature_span_splits() {
        let mut data = Array2::from_shape_fn((20, 2), |(i, j)| (i * (j + 1)) as f64);
        data[[0, 0]] = -1e308;
        data[[1, 0]] = 1e308;

        let forest = IsolationForest::fit(data.view(), &ModelConfig::default(), &pool()).unwrap();

        assert!(forest.is_well_formed());
        assert!(forest.offset().is_finite());
        for row in data.rows() {
            let score = forest.score_row(row);
            assert!(score.is_finite() && score < 0.0, "score={}", score);
        }
    }

    #[test]
    fn test_empty_rejected() {
        let data = Array2::<f64>::zeros((0, 4));
        let err = IsolationForest::fit(data.view(), &ModelConfig::default(), &pool()).unwrap_err();
        assert!(matches!(err, PipelineError::EmptyTrainingSet));
    }
}
