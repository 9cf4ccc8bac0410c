//! Tree ensembles: random forest and gradient boosting
//!
//! Both are built from the same CART regression tree, which splits on the
//! threshold giving the largest reduction in squared error.

use super::{check_training_input, Regressor};
use crate::error::Result;
use ndarray::{Array1, ArrayView1, ArrayView2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Depth bound for trees grown without an explicit limit
const MAX_TREE_DEPTH: usize = 64;

/// Minimum relative squared-error reduction for a split to count
const MIN_SPLIT_GAIN: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TreeNode {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// CART regression tree stored as a flat node arena, root at index 0
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    pub nodes: Vec<TreeNode>,
}

impl RegressionTree {
    /// Grow a tree over the given sample indices (repeats allowed)
    pub fn grow(
        x: ArrayView2<f64>,
        y: ArrayView1<f64>,
        samples: &[usize],
        max_depth: Option<usize>,
    ) -> Self {
        let mut tree = Self::default();
        let mut samples = samples.to_vec();
        let depth_limit = max_depth.unwrap_or(MAX_TREE_DEPTH).min(MAX_TREE_DEPTH);
        tree.grow_node(x, y, &mut samples, 0, depth_limit);
        tree
    }

    fn grow_node(
        &mut self,
        x: ArrayView2<f64>,
        y: ArrayView1<f64>,
        samples: &mut [usize],
        depth: usize,
        depth_limit: usize,
    ) -> usize {
        let id = self.nodes.len();
        let value = mean(y, samples);
        self.nodes.push(TreeNode::Leaf { value });

        if depth >= depth_limit || samples.len() < 2 {
            return id;
        }
        let Some((feature, threshold)) = best_split(x, y, samples) else {
            return id;
        };

        // Partition in place: left side holds values <= threshold
        let mut boundary = 0;
        for i in 0..samples.len() {
            if x[[samples[i], feature]] <= threshold {
                samples.swap(i, boundary);
                boundary += 1;
            }
        }
        let (left_samples, right_samples) = samples.split_at_mut(boundary);

        let left = self.grow_node(x, y, left_samples, depth + 1, depth_limit);
        let right = self.grow_node(x, y, right_samples, depth + 1, depth_limit);
        self.nodes[id] = TreeNode::Split {
            feature,
            threshold,
            left,
            right,
        };
        id
    }

    pub fn predict_row(&self, row: ArrayView1<f64>) -> f64 {
        let mut idx = 0;
        loop {
            match self.nodes.get(idx) {
                Some(TreeNode::Leaf { value }) => return *value,
                Some(TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let v = row.get(*feature).copied().unwrap_or(0.0);
                    idx = if v <= *threshold { *left } else { *right };
                }
                None => return 0.0,
            }
        }
    }

    pub fn depth(&self) -> usize {
        fn walk(nodes: &[TreeNode], idx: usize) -> usize {
            match nodes.get(idx) {
                Some(TreeNode::Split { left, right, .. }) => {
                    1 + walk(nodes, *left).max(walk(nodes, *right))
                }
                _ => 0,
            }
        }
        walk(&self.nodes, 0)
    }

    /// Check the arena is a pre-order tree over `width` features
    ///
    /// Every child index must point past its parent and inside the arena,
    /// which rules out cycles and dangling links.
    pub fn validate(&self, width: usize) -> std::result::Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }
        for (id, node) in self.nodes.iter().enumerate() {
            match node {
                TreeNode::Leaf { value } => {
                    if !value.is_finite() {
                        return Err(format!("leaf {} holds non-finite value", id));
                    }
                }
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if *feature >= width {
                        return Err(format!(
                            "node {} splits on feature {}, encoder produces {}",
                            id, feature, width
                        ));
                    }
                    if threshold.is_nan() {
                        return Err(format!("node {} has NaN threshold", id));
                    }
                    for child in [*left, *right] {
                        if child <= id || child >= self.nodes.len() {
                            return Err(format!("node {} links to invalid child {}", id, child));
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

fn mean(y: ArrayView1<f64>, samples: &[usize]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().map(|&i| y[i]).sum::<f64>() / samples.len() as f64
}

/// Best `(feature, threshold)` by squared-error reduction, if any split helps
fn best_split(x: ArrayView2<f64>, y: ArrayView1<f64>, samples: &[usize]) -> Option<(usize, f64)> {
    let n = samples.len() as f64;
    let total_sum: f64 = samples.iter().map(|&i| y[i]).sum();
    let parent_score = total_sum * total_sum / n;

    let min_gain = MIN_SPLIT_GAIN * parent_score.abs().max(1.0);
    let mut best: Option<(usize, f64, f64)> = None;
    let mut order = samples.to_vec();

    for feature in 0..x.ncols() {
        order.sort_by(|&a, &b| {
            x[[a, feature]]
                .partial_cmp(&x[[b, feature]])
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut left_sum = 0.0;
        for k in 0..order.len() - 1 {
            left_sum += y[order[k]];
            let here = x[[order[k], feature]];
            let next = x[[order[k + 1], feature]];
            if next <= here {
                continue;
            }
            let left_n = (k + 1) as f64;
            let right_n = n - left_n;
            let right_sum = total_sum - left_sum;
            // SSE reduction = Σl²/nl + Σr²/nr - Σ²/n
            let gain = left_sum * left_sum / left_n + right_sum * right_sum / right_n - parent_score;
            if gain > min_gain && best.map_or(true, |(_, _, g)| gain > g) {
                best = Some((feature, (here + next) / 2.0, gain));
            }
        }
    }

    best.map(|(feature, threshold, _)| (feature, threshold))
}

/// Bagged ensemble of fully grown regression trees
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForestRegressor {
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    pub seed: u64,
    pub trees: Vec<RegressionTree>,
}

impl Default for RandomForestRegressor {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: None,
            seed: 42,
            trees: Vec::new(),
        }
    }
}

impl RandomForestRegressor {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Regressor for RandomForestRegressor {
    fn fit(self, features: ArrayView2<f64>, targets: ArrayView1<f64>) -> Result<Self> {
        check_training_input(features, targets)?;
        let n = targets.len();
        let mut rng = StdRng::seed_from_u64(self.seed);

        let trees: Vec<RegressionTree> = (0..self.n_estimators.max(1))
            .map(|_| {
                let bootstrap: Vec<usize> = (0..n).map(|_| rng.random_range(0..n)).collect();
                RegressionTree::grow(features, targets, &bootstrap, self.max_depth)
            })
            .collect();

        debug!(
            trees = trees.len(),
            max_depth = trees.iter().map(RegressionTree::depth).max().unwrap_or(0),
            "Random forest fitted"
        );
        Ok(Self { trees, ..self })
    }

    fn predict(&self, features: ArrayView2<f64>) -> Array1<f64> {
        if self.trees.is_empty() {
            return Array1::zeros(features.nrows());
        }
        let count = self.trees.len() as f64;
        features
            .rows()
            .into_iter()
            .map(|row| self.trees.iter().map(|t| t.predict_row(row)).sum::<f64>() / count)
            .collect()
    }

    fn validate(&self, width: usize) -> std::result::Result<(), String> {
        if self.trees.is_empty() {
            return Err("forest has no trees".to_string());
        }
        validate_trees(&self.trees, width)
    }
}

/// Least-squares gradient boosting over shallow trees
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoostingRegressor {
    pub n_estimators: usize,
    pub learning_rate: f64,
    pub max_depth: usize,
    /// Initial prediction, the target mean
    pub init: f64,
    pub trees: Vec<RegressionTree>,
}

impl Default for GradientBoostingRegressor {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.1,
            max_depth: 3,
            init: 0.0,
            trees: Vec::new(),
        }
    }
}

impl GradientBoostingRegressor {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Regressor for GradientBoostingRegressor {
    fn fit(self, features: ArrayView2<f64>, targets: ArrayView1<f64>) -> Result<Self> {
        check_training_input(features, targets)?;
        let n = targets.len();
        let all: Vec<usize> = (0..n).collect();
        let init = targets.mean().unwrap_or(0.0);

        let mut current = Array1::from_elem(n, init);
        let mut trees = Vec::with_capacity(self.n_estimators);
        for _ in 0..self.n_estimators {
            let residuals = &targets - &current;
            let tree = RegressionTree::grow(features, residuals.view(), &all, Some(self.max_depth));
            for (i, row) in features.rows().into_iter().enumerate() {
                current[i] += self.learning_rate * tree.predict_row(row);
            }
            trees.push(tree);
        }

        debug!(stages = trees.len(), init, "Gradient boosting fitted");
        Ok(Self { init, trees, ..self })
    }

    fn predict(&self, features: ArrayView2<f64>) -> Array1<f64> {
        features
            .rows()
            .into_iter()
            .map(|row| {
                self.init
                    + self.learning_rate * self.trees.iter().map(|t| t.predict_row(row)).sum::<f64>()
            })
            .collect()
    }

    fn validate(&self, width: usize) -> std::result::Result<(), String> {
        if !self.init.is_finite() || !self.learning_rate.is_finite() {
            return Err("boosting parameters contain non-finite values".to_string());
        }
        validate_trees(&self.trees, width)
    }
}

fn validate_trees(trees: &[RegressionTree], width: usize) -> std::result::Result<(), String> {
    for (i, tree) in trees.iter().enumerate() {
        tree.validate(width)
            .map_err(|reason| format!("tree {}: {}", i, reason))?;
    }
    Ok(())
}
