//! Decision tree and random forest classifiers.
//!
//! CART trees split on the feature/threshold pair with the largest Gini
//! gain. The random forest bags trees over bootstrap samples, restricts
//! each split to a random subset of features and predicts the class with
//! the highest mean leaf probability across trees.
//!
//! # Example
//!
//! ```
//! use aprender_node2vec::primitives::Matrix;
//! use aprender_node2vec::tree::RandomForestClassifier;
//!
//! let x = Matrix::from_vec(6, 2, vec![
//!     0.0, 0.1, 0.2, 0.0, 0.1, 0.2,
//!     1.0, 0.9, 0.8, 1.0, 0.9, 0.8,
//! ]).expect("6x2 matrix");
//! let y = vec![0, 0, 0, 1, 1, 1];
//!
//! let mut forest = RandomForestClassifier::new(10).with_random_state(42);
//! forest.fit(&x, &y).expect("fit succeeds");
//! assert_eq!(forest.predict(&x).expect("fitted").len(), 6);
//! ```

mod helpers;

pub use helpers::{gini_impurity, majority_class};

use crate::error::{Node2VecError, Result};
use crate::primitives::Matrix;
use helpers::TreeBuilder;
use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// Internal node in a decision tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Index of the feature to split on
    pub feature_idx: usize,
    /// Threshold value for the split
    pub threshold: f32,
    /// Left subtree (samples where feature <= threshold)
    pub left: Box<TreeNode>,
    /// Right subtree (samples where feature > threshold)
    pub right: Box<TreeNode>,
}

/// Leaf node in a decision tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Leaf {
    /// Predicted class label for this leaf
    pub class_label: usize,
    /// Number of training samples in this leaf
    pub n_samples: usize,
    /// Training samples per class index in this leaf
    pub class_counts: Vec<usize>,
}

impl Leaf {
    /// Fraction of this leaf's samples in each of `n_classes` classes.
    fn proba_into(&self, out: &mut [f32]) {
        let total = self.n_samples.max(1) as f32;
        for (slot, &count) in out.iter_mut().zip(&self.class_counts) {
            *slot += count as f32 / total;
        }
    }
}

/// A node in a decision tree (either internal node or leaf).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TreeNode {
    /// Internal decision node with split condition
    Node(Node),
    /// Leaf node with class prediction
    Leaf(Leaf),
}

impl TreeNode {
    /// Returns the depth of the tree rooted at this node.
    ///
    /// Leaf nodes have depth 0, internal nodes have depth 1 + max(left, right).
    #[must_use]
    pub fn depth(&self) -> usize {
        match self {
            TreeNode::Leaf(_) => 0,
            TreeNode::Node(node) => 1 + node.left.depth().max(node.right.depth()),
        }
    }

    fn leaf_for(&self, row: &[f32]) -> &Leaf {
        let mut node = self;
        loop {
            match node {
                TreeNode::Leaf(leaf) => return leaf,
                TreeNode::Node(internal) => {
                    node = if row[internal.feature_idx] <= internal.threshold {
                        &internal.left
                    } else {
                        &internal.right
                    };
                }
            }
        }
    }
}

/// Index of the largest value, lowest index on ties.
fn argmax(values: &[f32]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate() {
        if v > values[best] {
            best = i;
        }
    }
    best
}

/// Checks `x`/`y` before fitting.
fn validate_training_data(x: &Matrix<f32>, y: &[usize]) -> Result<()> {
    if x.n_rows() == 0 {
        return Err(Node2VecError::EmptyInput(
            "cannot fit with zero samples".to_string(),
        ));
    }
    if x.n_rows() != y.len() {
        return Err(Node2VecError::dimension_mismatch("samples", x.n_rows(), y.len()));
    }
    Ok(())
}

/// Decision tree classifier using the CART algorithm.
///
/// Uses Gini impurity for splitting criterion and builds trees recursively.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTreeClassifier {
    tree: Option<TreeNode>,
    max_depth: Option<usize>,
    max_features: Option<usize>,
    random_state: u64,
    n_features: Option<usize>,
    n_classes: usize,
}

impl DecisionTreeClassifier {
    /// Creates a new decision tree classifier with default parameters.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tree: None,
            max_depth: None,
            max_features: None,
            random_state: 0,
            n_features: None,
            n_classes: 0,
        }
    }

    /// Sets the maximum depth of the tree (root has depth 0).
    #[must_use]
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Considers only `max_features` randomly chosen features per split.
    #[must_use]
    pub fn with_max_features(mut self, max_features: usize) -> Self {
        self.max_features = Some(max_features.max(1));
        self
    }

    /// Seeds the feature sub-sampling.
    #[must_use]
    pub fn with_random_state(mut self, random_state: u64) -> Self {
        self.random_state = random_state;
        self
    }

    /// Fitted tree, if any.
    #[must_use]
    pub fn tree(&self) -> Option<&TreeNode> {
        self.tree.as_ref()
    }

    /// Fits the decision tree to training data.
    ///
    /// # Errors
    ///
    /// Returns an error if `x` is empty or `x` and `y` disagree on the
    /// sample count.
    pub fn fit(&mut self, x: &Matrix<f32>, y: &[usize]) -> Result<()> {
        let samples: Vec<usize> = (0..x.n_rows()).collect();
        self.fit_samples(x, y, &samples)
    }

    /// Fits on the rows `samples` of `x`, repeats allowed.
    fn fit_samples(&mut self, x: &Matrix<f32>, y: &[usize], samples: &[usize]) -> Result<()> {
        validate_training_data(x, y)?;
        let n_classes = y.iter().max().map_or(0, |&m| m + 1);
        let mut builder = TreeBuilder {
            x,
            y,
            n_classes,
            max_depth: self.max_depth,
            max_features: self.max_features.unwrap_or(x.n_cols()),
            rng: StdRng::seed_from_u64(self.random_state),
        };
        self.tree = Some(builder.build(samples, 0));
        self.n_features = Some(x.n_cols());
        self.n_classes = n_classes;
        Ok(())
    }

    fn fitted_tree(&self, x: &Matrix<f32>) -> Result<&TreeNode> {
        let tree = self.tree.as_ref().ok_or(Node2VecError::NotFitted {
            model: "DecisionTreeClassifier",
        })?;
        if let Some(expected) = self.n_features {
            if x.n_cols() != expected {
                return Err(Node2VecError::dimension_mismatch("features", expected, x.n_cols()));
            }
        }
        Ok(tree)
    }

    /// Number of classes seen in training.
    #[must_use]
    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// Class fractions of the leaf each sample lands in, `n_samples x n_classes`.
    ///
    /// # Errors
    ///
    /// Returns an error if called before `fit` or with a different feature
    /// count than the training data.
    pub fn predict_proba(&self, x: &Matrix<f32>) -> Result<Matrix<f32>> {
        let tree = self.fitted_tree(x)?;
        let mut data = vec![0.0f32; x.n_rows() * self.n_classes];
        if self.n_classes > 0 {
            for (row, out) in x.rows().zip(data.chunks_mut(self.n_classes)) {
                tree.leaf_for(row).proba_into(out);
            }
        }
        Matrix::from_vec(x.n_rows(), self.n_classes, data)
    }

    /// Predicts class labels for samples.
    ///
    /// # Errors
    ///
    /// Returns an error if called before `fit` or with a different feature
    /// count than the training data.
    pub fn predict(&self, x: &Matrix<f32>) -> Result<Vec<usize>> {
        let tree = self.fitted_tree(x)?;
        Ok(x.rows().map(|row| tree.leaf_for(row).class_label).collect())
    }
}

impl Default for DecisionTreeClassifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Random Forest classifier - an ensemble of decision trees.
///
/// Each tree sees a bootstrap sample of the training rows and
/// `floor(sqrt(n_features))` candidate features per split unless
/// [`with_max_features`](Self::with_max_features) says otherwise.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForestClassifier {
    trees: Vec<DecisionTreeClassifier>,
    n_estimators: usize,
    max_depth: Option<usize>,
    max_features: Option<usize>,
    random_state: Option<u64>,
}

impl RandomForestClassifier {
    /// Creates a new Random Forest classifier with `n_estimators` trees.
    #[must_use]
    pub fn new(n_estimators: usize) -> Self {
        Self {
            trees: Vec::new(),
            n_estimators,
            max_depth: None,
            max_features: None,
            random_state: None,
        }
    }

    /// Sets the maximum depth for each tree.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    /// Sets the number of candidate features per split.
    #[must_use]
    pub fn with_max_features(mut self, max_features: usize) -> Self {
        self.max_features = Some(max_features);
        self
    }

    /// Sets the random state for reproducibility.
    #[must_use]
    pub fn with_random_state(mut self, random_state: u64) -> Self {
        self.random_state = Some(random_state);
        self
    }

    /// Configured number of trees.
    #[must_use]
    pub fn n_estimators(&self) -> usize {
        self.n_estimators
    }

    /// Fitted trees.
    #[must_use]
    pub fn trees(&self) -> &[DecisionTreeClassifier] {
        &self.trees
    }

    /// Fits the random forest to training data.
    ///
    /// # Errors
    ///
    /// Returns an error if the forest has no trees, `x` is empty, or `x`
    /// and `y` disagree on the sample count.
    pub fn fit(&mut self, x: &Matrix<f32>, y: &[usize]) -> Result<()> {
        if self.n_estimators == 0 {
            return Err(Node2VecError::InvalidConfig {
                param: "n_estimators".to_string(),
                value: "0".to_string(),
                constraint: "> 0".to_string(),
            });
        }
        validate_training_data(x, y)?;

        let n_samples = x.n_rows();
        let max_features = self
            .max_features
            .unwrap_or_else(|| default_max_features(x.n_cols()));
        let base_seed = self.random_state.unwrap_or_else(rand::random);

        self.trees = Vec::with_capacity(self.n_estimators);
        for i in 0..self.n_estimators {
            let seed = base_seed.wrapping_add(i as u64);
            let bootstrap = bootstrap_sample(n_samples, seed);
            let mut tree = DecisionTreeClassifier::new()
                .with_max_features(max_features)
                .with_random_state(seed);
            if let Some(depth) = self.max_depth {
                tree = tree.with_max_depth(depth);
            }
            tree.fit_samples(x, y, &bootstrap)?;
            self.trees.push(tree);
        }
        Ok(())
    }

    /// Mean of the per-tree leaf class fractions, `n_samples x n_classes`.
    ///
    /// # Errors
    ///
    /// Returns an error if called before `fit` or with a different feature
    /// count than the training data.
    pub fn predict_proba(&self, x: &Matrix<f32>) -> Result<Matrix<f32>> {
        let first = self.trees.first().ok_or(Node2VecError::NotFitted {
            model: "RandomForestClassifier",
        })?;
        let n_classes = first.n_classes();
        let mut data = vec![0.0f32; x.n_rows() * n_classes];
        for tree in &self.trees {
            let proba = tree.predict_proba(x)?;
            for (sum, p) in data.iter_mut().zip(proba.as_slice()) {
                *sum += p;
            }
        }
        let n_trees = self.trees.len() as f32;
        data.iter_mut().for_each(|p| *p /= n_trees);
        Matrix::from_vec(x.n_rows(), n_classes, data)
    }

    /// Class with the highest mean probability, ties going to the lowest
    /// class index.
    ///
    /// # Errors
    ///
    /// Returns an error if called before `fit` or with a different feature
    /// count than the training data.
    pub fn predict(&self, x: &Matrix<f32>) -> Result<Vec<usize>> {
        let proba = self.predict_proba(x)?;
        Ok(proba.rows().map(argmax).collect())
    }
}

impl Default for RandomForestClassifier {
    fn default() -> Self {
        Self::new(100)
    }
}

/// `floor(sqrt(n_features))`, at least 1.
fn default_max_features(n_features: usize) -> usize {
    ((n_features as f64).sqrt().floor() as usize).max(1)
}

/// Creates a bootstrap sample (random sample with replacement).
///
/// Returns indices of samples to include in the bootstrap sample.
fn bootstrap_sample(n_samples: usize, seed: u64) -> Vec<usize> {
    let dist = Uniform::from(0..n_samples);
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n_samples).map(|_| dist.sample(&mut rng)).collect()
}

#[cfg(test)]
mod tests;
