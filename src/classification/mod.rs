//! Downstream classifiers and the model factory.
//!
//! Two families are supported, selected by identifier:
//!
//! | identifier | family |
//! |------------|--------|
//! | `LR` | multinomial logistic regression |
//! | `RF` | random forest ([`crate::tree::RandomForestClassifier`]) |
//!
//! # Example
//!
//! ```
//! use aprender_node2vec::classification::{create_model, ModelKind};
//! use aprender_node2vec::config::ModelHyperParameters;
//! use aprender_node2vec::traits::Classifier;
//!
//! let params = ModelHyperParameters { model_name: "LR".to_string(), ..Default::default() };
//! let model = create_model(&params, 0).expect("LR is supported");
//! assert_eq!(model.family(), ModelKind::LogisticRegression);
//!
//! let params = ModelHyperParameters { model_name: "SVM".to_string(), ..Default::default() };
//! let err = create_model(&params, 0).expect_err("SVM is not");
//! assert_eq!(err.to_string(), "SVM not allowed.");
//! ```

use crate::config::ModelHyperParameters;
use crate::error::{Node2VecError, Result};
use crate::primitives::Matrix;
use crate::traits::Classifier;
use crate::tree::RandomForestClassifier;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Classifier family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelKind {
    /// Multinomial logistic regression (`LR`)
    LogisticRegression,
    /// Random forest (`RF`)
    RandomForest,
}

impl ModelKind {
    /// Identifier used in configuration and logged params.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            ModelKind::LogisticRegression => "LR",
            ModelKind::RandomForest => "RF",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelKind {
    type Err = Node2VecError;

    /// Exact, case-sensitive match on `LR` / `RF`.
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "LR" => Ok(ModelKind::LogisticRegression),
            "RF" => Ok(ModelKind::RandomForest),
            other => Err(Node2VecError::UnsupportedModel {
                name: other.to_string(),
            }),
        }
    }
}

/// Logistic Regression classifier for multi-class classification.
///
/// Softmax over per-class linear scores, trained by full-batch gradient
/// descent on the mean cross-entropy plus an L2 penalty
/// `‖W‖² / (2·C·n)`. The intercepts are not penalised.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticRegression {
    /// Class weights, `n_classes x n_features`
    coefficients: Option<Matrix<f32>>,
    /// One intercept per class
    intercepts: Vec<f32>,
    /// Learning rate for gradient descent
    learning_rate: f32,
    /// Maximum number of iterations
    max_iter: usize,
    /// Convergence tolerance on the largest absolute gradient entry
    tol: f32,
    /// Inverse regularisation strength
    c: f32,
}

impl LogisticRegression {
    /// Creates a new logistic regression with default parameters.
    ///
    /// Defaults: `learning_rate = 0.5`, `max_iter = 500`, `tol = 1e-4`,
    /// `C = 1.0`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            coefficients: None,
            intercepts: Vec::new(),
            learning_rate: 0.5,
            max_iter: 500,
            tol: 1e-4,
            c: 1.0,
        }
    }

    /// Sets the learning rate.
    #[must_use]
    pub fn with_learning_rate(mut self, lr: f32) -> Self {
        self.learning_rate = lr;
        self
    }

    /// Sets the maximum number of iterations.
    #[must_use]
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Sets the convergence tolerance.
    #[must_use]
    pub fn with_tolerance(mut self, tol: f32) -> Self {
        self.tol = tol;
        self
    }

    /// Sets the inverse regularisation strength (smaller is stronger).
    #[must_use]
    pub fn with_c(mut self, c: f32) -> Self {
        self.c = c;
        self
    }

    /// Number of classes seen at fit time.
    #[must_use]
    pub fn n_classes(&self) -> usize {
        self.intercepts.len()
    }

    /// Fitted coefficients, `n_classes x n_features`.
    #[must_use]
    pub fn coefficients(&self) -> Option<&Matrix<f32>> {
        self.coefficients.as_ref()
    }

    /// Fits the model with gradient descent.
    ///
    /// The class count is `max(y) + 1`.
    ///
    /// # Errors
    ///
    /// Returns an error if `x` is empty, `x` and `y` disagree on the sample
    /// count, or `C` is not positive.
    pub fn fit(&mut self, x: &Matrix<f32>, y: &[usize]) -> Result<()> {
        let (n_samples, n_features) = x.shape();
        if n_samples == 0 {
            return Err(Node2VecError::EmptyInput(
                "cannot fit with zero samples".to_string(),
            ));
        }
        if n_samples != y.len() {
            return Err(Node2VecError::dimension_mismatch("samples", n_samples, y.len()));
        }
        if !(self.c.is_finite() && self.c > 0.0) {
            return Err(Node2VecError::InvalidConfig {
                param: "C".to_string(),
                value: self.c.to_string(),
                constraint: "finite and > 0".to_string(),
            });
        }

        let n_classes = y.iter().max().map_or(1, |&m| m + 1);
        let n = n_samples as f32;
        let penalty = 1.0 / (self.c * n);
        let mut weights = Matrix::zeros(n_classes, n_features);
        let mut intercepts = vec![0.0f32; n_classes];
        let mut probs = vec![0.0f32; n_classes];
        let mut grad_w = vec![0.0f32; n_classes * n_features];
        let mut grad_b = vec![0.0f32; n_classes];

        for iter in 0..self.max_iter {
            grad_w.iter_mut().for_each(|g| *g = 0.0);
            grad_b.iter_mut().for_each(|g| *g = 0.0);

            for (row, &label) in x.rows().zip(y) {
                softmax_scores(&weights, &intercepts, row, &mut probs);
                for (class, &p) in probs.iter().enumerate() {
                    let err = p - if class == label { 1.0 } else { 0.0 };
                    grad_b[class] += err;
                    let g = &mut grad_w[class * n_features..(class + 1) * n_features];
                    for (gj, &xj) in g.iter_mut().zip(row) {
                        *gj += err * xj;
                    }
                }
            }

            let mut max_grad = 0.0f32;
            for class in 0..n_classes {
                for j in 0..n_features {
                    let w = weights.get(class, j);
                    let g = grad_w[class * n_features + j] / n + penalty * w;
                    max_grad = max_grad.max(g.abs());
                    weights.set(class, j, w - self.learning_rate * g);
                }
                let g = grad_b[class] / n;
                max_grad = max_grad.max(g.abs());
                intercepts[class] -= self.learning_rate * g;
            }

            if max_grad < self.tol {
                debug!(iter, max_grad, "logistic regression converged");
                break;
            }
        }

        self.coefficients = Some(weights);
        self.intercepts = intercepts;
        Ok(())
    }

    /// Class probabilities, one row per sample.
    ///
    /// # Errors
    ///
    /// Returns an error if the model is not fitted or the feature count
    /// differs from training.
    pub fn predict_proba(&self, x: &Matrix<f32>) -> Result<Matrix<f32>> {
        let weights = self.fitted_weights(x)?;
        let n_classes = self.n_classes();
        let mut probs = vec![0.0f32; n_classes];
        let mut data = Vec::with_capacity(x.n_rows() * n_classes);
        for row in x.rows() {
            softmax_scores(weights, &self.intercepts, row, &mut probs);
            data.extend_from_slice(&probs);
        }
        Matrix::from_vec(x.n_rows(), n_classes, data)
    }

    /// Predicts the arg-max class; ties go to the lowest index.
    ///
    /// # Errors
    ///
    /// Returns an error if the model is not fitted or the feature count
    /// differs from training.
    pub fn predict(&self, x: &Matrix<f32>) -> Result<Vec<usize>> {
        let weights = self.fitted_weights(x)?;
        let predictions = x
            .rows()
            .map(|row| {
                let mut best = (0, f32::NEG_INFINITY);
                for (class, &b) in self.intercepts.iter().enumerate() {
                    let score = dot(weights.row(class), row) + b;
                    if score > best.1 {
                        best = (class, score);
                    }
                }
                best.0
            })
            .collect();
        Ok(predictions)
    }

    fn fitted_weights(&self, x: &Matrix<f32>) -> Result<&Matrix<f32>> {
        let weights = self.coefficients.as_ref().ok_or(Node2VecError::NotFitted {
            model: "LogisticRegression",
        })?;
        if x.n_cols() != weights.n_cols() {
            return Err(Node2VecError::dimension_mismatch(
                "features",
                weights.n_cols(),
                x.n_cols(),
            ));
        }
        Ok(weights)
    }
}

impl Default for LogisticRegression {
    fn default() -> Self {
        Self::new()
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Writes the softmax of the class scores for `row` into `out`.
fn softmax_scores(weights: &Matrix<f32>, intercepts: &[f32], row: &[f32], out: &mut [f32]) {
    for (class, (o, &b)) in out.iter_mut().zip(intercepts).enumerate() {
        *o = dot(weights.row(class), row) + b;
    }
    let max = out.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let mut sum = 0.0;
    for o in out.iter_mut() {
        *o = (*o - max).exp();
        sum += *o;
    }
    for o in out.iter_mut() {
        *o /= sum;
    }
}

impl Classifier for LogisticRegression {
    fn fit(&mut self, x: &Matrix<f32>, y: &[usize]) -> Result<()> {
        LogisticRegression::fit(self, x, y)
    }

    fn predict(&self, x: &Matrix<f32>) -> Result<Vec<usize>> {
        LogisticRegression::predict(self, x)
    }

    fn family(&self) -> ModelKind {
        ModelKind::LogisticRegression
    }
}

impl Classifier for RandomForestClassifier {
    fn fit(&mut self, x: &Matrix<f32>, y: &[usize]) -> Result<()> {
        RandomForestClassifier::fit(self, x, y)
    }

    fn predict(&self, x: &Matrix<f32>) -> Result<Vec<usize>> {
        RandomForestClassifier::predict(self, x)
    }

    fn family(&self) -> ModelKind {
        ModelKind::RandomForest
    }
}

/// An untrained or trained classifier of either family.
#[derive(Debug, Clone)]
pub enum Model {
    /// Multinomial logistic regression
    LogisticRegression(LogisticRegression),
    /// Random forest
    RandomForest(RandomForestClassifier),
}

impl Classifier for Model {
    fn fit(&mut self, x: &Matrix<f32>, y: &[usize]) -> Result<()> {
        match self {
            Model::LogisticRegression(m) => m.fit(x, y),
            Model::RandomForest(m) => m.fit(x, y),
        }
    }

    fn predict(&self, x: &Matrix<f32>) -> Result<Vec<usize>> {
        match self {
            Model::LogisticRegression(m) => m.predict(x),
            Model::RandomForest(m) => m.predict(x),
        }
    }

    fn family(&self) -> ModelKind {
        match self {
            Model::LogisticRegression(_) => ModelKind::LogisticRegression,
            Model::RandomForest(_) => ModelKind::RandomForest,
        }
    }
}

/// Builds an untrained classifier for `params.model_name`.
///
/// `seed` drives the random forest; logistic regression is deterministic.
///
/// # Errors
///
/// Returns `UnsupportedModel` for any identifier other than `LR` or `RF`.
pub fn create_model(params: &ModelHyperParameters, seed: u64) -> Result<Model> {
    let model = match params.model_name.parse::<ModelKind>()? {
        ModelKind::LogisticRegression => Model::LogisticRegression(
            LogisticRegression::new()
                .with_c(params.c)
                .with_max_iter(params.max_iter),
        ),
        ModelKind::RandomForest => {
            let mut forest =
                RandomForestClassifier::new(params.n_estimators).with_random_state(seed);
            if let Some(depth) = params.max_depth {
                forest = forest.with_max_depth(depth);
            }
            Model::RandomForest(forest)
        }
    };
    Ok(model)
}
