//! Core traits for the downstream classifiers.
//!
//! The evaluation loop only relies on this contract: fit on a feature
//! matrix with one class index per row, then predict one class per row.

use crate::classification::ModelKind;
use crate::error::Result;
use crate::primitives::Matrix;

/// Supervised classifier over dense `f32` features.
///
/// # Examples
///
/// ```
/// use aprender_node2vec::classification::{LogisticRegression, ModelKind};
/// use aprender_node2vec::primitives::Matrix;
/// use aprender_node2vec::traits::Classifier;
///
/// let x = Matrix::from_vec(4, 1, vec![-2.0, -1.0, 1.0, 2.0]).expect("4x1 matrix");
/// let y = vec![0, 0, 1, 1];
///
/// let mut model = LogisticRegression::new();
/// model.fit(&x, &y).expect("valid training data");
/// assert_eq!(model.predict(&x).expect("fitted"), y);
/// assert_eq!(model.family(), ModelKind::LogisticRegression);
/// ```
pub trait Classifier {
    /// Fits the model to training data.
    ///
    /// # Errors
    ///
    /// Returns an error if `x` is empty or `x` and `y` disagree on the
    /// sample count.
    fn fit(&mut self, x: &Matrix<f32>, y: &[usize]) -> Result<()>;

    /// Predicts one class index per row of `x`.
    ///
    /// # Errors
    ///
    /// Returns an error if the model is not fitted or the feature count
    /// differs from training.
    fn predict(&self, x: &Matrix<f32>) -> Result<Vec<usize>>;

    /// Which classifier family this is.
    fn family(&self) -> ModelKind;
}
