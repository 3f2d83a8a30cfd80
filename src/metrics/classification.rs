//! Classification metrics for evaluating classifier performance.
//!
//! Provides accuracy, precision and F1-score for multi-class
//! classification. Averaged metrics run over the labels that occur in
//! either `y_true` or `y_pred`; a label that is never predicted contributes
//! a precision of 0.

use crate::error::{Node2VecError, Result};
use std::collections::BTreeMap;

/// Averaging strategy for multi-class metrics.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Average {
    /// Calculate metrics for each label, return unweighted mean.
    Macro,
    /// Calculate metrics globally by counting total TP, FP, FN.
    Micro,
}

/// Per-label confusion counts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct LabelCounts {
    tp: usize,
    fp: usize,
    fn_: usize,
}

impl LabelCounts {
    fn precision(self) -> f64 {
        ratio(self.tp, self.tp + self.fp)
    }

    fn f1(self) -> f64 {
        ratio(2 * self.tp, 2 * self.tp + self.fp + self.fn_)
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

fn check_inputs(y_pred: &[usize], y_true: &[usize]) -> Result<()> {
    if y_pred.len() != y_true.len() {
        return Err(Node2VecError::dimension_mismatch(
            "predictions",
            y_true.len(),
            y_pred.len(),
        ));
    }
    if y_true.is_empty() {
        return Err(Node2VecError::EmptyInput(
            "metrics need at least one sample".to_string(),
        ));
    }
    Ok(())
}

/// Counts keyed by every label seen in `y_true` or `y_pred`.
fn label_counts(y_pred: &[usize], y_true: &[usize]) -> BTreeMap<usize, LabelCounts> {
    let mut counts: BTreeMap<usize, LabelCounts> = BTreeMap::new();
    for (&pred, &truth) in y_pred.iter().zip(y_true) {
        if pred == truth {
            counts.entry(truth).or_default().tp += 1;
        } else {
            counts.entry(pred).or_default().fp += 1;
            counts.entry(truth).or_default().fn_ += 1;
        }
    }
    counts
}

fn average_over<F>(counts: &BTreeMap<usize, LabelCounts>, average: Average, per_label: F) -> f64
where
    F: Fn(LabelCounts) -> f64,
{
    match average {
        Average::Micro => {
            let total = counts.values().fold(LabelCounts::default(), |acc, c| LabelCounts {
                tp: acc.tp + c.tp,
                fp: acc.fp + c.fp,
                fn_: acc.fn_ + c.fn_,
            });
            per_label(total)
        }
        Average::Macro => {
            counts.values().map(|&c| per_label(c)).sum::<f64>() / counts.len() as f64
        }
    }
}

/// Compute classification accuracy.
///
/// accuracy = `correct_predictions` / `total_predictions`
///
/// # Errors
///
/// Returns an error if the slices differ in length or are empty.
///
/// # Examples
///
/// ```
/// use aprender_node2vec::metrics::classification::accuracy;
///
/// let y_true = vec![0, 1, 2, 0, 1, 2];
/// let y_pred = vec![0, 2, 1, 0, 0, 1];
/// let acc = accuracy(&y_pred, &y_true).expect("same length, non-empty");
/// assert!((acc - 1.0 / 3.0).abs() < 1e-12);
/// ```
pub fn accuracy(y_pred: &[usize], y_true: &[usize]) -> Result<f64> {
    check_inputs(y_pred, y_true)?;
    let correct = y_pred.iter().zip(y_true).filter(|(p, t)| p == t).count();
    Ok(correct as f64 / y_true.len() as f64)
}

/// Compute precision score, TP / (TP + FP).
///
/// # Errors
///
/// Returns an error if the slices differ in length or are empty.
pub fn precision(y_pred: &[usize], y_true: &[usize], average: Average) -> Result<f64> {
    check_inputs(y_pred, y_true)?;
    Ok(average_over(&label_counts(y_pred, y_true), average, LabelCounts::precision))
}

/// Compute F1 score, the harmonic mean of precision and recall.
///
/// # Errors
///
/// Returns an error if the slices differ in length or are empty.
///
/// # Examples
///
/// ```
/// use aprender_node2vec::metrics::classification::{f1_score, Average};
///
/// let y_true = vec![0, 0, 1, 1];
/// let y_pred = vec![0, 1, 1, 1];
/// let micro = f1_score(&y_pred, &y_true, Average::Micro).expect("valid input");
/// assert!((micro - 0.75).abs() < 1e-12);
/// ```
pub fn f1_score(y_pred: &[usize], y_true: &[usize], average: Average) -> Result<f64> {
    check_inputs(y_pred, y_true)?;
    Ok(average_over(&label_counts(y_pred, y_true), average, LabelCounts::f1))
}
