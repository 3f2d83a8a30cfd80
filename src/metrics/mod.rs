//! Evaluation metrics and per-split metric logging.
//!
//! [`eval_pred`] scores one prediction pass on a subset of nodes;
//! [`MetricsLogger`] collects one value per split and metric and summarises
//! them as mean and population standard deviation.

pub mod classification;

use crate::error::{Node2VecError, Result};
use classification::{accuracy, f1_score, precision, Average};
use std::collections::BTreeMap;

/// Tracked metric names, in reporting order.
pub const METRIC_NAMES: [&str; 4] = ["accuracy", "precision", "f1_macro", "f1_micro"];

/// Metric name -> value for one evaluated subset.
pub type MetricValues = BTreeMap<String, f64>;

/// Scores `predictions` against `labels` on the nodes in `indices` only.
///
/// Precision is macro-averaged.
///
/// # Errors
///
/// Returns an error if `indices` is empty or holds an index outside
/// `labels` or `predictions`.
///
/// # Examples
///
/// ```
/// use aprender_node2vec::metrics::eval_pred;
///
/// let labels = vec![0, 1, 1, 0];
/// let predictions = vec![1, 1, 0, 0];
/// let metrics = eval_pred(&labels, &predictions, &[1, 3]).expect("valid subset");
/// assert_eq!(metrics["accuracy"], 1.0);
/// ```
pub fn eval_pred(
    labels: &[usize],
    predictions: &[usize],
    indices: &[usize],
) -> Result<MetricValues> {
    if indices.is_empty() {
        return Err(Node2VecError::EmptyInput(
            "cannot evaluate an empty index set".to_string(),
        ));
    }
    let bound = labels.len().min(predictions.len());
    let mut y_true = Vec::with_capacity(indices.len());
    let mut y_pred = Vec::with_capacity(indices.len());
    for &idx in indices {
        if idx >= bound {
            return Err(Node2VecError::index_out_of_bounds(idx, bound));
        }
        y_true.push(labels[idx]);
        y_pred.push(predictions[idx]);
    }

    let mut metrics = MetricValues::new();
    metrics.insert("accuracy".to_string(), accuracy(&y_pred, &y_true)?);
    metrics.insert(
        "precision".to_string(),
        precision(&y_pred, &y_true, Average::Macro)?,
    );
    metrics.insert(
        "f1_macro".to_string(),
        f1_score(&y_pred, &y_true, Average::Macro)?,
    );
    metrics.insert(
        "f1_micro".to_string(),
        f1_score(&y_pred, &y_true, Average::Micro)?,
    );
    Ok(metrics)
}

/// Arithmetic mean and population standard deviation.
///
/// Returns `(0.0, 0.0)` for an empty slice.
#[must_use]
pub fn mean_std(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, variance.sqrt())
}

/// Per-split values for a fixed set of metrics.
///
/// Each metric has one slot per split; the logger is complete once every
/// slot is set.
///
/// # Examples
///
/// ```
/// use aprender_node2vec::metrics::MetricsLogger;
///
/// let mut logger = MetricsLogger::new(3, &["accuracy"]);
/// for (run_id, v) in [0.8, 0.9, 0.7].into_iter().enumerate() {
///     logger.update("accuracy", run_id, v).expect("tracked metric");
/// }
/// let (mean, std) = logger.get_metric_stats("accuracy").expect("complete");
/// assert!((mean - 0.8).abs() < 1e-12);
/// assert!((std - 0.081_649_658).abs() < 1e-8);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsLogger {
    num_splits: usize,
    names: Vec<String>,
    values: BTreeMap<String, Vec<Option<f64>>>,
}

impl MetricsLogger {
    /// Creates a logger with `num_splits` empty slots per metric.
    #[must_use]
    pub fn new<S: AsRef<str>>(num_splits: usize, names: &[S]) -> Self {
        let names: Vec<String> = names.iter().map(|n| n.as_ref().to_string()).collect();
        let values = names
            .iter()
            .map(|n| (n.clone(), vec![None; num_splits]))
            .collect();
        Self {
            num_splits,
            names,
            values,
        }
    }

    /// Logger over [`METRIC_NAMES`].
    #[must_use]
    pub fn with_default_metrics(num_splits: usize) -> Self {
        Self::new(num_splits, &METRIC_NAMES)
    }

    /// Number of slots per metric.
    #[must_use]
    pub fn num_splits(&self) -> usize {
        self.num_splits
    }

    /// Tracked metric names, in insertion order.
    #[must_use]
    pub fn metric_names(&self) -> &[String] {
        &self.names
    }

    /// Records `value` for `metric` at split `run_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if `metric` is not tracked or `run_id` is out of
    /// range.
    pub fn update(&mut self, metric: &str, run_id: usize, value: f64) -> Result<()> {
        let slots = self
            .values
            .get_mut(metric)
            .ok_or_else(|| Node2VecError::UnknownMetric(metric.to_string()))?;
        let len = slots.len();
        let slot = slots
            .get_mut(run_id)
            .ok_or(Node2VecError::index_out_of_bounds(run_id, len))?;
        *slot = Some(value);
        Ok(())
    }

    /// Records every tracked metric present in `metrics` at `run_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if a tracked metric is absent from `metrics` or
    /// `run_id` is out of range.
    pub fn update_all(&mut self, run_id: usize, metrics: &MetricValues) -> Result<()> {
        for name in self.names.clone() {
            let value = metrics
                .get(&name)
                .copied()
                .ok_or_else(|| Node2VecError::UnknownMetric(name.clone()))?;
            self.update(&name, run_id, value)?;
        }
        Ok(())
    }

    /// True when every slot of every metric is set.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.values.values().all(|slots| slots.iter().all(Option::is_some))
    }

    /// Number of slots set for `metric`.
    ///
    /// # Errors
    ///
    /// Returns an error if `metric` is not tracked.
    pub fn recorded(&self, metric: &str) -> Result<usize> {
        let slots = self.slots(metric)?;
        Ok(slots.iter().filter(|v| v.is_some()).count())
    }

    /// The complete per-split values of `metric`.
    ///
    /// # Errors
    ///
    /// Returns an error if `metric` is not tracked or has unset slots.
    pub fn values(&self, metric: &str) -> Result<Vec<f64>> {
        let slots = self.slots(metric)?;
        slots
            .iter()
            .copied()
            .collect::<Option<Vec<f64>>>()
            .ok_or_else(|| Node2VecError::IncompleteMetrics {
                metric: metric.to_string(),
                recorded: slots.iter().filter(|v| v.is_some()).count(),
                expected: self.num_splits,
            })
    }

    /// Mean and population standard deviation of `metric`.
    ///
    /// # Errors
    ///
    /// Returns an error if `metric` is not tracked or has unset slots.
    pub fn get_metric_stats(&self, metric: &str) -> Result<(f64, f64)> {
        Ok(mean_std(&self.values(metric)?))
    }

    fn slots(&self, metric: &str) -> Result<&Vec<Option<f64>>> {
        self.values
            .get(metric)
            .ok_or_else(|| Node2VecError::UnknownMetric(metric.to_string()))
    }
}
