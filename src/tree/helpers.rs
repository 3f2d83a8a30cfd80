//! Helper functions for tree building.
//!
//! Trees are grown over index sets into a shared feature matrix, so no
//! sub-matrices are copied while recursing.

use super::{Leaf, Node, TreeNode};
use crate::primitives::Matrix;
use rand::rngs::StdRng;
use rand::seq::index;
use std::collections::BTreeMap;

/// Calculate Gini impurity for a set of labels.
///
/// Formula: Gini = 1 - `Σ(p_i²)` where `p_i` is the proportion of class i
pub fn gini_impurity(labels: &[usize]) -> f32 {
    if labels.is_empty() {
        return 0.0;
    }
    let mut counts = BTreeMap::new();
    for &label in labels {
        *counts.entry(label).or_insert(0usize) += 1;
    }
    let counts: Vec<usize> = counts.into_values().collect();
    gini_from_counts(&counts, labels.len())
}

/// Gini impurity from per-class counts summing to `total`.
pub(super) fn gini_from_counts(counts: &[usize], total: usize) -> f32 {
    if total == 0 {
        return 0.0;
    }
    let n = total as f32;
    1.0 - counts
        .iter()
        .map(|&c| {
            let p = c as f32 / n;
            p * p
        })
        .sum::<f32>()
}

/// Most frequent label; ties go to the lowest class index.
///
/// Returns 0 for an empty slice.
pub fn majority_class(labels: &[usize]) -> usize {
    let mut counts = BTreeMap::new();
    for &label in labels {
        *counts.entry(label).or_insert(0usize) += 1;
    }
    let mut best = (0, 0);
    for (label, count) in counts {
        if count > best.1 {
            best = (label, count);
        }
    }
    best.0
}

/// Candidate split of a node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct Split {
    pub feature_idx: usize,
    pub threshold: f32,
    pub gain: f32,
}

/// Grows one CART tree.
pub(super) struct TreeBuilder<'a> {
    pub x: &'a Matrix<f32>,
    pub y: &'a [usize],
    pub n_classes: usize,
    pub max_depth: Option<usize>,
    /// Features considered per split
    pub max_features: usize,
    pub rng: StdRng,
}

impl TreeBuilder<'_> {
    /// Builds the subtree over `samples` (row indices into `x`).
    pub fn build(&mut self, samples: &[usize], depth: usize) -> TreeNode {
        let labels: Vec<usize> = samples.iter().map(|&i| self.y[i]).collect();
        let n_classes = self.n_classes;
        let leaf = || {
            let mut class_counts = vec![0; n_classes];
            for &label in &labels {
                class_counts[label] += 1;
            }
            TreeNode::Leaf(Leaf {
                class_label: majority_class(&labels),
                n_samples: samples.len(),
                class_counts,
            })
        };

        let pure = labels.windows(2).all(|w| w[0] == w[1]);
        let at_max_depth = self.max_depth.is_some_and(|max| depth >= max);
        if pure || at_max_depth || samples.len() < 2 {
            return leaf();
        }

        let Some(split) = self.best_split(samples) else {
            return leaf();
        };

        let (left, right): (Vec<usize>, Vec<usize>) = samples
            .iter()
            .partition(|&&i| self.x.get(i, split.feature_idx) <= split.threshold);
        if left.is_empty() || right.is_empty() {
            return leaf();
        }

        let left_child = self.build(&left, depth + 1);
        let right_child = self.build(&right, depth + 1);
        TreeNode::Node(Node {
            feature_idx: split.feature_idx,
            threshold: split.threshold,
            left: Box::new(left_child),
            right: Box::new(right_child),
        })
    }

    /// Best split over a random subset of `max_features` features.
    ///
    /// Ties keep the first candidate found. Splits without positive Gini
    /// gain are rejected.
    fn best_split(&mut self, samples: &[usize]) -> Option<Split> {
        let n_features = self.x.n_cols();
        let candidates: Vec<usize> = if self.max_features >= n_features {
            (0..n_features).collect()
        } else {
            index::sample(&mut self.rng, n_features, self.max_features).into_vec()
        };

        let mut best: Option<Split> = None;
        for feature_idx in candidates {
            if let Some(split) = self.best_split_for_feature(samples, feature_idx) {
                if best.map_or(true, |b| split.gain > b.gain) {
                    best = Some(split);
                }
            }
        }
        best
    }

    /// Scans midpoints between consecutive distinct values of one feature.
    fn best_split_for_feature(&self, samples: &[usize], feature_idx: usize) -> Option<Split> {
        let mut sorted: Vec<(f32, usize)> = samples
            .iter()
            .map(|&i| (self.x.get(i, feature_idx), self.y[i]))
            .collect();
        sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

        let total = sorted.len();
        let mut right_counts = vec![0usize; self.n_classes];
        for &(_, label) in &sorted {
            right_counts[label] += 1;
        }
        let parent = gini_from_counts(&right_counts, total);
        let mut left_counts = vec![0usize; self.n_classes];

        let mut best: Option<Split> = None;
        for pos in 0..total - 1 {
            let (value, label) = sorted[pos];
            left_counts[label] += 1;
            right_counts[label] -= 1;

            let next = sorted[pos + 1].0;
            if next - value <= 1e-10 {
                continue;
            }
            let n_left = pos + 1;
            let n_right = total - n_left;
            let weighted = (n_left as f32 * gini_from_counts(&left_counts, n_left)
                + n_right as f32 * gini_from_counts(&right_counts, n_right))
                / total as f32;
            let gain = parent - weighted;
            if gain > 0.0 && best.map_or(true, |b| gain > b.gain) {
                best = Some(Split {
                    feature_idx,
                    threshold: (value + next) / 2.0,
                    gain,
                });
            }
        }
        best
    }
}
