//! Train/val/test splits over node indices.

use crate::config::HyperParameters;
use crate::error::{Node2VecError, Result};
use crate::graph::NodeId;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::info;

/// File name of the cached splits inside the data directory.
pub const SPLITS_FILE: &str = "splits.json";

/// One train/val/test partition of node indices, each part sorted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Split {
    /// Training nodes
    pub train: Vec<NodeId>,
    /// Validation nodes
    pub val: Vec<NodeId>,
    /// Test nodes
    pub test: Vec<NodeId>,
}

impl Split {
    /// Checks the partition invariants for split `run_id`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSplit` if a part is empty, an index is
    /// `>= num_nodes`, or a node appears more than once.
    pub fn validate(&self, run_id: usize, num_nodes: usize) -> Result<()> {
        let fail = |reason: String| Node2VecError::InvalidSplit { run_id, reason };
        let mut seen = vec![false; num_nodes];
        for (part, nodes) in [("train", &self.train), ("val", &self.val), ("test", &self.test)] {
            if nodes.is_empty() {
                return Err(fail(format!("{part} partition is empty")));
            }
            for &node in nodes {
                let slot = seen.get_mut(node).ok_or_else(|| {
                    fail(format!("{part} index {node} out of range for {num_nodes} nodes"))
                })?;
                if *slot {
                    return Err(fail(format!("node {node} appears in more than one partition")));
                }
                *slot = true;
            }
        }
        Ok(())
    }

    fn sorted(mut train: Vec<NodeId>, mut val: Vec<NodeId>, mut test: Vec<NodeId>) -> Self {
        train.sort_unstable();
        val.sort_unstable();
        test.sort_unstable();
        Self { train, val, test }
    }
}

/// Shuffled node ids for split `run_id`.
fn shuffled_nodes(num_nodes: usize, seed: u64, run_id: usize) -> Vec<NodeId> {
    let mut rng = StdRng::seed_from_u64(seed.wrapping_add(run_id as u64));
    let mut nodes: Vec<NodeId> = (0..num_nodes).collect();
    nodes.shuffle(&mut rng);
    nodes
}

/// Percentage split: the first `floor(n·train_perc)` shuffled ids train,
/// the next `floor(n·val_perc)` validate, the rest test.
fn standard_split(nodes: Vec<NodeId>, hp: &HyperParameters) -> Split {
    let n = nodes.len();
    let n_train = ((n as f64 * hp.train_perc).floor() as usize).min(n);
    let n_val = ((n as f64 * hp.val_perc).floor() as usize).min(n - n_train);
    let mut rest = nodes;
    let test = rest.split_off(n_train + n_val);
    let val = rest.split_off(n_train);
    Split::sorted(rest, val, test)
}

/// Few-shot split: the first `few_shot_per_class` shuffled ids of each class
/// train, the remainder is divided `val_perc : test_perc`.
fn few_shot_split(nodes: Vec<NodeId>, labels: &[usize], hp: &HyperParameters) -> Split {
    let mut taken: BTreeMap<usize, usize> = BTreeMap::new();
    let mut train = Vec::new();
    let mut rest = Vec::new();
    for node in nodes {
        let count = taken.entry(labels[node]).or_insert(0);
        if *count < hp.few_shot_per_class {
            *count += 1;
            train.push(node);
        } else {
            rest.push(node);
        }
    }
    let holdout = hp.val_perc + hp.test_perc;
    let val_share = if holdout > 0.0 { hp.val_perc / holdout } else { 0.0 };
    let n_val = ((rest.len() as f64 * val_share).floor() as usize).min(rest.len());
    let test = rest.split_off(n_val);
    Split::sorted(train, rest, test)
}

/// Generates `num_splits` splits; split `k` shuffles with seed `seed + k`.
///
/// # Errors
///
/// Returns an error if a generated split violates its invariants (for
/// example an empty validation set on a tiny graph).
pub fn generate_splits(
    labels: &[usize],
    num_splits: usize,
    seed: u64,
    hp: &HyperParameters,
    is_few_shot: bool,
) -> Result<Vec<Split>> {
    let num_nodes = labels.len();
    (0..num_splits)
        .map(|run_id| {
            let nodes = shuffled_nodes(num_nodes, seed, run_id);
            let split = if is_few_shot {
                few_shot_split(nodes, labels, hp)
            } else {
                standard_split(nodes, hp)
            };
            split.validate(run_id, num_nodes)?;
            Ok(split)
        })
        .collect()
}

/// On-disk form of the cached splits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct SplitCache {
    num_nodes: usize,
    splits: Vec<Split>,
}

/// Reads cached splits from `data_dir`, or generates and caches them.
///
/// The cache is ignored when `hp.overwrite_data` is set, or when it holds
/// a different split count or node count.
///
/// # Errors
///
/// Returns an error if the cache cannot be read or written, or a split is
/// invalid.
pub fn load_or_generate_splits(
    data_dir: &Path,
    labels: &[usize],
    num_splits: usize,
    seed: u64,
    hp: &HyperParameters,
    is_few_shot: bool,
) -> Result<Vec<Split>> {
    let path = data_dir.join(SPLITS_FILE);
    let num_nodes = labels.len();

    if path.exists() && !hp.overwrite_data {
        let text = fs::read_to_string(&path).map_err(|e| Node2VecError::path_io(&path, e))?;
        let cache: SplitCache = serde_json::from_str(&text)?;
        if cache.splits.len() == num_splits && cache.num_nodes == num_nodes {
            for (run_id, split) in cache.splits.iter().enumerate() {
                split.validate(run_id, num_nodes)?;
            }
            info!(path = %path.display(), "loaded cached splits");
            return Ok(cache.splits);
        }
        info!(
            path = %path.display(),
            cached = cache.splits.len(),
            requested = num_splits,
            "cached splits do not match, regenerating"
        );
    }

    let splits = generate_splits(labels, num_splits, seed, hp, is_few_shot)?;
    fs::create_dir_all(data_dir).map_err(|e| Node2VecError::path_io(data_dir, e))?;
    let cache = SplitCache { num_nodes, splits };
    let json = serde_json::to_string_pretty(&cache)?;
    fs::write(&path, json).map_err(|e| Node2VecError::path_io(&path, e))?;
    info!(path = %path.display(), num_splits, "generated splits");
    Ok(cache.splits)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(n: usize) -> Vec<usize> {
        (0..n).map(|i| i % 3).collect()
    }

    #[test]
    fn test_standard_split_sizes() {
        let splits =
            generate_splits(&labels(20), 3, 0, &HyperParameters::default(), false).expect("valid");
        assert_eq!(splits.len(), 3);
        for split in &splits {
            assert_eq!(split.train.len(), 14);
            assert_eq!(split.val.len(), 3);
            assert_eq!(split.test.len(), 3);
            assert!(split.train.windows(2).all(|w| w[0] < w[1]));
        }
        assert_ne!(splits[0], splits[1]);
    }

    #[test]
    fn test_split_k_depends_on_seed_plus_k() {
        let hp = HyperParameters::default();
        let a = generate_splits(&labels(30), 2, 5, &hp, false).expect("valid");
        let b = generate_splits(&labels(30), 1, 6, &hp, false).expect("valid");
        assert_eq!(a[1], b[0]);
    }

    #[test]
    fn test_few_shot_split() {
        let hp = HyperParameters {
            few_shot_per_class: 2,
            ..Default::default()
        };
        let labels = labels(30);
        let splits = generate_splits(&labels, 2, 1, &hp, true).expect("valid");
        for split in &splits {
            assert_eq!(split.train.len(), 6);
            let mut per_class = [0; 3];
            for &node in &split.train {
                per_class[labels[node]] += 1;
            }
            assert_eq!(per_class, [2, 2, 2]);
            // 24 held out, split evenly between val and test
            assert_eq!(split.val.len(), 12);
            assert_eq!(split.test.len(), 12);
        }
    }

    #[test]
    fn test_validate_detects_overlap_and_range() {
        let overlap = Split {
            train: vec![0, 1],
            val: vec![1],
            test: vec![2],
        };
        assert!(matches!(
            overlap.validate(4, 3),
            Err(Node2VecError::InvalidSplit { run_id: 4, .. })
        ));
        let out_of_range = Split {
            train: vec![0],
            val: vec![1],
            test: vec![9],
        };
        assert!(out_of_range.validate(0, 3).is_err());
        let empty_val = Split {
            train: vec![0],
            val: vec![],
            test: vec![1],
        };
        assert!(empty_val.validate(0, 2).is_err());
    }

    #[test]
    fn test_tiny_graph_split_rejected() {
        // floor(4 * 0.15) = 0 validation nodes
        let err = generate_splits(&labels(4), 1, 0, &HyperParameters::default(), false)
            .expect_err("empty val");
        assert!(matches!(err, Node2VecError::InvalidSplit { .. }));
    }

    #[test]
    fn test_cache_reused_and_overwritten() {
        let dir = tempfile::tempdir().expect("tempdir");
        let hp = HyperParameters::default();
        let labels = labels(20);
        let first = load_or_generate_splits(dir.path(), &labels, 2, 0, &hp, false).expect("gen");
        assert!(dir.path().join(SPLITS_FILE).exists());

        // Different seed, but the cache wins
        let cached = load_or_generate_splits(dir.path(), &labels, 2, 99, &hp, false).expect("load");
        assert_eq!(cached, first);

        let overwrite = HyperParameters {
            overwrite_data: true,
            ..Default::default()
        };
        let fresh =
            load_or_generate_splits(dir.path(), &labels, 2, 99, &overwrite, false).expect("regen");
        assert_eq!(fresh, generate_splits(&labels, 2, 99, &hp, false).expect("valid"));
    }

    #[test]
    fn test_cache_with_other_count_regenerated() {
        let dir = tempfile::tempdir().expect("tempdir");
        let hp = HyperParameters::default();
        let labels = labels(20);
        load_or_generate_splits(dir.path(), &labels, 2, 0, &hp, false).expect("gen");
        let three = load_or_generate_splits(dir.path(), &labels, 3, 0, &hp, false).expect("regen");
        assert_eq!(three.len(), 3);
    }
}
