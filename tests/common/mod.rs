//! Shared fixtures for integration tests.

#![allow(dead_code)]

use aprender_node2vec::config::{ExperimentConfig, ModelHyperParameters};
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

/// Nodes per community in [`write_two_communities`].
pub const COMMUNITY_SIZE: usize = 10;

/// Writes a dataset of two dense communities joined by a single bridge.
///
/// Nodes `0..10` are labelled `a`, nodes `10..20` are labelled `b`. Edges
/// go to `edges_coRT.csv`, the default trace.
pub fn write_two_communities(base_dir: &Path, dataset: &str) {
    let raw = base_dir.join("data").join("raw").join(dataset);
    fs::create_dir_all(&raw).expect("raw dir");

    let mut labels = String::from("node,label\n");
    for node in 0..2 * COMMUNITY_SIZE {
        let label = if node < COMMUNITY_SIZE { "a" } else { "b" };
        writeln!(labels, "{node},{label}").expect("write");
    }
    fs::write(raw.join("labels.csv"), labels).expect("labels.csv");

    let mut edges = String::from("source,target\n");
    for offset in [0, COMMUNITY_SIZE] {
        for i in 0..COMMUNITY_SIZE {
            for j in (i + 1)..COMMUNITY_SIZE {
                writeln!(edges, "{},{}", offset + i, offset + j).expect("write");
            }
        }
    }
    writeln!(edges, "{},{}", COMMUNITY_SIZE - 1, COMMUNITY_SIZE).expect("write");
    fs::write(raw.join("edges_coRT.csv"), edges).expect("edges_coRT.csv");
}

/// A small, fast configuration rooted at `base_dir`.
pub fn small_config(base_dir: &Path, dataset: &str, model_name: &str) -> ExperimentConfig {
    let mut config = ExperimentConfig {
        dataset_name: dataset.to_string(),
        seeds: vec![0],
        num_splits: vec![2],
        base_dir: base_dir.to_path_buf(),
        tracking_dir: base_dir.join("mlruns"),
        model: ModelHyperParameters {
            model_name: model_name.to_string(),
            latent_dim: 8,
            n_estimators: 10,
            max_iter: 200,
            ..Default::default()
        },
        ..Default::default()
    };
    config.walk.workers = 2;
    config
}
