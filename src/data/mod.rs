//! Dataset loading: graph, node labels and evaluation splits.
//!
//! Raw files live under `<base_dir>/data/raw/<dataset>/`:
//!
//! - `labels.csv` with header `node,label`, one row per node;
//! - `edges.csv` with header `source,target`, or one `edges_<trace>.csv`
//!   per configured trace (their edges are unioned).
//!
//! Node ids are contiguous integers; the node count is one more than the
//! largest id seen in either file. Raw label strings are numbered in sorted
//! order.

mod split;

pub use split::{generate_splits, load_or_generate_splits, Split, SPLITS_FILE};

use crate::config::ExperimentConfig;
use crate::env::{raw_dir, Environment};
use crate::error::{Node2VecError, Result};
use crate::graph::{Graph, NodeId};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Deserialize)]
struct LabelRecord {
    node: NodeId,
    label: String,
}

#[derive(Debug, Deserialize)]
struct EdgeRecord {
    source: NodeId,
    target: NodeId,
}

/// Everything one experiment needs from the data layer.
#[derive(Debug, Clone)]
pub struct Dataset {
    /// Undirected graph over all labelled nodes
    pub graph: Graph,
    /// Class index of each node
    pub labels: Vec<usize>,
    /// Raw label of each class index
    pub classes: Vec<String>,
    /// One split per run
    pub splits: Vec<Split>,
}

impl Dataset {
    /// Number of nodes.
    #[must_use]
    pub fn num_nodes(&self) -> usize {
        self.labels.len()
    }

    /// Number of distinct classes.
    #[must_use]
    pub fn num_classes(&self) -> usize {
        self.classes.len()
    }
}

fn read_csv<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<Vec<T>> {
    let csv_error = |e: csv::Error| Node2VecError::Csv {
        path: path.to_path_buf(),
        message: e.to_string(),
    };
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(csv_error)?;
    reader
        .deserialize()
        .collect::<std::result::Result<Vec<T>, _>>()
        .map_err(csv_error)
}

/// Reads `(node, raw label)` rows from a `node,label` CSV.
///
/// # Errors
///
/// Returns an error if the file is missing or a row does not parse.
pub fn read_labels(path: &Path) -> Result<Vec<(NodeId, String)>> {
    Ok(read_csv::<LabelRecord>(path)?
        .into_iter()
        .map(|r| (r.node, r.label))
        .collect())
}

/// Reads `(source, target)` rows from a `source,target` CSV.
///
/// # Errors
///
/// Returns an error if the file is missing or a row does not parse.
pub fn read_edges(path: &Path) -> Result<Vec<(NodeId, NodeId)>> {
    Ok(read_csv::<EdgeRecord>(path)?
        .into_iter()
        .map(|r| (r.source, r.target))
        .collect())
}

/// Edge files to load for `traces`.
#[must_use]
pub fn edge_files(raw_dir: &Path, traces: &[String]) -> Vec<PathBuf> {
    if traces.is_empty() {
        vec![raw_dir.join("edges.csv")]
    } else {
        traces
            .iter()
            .map(|trace| raw_dir.join(format!("edges_{trace}.csv")))
            .collect()
    }
}

/// Numbers raw labels and checks every node has exactly one.
///
/// Returns `(labels, classes)` where `classes` is the sorted list of raw
/// labels.
///
/// # Errors
///
/// Returns `InvalidData` for a node labelled twice or a node without a
/// label.
pub fn encode_labels(
    rows: &[(NodeId, String)],
    num_nodes: usize,
) -> Result<(Vec<usize>, Vec<String>)> {
    let classes: Vec<String> = rows
        .iter()
        .map(|(_, label)| label.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let class_index: BTreeMap<&str, usize> = classes
        .iter()
        .enumerate()
        .map(|(i, c)| (c.as_str(), i))
        .collect();

    let mut labels: Vec<Option<usize>> = vec![None; num_nodes];
    for (node, label) in rows {
        let slot = labels
            .get_mut(*node)
            .ok_or_else(|| Node2VecError::index_out_of_bounds(*node, num_nodes))?;
        if slot.is_some() {
            return Err(Node2VecError::InvalidData(format!(
                "node {node} has more than one label"
            )));
        }
        *slot = class_index.get(label.as_str()).copied();
    }
    let labels = labels
        .into_iter()
        .enumerate()
        .map(|(node, label)| {
            label.ok_or_else(|| Node2VecError::InvalidData(format!("node {node} has no label")))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok((labels, classes))
}

/// Loads the graph and labels of `dataset` from `raw_dir`.
///
/// # Errors
///
/// Returns an error if a file is missing or malformed, or the labels do
/// not cover every node exactly once.
pub fn load_graph_and_labels(
    raw_dir: &Path,
    traces: &[String],
) -> Result<(Graph, Vec<usize>, Vec<String>)> {
    let label_rows = read_labels(&raw_dir.join("labels.csv"))?;
    let mut edges = Vec::new();
    for path in edge_files(raw_dir, traces) {
        edges.extend(read_edges(&path)?);
    }

    let num_nodes = label_rows
        .iter()
        .map(|(node, _)| *node)
        .chain(edges.iter().flat_map(|&(s, t)| [s, t]))
        .max()
        .map_or(0, |max| max + 1);
    if num_nodes == 0 {
        return Err(Node2VecError::EmptyInput(format!(
            "no nodes in {}",
            raw_dir.display()
        )));
    }

    let (labels, classes) = encode_labels(&label_rows, num_nodes)?;
    let graph = Graph::with_nodes(num_nodes, &edges, false);
    Ok((graph, labels, classes))
}

/// Loads the dataset named in `config` and its `num_splits` splits.
///
/// # Errors
///
/// Returns an error if the raw files cannot be loaded or the splits are
/// invalid.
pub fn load_dataset(
    config: &ExperimentConfig,
    env: &Environment,
    seed: u64,
    num_splits: usize,
) -> Result<Dataset> {
    let hp = &config.hyper_parameters;
    let (graph, labels, classes) =
        load_graph_and_labels(&raw_dir(&env.base_dir, &config.dataset_name), &hp.traces_list)?;
    let splits = load_or_generate_splits(
        &env.data_dir,
        &labels,
        num_splits,
        seed,
        hp,
        config.is_few_shot,
    )?;
    let dataset = Dataset {
        graph,
        labels,
        classes,
        splits,
    };
    info!(
        dataset = %config.dataset_name,
        nodes = dataset.num_nodes(),
        edges = dataset.graph.num_edges(),
        classes = dataset.num_classes(),
        splits = dataset.splits.len(),
        "loaded dataset"
    );
    Ok(dataset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_raw(dir: &Path, labels: &str, edges: &[(&str, &str)]) {
        fs::create_dir_all(dir).expect("raw dir");
        fs::write(dir.join("labels.csv"), labels).expect("labels");
        for (name, body) in edges {
            fs::write(dir.join(name), body).expect("edges");
        }
    }

    #[test]
    fn test_encode_labels_sorted_classes() {
        let rows = vec![
            (0, "spam".to_string()),
            (1, "ham".to_string()),
            (2, "spam".to_string()),
        ];
        let (labels, classes) = encode_labels(&rows, 3).expect("complete");
        assert_eq!(classes, vec!["ham", "spam"]);
        assert_eq!(labels, vec![1, 0, 1]);
    }

    #[test]
    fn test_encode_labels_rejects_gaps_and_duplicates() {
        let rows = vec![(0, "a".to_string()), (2, "b".to_string())];
        let err = encode_labels(&rows, 3).expect_err("node 1 unlabelled");
        assert!(err.to_string().contains("node 1"));

        let rows = vec![(0, "a".to_string()), (0, "b".to_string())];
        assert!(encode_labels(&rows, 1).is_err());
    }

    #[test]
    fn test_load_with_traces_unions_edges() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_raw(
            dir.path(),
            "node,label\n0,a\n1,b\n2,a\n3,b\n",
            &[
                ("edges_coRT.csv", "source,target\n0,1\n"),
                ("edges_coURL.csv", "source,target\n2, 3\n1,2\n"),
            ],
        );
        let traces = vec!["coRT".to_string(), "coURL".to_string()];
        let (graph, labels, _) = load_graph_and_labels(dir.path(), &traces).expect("loads");
        assert_eq!(graph.num_nodes(), 4);
        assert_eq!(graph.num_edges(), 3);
        assert!(graph.has_edge(3, 2));
        assert_eq!(labels, vec![0, 1, 0, 1]);
    }

    #[test]
    fn test_load_without_traces_reads_edges_csv() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_raw(
            dir.path(),
            "node,label\n0,x\n1,y\n2,x\n",
            &[("edges.csv", "source,target\n0,1\n")],
        );
        let (graph, labels, classes) = load_graph_and_labels(dir.path(), &[]).expect("loads");
        assert_eq!(graph.degree(2), 0);

        let dataset = Dataset {
            graph,
            labels,
            classes,
            splits: Vec::new(),
        };
        assert_eq!(dataset.num_nodes(), 3);
        assert_eq!(dataset.num_classes(), 2);
    }

    #[test]
    fn test_edge_to_unlabelled_node_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_raw(
            dir.path(),
            "node,label\n0,x\n1,y\n",
            &[("edges.csv", "source,target\n0,5\n")],
        );
        assert!(load_graph_and_labels(dir.path(), &[]).is_err());
    }

    #[test]
    fn test_malformed_csv_names_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_raw(
            dir.path(),
            "node,label\nzero,x\n",
            &[("edges.csv", "source,target\n")],
        );
        let err = load_graph_and_labels(dir.path(), &[]).expect_err("bad node id");
        assert!(matches!(err, Node2VecError::Csv { .. }));
        assert!(err.to_string().contains("labels.csv"));
    }

    #[test]
    fn test_missing_trace_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_raw(dir.path(), "node,label\n0,x\n", &[]);
        assert!(load_graph_and_labels(dir.path(), &["coRT".to_string()]).is_err());
    }
}
