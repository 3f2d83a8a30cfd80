//! Error types for the Node2Vec evaluation pipeline.
//!
//! Every stage (configuration, data loading, embedding, classification,
//! metrics, tracking) reports failures through [`Node2VecError`].

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for pipeline operations.
///
/// # Examples
///
/// ```
/// use aprender_node2vec::error::Node2VecError;
///
/// let err = Node2VecError::UnsupportedModel { name: "SVM".to_string() };
/// assert_eq!(err.to_string(), "SVM not allowed.");
/// ```
#[derive(Error, Debug)]
pub enum Node2VecError {
    /// I/O error (file not found, permission denied, etc.).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// I/O error tied to a specific path.
    #[error("I/O error on {path}: {source}")]
    PathIo {
        /// Path being read or written
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Malformed CSV input.
    #[error("CSV error in {path}: {message}")]
    Csv {
        /// File being parsed
        path: PathBuf,
        /// Parser message
        message: String,
    },

    /// JSON or TOML (de)serialization failure.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid configuration value.
    #[error("Invalid config: {param} = {value}, expected {constraint}")]
    InvalidConfig {
        /// Parameter name
        param: String,
        /// Provided value
        value: String,
        /// Constraint description
        constraint: String,
    },

    /// Classifier identifier not recognised by the factory.
    #[error("{name} not allowed.")]
    UnsupportedModel {
        /// The identifier that was requested
        name: String,
    },

    /// Matrix/label dimensions don't match for the operation.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimensions description
        expected: String,
        /// Actual dimensions found
        actual: String,
    },

    /// Model used before `fit`.
    #[error("{model} is not fitted; call fit() first")]
    NotFitted {
        /// Model name
        model: &'static str,
    },

    /// A graph node has no embedding vector.
    #[error("node {node} has no embedding (vocabulary holds {vocab_size} of {num_nodes} nodes)")]
    MissingEmbedding {
        /// Node without a vector
        node: usize,
        /// Nodes that did receive a vector
        vocab_size: usize,
        /// Nodes in the graph
        num_nodes: usize,
    },

    /// A train/val/test split violates its invariants.
    #[error("invalid split {run_id}: {reason}")]
    InvalidSplit {
        /// Split index
        run_id: usize,
        /// What is wrong with it
        reason: String,
    },

    /// Invalid input data (labels, edges, indices).
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Metric name not tracked by a logger.
    #[error("unknown metric '{0}'")]
    UnknownMetric(String),

    /// Logger summarised before every split recorded a value.
    #[error("metric '{metric}' has {recorded} of {expected} values recorded")]
    IncompleteMetrics {
        /// Metric name
        metric: String,
        /// Values recorded so far
        recorded: usize,
        /// Values required
        expected: usize,
    },

    /// Empty input where data is required.
    #[error("empty input: {0}")]
    EmptyInput(String),

    /// Evaluation loop driven past its terminal state.
    #[error("evaluation loop already finished after {0} splits")]
    LoopFinished(usize),

    /// Run tracking store failure.
    #[error("tracking error: {0}")]
    Tracking(String),
}

impl From<serde_json::Error> for Node2VecError {
    fn from(err: serde_json::Error) -> Self {
        Node2VecError::Serialization(err.to_string())
    }
}

impl Node2VecError {
    /// Create a dimension mismatch error with descriptive context
    #[must_use]
    pub fn dimension_mismatch(context: &str, expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch {
            expected: format!("{context}={expected}"),
            actual: format!("{actual}"),
        }
    }

    /// Create an index out of bounds error
    #[must_use]
    pub fn index_out_of_bounds(index: usize, len: usize) -> Self {
        Self::InvalidData(format!("index {index} out of bounds (len={len})"))
    }

    /// Wrap an I/O error with the path that produced it
    #[must_use]
    pub fn path_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::PathIo {
            path: path.into(),
            source,
        }
    }
}

/// Convenience type alias for Results.
pub type Result<T> = std::result::Result<T, Node2VecError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_model_names_identifier() {
        let err = Node2VecError::UnsupportedModel {
            name: "XGB".to_string(),
        };
        assert_eq!(err.to_string(), "XGB not allowed.");
    }

    #[test]
    fn test_invalid_config_display() {
        let err = Node2VecError::InvalidConfig {
            param: "train_perc".to_string(),
            value: "1.5".to_string(),
            constraint: "value in [0, 1]".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("train_perc"));
        assert!(msg.contains("1.5"));
        assert!(msg.contains("[0, 1]"));
    }

    #[test]
    fn test_missing_embedding_display() {
        let err = Node2VecError::MissingEmbedding {
            node: 7,
            vocab_size: 9,
            num_nodes: 10,
        };
        let msg = err.to_string();
        assert!(msg.contains("node 7"));
        assert!(msg.contains("9 of 10"));
    }

    #[test]
    fn test_incomplete_metrics_display() {
        let err = Node2VecError::IncompleteMetrics {
            metric: "accuracy".to_string(),
            recorded: 2,
            expected: 10,
        };
        assert_eq!(
            err.to_string(),
            "metric 'accuracy' has 2 of 10 values recorded"
        );
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err: Node2VecError = io_err.into();
        assert!(matches!(err, Node2VecError::Io(_)));
    }

    #[test]
    fn test_path_io_keeps_source() {
        use std::error::Error;
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = Node2VecError::path_io("/tmp/missing.csv", io_err);
        assert!(err.to_string().contains("/tmp/missing.csv"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<Vec<u32>>("not json").unwrap_err();
        let err: Node2VecError = json_err.into();
        assert!(matches!(err, Node2VecError::Serialization(_)));
    }

    #[test]
    fn test_dimension_mismatch_helper() {
        let err = Node2VecError::dimension_mismatch("rows", 100, 50);
        let msg = err.to_string();
        assert!(msg.contains("rows=100"));
        assert!(msg.contains("50"));
    }

    #[test]
    fn test_index_out_of_bounds_helper() {
        let err = Node2VecError::index_out_of_bounds(10, 5);
        let msg = err.to_string();
        assert!(msg.contains("index 10"));
        assert!(msg.contains("len=5"));
    }
}
