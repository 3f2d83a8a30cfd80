//! Convenience re-exports for common usage.
//!
//! # Usage
//!
//! ```
//! use aprender_node2vec::prelude::*;
//! ```

pub use crate::classification::{create_model, LogisticRegression, Model, ModelKind};
pub use crate::config::{ExperimentConfig, HyperParameters, ModelHyperParameters};
pub use crate::data::{Dataset, Split};
pub use crate::embed::{embed_nodes, KeyedVectors, Node2Vec, SkipGramConfig};
pub use crate::error::{Node2VecError, Result};
pub use crate::experiment::{run_all, run_experiment, EvaluationLoop, LoopState};
pub use crate::graph::Graph;
pub use crate::metrics::{eval_pred, mean_std, MetricsLogger};
pub use crate::primitives::Matrix;
pub use crate::traits::Classifier;
pub use crate::tree::{DecisionTreeClassifier, RandomForestClassifier};
pub use crate::walk::WalkConfig;
