//! Node2Vec node embeddings evaluated by repeated-split node classification.
//!
//! A labelled graph is embedded once per seed with biased second-order
//! random walks and a skip-gram model. A logistic regression or random
//! forest classifier is then fitted on each of `num_splits` train/val/test
//! partitions; per-split metrics are summarised as mean and standard
//! deviation, stored as `.npy` arrays and logged to a file-based run store.
//!
//! # Quick Start
//!
//! ```
//! use aprender_node2vec::prelude::*;
//!
//! let x = Matrix::from_vec(4, 2, vec![
//!     -1.0, -1.0,
//!      1.0,  1.0,
//!     -0.9, -1.1,
//!      1.1,  0.9,
//! ]).unwrap();
//! let labels = [0, 1, 0, 1];
//! let splits = vec![Split { train: vec![0, 1], val: vec![2], test: vec![3] }];
//! let model = ModelHyperParameters { model_name: "LR".to_string(), ..Default::default() };
//!
//! let (val, test) = EvaluationLoop::new(&x, &labels, &splits, &model, 0)
//!     .unwrap()
//!     .run()
//!     .unwrap();
//! assert_eq!(val.values("accuracy").unwrap(), vec![1.0]);
//! assert_eq!(test.values("accuracy").unwrap(), vec![1.0]);
//! ```
//!
//! # Modules
//!
//! - [`primitives`]: Dense row-major matrix
//! - [`graph`]: Compressed sparse row graph
//! - [`walk`]: Node2Vec biased random walks
//! - [`embed`]: Skip-gram training and the node embedding matrix
//! - [`tree`]: CART decision trees and random forests
//! - [`classification`]: Logistic regression and classifier selection
//! - [`metrics`]: Accuracy, precision, F1 and the per-split metrics logger
//! - [`data`]: CSV dataset loading and train/val/test splits
//! - [`config`]: TOML experiment configuration
//! - [`env`]: Device resolution and working directories
//! - [`npy`]: `.npy` array files
//! - [`tracking`]: File-based experiment and run store
//! - [`experiment`]: Evaluation loop and experiment driver

pub mod classification;
pub mod config;
pub mod data;
pub mod embed;
pub mod env;
pub mod error;
pub mod experiment;
pub mod graph;
pub mod metrics;
pub mod npy;
pub mod prelude;
pub mod primitives;
pub mod tracking;
pub mod traits;
pub mod tree;
pub mod walk;

pub use error::{Node2VecError, Result};
pub use primitives::Matrix;
pub use traits::Classifier;
