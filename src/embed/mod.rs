//! Node embedding stage: Node2Vec walks followed by skip-gram training.
//!
//! The stage mirrors the usual two-step Node2Vec workflow: constructing a
//! [`Node2Vec`] precomputes the random walks, [`Node2Vec::fit`] trains the
//! skip-gram model and returns [`KeyedVectors`]. [`embedding_matrix`] then
//! turns those vectors into a dense `(num_nodes, latent_dim)` matrix,
//! refusing to build one if any node lacks a vector.
//!
//! # Example
//!
//! ```
//! use aprender_node2vec::embed::{embedding_matrix, Node2Vec, SkipGramConfig};
//! use aprender_node2vec::graph::Graph;
//! use aprender_node2vec::walk::WalkConfig;
//!
//! let g = Graph::from_edges(&[(0, 1), (1, 2), (2, 3), (3, 0)], false);
//! let walk = WalkConfig { walk_length: 5, num_walks: 4, workers: 1, ..Default::default() };
//! let node2vec = Node2Vec::new(&g, 8, walk, 0).expect("walks generated");
//! let vectors = node2vec.fit(&SkipGramConfig::default()).expect("trained");
//! let matrix = embedding_matrix(&g, &vectors).expect("every node embedded");
//! assert_eq!(matrix.shape(), (4, 8));
//! ```

mod skipgram;

pub use skipgram::{SkipGram, SkipGramConfig};

use crate::error::{Node2VecError, Result};
use crate::graph::{Graph, NodeId};
use crate::primitives::Matrix;
use crate::walk::{generate_walks, WalkConfig};
use std::collections::BTreeMap;
use tracing::info;

/// Trained vectors keyed by node id.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyedVectors {
    dim: usize,
    vectors: BTreeMap<NodeId, Vec<f32>>,
}

impl KeyedVectors {
    /// Wraps a node -> vector mapping.
    #[must_use]
    pub fn new(dim: usize, vectors: BTreeMap<NodeId, Vec<f32>>) -> Self {
        Self { dim, vectors }
    }

    /// Vector length.
    #[must_use]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Vector for `node`, if it is in the vocabulary.
    #[must_use]
    pub fn get(&self, node: NodeId) -> Option<&[f32]> {
        self.vectors.get(&node).map(Vec::as_slice)
    }

    /// Number of nodes with a vector.
    #[must_use]
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    /// True when no node has a vector.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }
}

/// Node2Vec embedder holding precomputed walks over a graph.
#[derive(Debug)]
pub struct Node2Vec<'a> {
    graph: &'a Graph,
    dimensions: usize,
    seed: u64,
    walks: Vec<Vec<NodeId>>,
}

impl<'a> Node2Vec<'a> {
    /// Generates the random walks.
    ///
    /// # Errors
    ///
    /// Returns an error if the walk configuration is invalid.
    pub fn new(graph: &'a Graph, dimensions: usize, walk: WalkConfig, seed: u64) -> Result<Self> {
        let walks = generate_walks(graph, &walk, seed)?;
        info!(
            nodes = graph.num_nodes(),
            walks = walks.len(),
            walk_length = walk.walk_length,
            "precomputed random walks"
        );
        Ok(Self {
            graph,
            dimensions,
            seed,
            walks,
        })
    }

    /// The generated walks.
    #[must_use]
    pub fn walks(&self) -> &[Vec<NodeId>] {
        &self.walks
    }

    /// The graph being embedded.
    #[must_use]
    pub fn graph(&self) -> &Graph {
        self.graph
    }

    /// Trains skip-gram on the walks.
    ///
    /// # Errors
    ///
    /// Returns an error if the skip-gram configuration is invalid or the
    /// walks yield an empty vocabulary.
    pub fn fit(&self, config: &SkipGramConfig) -> Result<KeyedVectors> {
        let mut model = SkipGram::new(&self.walks, self.dimensions, config.clone(), self.seed)?;
        model.train(&self.walks)?;
        info!(
            vocab = model.vocab_size(),
            dim = self.dimensions,
            "trained skip-gram embeddings"
        );
        Ok(model.keyed_vectors())
    }
}

/// Builds the `(num_nodes, dim)` embedding matrix, row `i` holding node `i`.
///
/// # Errors
///
/// Returns `MissingEmbedding` for the first node without a vector.
pub fn embedding_matrix(graph: &Graph, vectors: &KeyedVectors) -> Result<Matrix<f32>> {
    let rows = graph
        .nodes()
        .map(|node| {
            vectors.get(node).ok_or(Node2VecError::MissingEmbedding {
                node,
                vocab_size: vectors.len(),
                num_nodes: graph.num_nodes(),
            })
        })
        .collect::<Result<Vec<&[f32]>>>()?;
    Matrix::from_rows(vectors.dim(), &rows)
}

/// Runs the whole embedding stage and returns the embedding matrix.
///
/// # Errors
///
/// Propagates walk, training and coverage errors.
pub fn embed_nodes(
    graph: &Graph,
    latent_dim: usize,
    walk: WalkConfig,
    skipgram: &SkipGramConfig,
    seed: u64,
) -> Result<Matrix<f32>> {
    let node2vec = Node2Vec::new(graph, latent_dim, walk, seed)?;
    let vectors = node2vec.fit(skipgram)?;
    embedding_matrix(graph, &vectors)
}
