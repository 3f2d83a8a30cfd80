//! Node2Vec random walk generation.
//!
//! Implements biased 2nd-order random walks as described in
//! Grover & Leskovec, "node2vec: Scalable Feature Learning for Networks"
//! (KDD 2016).
//!
//! - `p` (return): unnormalised weight `1/p` for stepping back to the previous node
//! - `q` (in-out): unnormalised weight `1/q` for moving away from the previous node
//! - nodes adjacent to the previous node get weight `1`
//!
//! `p = q = 1` is the uniform DeepWalk walk. Biased steps use rejection
//! sampling, O(1) expected per step.
//!
//! Every walk draws from its own RNG seeded from `(seed, round, start)`, so
//! the output does not depend on how many worker threads run the walks.

use crate::error::{Node2VecError, Result};
use crate::graph::{Graph, NodeId};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Configuration for random walks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkConfig {
    /// Maximum number of nodes in each walk.
    pub walk_length: usize,
    /// Number of walks started from each node.
    pub num_walks: usize,
    /// Worker threads used to generate walks.
    pub workers: usize,
    /// Return parameter.
    pub p: f32,
    /// In-out parameter.
    pub q: f32,
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self {
            walk_length: 5,
            num_walks: 10,
            workers: 8,
            p: 1.0,
            q: 1.0,
        }
    }
}

impl WalkConfig {
    /// Checks every field is in range.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("walk_length", self.walk_length),
            ("num_walks", self.num_walks),
            ("workers", self.workers),
        ];
        for (param, value) in positive {
            if value == 0 {
                return Err(Node2VecError::InvalidConfig {
                    param: param.to_string(),
                    value: value.to_string(),
                    constraint: "> 0".to_string(),
                });
            }
        }
        for (param, value) in [("p", self.p), ("q", self.q)] {
            if !(value.is_finite() && value > 0.0) {
                return Err(Node2VecError::InvalidConfig {
                    param: param.to_string(),
                    value: value.to_string(),
                    constraint: "finite and > 0".to_string(),
                });
            }
        }
        Ok(())
    }

    fn is_unbiased(&self) -> bool {
        (self.p - 1.0).abs() < f32::EPSILON && (self.q - 1.0).abs() < f32::EPSILON
    }
}

/// Generate `num_walks` walks from every node of the graph.
///
/// Walks are returned round-major: all walks of round 0 (start nodes in a
/// round-seeded shuffled order), then round 1, and so on.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or the worker pool
/// cannot be built.
///
/// # Examples
///
/// ```
/// use aprender_node2vec::graph::Graph;
/// use aprender_node2vec::walk::{generate_walks, WalkConfig};
///
/// let g = Graph::from_edges(&[(0, 1), (1, 2)], false);
/// let config = WalkConfig { walk_length: 4, num_walks: 2, workers: 1, ..Default::default() };
/// let walks = generate_walks(&g, &config, 7).expect("valid config");
/// assert_eq!(walks.len(), 6);
/// ```
pub fn generate_walks(graph: &Graph, config: &WalkConfig, seed: u64) -> Result<Vec<Vec<NodeId>>> {
    config.validate()?;
    let walker = Node2VecWalker::new(graph, *config, seed);

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.workers)
        .build()
        .map_err(|e| Node2VecError::InvalidConfig {
            param: "workers".to_string(),
            value: config.workers.to_string(),
            constraint: format!("a buildable thread pool ({e})"),
        })?;

    let jobs = walker.schedule();
    debug!(
        walks = jobs.len(),
        workers = config.workers,
        "generating random walks"
    );
    Ok(pool.install(|| {
        jobs.par_iter()
            .map(|&(round, start)| walker.walk_from(round, start))
            .collect()
    }))
}

/// Node2Vec random walker over a borrowed graph.
#[derive(Debug, Clone, Copy)]
pub struct Node2VecWalker<'a> {
    graph: &'a Graph,
    config: WalkConfig,
    seed: u64,
}

impl<'a> Node2VecWalker<'a> {
    /// Create a new walker.
    #[must_use]
    pub const fn new(graph: &'a Graph, config: WalkConfig, seed: u64) -> Self {
        Self {
            graph,
            config,
            seed,
        }
    }

    /// `(round, start)` pairs in output order.
    fn schedule(&self) -> Vec<(usize, NodeId)> {
        let nodes: Vec<NodeId> = self.graph.nodes().collect();
        let mut jobs = Vec::with_capacity(nodes.len() * self.config.num_walks);
        for round in 0..self.config.num_walks {
            let mut rng = StdRng::seed_from_u64(round_seed(self.seed, round));
            let mut shuffled = nodes.clone();
            shuffled.shuffle(&mut rng);
            jobs.extend(shuffled.into_iter().map(|start| (round, start)));
        }
        jobs
    }

    /// One walk from `start` in the given round.
    #[must_use]
    pub fn walk_from(&self, round: usize, start: NodeId) -> Vec<NodeId> {
        let mut rng = StdRng::seed_from_u64(walk_seed(self.seed, round, start));
        if self.config.is_unbiased() {
            self.unbiased_walk(start, &mut rng)
        } else {
            self.biased_walk(start, &mut rng)
        }
    }

    /// Uniform random walk (DeepWalk).
    fn unbiased_walk<R: Rng>(&self, start: NodeId, rng: &mut R) -> Vec<NodeId> {
        let mut walk = Vec::with_capacity(self.config.walk_length);
        walk.push(start);

        let mut curr = start;
        while walk.len() < self.config.walk_length {
            let neighbors = self.graph.neighbors(curr);
            if neighbors.is_empty() {
                break;
            }
            curr = neighbors[rng.gen_range(0..neighbors.len())];
            walk.push(curr);
        }
        walk
    }

    /// Biased 2nd-order random walk.
    fn biased_walk<R: Rng>(&self, start: NodeId, rng: &mut R) -> Vec<NodeId> {
        let mut walk = Vec::with_capacity(self.config.walk_length);
        walk.push(start);

        let mut prev: Option<NodeId> = None;
        let mut curr = start;
        while walk.len() < self.config.walk_length {
            let neighbors = self.graph.neighbors(curr);
            if neighbors.is_empty() {
                break;
            }
            let next = match prev {
                Some(prev_node) => self.sample_biased(rng, prev_node, neighbors),
                // First step: uniform
                None => neighbors[rng.gen_range(0..neighbors.len())],
            };
            walk.push(next);
            prev = Some(curr);
            curr = next;
        }
        walk
    }

    /// Rejection sampling over `neighbors`, expected ~2-3 trials.
    fn sample_biased<R: Rng>(&self, rng: &mut R, prev: NodeId, neighbors: &[NodeId]) -> NodeId {
        let p = f64::from(self.config.p);
        let q = f64::from(self.config.q);
        let max_prob = (1.0 / p).max(1.0).max(1.0 / q);

        loop {
            let candidate = neighbors[rng.gen_range(0..neighbors.len())];
            let unnorm_prob = if candidate == prev {
                1.0 / p
            } else if self.graph.has_edge(prev, candidate) {
                1.0
            } else {
                1.0 / q
            };

            let r: f64 = rng.gen();
            if r < unnorm_prob / max_prob {
                return candidate;
            }
        }
    }
}

/// SplitMix64 finaliser.
fn mix(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Seed of one walk, from the walk coordinates.
fn walk_seed(seed: u64, round: usize, start: NodeId) -> u64 {
    mix(seed
        ^ (round as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
        ^ (start as u64).wrapping_mul(0xC2B2_AE3D_27D4_EB4F))
}

/// Seed of the start-node shuffle in `round`.
fn round_seed(seed: u64, round: usize) -> u64 {
    mix(mix(seed) ^ (round as u64).wrapping_mul(0xD6E8_FEB8_6659_FD93))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path_graph() -> Graph {
        Graph::from_edges(&[(0, 1), (1, 2), (2, 3)], false)
    }

    #[test]
    fn test_walk_count_and_length() {
        let g = path_graph();
        let config = WalkConfig {
            walk_length: 10,
            num_walks: 3,
            workers: 2,
            ..Default::default()
        };
        let walks = generate_walks(&g, &config, 42).expect("valid config");
        assert_eq!(walks.len(), 4 * 3);
        for walk in &walks {
            assert!(!walk.is_empty());
            assert!(walk.len() <= 10);
        }
    }

    #[test]
    fn test_walks_follow_edges() {
        let g = path_graph();
        let config = WalkConfig {
            walk_length: 8,
            num_walks: 4,
            workers: 1,
            p: 0.5,
            q: 2.0,
        };
        for walk in generate_walks(&g, &config, 3).expect("valid config") {
            for pair in walk.windows(2) {
                assert!(g.has_edge(pair[0], pair[1]), "{pair:?} is not an edge");
            }
        }
    }

    #[test]
    fn test_every_node_starts_a_walk_each_round() {
        let g = path_graph();
        let config = WalkConfig {
            walk_length: 3,
            num_walks: 2,
            workers: 1,
            ..Default::default()
        };
        let walks = generate_walks(&g, &config, 9).expect("valid config");
        for round in walks.chunks(4) {
            let mut starts: Vec<NodeId> = round.iter().map(|w| w[0]).collect();
            starts.sort_unstable();
            assert_eq!(starts, vec![0, 1, 2, 3]);
        }
    }

    #[test]
    fn test_isolated_node_walk_is_single_node() {
        let g = Graph::with_nodes(3, &[(0, 1)], false);
        let walker = Node2VecWalker::new(&g, WalkConfig::default(), 1);
        assert_eq!(walker.walk_from(0, 2), vec![2]);
    }

    #[test]
    fn test_reproducible_across_worker_counts() {
        let g = Graph::from_edges(&[(0, 1), (1, 2), (2, 0), (2, 3), (3, 4), (4, 2)], false);
        let base = WalkConfig {
            walk_length: 12,
            num_walks: 5,
            workers: 1,
            p: 0.25,
            q: 4.0,
        };
        let single = generate_walks(&g, &base, 999).expect("valid config");
        let multi = generate_walks(&g, &WalkConfig { workers: 4, ..base }, 999)
            .expect("valid config");
        assert_eq!(single, multi);
    }

    #[test]
    fn test_different_seeds_differ() {
        let g = Graph::from_edges(&[(0, 1), (1, 2), (2, 0), (2, 3), (3, 4), (4, 2)], false);
        let config = WalkConfig {
            walk_length: 20,
            num_walks: 5,
            workers: 1,
            ..Default::default()
        };
        let a = generate_walks(&g, &config, 1).expect("valid config");
        let b = generate_walks(&g, &config, 2).expect("valid config");
        assert_ne!(a, b);
    }

    #[test]
    fn test_round_shuffles_not_shifted_across_seeds() {
        let edges: Vec<(usize, usize)> = (0..12).map(|i| (i, (i + 1) % 12)).collect();
        let g = Graph::from_edges(&edges, false);
        let config = WalkConfig {
            num_walks: 2,
            ..Default::default()
        };
        let order = |seed: u64, round: usize| -> Vec<NodeId> {
            Node2VecWalker::new(&g, config, seed)
                .schedule()
                .into_iter()
                .filter(|&(r, _)| r == round)
                .map(|(_, start)| start)
                .collect()
        };
        assert_eq!(order(5, 1).len(), 12);
        assert_ne!(order(5, 1), order(6, 0));
        assert_ne!(order(5, 0), order(5, 1));
        assert_eq!(order(5, 1), order(5, 1));
    }

    #[test]
    fn test_zero_workers_rejected() {
        let g = path_graph();
        let config = WalkConfig {
            workers: 0,
            ..Default::default()
        };
        let err = generate_walks(&g, &config, 0).expect_err("zero workers");
        assert!(err.to_string().contains("workers"));
    }

    #[test]
    fn test_non_positive_q_rejected() {
        let config = WalkConfig {
            q: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
