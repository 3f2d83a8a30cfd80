//! Skip-gram with negative sampling over random walks.
//!
//! Walks are "sentences", nodes are "words". Nodes appearing in similar walk
//! contexts end up with similar input vectors.
//!
//! SGNS maximises, for each (center, context) pair inside the window,
//!
//! ```text
//! log σ(v_ctx · v_center) + Σ_k log σ(-v_neg_k · v_center)
//! ```
//!
//! with negatives drawn from the unigram distribution raised to 3/4.
//! Frequent nodes are randomly downsampled on every pass: a node with count
//! `c` out of `N` corpus words is kept with probability
//! `(sqrt(c / t) + 1) · t / c` (capped at 1), where `t = sample · N`.

use super::KeyedVectors;
use crate::error::{Node2VecError, Result};
use crate::graph::NodeId;
use rand::distributions::{Distribution, Uniform, WeightedIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Smoothing exponent of the negative-sampling distribution.
const NEG_SAMPLING_POWER: f64 = 0.75;

/// Skip-gram training configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkipGramConfig {
    /// Maximum context window on each side.
    pub window: usize,
    /// Nodes seen fewer times than this across all walks get no vector.
    pub min_count: usize,
    /// Words processed between learning-rate updates.
    pub batch_words: usize,
    /// Negative samples per positive pair.
    pub negative: usize,
    /// Passes over the walk corpus.
    pub epochs: usize,
    /// Downsampling threshold for frequent nodes; `0` disables it.
    pub sample: f64,
    /// Initial learning rate.
    pub alpha: f32,
    /// Final learning rate.
    pub min_alpha: f32,
}

impl Default for SkipGramConfig {
    fn default() -> Self {
        Self {
            window: 8,
            min_count: 1,
            batch_words: 4,
            negative: 5,
            epochs: 5,
            sample: 1e-3,
            alpha: 0.025,
            min_alpha: 0.0001,
        }
    }
}

impl SkipGramConfig {
    /// Checks every field is in range.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("window", self.window),
            ("min_count", self.min_count),
            ("batch_words", self.batch_words),
            ("epochs", self.epochs),
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
        if !(self.sample.is_finite() && self.sample >= 0.0) {
            return Err(Node2VecError::InvalidConfig {
                param: "sample".to_string(),
                value: self.sample.to_string(),
                constraint: "finite and >= 0".to_string(),
            });
        }
        if !(self.alpha.is_finite() && self.alpha > 0.0) {
            return Err(Node2VecError::InvalidConfig {
                param: "alpha".to_string(),
                value: self.alpha.to_string(),
                constraint: "finite and > 0".to_string(),
            });
        }
        if !(self.min_alpha >= 0.0 && self.min_alpha <= self.alpha) {
            return Err(Node2VecError::InvalidConfig {
                param: "min_alpha".to_string(),
                value: self.min_alpha.to_string(),
                constraint: format!("in [0, alpha={}]", self.alpha),
            });
        }
        Ok(())
    }
}

/// Skip-gram model over a node vocabulary.
///
/// Uses two matrices of shape `(vocab_size, dim)`: input vectors (the
/// embeddings that are returned) and output vectors (discarded after
/// training).
#[derive(Debug, Clone)]
pub struct SkipGram {
    dim: usize,
    config: SkipGramConfig,
    /// Vocabulary index -> node id, ascending by node id
    vocab: Vec<NodeId>,
    index: HashMap<NodeId, usize>,
    counts: Vec<u64>,
    input: Vec<f32>,
    output: Vec<f32>,
    rng: StdRng,
}

impl SkipGram {
    /// Builds the vocabulary from `walks` and initialises the vectors.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, `dim` is zero, or
    /// no node reaches `min_count`.
    pub fn new(
        walks: &[Vec<NodeId>],
        dim: usize,
        config: SkipGramConfig,
        seed: u64,
    ) -> Result<Self> {
        config.validate()?;
        if dim == 0 {
            return Err(Node2VecError::InvalidConfig {
                param: "latent_dim".to_string(),
                value: "0".to_string(),
                constraint: "> 0".to_string(),
            });
        }

        // BTreeMap keeps vocabulary order independent of hashing
        let mut raw_counts: BTreeMap<NodeId, u64> = BTreeMap::new();
        for &node in walks.iter().flatten() {
            *raw_counts.entry(node).or_insert(0) += 1;
        }
        let (vocab, counts): (Vec<NodeId>, Vec<u64>) = raw_counts
            .into_iter()
            .filter(|&(_, count)| count >= config.min_count as u64)
            .unzip();
        if vocab.is_empty() {
            return Err(Node2VecError::EmptyInput(format!(
                "no node occurs at least min_count={} times in the walks",
                config.min_count
            )));
        }
        let index = vocab.iter().enumerate().map(|(i, &n)| (n, i)).collect();

        let mut rng = StdRng::seed_from_u64(seed);
        let bound = 0.5 / dim as f32;
        let init = Uniform::new(-bound, bound);
        let input = (0..vocab.len() * dim).map(|_| init.sample(&mut rng)).collect();
        let output = vec![0.0; vocab.len() * dim];

        Ok(Self {
            dim,
            config,
            vocab,
            index,
            counts,
            input,
            output,
            rng,
        })
    }

    /// Number of nodes with a vector.
    #[must_use]
    pub fn vocab_size(&self) -> usize {
        self.vocab.len()
    }

    /// Embedding dimension.
    #[must_use]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Keep probability of each vocabulary entry under downsampling.
    #[must_use]
    pub fn keep_probabilities(&self) -> Vec<f64> {
        let total: u64 = self.counts.iter().sum();
        let threshold = self.config.sample * total as f64;
        self.counts
            .iter()
            .map(|&c| {
                if threshold <= 0.0 {
                    return 1.0;
                }
                let c = c as f64;
                (((c / threshold).sqrt() + 1.0) * threshold / c).min(1.0)
            })
            .collect()
    }

    /// Trains for `config.epochs` passes over `walks`.
    ///
    /// Out-of-vocabulary nodes are dropped from each walk and frequent nodes
    /// are downsampled before windowing.
    ///
    /// # Errors
    ///
    /// Returns an error if the negative-sampling distribution cannot be built.
    pub fn train(&mut self, walks: &[Vec<NodeId>]) -> Result<()> {
        let weights: Vec<f64> = self
            .counts
            .iter()
            .map(|&c| (c as f64).powf(NEG_SAMPLING_POWER))
            .collect();
        let neg_dist = WeightedIndex::new(&weights)
            .map_err(|e| Node2VecError::InvalidData(format!("negative sampling table: {e}")))?;

        let sentences: Vec<Vec<usize>> = walks
            .iter()
            .map(|walk| walk.iter().filter_map(|n| self.index.get(n).copied()).collect())
            .collect();
        let keep = self.keep_probabilities();
        let words_per_epoch: usize = sentences.iter().map(Vec::len).sum();
        let total_words = (words_per_epoch * self.config.epochs).max(1);

        let mut processed = 0usize;
        let mut since_update = 0usize;
        let mut lr = self.config.alpha;
        let mut grad_in = vec![0.0f32; self.dim];

        for epoch in 0..self.config.epochs {
            for raw in &sentences {
                let sentence: Vec<usize> = raw
                    .iter()
                    .copied()
                    .filter(|&w| keep[w] >= 1.0 || self.rng.gen::<f64>() < keep[w])
                    .collect();
                // Dropped nodes still advance the learning-rate schedule
                processed += raw.len() - sentence.len();
                for (pos, &center) in sentence.iter().enumerate() {
                    // Dynamic window: uniform in 1..=window
                    let reach = self.rng.gen_range(1..=self.config.window);
                    let start = pos.saturating_sub(reach);
                    let end = (pos + reach + 1).min(sentence.len());
                    for (ctx_pos, &context) in sentence.iter().enumerate().take(end).skip(start) {
                        if ctx_pos != pos {
                            self.train_pair(center, context, lr, &neg_dist, &mut grad_in);
                        }
                    }

                    processed += 1;
                    since_update += 1;
                    if since_update >= self.config.batch_words {
                        since_update = 0;
                        let progress = processed as f32 / total_words as f32;
                        lr = (self.config.alpha
                            - (self.config.alpha - self.config.min_alpha) * progress)
                            .max(self.config.min_alpha);
                    }
                }
            }
            debug!(epoch, lr, "skip-gram epoch complete");
        }
        Ok(())
    }

    /// One positive update for `(center, context)` plus negative updates.
    fn train_pair(
        &mut self,
        center: usize,
        context: usize,
        lr: f32,
        neg_dist: &WeightedIndex<f64>,
        grad_in: &mut [f32],
    ) {
        let dim = self.dim;
        let c_off = center * dim;
        grad_in.iter_mut().for_each(|g| *g = 0.0);

        for d in 0..=self.config.negative {
            let (target, label) = if d == 0 {
                (context, 1.0f32)
            } else {
                let sampled = neg_dist.sample(&mut self.rng);
                if sampled == context {
                    continue;
                }
                (sampled, 0.0f32)
            };
            let t_off = target * dim;

            let dot: f32 = (0..dim)
                .map(|i| self.input[c_off + i] * self.output[t_off + i])
                .sum();
            let g = (label - sigmoid(dot)) * lr;

            for i in 0..dim {
                grad_in[i] += g * self.output[t_off + i];
                self.output[t_off + i] += g * self.input[c_off + i];
            }
        }

        for (i, g) in grad_in.iter().enumerate() {
            self.input[c_off + i] += g;
        }
    }

    /// Input vectors keyed by node id.
    #[must_use]
    pub fn keyed_vectors(&self) -> KeyedVectors {
        let vectors = self
            .vocab
            .iter()
            .enumerate()
            .map(|(i, &node)| (node, self.input[i * self.dim..(i + 1) * self.dim].to_vec()))
            .collect();
        KeyedVectors::new(self.dim, vectors)
    }
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}
