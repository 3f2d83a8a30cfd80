//! Experiment configuration.
//!
//! Every section carries `#[serde(default)]`, so a TOML file only needs the
//! keys it changes:
//!
//! ```toml
//! dataset_name = "cuba"
//! seeds = [0, 1]
//! num_splits = [10]
//!
//! [hyper_parameters]
//! train_perc = 0.7
//! val_perc = 0.15
//! test_perc = 0.15
//! traces_list = ["coRT"]
//!
//! [model]
//! model_name = "RF"
//! latent_dim = 64
//!
//! [walk]
//! walk_length = 5
//! num_walks = 10
//! workers = 8
//!
//! [skipgram]
//! window = 8
//! min_count = 1
//! batch_words = 4
//! ```

use crate::classification::ModelKind;
use crate::embed::SkipGramConfig;
use crate::error::{Node2VecError, Result};
use crate::walk::WalkConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Tolerance on `train_perc + val_perc + test_perc == 1`.
const PERC_SUM_TOLERANCE: f64 = 1e-6;

fn invalid(param: &str, value: impl ToString, constraint: &str) -> Node2VecError {
    Node2VecError::InvalidConfig {
        param: param.to_string(),
        value: value.to_string(),
        constraint: constraint.to_string(),
    }
}

/// Data split hyper-parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HyperParameters {
    /// Fraction of nodes used for training
    pub train_perc: f64,
    /// Fraction of nodes used for validation
    pub val_perc: f64,
    /// Fraction of nodes used for testing
    pub test_perc: f64,
    /// Regenerate splits even when a cached file exists
    pub overwrite_data: bool,
    /// Edge traces to load (`edges_<trace>.csv`); empty loads `edges.csv`
    pub traces_list: Vec<String>,
    /// Training nodes per class in few-shot mode
    pub few_shot_per_class: usize,
}

impl Default for HyperParameters {
    fn default() -> Self {
        Self {
            train_perc: 0.70,
            val_perc: 0.15,
            test_perc: 0.15,
            overwrite_data: false,
            traces_list: vec!["coRT".to_string()],
            few_shot_per_class: 5,
        }
    }
}

impl HyperParameters {
    /// Checks the split fractions.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if a fraction is outside `[0, 1]`, the
    /// fractions do not sum to 1, or `few_shot_per_class` is zero.
    pub fn validate(&self) -> Result<()> {
        for (param, value) in [
            ("train_perc", self.train_perc),
            ("val_perc", self.val_perc),
            ("test_perc", self.test_perc),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(invalid(param, value, "value in [0, 1]"));
            }
        }
        let sum = self.train_perc + self.val_perc + self.test_perc;
        if (sum - 1.0).abs() > PERC_SUM_TOLERANCE {
            return Err(invalid(
                "train_perc + val_perc + test_perc",
                sum,
                "a sum of 1",
            ));
        }
        if self.few_shot_per_class == 0 {
            return Err(invalid("few_shot_per_class", 0, "> 0"));
        }
        if self.traces_list.iter().any(|t| t.is_empty()) {
            return Err(invalid("traces_list", "\"\"", "non-empty trace names"));
        }
        Ok(())
    }
}

/// Classifier hyper-parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelHyperParameters {
    /// Classifier identifier, `LR` or `RF`
    pub model_name: String,
    /// Embedding dimensionality
    pub latent_dim: usize,
    /// Trees in the random forest
    pub n_estimators: usize,
    /// Depth limit of each forest tree
    pub max_depth: Option<usize>,
    /// Inverse L2 strength of logistic regression
    pub c: f32,
    /// Gradient descent iterations of logistic regression
    pub max_iter: usize,
}

impl Default for ModelHyperParameters {
    fn default() -> Self {
        Self {
            model_name: "RF".to_string(),
            latent_dim: 64,
            n_estimators: 100,
            max_depth: None,
            c: 1.0,
            max_iter: 500,
        }
    }
}

impl ModelHyperParameters {
    /// The parsed classifier family.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedModel` for an unknown identifier.
    pub fn kind(&self) -> Result<ModelKind> {
        self.model_name.parse()
    }

    /// Checks the model section.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedModel` for an unknown identifier, otherwise
    /// `InvalidConfig` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        self.kind()?;
        if self.latent_dim == 0 {
            return Err(invalid("latent_dim", 0, "> 0"));
        }
        if self.n_estimators == 0 {
            return Err(invalid("n_estimators", 0, "> 0"));
        }
        if !(self.c.is_finite() && self.c > 0.0) {
            return Err(invalid("c", self.c, "finite and > 0"));
        }
        Ok(())
    }
}

/// Full configuration of one invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    /// Dataset directory name under `data/raw`
    pub dataset_name: String,
    /// Use few-shot training splits
    pub is_few_shot: bool,
    /// Requested device: empty or `cpu`, or a CUDA ordinal
    pub device_id: String,
    /// One experiment per seed
    pub seeds: Vec<u64>,
    /// One run per split count
    pub num_splits: Vec<usize>,
    /// Root of the `data/` tree
    pub base_dir: PathBuf,
    /// Root of the run store
    pub tracking_dir: PathBuf,
    /// Split hyper-parameters
    pub hyper_parameters: HyperParameters,
    /// Classifier hyper-parameters
    pub model: ModelHyperParameters,
    /// Random walk parameters
    pub walk: WalkConfig,
    /// Skip-gram parameters
    pub skipgram: SkipGramConfig,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            dataset_name: "cuba".to_string(),
            is_few_shot: false,
            device_id: String::new(),
            seeds: vec![0],
            num_splits: vec![10],
            base_dir: PathBuf::from("."),
            tracking_dir: PathBuf::from("mlruns"),
            hyper_parameters: HyperParameters::default(),
            model: ModelHyperParameters::default(),
            walk: WalkConfig::default(),
            skipgram: SkipGramConfig::default(),
        }
    }
}

impl ExperimentConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents =
            std::fs::read_to_string(path).map_err(|e| Node2VecError::path_io(path, e))?;
        toml::from_str(&contents).map_err(|e| {
            Node2VecError::Serialization(format!(
                "failed to parse TOML in '{}': {e}",
                path.display()
            ))
        })
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not valid TOML for this schema.
    pub fn from_toml_str(toml: &str) -> Result<Self> {
        toml::from_str(toml)
            .map_err(|e| Node2VecError::Serialization(format!("failed to parse TOML: {e}")))
    }

    /// Serialize configuration to a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Node2VecError::Serialization(e.to_string()))
    }

    /// Checks every section, returning the first error.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedModel` for an unknown classifier, otherwise
    /// `InvalidConfig` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        self.model.validate()?;
        if self.dataset_name.is_empty() {
            return Err(invalid("dataset_name", "\"\"", "a non-empty name"));
        }
        if self.seeds.is_empty() {
            return Err(invalid("seeds", "[]", "at least one seed"));
        }
        if self.num_splits.is_empty() {
            return Err(invalid("num_splits", "[]", "at least one split count"));
        }
        if let Some(&zero) = self.num_splits.iter().find(|&&n| n == 0) {
            return Err(invalid("num_splits", zero, "every split count > 0"));
        }
        self.hyper_parameters.validate()?;
        self.walk.validate()?;
        self.skipgram.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ExperimentConfig::default();
        config.validate().expect("defaults validate");
        assert_eq!(config.dataset_name, "cuba");
        assert_eq!(config.model.latent_dim, 64);
        assert_eq!(config.model.model_name, "RF");
        assert_eq!(config.hyper_parameters.traces_list, vec!["coRT"]);
        assert_eq!(config.walk.walk_length, 5);
        assert_eq!(config.skipgram.batch_words, 4);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ExperimentConfig::from_toml_str(
            r#"
            seeds = [1, 2]

            [model]
            model_name = "LR"

            [walk]
            p = 0.5
            "#,
        )
        .expect("valid TOML");
        assert_eq!(config.seeds, vec![1, 2]);
        assert_eq!(config.model.model_name, "LR");
        assert_eq!(config.model.latent_dim, 64);
        assert!((config.walk.p - 0.5).abs() < f32::EPSILON);
        assert_eq!(config.walk.num_walks, 10);
        assert_eq!(config.num_splits, vec![10]);
    }

    #[test]
    fn test_toml_round_trip() {
        let config = ExperimentConfig::default();
        let text = config.to_toml_string().expect("serializes");
        assert_eq!(ExperimentConfig::from_toml_str(&text).expect("parses"), config);
    }

    #[test]
    fn test_bad_toml_is_serialization_error() {
        let err = ExperimentConfig::from_toml_str("seeds = [").expect_err("invalid TOML");
        assert!(matches!(err, Node2VecError::Serialization(_)));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("experiment.toml");
        std::fs::write(&path, "dataset_name = \"toy\"\n").expect("write config");
        let config = ExperimentConfig::from_file(&path).expect("loads");
        assert_eq!(config.dataset_name, "toy");
        assert!(ExperimentConfig::from_file(dir.path().join("missing.toml")).is_err());
    }

    #[test]
    fn test_percentages_must_sum_to_one() {
        let mut config = ExperimentConfig::default();
        config.hyper_parameters.test_perc = 0.2;
        let err = config.validate().expect_err("sum is 1.05");
        assert!(err.to_string().contains("a sum of 1"));
    }

    #[test]
    fn test_percentage_out_of_range() {
        let mut config = ExperimentConfig::default();
        config.hyper_parameters.train_perc = 1.5;
        config.hyper_parameters.val_perc = -0.25;
        config.hyper_parameters.test_perc = -0.25;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_model_rejected_first() {
        let mut config = ExperimentConfig::default();
        config.model.model_name = "SVM".to_string();
        config.seeds.clear();
        let err = config.validate().expect_err("unknown model");
        assert_eq!(err.to_string(), "SVM not allowed.");
    }

    #[test]
    fn test_empty_lists_and_zero_counts_rejected() {
        let mut config = ExperimentConfig::default();
        config.num_splits = vec![3, 0];
        assert!(config.validate().is_err());

        let mut config = ExperimentConfig::default();
        config.model.latent_dim = 0;
        assert!(config.validate().is_err());

        let mut config = ExperimentConfig::default();
        config.walk.workers = 0;
        assert!(config.validate().is_err());

        let mut config = ExperimentConfig::default();
        config.skipgram.window = 0;
        assert!(config.validate().is_err());
    }
}
