//! Experiment driver: embed once, evaluate every split, aggregate.
//!
//! One call to [`run_experiment`] covers a single `(seed, num_splits)`
//! combination inside an already started tracking run; [`run_all`] iterates
//! the configured combinations, one tracking experiment per seed and one
//! run per split count.

use crate::classification::create_model;
use crate::config::{ExperimentConfig, ModelHyperParameters};
use crate::data::{load_dataset, Split};
use crate::embed::embed_nodes;
use crate::env::setup_env;
use crate::error::{Node2VecError, Result};
use crate::metrics::{eval_pred, mean_std, MetricsLogger};
use crate::npy::write_npy;
use crate::primitives::Matrix;
use crate::tracking::{Run, RunStatus, Tracker};
use crate::traits::Classifier;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Tracking experiment name for `dataset` and `seed`.
#[must_use]
pub fn experiment_name(dataset: &str, seed: u64) -> String {
    format!("{dataset}-Node2Vec-{seed}")
}

/// Progress of an [`EvaluationLoop`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// No split evaluated yet
    NotStarted,
    /// Splits `0..k` are done, split `k` is next
    InProgress(usize),
    /// Every split is done
    Finished,
}

/// Fits and scores one classifier per split over a shared embedding matrix.
///
/// Split `k` trains a fresh classifier (seed `seed + k`) on the rows of its
/// train nodes, then runs two independent prediction passes over every node:
/// the first is scored on the val nodes, the second on the test nodes.
#[derive(Debug)]
pub struct EvaluationLoop<'a> {
    embeddings: &'a Matrix<f32>,
    labels: &'a [usize],
    splits: &'a [Split],
    model: &'a ModelHyperParameters,
    seed: u64,
    state: LoopState,
    val_logger: MetricsLogger,
    test_logger: MetricsLogger,
}

impl<'a> EvaluationLoop<'a> {
    /// Prepares the loop.
    ///
    /// # Errors
    ///
    /// Returns an error if the model identifier is unsupported, `splits` is
    /// empty, or `embeddings` and `labels` disagree on the node count.
    pub fn new(
        embeddings: &'a Matrix<f32>,
        labels: &'a [usize],
        splits: &'a [Split],
        model: &'a ModelHyperParameters,
        seed: u64,
    ) -> Result<Self> {
        model.kind()?;
        if splits.is_empty() {
            return Err(Node2VecError::EmptyInput(
                "evaluation needs at least one split".to_string(),
            ));
        }
        if embeddings.n_rows() != labels.len() {
            return Err(Node2VecError::dimension_mismatch(
                "embedding rows",
                labels.len(),
                embeddings.n_rows(),
            ));
        }
        Ok(Self {
            embeddings,
            labels,
            splits,
            model,
            seed,
            state: LoopState::NotStarted,
            val_logger: MetricsLogger::with_default_metrics(splits.len()),
            test_logger: MetricsLogger::with_default_metrics(splits.len()),
        })
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Validation metrics recorded so far.
    #[must_use]
    pub fn val_logger(&self) -> &MetricsLogger {
        &self.val_logger
    }

    /// Test metrics recorded so far.
    #[must_use]
    pub fn test_logger(&self) -> &MetricsLogger {
        &self.test_logger
    }

    /// Evaluates the next split and returns the new state.
    ///
    /// # Errors
    ///
    /// Returns `LoopFinished` once every split is done; otherwise propagates
    /// any fit, predict or metric error.
    pub fn step(&mut self) -> Result<LoopState> {
        let run_id = match self.state {
            LoopState::NotStarted => 0,
            LoopState::InProgress(k) => k,
            LoopState::Finished => return Err(Node2VecError::LoopFinished(self.splits.len())),
        };
        let num_splits = self.splits.len();
        let split = &self.splits[run_id];
        split.validate(run_id, self.labels.len())?;
        info!("Split {}/{}", run_id + 1, num_splits);

        let mut model = create_model(self.model, self.seed.wrapping_add(run_id as u64))?;
        let x_train = self.embeddings.select_rows(&split.train)?;
        let y_train: Vec<usize> = split.train.iter().map(|&i| self.labels[i]).collect();
        model.fit(&x_train, &y_train)?;

        let val_pred = model.predict(self.embeddings)?;
        let val_metrics = eval_pred(self.labels, &val_pred, &split.val)?;
        self.val_logger.update_all(run_id, &val_metrics)?;

        let test_pred = model.predict(self.embeddings)?;
        let test_metrics = eval_pred(self.labels, &test_pred, &split.test)?;
        self.test_logger.update_all(run_id, &test_metrics)?;

        self.state = if run_id + 1 == num_splits {
            LoopState::Finished
        } else {
            LoopState::InProgress(run_id + 1)
        };
        Ok(self.state)
    }

    /// Runs every remaining split and returns `(val, test)` loggers.
    ///
    /// # Errors
    ///
    /// Propagates the first error from [`step`](Self::step).
    pub fn run(mut self) -> Result<(MetricsLogger, MetricsLogger)> {
        while self.state != LoopState::Finished {
            self.step()?;
        }
        Ok((self.val_logger, self.test_logger))
    }
}

/// Mean/std of one metric plus where its raw values went.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSummary {
    /// Metric name
    pub name: String,
    /// Arithmetic mean over splits
    pub mean: f64,
    /// Population standard deviation over splits
    pub std: f64,
    /// Per-split values
    pub values: Vec<f64>,
    /// Tracked copy of the `.npy` file holding `values`
    pub artifact: PathBuf,
}

/// Summaries of one `(seed, num_splits)` run.
#[derive(Debug, Clone, PartialEq)]
pub struct ExperimentReport {
    /// Seed of the run
    pub seed: u64,
    /// Number of splits evaluated
    pub num_splits: usize,
    /// Tracking run id
    pub run_id: String,
    /// Scratch directory holding the `.npy` files
    pub interim_data_dir: PathBuf,
    /// Validation summaries, in [`crate::metrics::METRIC_NAMES`] order
    pub val: Vec<MetricSummary>,
    /// Test summaries, in [`crate::metrics::METRIC_NAMES`] order
    pub test: Vec<MetricSummary>,
}

/// Summarises `logger`, logging `<metric>_avg`/`<metric>_std` to `run` and
/// persisting each metric as `<file_prefix><metric>.npy` in `dir`.
///
/// # Errors
///
/// Returns an error if the logger is incomplete or an artifact cannot be
/// written or logged.
pub fn aggregate_and_log(
    logger: &MetricsLogger,
    file_prefix: &str,
    run: &mut Run,
    dir: &Path,
) -> Result<Vec<MetricSummary>> {
    logger
        .metric_names()
        .iter()
        .map(|name| {
            let values = logger.values(name)?;
            let (mean, std) = mean_std(&values);
            run.log_metric(&format!("{name}_avg"), mean)?;
            run.log_metric(&format!("{name}_std"), std)?;

            let path = dir.join(format!("{file_prefix}{name}.npy"));
            write_npy(&path, &values)?;
            let artifact = run.log_artifact(&path)?;
            Ok(MetricSummary {
                name: name.clone(),
                mean,
                std,
                values,
                artifact,
            })
        })
        .collect()
}

/// Runs one `(seed, num_splits)` combination inside `run`.
///
/// # Errors
///
/// Returns `UnsupportedModel` before touching any data if the classifier
/// identifier is unknown; otherwise propagates data, embedding, evaluation
/// and tracking errors.
pub fn run_experiment(
    config: &ExperimentConfig,
    seed: u64,
    num_splits: usize,
    run: &mut Run,
) -> Result<ExperimentReport> {
    config.model.kind()?;
    run.log_param("dataset_name", &config.dataset_name)?;

    let env = setup_env(config, seed, num_splits)?;
    run.log_param("seed", seed)?;
    run.log_param("num_splits", num_splits)?;
    run.log_param("model_name", &config.model.model_name)?;
    run.log_param("latent_dim", config.model.latent_dim)?;
    run.log_param("device", env.device)?;

    let dataset = load_dataset(config, &env, seed, num_splits)?;
    let embeddings = embed_nodes(
        &dataset.graph,
        config.model.latent_dim,
        config.walk,
        &config.skipgram,
        seed,
    )?;

    let (val_logger, test_logger) = EvaluationLoop::new(
        &embeddings,
        &dataset.labels,
        &dataset.splits,
        &config.model,
        seed,
    )?
    .run()?;

    let val = aggregate_and_log(&val_logger, "val_", run, &env.interim_data_dir)?;
    let test = aggregate_and_log(&test_logger, "", run, &env.interim_data_dir)?;
    for (tag, summaries) in [("VAL", &val), ("TEST", &test)] {
        for s in summaries {
            debug!("[{tag}] {}: {}+-{}", s.name, s.mean, s.std);
        }
    }

    Ok(ExperimentReport {
        seed,
        num_splits,
        run_id: run.id().to_string(),
        interim_data_dir: env.interim_data_dir,
        val,
        test,
    })
}

/// Removes the run's scratch directory, best effort.
///
/// Failures are logged with the path and system error and never
/// propagated. Returns whether the directory is gone.
pub fn cleanup_experiment_dir(dir: &Path) -> bool {
    match fs::remove_dir_all(dir) {
        Ok(()) => true,
        Err(e) if e.kind() == io::ErrorKind::NotFound => true,
        Err(e) => {
            warn!(path = %dir.display(), error = %e, "failed to remove experiment directory");
            false
        }
    }
}

/// Runs every configured `(seed, num_splits)` combination.
///
/// `on_report` sees each report as soon as its run finishes. A failing
/// combination marks its run `FAILED` and aborts the remaining ones.
/// Scratch directories are removed with [`cleanup_experiment_dir`].
///
/// # Errors
///
/// Returns the first configuration, tracking or experiment error.
pub fn run_all<F>(config: &ExperimentConfig, on_report: F) -> Result<Vec<ExperimentReport>>
where
    F: FnMut(&ExperimentReport),
{
    run_all_with_cleanup(config, on_report, cleanup_experiment_dir)
}

/// [`run_all`] with a custom scratch-directory cleanup.
///
/// `cleanup` runs after each successful run is marked finished. A failed
/// cleanup never changes the report or the run status.
///
/// # Errors
///
/// Returns the first configuration, tracking or experiment error.
pub fn run_all_with_cleanup<F, C>(
    config: &ExperimentConfig,
    mut on_report: F,
    mut cleanup: C,
) -> Result<Vec<ExperimentReport>>
where
    F: FnMut(&ExperimentReport),
    C: FnMut(&Path) -> bool,
{
    config.validate()?;
    let tracker = Tracker::new(&config.tracking_dir)?;
    let mut reports = Vec::with_capacity(config.seeds.len() * config.num_splits.len());

    for &seed in &config.seeds {
        let experiment = tracker.set_experiment(&experiment_name(&config.dataset_name, seed))?;
        for &num_splits in &config.num_splits {
            let mut run = experiment.start_run()?;
            match run_experiment(config, seed, num_splits, &mut run) {
                Ok(report) => {
                    run.finish(RunStatus::Finished)?;
                    let removed = cleanup(&report.interim_data_dir);
                    debug!(
                        removed,
                        path = %report.interim_data_dir.display(),
                        "experiment cleanup"
                    );
                    on_report(&report);
                    reports.push(report);
                }
                Err(err) => {
                    if let Err(finish_err) = run.finish(RunStatus::Failed) {
                        warn!(error = %finish_err, "could not mark run as failed");
                    }
                    return Err(err);
                }
            }
        }
    }
    Ok(reports)
}
