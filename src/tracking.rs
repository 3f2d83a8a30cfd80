//! Local, file-based experiment tracking.
//!
//! Layout under the tracking root:
//! ```text
//! <root>/<experiment>/meta.json
//! <root>/<experiment>/<run_id>/meta.json      run id, status, start/end time
//! <root>/<experiment>/<run_id>/params.json    key -> value
//! <root>/<experiment>/<run_id>/metrics.json   key -> [{value, step, timestamp}]
//! <root>/<experiment>/<run_id>/artifacts/     copied files
//! ```
//! Every logging call rewrites the affected JSON file before returning.

use crate::error::{Node2VecError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use uuid::Uuid;

/// Lifecycle state of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    /// Started, not yet ended
    Running,
    /// Completed successfully
    Finished,
    /// Ended by an error
    Failed,
}

/// Experiment metadata stored in `<experiment>/meta.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentMeta {
    /// Experiment name
    pub name: String,
    /// When the experiment directory was first created
    pub created_at: DateTime<Utc>,
}

/// Run metadata stored in `<run_id>/meta.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMeta {
    /// UUID v4 of the run
    pub run_id: String,
    /// Owning experiment
    pub experiment: String,
    /// Current status
    pub status: RunStatus,
    /// Start time
    pub start_time: DateTime<Utc>,
    /// End time, set by [`Run::finish`]
    pub end_time: Option<DateTime<Utc>>,
}

/// One recorded value of a metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricEntry {
    /// Logged value
    pub value: f64,
    /// Position in this metric's history
    pub step: u64,
    /// When it was logged
    pub timestamp: DateTime<Utc>,
}

/// Metric histories keyed by metric name.
pub type MetricHistory = BTreeMap<String, Vec<MetricEntry>>;

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).map_err(|e| Node2VecError::path_io(path, e))
}

/// Reads a JSON document written by the tracker.
///
/// # Errors
///
/// Returns an error if the file is missing or does not parse as `T`.
pub fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let text = fs::read_to_string(path).map_err(|e| Node2VecError::path_io(path, e))?;
    Ok(serde_json::from_str(&text)?)
}

fn create_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|e| Node2VecError::path_io(path, e))
}

/// Root of the run store.
#[derive(Debug, Clone)]
pub struct Tracker {
    root: PathBuf,
}

impl Tracker {
    /// Opens (creating if needed) a run store at `root`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        create_dir(&root)?;
        Ok(Self { root })
    }

    /// Store root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Selects an experiment by name, creating it on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is empty or contains a path separator,
    /// or the experiment directory cannot be written.
    pub fn set_experiment(&self, name: &str) -> Result<Experiment> {
        if name.is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
            return Err(Node2VecError::Tracking(format!(
                "invalid experiment name '{name}'"
            )));
        }
        let dir = self.root.join(name);
        let meta_path = dir.join("meta.json");
        if !meta_path.exists() {
            create_dir(&dir)?;
            write_json(
                &meta_path,
                &ExperimentMeta {
                    name: name.to_string(),
                    created_at: Utc::now(),
                },
            )?;
            info!(experiment = name, "created tracking experiment");
        }
        Ok(Experiment {
            name: name.to_string(),
            dir,
        })
    }
}

/// A named group of runs.
#[derive(Debug, Clone)]
pub struct Experiment {
    name: String,
    dir: PathBuf,
}

impl Experiment {
    /// Experiment name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Experiment directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Starts a new run with a fresh UUID v4.
    ///
    /// # Errors
    ///
    /// Returns an error if the run directory or its files cannot be
    /// written.
    pub fn start_run(&self) -> Result<Run> {
        let id = Uuid::new_v4();
        let dir = self.dir.join(id.to_string());
        create_dir(&dir.join("artifacts"))?;

        let run = Run {
            meta: RunMeta {
                run_id: id.to_string(),
                experiment: self.name.clone(),
                status: RunStatus::Running,
                start_time: Utc::now(),
                end_time: None,
            },
            dir,
            params: BTreeMap::new(),
            metrics: MetricHistory::new(),
        };
        run.flush_meta()?;
        run.flush_params()?;
        run.flush_metrics()?;
        info!(experiment = %self.name, run_id = %run.meta.run_id, "started run");
        Ok(run)
    }

    /// Metadata of every run in this experiment, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the experiment directory cannot be listed or a
    /// run's `meta.json` is unreadable.
    pub fn runs(&self) -> Result<Vec<RunMeta>> {
        let entries = fs::read_dir(&self.dir).map_err(|e| Node2VecError::path_io(&self.dir, e))?;
        let mut runs = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| Node2VecError::path_io(&self.dir, e))?.path();
            let meta_path = path.join("meta.json");
            if path.is_dir() && meta_path.exists() {
                runs.push(read_json::<RunMeta>(&meta_path)?);
            }
        }
        runs.sort_by(|a, b| a.start_time.cmp(&b.start_time));
        Ok(runs)
    }
}

/// An active tracked run.
#[derive(Debug)]
pub struct Run {
    meta: RunMeta,
    dir: PathBuf,
    params: BTreeMap<String, String>,
    metrics: MetricHistory,
}

impl Run {
    /// Run id (UUID v4).
    #[must_use]
    pub fn id(&self) -> &str {
        &self.meta.run_id
    }

    /// Run directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Current metadata.
    #[must_use]
    pub fn meta(&self) -> &RunMeta {
        &self.meta
    }

    /// Logged params.
    #[must_use]
    pub fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }

    /// Logged metric histories.
    #[must_use]
    pub fn metrics(&self) -> &MetricHistory {
        &self.metrics
    }

    /// Records a param, replacing any earlier value for `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if `params.json` cannot be written.
    pub fn log_param(&mut self, key: &str, value: impl Display) -> Result<()> {
        self.params.insert(key.to_string(), value.to_string());
        self.flush_params()
    }

    /// Appends a value to the history of `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if `metrics.json` cannot be written.
    pub fn log_metric(&mut self, key: &str, value: f64) -> Result<()> {
        let history = self.metrics.entry(key.to_string()).or_default();
        history.push(MetricEntry {
            value,
            step: history.len() as u64,
            timestamp: Utc::now(),
        });
        debug!(key, value, "logged metric");
        self.flush_metrics()
    }

    /// Latest value logged under `key`.
    #[must_use]
    pub fn latest_metric(&self, key: &str) -> Option<f64> {
        self.metrics.get(key)?.last().map(|e| e.value)
    }

    /// Copies a file into the run's `artifacts/` directory.
    ///
    /// Returns the path of the copy.
    ///
    /// # Errors
    ///
    /// Returns an error if `path` has no file name or cannot be copied.
    pub fn log_artifact<P: AsRef<Path>>(&self, path: P) -> Result<PathBuf> {
        let path = path.as_ref();
        let name = path.file_name().ok_or_else(|| {
            Node2VecError::Tracking(format!("artifact path {} has no file name", path.display()))
        })?;
        let target = self.dir.join("artifacts").join(name);
        fs::copy(path, &target).map_err(|e| Node2VecError::path_io(path, e))?;
        debug!(artifact = %target.display(), "logged artifact");
        Ok(target)
    }

    /// Ends the run with `status` and records the end time.
    ///
    /// # Errors
    ///
    /// Returns an error if `meta.json` cannot be written.
    pub fn finish(mut self, status: RunStatus) -> Result<RunMeta> {
        self.meta.status = status;
        self.meta.end_time = Some(Utc::now());
        self.flush_meta()?;
        info!(run_id = %self.meta.run_id, ?status, "ended run");
        Ok(self.meta)
    }

    fn flush_meta(&self) -> Result<()> {
        write_json(&self.dir.join("meta.json"), &self.meta)
    }

    fn flush_params(&self) -> Result<()> {
        write_json(&self.dir.join("params.json"), &self.params)
    }

    fn flush_metrics(&self) -> Result<()> {
        write_json(&self.dir.join("metrics.json"), &self.metrics)
    }
}
