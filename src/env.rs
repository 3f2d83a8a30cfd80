//! Per-run environment: compute device and working directories.

use crate::config::ExperimentConfig;
use crate::error::{Node2VecError, Result};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{info, warn};

/// Compute device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Device {
    /// Host CPU
    Cpu,
    /// CUDA device by ordinal
    Cuda(u32),
}

impl Device {
    /// The device the pipeline actually runs on.
    ///
    /// Every stage runs on the CPU; a CUDA request is logged and mapped to
    /// [`Device::Cpu`].
    #[must_use]
    pub fn resolve(self) -> Self {
        if let Device::Cuda(ordinal) = self {
            warn!(ordinal, "CUDA requested but not supported, running on CPU");
        }
        Device::Cpu
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Cpu => f.write_str("cpu"),
            Device::Cuda(ordinal) => write!(f, "cuda:{ordinal}"),
        }
    }
}

impl FromStr for Device {
    type Err = Node2VecError;

    /// Accepts `""` or `cpu`, `cuda`, `cuda:N`, or a bare ordinal `N`.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let ordinal = |text: &str| {
            text.parse::<u32>().map_err(|_| Node2VecError::InvalidConfig {
                param: "device_id".to_string(),
                value: s.to_string(),
                constraint: "\"\", \"cpu\", \"cuda\", \"cuda:N\" or an ordinal".to_string(),
            })
        };
        match s {
            "" | "cpu" => Ok(Device::Cpu),
            "cuda" => Ok(Device::Cuda(0)),
            _ => match s.strip_prefix("cuda:") {
                Some(n) => ordinal(n).map(Device::Cuda),
                None => ordinal(s).map(Device::Cuda),
            },
        }
    }
}

/// Device and directories for one `(seed, num_splits)` run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment {
    /// Device the run executes on
    pub device: Device,
    /// Root of the `data/` tree
    pub base_dir: PathBuf,
    /// Scratch directory removed after the run
    pub interim_data_dir: PathBuf,
    /// Directory holding the cached splits
    pub data_dir: PathBuf,
}

impl Environment {
    /// Raw input directory of `dataset`.
    #[must_use]
    pub fn raw_dir(&self, dataset: &str) -> PathBuf {
        raw_dir(&self.base_dir, dataset)
    }
}

/// `<base_dir>/data/raw/<dataset>`.
#[must_use]
pub fn raw_dir(base_dir: &Path, dataset: &str) -> PathBuf {
    base_dir.join("data").join("raw").join(dataset)
}

/// Directory name encoding everything that determines the splits.
#[must_use]
pub fn split_signature(config: &ExperimentConfig, seed: u64, num_splits: usize) -> String {
    let hp = &config.hyper_parameters;
    let mode = if config.is_few_shot {
        format!("fewshot{}", hp.few_shot_per_class)
    } else {
        "standard".to_string()
    };
    let traces = if hp.traces_list.is_empty() {
        "all".to_string()
    } else {
        hp.traces_list.join("+")
    };
    format!(
        "seed{seed}_splits{num_splits}_{mode}_{}_{}_{}_{traces}",
        hp.train_perc, hp.val_perc, hp.test_perc
    )
}

/// Resolves the device and creates the run's directories.
///
/// # Errors
///
/// Returns an error if `device_id` does not parse or a directory cannot be
/// created.
pub fn setup_env(config: &ExperimentConfig, seed: u64, num_splits: usize) -> Result<Environment> {
    let device = config.device_id.parse::<Device>()?.resolve();
    let base_dir = config.base_dir.clone();
    let signature = split_signature(config, seed, num_splits);

    let data_dir = base_dir
        .join("data")
        .join("processed")
        .join(&config.dataset_name)
        .join(&signature);
    let interim_data_dir = base_dir
        .join("data")
        .join("interim")
        .join(&config.dataset_name)
        .join(format!(
            "Node2Vec_{}_dim{}_{signature}",
            config.model.model_name, config.model.latent_dim
        ));

    for dir in [&data_dir, &interim_data_dir] {
        fs::create_dir_all(dir).map_err(|e| Node2VecError::path_io(dir, e))?;
    }
    info!(
        %device,
        data_dir = %data_dir.display(),
        interim_data_dir = %interim_data_dir.display(),
        "environment ready"
    );
    Ok(Environment {
        device,
        base_dir,
        interim_data_dir,
        data_dir,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_parse() {
        assert_eq!("".parse::<Device>().ok(), Some(Device::Cpu));
        assert_eq!("cpu".parse::<Device>().ok(), Some(Device::Cpu));
        assert_eq!("1".parse::<Device>().ok(), Some(Device::Cuda(1)));
        assert_eq!("cuda:2".parse::<Device>().ok(), Some(Device::Cuda(2)));
        assert_eq!("cuda".parse::<Device>().ok(), Some(Device::Cuda(0)));
        assert!("tpu".parse::<Device>().is_err());
    }

    #[test]
    fn test_cuda_falls_back_to_cpu() {
        assert_eq!(Device::Cuda(0).resolve(), Device::Cpu);
        assert_eq!(Device::Cuda(3).to_string(), "cuda:3");
    }

    #[test]
    fn test_setup_env_creates_dirs() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = ExperimentConfig {
            base_dir: dir.path().to_path_buf(),
            device_id: "0".to_string(),
            ..Default::default()
        };
        let env = setup_env(&config, 3, 5).expect("environment");
        assert_eq!(env.device, Device::Cpu);
        assert!(env.data_dir.is_dir());
        assert!(env.interim_data_dir.is_dir());
        assert!(env.data_dir.starts_with(dir.path().join("data/processed/cuba")));
        assert_eq!(env.raw_dir("cuba"), dir.path().join("data/raw/cuba"));
    }

    #[test]
    fn test_split_signature_distinguishes_runs() {
        let config = ExperimentConfig::default();
        let few_shot = ExperimentConfig {
            is_few_shot: true,
            ..Default::default()
        };
        assert_ne!(split_signature(&config, 0, 10), split_signature(&config, 1, 10));
        assert_ne!(split_signature(&config, 0, 10), split_signature(&config, 0, 5));
        assert_ne!(
            split_signature(&config, 0, 10),
            split_signature(&few_shot, 0, 10)
        );
    }
}
