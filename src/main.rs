//! aprender-node2vec CLI: embed a labelled graph with Node2Vec and evaluate
//! a classifier over repeated train/val/test splits.
//!
//! ```text
//! aprender-node2vec --config experiment.toml
//! aprender-node2vec --dataset cuba --seeds 0,1,2 --num-splits 10 --model LR
//! ```

use aprender_node2vec::config::ExperimentConfig;
use aprender_node2vec::experiment::{run_all, ExperimentReport, MetricSummary};
use clap::Parser;
use colored::Colorize;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "aprender-node2vec")]
#[command(about = "Node2Vec embeddings with repeated-split classifier evaluation")]
#[command(version)]
struct Cli {
    /// TOML configuration file; flags below override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Dataset directory name under data/raw
    #[arg(long)]
    dataset: Option<String>,

    /// Seeds, one tracking experiment each
    #[arg(long, value_delimiter = ',')]
    seeds: Option<Vec<u64>>,

    /// Split counts, one run each
    #[arg(long, value_delimiter = ',')]
    num_splits: Option<Vec<usize>>,

    /// Classifier: LR or RF
    #[arg(short, long)]
    model: Option<String>,

    /// Embedding dimensionality
    #[arg(long)]
    latent_dim: Option<usize>,

    /// Device: cpu, cuda, cuda:N or an ordinal
    #[arg(long)]
    device: Option<String>,

    /// Root of the data/ tree
    #[arg(long)]
    base_dir: Option<PathBuf>,

    /// Root of the run store
    #[arg(long)]
    tracking_dir: Option<PathBuf>,

    /// Walk generation threads
    #[arg(long)]
    workers: Option<usize>,

    /// Use few-shot training splits
    #[arg(long)]
    few_shot: bool,

    /// Regenerate cached splits
    #[arg(long)]
    overwrite_data: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn into_config(self) -> aprender_node2vec::Result<ExperimentConfig> {
        let mut config = match &self.config {
            Some(path) => ExperimentConfig::from_file(path)?,
            None => ExperimentConfig::default(),
        };
        if let Some(dataset) = self.dataset {
            config.dataset_name = dataset;
        }
        if let Some(seeds) = self.seeds {
            config.seeds = seeds;
        }
        if let Some(num_splits) = self.num_splits {
            config.num_splits = num_splits;
        }
        if let Some(model) = self.model {
            config.model.model_name = model;
        }
        if let Some(latent_dim) = self.latent_dim {
            config.model.latent_dim = latent_dim;
        }
        if let Some(device) = self.device {
            config.device_id = device;
        }
        if let Some(base_dir) = self.base_dir {
            config.base_dir = base_dir;
        }
        if let Some(tracking_dir) = self.tracking_dir {
            config.tracking_dir = tracking_dir;
        }
        if let Some(workers) = self.workers {
            config.walk.workers = workers;
        }
        config.is_few_shot |= self.few_shot;
        config.hyper_parameters.overwrite_data |= self.overwrite_data;
        Ok(config)
    }
}

fn print_summaries(tag: &str, summaries: &[MetricSummary]) {
    for s in summaries {
        println!("{} {}: {}+-{}", tag.cyan().bold(), s.name, s.mean, s.std);
    }
}

fn print_report(report: &ExperimentReport) {
    println!(
        "\n{}",
        format!(
            "=== seed {} / {} splits (run {}) ===",
            report.seed, report.num_splits, report.run_id
        )
        .bold()
    );
    print_summaries("[VAL]", &report.val);
    print_summaries("[TEST]", &report.test);
}

fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    let result = cli
        .into_config()
        .and_then(|config| run_all(&config, print_report));

    match result {
        Ok(reports) => {
            println!("\n{} {} run(s) finished", "[DONE]".green().bold(), reports.len());
        }
        Err(e) => {
            eprintln!("{} {e}", "[ERROR]".red().bold());
            std::process::exit(1);
        }
    }
}
