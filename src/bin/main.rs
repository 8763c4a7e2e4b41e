//! RVOTE Command Line Interface
//!
//! Runs the classifier comparison: load the bank marketing data, split it,
//! evaluate each classifier and then their majority-vote ensemble.

use clap::{Args, Parser};
use env_logger::Env;
use log::{error, info};
use rvote::api::{Pipeline, PipelineConfig};
use rvote::classifiers::ModelRegistry;
use rvote::core::Result;
use rvote::data::{DEFAULT_SEED, DEFAULT_TRAIN_PROPORTION};
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "rvote")]
#[command(about = "Compare classifiers and their majority-vote ensemble on tabular data")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = "RVOTE Contributors")]
struct Cli {
    /// Read bank.csv and bank-full.csv from this directory instead of the
    /// bundled copies
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Use the reduced sample (bank.csv) instead of the full dataset
    #[arg(long)]
    sample: bool,

    /// Share of instances used for training, strictly between 0 and 1
    #[arg(long, default_value_t = DEFAULT_TRAIN_PROPORTION)]
    train_proportion: f64,

    /// Seed of the shuffle before splitting
    #[arg(long, default_value_t = DEFAULT_SEED)]
    seed: u64,

    /// Print per-class statistics and confusion matrices
    #[arg(long)]
    detailed: bool,

    /// Write a JSON report of the run to this file
    #[arg(long)]
    report: Option<PathBuf>,

    #[command(flatten)]
    models: ModelArgs,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,
}

#[derive(Args)]
struct ModelArgs {
    /// AdaBoost rounds
    #[arg(long, default_value = "10")]
    boost_iterations: usize,

    /// Ridge penalty of the logistic regression
    #[arg(long, default_value = "1e-8")]
    ridge: f64,

    /// Neighbours consulted by k-nearest-neighbours
    #[arg(short = 'k', long, default_value = "3")]
    neighbours: usize,

    /// Prune the decision tree
    #[arg(long)]
    pruned: bool,

    /// Minimum instances per decision tree leaf
    #[arg(long, default_value = "2")]
    min_objects: usize,

    /// Confidence factor used when pruning
    #[arg(long, default_value = "0.25")]
    confidence_factor: f64,
}

impl From<ModelArgs> for ModelRegistry {
    fn from(args: ModelArgs) -> Self {
        let mut registry = ModelRegistry::default();
        registry.adaboost.iterations = args.boost_iterations;
        registry.logistic.ridge = args.ridge;
        registry.knn.k = args.neighbours;
        registry.decision_tree.unpruned = !args.pruned;
        registry.decision_tree.min_objects_per_leaf = args.min_objects;
        registry.decision_tree.confidence_factor = args.confidence_factor;
        registry
    }
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.debug {
        "debug"
    } else if cli.verbose {
        "info"
    } else {
        "warn"
    };

    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    if let Err(e) = run(cli) {
        error!("Error: {e}");
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = PipelineConfig {
        data_dir: cli.data_dir,
        full_dataset: !cli.sample,
        train_proportion: cli.train_proportion,
        seed: cli.seed,
        detailed: cli.detailed,
        registry: cli.models.into(),
    };
    info!(
        "Running pipeline on {} ({}), proportion {}, seed {}",
        config
            .data_dir
            .as_ref()
            .map_or_else(|| "bundled data".to_string(), |dir| dir.display().to_string()),
        if config.full_dataset { "full" } else { "sample" },
        config.train_proportion,
        config.seed
    );

    let report = Pipeline::with_config(config).run()?;
    info!("Summary:\n{}", report.summary_table());

    if let Some(path) = cli.report {
        report.save_to_file(&path)?;
        info!("Report saved to: {path:?}");
    }

    Ok(())
}
