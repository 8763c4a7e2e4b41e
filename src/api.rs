//! High-level API for training, evaluating and comparing classifiers
//!
//! This module provides the trainer and evaluator helpers and the
//! [`Pipeline`] that runs the whole comparison: load, split, train and
//! evaluate every registered classifier, then the voting ensemble.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use rvote::api::Pipeline;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let report = Pipeline::new()
//!     .with_full_dataset(false)
//!     .with_seed(7)
//!     .run()?;
//!
//! if let Some(best) = report.best() {
//!     println!("Best model: {} ({:.2}%)", best.model, best.pct_correct());
//! }
//! # Ok(())
//! # }
//! ```

use crate::classifiers::{Model, ModelRegistry};
use crate::core::{Classifier, Dataset, Result};
use crate::data::{
    train_test_split, DataLoader, DEFAULT_SEED, DEFAULT_TRAIN_PROPORTION,
};
use crate::evaluation::{Evaluation, EvaluationSummary};
use crate::report::PipelineReport;
use crate::utils::validation::check_label_balance;
use log::info;
use serde::{Deserialize, Serialize};
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Instant;

/// Separator printed after each individual classifier
const SEPARATOR: &str = "-------------------------------------";

/// Fit `model` on `data` and hand it back for chaining
pub fn train_model<C: Classifier>(mut model: C, data: &Dataset) -> Result<C> {
    let start = Instant::now();
    model.fit(data)?;
    info!(
        "{} trained on {} instances in {:.2?}",
        model.name(),
        data.len(),
        start.elapsed()
    );
    Ok(model)
}

/// Score a fitted model on `test`, using `train` for the class labels and
/// priors only
pub fn evaluate_model<C: Classifier + ?Sized>(
    model: &C,
    train: &Dataset,
    test: &Dataset,
) -> Result<EvaluationSummary> {
    Evaluation::new(train)?.evaluate(model, test)
}

/// Settings of one pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Directory containing `bank.csv` and `bank-full.csv`, the bundled
    /// copies when unset
    pub data_dir: Option<PathBuf>,
    /// Use `bank-full.csv` rather than the sample
    pub full_dataset: bool,
    pub train_proportion: f64,
    pub seed: u64,
    /// Also print the confusion matrix and per-class statistics
    pub detailed: bool,
    pub registry: ModelRegistry,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            full_dataset: true,
            train_proportion: DEFAULT_TRAIN_PROPORTION,
            seed: DEFAULT_SEED,
            detailed: false,
            registry: ModelRegistry::default(),
        }
    }
}

/// Load, split, then train and evaluate every classifier and the ensemble
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Pipeline with the default settings: full dataset, 80/20 split, seed 42
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.config.data_dir = Some(data_dir.into());
        self
    }

    pub fn with_full_dataset(mut self, full: bool) -> Self {
        self.config.full_dataset = full;
        self
    }

    pub fn with_train_proportion(mut self, train_proportion: f64) -> Self {
        self.config.train_proportion = train_proportion;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    pub fn with_detailed(mut self, detailed: bool) -> Self {
        self.config.detailed = detailed;
        self
    }

    pub fn with_registry(mut self, registry: ModelRegistry) -> Self {
        self.config.registry = registry;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run and print progress and summaries to standard output
    pub fn run(&self) -> Result<PipelineReport> {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        self.run_with_writer(&mut out)
    }

    /// Run and print progress and summaries to `out`
    pub fn run_with_writer<W: Write>(&self, out: &mut W) -> Result<PipelineReport> {
        writeln!(out, "Loading data.")?;
        let loader = match &self.config.data_dir {
            Some(dir) => DataLoader::new(dir),
            None => DataLoader::bundled(),
        };
        let data = loader.load(self.config.full_dataset)?;
        let dataset = data.relation().to_string();
        let (majority, minority, ratio) = check_label_balance(&data);
        info!(
            "Class balance of {dataset}: majority {majority}, minority {minority} (ratio {ratio:.2})"
        );

        writeln!(out, "Splitting data.")?;
        let (train, test) =
            train_test_split(data, self.config.train_proportion, self.config.seed)?;
        info!(
            "Split {dataset}: {} train / {} test instances",
            train.len(),
            test.len()
        );

        let mut report = PipelineReport::new(
            &dataset,
            train.len(),
            test.len(),
            self.config.train_proportion,
            self.config.seed,
            self.config.registry,
        );

        for model in self.config.registry.classifiers() {
            let name = model.name().to_string();
            writeln!(out, "Training: {name}")?;
            let model = train_model(model, &train)?;
            writeln!(out, "Evaluating: {name}")?;
            let summary = evaluate_model(&model, &train, &test)?;
            self.print_summary(out, &summary)?;
            writeln!(out, "{SEPARATOR}")?;
            report.results.push(summary);
        }

        writeln!(out, "Training voting classifier.")?;
        let vote = Model::Voting(self.config.registry.voting_classifier());
        let vote = train_model(vote, &train)?;

        writeln!(out, "Evaluating model.")?;
        let summary = evaluate_model(&vote, &train, &test)?;
        self.print_summary(out, &summary)?;
        report.results.push(summary);

        Ok(report)
    }

    fn print_summary<W: Write>(&self, out: &mut W, summary: &EvaluationSummary) -> Result<()> {
        writeln!(out, "{summary}")?;
        if self.config.detailed {
            writeln!(out)?;
            writeln!(out, "{}", summary.class_details_string())?;
            writeln!(out, "{}", summary.matrix_string())?;
        }
        writeln!(out)?;
        Ok(())
    }
}
