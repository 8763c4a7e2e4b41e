//! Pipeline run report
//!
//! A [`PipelineReport`] records what one pipeline run did: the data it used,
//! the split parameters and the evaluation summary of every model. It can be
//! written to and read back from pretty-printed JSON.

use crate::classifiers::ModelRegistry;
use crate::core::{Result, VoteError};
use crate::evaluation::EvaluationSummary;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Metadata for tracking where a report came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Library version that produced the report
    pub library_version: String,
    /// RFC 3339 creation timestamp
    pub created_at: String,
    /// Classifier hyperparameters used
    pub parameters: ModelRegistry,
}

/// Outcome of one pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineReport {
    pub dataset: String,
    pub total_instances: usize,
    pub train_instances: usize,
    pub test_instances: usize,
    pub train_proportion: f64,
    pub seed: u64,
    /// Individual classifiers in registry order, then the voting ensemble
    pub results: Vec<EvaluationSummary>,
    pub metadata: ReportMetadata,
}

impl PipelineReport {
    pub(crate) fn new(
        dataset: &str,
        train_instances: usize,
        test_instances: usize,
        train_proportion: f64,
        seed: u64,
        parameters: ModelRegistry,
    ) -> Self {
        Self {
            dataset: dataset.to_string(),
            total_instances: train_instances + test_instances,
            train_instances,
            test_instances,
            train_proportion,
            seed,
            results: Vec::new(),
            metadata: ReportMetadata {
                library_version: env!("CARGO_PKG_VERSION").to_string(),
                created_at: chrono::Utc::now().to_rfc3339(),
                parameters,
            },
        }
    }

    /// Summary of the named model, if it was evaluated
    pub fn result(&self, model: &str) -> Option<&EvaluationSummary> {
        self.results.iter().find(|r| r.model == model)
    }

    /// Model with the highest accuracy; the earliest wins ties
    pub fn best(&self) -> Option<&EvaluationSummary> {
        self.results.iter().fold(None, |best, r| match best {
            Some(b) if b.accuracy() >= r.accuracy() => Some(b),
            _ => Some(r),
        })
    }

    /// Save report to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path).map_err(VoteError::IoError)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)
            .map_err(|e| VoteError::SerializationError(e.to_string()))?;
        Ok(())
    }

    /// Load report from file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path).map_err(VoteError::IoError)?;
        let reader = BufReader::new(file);
        let report = serde_json::from_reader(reader)
            .map_err(|e| VoteError::SerializationError(e.to_string()))?;
        Ok(report)
    }

    /// One line per model: name and accuracy
    pub fn summary_table(&self) -> String {
        let mut out = format!(
            "=== {} ({} train / {} test, seed {}) ===\n",
            self.dataset, self.train_instances, self.test_instances, self.seed
        );
        for r in &self.results {
            out.push_str(&format!(
                "{:<24}{:>10.4} %  kappa {:.4}\n",
                r.model,
                r.pct_correct(),
                r.kappa
            ));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn summary(model: &str, correct: f64, incorrect: f64) -> EvaluationSummary {
        EvaluationSummary {
            model: model.to_string(),
            class_labels: vec!["no".into(), "yes".into()],
            correct,
            incorrect,
            unclassified: 0.0,
            total_instances: correct + incorrect,
            kappa: 0.0,
            mean_absolute_error: 0.0,
            root_mean_squared_error: 0.0,
            relative_absolute_error: 0.0,
            root_relative_squared_error: 0.0,
            confusion_matrix: vec![vec![correct, incorrect], vec![0.0, 0.0]],
            class_metrics: Vec::new(),
        }
    }

    fn report() -> PipelineReport {
        let mut report = PipelineReport::new("bank", 8, 2, 0.8, 42, ModelRegistry::default());
        report.results.push(summary("NaiveBayes", 1.0, 1.0));
        report.results.push(summary("DecisionTree", 2.0, 0.0));
        report.results.push(summary("Vote", 2.0, 0.0));
        report
    }

    #[test]
    fn test_report_round_trip() -> Result<()> {
        let report = report();
        let temp_file = NamedTempFile::new().expect("Failed to create temp file");
        report.save_to_file(temp_file.path())?;

        let loaded = PipelineReport::load_from_file(temp_file.path())?;
        assert_eq!(loaded.dataset, "bank");
        assert_eq!(loaded.seed, 42);
        assert_eq!(loaded.results.len(), 3);
        assert_eq!(loaded.results[1].model, "DecisionTree");
        assert_eq!(loaded.metadata.parameters.knn.k, 3);
        assert_eq!(loaded.metadata.created_at, report.metadata.created_at);
        assert_eq!(loaded.metadata.library_version, env!("CARGO_PKG_VERSION"));
        assert!(chrono::DateTime::parse_from_rfc3339(&loaded.metadata.created_at).is_ok());
        Ok(())
    }

    #[test]
    fn test_best_and_lookup() {
        let report = report();
        assert_eq!(report.total_instances, 10);
        assert_eq!(report.best().map(|r| r.model.as_str()), Some("DecisionTree"));
        assert!(report.result("Vote").is_some());
        assert!(report.result("Missing").is_none());
        assert!(report.summary_table().contains("NaiveBayes"));
    }

    #[test]
    fn test_load_invalid_json() {
        let mut temp_file = NamedTempFile::new().expect("Failed to create temp file");
        writeln!(temp_file, "not json").expect("Failed to write");
        assert!(matches!(
            PipelineReport::load_from_file(temp_file.path()),
            Err(VoteError::SerializationError(_))
        ));
    }
}
