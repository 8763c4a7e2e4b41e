//! Hold-out evaluation of fitted classifiers
//!
//! [`Evaluation`] takes the class domain and Laplace-smoothed class priors
//! from the training set, scores a fitted model on a test set and collects
//! accuracy, error and agreement statistics into an [`EvaluationSummary`].
//!
//! ```rust,no_run
//! use rvote::classifiers::NaiveBayes;
//! use rvote::data::{train_test_split, DataLoader};
//! use rvote::evaluation::Evaluation;
//! use rvote::Classifier;
//!
//! # fn main() -> rvote::Result<()> {
//! let data = DataLoader::default().load(false)?;
//! let (train, test) = train_test_split(data, 0.8, 42)?;
//!
//! let mut model = NaiveBayes::new();
//! model.fit(&train)?;
//!
//! let summary = Evaluation::new(&train)?.evaluate(&model, &test)?;
//! println!("{summary}");
//! # Ok(())
//! # }
//! ```

use crate::core::{Classifier, Dataset, Result, VoteError};
use crate::utils::max_index;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Title of the summary block
pub const SUMMARY_TITLE: &str = "Results";

/// Precision, recall and F-measure of one class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub label: String,
    pub true_positive_rate: f64,
    pub false_positive_rate: f64,
    pub precision: f64,
    pub recall: f64,
    pub f_measure: f64,
}

/// Statistics of one model on one test set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationSummary {
    pub model: String,
    pub class_labels: Vec<String>,
    pub correct: f64,
    pub incorrect: f64,
    pub unclassified: f64,
    pub total_instances: f64,
    pub kappa: f64,
    pub mean_absolute_error: f64,
    pub root_mean_squared_error: f64,
    pub relative_absolute_error: f64,
    pub root_relative_squared_error: f64,
    /// `confusion_matrix[actual][predicted]`, weighted counts
    pub confusion_matrix: Vec<Vec<f64>>,
    pub class_metrics: Vec<ClassMetrics>,
}

impl EvaluationSummary {
    fn classified(&self) -> f64 {
        self.correct + self.incorrect
    }

    /// Accuracy in percent of the test weight
    pub fn pct_correct(&self) -> f64 {
        percentage(self.correct, self.total_instances)
    }

    pub fn pct_incorrect(&self) -> f64 {
        percentage(self.incorrect, self.total_instances)
    }

    pub fn pct_unclassified(&self) -> f64 {
        percentage(self.unclassified, self.total_instances)
    }

    /// Accuracy as a fraction of the classified weight
    pub fn accuracy(&self) -> f64 {
        if self.classified() > 0.0 {
            self.correct / self.classified()
        } else {
            0.0
        }
    }

    /// Class-weighted mean of the per-class F-measures
    pub fn weighted_f_measure(&self) -> f64 {
        let weights: Vec<f64> = self.confusion_matrix.iter().map(|row| row.iter().sum()).collect();
        let total: f64 = weights.iter().sum();
        if total <= 0.0 {
            return 0.0;
        }
        self.class_metrics
            .iter()
            .zip(&weights)
            .map(|(m, w)| m.f_measure * w)
            .sum::<f64>()
            / total
    }

    /// Confusion matrix with a letter legend per class
    pub fn matrix_string(&self) -> String {
        let width = self
            .confusion_matrix
            .iter()
            .flatten()
            .map(|v| format!("{v:.0}").len())
            .chain(std::iter::once(self.class_labels.len().to_string().len()))
            .max()
            .unwrap_or(1)
            + 1;

        let mut out = String::from("=== Confusion Matrix ===\n\n");
        for i in 0..self.class_labels.len() {
            out.push_str(&format!(" {:>width$}", class_letter(i)));
        }
        out.push_str("   <-- classified as\n");

        for (i, row) in self.confusion_matrix.iter().enumerate() {
            for value in row {
                out.push_str(&format!(" {:>width$.0}", value));
            }
            out.push_str(&format!(" | {} = {}\n", class_letter(i), self.class_labels[i]));
        }
        out
    }

    /// Per-class precision, recall and F-measure table
    pub fn class_details_string(&self) -> String {
        let mut out = String::from("=== Detailed Accuracy By Class ===\n\n");
        out.push_str(&format!(
            "{:>10} {:>10} {:>10} {:>10} {:>10}   Class\n",
            "TP Rate", "FP Rate", "Precision", "Recall", "F-Measure"
        ));
        for m in &self.class_metrics {
            out.push_str(&format!(
                "{:>10.3} {:>10.3} {:>10.3} {:>10.3} {:>10.3}   {}\n",
                m.true_positive_rate,
                m.false_positive_rate,
                m.precision,
                m.recall,
                m.f_measure,
                m.label
            ));
        }
        out.push_str(&format!(
            "{:>54.3}   Weighted Avg.\n",
            self.weighted_f_measure()
        ));
        out
    }
}

impl fmt::Display for EvaluationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{SUMMARY_TITLE}")?;
        writeln!(f, "{}", "=".repeat(SUMMARY_TITLE.len()))?;
        writeln!(f)?;
        writeln!(
            f,
            "{:<36}{:>10}{:>17.4} %",
            "Correctly Classified Instances",
            count(self.correct),
            self.pct_correct()
        )?;
        writeln!(
            f,
            "{:<36}{:>10}{:>17.4} %",
            "Incorrectly Classified Instances",
            count(self.incorrect),
            self.pct_incorrect()
        )?;
        if self.unclassified > 0.0 {
            writeln!(
                f,
                "{:<36}{:>10}{:>17.4} %",
                "UnClassified Instances",
                count(self.unclassified),
                self.pct_unclassified()
            )?;
        }
        writeln!(f, "{:<36}{:>15.4}", "Kappa statistic", self.kappa)?;
        writeln!(f, "{:<36}{:>15.4}", "Mean absolute error", self.mean_absolute_error)?;
        writeln!(f, "{:<36}{:>15.4}", "Root mean squared error", self.root_mean_squared_error)?;
        writeln!(
            f,
            "{:<36}{:>15.4} %",
            "Relative absolute error", self.relative_absolute_error
        )?;
        writeln!(
            f,
            "{:<36}{:>15.4} %",
            "Root relative squared error", self.root_relative_squared_error
        )?;
        write!(
            f,
            "{:<36}{:>10}",
            "Total Number of Instances",
            count(self.total_instances)
        )
    }
}

fn percentage(part: f64, total: f64) -> f64 {
    if total > 0.0 {
        100.0 * part / total
    } else {
        0.0
    }
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

/// Integral weights print without decimals
fn count(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.4}")
    }
}

/// `a`..`z`, then `a1`, `b1`, ...
fn class_letter(index: usize) -> String {
    let letter = (b'a' + (index % 26) as u8) as char;
    match index / 26 {
        0 => letter.to_string(),
        n => format!("{letter}{n}"),
    }
}

/// Scores fitted classifiers against a test set
#[derive(Debug, Clone)]
pub struct Evaluation {
    header: Dataset,
    priors: Vec<f64>,
}

impl Evaluation {
    /// Capture class labels and Laplace-smoothed class priors of `train`
    pub fn new(train: &Dataset) -> Result<Self> {
        let class_attribute = train.class_attribute().ok_or_else(|| {
            VoteError::EvaluationError("training set has no class attribute".to_string())
        })?;
        if !class_attribute.is_nominal() {
            return Err(VoteError::EvaluationError(format!(
                "class attribute '{}' is not nominal",
                class_attribute.name
            )));
        }

        let mut priors: Vec<f64> = train.class_weights().iter().map(|w| w + 1.0).collect();
        let total: f64 = priors.iter().sum();
        for p in priors.iter_mut() {
            *p /= total;
        }

        Ok(Self {
            header: train.header(),
            priors,
        })
    }

    /// Class prior probabilities used as the error baseline
    pub fn priors(&self) -> &[f64] {
        &self.priors
    }

    /// Predict every labelled instance of `test` and summarise the results.
    ///
    /// Neither the model nor the test set is modified.
    pub fn evaluate<C: Classifier + ?Sized>(
        &self,
        model: &C,
        test: &Dataset,
    ) -> Result<EvaluationSummary> {
        self.header
            .check_compatible(test)
            .map_err(|e| VoteError::EvaluationError(format!("test set: {e}")))?;
        let model_header = model.header().ok_or(VoteError::ModelNotTrained)?;
        self.header
            .check_compatible(model_header)
            .map_err(|e| VoteError::EvaluationError(format!("{}: {e}", model.name())))?;
        if test.is_empty() {
            return Err(VoteError::EmptyDataset);
        }

        let num_classes = self.header.num_classes();
        let mut matrix = vec![vec![0.0; num_classes]; num_classes];
        let (mut correct, mut incorrect, mut unclassified) = (0.0, 0.0, 0.0);
        let (mut abs_err, mut sq_err) = (0.0, 0.0);
        let (mut prior_abs_err, mut prior_sq_err) = (0.0, 0.0);
        let mut skipped = 0usize;

        for instance in test.instances() {
            let Some(actual) = test.class_value(instance) else {
                skipped += 1;
                continue;
            };
            let weight = instance.weight();
            let dist = model.distribution(instance)?;
            if dist.len() != num_classes {
                return Err(VoteError::EvaluationError(format!(
                    "{} returned {} class probabilities, expected {num_classes}",
                    model.name(),
                    dist.len()
                )));
            }

            let (abs, sq) = errors(&dist, actual);
            abs_err += weight * abs;
            sq_err += weight * sq;
            let (abs, sq) = errors(&self.priors, actual);
            prior_abs_err += weight * abs;
            prior_sq_err += weight * sq;

            if dist.iter().all(|&p| p <= 0.0) {
                unclassified += weight;
                continue;
            }
            let predicted = max_index(&dist);
            matrix[actual][predicted] += weight;
            if predicted == actual {
                correct += weight;
            } else {
                incorrect += weight;
            }
        }

        if skipped > 0 {
            debug!("Skipped {skipped} test instances with a missing class");
        }

        let total = correct + incorrect + unclassified;
        let mean_absolute_error = ratio(abs_err, total);
        let root_mean_squared_error = ratio(sq_err, total).sqrt();
        let prior_mae = ratio(prior_abs_err, total);
        let prior_rmse = ratio(prior_sq_err, total).sqrt();

        Ok(EvaluationSummary {
            model: model.name().to_string(),
            class_labels: (0..num_classes)
                .map(|c| self.header.class_label(c).unwrap_or_default().to_string())
                .collect(),
            correct,
            incorrect,
            unclassified,
            total_instances: total,
            kappa: kappa(&matrix),
            mean_absolute_error,
            root_mean_squared_error,
            relative_absolute_error: 100.0 * ratio(mean_absolute_error, prior_mae),
            root_relative_squared_error: 100.0 * ratio(root_mean_squared_error, prior_rmse),
            class_metrics: class_metrics(&matrix, &self.header),
            confusion_matrix: matrix,
        })
    }
}

/// Absolute and squared error of `dist` against the one-hot actual class,
/// averaged over the classes
fn errors(dist: &[f64], actual: usize) -> (f64, f64) {
    let n = dist.len().max(1) as f64;
    let (abs, sq) = dist.iter().enumerate().fold((0.0, 0.0), |(a, s), (c, &p)| {
        let diff = p - if c == actual { 1.0 } else { 0.0 };
        (a + diff.abs(), s + diff * diff)
    });
    (abs / n, sq / n)
}

fn kappa(matrix: &[Vec<f64>]) -> f64 {
    let total: f64 = matrix.iter().flatten().sum();
    if total <= 0.0 {
        return 0.0;
    }
    let observed: f64 = (0..matrix.len()).map(|i| matrix[i][i]).sum::<f64>() / total;
    let chance: f64 = (0..matrix.len())
        .map(|i| {
            let row: f64 = matrix[i].iter().sum();
            let col: f64 = matrix.iter().map(|r| r[i]).sum();
            row * col
        })
        .sum::<f64>()
        / (total * total);

    if chance < 1.0 {
        (observed - chance) / (1.0 - chance)
    } else {
        1.0
    }
}

fn class_metrics(matrix: &[Vec<f64>], header: &Dataset) -> Vec<ClassMetrics> {
    let total: f64 = matrix.iter().flatten().sum();
    (0..matrix.len())
        .map(|c| {
            let tp = matrix[c][c];
            let actual: f64 = matrix[c].iter().sum();
            let predicted: f64 = matrix.iter().map(|row| row[c]).sum();
            let fp = predicted - tp;
            let negatives = total - actual;

            let precision = ratio(tp, predicted);
            let recall = ratio(tp, actual);
            ClassMetrics {
                label: header.class_label(c).unwrap_or_default().to_string(),
                true_positive_rate: recall,
                false_positive_rate: ratio(fp, negatives),
                precision,
                recall,
                f_measure: ratio(2.0 * precision * recall, precision + recall),
            }
        })
        .collect()
}
