//! Multinomial logistic regression with a ridge penalty
//!
//! Nominal attributes are one-hot encoded and numeric attributes
//! standardized before fitting. The penalised negative log-likelihood is
//! minimised by gradient descent with a backtracking line search.

use crate::core::traits::{fitted_header, training_header};
use crate::core::{Classifier, Dataset, Instance, Result, VoteError};
use crate::utils::logs_to_probs;
use crate::utils::scaling::DenseEncoder;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// Sufficient-decrease constant of the Armijo condition
const ARMIJO: f64 = 1e-4;
/// Smallest step tried before the search gives up
const MIN_STEP: f64 = 1e-12;

/// Optimisation parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LogisticConfig {
    /// L2 penalty on the non-intercept coefficients
    pub ridge: f64,
    /// Iteration cap for gradient descent
    pub max_iterations: usize,
    /// Relative objective change that counts as converged
    pub tolerance: f64,
}

impl Default for LogisticConfig {
    fn default() -> Self {
        Self {
            ridge: 1e-8,
            max_iterations: 200,
            tolerance: 1e-6,
        }
    }
}

/// Encoded training rows: features, class and weight
struct Rows {
    features: Vec<Vec<f64>>,
    classes: Vec<usize>,
    weights: Vec<f64>,
    total_weight: f64,
}

/// Multinomial logistic regression classifier
#[derive(Debug, Clone, Default)]
pub struct LogisticRegression {
    config: LogisticConfig,
    header: Option<Dataset>,
    encoder: Option<DenseEncoder>,
    /// Row-major `num_classes x (width + 1)`, intercept first
    coefficients: Vec<f64>,
    iterations: usize,
    converged: bool,
}

impl LogisticRegression {
    pub fn new(config: LogisticConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &LogisticConfig {
        &self.config
    }

    /// Gradient descent iterations used by the last fit
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Whether the last fit met the tolerance before the iteration cap
    pub fn converged(&self) -> bool {
        self.converged
    }

    fn scores(coefficients: &[f64], features: &[f64], num_classes: usize) -> Vec<f64> {
        let stride = features.len() + 1;
        (0..num_classes)
            .map(|c| {
                let row = &coefficients[c * stride..(c + 1) * stride];
                row[0] + row[1..].iter().zip(features).map(|(b, x)| b * x).sum::<f64>()
            })
            .collect()
    }

    fn penalty(&self, coefficients: &[f64], stride: usize) -> f64 {
        coefficients
            .iter()
            .enumerate()
            .filter(|(i, _)| i % stride != 0)
            .map(|(_, b)| b * b)
            .sum::<f64>()
            * self.config.ridge
    }

    /// Penalised mean negative log-likelihood
    fn objective(&self, coefficients: &[f64], rows: &Rows, num_classes: usize) -> f64 {
        let stride = coefficients.len() / num_classes;
        let mut nll = 0.0;
        for ((x, &y), &w) in rows.features.iter().zip(&rows.classes).zip(&rows.weights) {
            let probs = logs_to_probs(&Self::scores(coefficients, x, num_classes));
            nll -= w * probs[y].max(f64::MIN_POSITIVE).ln();
        }
        (nll + self.penalty(coefficients, stride)) / rows.total_weight
    }

    fn gradient(&self, coefficients: &[f64], rows: &Rows, num_classes: usize) -> Vec<f64> {
        let stride = coefficients.len() / num_classes;
        let mut grad = vec![0.0; coefficients.len()];

        for ((x, &y), &w) in rows.features.iter().zip(&rows.classes).zip(&rows.weights) {
            let probs = logs_to_probs(&Self::scores(coefficients, x, num_classes));
            for (c, p) in probs.iter().enumerate() {
                let residual = w * (p - if c == y { 1.0 } else { 0.0 });
                let row = &mut grad[c * stride..(c + 1) * stride];
                row[0] += residual;
                for (g, xj) in row[1..].iter_mut().zip(x) {
                    *g += residual * xj;
                }
            }
        }

        for (i, g) in grad.iter_mut().enumerate() {
            if i % stride != 0 {
                *g += 2.0 * self.config.ridge * coefficients[i];
            }
            *g /= rows.total_weight;
        }
        grad
    }
}

impl Classifier for LogisticRegression {
    fn name(&self) -> &str {
        "LogisticRegression"
    }

    fn fit(&mut self, data: &Dataset) -> Result<()> {
        let header = training_header(self.name(), data)?;
        if !(self.config.ridge >= 0.0) {
            return Err(VoteError::TrainingError(format!(
                "LogisticRegression: ridge must be non-negative, got {}",
                self.config.ridge
            )));
        }

        let encoder = DenseEncoder::fit(data);
        let num_classes = data.num_classes();

        let mut rows = Rows {
            features: Vec::with_capacity(data.len()),
            classes: Vec::with_capacity(data.len()),
            weights: Vec::with_capacity(data.len()),
            total_weight: 0.0,
        };
        for instance in data.instances() {
            if let Some(class) = data.class_value(instance) {
                rows.features.push(encoder.encode(instance));
                rows.classes.push(class);
                rows.weights.push(instance.weight());
                rows.total_weight += instance.weight();
            }
        }
        if rows.total_weight <= 0.0 {
            return Err(VoteError::TrainingError(
                "LogisticRegression: no labelled training weight".to_string(),
            ));
        }

        let mut coefficients = vec![0.0; num_classes * (encoder.width() + 1)];
        let mut loss = self.objective(&coefficients, &rows, num_classes);
        let mut step = 1.0;
        self.converged = false;
        self.iterations = 0;

        while self.iterations < self.config.max_iterations {
            self.iterations += 1;
            let grad = self.gradient(&coefficients, &rows, num_classes);
            let grad_sq: f64 = grad.iter().map(|g| g * g).sum();
            if grad_sq.sqrt() < self.config.tolerance {
                self.converged = true;
                break;
            }

            // Backtracking line search, starting from twice the last accepted step
            step *= 2.0;
            let (candidate, candidate_loss) = loop {
                let candidate: Vec<f64> = coefficients
                    .iter()
                    .zip(&grad)
                    .map(|(b, g)| b - step * g)
                    .collect();
                let candidate_loss = self.objective(&candidate, &rows, num_classes);
                if candidate_loss <= loss - ARMIJO * step * grad_sq || step < MIN_STEP {
                    break (candidate, candidate_loss);
                }
                step /= 2.0;
            };

            if !candidate_loss.is_finite() || candidate.iter().any(|b| !b.is_finite()) {
                return Err(VoteError::TrainingError(format!(
                    "LogisticRegression: optimisation diverged after {} iterations",
                    self.iterations
                )));
            }

            let change = loss - candidate_loss;
            coefficients = candidate;
            loss = candidate_loss;

            if change.abs() <= self.config.tolerance * loss.abs().max(1.0) {
                self.converged = true;
                break;
            }
        }

        if self.converged {
            debug!(
                "LogisticRegression converged after {} iterations, objective {loss:.6}",
                self.iterations
            );
        } else {
            warn!(
                "LogisticRegression stopped at the iteration cap ({}), objective {loss:.6}",
                self.config.max_iterations
            );
        }

        self.coefficients = coefficients;
        self.encoder = Some(encoder);
        self.header = Some(header);
        Ok(())
    }

    fn distribution(&self, instance: &Instance) -> Result<Vec<f64>> {
        let header = fitted_header(self.header.as_ref(), instance)?;
        let encoder = self.encoder.as_ref().ok_or(VoteError::ModelNotTrained)?;

        let features = encoder.encode(instance);
        let scores = Self::scores(&self.coefficients, &features, header.num_classes());
        Ok(logs_to_probs(&scores))
    }

    fn header(&self) -> Option<&Dataset> {
        self.header.as_ref()
    }
}
