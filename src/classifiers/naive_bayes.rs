//! Naive Bayes classifier
//!
//! Nominal attributes use Laplace-smoothed frequency tables, numeric
//! attributes a per-class normal density. Missing values are ignored both
//! during fitting and prediction.

use crate::core::traits::{fitted_header, training_header};
use crate::core::{Classifier, Dataset, Instance, Result};
use crate::utils::logs_to_probs;
use log::debug;
use std::f64::consts::PI;

/// Fallback precision when an attribute has fewer than two distinct values
const DEFAULT_PRECISION: f64 = 0.01;

#[derive(Debug, Clone)]
enum Estimator {
    /// `counts[class][value]`, initialised to one
    Nominal {
        counts: Vec<Vec<f64>>,
        totals: Vec<f64>,
    },
    Numeric {
        means: Vec<f64>,
        stds: Vec<f64>,
    },
}

impl Estimator {
    fn log_likelihood(&self, class: usize, value: f64) -> f64 {
        match self {
            Estimator::Nominal { counts, totals } => {
                let v = value as usize;
                match counts[class].get(v) {
                    Some(&c) => (c / totals[class]).ln(),
                    None => 0.0,
                }
            }
            Estimator::Numeric { means, stds } => {
                let z = (value - means[class]) / stds[class];
                -0.5 * z * z - stds[class].ln() - 0.5 * (2.0 * PI).ln()
            }
        }
    }
}

/// Naive Bayes classifier (no tunable parameters)
#[derive(Debug, Clone, Default)]
pub struct NaiveBayes {
    header: Option<Dataset>,
    class_counts: Vec<f64>,
    estimators: Vec<(usize, Estimator)>,
}

impl NaiveBayes {
    pub fn new() -> Self {
        Self::default()
    }

    fn fit_nominal(data: &Dataset, attr: usize, num_values: usize) -> Estimator {
        let num_classes = data.num_classes();
        let mut counts = vec![vec![1.0; num_values]; num_classes];

        for instance in data.instances() {
            if let (Some(class), Some(v)) = (data.class_value(instance), instance.nominal_index(attr)) {
                counts[class][v] += instance.weight();
            }
        }

        let totals = counts.iter().map(|row| row.iter().sum()).collect();
        Estimator::Nominal { counts, totals }
    }

    fn fit_numeric(data: &Dataset, attr: usize) -> Estimator {
        let num_classes = data.num_classes();

        let mut distinct: Vec<f64> = data
            .instances()
            .iter()
            .filter_map(|i| i.value(attr))
            .collect();
        distinct.sort_by(|a, b| a.total_cmp(b));
        distinct.dedup();

        let precision = if distinct.len() > 1 {
            (distinct[distinct.len() - 1] - distinct[0]) / (distinct.len() - 1) as f64
        } else {
            DEFAULT_PRECISION
        };
        let min_std = precision / 6.0;

        let mut sums = vec![0.0; num_classes];
        let mut sums_sq = vec![0.0; num_classes];
        let mut weights = vec![0.0; num_classes];
        for instance in data.instances() {
            if let (Some(class), Some(v)) = (data.class_value(instance), instance.value(attr)) {
                let w = instance.weight();
                sums[class] += w * v;
                sums_sq[class] += w * v * v;
                weights[class] += w;
            }
        }

        let mut means = vec![0.0; num_classes];
        let mut stds = vec![min_std; num_classes];
        for c in 0..num_classes {
            if weights[c] > 0.0 {
                means[c] = sums[c] / weights[c];
                let variance = (sums_sq[c] / weights[c] - means[c] * means[c]).max(0.0);
                stds[c] = variance.sqrt().max(min_std);
            }
        }

        Estimator::Numeric { means, stds }
    }
}

impl Classifier for NaiveBayes {
    fn name(&self) -> &str {
        "NaiveBayes"
    }

    fn fit(&mut self, data: &Dataset) -> Result<()> {
        let header = training_header(self.name(), data)?;

        self.class_counts = data.class_weights().iter().map(|w| w + 1.0).collect();
        self.estimators = data
            .feature_indices()
            .into_iter()
            .map(|attr| {
                let attribute = &data.attributes()[attr];
                let estimator = if attribute.is_nominal() {
                    Self::fit_nominal(data, attr, attribute.num_values())
                } else {
                    Self::fit_numeric(data, attr)
                };
                (attr, estimator)
            })
            .collect();

        debug!(
            "NaiveBayes fitted on {} instances, {} estimators",
            data.len(),
            self.estimators.len()
        );
        self.header = Some(header);
        Ok(())
    }

    fn distribution(&self, instance: &Instance) -> Result<Vec<f64>> {
        fitted_header(self.header.as_ref(), instance)?;

        let total: f64 = self.class_counts.iter().sum();
        let mut logs: Vec<f64> = self
            .class_counts
            .iter()
            .map(|&c| (c / total).ln())
            .collect();

        for (attr, estimator) in &self.estimators {
            if let Some(value) = instance.value(*attr) {
                for (class, log) in logs.iter_mut().enumerate() {
                    *log += estimator.log_likelihood(class, value);
                }
            }
        }

        Ok(logs_to_probs(&logs))
    }

    fn header(&self) -> Option<&Dataset> {
        self.header.as_ref()
    }
}
