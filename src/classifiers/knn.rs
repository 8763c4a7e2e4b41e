//! k-nearest-neighbours classifier

use crate::core::traits::{fitted_header, training_header};
use crate::core::{Classifier, Dataset, Instance, Result, VoteError};
use crate::utils::normalize;
use crate::utils::scaling::RangeNormalizer;
use serde::{Deserialize, Serialize};

/// Neighbourhood parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KnnConfig {
    /// Number of neighbours that vote
    pub k: usize,
}

impl Default for KnnConfig {
    fn default() -> Self {
        Self { k: 3 }
    }
}

/// Instance-based classifier with range-normalised Euclidean distance
#[derive(Debug, Clone, Default)]
pub struct KNearestNeighbors {
    config: KnnConfig,
    header: Option<Dataset>,
    training: Option<Dataset>,
    ranges: Option<RangeNormalizer>,
}

impl KNearestNeighbors {
    pub fn new(config: KnnConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &KnnConfig {
        &self.config
    }

    /// Squared distance over the non-class attributes.
    ///
    /// Nominal attributes contribute 0 when equal and 1 otherwise. A missing
    /// value is treated as maximally distant from the other value.
    fn distance(
        ranges: &RangeNormalizer,
        header: &Dataset,
        features: &[usize],
        a: &Instance,
        b: &Instance,
    ) -> f64 {
        features
            .iter()
            .map(|&attr| {
                let diff = if header.attributes()[attr].is_nominal() {
                    match (a.value(attr), b.value(attr)) {
                        (Some(x), Some(y)) if x == y => 0.0,
                        _ => 1.0,
                    }
                } else {
                    match (a.value(attr), b.value(attr)) {
                        (Some(x), Some(y)) => ranges.scale(attr, x) - ranges.scale(attr, y),
                        (Some(v), None) | (None, Some(v)) => {
                            let v = ranges.scale(attr, v);
                            v.max(1.0 - v)
                        }
                        (None, None) => 1.0,
                    }
                };
                diff * diff
            })
            .sum()
    }

    /// Indices of the k closest training instances, closest first. Equal
    /// distances keep training order.
    fn neighbours(&self, instance: &Instance) -> Result<Vec<usize>> {
        let header = self.header.as_ref().ok_or(VoteError::ModelNotTrained)?;
        let training = self.training.as_ref().ok_or(VoteError::ModelNotTrained)?;
        let ranges = self.ranges.as_ref().ok_or(VoteError::ModelNotTrained)?;
        let features = header.feature_indices();

        let mut nearest: Vec<(f64, usize)> = Vec::with_capacity(self.config.k + 1);
        for (i, candidate) in training.instances().iter().enumerate() {
            let d = Self::distance(ranges, header, &features, instance, candidate);
            if nearest.len() == self.config.k
                && nearest.last().map_or(false, |&(worst, _)| d >= worst)
            {
                continue;
            }
            let pos = nearest.partition_point(|&(other, _)| other <= d);
            nearest.insert(pos, (d, i));
            nearest.truncate(self.config.k);
        }

        Ok(nearest.into_iter().map(|(_, i)| i).collect())
    }
}

impl Classifier for KNearestNeighbors {
    fn name(&self) -> &str {
        "KNearestNeighbors"
    }

    fn fit(&mut self, data: &Dataset) -> Result<()> {
        let header = training_header(self.name(), data)?;
        if self.config.k == 0 {
            return Err(VoteError::TrainingError(
                "KNearestNeighbors: k must be at least 1".to_string(),
            ));
        }

        let mut training = data.header();
        for instance in data.instances() {
            if data.class_value(instance).is_some() {
                training.push(instance.clone())?;
            }
        }

        self.ranges = Some(RangeNormalizer::fit(&training));
        self.training = Some(training);
        self.header = Some(header);
        Ok(())
    }

    fn distribution(&self, instance: &Instance) -> Result<Vec<f64>> {
        let header = fitted_header(self.header.as_ref(), instance)?;
        let training = self.training.as_ref().ok_or(VoteError::ModelNotTrained)?;

        let floor = 1.0 / training.len().max(1) as f64;
        let mut dist = vec![floor; header.num_classes()];
        for i in self.neighbours(instance)? {
            if let Some(neighbour) = training.instance(i) {
                if let Some(class) = training.class_value(neighbour) {
                    dist[class] += neighbour.weight();
                }
            }
        }

        normalize(&mut dist);
        Ok(dist)
    }

    fn header(&self) -> Option<&Dataset> {
        self.header.as_ref()
    }
}
