//! Utility functions shared by the classifiers and the evaluator

use crate::core::Dataset;

/// Index of the largest value; the first one wins on ties, 0 for an empty slice
pub fn max_index(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate() {
        if v > values[best] {
            best = i;
        }
    }
    best
}

/// Scale values in place so they sum to one; a zero sum leaves them untouched
pub fn normalize(values: &mut [f64]) {
    let sum: f64 = values.iter().sum();
    if sum > 0.0 && sum.is_finite() {
        for v in values.iter_mut() {
            *v /= sum;
        }
    }
}

/// Convert log-scores into a probability distribution (numerically stable softmax)
pub fn logs_to_probs(logs: &[f64]) -> Vec<f64> {
    let max = logs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mut probs: Vec<f64> = logs.iter().map(|&l| (l - max).exp()).collect();
    normalize(&mut probs);
    probs
}

/// Entropy in bits of a vector of (weighted) counts
pub fn entropy(counts: &[f64]) -> f64 {
    let total: f64 = counts.iter().sum();
    if total <= 0.0 {
        return 0.0;
    }
    counts
        .iter()
        .filter(|&&c| c > 0.0)
        .map(|&c| {
            let p = c / total;
            -p * p.log2()
        })
        .sum()
}

/// Feature scaling utilities
pub mod scaling {
    use super::*;
    use crate::core::AttributeKind;

    /// Min/max of every numeric attribute, used to map values onto [0, 1]
    #[derive(Debug, Clone)]
    pub struct RangeNormalizer {
        ranges: Vec<Option<(f64, f64)>>,
    }

    impl RangeNormalizer {
        /// Collect ranges of the numeric attributes of a dataset
        pub fn fit(data: &Dataset) -> Self {
            let mut ranges: Vec<Option<(f64, f64)>> = vec![None; data.num_attributes()];

            for (attr_idx, attribute) in data.attributes().iter().enumerate() {
                if !attribute.is_numeric() {
                    continue;
                }
                for instance in data.instances() {
                    if let Some(v) = instance.value(attr_idx) {
                        ranges[attr_idx] = Some(match ranges[attr_idx] {
                            Some((lo, hi)) => (lo.min(v), hi.max(v)),
                            None => (v, v),
                        });
                    }
                }
            }

            Self { ranges }
        }

        /// Map a numeric value onto [0, 1]; constant or unseen attributes map to 0
        pub fn scale(&self, attribute: usize, value: f64) -> f64 {
            match self.ranges.get(attribute).copied().flatten() {
                Some((lo, hi)) if hi > lo => (value - lo) / (hi - lo),
                _ => 0.0,
            }
        }
    }

    /// How a single source attribute maps onto the dense encoded vector
    #[derive(Debug, Clone)]
    enum Column {
        Numeric { offset: usize, mean: f64, std: f64 },
        Nominal { offset: usize, width: usize, mode: usize },
    }

    /// Dense numeric encoding: numeric attributes are standardized, nominal
    /// attributes one-hot encoded; missing values take the training mean or mode.
    #[derive(Debug, Clone)]
    pub struct DenseEncoder {
        columns: Vec<(usize, Column)>,
        width: usize,
    }

    impl DenseEncoder {
        /// Compute encoding statistics over the non-class attributes
        pub fn fit(data: &Dataset) -> Self {
            let mut columns = Vec::new();
            let mut offset = 0;

            for attr_idx in data.feature_indices() {
                let attribute = &data.attributes()[attr_idx];
                match &attribute.kind {
                    AttributeKind::Numeric => {
                        let (mut sum, mut sum_sq, mut weight) = (0.0, 0.0, 0.0);
                        for instance in data.instances() {
                            if let Some(v) = instance.value(attr_idx) {
                                let w = instance.weight();
                                sum += w * v;
                                sum_sq += w * v * v;
                                weight += w;
                            }
                        }
                        let mean = if weight > 0.0 { sum / weight } else { 0.0 };
                        let variance = if weight > 0.0 {
                            (sum_sq / weight - mean * mean).max(0.0)
                        } else {
                            0.0
                        };
                        let std = if variance > 0.0 { variance.sqrt() } else { 1.0 };
                        columns.push((attr_idx, Column::Numeric { offset, mean, std }));
                        offset += 1;
                    }
                    AttributeKind::Nominal(values) => {
                        let mut counts = vec![0.0; values.len()];
                        for instance in data.instances() {
                            if let Some(v) = instance.nominal_index(attr_idx) {
                                counts[v] += instance.weight();
                            }
                        }
                        let width = values.len();
                        columns.push((
                            attr_idx,
                            Column::Nominal {
                                offset,
                                width,
                                mode: max_index(&counts),
                            },
                        ));
                        offset += width;
                    }
                }
            }

            Self {
                columns,
                width: offset,
            }
        }

        /// Length of encoded vectors
        pub fn width(&self) -> usize {
            self.width
        }

        /// Encode one instance
        pub fn encode(&self, instance: &crate::core::Instance) -> Vec<f64> {
            let mut out = vec![0.0; self.width];
            for (attr_idx, column) in &self.columns {
                match *column {
                    Column::Numeric { offset, mean, std } => {
                        let v = instance.value(*attr_idx).unwrap_or(mean);
                        out[offset] = (v - mean) / std;
                    }
                    Column::Nominal {
                        offset,
                        width,
                        mode,
                    } => {
                        let v = instance.nominal_index(*attr_idx).unwrap_or(mode);
                        if v < width {
                            out[offset + v] = 1.0;
                        }
                    }
                }
            }
            out
        }
    }
}

/// Dataset validation utilities
pub mod validation {
    use super::*;

    /// Majority class weight, minority class weight and their ratio
    ///
    /// Classes that never occur are ignored. The ratio is infinite when only a
    /// single class is present.
    pub fn check_label_balance(data: &Dataset) -> (f64, f64, f64) {
        let present: Vec<f64> = data
            .class_weights()
            .into_iter()
            .filter(|&w| w > 0.0)
            .collect();

        let majority = present.iter().copied().fold(0.0, f64::max);
        let minority = present.iter().copied().fold(f64::INFINITY, f64::min);

        if present.is_empty() {
            (0.0, 0.0, 0.0)
        } else if present.len() == 1 {
            (majority, 0.0, f64::INFINITY)
        } else {
            (majority, minority, majority / minority)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Attribute, Instance};
    use approx::assert_relative_eq;

    fn mixed() -> Dataset {
        let mut data = Dataset::new(
            "mixed",
            vec![
                Attribute::numeric("x"),
                Attribute::nominal("colour", vec!["red".into(), "blue".into(), "green".into()]),
                Attribute::nominal("y", vec!["a".into(), "b".into()]),
            ],
        );
        data.push(Instance::new(vec![Some(2.0), Some(0.0), Some(0.0)]))
            .unwrap();
        data.push(Instance::new(vec![Some(4.0), Some(1.0), Some(0.0)]))
            .unwrap();
        data.push(Instance::new(vec![Some(6.0), Some(1.0), Some(1.0)]))
            .unwrap();
        data.push(Instance::new(vec![None, None, Some(0.0)]))
            .unwrap();
        data.set_class_index(2).unwrap();
        data
    }

    #[test]
    fn test_max_index_prefers_first() {
        assert_eq!(max_index(&[1.0, 3.0, 3.0]), 1);
        assert_eq!(max_index(&[]), 0);
    }

    #[test]
    fn test_logs_to_probs() {
        let probs = logs_to_probs(&[0.0, 0.0]);
        assert_relative_eq!(probs[0], 0.5);

        let probs = logs_to_probs(&[1000.0, 0.0]);
        assert_relative_eq!(probs[0], 1.0);
        assert!(probs[1] >= 0.0);
    }

    #[test]
    fn test_entropy() {
        assert_relative_eq!(entropy(&[5.0, 5.0]), 1.0);
        assert_relative_eq!(entropy(&[4.0, 0.0]), 0.0);
        assert_relative_eq!(entropy(&[]), 0.0);
    }

    #[test]
    fn test_range_normalizer() {
        let data = mixed();
        let ranges = scaling::RangeNormalizer::fit(&data);
        assert_relative_eq!(ranges.scale(0, 2.0), 0.0);
        assert_relative_eq!(ranges.scale(0, 5.0), 0.75);
        // Nominal attributes have no range
        assert_relative_eq!(ranges.scale(1, 1.0), 0.0);
    }

    #[test]
    fn test_dense_encoder() {
        let data = mixed();
        let encoder = scaling::DenseEncoder::fit(&data);
        assert_eq!(encoder.width(), 4);

        let encoded = encoder.encode(&data.instances()[0]);
        assert_relative_eq!(encoded[0], -2.0 / (8.0f64 / 3.0).sqrt(), epsilon = 1e-12);
        assert_eq!(&encoded[1..], &[1.0, 0.0, 0.0]);

        // Missing values take the mean and the mode
        let encoded = encoder.encode(&data.instances()[3]);
        assert_relative_eq!(encoded[0], 0.0);
        assert_eq!(&encoded[1..], &[0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_check_label_balance() {
        let data = mixed();
        let (majority, minority, ratio) = validation::check_label_balance(&data);
        assert_eq!(majority, 3.0);
        assert_eq!(minority, 1.0);
        assert_eq!(ratio, 3.0);
    }
}
