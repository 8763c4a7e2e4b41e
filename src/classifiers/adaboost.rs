//! AdaBoost.M1 over weighted decision stumps

use crate::core::traits::{fitted_header, training_header};
use crate::core::{Classifier, Dataset, Instance, Result, VoteError};
use crate::utils::{entropy, logs_to_probs, max_index, normalize};
use log::debug;
use serde::{Deserialize, Serialize};

/// Boosting parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdaBoostConfig {
    /// Maximum number of boosting rounds
    pub iterations: usize,
}

impl Default for AdaBoostConfig {
    fn default() -> Self {
        Self { iterations: 10 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum StumpTest {
    /// Branch 0 holds `value == v`
    Equals(usize),
    /// Branch 0 holds `value <= t`
    AtMost(f64),
}

/// One-level tree with a "match", a "rest" and a "missing" branch
#[derive(Debug, Clone)]
pub(crate) struct DecisionStump {
    split: Option<(usize, StumpTest)>,
    distributions: [Vec<f64>; 3],
}

impl DecisionStump {
    /// Fit on weighted instances by minimising the weighted conditional entropy
    pub(crate) fn fit(data: &Dataset) -> Self {
        let num_classes = data.num_classes();
        let mut overall = data.class_weights();

        let mut best: Option<(f64, usize, StumpTest, [Vec<f64>; 3])> = None;
        for attr in data.feature_indices() {
            let candidate = if data.attributes()[attr].is_nominal() {
                Self::best_nominal(data, attr, num_classes)
            } else {
                Self::best_numeric(data, attr, num_classes)
            };

            if let Some((score, test, counts)) = candidate {
                if best.as_ref().map_or(true, |(s, ..)| score < *s) {
                    best = Some((score, attr, test, counts));
                }
            }
        }

        normalize(&mut overall);
        match best {
            Some((_, attr, test, mut counts)) => {
                for branch in counts.iter_mut() {
                    if branch.iter().sum::<f64>() > 0.0 {
                        normalize(branch);
                    } else {
                        branch.clone_from(&overall);
                    }
                }
                Self {
                    split: Some((attr, test)),
                    distributions: counts,
                }
            }
            None => Self {
                split: None,
                distributions: [overall.clone(), overall.clone(), overall],
            },
        }
    }

    fn score(counts: &[Vec<f64>; 3]) -> f64 {
        counts
            .iter()
            .map(|branch| branch.iter().sum::<f64>() * entropy(branch))
            .sum()
    }

    fn missing_counts(data: &Dataset, attr: usize, num_classes: usize) -> Vec<f64> {
        let mut missing = vec![0.0; num_classes];
        for instance in data.instances() {
            if let (Some(class), None) = (data.class_value(instance), instance.value(attr)) {
                missing[class] += instance.weight();
            }
        }
        missing
    }

    fn best_nominal(
        data: &Dataset,
        attr: usize,
        num_classes: usize,
    ) -> Option<(f64, StumpTest, [Vec<f64>; 3])> {
        let num_values = data.attributes()[attr].num_values();
        let mut per_value = vec![vec![0.0; num_classes]; num_values];
        let mut known = vec![0.0; num_classes];

        for instance in data.instances() {
            if let (Some(class), Some(v)) = (data.class_value(instance), instance.nominal_index(attr)) {
                per_value[v][class] += instance.weight();
                known[class] += instance.weight();
            }
        }
        let missing = Self::missing_counts(data, attr, num_classes);

        let mut best: Option<(f64, StumpTest, [Vec<f64>; 3])> = None;
        for (v, matching) in per_value.iter().enumerate() {
            let rest: Vec<f64> = known.iter().zip(matching).map(|(k, m)| k - m).collect();
            let counts = [matching.clone(), rest, missing.clone()];
            let score = Self::score(&counts);
            if best.as_ref().map_or(true, |(s, ..)| score < *s) {
                best = Some((score, StumpTest::Equals(v), counts));
            }
        }
        best
    }

    fn best_numeric(
        data: &Dataset,
        attr: usize,
        num_classes: usize,
    ) -> Option<(f64, StumpTest, [Vec<f64>; 3])> {
        let mut known: Vec<(f64, usize, f64)> = data
            .instances()
            .iter()
            .filter_map(|i| Some((i.value(attr)?, data.class_value(i)?, i.weight())))
            .collect();
        known.sort_by(|a, b| a.0.total_cmp(&b.0));

        let missing = Self::missing_counts(data, attr, num_classes);
        let mut left = vec![0.0; num_classes];
        let mut right = vec![0.0; num_classes];
        for &(_, class, weight) in &known {
            right[class] += weight;
        }

        let mut best: Option<(f64, StumpTest, [Vec<f64>; 3])> = None;
        for i in 0..known.len().saturating_sub(1) {
            let (value, class, weight) = known[i];
            left[class] += weight;
            right[class] -= weight;

            let next = known[i + 1].0;
            if next <= value {
                continue;
            }

            let counts = [left.clone(), right.clone(), missing.clone()];
            let score = Self::score(&counts);
            if best.as_ref().map_or(true, |(s, ..)| score < *s) {
                best = Some((score, StumpTest::AtMost((value + next) / 2.0), counts));
            }
        }
        best
    }

    fn branch(&self, instance: &Instance) -> usize {
        match self.split {
            None => 2,
            Some((attr, test)) => match (instance.value(attr), test) {
                (None, _) => 2,
                (Some(v), StumpTest::Equals(target)) => usize::from(v as usize != target),
                (Some(v), StumpTest::AtMost(t)) => usize::from(v > t),
            },
        }
    }

    pub(crate) fn distribution(&self, instance: &Instance) -> &[f64] {
        &self.distributions[self.branch(instance)]
    }

    pub(crate) fn classify(&self, instance: &Instance) -> usize {
        max_index(self.distribution(instance))
    }
}

/// AdaBoost.M1 with decision stumps as base learners
#[derive(Debug, Clone, Default)]
pub struct AdaBoost {
    config: AdaBoostConfig,
    header: Option<Dataset>,
    members: Vec<(DecisionStump, f64)>,
}

impl AdaBoost {
    pub fn new(config: AdaBoostConfig) -> Self {
        Self {
            config,
            header: None,
            members: Vec::new(),
        }
    }

    pub fn config(&self) -> &AdaBoostConfig {
        &self.config
    }

    /// Number of boosting rounds kept after fitting
    pub fn rounds(&self) -> usize {
        self.members.len()
    }
}

impl Classifier for AdaBoost {
    fn name(&self) -> &str {
        "AdaBoost"
    }

    fn fit(&mut self, data: &Dataset) -> Result<()> {
        let header = training_header(self.name(), data)?;
        if self.config.iterations == 0 {
            return Err(VoteError::TrainingError(
                "AdaBoost: at least one iteration is required".to_string(),
            ));
        }

        let mut working = data.clone();
        let total_weight = working.total_weight();
        if total_weight <= 0.0 {
            return Err(VoteError::TrainingError(
                "AdaBoost: training instances carry no weight".to_string(),
            ));
        }

        self.members.clear();
        for round in 0..self.config.iterations {
            let stump = DecisionStump::fit(&working);

            let mut wrong = vec![false; working.len()];
            let mut error_weight = 0.0;
            let mut weight_sum = 0.0;
            for (i, instance) in working.instances().iter().enumerate() {
                if let Some(class) = working.class_value(instance) {
                    weight_sum += instance.weight();
                    if stump.classify(instance) != class {
                        wrong[i] = true;
                        error_weight += instance.weight();
                    }
                }
            }
            let error = if weight_sum > 0.0 { error_weight / weight_sum } else { 0.0 };

            debug!("AdaBoost round {round}: weighted error {error:.4}");

            if error >= 0.5 || error == 0.0 {
                if round == 0 {
                    self.members.push((stump, 1.0));
                }
                break;
            }

            let reweight = (1.0 - error) / error;
            self.members.push((stump, reweight.ln()));

            let old_sum = working.total_weight();
            for (instance, &missed) in working.instances_mut().iter_mut().zip(&wrong) {
                if missed {
                    instance.set_weight(instance.weight() * reweight);
                }
            }
            let new_sum = working.total_weight();
            for instance in working.instances_mut() {
                instance.set_weight(instance.weight() * old_sum / new_sum);
            }
        }

        debug!("AdaBoost kept {} rounds", self.members.len());
        self.header = Some(header);
        Ok(())
    }

    fn distribution(&self, instance: &Instance) -> Result<Vec<f64>> {
        let header = fitted_header(self.header.as_ref(), instance)?;

        if let [(only, _)] = self.members.as_slice() {
            return Ok(only.distribution(instance).to_vec());
        }

        let mut sums = vec![0.0; header.num_classes()];
        for (stump, weight) in &self.members {
            sums[stump.classify(instance)] += weight;
        }
        Ok(logs_to_probs(&sums))
    }

    fn header(&self) -> Option<&Dataset> {
        self.header.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Attribute;
    use approx::assert_relative_eq;

    fn threshold_data() -> Dataset {
        let mut data = Dataset::new(
            "threshold",
            vec![
                Attribute::numeric("x"),
                Attribute::nominal("colour", vec!["red".into(), "blue".into()]),
                Attribute::nominal("y", vec!["low".into(), "high".into()]),
            ],
        );
        for i in 0..20 {
            let x = i as f64;
            let class = if x < 10.0 { 0.0 } else { 1.0 };
            data.push(Instance::new(vec![Some(x), Some((i % 2) as f64), Some(class)]))
                .unwrap();
        }
        data.set_class_index(2).unwrap();
        data
    }

    #[test]
    fn test_stump_finds_threshold() {
        let data = threshold_data();
        let stump = DecisionStump::fit(&data);
        assert_eq!(stump.split, Some((0, StumpTest::AtMost(9.5))));

        let low = Instance::new(vec![Some(3.0), Some(0.0), None]);
        let high = Instance::new(vec![Some(15.0), Some(0.0), None]);
        assert_eq!(stump.classify(&low), 0);
        assert_eq!(stump.classify(&high), 1);
    }

    #[test]
    fn test_stump_nominal_split() {
        let mut data = Dataset::new(
            "nominal",
            vec![
                Attribute::nominal("colour", vec!["red".into(), "blue".into(), "green".into()]),
                Attribute::nominal("y", vec!["a".into(), "b".into()]),
            ],
        );
        for (colour, class) in [(0.0, 0.0), (0.0, 0.0), (1.0, 1.0), (2.0, 1.0), (1.0, 1.0)] {
            data.push(Instance::new(vec![Some(colour), Some(class)])).unwrap();
        }
        data.set_class_index(1).unwrap();

        let stump = DecisionStump::fit(&data);
        assert_eq!(stump.split, Some((0, StumpTest::Equals(0))));

        let missing = Instance::new(vec![None, None]);
        assert_relative_eq!(stump.distribution(&missing)[0], 0.4);
    }

    #[test]
    fn test_perfect_first_round_stops() {
        let data = threshold_data();
        let mut boost = AdaBoost::new(AdaBoostConfig::default());
        boost.fit(&data).unwrap();
        assert_eq!(boost.rounds(), 1);

        let correct = data
            .instances()
            .iter()
            .filter(|i| boost.predict(i).unwrap().class_index == data.class_value(i).unwrap())
            .count();
        assert_eq!(correct, data.len());
    }

    #[test]
    fn test_boosting_improves_on_interval() {
        // Class "high" only in the middle band, which no single stump can isolate
        let mut data = Dataset::new(
            "band",
            vec![
                Attribute::numeric("x"),
                Attribute::nominal("y", vec!["out".into(), "in".into()]),
            ],
        );
        for i in 0..30 {
            let class = if (10..20).contains(&i) { 1.0 } else { 0.0 };
            data.push(Instance::new(vec![Some(i as f64), Some(class)])).unwrap();
        }
        data.set_class_index(1).unwrap();

        let mut boost = AdaBoost::new(AdaBoostConfig { iterations: 10 });
        boost.fit(&data).unwrap();
        assert!(boost.rounds() > 1);

        let correct = data
            .instances()
            .iter()
            .filter(|i| boost.predict(i).unwrap().class_index == data.class_value(i).unwrap())
            .count();
        assert!(correct as f64 / data.len() as f64 > 2.0 / 3.0);
    }

    #[test]
    fn test_zero_iterations_rejected() {
        let mut boost = AdaBoost::new(AdaBoostConfig { iterations: 0 });
        assert!(matches!(
            boost.fit(&threshold_data()),
            Err(VoteError::TrainingError(_))
        ));
    }
}
