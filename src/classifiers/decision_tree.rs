//! C4.5 decision tree
//!
//! Splits are chosen by gain ratio among the candidates whose information
//! gain is at least average. Nominal attributes split into one branch per
//! value, numeric attributes into a binary `<=` / `>` test. Instances missing
//! the split attribute follow the most populated branch.

use crate::core::traits::{fitted_header, training_header};
use crate::core::{Classifier, Dataset, Instance, Result, VoteError};
use crate::utils::{entropy, max_index, normalize};
use log::debug;
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};

/// Upper bound on the minimum weight per side of a numeric split
const MAX_NUMERIC_MIN_SPLIT: f64 = 25.0;

/// Tree growth and pruning parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecisionTreeConfig {
    /// Skip pessimistic subtree replacement
    pub unpruned: bool,
    /// Minimum instance weight in at least two branches of a split
    pub min_objects_per_leaf: usize,
    /// Confidence used by pruning, in (0, 0.5]
    pub confidence_factor: f64,
}

impl Default for DecisionTreeConfig {
    fn default() -> Self {
        Self {
            unpruned: true,
            min_objects_per_leaf: 2,
            confidence_factor: 0.25,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum SplitTest {
    /// One branch per nominal value
    Nominal,
    /// Branch 0 holds `value <= threshold`, branch 1 the rest
    Threshold(f64),
}

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        counts: Vec<f64>,
        distribution: Vec<f64>,
    },
    Split {
        attribute: usize,
        test: SplitTest,
        counts: Vec<f64>,
        default_branch: usize,
        children: Vec<Node>,
    },
}

impl Node {
    fn leaf(counts: Vec<f64>, fallback: &[f64]) -> Self {
        let mut distribution = counts.clone();
        if distribution.iter().sum::<f64>() > 0.0 {
            normalize(&mut distribution);
        } else {
            distribution = fallback.to_vec();
        }
        Node::Leaf {
            counts,
            distribution,
        }
    }

    fn counts(&self) -> &[f64] {
        match self {
            Node::Leaf { counts, .. } | Node::Split { counts, .. } => counts,
        }
    }

    /// Training weight not belonging to the majority class
    fn node_errors(&self) -> f64 {
        let counts = self.counts();
        counts.iter().sum::<f64>() - counts[max_index(counts)]
    }

    fn subtree_errors(&self) -> f64 {
        match self {
            Node::Leaf { .. } => self.node_errors(),
            Node::Split { children, .. } => children.iter().map(Node::subtree_errors).sum(),
        }
    }

    fn into_leaf(self) -> Self {
        match self {
            Node::Split { counts, .. } => {
                let mut distribution = counts.clone();
                normalize(&mut distribution);
                Node::Leaf {
                    counts,
                    distribution,
                }
            }
            leaf => leaf,
        }
    }

    /// Replace subtrees that do not reduce training error by leaves
    fn collapse(self) -> Self {
        match self {
            Node::Split {
                attribute,
                test,
                counts,
                default_branch,
                children,
            } => {
                let children: Vec<Node> = children.into_iter().map(Node::collapse).collect();
                let node = Node::Split {
                    attribute,
                    test,
                    counts,
                    default_branch,
                    children,
                };
                if node.subtree_errors() >= node.node_errors() - 1e-3 {
                    node.into_leaf()
                } else {
                    node
                }
            }
            leaf => leaf,
        }
    }

    /// Pessimistic error estimate of the subtree
    fn estimated_errors(&self, z: f64, cf: f64) -> f64 {
        match self {
            Node::Leaf { counts, .. } => {
                let errors = self.node_errors();
                errors + add_errors(counts.iter().sum(), errors, z, cf)
            }
            Node::Split { children, .. } => {
                children.iter().map(|c| c.estimated_errors(z, cf)).sum()
            }
        }
    }

    /// Bottom-up subtree replacement
    fn prune(self, z: f64, cf: f64) -> Self {
        match self {
            Node::Split {
                attribute,
                test,
                counts,
                default_branch,
                children,
            } => {
                let children: Vec<Node> = children.into_iter().map(|c| c.prune(z, cf)).collect();
                let node = Node::Split {
                    attribute,
                    test,
                    counts,
                    default_branch,
                    children,
                };
                let total: f64 = node.counts().iter().sum();
                let errors = node.node_errors();
                let as_leaf = errors + add_errors(total, errors, z, cf);
                if as_leaf <= node.estimated_errors(z, cf) + 0.1 {
                    node.into_leaf()
                } else {
                    node
                }
            }
            leaf => leaf,
        }
    }

    fn distribution(&self, instance: &Instance) -> &[f64] {
        match self {
            Node::Leaf { distribution, .. } => distribution,
            Node::Split {
                attribute,
                test,
                default_branch,
                children,
                ..
            } => {
                let branch = match (instance.value(*attribute), test) {
                    (None, _) => *default_branch,
                    (Some(v), SplitTest::Nominal) => {
                        let v = v as usize;
                        if v < children.len() {
                            v
                        } else {
                            *default_branch
                        }
                    }
                    (Some(v), SplitTest::Threshold(t)) => usize::from(v > *t),
                };
                children[branch].distribution(instance)
            }
        }
    }

    fn num_leaves(&self) -> usize {
        match self {
            Node::Leaf { .. } => 1,
            Node::Split { children, .. } => children.iter().map(Node::num_leaves).sum(),
        }
    }

    fn depth(&self) -> usize {
        match self {
            Node::Leaf { .. } => 0,
            Node::Split { children, .. } => {
                1 + children.iter().map(Node::depth).max().unwrap_or(0)
            }
        }
    }
}

/// Extra errors added to `e` observed errors out of `n` at confidence `cf`
fn add_errors(n: f64, e: f64, z: f64, cf: f64) -> f64 {
    if n <= 0.0 {
        return 0.0;
    }
    if e < 1.0 {
        let base = n * (1.0 - cf.powf(1.0 / n));
        if e == 0.0 {
            return base;
        }
        return base + e * (add_errors(n, 1.0, z, cf) - base);
    }
    if e + 0.5 >= n {
        return (n - e).max(0.0);
    }
    let f = (e + 0.5) / n;
    let r = (f + z * z / (2.0 * n) + z * (f / n - f * f / n + z * z / (4.0 * n * n)).sqrt())
        / (1.0 + z * z / n);
    r * n - e
}

/// Candidate split of one node
struct Candidate {
    attribute: usize,
    test: SplitTest,
    gain: f64,
    gain_ratio: f64,
    branches: Vec<Vec<usize>>,
    missing: Vec<usize>,
}

/// Split information over the branch weights plus the unknown weight
fn split_info(branch_weights: &[f64], unknown: f64) -> f64 {
    let mut weights = branch_weights.to_vec();
    weights.push(unknown);
    entropy(&weights)
}

struct TreeBuilder<'a> {
    data: &'a Dataset,
    features: Vec<usize>,
    num_classes: usize,
    min_objects: f64,
}

impl<'a> TreeBuilder<'a> {
    fn class_counts(&self, indices: &[usize]) -> Vec<f64> {
        let mut counts = vec![0.0; self.num_classes];
        for &i in indices {
            let instance = &self.data.instances()[i];
            if let Some(class) = self.data.class_value(instance) {
                counts[class] += instance.weight();
            }
        }
        counts
    }

    fn build(&self, indices: &[usize], fallback: &[f64]) -> Node {
        let counts = self.class_counts(indices);
        let total: f64 = counts.iter().sum();
        let pure = counts.iter().filter(|&&c| c > 0.0).count() <= 1;

        if pure || total < 2.0 * self.min_objects {
            return Node::leaf(counts, fallback);
        }

        let candidates: Vec<Candidate> = self
            .features
            .iter()
            .filter_map(|&attr| {
                if self.data.attributes()[attr].is_nominal() {
                    self.nominal_candidate(attr, indices, &counts)
                } else {
                    self.numeric_candidate(attr, indices, &counts)
                }
            })
            .filter(|c| c.gain > 0.0)
            .collect();

        if candidates.is_empty() {
            return Node::leaf(counts, fallback);
        }

        let average_gain =
            candidates.iter().map(|c| c.gain).sum::<f64>() / candidates.len() as f64;
        let mut best: Option<Candidate> = None;
        for candidate in candidates {
            if candidate.gain < average_gain - 1e-3 {
                continue;
            }
            if best
                .as_ref()
                .map_or(true, |b| candidate.gain_ratio > b.gain_ratio)
            {
                best = Some(candidate);
            }
        }
        let Some(best) = best else {
            return Node::leaf(counts, fallback);
        };

        let Candidate {
            attribute,
            test,
            mut branches,
            missing,
            ..
        } = best;

        let branch_weights: Vec<f64> = branches
            .iter()
            .map(|b| self.class_counts(b).iter().sum())
            .collect();
        let default_branch = max_index(&branch_weights);
        branches[default_branch].extend(missing);

        let mut distribution = counts.clone();
        normalize(&mut distribution);
        let children = branches
            .iter()
            .map(|branch| self.build(branch, &distribution))
            .collect();

        Node::Split {
            attribute,
            test,
            counts,
            default_branch,
            children,
        }
    }

    fn nominal_candidate(&self, attr: usize, indices: &[usize], counts: &[f64]) -> Option<Candidate> {
        let num_values = self.data.attributes()[attr].num_values();
        let mut branches: Vec<Vec<usize>> = vec![Vec::new(); num_values];
        let mut missing = Vec::new();

        for &i in indices {
            match self.data.instances()[i].nominal_index(attr) {
                Some(v) => branches[v].push(i),
                None => missing.push(i),
            }
        }

        let branch_counts: Vec<Vec<f64>> = branches.iter().map(|b| self.class_counts(b)).collect();
        let branch_weights: Vec<f64> = branch_counts.iter().map(|c| c.iter().sum()).collect();
        let known: f64 = branch_weights.iter().sum();
        let total: f64 = counts.iter().sum();

        let populated = branch_weights
            .iter()
            .filter(|&&w| w >= self.min_objects)
            .count();
        if populated < 2 || known < 2.0 * self.min_objects {
            return None;
        }

        let known_counts: Vec<f64> = (0..self.num_classes)
            .map(|c| branch_counts.iter().map(|b| b[c]).sum())
            .collect();
        let after: f64 = branch_counts
            .iter()
            .zip(&branch_weights)
            .map(|(b, w)| w / known * entropy(b))
            .sum();
        let gain = known / total * (entropy(&known_counts) - after);
        let info = split_info(&branch_weights, total - known);

        Some(Candidate {
            attribute: attr,
            test: SplitTest::Nominal,
            gain,
            gain_ratio: if info > 1e-12 { gain / info } else { 0.0 },
            branches,
            missing,
        })
    }

    fn numeric_candidate(&self, attr: usize, indices: &[usize], counts: &[f64]) -> Option<Candidate> {
        let mut known: Vec<(f64, usize)> = Vec::with_capacity(indices.len());
        let mut missing = Vec::new();
        for &i in indices {
            match self.data.instances()[i].value(attr) {
                Some(v) => known.push((v, i)),
                None => missing.push(i),
            }
        }
        known.sort_by(|a, b| a.0.total_cmp(&b.0));

        let total: f64 = counts.iter().sum();
        let known_indices: Vec<usize> = known.iter().map(|&(_, i)| i).collect();
        let known_counts = self.class_counts(&known_indices);
        let known_total: f64 = known_counts.iter().sum();

        let min_split = (0.1 * known_total / self.num_classes as f64)
            .max(self.min_objects)
            .min(MAX_NUMERIC_MIN_SPLIT.max(self.min_objects));
        if known_total < 2.0 * min_split {
            return None;
        }

        let before = entropy(&known_counts);
        let mut left = vec![0.0; self.num_classes];
        let mut right = known_counts.clone();
        let mut best: Option<(f64, usize, f64)> = None;
        let mut num_splits = 0usize;

        for pos in 0..known.len().saturating_sub(1) {
            let instance = &self.data.instances()[known[pos].1];
            if let Some(class) = self.data.class_value(instance) {
                left[class] += instance.weight();
                right[class] -= instance.weight();
            }

            let (value, next) = (known[pos].0, known[pos + 1].0);
            if next <= value {
                continue;
            }
            let left_weight: f64 = left.iter().sum();
            let right_weight: f64 = right.iter().sum();
            if left_weight < min_split || right_weight < min_split {
                continue;
            }

            num_splits += 1;
            let after = (left_weight * entropy(&left) + right_weight * entropy(&right)) / known_total;
            let gain = before - after;
            if best.map_or(true, |(g, ..)| gain > g) {
                best = Some((gain, pos, left_weight));
            }
        }

        let (raw_gain, pos, left_weight) = best?;
        let gain = known_total / total * raw_gain - (num_splits as f64).log2() / known_total;
        let info = split_info(&[left_weight, known_total - left_weight], total - known_total);

        let branches = vec![known_indices[..=pos].to_vec(), known_indices[pos + 1..].to_vec()];
        Some(Candidate {
            attribute: attr,
            test: SplitTest::Threshold(known[pos].0),
            gain,
            gain_ratio: if info > 1e-12 { gain / info } else { 0.0 },
            branches,
            missing,
        })
    }
}

/// C4.5 decision tree classifier
#[derive(Debug, Clone, Default)]
pub struct DecisionTree {
    config: DecisionTreeConfig,
    header: Option<Dataset>,
    root: Option<Node>,
}

impl DecisionTree {
    pub fn new(config: DecisionTreeConfig) -> Self {
        Self {
            config,
            header: None,
            root: None,
        }
    }

    pub fn config(&self) -> &DecisionTreeConfig {
        &self.config
    }

    /// Number of leaves, 0 before fitting
    pub fn num_leaves(&self) -> usize {
        self.root.as_ref().map_or(0, Node::num_leaves)
    }

    /// Depth of the deepest leaf, 0 before fitting
    pub fn depth(&self) -> usize {
        self.root.as_ref().map_or(0, Node::depth)
    }
}

impl Classifier for DecisionTree {
    fn name(&self) -> &str {
        "DecisionTree"
    }

    fn fit(&mut self, data: &Dataset) -> Result<()> {
        let header = training_header(self.name(), data)?;
        if self.config.min_objects_per_leaf == 0 {
            return Err(VoteError::TrainingError(
                "DecisionTree: min_objects_per_leaf must be at least 1".to_string(),
            ));
        }

        let cf = self.config.confidence_factor;
        let z = if self.config.unpruned {
            None
        } else {
            if !(cf > 0.0 && cf <= 0.5) {
                return Err(VoteError::TrainingError(format!(
                    "DecisionTree: confidence factor must be in (0, 0.5], got {cf}"
                )));
            }
            let normal = Normal::new(0.0, 1.0)
                .map_err(|e| VoteError::TrainingError(format!("DecisionTree: {e}")))?;
            Some(normal.inverse_cdf(1.0 - cf))
        };

        let builder = TreeBuilder {
            data,
            features: data.feature_indices(),
            num_classes: data.num_classes(),
            min_objects: self.config.min_objects_per_leaf as f64,
        };

        let indices: Vec<usize> = (0..data.len())
            .filter(|&i| data.class_value(&data.instances()[i]).is_some())
            .collect();
        let mut prior = builder.class_counts(&indices);
        normalize(&mut prior);

        let mut root = builder.build(&indices, &prior).collapse();
        if let Some(z) = z {
            root = root.prune(z, cf);
        }

        debug!(
            "DecisionTree grown: {} leaves, depth {}",
            root.num_leaves(),
            root.depth()
        );
        self.root = Some(root);
        self.header = Some(header);
        Ok(())
    }

    fn distribution(&self, instance: &Instance) -> Result<Vec<f64>> {
        fitted_header(self.header.as_ref(), instance)?;
        let root = self.root.as_ref().ok_or(VoteError::ModelNotTrained)?;
        Ok(root.distribution(instance).to_vec())
    }

    fn header(&self) -> Option<&Dataset> {
        self.header.as_ref()
    }
}
