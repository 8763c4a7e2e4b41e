//! Core type definitions: attributes, instances, datasets and predictions

use crate::core::{Result, VoteError};
use crate::utils::max_index;
use rand::seq::SliceRandom;
use rand::Rng;

/// Value domain of a single attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeKind {
    /// Real-valued attribute
    Numeric,
    /// Categorical attribute; values keep the order in which they were first seen
    Nominal(Vec<String>),
}

/// Named column of a dataset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub kind: AttributeKind,
}

impl Attribute {
    /// Create a numeric attribute
    pub fn numeric(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: AttributeKind::Numeric,
        }
    }

    /// Create a nominal attribute with the given value domain
    pub fn nominal(name: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            name: name.into(),
            kind: AttributeKind::Nominal(values),
        }
    }

    pub fn is_nominal(&self) -> bool {
        matches!(self.kind, AttributeKind::Nominal(_))
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self.kind, AttributeKind::Numeric)
    }

    /// Number of distinct values (0 for numeric attributes)
    pub fn num_values(&self) -> usize {
        match &self.kind {
            AttributeKind::Nominal(values) => values.len(),
            AttributeKind::Numeric => 0,
        }
    }

    /// Label of a nominal value index
    pub fn value(&self, index: usize) -> Option<&str> {
        match &self.kind {
            AttributeKind::Nominal(values) => values.get(index).map(String::as_str),
            AttributeKind::Numeric => None,
        }
    }

    /// Index of a nominal value label
    pub fn index_of_value(&self, value: &str) -> Option<usize> {
        match &self.kind {
            AttributeKind::Nominal(values) => values.iter().position(|v| v == value),
            AttributeKind::Numeric => None,
        }
    }
}

/// A single record. Nominal values are stored as value indices, `None` marks a
/// missing value.
#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    values: Vec<Option<f64>>,
    weight: f64,
}

impl Instance {
    /// Create an instance with unit weight
    pub fn new(values: Vec<Option<f64>>) -> Self {
        Self::with_weight(values, 1.0)
    }

    pub fn with_weight(values: Vec<Option<f64>>, weight: f64) -> Self {
        Self { values, weight }
    }

    /// Value of an attribute, `None` when missing or out of range
    pub fn value(&self, attribute: usize) -> Option<f64> {
        self.values.get(attribute).copied().flatten()
    }

    /// Value of a nominal attribute as a value index
    pub fn nominal_index(&self, attribute: usize) -> Option<usize> {
        self.value(attribute).map(|v| v as usize)
    }

    pub fn is_missing(&self, attribute: usize) -> bool {
        self.value(attribute).is_none()
    }

    pub fn values(&self) -> &[Option<f64>] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn set_weight(&mut self, weight: f64) {
        self.weight = weight;
    }
}

/// In-memory table of instances sharing one schema
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    relation: String,
    attributes: Vec<Attribute>,
    instances: Vec<Instance>,
    class_index: Option<usize>,
}

impl Dataset {
    /// Create an empty dataset with the given schema and no class attribute
    pub fn new(relation: impl Into<String>, attributes: Vec<Attribute>) -> Self {
        Self {
            relation: relation.into(),
            attributes,
            instances: Vec::new(),
            class_index: None,
        }
    }

    pub fn relation(&self) -> &str {
        &self.relation
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn attribute(&self, index: usize) -> Option<&Attribute> {
        self.attributes.get(index)
    }

    pub fn num_attributes(&self) -> usize {
        self.attributes.len()
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn instances(&self) -> &[Instance] {
        &self.instances
    }

    pub fn instance(&self, index: usize) -> Option<&Instance> {
        self.instances.get(index)
    }

    pub(crate) fn instances_mut(&mut self) -> &mut [Instance] {
        &mut self.instances
    }

    /// Append an instance after checking it against the schema
    pub fn push(&mut self, instance: Instance) -> Result<()> {
        if instance.len() != self.attributes.len() {
            return Err(VoteError::InvalidArgument(format!(
                "Instance has {} values, schema has {} attributes",
                instance.len(),
                self.attributes.len()
            )));
        }

        for (attribute, value) in self.attributes.iter().zip(instance.values()) {
            if let (AttributeKind::Nominal(values), Some(v)) = (&attribute.kind, value) {
                if v.fract() != 0.0 || *v < 0.0 || *v as usize >= values.len() {
                    return Err(VoteError::InvalidArgument(format!(
                        "Value index {v} out of range for nominal attribute '{}'",
                        attribute.name
                    )));
                }
            }
        }

        self.instances.push(instance);
        Ok(())
    }

    pub fn class_index(&self) -> Option<usize> {
        self.class_index
    }

    /// Designate the class (label) attribute
    pub fn set_class_index(&mut self, index: usize) -> Result<()> {
        if index >= self.attributes.len() {
            return Err(VoteError::InvalidArgument(format!(
                "Class index {index} out of range for {} attributes",
                self.attributes.len()
            )));
        }
        self.class_index = Some(index);
        Ok(())
    }

    pub fn class_attribute(&self) -> Option<&Attribute> {
        self.class_index.and_then(|i| self.attributes.get(i))
    }

    /// Number of class labels (0 if there is no nominal class attribute)
    pub fn num_classes(&self) -> usize {
        self.class_attribute().map_or(0, Attribute::num_values)
    }

    /// Class label index of an instance
    pub fn class_value(&self, instance: &Instance) -> Option<usize> {
        self.class_index.and_then(|i| instance.nominal_index(i))
    }

    /// Text of a class label index
    pub fn class_label(&self, class: usize) -> Option<&str> {
        self.class_attribute().and_then(|a| a.value(class))
    }

    /// Indices of all non-class attributes
    pub fn feature_indices(&self) -> Vec<usize> {
        (0..self.attributes.len())
            .filter(|&i| Some(i) != self.class_index)
            .collect()
    }

    /// Copy of the schema without any instances
    pub fn header(&self) -> Dataset {
        Self {
            relation: self.relation.clone(),
            attributes: self.attributes.clone(),
            instances: Vec::new(),
            class_index: self.class_index,
        }
    }

    pub fn total_weight(&self) -> f64 {
        self.instances.iter().map(Instance::weight).sum()
    }

    /// Weighted count per class label; instances with a missing class are skipped
    pub fn class_weights(&self) -> Vec<f64> {
        let mut weights = vec![0.0; self.num_classes()];
        for instance in &self.instances {
            if let Some(class) = self.class_value(instance) {
                weights[class] += instance.weight();
            }
        }
        weights
    }

    /// Check that another dataset shares this schema and class designation
    pub fn check_compatible(&self, other: &Dataset) -> std::result::Result<(), String> {
        if self.attributes.len() != other.attributes.len() {
            return Err(format!(
                "attribute count differs: {} vs {}",
                self.attributes.len(),
                other.attributes.len()
            ));
        }
        if self.class_index != other.class_index {
            return Err(format!(
                "class index differs: {:?} vs {:?}",
                self.class_index, other.class_index
            ));
        }
        for (mine, theirs) in self.attributes.iter().zip(&other.attributes) {
            if mine.name != theirs.name {
                return Err(format!(
                    "attribute name differs: '{}' vs '{}'",
                    mine.name, theirs.name
                ));
            }
            if mine.kind != theirs.kind {
                return Err(format!("attribute '{}' has a different type", mine.name));
            }
        }
        Ok(())
    }

    /// Reorder instances with a Fisher-Yates shuffle driven by `rng`
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.instances.shuffle(rng);
    }

    /// Move the instances from `at` onward into a new dataset with the same schema
    pub fn split_off(&mut self, at: usize) -> Dataset {
        let mut tail = self.header();
        tail.instances = self.instances.split_off(at);
        tail
    }
}

/// Prediction result: class distribution and its most probable label
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    /// Index of the predicted class label
    pub class_index: usize,
    /// Probability estimate per class label
    pub distribution: Vec<f64>,
}

impl Prediction {
    /// Build a prediction from a class distribution; ties go to the lowest index
    pub fn from_distribution(distribution: Vec<f64>) -> Self {
        Self {
            class_index: max_index(&distribution),
            distribution,
        }
    }

    /// Probability assigned to the predicted label
    pub fn confidence(&self) -> f64 {
        self.distribution
            .get(self.class_index)
            .copied()
            .unwrap_or(0.0)
    }
}
