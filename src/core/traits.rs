//! Core traits for the classification pipeline

use crate::core::{Dataset, Instance, Prediction, Result, VoteError};

/// A classifier that is fitted on a labelled dataset and then predicts class
/// distributions for single instances.
pub trait Classifier {
    /// Human readable algorithm name
    fn name(&self) -> &str;

    /// Fit the classifier, replacing any previously fitted state
    fn fit(&mut self, data: &Dataset) -> Result<()>;

    /// Probability estimate for every class label of the training schema
    fn distribution(&self, instance: &Instance) -> Result<Vec<f64>>;

    /// Schema seen during fitting, `None` until the classifier is trained
    fn header(&self) -> Option<&Dataset>;

    /// Predict the most probable class label
    fn predict(&self, instance: &Instance) -> Result<Prediction> {
        Ok(Prediction::from_distribution(self.distribution(instance)?))
    }

    fn is_fitted(&self) -> bool {
        self.header().is_some()
    }
}

/// Check that a training set can be used by a nominal-class classifier and
/// return its header.
pub(crate) fn training_header(name: &str, data: &Dataset) -> Result<Dataset> {
    let class_attribute = data.class_attribute().ok_or_else(|| {
        VoteError::TrainingError(format!("{name}: dataset has no class attribute"))
    })?;

    if !class_attribute.is_nominal() {
        return Err(VoteError::TrainingError(format!(
            "{name}: cannot handle numeric class attribute '{}'",
            class_attribute.name
        )));
    }

    if class_attribute.num_values() == 0 {
        return Err(VoteError::TrainingError(format!(
            "{name}: class attribute '{}' has no values",
            class_attribute.name
        )));
    }

    if data.is_empty() {
        return Err(VoteError::TrainingError(format!(
            "{name}: training set is empty"
        )));
    }

    Ok(data.header())
}

/// Return the fitted header, failing if the classifier is untrained or the
/// instance does not match its schema.
pub(crate) fn fitted_header<'a>(
    header: Option<&'a Dataset>,
    instance: &Instance,
) -> Result<&'a Dataset> {
    let header = header.ok_or(VoteError::ModelNotTrained)?;
    if instance.len() != header.num_attributes() {
        return Err(VoteError::EvaluationError(format!(
            "instance has {} values, model expects {}",
            instance.len(),
            header.num_attributes()
        )));
    }
    Ok(header)
}
