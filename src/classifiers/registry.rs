//! Fixed list of classifiers evaluated by the pipeline

use crate::classifiers::{
    AdaBoost, AdaBoostConfig, DecisionTree, DecisionTreeConfig, KNearestNeighbors, KnnConfig,
    LogisticConfig, LogisticRegression, Model, NaiveBayes, VotingClassifier,
};
use serde::{Deserialize, Serialize};

/// Hyperparameters of the registered classifiers.
///
/// Every call to [`ModelRegistry::classifiers`] builds fresh, untrained
/// instances from these settings.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ModelRegistry {
    pub adaboost: AdaBoostConfig,
    pub logistic: LogisticConfig,
    pub knn: KnnConfig,
    pub decision_tree: DecisionTreeConfig,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// NaiveBayes, AdaBoost, LogisticRegression, KNearestNeighbors and
    /// DecisionTree, in that order
    pub fn classifiers(&self) -> Vec<Model> {
        vec![
            Model::NaiveBayes(NaiveBayes::new()),
            Model::AdaBoost(AdaBoost::new(self.adaboost)),
            Model::LogisticRegression(LogisticRegression::new(self.logistic)),
            Model::KNearestNeighbors(KNearestNeighbors::new(self.knn)),
            Model::DecisionTree(DecisionTree::new(self.decision_tree)),
        ]
    }

    /// Majority vote over a fresh set of [`classifiers`](Self::classifiers)
    pub fn voting_classifier(&self) -> VotingClassifier {
        VotingClassifier::new(self.classifiers())
    }
}

/// Registered classifiers with default hyperparameters
pub fn get_classifiers() -> Vec<Model> {
    ModelRegistry::default().classifiers()
}

/// Voting ensemble over the default registered classifiers
pub fn create_voting_classifier() -> VotingClassifier {
    ModelRegistry::default().voting_classifier()
}
