//! Classification algorithms
//!
//! Every algorithm implements [`Classifier`]. [`Model`] is the closed set of
//! variants the pipeline works with, including the voting ensemble.

pub mod adaboost;
pub mod decision_tree;
pub mod knn;
pub mod logistic;
pub mod naive_bayes;
pub mod registry;
pub mod vote;

pub use adaboost::{AdaBoost, AdaBoostConfig};
pub use decision_tree::{DecisionTree, DecisionTreeConfig};
pub use knn::{KNearestNeighbors, KnnConfig};
pub use logistic::{LogisticConfig, LogisticRegression};
pub use naive_bayes::NaiveBayes;
pub use registry::{create_voting_classifier, get_classifiers, ModelRegistry};
pub use vote::{majority_vote, VotingClassifier};

use crate::core::{Classifier, Dataset, Instance, Result};

/// Any classifier the pipeline can train and evaluate
#[derive(Debug, Clone)]
pub enum Model {
    NaiveBayes(NaiveBayes),
    AdaBoost(AdaBoost),
    LogisticRegression(LogisticRegression),
    KNearestNeighbors(KNearestNeighbors),
    DecisionTree(DecisionTree),
    Voting(VotingClassifier),
}

impl Model {
    fn inner(&self) -> &dyn Classifier {
        match self {
            Model::NaiveBayes(m) => m,
            Model::AdaBoost(m) => m,
            Model::LogisticRegression(m) => m,
            Model::KNearestNeighbors(m) => m,
            Model::DecisionTree(m) => m,
            Model::Voting(m) => m,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Classifier {
        match self {
            Model::NaiveBayes(m) => m,
            Model::AdaBoost(m) => m,
            Model::LogisticRegression(m) => m,
            Model::KNearestNeighbors(m) => m,
            Model::DecisionTree(m) => m,
            Model::Voting(m) => m,
        }
    }
}

impl Classifier for Model {
    fn name(&self) -> &str {
        self.inner().name()
    }

    fn fit(&mut self, data: &Dataset) -> Result<()> {
        self.inner_mut().fit(data)
    }

    fn distribution(&self, instance: &Instance) -> Result<Vec<f64>> {
        self.inner().distribution(instance)
    }

    fn header(&self) -> Option<&Dataset> {
        self.inner().header()
    }
}

impl From<NaiveBayes> for Model {
    fn from(m: NaiveBayes) -> Self {
        Model::NaiveBayes(m)
    }
}

impl From<AdaBoost> for Model {
    fn from(m: AdaBoost) -> Self {
        Model::AdaBoost(m)
    }
}

impl From<LogisticRegression> for Model {
    fn from(m: LogisticRegression) -> Self {
        Model::LogisticRegression(m)
    }
}

impl From<KNearestNeighbors> for Model {
    fn from(m: KNearestNeighbors) -> Self {
        Model::KNearestNeighbors(m)
    }
}

impl From<DecisionTree> for Model {
    fn from(m: DecisionTree) -> Self {
        Model::DecisionTree(m)
    }
}

impl From<VotingClassifier> for Model {
    fn from(m: VotingClassifier) -> Self {
        Model::Voting(m)
    }
}
