//! Majority-vote meta-classifier

use crate::classifiers::Model;
use crate::core::traits::{fitted_header, training_header};
use crate::core::{Classifier, Dataset, Instance, Result, VoteError};
use log::debug;

/// Winning label among `votes`.
///
/// Each entry is one member's predicted class. The label with the most votes
/// wins; among tied labels the one whose first vote comes earliest wins.
/// Returns `None` when there are no votes.
pub fn majority_vote(votes: &[usize], num_classes: usize) -> Option<usize> {
    let mut counts = vec![0usize; num_classes];
    let mut first_seen = vec![usize::MAX; num_classes];
    for (position, &label) in votes.iter().enumerate() {
        if label >= num_classes {
            continue;
        }
        counts[label] += 1;
        first_seen[label] = first_seen[label].min(position);
    }

    (0..num_classes)
        .filter(|&label| counts[label] > 0)
        .max_by(|&a, &b| {
            counts[a]
                .cmp(&counts[b])
                .then_with(|| first_seen[b].cmp(&first_seen[a]))
        })
}

/// Ensemble that fits every member on the same data and predicts the
/// majority label of their predictions.
#[derive(Debug, Clone, Default)]
pub struct VotingClassifier {
    members: Vec<Model>,
    header: Option<Dataset>,
}

impl VotingClassifier {
    pub fn new(members: Vec<Model>) -> Self {
        Self {
            members,
            header: None,
        }
    }

    pub fn members(&self) -> &[Model] {
        &self.members
    }

    /// Class index predicted by each member, in member order
    pub fn votes(&self, instance: &Instance) -> Result<Vec<usize>> {
        self.members
            .iter()
            .map(|member| member.predict(instance).map(|p| p.class_index))
            .collect()
    }
}

impl Classifier for VotingClassifier {
    fn name(&self) -> &str {
        "Vote"
    }

    fn fit(&mut self, data: &Dataset) -> Result<()> {
        let header = training_header(self.name(), data)?;
        if self.members.is_empty() {
            return Err(VoteError::TrainingError(
                "Vote: ensemble has no members".to_string(),
            ));
        }

        // Members are fitted on copies so a failure leaves the previous fit intact
        let mut members = self.members.clone();
        for member in &mut members {
            debug!("Vote: fitting member {}", member.name());
            member.fit(data)?;
        }

        self.members = members;
        self.header = Some(header);
        Ok(())
    }

    fn distribution(&self, instance: &Instance) -> Result<Vec<f64>> {
        let header = fitted_header(self.header.as_ref(), instance)?;
        let num_classes = header.num_classes();

        let votes = self.votes(instance)?;
        let winner = majority_vote(&votes, num_classes).ok_or_else(|| {
            VoteError::EvaluationError("Vote: no member produced a prediction".to_string())
        })?;

        let mut dist = vec![0.0; num_classes];
        dist[winner] = 1.0;
        Ok(dist)
    }

    fn header(&self) -> Option<&Dataset> {
        self.header.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifiers::{
        KNearestNeighbors, KnnConfig, LogisticConfig, LogisticRegression, NaiveBayes,
    };
    use crate::core::Attribute;

    #[test]
    fn test_majority_wins() {
        assert_eq!(majority_vote(&[1, 0, 1, 1, 0], 2), Some(1));
        assert_eq!(majority_vote(&[2, 2, 0, 1, 1, 1], 3), Some(1));
    }

    #[test]
    fn test_ties_follow_member_order() {
        // Five voters over three classes: 2 and 0 tie, 2 voted first
        assert_eq!(majority_vote(&[2, 0, 1, 0, 2], 3), Some(2));
        // All distinct: the first member decides
        assert_eq!(majority_vote(&[3, 1, 4, 0, 2], 5), Some(3));
        assert_eq!(majority_vote(&[0, 1], 2), Some(0));
        assert_eq!(majority_vote(&[1, 0], 2), Some(1));
    }

    #[test]
    fn test_no_votes() {
        assert_eq!(majority_vote(&[], 2), None);
    }

    #[test]
    fn test_vote_one_hot_distribution() {
        let mut data = Dataset::new(
            "line",
            vec![
                Attribute::numeric("x"),
                Attribute::nominal("y", vec!["neg".into(), "pos".into()]),
            ],
        );
        for (x, class) in [(-3.0, 0.0), (-2.0, 0.0), (-1.0, 0.0), (1.0, 1.0), (2.0, 1.0), (3.0, 1.0)] {
            data.push(Instance::new(vec![Some(x), Some(class)])).unwrap();
        }
        data.set_class_index(1).unwrap();

        let mut vote = VotingClassifier::new(vec![
            Model::NaiveBayes(NaiveBayes::new()),
            Model::KNearestNeighbors(KNearestNeighbors::new(KnnConfig { k: 1 })),
        ]);
        vote.fit(&data).unwrap();
        assert!(vote.is_fitted());

        let probe = Instance::new(vec![Some(2.5), None]);
        assert_eq!(vote.votes(&probe).unwrap(), vec![1, 1]);
        assert_eq!(vote.distribution(&probe).unwrap(), vec![0.0, 1.0]);
    }

    #[test]
    fn test_failed_refit_keeps_previous_fit() {
        let schema = vec![
            Attribute::numeric("x"),
            Attribute::nominal("y", vec!["neg".into(), "pos".into()]),
        ];
        let mut data = Dataset::new("line", schema.clone());
        for (x, class) in [(-3.0, 0.0), (-2.0, 0.0), (-1.0, 0.0), (1.0, 1.0), (2.0, 1.0), (3.0, 1.0)] {
            data.push(Instance::new(vec![Some(x), Some(class)])).unwrap();
        }
        data.set_class_index(1).unwrap();

        // Naive Bayes accepts unlabelled rows, logistic regression does not
        let mut unlabelled = Dataset::new("unlabelled", schema);
        for x in [10.0, 20.0, 30.0] {
            unlabelled.push(Instance::new(vec![Some(x), None])).unwrap();
        }
        unlabelled.set_class_index(1).unwrap();

        let mut vote = VotingClassifier::new(vec![
            Model::NaiveBayes(NaiveBayes::new()),
            Model::LogisticRegression(LogisticRegression::new(LogisticConfig::default())),
        ]);
        vote.fit(&data).unwrap();
        let instance = Instance::new(vec![Some(2.5), None]);
        let before = vote.distribution(&instance).unwrap();

        assert!(matches!(vote.fit(&unlabelled), Err(VoteError::TrainingError(_))));
        assert_eq!(vote.header().unwrap().relation(), "line");
        for member in vote.members() {
            assert_eq!(member.header().unwrap().relation(), "line", "{}", member.name());
        }
        assert_eq!(vote.distribution(&instance).unwrap(), before);
    }

    #[test]
    fn test_empty_ensemble_rejected() {
        let mut data = Dataset::new(
            "d",
            vec![Attribute::nominal("y", vec!["a".into(), "b".into()])],
        );
        data.push(Instance::new(vec![Some(0.0)])).unwrap();
        data.set_class_index(0).unwrap();

        let mut vote = VotingClassifier::new(Vec::new());
        assert!(matches!(vote.fit(&data), Err(VoteError::TrainingError(_))));
    }
}
