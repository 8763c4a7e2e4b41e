//! Rust implementation of a majority-vote classifier comparison
//!
//! Loads a delimited dataset, splits it into training and test partitions,
//! evaluates five classifiers individually and then their majority-vote
//! ensemble.

pub mod api;
pub mod classifiers;
pub mod core;
pub mod data;
pub mod evaluation;
pub mod report;
pub mod utils;

// Re-export main types for convenience
pub use crate::api::{evaluate_model, train_model, Pipeline, PipelineConfig};
pub use crate::classifiers::{create_voting_classifier, get_classifiers, Model, ModelRegistry};
pub use crate::core::traits::*;
pub use crate::core::types::*;
pub use crate::core::{Result, VoteError};
pub use crate::data::{train_test_split, CsvLoader, DataLoader};
pub use crate::evaluation::{Evaluation, EvaluationSummary};
pub use crate::report::PipelineReport;

// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
