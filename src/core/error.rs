//! Error types for the classification pipeline

use thiserror::Error;

#[derive(Error, Debug)]
pub enum VoteError {
    #[error("Load error: {0}")]
    LoadError(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Training error: {0}")]
    TrainingError(String),

    #[error("Evaluation error: {0}")]
    EvaluationError(String),

    #[error("Model not trained")]
    ModelNotTrained,

    #[error("Empty dataset")]
    EmptyDataset,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

pub type Result<T> = std::result::Result<T, VoteError>;
