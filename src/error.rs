//! Error types for the mbti-nlp crate

use thiserror::Error;

/// Result type alias for mbti-nlp operations
pub type Result<T> = std::result::Result<T, MbtiError>;

/// Main error type for the crate
#[derive(Error, Debug)]
pub enum MbtiError {
    #[error("Data integrity error: {0}")]
    DataIntegrity(String),

    #[error("Pipeline not fitted: {0}")]
    Unfitted(String),

    #[error("Stopword resource unavailable: {0}")]
    ResourceUnavailable(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Training error: {0}")]
    Training(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Thread pool error: {0}")]
    ThreadPool(String),
}

impl From<serde_json::Error> for MbtiError {
    fn from(err: serde_json::Error) -> Self {
        MbtiError::Serialization(err.to_string())
    }
}
