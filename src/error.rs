//! Error types for the bank-tree explorer

use thiserror::Error;

/// Result type alias for explorer operations
pub type Result<T> = std::result::Result<T, BankTreeError>;

/// Main error type for the explorer
#[derive(Error, Debug)]
pub enum BankTreeError {
    #[error("Unknown attribute: {0}")]
    UnknownAttribute(String),

    #[error("Invalid label column '{column}': {reason}")]
    InvalidLabelColumn { column: String, reason: String },

    #[error(
        "Schema mismatch between training and holdout: missing in holdout {missing_in_holdout:?}, missing in training {missing_in_training:?}"
    )]
    SchemaMismatch {
        missing_in_holdout: Vec<String>,
        missing_in_training: Vec<String>,
    },

    #[error("ARFF error at line {line}: {message}")]
    Arff { line: usize, message: String },

    #[error("Data error: {0}")]
    DataError(String),

    #[error("Training error: {0}")]
    TrainingError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Model not fitted")]
    ModelNotFitted,

    #[error("Invalid parameter: {name} = {value}, {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },
}

impl BankTreeError {
    pub(crate) fn arff(line: usize, message: impl Into<String>) -> Self {
        BankTreeError::Arff {
            line,
            message: message.into(),
        }
    }
}

impl From<polars::error::PolarsError> for BankTreeError {
    fn from(err: polars::error::PolarsError) -> Self {
        BankTreeError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for BankTreeError {
    fn from(err: serde_json::Error) -> Self {
        BankTreeError::SerializationError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for BankTreeError {
    fn from(err: ndarray::ShapeError) -> Self {
        BankTreeError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}
