//! Error types for multi-class SVM training and prediction

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SVMError {
    #[error("Unknown decomposition method: {0:?} (expected \"ovo\" or \"ovr\")")]
    UnknownMethod(String),

    #[error("Unknown kernel: {0:?} (expected \"linear\", \"rbf\", \"poly\" or \"sigmoid\")")]
    UnknownKernel(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Estimator is not fitted; call fit before using it")]
    NotFitted,

    #[error("Length mismatch: {samples} samples but {labels} labels")]
    LengthMismatch { samples: usize, labels: usize },

    #[error("Need at least 2 distinct classes to fit, got {0}")]
    TooFewClasses(usize),

    #[error("Optimization failed: {0}")]
    OptimizationError(String),

    #[error("Invalid dataset: {0}")]
    InvalidDataset(String),

    #[error("Invalid label: expected -1 or +1, got {0}")]
    InvalidLabel(f64),

    #[error("Empty dataset")]
    EmptyDataset,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// Coarse classification of [`SVMError`] variants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad method name, kernel name, hyperparameter or worker setting
    Configuration,
    /// Estimator used before a successful fit
    NotFitted,
    /// Input data rejected (shapes, class count, non-finite values)
    Value,
    /// The binary solver could not produce a model
    Solver,
    /// Reading, parsing or writing files failed
    Io,
}

impl SVMError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SVMError::UnknownMethod(_)
            | SVMError::UnknownKernel(_)
            | SVMError::InvalidParameter(_) => ErrorKind::Configuration,
            SVMError::NotFitted => ErrorKind::NotFitted,
            SVMError::LengthMismatch { .. }
            | SVMError::TooFewClasses(_)
            | SVMError::InvalidDataset(_)
            | SVMError::InvalidLabel(_)
            | SVMError::EmptyDataset => ErrorKind::Value,
            SVMError::OptimizationError(_) => ErrorKind::Solver,
            SVMError::IoError(_) | SVMError::ParseError(_) | SVMError::SerializationError(_) => {
                ErrorKind::Io
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, SVMError>;
