//! Error types for the caruana-forecast library.

use thiserror::Error;

/// Result type alias for ensemble operations.
pub type Result<T> = std::result::Result<T, EnsembleError>;

/// Errors that can occur while building, tuning or evaluating an ensemble.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EnsembleError {
    /// Input sequences or matrices do not line up.
    #[error("shape mismatch: expected {expected}, got {got}")]
    ShapeMismatch { expected: usize, got: usize },

    /// No base models were supplied.
    #[error("no models selected")]
    EmptyModelSet,

    /// Requested ensemble size is zero or outside the search domain.
    #[error("invalid ensemble size budget {budget}: {reason}")]
    InvalidBudget { budget: usize, reason: String },

    /// Input data is empty.
    #[error("empty input data")]
    EmptyData,

    /// Insufficient data points for the operation.
    #[error("insufficient data: need at least {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Ensemble has not been fitted yet.
    #[error("ensemble must be fitted before prediction")]
    FitRequired,

    /// Index out of bounds.
    #[error("index out of bounds: {index} (size: {size})")]
    IndexOutOfBounds { index: usize, size: usize },

    /// Computation error (e.g., numerical issues).
    #[error("computation error: {0}")]
    ComputationError(String),

    /// Dataset name not present in the registry.
    #[error("unknown dataset: {0}")]
    UnknownDataset(String),

    /// Model name not present in the registry.
    #[error("unknown model: {0}")]
    UnknownModel(String),

    /// Reading a file failed.
    #[error("failed to read {path}: {message}")]
    Io { path: String, message: String },

    /// A file was read but its contents could not be interpreted.
    #[error("failed to parse {path}: {message}")]
    Parse { path: String, message: String },

    /// Registry or pipeline configuration is invalid.
    #[error("configuration error: {0}")]
    Config(String),
}

impl EnsembleError {
    pub(crate) fn zero_budget() -> Self {
        Self::InvalidBudget {
            budget: 0,
            reason: "must be at least 1".to_string(),
        }
    }

    /// I/O failure on `path`.
    pub fn io(path: impl AsRef<std::path::Path>, err: impl std::fmt::Display) -> Self {
        Self::Io {
            path: path.as_ref().display().to_string(),
            message: err.to_string(),
        }
    }

    /// Unreadable contents in `path`.
    pub fn parse(path: impl AsRef<std::path::Path>, err: impl std::fmt::Display) -> Self {
        Self::Parse {
            path: path.as_ref().display().to_string(),
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_are_descriptive() {
        let err = EnsembleError::EmptyModelSet;
        assert_eq!(err.to_string(), "no models selected");

        let err = EnsembleError::ShapeMismatch {
            expected: 4,
            got: 3,
        };
        assert_eq!(err.to_string(), "shape mismatch: expected 4, got 3");

        let err = EnsembleError::InvalidBudget {
            budget: 0,
            reason: "must be at least 1".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "invalid ensemble size budget 0: must be at least 1"
        );

        let err = EnsembleError::InsufficientData { needed: 2, got: 1 };
        assert_eq!(err.to_string(), "insufficient data: need at least 2, got 1");

        let err = EnsembleError::io("preds/a.json", "not found");
        assert_eq!(err.to_string(), "failed to read preds/a.json: not found");
    }

    #[test]
    fn errors_are_clonable_and_comparable() {
        let err1 = EnsembleError::UnknownDataset("Energy".to_string());
        let err2 = err1.clone();
        assert_eq!(err1, err2);
    }
}
