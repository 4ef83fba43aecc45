//! Error types for the anofox-holtwinters library.

use thiserror::Error;

/// Result type alias for smoothing operations.
pub type Result<T> = std::result::Result<T, ForecastError>;

/// Errors that can occur while building, fitting or simulating a model.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ForecastError {
    /// Input data is empty.
    #[error("empty input data")]
    EmptyData,

    /// Insufficient data points for the operation.
    #[error("insufficient data: need at least {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Model specification is inconsistent.
    #[error("invalid model specification: {0}")]
    InvalidSpecification(String),

    /// Multiplicative components or transforms applied to non-positive data.
    #[error("non-positive data: {0}")]
    NonPositiveData(String),

    /// Only one-dimensional series can be smoothed.
    #[error("only univariate data is supported, got {dimensions} dimensions")]
    NotUnivariate { dimensions: usize },

    /// Dimension mismatch between data structures.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Anchor or location could not be resolved against the series index.
    #[error("invalid anchor: {0}")]
    InvalidAnchor(String),

    /// Timestamp-related error.
    #[error("timestamp error: {0}")]
    TimestampError(String),

    /// Model has not been fitted yet.
    #[error("model must be fitted before prediction")]
    FitRequired,

    /// Missing values detected when not allowed.
    #[error("missing values detected in data")]
    MissingValues,

    /// Frequency inference failed.
    #[error("could not infer frequency: {0}")]
    FrequencyInference(String),

    /// Index out of bounds.
    #[error("index out of bounds: {index} (size: {size})")]
    IndexOutOfBounds { index: usize, size: usize },

    /// Computation error (e.g., numerical issues).
    #[error("computation error: {0}")]
    ComputationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_are_descriptive() {
        let err = ForecastError::EmptyData;
        assert_eq!(err.to_string(), "empty input data");

        let err = ForecastError::InsufficientData { needed: 8, got: 5 };
        assert_eq!(err.to_string(), "insufficient data: need at least 8, got 5");

        let err = ForecastError::NotUnivariate { dimensions: 2 };
        assert_eq!(
            err.to_string(),
            "only univariate data is supported, got 2 dimensions"
        );

        let err = ForecastError::DimensionMismatch {
            expected: 7,
            got: 6,
        };
        assert_eq!(err.to_string(), "dimension mismatch: expected 7, got 6");

        let err = ForecastError::InvalidSpecification(
            "damped trend requires a trend component".to_string(),
        );
        assert_eq!(
            err.to_string(),
            "invalid model specification: damped trend requires a trend component"
        );

        let err = ForecastError::FitRequired;
        assert_eq!(err.to_string(), "model must be fitted before prediction");
    }

    #[test]
    fn errors_are_clonable_and_comparable() {
        let err1 = ForecastError::NonPositiveData("multiplicative trend".to_string());
        let err2 = err1.clone();
        assert_eq!(err1, err2);
    }
}
