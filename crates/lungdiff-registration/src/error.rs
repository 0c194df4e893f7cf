//! Error types for registration operations.

use thiserror::Error;
use lungdiff_core::CoreError;

/// Main error type for registration operations.
#[derive(Error, Debug)]
pub enum RegistrationError {
    /// The metric sample was unusable: empty region, too few samples, or
    /// non-finite intensity values.
    #[error("Degenerate sample: {0}")]
    DegenerateSample(String),

    /// Optimization produced non-finite parameters or field values.
    #[error("Optimization diverged: {0}")]
    OptimizationDivergence(String),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Error from the image model (geometry mismatch, bad parameter).
    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Result type for registration operations.
pub type Result<T> = std::result::Result<T, RegistrationError>;

impl RegistrationError {
    /// Create a degenerate sample error.
    pub fn degenerate_sample(msg: impl Into<String>) -> Self {
        Self::DegenerateSample(msg.into())
    }

    /// Create an optimization divergence error.
    pub fn divergence(msg: impl Into<String>) -> Self {
        Self::OptimizationDivergence(msg.into())
    }

    /// Create an invalid configuration error.
    pub fn invalid_configuration(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RegistrationError::degenerate_sample("empty fixed region");
        assert_eq!(err.to_string(), "Degenerate sample: empty fixed region");
        assert!(matches!(err, RegistrationError::DegenerateSample(_)));
    }
}
