//! Error types for image and filter operations.

use thiserror::Error;

/// Main error type for core image operations.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Inputs with incompatible grids or dimensionality. Names the
    /// attribute that differs (shape, origin, spacing or direction).
    #[error("geometry mismatch: {attribute} expected {expected}, got {actual}")]
    GeometryMismatch {
        attribute: String,
        expected: String,
        actual: String,
    },

    /// A parameter outside its documented domain.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

impl CoreError {
    /// Create a geometry-mismatch error for one differing attribute.
    pub fn geometry_mismatch(
        attribute: &str,
        expected: impl std::fmt::Debug,
        actual: impl std::fmt::Debug,
    ) -> Self {
        Self::GeometryMismatch {
            attribute: attribute.to_string(),
            expected: format!("{:?}", expected),
            actual: format!("{:?}", actual),
        }
    }

    /// Create an invalid-parameter error.
    pub fn invalid_parameter(msg: impl Into<String>) -> Self {
        Self::InvalidParameter(msg.into())
    }
}
