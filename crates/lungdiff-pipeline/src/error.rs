//! Pipeline-level errors.

use thiserror::Error;
use lungdiff_core::CoreError;
use lungdiff_registration::RegistrationError;

/// Errors that abort the change-detection pipeline.
///
/// Stage errors propagate unmodified; the orchestrator logs the
/// description and stops without producing output.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A volume collaborator failed to load or write.
    #[error("i/o failure: {0}")]
    IoFailure(String),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Registration(#[from] RegistrationError),
}

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

impl PipelineError {
    /// Create an I/O failure from a collaborator's message.
    pub fn io_failure(msg: impl Into<String>) -> Self {
        Self::IoFailure(msg.into())
    }
}
