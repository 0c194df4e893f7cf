//! Volume I/O collaborators.
//!
//! File formats and readers live outside this workspace; the pipeline
//! only needs something that can produce and consume volumes. Failures
//! surface as [`PipelineError::IoFailure`] and abort the run like any
//! stage error.
//!
//! [`PipelineError::IoFailure`]: crate::error::PipelineError::IoFailure

use burn::tensor::backend::Backend;
use lungdiff_core::Image;
use crate::error::Result;

/// Produces the input volumes.
pub trait VolumeSource<B: Backend> {
    fn load(&self) -> Result<Image<B, 3>>;
}

/// Consumes the difference volume.
pub trait VolumeSink<B: Backend> {
    fn write(&mut self, image: &Image<B, 3>) -> Result<()>;
}
