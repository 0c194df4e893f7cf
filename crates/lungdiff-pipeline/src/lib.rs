//! Lung change detection over longitudinal CT volumes.
//!
//! Wires the stage crates into one pipeline: segment the lungs, mask,
//! linearly register the later scan onto the earlier one, refine with
//! demons deformable registration, and subtract. The result is a
//! difference volume highlighting interval change.

pub mod config;
pub mod detector;
pub mod error;
pub mod io;

pub use config::{PipelineConfig, SegmentSettings, AffineSettings, DemonsSettings};
pub use detector::ChangeDetector;
pub use error::{PipelineError, Result};
pub use io::{VolumeSource, VolumeSink};
