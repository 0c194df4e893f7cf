//! Volume registration stages.
//!
//! Two stages built from shared pieces: an affine stage that maximizes
//! mutual information with regular-step gradient ascent, and a demons
//! stage that grows a dense displacement field from intensity
//! differences. Both consume and produce [`lungdiff_core::Image`]
//! volumes and report progress through plain callbacks.

pub mod error;
pub mod progress;
pub mod sampling;
pub mod metric;
pub mod optimizer;
pub mod result;
pub mod affine;
pub mod histogram;
pub mod demons;

pub use error::{RegistrationError, Result};
pub use progress::{IterationCallback, log_progress};
pub use metric::{ImageMetric, MutualInformationMetric, MetricSample};
pub use optimizer::{RegularStepGradientDescent, OptimizerOutcome, StopCondition, central_difference};
pub use result::RegistrationResult;
pub use affine::{AffineRegistration, AffineRegistrationConfig, moments_init, center_of_mass};
pub use histogram::HistogramMatcher;
pub use demons::{DemonsRegistration, DemonsRegistrationConfig};
