//! Optimizers for parametric registration.

pub mod gradient;
pub mod regular_step;

pub use gradient::central_difference;
pub use regular_step::{RegularStepGradientDescent, OptimizerOutcome, StopCondition};
