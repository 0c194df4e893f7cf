//! Image filters: smoothing, shrinking, resampling, intensity and
//! morphological operations.

pub mod gaussian;
pub mod shrink;
pub mod resample;
pub mod normalize;
pub mod intensity;
pub mod morphology;

pub use gaussian::GaussianFilter;
pub use shrink::ShrinkFilter;
pub use resample::resample;
pub use normalize::normalize;
pub use intensity::{binary_threshold, invert, subtract, mask};
pub use morphology::{dilate, erode, close, open};
