//! Interpolators for sampling values at continuous voxel coordinates.

pub mod trait_;
pub mod linear;
pub mod bspline;

pub use trait_::Interpolator;
pub use linear::LinearInterpolator;
pub use bspline::BSplineInterpolator;
