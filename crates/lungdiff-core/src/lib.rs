//! Core image model for lung change detection.
//!
//! Provides the scalar volume type with voxel-grid geometry, spatial
//! primitives, interpolators, spatial transforms and the image filters
//! the segmentation and registration stages build on.
//!
//! # Conventions
//! Tensor data is stored [z, y, x] with x the fastest axis. Geometry
//! attributes (origin, spacing, direction) and batched point tensors are
//! (x, y, z) ordered.

pub mod error;
pub mod spatial;
pub mod image;
pub mod interpolation;
pub mod transform;
pub mod filter;

pub use error::{CoreError, Result};
pub use image::{Image, index_grid};
pub use spatial::{Point, Vector, Spacing, Direction};
pub use transform::{Transform, AffineTransform, DisplacementField};
pub use interpolation::{Interpolator, LinearInterpolator, BSplineInterpolator};
