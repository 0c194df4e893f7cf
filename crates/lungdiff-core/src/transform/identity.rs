//! Identity transform.

use burn::tensor::Tensor;
use burn::tensor::backend::Backend;
use super::trait_::Transform;

/// Identity transform that leaves points unchanged.
///
/// Used when resampling onto a new grid without any spatial mapping, for
/// example when changing resolution of a displacement field.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityTransform;

impl IdentityTransform {
    /// Create a new identity transform.
    pub fn new() -> Self {
        Self
    }
}

impl<B: Backend, const D: usize> Transform<B, D> for IdentityTransform {
    fn transform_points(&self, points: Tensor<B, 2>) -> Tensor<B, 2> {
        points
    }
}
