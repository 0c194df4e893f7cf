//! Transform trait for spatial coordinate transformations.

use burn::tensor::Tensor;
use burn::tensor::backend::Backend;

/// Transform trait for spatial coordinate transformations.
///
/// Maps points from one physical space to another. Resampling maps each
/// output-grid point through a transform into the input image's space, so
/// a registration transform maps fixed-image points to moving-image points.
///
/// # Type Parameters
/// * `B` - The tensor backend
/// * `D` - The spatial dimensionality (2 or 3)
pub trait Transform<B: Backend, const D: usize> {
    /// Apply the transform to a batch of physical points.
    ///
    /// # Arguments
    /// * `points` - Tensor of shape `[Batch, D]`, columns (x, y, z)
    ///
    /// # Returns
    /// Tensor of shape `[Batch, D]` containing the transformed points
    fn transform_points(&self, points: Tensor<B, 2>) -> Tensor<B, 2>;
}
