//! Interpolator trait for sampling values at continuous coordinates.

use burn::tensor::Tensor;
use burn::tensor::backend::Backend;

/// Interpolator trait for sampling values at continuous coordinates.
///
/// Interpolators sample image values at non-integer indices, which is
/// the core primitive behind registration, resampling and warping.
/// Out-of-range indices are clamped to the border (replicate semantics);
/// callers that need a fill value mask afterwards.
///
/// # Type Parameters
/// * `B` - The tensor backend
pub trait Interpolator<B: Backend> {
    /// Interpolate values from a tensor at given continuous indices.
    ///
    /// # Arguments
    /// * `data` - The source tensor (3D volume `[Z, Y, X]` or 2D image `[Y, X]`)
    /// * `indices` - The indices at which to interpolate `[Batch, Rank]`,
    ///               columns (x, y, z) ordered
    ///
    /// # Returns
    /// Tensor of sampled values `[Batch]`
    fn interpolate<const D: usize>(&self, data: &Tensor<B, D>, indices: Tensor<B, 2>) -> Tensor<B, 1>;
}
