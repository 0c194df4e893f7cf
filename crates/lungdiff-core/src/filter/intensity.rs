//! Pointwise intensity operations: thresholding, inversion, subtraction
//! and masking.

use burn::tensor::backend::Backend;
use crate::error::Result;
use crate::image::Image;

/// Binary threshold: voxels inside `[lower, upper]` map to `inside_value`,
/// the rest to `outside_value`.
pub fn binary_threshold<B: Backend, const D: usize>(
    image: &Image<B, D>,
    lower: f32,
    upper: f32,
    inside_value: f32,
    outside_value: f32,
) -> Image<B, D> {
    let data = image.data().clone();
    let in_lower = data.clone().greater_equal_elem(lower).float();
    let in_upper = data.lower_equal_elem(upper).float();
    let inside = in_lower * in_upper;

    let out = inside.clone().mul_scalar(inside_value)
        + inside.neg().add_scalar(1.0).mul_scalar(outside_value);
    image.with_data(out)
}

/// Invert intensities against a maximum: `out = maximum - in`.
pub fn invert<B: Backend, const D: usize>(image: &Image<B, D>, maximum: f32) -> Image<B, D> {
    image.with_data(image.data().clone().neg().add_scalar(maximum))
}

/// Voxelwise difference `a - b`.
///
/// # Errors
/// Returns [`CoreError::GeometryMismatch`](crate::error::CoreError) when
/// the images do not share a grid.
pub fn subtract<B: Backend, const D: usize>(
    a: &Image<B, D>,
    b: &Image<B, D>,
) -> Result<Image<B, D>> {
    a.expect_same_grid(b)?;
    Ok(a.with_data(a.data().clone() - b.data().clone()))
}

/// Keep voxels where the mask is positive, set the rest to `outside_value`.
///
/// # Errors
/// Returns [`CoreError::GeometryMismatch`](crate::error::CoreError) when
/// image and mask do not share a grid.
pub fn mask<B: Backend, const D: usize>(
    image: &Image<B, D>,
    mask_image: &Image<B, D>,
    outside_value: f32,
) -> Result<Image<B, D>> {
    image.expect_same_grid(mask_image)?;
    let keep = mask_image.data().clone().greater_elem(0.0).float();
    let out = image.data().clone() * keep.clone()
        + keep.neg().add_scalar(1.0).mul_scalar(outside_value);
    Ok(image.with_data(out))
}
