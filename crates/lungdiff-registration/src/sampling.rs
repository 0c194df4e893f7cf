//! Random spatial sampling of a voxel grid.

use burn::tensor::{Tensor, Distribution};
use burn::tensor::backend::Backend;

/// Draw `count` random continuous voxel indices, uniform over the grid.
///
/// Columns are (x, y, z) ordered to match the batched coordinate mapping
/// convention; `shape` is [z, y, x].
pub fn draw_indices<B: Backend>(
    shape: [usize; 3],
    count: usize,
    device: &B::Device,
) -> Tensor<B, 2> {
    let unit = Tensor::<B, 2>::random([count, 3], Distribution::Uniform(0.0, 1.0), device);
    let extents = Tensor::<B, 2>::from_floats(
        [[
            (shape[2] - 1) as f32,
            (shape[1] - 1) as f32,
            (shape[0] - 1) as f32,
        ]],
        device,
    );
    unit * extents
}
