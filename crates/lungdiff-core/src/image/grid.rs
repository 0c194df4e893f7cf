//! Dense index-grid generation.
//!
//! Produces the `[N, D]` tensor of every voxel index of a grid, in the
//! same flattening order as `Tensor::reshape([N])` on the image data, so
//! grid rows and flattened voxel values line up one-to-one.

use burn::tensor::Tensor;
use burn::tensor::backend::Backend;

/// Generate all voxel indices of a grid as a `[N, D]` float tensor.
///
/// Columns are (x, y, z) ordered; rows iterate z-major to match the
/// [z, y, x] data layout.
pub fn index_grid<B: Backend, const D: usize>(
    size: [usize; D],
    device: &B::Device,
) -> Tensor<B, 2> {
    if D == 2 {
        let h = size[0];
        let w = size[1];

        let y_range = Tensor::<B, 1, burn::tensor::Int>::arange(0..h as i64, device);
        let x_range = Tensor::<B, 1, burn::tensor::Int>::arange(0..w as i64, device);

        let y_grid = y_range.reshape([h, 1]).repeat(&[1, w]).reshape([h * w]).float();
        let x_grid = x_range.reshape([1, w]).repeat(&[h, 1]).reshape([h * w]).float();

        Tensor::cat(vec![x_grid.unsqueeze_dim(1), y_grid.unsqueeze_dim(1)], 1)
    } else if D == 3 {
        let d = size[0];
        let h = size[1];
        let w = size[2];

        let z_range = Tensor::<B, 1, burn::tensor::Int>::arange(0..d as i64, device);
        let y_range = Tensor::<B, 1, burn::tensor::Int>::arange(0..h as i64, device);
        let x_range = Tensor::<B, 1, burn::tensor::Int>::arange(0..w as i64, device);

        let z_grid = z_range.reshape([d, 1, 1]).repeat(&[1, h, w]).reshape([d * h * w]).float();
        let y_grid = y_range.reshape([1, h, 1]).repeat(&[d, 1, w]).reshape([d * h * w]).float();
        let x_grid = x_range.reshape([1, 1, w]).repeat(&[d, h, 1]).reshape([d * h * w]).float();

        Tensor::cat(
            vec![
                x_grid.unsqueeze_dim(1),
                y_grid.unsqueeze_dim(1),
                z_grid.unsqueeze_dim(1),
            ],
            1,
        )
    } else {
        panic!("index_grid supports 2D and 3D grids only");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_ndarray::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_grid_matches_flatten_order_3d() {
        let device = Default::default();
        let grid = index_grid::<TestBackend, 3>([2, 3, 4], &device);
        assert_eq!(grid.dims(), [24, 3]);

        let data = grid.into_data();
        let slice = data.as_slice::<f32>().unwrap();

        // Row 0 is voxel (x=0, y=0, z=0)
        assert_eq!(&slice[0..3], &[0.0, 0.0, 0.0]);
        // Row 1 advances x first (fastest axis)
        assert_eq!(&slice[3..6], &[1.0, 0.0, 0.0]);
        // Row 4 wraps to y=1
        assert_eq!(&slice[12..15], &[0.0, 1.0, 0.0]);
        // Row 12 wraps to z=1
        assert_eq!(&slice[36..39], &[0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_grid_2d() {
        let device = Default::default();
        let grid = index_grid::<TestBackend, 2>([2, 3], &device);
        assert_eq!(grid.dims(), [6, 2]);

        let data = grid.into_data();
        let slice = data.as_slice::<f32>().unwrap();
        // Row 3 is voxel (x=0, y=1)
        assert_eq!(&slice[6..8], &[0.0, 1.0]);
    }
}
