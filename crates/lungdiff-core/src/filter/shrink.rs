//! Shrink filter.

use burn::tensor::Tensor;
use burn::tensor::backend::Backend;
use crate::image::Image;

/// Shrink filter.
///
/// Reduces the image size by integer factors, keeping every Nth voxel
/// starting at index 0. Spacing scales by the factor so the physical
/// location of kept voxels is unchanged.
pub struct ShrinkFilter<B: Backend, const D: usize> {
    /// Per-axis factors, ordered (x, y, z).
    factors: [usize; D],
    _b: std::marker::PhantomData<B>,
}

impl<B: Backend, const D: usize> ShrinkFilter<B, D> {
    /// Create a new shrink filter with per-axis factors ordered (x, y, z).
    pub fn new(factors: [usize; D]) -> Self {
        Self {
            factors,
            _b: std::marker::PhantomData,
        }
    }

    /// Uniform shrink factor on all axes.
    pub fn uniform(factor: usize) -> Self {
        Self::new([factor; D])
    }

    /// Apply the filter to an image.
    pub fn apply(&self, image: &Image<B, D>) -> Image<B, D> {
        let mut data = image.data().clone();
        let device = data.device();
        let dims: [usize; D] = data.shape().dims();

        let mut new_spacing = *image.spacing();

        // Data dim d pairs with geometry axis D - 1 - d
        for d in 0..D {
            let axis = D - 1 - d;
            let factor = self.factors[axis];
            if factor <= 1 {
                continue;
            }

            let indices_vec: Vec<i32> = (0..dims[d]).step_by(factor).map(|x| x as i32).collect();
            let indices = Tensor::<B, 1, burn::tensor::Int>::from_ints(indices_vec.as_slice(), &device);
            data = data.select(d, indices);

            new_spacing[axis] *= factor as f64;
        }

        Image::new(data, *image.origin(), new_spacing, *image.direction())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_ndarray::NdArray;
    use crate::spatial::{Point, Spacing, Direction};

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_uniform_shrink() {
        let device = Default::default();
        let values: Vec<f32> = (0..8 * 8 * 8).map(|v| v as f32).collect();
        let image = Image::<TestBackend, 3>::from_vec(
            values,
            [8, 8, 8],
            Point::origin(),
            Spacing::uniform(1.0),
            Direction::identity(),
            &device,
        );

        let shrunk = ShrinkFilter::uniform(2).apply(&image);
        assert_eq!(shrunk.shape(), [4, 4, 4]);
        assert!((shrunk.spacing()[0] - 2.0).abs() < 1e-9);

        // Voxel (0,0,0) is preserved, next kept x voxel is old index 2
        let out = shrunk.to_vec();
        assert_eq!(out[0], 0.0);
        assert_eq!(out[1], 2.0);
    }

    #[test]
    fn test_in_plane_only_shrink() {
        let device = Default::default();
        let image = Image::<TestBackend, 3>::from_vec(
            vec![0.0; 6 * 8 * 8],
            [6, 8, 8],
            Point::origin(),
            Spacing::new([1.0, 1.0, 2.5]),
            Direction::identity(),
            &device,
        );

        // Factors (x=4, y=4, z=1): z axis untouched
        let shrunk = ShrinkFilter::new([4, 4, 1]).apply(&image);
        assert_eq!(shrunk.shape(), [6, 2, 2]);
        assert!((shrunk.spacing()[0] - 4.0).abs() < 1e-9);
        assert!((shrunk.spacing()[1] - 4.0).abs() < 1e-9);
        assert!((shrunk.spacing()[2] - 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_non_divisible_size() {
        let device = Default::default();
        let image = Image::<TestBackend, 3>::from_vec(
            vec![0.0; 5 * 5 * 5],
            [5, 5, 5],
            Point::origin(),
            Spacing::uniform(1.0),
            Direction::identity(),
            &device,
        );

        // Indices 0, 2, 4 survive on each axis
        let shrunk = ShrinkFilter::uniform(2).apply(&image);
        assert_eq!(shrunk.shape(), [3, 3, 3]);
    }
}
