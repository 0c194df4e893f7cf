//! Gaussian smoothing filter.

use burn::tensor::{Tensor, Shape};
use burn::tensor::backend::Backend;
use burn::tensor::ops::ConvOptions;
use crate::image::Image;
use crate::spatial::Spacing;

/// Whether sigmas are given in physical units or voxel units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SigmaUnits {
    Physical,
    Voxel,
}

/// Gaussian smoothing filter using separable 1D convolutions.
///
/// Borders are handled by replicating the edge value, so smoothing a
/// constant image returns the constant unchanged.
pub struct GaussianFilter<B: Backend> {
    sigmas: Vec<f64>,
    units: SigmaUnits,
    max_kernel_width: usize,
    _b: std::marker::PhantomData<B>,
}

impl<B: Backend> GaussianFilter<B> {
    /// Gaussian filter with standard deviations in physical units (mm),
    /// ordered (x, y, z). Voxel kernel widths follow the image spacing.
    pub fn new(sigmas: Vec<f64>) -> Self {
        Self {
            sigmas,
            units: SigmaUnits::Physical,
            max_kernel_width: 32,
            _b: std::marker::PhantomData,
        }
    }

    /// Gaussian filter with a uniform standard deviation derived from a
    /// variance in physical units.
    pub fn from_variance(variance: f64) -> Self {
        Self::new(vec![variance.sqrt()])
    }

    /// Gaussian filter with standard deviations in voxel units, ordered
    /// (x, y, z). Used for displacement-field smoothing.
    pub fn voxel(sigmas: Vec<f64>) -> Self {
        Self {
            sigmas,
            units: SigmaUnits::Voxel,
            max_kernel_width: 32,
            _b: std::marker::PhantomData,
        }
    }

    /// Set the maximum kernel width (radius * 2 + 1).
    pub fn with_max_kernel_width(mut self, width: usize) -> Self {
        self.max_kernel_width = width;
        self
    }

    /// Apply the filter to an image.
    pub fn apply<const D: usize>(&self, image: &Image<B, D>) -> Image<B, D> {
        let data = self.apply_tensor(image.data().clone(), image.spacing());
        image.with_data(data)
    }

    /// Apply the filter to a tensor directly.
    ///
    /// Tensor dims are [z, y, x] while sigmas and spacing are (x, y, z)
    /// ordered, so data dim `d` pairs with axis `D - 1 - d`.
    pub fn apply_tensor<const D: usize>(&self, input: Tensor<B, D>, spacing: &Spacing<D>) -> Tensor<B, D> {
        let mut data = input;
        let device = data.device();

        for d in 0..D {
            let axis = D - 1 - d;
            let sigma = if axis < self.sigmas.len() {
                self.sigmas[axis]
            } else {
                self.sigmas[0]
            };
            if sigma <= 1e-6 {
                continue;
            }

            let pixel_sigma = match self.units {
                SigmaUnits::Physical => sigma / spacing[axis],
                SigmaUnits::Voxel => sigma,
            };
            let radius = (3.0 * pixel_sigma).ceil() as usize;
            let width = (2 * radius + 1).min(self.max_kernel_width);
            let actual_radius = (width - 1) / 2;
            if actual_radius == 0 {
                continue;
            }

            let kernel = generate_kernel(pixel_sigma, actual_radius);
            let kernel_tensor = Tensor::<B, 1>::from_floats(kernel.as_slice(), &device);

            data = convolve_1d_replicate::<B, D>(data, kernel_tensor, d);
        }
        data
    }
}

fn generate_kernel(sigma: f64, radius: usize) -> Vec<f32> {
    let mut kernel = Vec::with_capacity(2 * radius + 1);
    let mut sum = 0.0;
    let two_sigma2 = 2.0 * sigma * sigma;

    for i in 0..=(2 * radius) {
        let x = (i as f64) - (radius as f64);
        let val = (-x * x / two_sigma2).exp();
        kernel.push(val as f32);
        sum += val;
    }
    for val in &mut kernel {
        *val /= sum as f32;
    }
    kernel
}

/// Convolve along one dimension with replicate padding.
fn convolve_1d_replicate<B: Backend, const D: usize>(
    input: Tensor<B, D>,
    kernel: Tensor<B, 1>,
    dim: usize,
) -> Tensor<B, D> {
    let dims: [usize; D] = input.shape().dims();
    let device = input.device();
    let size = dims[dim];
    let kernel_size = kernel.dims()[0];
    let radius = kernel_size / 2;

    // Replicate-pad by selecting clamped indices along the target dim
    let mut pad_indices: Vec<i32> = Vec::with_capacity(size + 2 * radius);
    for _ in 0..radius {
        pad_indices.push(0);
    }
    for i in 0..size {
        pad_indices.push(i as i32);
    }
    for _ in 0..radius {
        pad_indices.push((size - 1) as i32);
    }
    let pad_tensor = Tensor::<B, 1, burn::tensor::Int>::from_ints(pad_indices.as_slice(), &device);
    let padded = input.select(dim, pad_tensor);
    let padded_size = size + 2 * radius;

    // Permute target dimension to last
    let mut permute_indices = [0isize; D];
    let mut idx = 0;
    for i in 0..D {
        if i != dim {
            permute_indices[idx] = i as isize;
            idx += 1;
        }
    }
    permute_indices[D - 1] = dim as isize;
    let permuted = padded.permute(permute_indices);

    let mut batch_size = 1;
    for i in 0..D {
        if i != dim {
            batch_size *= dims[i];
        }
    }

    // [Batch, Channels=1, Length]
    let input_reshaped = permuted.reshape([batch_size, 1, padded_size]);
    let kernel_reshaped = kernel.reshape([1, 1, kernel_size]);

    // Padding already applied, so conv shrinks back to the original size
    let options = ConvOptions::new([1], [0], [1], 1);
    let output_reshaped = burn::tensor::module::conv1d(input_reshaped, kernel_reshaped, None, options);

    let mut permuted_shape = [0; D];
    let mut p_idx = 0;
    for i in 0..D {
        if i != dim {
            permuted_shape[p_idx] = dims[i];
            p_idx += 1;
        }
    }
    permuted_shape[D - 1] = size;
    let output_permuted = output_reshaped.reshape(Shape::new(permuted_shape));

    let mut inv_permute_indices = [0isize; D];
    for (new_pos, &old_pos) in permute_indices.iter().enumerate() {
        inv_permute_indices[old_pos as usize] = new_pos as isize;
    }
    output_permuted.permute(inv_permute_indices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_ndarray::NdArray;
    use crate::spatial::{Point, Direction};

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_kernel_normalized() {
        let kernel = generate_kernel(1.5, 4);
        let sum: f32 = kernel.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
        // Symmetric about the center
        assert!((kernel[0] - kernel[8]).abs() < 1e-6);
    }

    #[test]
    fn test_constant_image_unchanged() {
        let device = Default::default();
        let image = Image::<TestBackend, 3>::from_vec(
            vec![7.0; 6 * 6 * 6],
            [6, 6, 6],
            Point::origin(),
            Spacing::uniform(1.0),
            Direction::identity(),
            &device,
        );

        let filter = GaussianFilter::new(vec![1.0, 1.0, 1.0]);
        let smoothed = filter.apply(&image);

        // Replicate borders keep constants constant everywhere
        for v in smoothed.to_vec() {
            assert!((v - 7.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_smoothing_reduces_peak() {
        let device = Default::default();
        let mut values = vec![0.0f32; 7 * 7 * 7];
        values[3 * 49 + 3 * 7 + 3] = 100.0;
        let image = Image::<TestBackend, 3>::from_vec(
            values,
            [7, 7, 7],
            Point::origin(),
            Spacing::uniform(1.0),
            Direction::identity(),
            &device,
        );

        let filter = GaussianFilter::new(vec![1.0, 1.0, 1.0]);
        let smoothed = filter.apply(&image).to_vec();

        let peak = smoothed[3 * 49 + 3 * 7 + 3];
        assert!(peak < 100.0 && peak > 0.0);
        // Mass spreads to neighbors
        assert!(smoothed[3 * 49 + 3 * 7 + 4] > 0.0);

        // Total mass approximately conserved away from borders
        let total: f32 = smoothed.iter().sum();
        assert!((total - 100.0).abs() < 1.0);
    }

    #[test]
    fn test_anisotropic_sigma_respects_axes() {
        let device = Default::default();
        // Impulse; smooth along x only
        let mut values = vec![0.0f32; 5 * 5 * 5];
        values[2 * 25 + 2 * 5 + 2] = 1.0;
        let image = Image::<TestBackend, 3>::from_vec(
            values,
            [5, 5, 5],
            Point::origin(),
            Spacing::uniform(1.0),
            Direction::identity(),
            &device,
        );

        let filter = GaussianFilter::new(vec![1.0, 0.0, 0.0]);
        let smoothed = filter.apply(&image).to_vec();

        // Neighbor along x received mass, neighbors along y and z did not
        assert!(smoothed[2 * 25 + 2 * 5 + 3] > 0.0);
        assert!(smoothed[2 * 25 + 3 * 5 + 2].abs() < 1e-6);
        assert!(smoothed[3 * 25 + 2 * 5 + 2].abs() < 1e-6);
    }

    #[test]
    fn test_voxel_units_ignore_spacing() {
        let device = Default::default();
        let mut values = vec![0.0f32; 125];
        values[2 * 25 + 2 * 5 + 2] = 1.0;
        let image = Image::<TestBackend, 3>::from_vec(
            values,
            [5, 5, 5],
            Point::origin(),
            Spacing::new([4.0, 4.0, 4.0]),
            Direction::identity(),
            &device,
        );

        let voxel = GaussianFilter::voxel(vec![1.0, 1.0, 1.0]).apply(&image).to_vec();
        let physical = GaussianFilter::new(vec![4.0, 4.0, 4.0]).apply(&image).to_vec();

        // sigma 1.0 voxel on 4 mm spacing equals sigma 4.0 mm
        for (a, b) in voxel.iter().zip(physical.iter()) {
            assert!((a - b).abs() < 1e-5);
        }
    }
}
