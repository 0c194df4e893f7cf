//! B-Spline interpolation implementation.
//!
//! Cubic B-Spline interpolation for smooth sampling, used when upsampling
//! displacement-field components and warping at full resolution.

use burn::tensor::{Tensor, TensorData};
use burn::tensor::backend::Backend;
use super::trait_::Interpolator;

/// Cubic B-Spline basis function.
///
/// - (2/3) - |x|^2 + (1/2)|x|^3    for |x| < 1
/// - (1/6)(2 - |x|)^3              for 1 <= |x| < 2
/// - 0                             otherwise
fn cubic_bspline(x: f32) -> f32 {
    let abs_x = x.abs();
    if abs_x < 1.0 {
        (2.0 / 3.0) - abs_x.powi(2) + 0.5 * abs_x.powi(3)
    } else if abs_x < 2.0 {
        let two_minus_x = 2.0 - abs_x;
        (1.0 / 6.0) * two_minus_x.powi(3)
    } else {
        0.0
    }
}

/// Cubic B-Spline interpolator.
///
/// The 4x4(x4) support is renormalized by the in-bounds weight sum near
/// borders, so border samples stay in the data range.
#[derive(Debug, Clone, Copy, Default)]
pub struct BSplineInterpolator;

impl BSplineInterpolator {
    /// Create a new B-Spline interpolator.
    pub fn new() -> Self {
        Self
    }
}

impl<B: Backend> Interpolator<B> for BSplineInterpolator {
    fn interpolate<const D: usize>(&self, data: &Tensor<B, D>, indices: Tensor<B, 2>) -> Tensor<B, 1> {
        let device = indices.device();
        let [n_points, rank] = indices.dims();
        assert_eq!(rank, D, "Indices rank must match data dimensionality");
        assert!(D == 2 || D == 3, "B-Spline interpolation only supports 2D and 3D");

        let shape = data.shape();
        let dims: Vec<usize> = shape.dims.into();

        let data_values = data
            .clone()
            .into_data()
            .convert::<f32>()
            .into_vec::<f32>()
            .expect("Data must convert to f32");

        let indices_data = indices.into_data();
        let indices_slice = indices_data.as_slice::<f32>().expect("Indices must be f32");

        let mut results = Vec::with_capacity(n_points);
        for i in 0..n_points {
            let coords = &indices_slice[i * D..(i + 1) * D];
            let value = if D == 3 {
                interpolate_point_3d(&data_values, coords, &dims)
            } else {
                interpolate_point_2d(&data_values, coords, &dims)
            };
            results.push(value);
        }

        Tensor::from_data(
            TensorData::new(results, burn::tensor::Shape::new([n_points])),
            &device,
        )
    }
}

/// 3D B-Spline interpolation for a single point.
///
/// Data layout is [Z, Y, X] while coords are (x, y, z).
fn interpolate_point_3d(data: &[f32], coords: &[f32], dims: &[usize]) -> f32 {
    let x = coords[0];
    let y = coords[1];
    let z = coords[2];

    let x0 = x.floor() as isize - 1;
    let y0 = y.floor() as isize - 1;
    let z0 = z.floor() as isize - 1;

    let size_z = dims[0] as isize;
    let size_y = dims[1] as isize;
    let size_x = dims[2] as isize;

    let mut result = 0.0f32;
    let mut weight_sum = 0.0f32;

    // Sample 4x4x4 neighborhood
    for dz in 0..4 {
        let zi = z0 + dz;
        if zi < 0 || zi >= size_z {
            continue;
        }
        let wz = cubic_bspline(z - zi as f32);
        for dy in 0..4 {
            let yi = y0 + dy;
            if yi < 0 || yi >= size_y {
                continue;
            }
            let wy = cubic_bspline(y - yi as f32);
            for dx in 0..4 {
                let xi = x0 + dx;
                if xi < 0 || xi >= size_x {
                    continue;
                }
                let wx = cubic_bspline(x - xi as f32);

                let weight = wx * wy * wz;
                let idx = (zi * size_y * size_x + yi * size_x + xi) as usize;
                result += data[idx] * weight;
                weight_sum += weight;
            }
        }
    }

    if weight_sum > 0.0 {
        result / weight_sum
    } else {
        0.0
    }
}

/// 2D B-Spline interpolation for a single point.
///
/// Data layout is [Y, X] while coords are (x, y).
fn interpolate_point_2d(data: &[f32], coords: &[f32], dims: &[usize]) -> f32 {
    let x = coords[0];
    let y = coords[1];

    let x0 = x.floor() as isize - 1;
    let y0 = y.floor() as isize - 1;

    let size_y = dims[0] as isize;
    let size_x = dims[1] as isize;

    let mut result = 0.0f32;
    let mut weight_sum = 0.0f32;

    // Sample 4x4 neighborhood
    for dy in 0..4 {
        let yi = y0 + dy;
        if yi < 0 || yi >= size_y {
            continue;
        }
        let wy = cubic_bspline(y - yi as f32);
        for dx in 0..4 {
            let xi = x0 + dx;
            if xi < 0 || xi >= size_x {
                continue;
            }
            let wx = cubic_bspline(x - xi as f32);

            let weight = wx * wy;
            let idx = (yi * size_x + xi) as usize;
            result += data[idx] * weight;
            weight_sum += weight;
        }
    }

    if weight_sum > 0.0 {
        result / weight_sum
    } else {
        0.0
    }
}
