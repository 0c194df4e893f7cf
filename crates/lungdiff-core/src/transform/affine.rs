//! Affine transform implementation.
//!
//! Matrix-plus-translation transform about a fixed center:
//! `y = M (x - c) + c + t`. The center is not part of the optimized
//! parameter vector, which holds the row-major matrix followed by the
//! translation.

use burn::tensor::{Tensor, TensorData};
use burn::tensor::backend::Backend;
use nalgebra::SMatrix;
use crate::spatial::{Point, Vector};
use super::trait_::Transform;

/// Affine transform with a fixed rotation center.
#[derive(Debug, Clone)]
pub struct AffineTransform<const D: usize> {
    matrix: SMatrix<f64, D, D>,
    translation: Vector<D>,
    center: Point<D>,
}

impl<const D: usize> AffineTransform<D> {
    /// Number of optimizable parameters (matrix then translation).
    pub const PARAMETER_COUNT: usize = D * D + D;

    /// The identity transform centered at the origin.
    pub fn identity() -> Self {
        Self {
            matrix: SMatrix::identity(),
            translation: Vector::zeros(),
            center: Point::origin(),
        }
    }

    /// Create from matrix, translation and center.
    pub fn new(matrix: SMatrix<f64, D, D>, translation: Vector<D>, center: Point<D>) -> Self {
        Self {
            matrix,
            translation,
            center,
        }
    }

    /// Set the fixed rotation center.
    pub fn set_center(&mut self, center: Point<D>) {
        self.center = center;
    }

    /// Set the translation component.
    pub fn set_translation(&mut self, translation: Vector<D>) {
        self.translation = translation;
    }

    /// Get the matrix component.
    pub fn matrix(&self) -> &SMatrix<f64, D, D> {
        &self.matrix
    }

    /// Get the translation component.
    pub fn translation(&self) -> &Vector<D> {
        &self.translation
    }

    /// Get the rotation center.
    pub fn center(&self) -> &Point<D> {
        &self.center
    }

    /// Flatten into the parameter vector: matrix row-major, then translation.
    pub fn parameters(&self) -> Vec<f64> {
        let mut params = Vec::with_capacity(Self::PARAMETER_COUNT);
        for r in 0..D {
            for c in 0..D {
                params.push(self.matrix[(r, c)]);
            }
        }
        for i in 0..D {
            params.push(self.translation[i]);
        }
        params
    }

    /// Load the parameter vector. The center is left unchanged.
    ///
    /// # Panics
    /// Panics if `params.len() != Self::PARAMETER_COUNT`.
    pub fn set_parameters(&mut self, params: &[f64]) {
        assert_eq!(params.len(), Self::PARAMETER_COUNT, "parameter count mismatch");
        for r in 0..D {
            for c in 0..D {
                self.matrix[(r, c)] = params[r * D + c];
            }
        }
        for i in 0..D {
            self.translation[i] = params[D * D + i];
        }
    }

    /// A copy with the given parameter vector loaded.
    pub fn with_parameters(&self, params: &[f64]) -> Self {
        let mut copy = self.clone();
        copy.set_parameters(params);
        copy
    }

    /// Transform a single point: `y = M (x - c) + c + t`.
    pub fn transform_point(&self, point: &Point<D>) -> Point<D> {
        let centered = *point - self.center;
        let rotated = Vector(self.matrix * centered.0);
        self.center + rotated + self.translation
    }
}

impl<const D: usize> Default for AffineTransform<D> {
    fn default() -> Self {
        Self::identity()
    }
}

impl<B: Backend, const D: usize> Transform<B, D> for AffineTransform<D> {
    fn transform_points(&self, points: Tensor<B, 2>) -> Tensor<B, 2> {
        let device = points.device();

        let center_vec: Vec<f32> = (0..D).map(|i| self.center[i] as f32).collect();
        let center = Tensor::<B, 1>::from_data(
            TensorData::new(center_vec, burn::tensor::Shape::new([D])),
            &device,
        )
        .reshape([1, D]);

        let shift_vec: Vec<f32> = (0..D)
            .map(|i| (self.center[i] + self.translation[i]) as f32)
            .collect();
        let shift = Tensor::<B, 1>::from_data(
            TensorData::new(shift_vec, burn::tensor::Shape::new([D])),
            &device,
        )
        .reshape([1, D]);

        // Y = (P - C) @ M^T + (C + T)
        let mut mt_data = Vec::with_capacity(D * D);
        for c in 0..D {
            for r in 0..D {
                mt_data.push(self.matrix[(r, c)] as f32);
            }
        }
        let mt = Tensor::<B, 2>::from_data(
            TensorData::new(mt_data, burn::tensor::Shape::new([D, D])),
            &device,
        );

        (points - center).matmul(mt) + shift
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_ndarray::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_identity_is_noop() {
        let transform = AffineTransform::<3>::identity();
        let p = Point::<3>::new([1.0, 2.0, 3.0]);
        let q = transform.transform_point(&p);
        for i in 0..3 {
            assert!((p[i] - q[i]).abs() < 1e-12);
        }
    }

    #[test]
    fn test_parameter_roundtrip() {
        let mut transform = AffineTransform::<3>::identity();
        let params: Vec<f64> = (0..12).map(|v| v as f64 * 0.1).collect();
        transform.set_parameters(&params);
        assert_eq!(transform.parameters(), params);
        assert!((transform.matrix()[(1, 2)] - 0.5).abs() < 1e-12);
        assert!((transform.translation()[0] - 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_center_offsets_rotation() {
        // Scaling by 2 about center (1,1,1) leaves the center fixed
        let mut transform = AffineTransform::<3>::identity();
        transform.set_center(Point::new([1.0, 1.0, 1.0]));
        let mut params = transform.parameters();
        params[0] = 2.0;
        params[4] = 2.0;
        params[8] = 2.0;
        transform.set_parameters(&params);

        let center = transform.transform_point(&Point::new([1.0, 1.0, 1.0]));
        assert!((center[0] - 1.0).abs() < 1e-12);

        let moved = transform.transform_point(&Point::new([2.0, 1.0, 1.0]));
        assert!((moved[0] - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_tensor_matches_scalar_path() {
        let device = Default::default();
        let mut transform = AffineTransform::<3>::identity();
        transform.set_center(Point::new([0.5, -1.0, 2.0]));
        transform.set_parameters(&[
            1.0, 0.2, 0.0, //
            -0.1, 1.0, 0.0, //
            0.0, 0.0, 1.1, //
            3.0, -2.0, 0.5,
        ]);

        let p = Point::<3>::new([4.0, 5.0, 6.0]);
        let expected = transform.transform_point(&p);

        let points = Tensor::<TestBackend, 2>::from_floats([[4.0, 5.0, 6.0]], &device);
        let out = Transform::<TestBackend, 3>::transform_points(&transform, points);
        let data = out.into_data();
        let slice = data.as_slice::<f32>().unwrap();

        for i in 0..3 {
            assert!((slice[i] - expected[i] as f32).abs() < 1e-4);
        }
    }
}
