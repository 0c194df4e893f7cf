//! Image type with physical metadata and coordinate transformations.
//!
//! The tensor data is stored [z, y, x] (last axis fastest) while the
//! geometry attributes (origin, spacing, direction) are ordered (x, y, z).
//! Batched index tensors follow the (x, y, z) column convention.

use burn::tensor::{Tensor, TensorData};
use burn::tensor::backend::Backend;
use crate::error::{CoreError, Result};
use crate::spatial::{Point, Spacing, Direction};

/// A scalar volume with voxel-grid geometry.
///
/// Combines tensor data with the physical-space metadata that describes
/// how voxel indices map to physical coordinates.
///
/// # Coordinate Systems
/// * **Index Space**: discrete voxel indices (continuous for interpolation)
/// * **Physical Space**: continuous coordinates in mm or other units
///
/// Mapping: `point = origin + Direction * (index * spacing)`.
#[derive(Debug, Clone)]
pub struct Image<B: Backend, const D: usize> {
    /// The voxel data.
    data: Tensor<B, D>,
    /// Physical coordinate of voxel [0, .., 0].
    origin: Point<D>,
    /// Physical distance between voxels along each axis.
    spacing: Spacing<D>,
    /// Orientation of the image axes.
    direction: Direction<D>,
}

impl<B: Backend, const D: usize> Image<B, D> {
    /// Create a new image from data and geometry.
    pub fn new(
        data: Tensor<B, D>,
        origin: Point<D>,
        spacing: Spacing<D>,
        direction: Direction<D>,
    ) -> Self {
        debug_assert!(spacing.is_valid(), "spacing components must be > 0");
        Self {
            data,
            origin,
            spacing,
            direction,
        }
    }

    /// Build an image from a flat `Vec<f32>` in [z, y, x] order.
    pub fn from_vec(
        values: Vec<f32>,
        shape: [usize; D],
        origin: Point<D>,
        spacing: Spacing<D>,
        direction: Direction<D>,
        device: &B::Device,
    ) -> Self {
        let data = Tensor::<B, 1>::from_data(
            TensorData::new(values, burn::tensor::Shape::new([shape.iter().product()])),
            device,
        )
        .reshape(burn::tensor::Shape::new(shape));
        Self::new(data, origin, spacing, direction)
    }

    /// Get the image data tensor.
    pub fn data(&self) -> &Tensor<B, D> {
        &self.data
    }

    /// Get the origin (physical coordinate of the first voxel).
    pub fn origin(&self) -> &Point<D> {
        &self.origin
    }

    /// Get the spacing (physical distance between voxels).
    pub fn spacing(&self) -> &Spacing<D> {
        &self.spacing
    }

    /// Get the direction (orientation matrix).
    pub fn direction(&self) -> &Direction<D> {
        &self.direction
    }

    /// Get the image shape as an array, [z, y, x] ordered.
    pub fn shape(&self) -> [usize; D] {
        self.data.shape().dims.try_into().expect("Tensor rank mismatch")
    }

    /// Total voxel count.
    pub fn len(&self) -> usize {
        self.shape().iter().product()
    }

    /// Whether the buffer holds no voxels.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy the voxel data to a flat `Vec<f32>` in [z, y, x] order.
    pub fn to_vec(&self) -> Vec<f32> {
        self.data
            .clone()
            .into_data()
            .convert::<f32>()
            .into_vec::<f32>()
            .expect("Image data must convert to f32")
    }

    /// An image with the same geometry but new data.
    pub fn with_data(&self, data: Tensor<B, D>) -> Self {
        Self::new(data, self.origin, self.spacing, self.direction)
    }

    /// Whether another image shares this image's grid (size and geometry).
    pub fn same_grid(&self, other: &Self) -> bool {
        self.expect_same_grid(other).is_ok()
    }

    /// Check that another image shares this image's grid, reporting the
    /// first attribute that differs.
    ///
    /// # Errors
    /// Returns [`CoreError::GeometryMismatch`] naming the differing
    /// attribute (shape, origin, spacing or direction).
    pub fn expect_same_grid(&self, other: &Self) -> Result<()> {
        if self.shape() != other.shape() {
            return Err(CoreError::geometry_mismatch("shape", self.shape(), other.shape()));
        }
        let close = |a: f64, b: f64| (a - b).abs() < 1e-9;
        if !(0..D).all(|i| close(self.origin[i], other.origin[i])) {
            return Err(CoreError::geometry_mismatch(
                "origin",
                self.origin.to_vec(),
                other.origin.to_vec(),
            ));
        }
        if !(0..D).all(|i| close(self.spacing[i], other.spacing[i])) {
            return Err(CoreError::geometry_mismatch(
                "spacing",
                self.spacing.to_vec(),
                other.spacing.to_vec(),
            ));
        }
        let rows = |d: &Direction<D>| -> Vec<Vec<f64>> {
            (0..D).map(|r| (0..D).map(|c| d[(r, c)]).collect()).collect()
        };
        if !(0..D).all(|r| (0..D).all(|c| close(self.direction[(r, c)], other.direction[(r, c)]))) {
            return Err(CoreError::geometry_mismatch(
                "direction",
                rows(&self.direction),
                rows(&other.direction),
            ));
        }
        Ok(())
    }

    /// Convert a continuous physical point to a continuous index.
    ///
    /// `index = (Direction^-1 * (point - origin)) / spacing`
    pub fn transform_physical_point_to_continuous_index(&self, point: &Point<D>) -> Point<D> {
        let diff = *point - self.origin;
        let inv_dir = self.direction.try_inverse().expect("Direction matrix must be invertible");
        let rotated = inv_dir * diff;

        let mut index = Point::<D>::origin();
        for i in 0..D {
            index[i] = rotated[i] / self.spacing[i];
        }
        index
    }

    /// Convert a continuous index to a physical point.
    ///
    /// `point = origin + Direction * (index * spacing)`
    pub fn transform_continuous_index_to_physical_point(&self, index: &Point<D>) -> Point<D> {
        let mut scaled_index = crate::spatial::Vector::<D>::zeros();
        for i in 0..D {
            scaled_index[i] = index[i] * self.spacing[i];
        }
        let rotated = self.direction * scaled_index;
        self.origin + rotated
    }

    /// Batch transform physical points to continuous indices.
    ///
    /// # Arguments
    /// * `points` - Tensor of shape `[Batch, D]`, columns (x, y, z)
    pub fn world_to_index_tensor(&self, points: Tensor<B, 2>) -> Tensor<B, 2> {
        let device = points.device();

        let origin_vec: Vec<f32> = (0..D).map(|i| self.origin[i] as f32).collect();
        let origin_tensor = Tensor::<B, 1>::from_data(
            TensorData::new(origin_vec, burn::tensor::Shape::new([D])),
            &device,
        )
        .reshape([1, D]);

        // I = (P - O) @ T with T_rc = (Dir^-1)_cr / S_c
        let inv_dir = self.direction.try_inverse().expect("Direction matrix must be invertible");

        let mut t_data = Vec::with_capacity(D * D);
        for r in 0..D {
            for c in 0..D {
                t_data.push((inv_dir[(c, r)] / self.spacing[c]) as f32);
            }
        }
        let t_tensor = Tensor::<B, 2>::from_data(
            TensorData::new(t_data, burn::tensor::Shape::new([D, D])),
            &device,
        );

        (points - origin_tensor).matmul(t_tensor)
    }

    /// Batch transform continuous indices to physical points.
    ///
    /// # Arguments
    /// * `indices` - Tensor of shape `[Batch, D]`, columns (x, y, z)
    pub fn index_to_world_tensor(&self, indices: Tensor<B, 2>) -> Tensor<B, 2> {
        let device = indices.device();

        let origin_vec: Vec<f32> = (0..D).map(|i| self.origin[i] as f32).collect();
        let origin_tensor = Tensor::<B, 1>::from_data(
            TensorData::new(origin_vec, burn::tensor::Shape::new([D])),
            &device,
        )
        .reshape([1, D]);

        // P = O + I @ M with M_rc = S_r * Dir_cr
        let mut m_data = Vec::with_capacity(D * D);
        for r in 0..D {
            for c in 0..D {
                m_data.push((self.spacing[r] * self.direction[(c, r)]) as f32);
            }
        }
        let m_tensor = Tensor::<B, 2>::from_data(
            TensorData::new(m_data, burn::tensor::Shape::new([D, D])),
            &device,
        );

        indices.matmul(m_tensor) + origin_tensor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_ndarray::NdArray;

    type Backend = NdArray<f32>;
    type Point3 = Point<3>;
    type Spacing3 = Spacing<3>;
    type Direction3 = Direction<3>;

    fn unit_image(shape: [usize; 3]) -> Image<Backend, 3> {
        let device = Default::default();
        let data = Tensor::<Backend, 3>::zeros(shape, &device);
        Image::new(
            data,
            Point3::origin(),
            Spacing3::uniform(1.0),
            Direction3::identity(),
        )
    }

    #[test]
    fn test_image_creation() {
        let image = unit_image([10, 10, 10]);
        assert_eq!(image.shape(), [10, 10, 10]);
        assert_eq!(image.len(), 1000);
    }

    #[test]
    fn test_transform_roundtrip() {
        let image = unit_image([10, 10, 10]);
        let original = Point3::new([3.5, 4.5, 5.5]);
        let index = image.transform_physical_point_to_continuous_index(&original);
        let back = image.transform_continuous_index_to_physical_point(&index);
        for i in 0..3 {
            assert!((original[i] - back[i]).abs() < 1e-9);
        }
    }

    #[test]
    fn test_non_unit_spacing_and_origin() {
        let device = Default::default();
        let data = Tensor::<Backend, 3>::zeros([10, 10, 10], &device);
        let image = Image::new(
            data,
            Point3::new([10.0, 20.0, 30.0]),
            Spacing3::new([2.0, 2.0, 2.0]),
            Direction3::identity(),
        );

        let point = Point3::new([20.0, 30.0, 40.0]);
        let index = image.transform_physical_point_to_continuous_index(&point);
        assert!((index[0] - 5.0).abs() < 1e-9);
        assert!((index[1] - 5.0).abs() < 1e-9);
        assert!((index[2] - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_from_vec_to_vec_roundtrip() {
        let device = Default::default();
        let values: Vec<f32> = (0..24).map(|v| v as f32).collect();
        let image = Image::<Backend, 3>::from_vec(
            values.clone(),
            [2, 3, 4],
            Point3::origin(),
            Spacing3::uniform(1.0),
            Direction3::identity(),
            &device,
        );
        assert_eq!(image.shape(), [2, 3, 4]);
        assert_eq!(image.to_vec(), values);
    }

    #[test]
    fn test_same_grid() {
        let a = unit_image([4, 4, 4]);
        let b = unit_image([4, 4, 4]);
        let c = unit_image([4, 4, 5]);
        assert!(a.same_grid(&b));
        assert!(!a.same_grid(&c));
    }
}
