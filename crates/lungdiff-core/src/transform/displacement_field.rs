//! Dense displacement field transform.
//!
//! Stores one displacement vector per voxel of a reference grid, in
//! physical units. Used for deformable registration: the field maps a
//! fixed-image point `p` to the moving-image point `p + u(p)`.

use burn::tensor::Tensor;
use burn::tensor::backend::Backend;
use crate::image::{Image, index_grid};
use crate::interpolation::{Interpolator, LinearInterpolator, BSplineInterpolator};
use super::trait_::Transform;

/// Dense 3D displacement field on a voxel grid.
///
/// The three components hold the (x, y, z) physical displacement, each as
/// a scalar volume on the same grid.
#[derive(Debug, Clone)]
pub struct DisplacementField<B: Backend> {
    components: [Image<B, 3>; 3],
}

impl<B: Backend> DisplacementField<B> {
    /// Create from per-axis component volumes.
    ///
    /// # Panics
    /// Panics if the components do not share a grid.
    pub fn new(components: [Image<B, 3>; 3]) -> Self {
        assert!(
            components[0].same_grid(&components[1]) && components[0].same_grid(&components[2]),
            "displacement components must share a grid"
        );
        Self { components }
    }

    /// The zero field on the grid of a reference image.
    pub fn zeros(reference: &Image<B, 3>) -> Self {
        let zero = reference.with_data(Tensor::zeros(reference.shape(), &reference.data().device()));
        Self::new([zero.clone(), zero.clone(), zero])
    }

    /// Build from a flat `[N, 3]` tensor of (x, y, z) displacements in the
    /// reference grid's flatten order.
    pub fn from_flat(flat: Tensor<B, 2>, reference: &Image<B, 3>) -> Self {
        let shape = reference.shape();
        let n = shape.iter().product::<usize>();
        debug_assert_eq!(flat.dims()[0], n, "flat field length mismatch");

        let component = |axis: usize| {
            let data = flat
                .clone()
                .narrow(1, axis, 1)
                .reshape(burn::tensor::Shape::new(shape));
            reference.with_data(data)
        };
        Self::new([component(0), component(1), component(2)])
    }

    /// Flatten to a `[N, 3]` tensor of (x, y, z) displacements.
    pub fn to_flat(&self) -> Tensor<B, 2> {
        let n = self.components[0].len();
        Tensor::cat(
            self.components
                .iter()
                .map(|c| c.data().clone().reshape([n, 1]))
                .collect(),
            1,
        )
    }

    /// A displacement component volume (0 = x, 1 = y, 2 = z).
    pub fn component(&self, axis: usize) -> &Image<B, 3> {
        &self.components[axis]
    }

    /// The grid shape [z, y, x].
    pub fn shape(&self) -> [usize; 3] {
        self.components[0].shape()
    }

    /// Largest displacement magnitude over the grid, for diagnostics.
    pub fn max_magnitude(&self) -> f32 {
        use burn::tensor::ElementConversion;
        let squared = self.components[0].data().clone().powf_scalar(2.0)
            + self.components[1].data().clone().powf_scalar(2.0)
            + self.components[2].data().clone().powf_scalar(2.0);
        squared.max().into_scalar().elem::<f32>().sqrt()
    }

    /// Apply a per-component image filter, keeping the grid.
    pub fn map_components<F>(&self, f: F) -> Self
    where
        F: Fn(&Image<B, 3>) -> Image<B, 3>,
    {
        Self::new([
            f(&self.components[0]),
            f(&self.components[1]),
            f(&self.components[2]),
        ])
    }

    /// Resample the field onto a reference image's grid with cubic
    /// B-Splines.
    ///
    /// The output takes the reference's geometry verbatim, so the field
    /// lands exactly on the reference grid even when the grids' sizes are
    /// not integer multiples of each other. Displacement values are
    /// physical and need no rescaling.
    pub fn resample(&self, reference: &Image<B, 3>) -> Self {
        let grid_image = &self.components[0];
        let device = grid_image.data().device();
        let target_shape = reference.shape();

        let grid = index_grid::<B, 3>(target_shape, &device);
        let world = reference.index_to_world_tensor(grid);
        let indices = grid_image.world_to_index_tensor(world);

        let interpolator = BSplineInterpolator::new();
        let component = |axis: usize| {
            let values = interpolator.interpolate(self.components[axis].data(), indices.clone());
            reference.with_data(values.reshape(burn::tensor::Shape::new(target_shape)))
        };
        Self::new([component(0), component(1), component(2)])
    }

    /// Warp a moving image onto this field's grid.
    ///
    /// Each output voxel samples the moving image at `p + u(p)`; points
    /// landing outside the moving volume take `default_value`.
    pub fn warp<I: Interpolator<B>>(
        &self,
        moving: &Image<B, 3>,
        interpolator: &I,
        default_value: f32,
    ) -> Image<B, 3> {
        crate::filter::resample(moving, &self.components[0], self, interpolator, default_value)
    }
}

impl<B: Backend> Transform<B, 3> for DisplacementField<B> {
    fn transform_points(&self, points: Tensor<B, 2>) -> Tensor<B, 2> {
        let grid_image = &self.components[0];
        let indices = grid_image.world_to_index_tensor(points.clone());
        let n = points.dims()[0];

        let interpolator = LinearInterpolator::new();
        let displacement = Tensor::cat(
            self.components
                .iter()
                .map(|c| {
                    interpolator
                        .interpolate(c.data(), indices.clone())
                        .reshape([n, 1])
                })
                .collect(),
            1,
        );

        points + displacement
    }
}
