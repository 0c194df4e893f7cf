//! Translation transform.

use burn::tensor::{Tensor, TensorData};
use burn::tensor::backend::Backend;
use crate::spatial::Vector;
use super::trait_::Transform;

/// Rigid translation by a fixed physical offset.
#[derive(Debug, Clone, Copy)]
pub struct TranslationTransform<const D: usize> {
    offset: Vector<D>,
}

impl<const D: usize> TranslationTransform<D> {
    /// Create a translation by the given offset.
    pub fn new(offset: Vector<D>) -> Self {
        Self { offset }
    }

    /// The zero translation.
    pub fn identity() -> Self {
        Self {
            offset: Vector::zeros(),
        }
    }

    /// Get the translation offset.
    pub fn offset(&self) -> &Vector<D> {
        &self.offset
    }
}

impl<const D: usize> Default for TranslationTransform<D> {
    fn default() -> Self {
        Self::identity()
    }
}

impl<B: Backend, const D: usize> Transform<B, D> for TranslationTransform<D> {
    fn transform_points(&self, points: Tensor<B, 2>) -> Tensor<B, 2> {
        let device = points.device();
        let offset_vec: Vec<f32> = (0..D).map(|i| self.offset[i] as f32).collect();
        let offset = Tensor::<B, 1>::from_data(
            TensorData::new(offset_vec, burn::tensor::Shape::new([D])),
            &device,
        )
        .reshape([1, D]);
        points + offset
    }
}
