//! Metric trait.

use burn::tensor::backend::Backend;
use lungdiff_core::Image;
use lungdiff_core::transform::Transform;
use crate::error::Result;

/// Similarity metric between a fixed image and a moving image seen
/// through a transform.
///
/// The convention here is MAXIMIZE: larger values mean better alignment.
pub trait ImageMetric<B: Backend, const D: usize> {
    /// Evaluate the metric for the given transform.
    fn value<T: Transform<B, D>>(
        &self,
        fixed: &Image<B, D>,
        moving: &Image<B, D>,
        transform: &T,
    ) -> Result<f64>;
}
