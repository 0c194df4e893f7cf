//! Intensity normalization to zero mean and unit variance.

use burn::tensor::ElementConversion;
use burn::tensor::backend::Backend;
use crate::image::Image;

/// Normalize an image to zero mean and unit variance.
///
/// An image with (near) zero variance is only shifted to zero mean.
pub fn normalize<B: Backend, const D: usize>(image: &Image<B, D>) -> Image<B, D> {
    let data = image.data().clone();
    let n = image.len() as f32;

    let mean = data.clone().mean().into_scalar().elem::<f32>();
    let centered = data.sub_scalar(mean);
    let variance = centered
        .clone()
        .powf_scalar(2.0)
        .sum()
        .into_scalar()
        .elem::<f32>()
        / n;

    let std = variance.sqrt();
    let scaled = if std > 1e-12 {
        centered.div_scalar(std)
    } else {
        centered
    };

    image.with_data(scaled)
}
