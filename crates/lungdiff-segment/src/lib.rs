//! Lung parenchyma segmentation.
//!
//! Produces a binary mask from a CT-like volume: Gaussian smoothing,
//! binary thresholding of the low-intensity range, then morphological
//! closing and opening with a ball element to fill vessels and drop
//! airway fragments. The complement variant inverts the mask so the
//! surrounding tissue becomes foreground.

use burn::tensor::backend::Backend;
use lungdiff_core::Image;
use lungdiff_core::error::{CoreError, Result};
use lungdiff_core::filter::{GaussianFilter, binary_threshold, close, open, invert};

/// Segmentation tunables.
#[derive(Debug, Clone)]
pub struct SegmentationConfig {
    /// Gaussian smoothing variance in physical units.
    pub variance: f64,
    /// Upper threshold of the foreground intensity band `[0, threshold]`.
    pub threshold: f32,
    /// Ball structuring element radius in voxels.
    pub radius: usize,
    /// Mask foreground value.
    pub foreground: f32,
    /// Invert the mask, selecting the complement of the lung field.
    pub invert: bool,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            variance: 2.0,
            threshold: 50.0,
            radius: 3,
            foreground: 255.0,
            invert: false,
        }
    }
}

impl SegmentationConfig {
    /// Check the tunables for values the stages cannot work with.
    pub fn validate(&self) -> Result<()> {
        if !self.variance.is_finite() || self.variance < 0.0 {
            return Err(CoreError::invalid_parameter("segmentation variance must be finite and >= 0"));
        }
        if !self.threshold.is_finite() {
            return Err(CoreError::invalid_parameter("segmentation threshold must be finite"));
        }
        if self.radius == 0 {
            return Err(CoreError::invalid_parameter("structuring element radius must be >= 1"));
        }
        if !(self.foreground > 0.0) {
            return Err(CoreError::invalid_parameter("mask foreground value must be > 0"));
        }
        Ok(())
    }
}

/// Segment a volume into a {0, foreground} mask on the input grid.
pub fn segment<B: Backend>(image: &Image<B, 3>, config: &SegmentationConfig) -> Result<Image<B, 3>> {
    let (_, mask) = segment_smoothed(image, config)?;
    Ok(mask)
}

/// Segment a volume, also returning the smoothed intensities.
///
/// The threshold is applied to the raw volume; the smoothed copy is a
/// byproduct some pipelines inspect.
pub fn segment_smoothed<B: Backend>(
    image: &Image<B, 3>,
    config: &SegmentationConfig,
) -> Result<(Image<B, 3>, Image<B, 3>)> {
    config.validate()?;

    tracing::debug!(
        threshold = config.threshold,
        radius = config.radius,
        invert = config.invert,
        "segmenting volume"
    );

    let smoothed = GaussianFilter::from_variance(config.variance).apply(image);

    let thresholded = binary_threshold(image, 0.0, config.threshold, config.foreground, 0.0);
    let closed = close(&thresholded, config.radius);
    let opened = open(&closed, config.radius);

    let mask = if config.invert {
        invert(&opened, config.foreground)
    } else {
        opened
    };

    Ok((smoothed, mask))
}
