//! Pipeline configuration.
//!
//! One deserializable struct carrying every stage tunable plus the
//! variant switches. Stage crates keep their own config types; this
//! module owns the serde surface and hands each stage its config.

use serde::Deserialize;
use lungdiff_segment::SegmentationConfig;
use lungdiff_registration::{AffineRegistrationConfig, DemonsRegistrationConfig};
use crate::error::Result;

/// Segmentation stage tunables.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SegmentSettings {
    /// Gaussian smoothing variance.
    pub variance: f64,
    /// Upper bound of the inside intensity band.
    pub threshold: f32,
    /// Ball radius for morphological closing and opening, in voxels.
    pub radius: usize,
    /// Mask foreground value.
    pub foreground: f32,
    /// Complement the mask after morphology.
    pub invert: bool,
}

impl Default for SegmentSettings {
    fn default() -> Self {
        let defaults = SegmentationConfig::default();
        Self {
            variance: defaults.variance,
            threshold: defaults.threshold,
            radius: defaults.radius,
            foreground: defaults.foreground,
            invert: defaults.invert,
        }
    }
}

/// Affine stage tunables.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AffineSettings {
    /// Per-axis shrink factors (x, y, z).
    pub shrink_factors: [usize; 3],
    /// Gaussian smoothing variance at the working resolution.
    pub smoothing_variance: f64,
    /// Fraction of shrunken fixed voxels used as metric samples.
    pub sample_fraction: f64,
    /// Initial optimizer step length.
    pub max_step: f64,
    /// Step length under which the optimizer stops.
    pub min_step: f64,
    /// Optimizer iteration cap.
    pub max_iterations: usize,
    /// Fill value for resampled voxels outside the moving volume.
    pub default_pixel_value: f32,
}

impl Default for AffineSettings {
    fn default() -> Self {
        let defaults = AffineRegistrationConfig::default();
        Self {
            shrink_factors: defaults.shrink_factors,
            smoothing_variance: defaults.smoothing_variance,
            sample_fraction: defaults.sample_fraction,
            max_step: defaults.max_step,
            min_step: defaults.min_step,
            max_iterations: defaults.max_iterations,
            default_pixel_value: defaults.default_pixel_value,
        }
    }
}

/// Demons stage tunables.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DemonsSettings {
    /// Per-axis shrink factors (x, y, z).
    pub shrink_factors: [usize; 3],
    /// Number of demons updates.
    pub iterations: usize,
    /// Field smoothing standard deviation, in voxel units.
    pub smoothing_sigma: f64,
    /// Histogram resolution for intensity matching.
    pub histogram_levels: usize,
    /// Number of quantile match points.
    pub match_points: usize,
}

impl Default for DemonsSettings {
    fn default() -> Self {
        let defaults = DemonsRegistrationConfig::default();
        Self {
            shrink_factors: defaults.shrink_factors,
            iterations: defaults.iterations,
            smoothing_sigma: defaults.smoothing_sigma,
            histogram_levels: defaults.histogram_levels,
            match_points: defaults.match_points,
        }
    }
}

/// Full pipeline configuration.
///
/// The default enables the full stage sequence: segment, mask, linear
/// register, deformable register, subtract.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Run the segmentation stage.
    pub segmentation: bool,
    /// Mask the volumes with their segmentations before registration.
    /// Ignored when `segmentation` is off.
    pub masking: bool,
    /// Segment after the linear stage instead of before it.
    pub segment_after_linear: bool,

    pub segment: SegmentSettings,
    pub affine: AffineSettings,
    pub demons: DemonsSettings,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            segmentation: true,
            masking: true,
            segment_after_linear: false,
            segment: SegmentSettings::default(),
            affine: AffineSettings::default(),
            demons: DemonsSettings::default(),
        }
    }
}

impl PipelineConfig {
    /// Validate every stage's tunables up front, before any work runs.
    pub fn validate(&self) -> Result<()> {
        self.segmentation_config().validate()?;
        self.affine_config().validate()?;
        self.demons_config().validate()?;
        Ok(())
    }

    pub fn segmentation_config(&self) -> SegmentationConfig {
        SegmentationConfig {
            variance: self.segment.variance,
            threshold: self.segment.threshold,
            radius: self.segment.radius,
            foreground: self.segment.foreground,
            invert: self.segment.invert,
        }
    }

    pub fn affine_config(&self) -> AffineRegistrationConfig {
        AffineRegistrationConfig {
            shrink_factors: self.affine.shrink_factors,
            smoothing_variance: self.affine.smoothing_variance,
            sample_fraction: self.affine.sample_fraction,
            max_step: self.affine.max_step,
            min_step: self.affine.min_step,
            max_iterations: self.affine.max_iterations,
            default_pixel_value: self.affine.default_pixel_value,
        }
    }

    pub fn demons_config(&self) -> DemonsRegistrationConfig {
        DemonsRegistrationConfig {
            shrink_factors: self.demons.shrink_factors,
            iterations: self.demons.iterations,
            smoothing_sigma: self.demons.smoothing_sigma,
            histogram_levels: self.demons.histogram_levels,
            match_points: self.demons.match_points,
        }
    }
}
