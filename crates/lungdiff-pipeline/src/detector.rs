//! Change-detection orchestrator.
//!
//! Runs the linear stage sequence segment, mask, linear register,
//! deformable register, subtract. Optional stages are switched by the
//! configuration; the stage contracts do not depend on which variant
//! invokes them. The first error aborts the whole run with a logged
//! description and no output.

use burn::tensor::backend::Backend;
use lungdiff_core::{CoreError, Image};
use lungdiff_core::filter::{mask, subtract};
use lungdiff_registration::{AffineRegistration, DemonsRegistration};
use lungdiff_segment::{segment, SegmentationConfig};
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::io::{VolumeSink, VolumeSource};

/// End-to-end lung change detection.
#[derive(Debug, Clone, Default)]
pub struct ChangeDetector {
    config: PipelineConfig,
}

impl ChangeDetector {
    /// Detector with the given configuration.
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Detect changes between two volumes of the same subject.
    ///
    /// The callback fires once per demons iteration with the iteration
    /// index and the mean-squared metric. Returns the difference volume
    /// (fixed minus the registered moving volume) on the fixed grid.
    pub fn run<B: Backend, F>(
        &self,
        fixed: &Image<B, 3>,
        moving: &Image<B, 3>,
        callback: F,
    ) -> Result<Image<B, 3>>
    where
        F: FnMut(usize, f64),
    {
        match self.run_stages(fixed, moving, callback) {
            Ok(difference) => Ok(difference),
            Err(error) => {
                tracing::error!(%error, "pipeline aborted");
                Err(error)
            }
        }
    }

    /// Load both volumes, run the pipeline, and write the difference.
    pub fn run_with_io<B, SF, SM, K, F>(
        &self,
        fixed_source: &SF,
        moving_source: &SM,
        sink: &mut K,
        callback: F,
    ) -> Result<()>
    where
        B: Backend,
        SF: VolumeSource<B>,
        SM: VolumeSource<B>,
        K: VolumeSink<B>,
        F: FnMut(usize, f64),
    {
        let fixed = fixed_source.load()?;
        let moving = moving_source.load()?;
        let difference = self.run(&fixed, &moving, callback)?;
        sink.write(&difference)
    }

    fn run_stages<B: Backend, F>(
        &self,
        fixed: &Image<B, 3>,
        moving: &Image<B, 3>,
        callback: F,
    ) -> Result<Image<B, 3>>
    where
        F: FnMut(usize, f64),
    {
        self.config.validate()?;

        if fixed.shape() != moving.shape() {
            return Err(CoreError::geometry_mismatch("shape", fixed.shape(), moving.shape()).into());
        }

        tracing::info!(
            shape = ?fixed.shape(),
            segmentation = self.config.segmentation,
            masking = self.config.masking,
            segment_after_linear = self.config.segment_after_linear,
            "change detection started"
        );

        let segment_config = self.config.segmentation_config();

        let mut fixed_work = fixed.clone();
        let mut moving_work = moving.clone();

        if self.config.segmentation && !self.config.segment_after_linear {
            fixed_work = self.segment_stage(&fixed_work, &segment_config)?;
            moving_work = self.segment_stage(&moving_work, &segment_config)?;
        }

        let affine = AffineRegistration::new(self.config.affine_config());
        let (_, linear_out, linear_result) = affine.run(&fixed_work, &moving_work)?;
        tracing::info!(
            iterations = linear_result.iterations,
            metric = linear_result.metric_value,
            "linear stage finished"
        );

        let mut moving_for_demons = linear_out;
        if self.config.segmentation && self.config.segment_after_linear {
            fixed_work = self.segment_stage(&fixed_work, &segment_config)?;
            moving_for_demons = self.segment_stage(&moving_for_demons, &segment_config)?;
        }

        let demons = DemonsRegistration::new(self.config.demons_config());
        let (_, warped, demons_result) = demons.run(&fixed_work, &moving_for_demons, callback)?;
        tracing::info!(
            iterations = demons_result.iterations,
            metric = demons_result.metric_value,
            "deformable stage finished"
        );

        Ok(subtract(&fixed_work, &warped)?)
    }

    /// Segment a volume and, when masking is enabled, restrict it to the
    /// segmented region.
    fn segment_stage<B: Backend>(
        &self,
        volume: &Image<B, 3>,
        config: &SegmentationConfig,
    ) -> Result<Image<B, 3>> {
        let volume_mask = segment(volume, config)?;
        if self.config.masking {
            Ok(mask(volume, &volume_mask, 0.0)?)
        } else {
            tracing::debug!("segmentation computed without masking");
            Ok(volume.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_ndarray::NdArray;
    use lungdiff_core::spatial::{Point, Spacing, Direction};

    type TestBackend = NdArray<f32>;

    fn volume(shape: [usize; 3]) -> Image<TestBackend, 3> {
        let device = Default::default();
        let n = shape.iter().product();
        Image::from_vec(
            vec![10.0; n],
            shape,
            Point::origin(),
            Spacing::uniform(1.0),
            Direction::identity(),
            &device,
        )
    }

    #[test]
    fn test_mismatched_shapes_abort() {
        let detector = ChangeDetector::default();
        let fixed = volume([8, 8, 8]);
        let moving = volume([8, 8, 4]);
        let result = detector.run(&fixed, &moving, |_, _| {});
        assert!(matches!(
            result,
            Err(crate::error::PipelineError::Core(
                CoreError::GeometryMismatch { .. }
            ))
        ));
    }

    #[test]
    fn test_invalid_configuration_aborts_before_work() {
        let mut config = PipelineConfig::default();
        config.demons.iterations = 0;
        let detector = ChangeDetector::new(config);
        let fixed = volume([8, 8, 8]);
        assert!(detector.run(&fixed, &fixed.clone(), |_, _| {}).is_err());
    }
}
