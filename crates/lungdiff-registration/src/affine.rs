//! Affine registration by mutual information.
//!
//! Pipeline: shrink both volumes, normalize, Gaussian smooth, initialize
//! the affine transform from intensity moments, maximize mutual
//! information with regular-step gradient ascent, then resample the
//! original-resolution moving volume onto the fixed grid.

use burn::tensor::ElementConversion;
use burn::tensor::backend::Backend;
use lungdiff_core::{Image, index_grid};
use lungdiff_core::filter::{GaussianFilter, ShrinkFilter, normalize, resample};
use lungdiff_core::interpolation::LinearInterpolator;
use lungdiff_core::spatial::Point;
use lungdiff_core::transform::AffineTransform;
use crate::error::{RegistrationError, Result};
use crate::metric::MutualInformationMetric;
use crate::optimizer::{RegularStepGradientDescent, central_difference};
use crate::result::RegistrationResult;

/// Tunables of the affine stage.
#[derive(Debug, Clone)]
pub struct AffineRegistrationConfig {
    /// Per-axis shrink factors (x, y, z) for the working resolution.
    pub shrink_factors: [usize; 3],
    /// Gaussian smoothing variance applied after normalization.
    pub smoothing_variance: f64,
    /// Fraction of shrunken fixed voxels used as spatial samples.
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

impl Default for AffineRegistrationConfig {
    fn default() -> Self {
        Self {
            shrink_factors: [4, 4, 4],
            smoothing_variance: 2.0,
            sample_fraction: 0.01,
            max_step: 0.1,
            min_step: 0.01,
            max_iterations: 500,
            default_pixel_value: 100.0,
        }
    }
}

impl AffineRegistrationConfig {
    /// Check the tunables for values the stage cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.shrink_factors.iter().any(|&f| f == 0) {
            return Err(RegistrationError::invalid_configuration(
                "shrink factors must be >= 1",
            ));
        }
        if !(self.sample_fraction > 0.0 && self.sample_fraction <= 1.0) {
            return Err(RegistrationError::invalid_configuration(
                "sample fraction must be in (0, 1]",
            ));
        }
        RegularStepGradientDescent::new(self.max_step, self.min_step, self.max_iterations)
            .validate()
    }
}

/// Affine registration stage.
#[derive(Debug, Clone, Default)]
pub struct AffineRegistration {
    config: AffineRegistrationConfig,
}

impl AffineRegistration {
    /// Stage with the given configuration.
    pub fn new(config: AffineRegistrationConfig) -> Self {
        Self { config }
    }

    /// Register `moving` onto `fixed`.
    ///
    /// Returns the fixed-to-moving transform, the original-resolution
    /// moving volume resampled onto the fixed grid, and the run summary.
    pub fn run<B: Backend>(
        &self,
        fixed: &Image<B, 3>,
        moving: &Image<B, 3>,
    ) -> Result<(AffineTransform<3>, Image<B, 3>, RegistrationResult)> {
        self.config.validate()?;

        tracing::info!(
            shrink = ?self.config.shrink_factors,
            iterations = self.config.max_iterations,
            "affine registration started"
        );

        let shrink = ShrinkFilter::new(self.config.shrink_factors);
        let smooth = GaussianFilter::from_variance(self.config.smoothing_variance);

        let fixed_work = smooth.apply(&normalize(&shrink.apply(fixed)));
        let moving_work = smooth.apply(&normalize(&shrink.apply(moving)));

        // Moments run on the original volumes, matching the working-space
        // geometry since shrinking preserves physical positions
        let initial = moments_init(fixed, moving);

        let sample_count =
            ((fixed_work.len() as f64) * self.config.sample_fraction).round() as usize;
        let metric = MutualInformationMetric::new(sample_count);

        let deltas = parameter_deltas();
        let optimizer = RegularStepGradientDescent::new(
            self.config.max_step,
            self.config.min_step,
            self.config.max_iterations,
        );

        let outcome = optimizer.optimize(initial.parameters(), |iteration, params| {
            // One sample per iteration keeps the finite differences of a
            // single step consistent
            let sample = metric.draw_sample(&fixed_work)?;

            let value = metric.value_with_sample(
                &fixed_work,
                &moving_work,
                &initial.with_parameters(params),
                &sample,
            )?;
            let gradient = central_difference(
                |p| {
                    metric.value_with_sample(
                        &fixed_work,
                        &moving_work,
                        &initial.with_parameters(p),
                        &sample,
                    )
                },
                params,
                &deltas,
            )?;

            if iteration % 50 == 0 {
                tracing::debug!(iteration, metric = value, "affine iteration");
            }
            Ok((value, gradient))
        })?;

        let transform = initial.with_parameters(&outcome.parameters);

        let registered = resample(
            moving,
            fixed,
            &transform,
            &LinearInterpolator::new(),
            self.config.default_pixel_value,
        );

        tracing::info!(
            iterations = outcome.iterations,
            metric = outcome.value,
            stop = ?outcome.stop_condition,
            "affine registration finished"
        );

        Ok((
            transform,
            registered,
            RegistrationResult {
                metric_value: outcome.value,
                iterations: outcome.iterations,
                stop_condition: Some(outcome.stop_condition),
            },
        ))
    }
}

/// Finite-difference step per affine parameter: matrix entries are
/// dimensionless, translations are in physical units.
fn parameter_deltas() -> Vec<f64> {
    let mut deltas = vec![1e-3; 9];
    deltas.extend_from_slice(&[1e-1, 1e-1, 1e-1]);
    deltas
}

/// Intensity center of mass of a volume, in physical coordinates.
pub fn center_of_mass<B: Backend>(image: &Image<B, 3>) -> Point<3> {
    let device = image.data().device();
    let shape = image.shape();
    let n = image.len();

    let grid = index_grid::<B, 3>(shape, &device);
    let world = image.index_to_world_tensor(grid);
    let weights = image.data().clone().reshape([n, 1]);

    let total = weights.clone().sum().into_scalar().elem::<f32>() as f64;
    let weighted = (world.clone() * weights).sum_dim(0);

    let coords: Vec<f32> = weighted
        .into_data()
        .as_slice::<f32>()
        .expect("moment sums must be f32")
        .to_vec();

    if total.abs() > 1e-9 {
        Point::new([
            coords[0] as f64 / total,
            coords[1] as f64 / total,
            coords[2] as f64 / total,
        ])
    } else {
        // Zero total mass: fall back to the geometric center
        let mean = world.mean_dim(0);
        let m: Vec<f32> = mean
            .into_data()
            .as_slice::<f32>()
            .expect("moment sums must be f32")
            .to_vec();
        Point::new([m[0] as f64, m[1] as f64, m[2] as f64])
    }
}

/// Moments initialization: center at the fixed center of mass, translation
/// carrying it onto the moving center of mass.
pub fn moments_init<B: Backend>(fixed: &Image<B, 3>, moving: &Image<B, 3>) -> AffineTransform<3> {
    let fixed_com = center_of_mass(fixed);
    let moving_com = center_of_mass(moving);

    let mut transform = AffineTransform::identity();
    transform.set_center(fixed_com);
    transform.set_translation(moving_com - fixed_com);
    transform
}
