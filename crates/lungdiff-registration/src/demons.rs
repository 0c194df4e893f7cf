//! Demons deformable registration.
//!
//! Iteratively grows a dense displacement field from intensity
//! differences: each voxel's update follows the fixed-image gradient,
//! scaled by the intensity mismatch, and the field is Gaussian-smoothed
//! after every update to keep it spatially coherent. Runs at a shrunken
//! working resolution, then upsamples the field and warps the
//! full-resolution moving volume.

use burn::tensor::{Tensor, ElementConversion};
use burn::tensor::backend::Backend;
use lungdiff_core::Image;
use lungdiff_core::filter::{GaussianFilter, ShrinkFilter, normalize};
use lungdiff_core::interpolation::{LinearInterpolator, BSplineInterpolator};
use lungdiff_core::transform::DisplacementField;
use crate::error::{RegistrationError, Result};
use crate::histogram::HistogramMatcher;
use crate::result::RegistrationResult;

/// Update magnitudes below this denominator are suppressed.
const DENOMINATOR_EPSILON: f32 = 1e-9;

/// Tunables of the demons stage.
#[derive(Debug, Clone)]
pub struct DemonsRegistrationConfig {
    /// Per-axis shrink factors (x, y, z); the through-plane axis usually
    /// stays at full resolution.
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

impl Default for DemonsRegistrationConfig {
    fn default() -> Self {
        Self {
            shrink_factors: [4, 4, 1],
            iterations: 500,
            smoothing_sigma: 12.0,
            histogram_levels: 1024,
            match_points: 10000,
        }
    }
}

impl DemonsRegistrationConfig {
    /// Check the tunables for values the stage cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.shrink_factors.iter().any(|&f| f == 0) {
            return Err(RegistrationError::invalid_configuration(
                "shrink factors must be >= 1",
            ));
        }
        if self.iterations == 0 {
            return Err(RegistrationError::invalid_configuration(
                "demons needs at least 1 iteration",
            ));
        }
        if !self.smoothing_sigma.is_finite() || self.smoothing_sigma < 0.0 {
            return Err(RegistrationError::invalid_configuration(
                "field smoothing sigma must be finite and >= 0",
            ));
        }
        HistogramMatcher::new(self.histogram_levels, self.match_points).validate()
    }
}

/// Demons deformable registration stage.
#[derive(Debug, Clone, Default)]
pub struct DemonsRegistration {
    config: DemonsRegistrationConfig,
}

impl DemonsRegistration {
    /// Stage with the given configuration.
    pub fn new(config: DemonsRegistrationConfig) -> Self {
        Self { config }
    }

    /// Register `moving` onto `fixed`.
    ///
    /// The callback fires after every field update with the iteration
    /// index and the mean squared intensity difference. Returns the
    /// full-resolution displacement field, the warped full-resolution
    /// moving volume, and the run summary.
    pub fn run<B: Backend, F>(
        &self,
        fixed: &Image<B, 3>,
        moving: &Image<B, 3>,
        mut callback: F,
    ) -> Result<(DisplacementField<B>, Image<B, 3>, RegistrationResult)>
    where
        F: FnMut(usize, f64),
    {
        self.config.validate()?;

        tracing::info!(
            shrink = ?self.config.shrink_factors,
            iterations = self.config.iterations,
            sigma = self.config.smoothing_sigma,
            "demons registration started"
        );

        let shrink = ShrinkFilter::new(self.config.shrink_factors);
        let fixed_work = normalize(&shrink.apply(fixed));
        let moving_work = normalize(&shrink.apply(moving));

        let matcher = HistogramMatcher::new(self.config.histogram_levels, self.config.match_points);
        let matched = matcher.match_to(&moving_work, &fixed_work)?;

        // Fixed-image gradient in physical units, frozen over the run
        let [grad_x, grad_y, grad_z] = spatial_gradient(&fixed_work);
        let grad_sq = grad_x.clone().powf_scalar(2.0)
            + grad_y.clone().powf_scalar(2.0)
            + grad_z.clone().powf_scalar(2.0);

        let smoother = GaussianFilter::voxel(vec![self.config.smoothing_sigma; 3]);
        let interpolator = LinearInterpolator::new();

        let mut field = DisplacementField::zeros(&fixed_work);
        let mut metric = f64::INFINITY;

        for iteration in 0..self.config.iterations {
            let warped = field.warp(&matched, &interpolator, 0.0);
            let diff = fixed_work.data().clone() - warped.data().clone();

            metric = diff.clone().powf_scalar(2.0).mean().into_scalar().elem::<f32>() as f64;
            if !metric.is_finite() {
                return Err(RegistrationError::divergence(format!(
                    "non-finite metric at iteration {}",
                    iteration
                )));
            }

            // u += diff * grad / (|grad|^2 + diff^2), guarded near zero
            let denominator = grad_sq.clone() + diff.clone().powf_scalar(2.0);
            let valid = denominator
                .clone()
                .greater_equal_elem(DENOMINATOR_EPSILON)
                .float();
            let scale = diff / denominator.clamp(DENOMINATOR_EPSILON, f32::MAX) * valid;

            let gradients = [&grad_x, &grad_y, &grad_z];
            let updated = DisplacementField::new([0, 1, 2].map(|axis| {
                let component = field.component(axis);
                component.with_data(
                    component.data().clone() + scale.clone() * gradients[axis].clone(),
                )
            }));
            field = updated.map_components(|component| smoother.apply(component));

            callback(iteration, metric);
            if iteration % 50 == 0 {
                tracing::debug!(iteration, metric, "demons iteration");
            }
        }

        let field_full = field.resample(fixed);
        let warped_full = field_full.warp(moving, &BSplineInterpolator::new(), 0.0);

        tracing::info!(
            iterations = self.config.iterations,
            metric,
            max_displacement = field_full.max_magnitude(),
            "demons registration finished"
        );

        Ok((
            field_full,
            warped_full,
            RegistrationResult {
                metric_value: metric,
                iterations: self.config.iterations,
                stop_condition: None,
            },
        ))
    }
}

/// Central-difference gradient of a volume, per geometry axis (x, y, z),
/// in physical units. Borders fall back to half-magnitude one-sided
/// differences through index clamping.
fn spatial_gradient<B: Backend>(image: &Image<B, 3>) -> [Tensor<B, 3>; 3] {
    let data = image.data();
    let device = data.device();
    let dims: [usize; 3] = data.shape().dims();
    let spacing = image.spacing();

    // Data dim d pairs with geometry axis 2 - d
    let mut gradients: Vec<Tensor<B, 3>> = Vec::with_capacity(3);
    for d in 0..3 {
        let axis = 2 - d;
        let size = dims[d];

        let forward: Vec<i32> = (0..size).map(|i| (i + 1).min(size - 1) as i32).collect();
        let backward: Vec<i32> = (0..size).map(|i| i.saturating_sub(1) as i32).collect();

        let forward_idx = Tensor::<B, 1, burn::tensor::Int>::from_ints(forward.as_slice(), &device);
        let backward_idx = Tensor::<B, 1, burn::tensor::Int>::from_ints(backward.as_slice(), &device);

        let delta = data.clone().select(d, forward_idx) - data.clone().select(d, backward_idx);
        gradients.push(delta.div_scalar(2.0 * spacing[axis] as f32));
    }

    // gradients is ordered by data dim (z, y, x); reorder to (x, y, z)
    let gz = gradients.remove(0);
    let gy = gradients.remove(0);
    let gx = gradients.remove(0);
    [gx, gy, gz]
}
