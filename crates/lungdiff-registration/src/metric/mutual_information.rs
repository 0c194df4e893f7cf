//! Viola-Wells mutual information metric.
//!
//! Estimates mutual information from two independent random sample sets
//! using Parzen window density estimation with Gaussian kernels. Intended
//! for normalized (zero mean, unit variance) intensities, where the
//! default kernel standard deviation of 0.4 is appropriate.

use burn::tensor::{Tensor, ElementConversion};
use burn::tensor::backend::Backend;
use lungdiff_core::Image;
use lungdiff_core::interpolation::{Interpolator, LinearInterpolator};
use lungdiff_core::transform::Transform;
use crate::error::{RegistrationError, Result};
use crate::sampling::draw_indices;
use super::trait_::ImageMetric;

const LOG_EPSILON: f64 = 1e-12;

/// A frozen pair of random sample sets over the fixed image grid.
///
/// Finite-difference gradients evaluate the metric several times per
/// iteration; reusing one sample keeps those evaluations consistent.
#[derive(Debug, Clone)]
pub struct MetricSample<B: Backend> {
    /// Density-estimation sample, continuous fixed-image indices [N, 3].
    pub a: Tensor<B, 2>,
    /// Evaluation sample, continuous fixed-image indices [N, 3].
    pub b: Tensor<B, 2>,
}

/// Mutual information metric estimated from spatial samples.
#[derive(Debug, Clone)]
pub struct MutualInformationMetric {
    fixed_standard_deviation: f64,
    moving_standard_deviation: f64,
    sample_count: usize,
}

impl MutualInformationMetric {
    /// Metric with the given spatial sample count per sample set.
    pub fn new(sample_count: usize) -> Self {
        Self {
            fixed_standard_deviation: 0.4,
            moving_standard_deviation: 0.4,
            sample_count,
        }
    }

    /// Override the Parzen kernel standard deviations.
    pub fn with_standard_deviations(mut self, fixed: f64, moving: f64) -> Self {
        self.fixed_standard_deviation = fixed;
        self.moving_standard_deviation = moving;
        self
    }

    /// The configured sample count.
    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    /// Draw a fresh sample pair over a fixed image.
    pub fn draw_sample<B: Backend>(&self, fixed: &Image<B, 3>) -> Result<MetricSample<B>> {
        if self.sample_count < 2 {
            return Err(RegistrationError::degenerate_sample(format!(
                "need at least 2 spatial samples, got {}",
                self.sample_count
            )));
        }
        if fixed.is_empty() {
            return Err(RegistrationError::degenerate_sample("fixed image is empty"));
        }
        let device = fixed.data().device();
        Ok(MetricSample {
            a: draw_indices(fixed.shape(), self.sample_count, &device),
            b: draw_indices(fixed.shape(), self.sample_count, &device),
        })
    }

    /// Evaluate the metric under a frozen sample.
    pub fn value_with_sample<B: Backend, T: Transform<B, 3>>(
        &self,
        fixed: &Image<B, 3>,
        moving: &Image<B, 3>,
        transform: &T,
        sample: &MetricSample<B>,
    ) -> Result<f64> {
        let n = sample.a.dims()[0];
        let interpolator = LinearInterpolator::new();

        let values = |indices: &Tensor<B, 2>| -> (Tensor<B, 1>, Tensor<B, 1>) {
            let f = interpolator.interpolate(fixed.data(), indices.clone());
            let world = fixed.index_to_world_tensor(indices.clone());
            let mapped = transform.transform_points(world);
            let moving_indices = moving.world_to_index_tensor(mapped);
            let m = interpolator.interpolate(moving.data(), moving_indices);
            (f, m)
        };

        let (f_a, m_a) = values(&sample.a);
        let (f_b, m_b) = values(&sample.b);

        // Pairwise Parzen kernels, [N_b, N_a]
        let w_f = gaussian_kernel(
            f_b.reshape([n, 1]) - f_a.reshape([1, n]),
            self.fixed_standard_deviation,
        );
        let w_m = gaussian_kernel(
            m_b.reshape([n, 1]) - m_a.reshape([1, n]),
            self.moving_standard_deviation,
        );

        // Density estimates at each b sample, averaged over the a sample
        let p_joint = (w_f.clone() * w_m.clone()).mean_dim(1).squeeze::<1>(1);
        let p_fixed = w_f.mean_dim(1).squeeze::<1>(1);
        let p_moving = w_m.mean_dim(1).squeeze::<1>(1);

        let log_term = |p: Tensor<B, 1>| p.add_scalar(LOG_EPSILON as f32).log().mean();
        let mi = log_term(p_joint) - log_term(p_fixed) - log_term(p_moving);
        let value = mi.into_scalar().elem::<f32>() as f64;

        if !value.is_finite() {
            return Err(RegistrationError::degenerate_sample(
                "mutual information estimate is not finite",
            ));
        }
        Ok(value)
    }
}

fn gaussian_kernel<B: Backend>(diff: Tensor<B, 2>, sigma: f64) -> Tensor<B, 2> {
    let scale = -0.5 / (sigma * sigma);
    diff.powf_scalar(2.0).mul_scalar(scale as f32).exp()
}

impl<B: Backend> ImageMetric<B, 3> for MutualInformationMetric {
    fn value<T: Transform<B, 3>>(
        &self,
        fixed: &Image<B, 3>,
        moving: &Image<B, 3>,
        transform: &T,
    ) -> Result<f64> {
        let sample = self.draw_sample(fixed)?;
        self.value_with_sample(fixed, moving, transform, &sample)
    }
}
