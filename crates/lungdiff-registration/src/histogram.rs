//! Histogram matching of intensity distributions.
//!
//! Maps a source volume's intensities so its quantiles line up with a
//! reference volume's, using histogram-derived quantile tables and
//! piecewise-linear interpolation between match points. Optionally only
//! voxels above the mean intensity contribute to the histograms, which
//! suppresses the background in CT-like data.

use burn::tensor::backend::Backend;
use lungdiff_core::Image;
use crate::error::{RegistrationError, Result};

/// Histogram matching filter.
#[derive(Debug, Clone)]
pub struct HistogramMatcher {
    histogram_levels: usize,
    match_points: usize,
    threshold_at_mean: bool,
}

impl Default for HistogramMatcher {
    fn default() -> Self {
        Self {
            histogram_levels: 1024,
            match_points: 10000,
            threshold_at_mean: true,
        }
    }
}

impl HistogramMatcher {
    /// Matcher with the given histogram resolution and match point count.
    pub fn new(histogram_levels: usize, match_points: usize) -> Self {
        Self {
            histogram_levels,
            match_points,
            threshold_at_mean: true,
        }
    }

    /// Include all voxels in the histograms instead of only those above
    /// the mean.
    pub fn without_mean_threshold(mut self) -> Self {
        self.threshold_at_mean = false;
        self
    }

    /// Check the tunables.
    pub fn validate(&self) -> Result<()> {
        if self.histogram_levels < 2 {
            return Err(RegistrationError::invalid_configuration(
                "histogram needs at least 2 levels",
            ));
        }
        if self.match_points == 0 {
            return Err(RegistrationError::invalid_configuration(
                "need at least 1 match point",
            ));
        }
        Ok(())
    }

    /// Remap `source` intensities onto the distribution of `reference`.
    pub fn match_to<B: Backend>(
        &self,
        source: &Image<B, 3>,
        reference: &Image<B, 3>,
    ) -> Result<Image<B, 3>> {
        self.validate()?;

        let source_values = source.to_vec();
        let reference_values = reference.to_vec();

        let source_table = self.quantile_table(&source_values)?;
        let reference_table = self.quantile_table(&reference_values)?;

        // Degenerate (constant) distributions cannot be remapped
        if source_table[0] == source_table[source_table.len() - 1] {
            return Ok(source.clone());
        }

        let mapped: Vec<f32> = source_values
            .iter()
            .map(|&v| map_value(v, &source_table, &reference_table))
            .collect();

        let device = source.data().device();
        let shape = source.shape();
        let data = burn::tensor::Tensor::<B, 1>::from_data(
            burn::tensor::TensorData::new(mapped, burn::tensor::Shape::new([source.len()])),
            &device,
        )
        .reshape(shape);
        Ok(source.with_data(data))
    }

    /// Quantile values at `match_points + 2` evenly spaced ranks,
    /// estimated from a histogram of the included voxels.
    fn quantile_table(&self, values: &[f32]) -> Result<Vec<f32>> {
        let mean = values.iter().sum::<f32>() / values.len().max(1) as f32;
        let included: Vec<f32> = if self.threshold_at_mean {
            values.iter().copied().filter(|&v| v > mean).collect()
        } else {
            values.to_vec()
        };
        let included = if included.is_empty() { values.to_vec() } else { included };
        if included.is_empty() {
            return Err(RegistrationError::degenerate_sample(
                "no voxels available for histogram matching",
            ));
        }

        let mut min = f32::INFINITY;
        let mut max = f32::NEG_INFINITY;
        for &v in &included {
            if !v.is_finite() {
                return Err(RegistrationError::degenerate_sample(
                    "non-finite intensity in histogram input",
                ));
            }
            min = min.min(v);
            max = max.max(v);
        }
        if min == max {
            return Ok(vec![min; self.match_points + 2]);
        }

        let levels = self.histogram_levels;
        let width = (max - min) / levels as f32;
        let mut counts = vec![0usize; levels];
        for &v in &included {
            let bin = (((v - min) / width) as usize).min(levels - 1);
            counts[bin] += 1;
        }

        // Cumulative counts turn bins into an empirical CDF
        let mut cumulative = Vec::with_capacity(levels);
        let mut running = 0usize;
        for &c in &counts {
            running += c;
            cumulative.push(running);
        }
        let total = running as f64;

        let table_len = self.match_points + 2;
        let mut table = Vec::with_capacity(table_len);
        for k in 0..table_len {
            let rank = k as f64 / (table_len - 1) as f64 * total;
            let bin = cumulative.partition_point(|&c| (c as f64) < rank);
            let bin = bin.min(levels - 1);

            // Linear position inside the bin
            let below = if bin == 0 { 0 } else { cumulative[bin - 1] } as f64;
            let in_bin = (cumulative[bin] as f64 - below).max(1.0);
            let fraction = ((rank - below) / in_bin).clamp(0.0, 1.0);
            table.push(min + width * (bin as f32 + fraction as f32));
        }
        table[0] = min;
        table[table_len - 1] = max;
        Ok(table)
    }
}

/// Piecewise-linear mapping through matching quantile tables.
fn map_value(v: f32, source: &[f32], reference: &[f32]) -> f32 {
    if v <= source[0] {
        return reference[0];
    }
    let last = source.len() - 1;
    if v >= source[last] {
        return reference[last];
    }

    let k = source.partition_point(|&s| s <= v) - 1;
    let k = k.min(last - 1);
    let span = source[k + 1] - source[k];
    if span <= 0.0 {
        return reference[k];
    }
    let t = (v - source[k]) / span;
    reference[k] + t * (reference[k + 1] - reference[k])
}
