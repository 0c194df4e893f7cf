//! Finite-difference gradient estimation.

use crate::error::Result;

/// Central-difference gradient of a scalar function.
///
/// Each parameter gets its own step size; matrix entries and physical
/// translations live on different scales.
pub fn central_difference<F>(mut eval: F, params: &[f64], deltas: &[f64]) -> Result<Vec<f64>>
where
    F: FnMut(&[f64]) -> Result<f64>,
{
    debug_assert_eq!(params.len(), deltas.len());

    let mut gradient = Vec::with_capacity(params.len());
    let mut trial = params.to_vec();
    for i in 0..params.len() {
        let delta = deltas[i];

        trial[i] = params[i] + delta;
        let forward = eval(&trial)?;
        trial[i] = params[i] - delta;
        let backward = eval(&trial)?;
        trial[i] = params[i];

        gradient.push((forward - backward) / (2.0 * delta));
    }
    Ok(gradient)
}
