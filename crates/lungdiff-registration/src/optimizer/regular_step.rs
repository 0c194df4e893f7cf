//! Regular-step gradient descent.
//!
//! Gradient ascent with a step length that relaxes whenever the gradient
//! direction reverses. The step starts at `max_step` and is halved on
//! each reversal; the walk stops when the step underflows `min_step`,
//! the gradient magnitude underflows the tolerance, or the iteration cap
//! is reached.

use crate::error::{RegistrationError, Result};

/// Why the optimizer stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopCondition {
    /// Iteration cap reached.
    MaxIterations,
    /// Step length fell below the minimum.
    StepTooSmall,
    /// Gradient magnitude fell below the tolerance.
    GradientTooSmall,
}

/// Final state of an optimization run.
#[derive(Debug, Clone)]
pub struct OptimizerOutcome {
    /// Best parameters found.
    pub parameters: Vec<f64>,
    /// Metric value at the final parameters.
    pub value: f64,
    /// Iterations actually run.
    pub iterations: usize,
    /// Why the walk stopped.
    pub stop_condition: StopCondition,
}

/// Regular-step gradient ascent optimizer.
#[derive(Debug, Clone)]
pub struct RegularStepGradientDescent {
    max_step: f64,
    min_step: f64,
    max_iterations: usize,
    gradient_tolerance: f64,
    relaxation: f64,
}

impl RegularStepGradientDescent {
    /// Optimizer with the given step bounds and iteration cap.
    pub fn new(max_step: f64, min_step: f64, max_iterations: usize) -> Self {
        Self {
            max_step,
            min_step,
            max_iterations,
            gradient_tolerance: 1e-4,
            relaxation: 0.5,
        }
    }

    /// Override the gradient magnitude stopping tolerance.
    pub fn with_gradient_tolerance(mut self, tolerance: f64) -> Self {
        self.gradient_tolerance = tolerance;
        self
    }

    /// Check the configuration before running.
    pub fn validate(&self) -> Result<()> {
        if !(self.max_step > 0.0) || !(self.min_step > 0.0) || self.min_step > self.max_step {
            return Err(RegistrationError::invalid_configuration(
                "step lengths must satisfy 0 < min_step <= max_step",
            ));
        }
        if self.max_iterations == 0 {
            return Err(RegistrationError::invalid_configuration(
                "iteration cap must be >= 1",
            ));
        }
        Ok(())
    }

    /// Maximize a function of the parameters.
    ///
    /// `eval` receives the iteration index and the current parameters and
    /// returns the metric value with its gradient. The index lets callers
    /// freeze their random sample per iteration.
    pub fn optimize<F>(&self, initial: Vec<f64>, mut eval: F) -> Result<OptimizerOutcome>
    where
        F: FnMut(usize, &[f64]) -> Result<(f64, Vec<f64>)>,
    {
        self.validate()?;

        let mut params = initial;
        let mut step = self.max_step;
        let mut previous_gradient: Option<Vec<f64>> = None;
        let mut value = f64::NEG_INFINITY;
        let mut stop = StopCondition::MaxIterations;
        let mut iterations = 0;

        for iteration in 0..self.max_iterations {
            let (current, gradient) = eval(iteration, &params)?;
            value = current;
            iterations = iteration + 1;

            let magnitude = gradient.iter().map(|g| g * g).sum::<f64>().sqrt();
            if magnitude < self.gradient_tolerance {
                stop = StopCondition::GradientTooSmall;
                break;
            }

            // Direction reversal relaxes the step length
            if let Some(previous) = &previous_gradient {
                let dot: f64 = previous.iter().zip(gradient.iter()).map(|(a, b)| a * b).sum();
                if dot < 0.0 {
                    step *= self.relaxation;
                }
            }
            if step < self.min_step {
                stop = StopCondition::StepTooSmall;
                break;
            }

            // Ascend along the unit gradient
            for (p, g) in params.iter_mut().zip(gradient.iter()) {
                *p += step * g / magnitude;
            }
            if params.iter().any(|p| !p.is_finite()) {
                return Err(RegistrationError::divergence(format!(
                    "non-finite parameters at iteration {}",
                    iteration
                )));
            }

            previous_gradient = Some(gradient);
        }

        Ok(OptimizerOutcome {
            parameters: params,
            value,
            iterations,
            stop_condition: stop,
        })
    }
}
