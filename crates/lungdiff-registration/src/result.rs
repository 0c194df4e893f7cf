//! Registration run summaries.

use crate::optimizer::StopCondition;

/// Summary of a finished registration stage.
#[derive(Debug, Clone)]
pub struct RegistrationResult {
    /// Metric value at the final iteration.
    pub metric_value: f64,
    /// Iterations actually run.
    pub iterations: usize,
    /// Why a parametric optimizer stopped; `None` for fixed-count stages.
    pub stop_condition: Option<StopCondition>,
}
