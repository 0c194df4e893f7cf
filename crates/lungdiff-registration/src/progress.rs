//! Iteration progress reporting.

/// Callback invoked after each registration iteration with the iteration
/// index and the current metric value. The call happens strictly after
/// the iteration's update and before the next iteration starts.
pub type IterationCallback<'a> = dyn FnMut(usize, f64) + 'a;

/// A callback that logs the metric at a fixed iteration interval.
pub fn log_progress(interval: usize) -> impl FnMut(usize, f64) {
    move |iteration, metric| {
        if interval > 0 && iteration % interval == 0 {
            tracing::info!(iteration, metric, "registration progress");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_callback_receives_each_iteration() {
        let mut seen = Vec::new();
        {
            let mut callback = |iteration: usize, metric: f64| seen.push((iteration, metric));
            let cb: &mut IterationCallback = &mut callback;
            for i in 0..3 {
                cb(i, i as f64 * 0.5);
            }
        }
        assert_eq!(seen, vec![(0, 0.0), (1, 0.5), (2, 1.0)]);
    }
}
