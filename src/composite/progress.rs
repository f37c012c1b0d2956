use crate::foundation::error::HyperblendResult;

/// Receives `(completed, total)` depth-step counts once per depth step.
///
/// Reporting is best-effort: an `Err` is logged by the compositor and otherwise ignored.
pub trait ProgressSink {
    /// Called after every channel of one depth step has been blended.
    fn report(&mut self, completed: usize, total: usize) -> HyperblendResult<()>;
}

impl<F> ProgressSink for F
where
    F: FnMut(usize, usize),
{
    fn report(&mut self, completed: usize, total: usize) -> HyperblendResult<()> {
        self(completed, total);
        Ok(())
    }
}

/// Sink that drops every report.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&mut self, _completed: usize, _total: usize) -> HyperblendResult<()> {
        Ok(())
    }
}

/// Sink that emits a `tracing` event per report.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingProgress;

impl ProgressSink for TracingProgress {
    fn report(&mut self, completed: usize, total: usize) -> HyperblendResult<()> {
        tracing::info!(
            completed,
            total,
            fraction = progress_fraction(completed, total),
            "composite progress"
        );
        Ok(())
    }
}

/// `completed / total` as a fraction in `[0, 1]`; an empty run counts as done.
pub fn progress_fraction(completed: usize, total: usize) -> f64 {
    if total == 0 {
        return 1.0;
    }
    (completed.min(total) as f64) / (total as f64)
}

#[cfg(test)]
#[path = "../../tests/unit/composite/progress.rs"]
mod tests;
