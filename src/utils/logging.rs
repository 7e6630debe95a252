use log::{log_enabled, warn, Level};
use std::time::{Duration, Instant};

/// Scoped timer emitting trace spans around the stepping phases.
pub struct ScopedTimer<'a> {
    label: &'a str,
    start: Instant,
}

impl<'a> ScopedTimer<'a> {
    pub fn new(label: &'a str) -> Self {
        if log_enabled!(Level::Trace) {
            log::trace!("begin {label}");
        }
        Self {
            label,
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl<'a> Drop for ScopedTimer<'a> {
    fn drop(&mut self) {
        if log_enabled!(Level::Trace) {
            let elapsed = self.start.elapsed();
            log::trace!("end {} ({} µs)", self.label, elapsed.as_micros());
        }
    }
}

/// Warns when a substep blows through its real-time budget.
pub fn warn_if_budget_exceeded(duration: Duration, budget_ms: f32) {
    let spent_ms = duration.as_secs_f32() * 1000.0;
    if spent_ms > budget_ms {
        warn!("substep exceeded budget: {spent_ms:.2} ms > {budget_ms:.2} ms");
    }
}
