//! Throughput reporting for a running batch.
//!
//! The coordinator takes a snapshot whenever the report interval has passed
//! and logs it; reporting never influences scheduling.

use std::time::Duration;

/// Snapshot of pool progress.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressStats {
    /// Jobs currently running.
    pub active: usize,
    /// Jobs not started yet.
    pub queued: usize,
    pub completed: usize,
    pub failed: usize,
    /// Time since scheduling started.
    pub elapsed: Duration,
}

impl ProgressStats {
    /// Completed jobs per minute since start (0 if no time has elapsed).
    pub fn jobs_per_minute(&self) -> f64 {
        jobs_per_minute(self.completed, self.elapsed)
    }
}

pub(crate) fn jobs_per_minute(completed: usize, elapsed: Duration) -> f64 {
    let minutes = elapsed.as_secs_f64() / 60.0;
    if minutes <= 0.0 {
        return 0.0;
    }
    completed as f64 / minutes
}

pub(crate) fn report(stats: &ProgressStats) {
    tracing::info!(
        active = stats.active,
        queued = stats.queued,
        completed = stats.completed,
        failed = stats.failed,
        "progress: {:.2} jobs/min after {:.1} min",
        stats.jobs_per_minute(),
        stats.elapsed.as_secs_f64() / 60.0
    );
}
