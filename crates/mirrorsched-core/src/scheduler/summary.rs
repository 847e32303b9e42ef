use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use crate::job::JobId;

use super::progress::jobs_per_minute;
use super::state::JobState;

/// Why the scheduler stopped before every job reached a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Stop file present or in-process stop requested.
    StopSignal,
    /// The current time fell into a configured run window.
    RunWindowClosed,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::StopSignal => f.write_str("stop signal"),
            StopReason::RunWindowClosed => f.write_str("run window closed"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Every job completed or failed.
    Exhausted,
    /// Hard stop; remaining jobs were canceled.
    Stopped(StopReason),
}

/// Result of one scheduler run.
#[derive(Debug, Clone)]
pub struct Summary {
    /// Jobs handed to the scheduler.
    pub submitted: usize,
    /// Jobs whose tool invocation was started.
    pub started: usize,
    pub completed: usize,
    pub failed: usize,
    /// Jobs interrupted by a hard stop (running or still queued).
    pub canceled: usize,
    /// Most jobs running at the same time.
    pub peak_running: usize,
    pub elapsed: Duration,
    pub termination: Termination,
    /// Final state of every job.
    pub outcomes: BTreeMap<JobId, JobState>,
}

impl Summary {
    pub fn stopped_early(&self) -> bool {
        matches!(self.termination, Termination::Stopped(_))
    }

    pub fn jobs_per_minute(&self) -> f64 {
        jobs_per_minute(self.completed, self.elapsed)
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} of {} job(s) completed, {} failed, {} canceled in {:.1} min ({:.2} jobs/min)",
            self.completed,
            self.submitted,
            self.failed,
            self.canceled,
            self.elapsed.as_secs_f64() / 60.0,
            self.jobs_per_minute()
        )?;
        if let Termination::Stopped(reason) = self.termination {
            write!(f, "; stopped early: {}", reason)?;
        }
        Ok(())
    }
}
