//! Coordinator-owned run state. Only the monitoring loop touches it.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::control::CancelToken;
use crate::job::{JobDescriptor, JobId};
use crate::runner::{InvocationError, InvocationOutput};

use super::progress::ProgressStats;
use super::summary::{Summary, Termination};

/// Lifecycle of a job inside one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Queued,
    Running,
    Completed,
    Failed,
    /// Interrupted by a hard stop before reaching Completed or Failed.
    Canceled,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed | JobState::Canceled)
    }
}

pub(super) type JobTask = JoinHandle<Result<InvocationOutput, InvocationError>>;

/// A job in flight.
pub(super) struct JobHandle {
    pub(super) descriptor: Arc<JobDescriptor>,
    pub(super) task: JobTask,
    pub(super) cancel: CancelToken,
    pub(super) started_at: Instant,
}

pub(super) struct PoolState {
    pub(super) queue: VecDeque<JobDescriptor>,
    pub(super) active: BTreeMap<JobId, JobHandle>,
    pub(super) submitted: usize,
    pub(super) started: usize,
    pub(super) completed: usize,
    pub(super) failed: usize,
    pub(super) canceled: usize,
    pub(super) outcomes: BTreeMap<JobId, JobState>,
    pub(super) started_at: Instant,
    pub(super) last_report: Instant,
}

impl PoolState {
    pub(super) fn new(jobs: Vec<JobDescriptor>) -> Self {
        let now = Instant::now();
        let outcomes = jobs.iter().map(|j| (j.id, JobState::Queued)).collect();
        Self {
            submitted: jobs.len(),
            queue: jobs.into(),
            active: BTreeMap::new(),
            started: 0,
            completed: 0,
            failed: 0,
            canceled: 0,
            outcomes,
            started_at: now,
            last_report: now,
        }
    }

    pub(super) fn mark_running(&mut self, id: JobId) {
        self.started += 1;
        self.outcomes.insert(id, JobState::Running);
    }

    /// Record a terminal state and bump its counter.
    pub(super) fn finish(&mut self, id: JobId, state: JobState) {
        if !state.is_terminal() {
            return;
        }
        match state {
            JobState::Completed => self.completed += 1,
            JobState::Failed => self.failed += 1,
            _ => self.canceled += 1,
        }
        self.outcomes.insert(id, state);
    }

    /// Nothing queued and nothing in flight.
    pub(super) fn is_exhausted(&self) -> bool {
        self.queue.is_empty() && self.active.is_empty()
    }

    pub(super) fn progress(&self) -> ProgressStats {
        ProgressStats {
            active: self.active.len(),
            queued: self.queue.len(),
            completed: self.completed,
            failed: self.failed,
            elapsed: self.started_at.elapsed(),
        }
    }

    /// Snapshot for the progress log once `interval` has passed since the last
    /// report; restarts the interval when it fires.
    pub(super) fn report_due(&mut self, now: Instant, interval: Duration) -> Option<ProgressStats> {
        if now.saturating_duration_since(self.last_report) < interval {
            return None;
        }
        self.last_report = now;
        Some(self.progress())
    }

    pub(super) fn into_summary(self, termination: Termination, peak_running: usize) -> Summary {
        Summary {
            submitted: self.submitted,
            started: self.started,
            completed: self.completed,
            failed: self.failed,
            canceled: self.canceled,
            peak_running,
            elapsed: self.started_at.elapsed(),
            termination,
            outcomes: self.outcomes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::ToolCommand;
    use std::path::PathBuf;

    fn queued(n: u64) -> PoolState {
        let jobs = (1..=n)
            .map(|id| JobDescriptor {
                id,
                name: format!("f{id}"),
                source: format!("/s/f{id}"),
                target: format!("/t/f{id}"),
                is_root: true,
                command: ToolCommand::new("tool", vec![]),
                log_path: PathBuf::from(format!("/l/{id}.log")),
            })
            .collect();
        PoolState::new(jobs)
    }

    #[test]
    fn report_fires_after_interval_and_restarts_it() {
        let mut state = queued(4);
        let interval = Duration::from_secs(60);
        let start = state.last_report;

        assert!(state.report_due(start + Duration::from_secs(59), interval).is_none());

        state.mark_running(1);
        state.finish(1, JobState::Completed);
        state.mark_running(2);
        state.finish(2, JobState::Failed);
        state.queue.pop_front();
        state.queue.pop_front();

        let at = start + Duration::from_secs(61);
        let stats = state.report_due(at, interval).expect("interval elapsed");
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.queued, 2);
        assert_eq!(stats.active, 0);
        assert_eq!(state.last_report, at);

        assert!(state.report_due(at + Duration::from_secs(1), interval).is_none());
        assert!(state.report_due(at + interval, interval).is_some());
    }

    #[test]
    fn finish_ignores_non_terminal_states() {
        let mut state = queued(1);
        state.mark_running(1);
        state.finish(1, JobState::Running);
        assert_eq!(state.outcomes[&1], JobState::Running);
        assert_eq!(state.completed + state.failed + state.canceled, 0);
        state.finish(1, JobState::Canceled);
        assert_eq!(state.canceled, 1);
        assert_eq!(state.outcomes[&1], JobState::Canceled);
    }
}
