//! The coordinator loop: submit, poll, reap, report, and hard-stop handling.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use crate::config::MirrorConfig;
use crate::control::{CancelToken, StopSignal};
use crate::job::{JobDescriptor, JobId};
use crate::runner::{InvocationError, InvocationOutput, JobRunner};
use crate::window::{self, Clock, RunWindow, SystemClock};

use super::budget::SlotBudget;
use super::progress;
use super::state::{JobHandle, JobState, PoolState};
use super::summary::{StopReason, Summary, Termination};

/// Scheduler tuning, usually taken from [`MirrorConfig`].
#[derive(Debug, Clone)]
pub struct SchedulerSettings {
    /// Maximum number of jobs running at once (0 is treated as 1).
    pub concurrency: usize,
    pub poll_interval: Duration,
    pub report_interval: Duration,
    /// How long canceled jobs may take to exit before they are killed.
    pub cancel_grace: Duration,
    pub run_windows: Vec<RunWindow>,
}

impl SchedulerSettings {
    pub fn from_config(cfg: &MirrorConfig) -> Self {
        Self {
            concurrency: cfg.concurrency,
            poll_interval: cfg.poll_interval(),
            report_interval: cfg.report_interval(),
            cancel_grace: cfg.cancel_grace(),
            run_windows: cfg.run_windows.clone(),
        }
    }
}

/// Runs a job list with bounded concurrency under run-window and stop-signal supervision.
pub struct Scheduler<R, C = SystemClock> {
    settings: SchedulerSettings,
    runner: Arc<R>,
    stop: StopSignal,
    clock: C,
}

impl<R: JobRunner> Scheduler<R, SystemClock> {
    pub fn new(settings: SchedulerSettings, runner: R, stop: StopSignal) -> Self {
        Self {
            settings,
            runner: Arc::new(runner),
            stop,
            clock: SystemClock,
        }
    }
}

impl<R: JobRunner, C: Clock> Scheduler<R, C> {
    /// Replace the wall clock used by the run-window gate.
    pub fn with_clock<C2: Clock>(self, clock: C2) -> Scheduler<R, C2> {
        Scheduler {
            settings: self.settings,
            runner: self.runner,
            stop: self.stop,
            clock,
        }
    }

    /// Run `jobs` in order until all are terminal or a hard stop occurs.
    pub async fn run(&self, jobs: Vec<JobDescriptor>) -> Summary {
        let concurrency = self.settings.concurrency.max(1);
        let budget = Arc::new(SlotBudget::new(concurrency));
        let mut state = PoolState::new(jobs);
        tracing::info!(
            jobs = state.submitted,
            concurrency,
            windows = self.settings.run_windows.len(),
            stop_file = ?self.stop.sentinel(),
            "scheduling started"
        );

        let termination = loop {
            if let Some(reason) = self.hard_stop_reason() {
                break Termination::Stopped(reason);
            }

            self.reap_finished(&mut state).await;
            self.submit_ready(&mut state, &budget, concurrency);

            if let Some(stats) = state.report_due(Instant::now(), self.settings.report_interval) {
                progress::report(&stats);
            }

            if state.is_exhausted() {
                break Termination::Exhausted;
            }

            tokio::select! {
                _ = tokio::time::sleep(self.settings.poll_interval) => {}
                _ = self.stop.requested() => {}
            }
        };

        if let Termination::Stopped(reason) = termination {
            self.tear_down(&mut state, reason).await;
        }

        let summary = state.into_summary(termination, budget.peak());
        if summary.stopped_early() {
            tracing::warn!("{}", summary);
        } else {
            tracing::info!("{}", summary);
        }
        summary
    }

    /// Checked every tick, never cached: the gate changes as time passes.
    fn hard_stop_reason(&self) -> Option<StopReason> {
        if self.stop.is_requested() {
            return Some(StopReason::StopSignal);
        }
        let now = self.clock.now();
        if let Some(w) = window::blocking_window(&self.settings.run_windows, now) {
            tracing::info!(window = %w, now = %now, "run window closed");
            return Some(StopReason::RunWindowClosed);
        }
        None
    }

    /// Collect finished ids first, then remove and classify them.
    async fn reap_finished(&self, state: &mut PoolState) {
        let finished: Vec<JobId> = state
            .active
            .iter()
            .filter(|(_, h)| h.task.is_finished())
            .map(|(id, _)| *id)
            .collect();

        for id in finished {
            let Some(handle) = state.active.remove(&id) else {
                continue;
            };
            let JobHandle {
                descriptor,
                task,
                started_at,
                ..
            } = handle;
            // Already finished: resolves without waiting.
            let result = task
                .await
                .unwrap_or_else(|e| Err(InvocationError::Join(e.to_string())));
            let elapsed = started_at.elapsed();
            let next = classify(&descriptor, result, elapsed);
            state.finish(id, next);
        }
    }

    fn submit_ready(&self, state: &mut PoolState, budget: &Arc<SlotBudget>, concurrency: usize) {
        while state.active.len() < concurrency && !state.queue.is_empty() {
            let Some(slot) = budget.try_acquire() else {
                break;
            };
            let Some(descriptor) = state.queue.pop_front() else {
                break;
            };
            let id = descriptor.id;
            let descriptor = Arc::new(descriptor);
            let cancel = CancelToken::new();
            let invocation = self.runner.invoke(Arc::clone(&descriptor), cancel.clone());
            let task = tokio::spawn(async move {
                let _slot = slot;
                invocation.await
            });
            tracing::info!(job_id = id, name = %descriptor.name, "job started");
            tracing::debug!(job_id = id, command = %descriptor.command);
            state.mark_running(id);
            state.active.insert(
                id,
                JobHandle {
                    descriptor,
                    task,
                    cancel,
                    started_at: Instant::now(),
                },
            );
        }
    }

    /// Cancel everything that is not terminal yet. Running jobs get the cancel
    /// grace period to exit; stragglers are aborted, which kills their tool.
    async fn tear_down(&self, state: &mut PoolState, reason: StopReason) {
        // Jobs that finished since the last tick keep their real outcome.
        self.reap_finished(state).await;

        let running = state.active.len();
        let queued = state.queue.len();
        if running + queued > 0 {
            tracing::warn!(
                running,
                queued,
                "{}: interrupting {} job(s)",
                reason,
                running + queued
            );
        }

        for handle in state.active.values() {
            handle.cancel.cancel();
        }

        let deadline = Instant::now() + self.settings.cancel_grace;
        let active = std::mem::take(&mut state.active);
        for (id, mut handle) in active {
            match tokio::time::timeout_at(deadline, &mut handle.task).await {
                Ok(Ok(_)) => {
                    tracing::info!(job_id = id, name = %handle.descriptor.name, "job canceled");
                }
                Ok(Err(e)) => {
                    tracing::warn!(job_id = id, "cleanup of canceled job failed: {}", e);
                }
                Err(_) => {
                    tracing::warn!(
                        job_id = id,
                        name = %handle.descriptor.name,
                        "job ignored cancel request for {:?}; forcing termination",
                        self.settings.cancel_grace
                    );
                    handle.task.abort();
                    // Resolves once the task future is dropped, which kills the tool.
                    let _ = (&mut handle.task).await;
                }
            }
            state.finish(id, JobState::Canceled);
        }

        while let Some(descriptor) = state.queue.pop_front() {
            tracing::debug!(job_id = descriptor.id, name = %descriptor.name, "queued job not started");
            state.finish(descriptor.id, JobState::Canceled);
        }
    }
}

fn classify(
    job: &JobDescriptor,
    result: Result<InvocationOutput, InvocationError>,
    elapsed: Duration,
) -> JobState {
    match result {
        Ok(output) => {
            tracing::info!(job_id = job.id, name = %job.name, ?elapsed, "job completed");
            log_output(job.id, &output);
            JobState::Completed
        }
        Err(err) => {
            tracing::warn!(job_id = job.id, name = %job.name, ?elapsed, "job failed: {}", err);
            if let Some(output) = err.output() {
                log_output(job.id, output);
            }
            JobState::Failed
        }
    }
}

/// Tool output goes to the log as-is.
fn log_output(job_id: JobId, output: &InvocationOutput) {
    let stdout = output.stdout.trim_end();
    if !stdout.is_empty() {
        tracing::debug!(job_id, "tool stdout:\n{}", stdout);
    }
    let stderr = output.stderr.trim_end();
    if !stderr.is_empty() {
        tracing::warn!(job_id, "tool stderr:\n{}", stderr);
    }
}
