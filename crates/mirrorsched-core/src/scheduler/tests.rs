use super::*;

use std::collections::HashSet;
use std::future::Future;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::control::{CancelToken, StopHandle, StopSignal};
use crate::job::{JobDescriptor, JobId, ToolCommand};
use crate::runner::{InvocationError, InvocationOutput, JobRunner};
use crate::window::{Clock, DayFilter, RunWindow};

fn jobs(n: u64) -> Vec<JobDescriptor> {
    (1..=n)
        .map(|id| JobDescriptor {
            id,
            name: format!("folder{id}"),
            source: format!("/src/folder{id}"),
            target: format!("/dst/folder{id}"),
            is_root: true,
            command: ToolCommand::new("tool", vec![format!("/src/folder{id}")]),
            log_path: PathBuf::from(format!("/logs/{id}.log")),
        })
        .collect()
}

fn settings(concurrency: usize) -> SchedulerSettings {
    SchedulerSettings {
        concurrency,
        poll_interval: Duration::from_millis(5),
        report_interval: Duration::from_millis(20),
        cancel_grace: Duration::from_secs(2),
        run_windows: Vec::new(),
    }
}

/// Wednesday 10:00.
fn wednesday_morning() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 5, 15)
        .unwrap()
        .and_time(NaiveTime::from_hms_opt(10, 0, 0).unwrap())
}

fn business_hours() -> RunWindow {
    RunWindow::new(
        DayFilter::Weekdays,
        NaiveTime::from_hms_opt(7, 0, 0).unwrap(),
        NaiveTime::from_hms_opt(19, 0, 0).unwrap(),
    )
}

struct FixedClock(NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

/// Open until `closed` is set, then reports a time inside business hours.
struct SwitchClock {
    closed: Arc<AtomicBool>,
}

impl Clock for SwitchClock {
    fn now(&self) -> NaiveDateTime {
        if self.closed.load(Ordering::SeqCst) {
            wednesday_morning()
        } else {
            wednesday_morning() - chrono::Duration::hours(8)
        }
    }
}

/// Fake tool: behaviour per job id, with concurrency bookkeeping.
#[derive(Default)]
struct ScriptedRunner {
    failing: HashSet<JobId>,
    /// Run until canceled.
    hanging: HashSet<JobId>,
    /// Ignore cancellation entirely.
    stubborn: HashSet<JobId>,
    panicking: HashSet<JobId>,
    stop_when_started: Option<(JobId, StopHandle)>,
    running: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
    started: Arc<Mutex<Vec<JobId>>>,
}

impl JobRunner for ScriptedRunner {
    fn invoke(
        &self,
        job: Arc<JobDescriptor>,
        cancel: CancelToken,
    ) -> impl Future<Output = Result<InvocationOutput, InvocationError>> + Send + 'static {
        self.started.lock().unwrap().push(job.id);
        if let Some((id, handle)) = &self.stop_when_started {
            if *id == job.id {
                handle.request();
            }
        }
        let fail = self.failing.contains(&job.id);
        let hang = self.hanging.contains(&job.id);
        let stubborn = self.stubborn.contains(&job.id);
        let panics = self.panicking.contains(&job.id);
        let running = Arc::clone(&self.running);
        let peak = Arc::clone(&self.peak);

        async move {
            let now = running.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);
            let result = if panics {
                running.fetch_sub(1, Ordering::SeqCst);
                panic!("tool wrapper crashed");
            } else if stubborn {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(InvocationOutput::default())
            } else if hang {
                cancel.cancelled().await;
                Err(InvocationError::Canceled)
            } else {
                tokio::time::sleep(Duration::from_millis(15)).await;
                if fail {
                    Err(InvocationError::ExitStatus {
                        code: 16,
                        output: InvocationOutput {
                            exit_code: Some(16),
                            stdout: String::new(),
                            stderr: "ERROR 5 (0x00000005) Access is denied.".to_string(),
                        },
                    })
                } else {
                    Ok(InvocationOutput {
                        exit_code: Some(0),
                        ..InvocationOutput::default()
                    })
                }
            };
            running.fetch_sub(1, Ordering::SeqCst);
            result
        }
    }
}

async fn run_with_timeout<R: JobRunner, C: Clock>(
    scheduler: &Scheduler<R, C>,
    jobs: Vec<JobDescriptor>,
) -> Summary {
    tokio::time::timeout(Duration::from_secs(10), scheduler.run(jobs))
        .await
        .expect("scheduler run should finish")
}

#[tokio::test]
async fn never_more_than_limit_running_and_all_finish() {
    let runner = ScriptedRunner::default();
    let peak = Arc::clone(&runner.peak);
    let started = Arc::clone(&runner.started);
    let scheduler = Scheduler::new(settings(2), runner, StopSignal::new());

    let summary = run_with_timeout(&scheduler, jobs(5)).await;

    assert_eq!(summary.termination, Termination::Exhausted);
    assert_eq!(summary.submitted, 5);
    assert_eq!(summary.started, 5);
    assert_eq!(summary.completed, 5);
    assert_eq!(summary.failed, 0);
    assert!(peak.load(Ordering::SeqCst) <= 2);
    assert!(summary.peak_running <= 2);
    assert!(summary.outcomes.values().all(|s| *s == JobState::Completed));
    assert_eq!(*started.lock().unwrap(), vec![1, 2, 3, 4, 5]);
}

#[tokio::test]
async fn failed_job_does_not_stop_the_pool() {
    let runner = ScriptedRunner {
        failing: HashSet::from([3]),
        ..ScriptedRunner::default()
    };
    let scheduler = Scheduler::new(settings(2), runner, StopSignal::new());

    let summary = run_with_timeout(&scheduler, jobs(5)).await;

    assert_eq!(summary.termination, Termination::Exhausted);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.completed, 4);
    assert_eq!(summary.outcomes[&3], JobState::Failed);
    assert!(!summary.stopped_early());
}

#[tokio::test]
async fn panicking_job_counts_as_failed() {
    let runner = ScriptedRunner {
        panicking: HashSet::from([2]),
        ..ScriptedRunner::default()
    };
    let scheduler = Scheduler::new(settings(3), runner, StopSignal::new());

    let summary = run_with_timeout(&scheduler, jobs(3)).await;

    assert_eq!(summary.failed, 1);
    assert_eq!(summary.completed, 2);
    assert_eq!(summary.outcomes[&2], JobState::Failed);
}

#[tokio::test]
async fn stop_signal_cancels_remaining_jobs_only() {
    let stop = StopSignal::new();
    let runner = ScriptedRunner {
        hanging: HashSet::from([3, 4, 5]),
        stop_when_started: Some((4, stop.handle())),
        ..ScriptedRunner::default()
    };
    let started = Arc::clone(&runner.started);
    let scheduler = Scheduler::new(settings(2), runner, stop);

    let summary = run_with_timeout(&scheduler, jobs(5)).await;

    assert_eq!(summary.termination, Termination::Stopped(StopReason::StopSignal));
    assert!(summary.stopped_early());
    assert_eq!(summary.canceled, 3);
    assert_eq!(summary.completed, 2);
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.outcomes[&1], JobState::Completed);
    assert_eq!(summary.outcomes[&2], JobState::Completed);
    for id in [3, 4, 5] {
        assert_eq!(summary.outcomes[&id], JobState::Canceled);
    }
    // Job 5 was still queued and never started.
    assert_eq!(*started.lock().unwrap(), vec![1, 2, 3, 4]);
}

#[tokio::test]
async fn stop_file_present_at_start_runs_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let sentinel = dir.path().join("STOP");
    std::fs::write(&sentinel, b"").unwrap();
    let scheduler = Scheduler::new(
        settings(2),
        ScriptedRunner::default(),
        StopSignal::with_sentinel(&sentinel),
    );

    let summary = run_with_timeout(&scheduler, jobs(3)).await;

    assert_eq!(summary.termination, Termination::Stopped(StopReason::StopSignal));
    assert_eq!(summary.started, 0);
    assert_eq!(summary.canceled, 3);
}

#[tokio::test]
async fn closed_window_at_start_runs_nothing() {
    let mut settings = settings(2);
    settings.run_windows = vec![business_hours()];
    let scheduler = Scheduler::new(settings, ScriptedRunner::default(), StopSignal::new())
        .with_clock(FixedClock(wednesday_morning()));

    let summary = run_with_timeout(&scheduler, jobs(5)).await;

    assert_eq!(
        summary.termination,
        Termination::Stopped(StopReason::RunWindowClosed)
    );
    assert_eq!(summary.started, 0);
    assert_eq!(summary.canceled, 5);
}

#[tokio::test]
async fn window_closing_mid_run_interrupts_work() {
    let mut settings = settings(2);
    settings.run_windows = vec![business_hours()];
    let closed = Arc::new(AtomicBool::new(false));
    let runner = ScriptedRunner {
        hanging: HashSet::from([1, 2, 3]),
        ..ScriptedRunner::default()
    };
    let running = Arc::clone(&runner.running);
    let scheduler = Scheduler::new(settings, runner, StopSignal::new()).with_clock(SwitchClock {
        closed: Arc::clone(&closed),
    });

    let flip = {
        let closed = Arc::clone(&closed);
        async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            closed.store(true, Ordering::SeqCst);
        }
    };
    let (summary, ()) = tokio::join!(run_with_timeout(&scheduler, jobs(3)), flip);

    assert_eq!(
        summary.termination,
        Termination::Stopped(StopReason::RunWindowClosed)
    );
    assert_eq!(summary.started, 2);
    assert_eq!(summary.canceled, 3);
    assert_eq!(running.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn job_ignoring_cancel_is_forced_after_grace() {
    let stop = StopSignal::new();
    let runner = ScriptedRunner {
        stubborn: HashSet::from([1]),
        hanging: HashSet::from([2]),
        stop_when_started: Some((2, stop.handle())),
        ..ScriptedRunner::default()
    };
    let mut settings = settings(2);
    settings.cancel_grace = Duration::from_millis(50);
    let scheduler = Scheduler::new(settings, runner, stop);

    let begin = std::time::Instant::now();
    let summary = run_with_timeout(&scheduler, jobs(2)).await;

    assert!(begin.elapsed() < Duration::from_secs(5));
    assert_eq!(summary.canceled, 2);
    assert_eq!(summary.outcomes[&1], JobState::Canceled);
}

#[tokio::test]
async fn empty_job_list_finishes_immediately() {
    let scheduler = Scheduler::new(settings(4), ScriptedRunner::default(), StopSignal::new());
    let summary = run_with_timeout(&scheduler, Vec::new()).await;
    assert_eq!(summary.termination, Termination::Exhausted);
    assert_eq!(summary.submitted, 0);
    assert_eq!(summary.jobs_per_minute(), 0.0);
}

#[test]
fn summary_line_mentions_early_stop() {
    let summary = Summary {
        submitted: 5,
        started: 4,
        completed: 2,
        failed: 0,
        canceled: 3,
        peak_running: 2,
        elapsed: Duration::from_secs(120),
        termination: Termination::Stopped(StopReason::RunWindowClosed),
        outcomes: Default::default(),
    };
    let line = summary.to_string();
    assert!(line.starts_with("2 of 5 job(s) completed, 0 failed, 3 canceled in 2.0 min (1.00 jobs/min)"));
    assert!(line.ends_with("stopped early: run window closed"));
}
