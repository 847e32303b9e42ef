//! `mirrorsched run` – expand the catalog and run the mirror jobs.

use anyhow::{Context, Result};
use mirrorsched_core::catalog::LocalFolders;
use mirrorsched_core::config::MirrorConfig;
use mirrorsched_core::control::StopSignal;
use mirrorsched_core::plan;
use mirrorsched_core::runner::ProcessRunner;
use mirrorsched_core::job::JobId;
use mirrorsched_core::scheduler::{JobState, Scheduler, SchedulerSettings, Summary};
use std::collections::HashMap;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use crate::cli::EXIT_STOPPED_EARLY;

pub async fn run_mirror(
    cfg: &MirrorConfig,
    catalog: Option<&Path>,
    jobs: Option<usize>,
) -> Result<i32> {
    let records = super::load_records(cfg, catalog)?;
    let concurrency = jobs.unwrap_or(cfg.concurrency);

    let log_dir = cfg.resolved_log_dir()?;
    fs::create_dir_all(&log_dir)
        .with_context(|| format!("create log dir {}", log_dir.display()))?;

    let prepared = plan::prepare(cfg, &records, &LocalFolders, concurrency, &log_dir);
    for (record, reason) in &prepared.catalog.skipped {
        println!("Skipped {} -> {}: {}", record.source, record.destination, reason);
    }
    if prepared.jobs.is_empty() {
        println!("No jobs to run.");
    }
    println!(
        "{} job(s) from {} catalog folder(s), up to {} at a time.",
        prepared.jobs.len(),
        prepared.catalog.root_count(),
        concurrency
    );

    let stop_file = cfg.resolved_stop_file()?;
    if stop_file.exists() {
        tracing::warn!(path = %stop_file.display(), "stop file already present, run will stop immediately");
    }
    let stop = StopSignal::with_sentinel(&stop_file);
    let handle = stop.handle();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, requesting stop");
            eprintln!("Interrupt received, stopping running jobs...");
            handle.request();
        }
    });

    let names: HashMap<_, _> = prepared
        .jobs
        .iter()
        .map(|j| (j.id, j.name.clone()))
        .collect();

    let mut settings = SchedulerSettings::from_config(cfg);
    settings.concurrency = concurrency;
    let scheduler = Scheduler::new(settings, ProcessRunner::from_config(&cfg.tool), stop);
    let summary = scheduler.run(prepared.jobs).await;
    interrupt.abort();

    print!("{}", render_outcome(&summary, &names, &log_dir));
    tracing::info!("run finished: {}", summary);

    Ok(if summary.stopped_early() {
        EXIT_STOPPED_EARLY
    } else {
        0
    })
}

/// Failed job names followed by the summary line; printed for every run.
fn render_outcome(summary: &Summary, names: &HashMap<JobId, String>, log_dir: &Path) -> String {
    let mut out = String::new();
    for (id, state) in &summary.outcomes {
        if *state == JobState::Failed {
            let name = names.get(id).map(String::as_str).unwrap_or("?");
            let _ = writeln!(out, "Failed: {} (log in {})", name, log_dir.display());
        }
    }
    let _ = writeln!(out, "{}", summary);
    out
}
