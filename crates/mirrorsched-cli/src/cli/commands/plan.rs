//! `mirrorsched plan` – show what a run would do.

use anyhow::Result;
use mirrorsched_core::catalog::LocalFolders;
use mirrorsched_core::config::MirrorConfig;
use mirrorsched_core::plan;
use std::path::Path;

pub fn run_plan(cfg: &MirrorConfig, catalog: Option<&Path>, json: bool) -> Result<()> {
    let records = super::load_records(cfg, catalog)?;
    let log_dir = cfg.resolved_log_dir()?;
    let prepared = plan::prepare(cfg, &records, &LocalFolders, cfg.concurrency, &log_dir);

    if json {
        println!("{}", serde_json::to_string_pretty(&prepared.jobs)?);
        return Ok(());
    }

    for (record, reason) in &prepared.catalog.skipped {
        println!("skipped  {} -> {}: {}", record.source, record.destination, reason);
    }
    if prepared.catalog.duplicates > 0 {
        println!("ignored {} duplicate catalog record(s)", prepared.catalog.duplicates);
    }
    match prepared.throttle {
        Some(t) if t.overridden => println!("throttle: {} ms (override)", t.delay_ms),
        Some(t) => println!("throttle: {} ms for {} concurrent job(s)", t.delay_ms, t.threads),
        None => println!("throttle: disabled"),
    }
    if prepared.jobs.is_empty() {
        println!("No jobs.");
        return Ok(());
    }
    println!("{:<6} {:<6} {}", "ID", "KIND", "NAME");
    for job in &prepared.jobs {
        let kind = if job.is_root { "root" } else { "sub" };
        println!("{:<6} {:<6} {}", job.id, kind, job.name);
        println!("       {}", job.command);
    }
    Ok(())
}
