//! `mirrorsched throttle` – inter-packet delay calculator.

use mirrorsched_core::throttle::{compute_delay, effective_bandwidth};

pub fn run_throttle(available: f64, desired: f64, threads: usize) {
    let threads = threads.max(1);
    let delay = compute_delay(available, desired, threads);
    let per_job = effective_bandwidth(available, delay, false);
    let per_job_pct = effective_bandwidth(available, delay, true);
    println!("delay:   {} ms", delay);
    println!("per job: {:.2} Mbit/s ({:.1}% of available)", per_job, per_job_pct);
    println!(
        "total:   {:.2} Mbit/s across {} job(s)",
        per_job * threads as f64,
        threads
    );
}
