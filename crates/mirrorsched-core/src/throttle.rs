//! Inter-packet gap calculation for the external copy tool.
//!
//! The tool sends data in fixed blocks and can be told to wait a number of
//! milliseconds between blocks. Every concurrently running job gets the same
//! gap, sized so that all jobs together use roughly the desired bandwidth.

use crate::config::ThrottleConfig;

/// Block size the tool transfers between two gaps.
pub const BLOCK_BYTES: u64 = 64 * 1024;

/// Block size in megabits (bandwidths are configured in Mbit/s).
const BLOCK_MEGABITS: f64 = (BLOCK_BYTES * 8) as f64 / 1_000_000.0;

/// Delay in ms the tool must wait between blocks so that `threads` jobs
/// together use about `desired_mbps` of a link with `available_mbps`.
///
/// `threads` of 0 is treated as 1. Returns 0 for non-positive bandwidths or when
/// a job's share already meets the available bandwidth.
pub fn compute_delay(available_mbps: f64, desired_mbps: f64, threads: usize) -> u64 {
    if !(available_mbps > 0.0) || !(desired_mbps > 0.0) {
        return 0;
    }
    let threads = threads.max(1) as f64;
    let share = desired_mbps / threads;
    // Wire time per block is BLOCK/available; at the target rate it is BLOCK/share.
    let gap_secs = BLOCK_MEGABITS * (available_mbps - share) / (available_mbps * share);
    (gap_secs * 1000.0).round().max(0.0) as u64
}

/// Bandwidth one job achieves with `delay_ms` between blocks, in Mbit/s or as a
/// percentage of `available_mbps`. Used for diagnostics only.
pub fn effective_bandwidth(available_mbps: f64, delay_ms: u64, as_percentage: bool) -> f64 {
    if !(available_mbps > 0.0) {
        return 0.0;
    }
    let per_block_secs = BLOCK_MEGABITS / available_mbps + delay_ms as f64 / 1000.0;
    let effective = BLOCK_MEGABITS / per_block_secs;
    if as_percentage {
        effective / available_mbps * 100.0
    } else {
        effective
    }
}

/// The throttle delay shared by every job of a run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThrottleSettings {
    pub delay_ms: u64,
    /// Thread count the delay was computed for.
    pub threads: usize,
    /// True when the delay came from `override_ms`.
    pub overridden: bool,
}

impl ThrottleSettings {
    /// Resolve the delay for a run of `job_count` jobs at `concurrency`.
    ///
    /// Returns `None` when throttling is disabled: no `[throttle]` section, or
    /// no override and not `0 < desired <= available`.
    pub fn resolve(
        cfg: Option<&ThrottleConfig>,
        concurrency: usize,
        job_count: usize,
    ) -> Option<ThrottleSettings> {
        let cfg = cfg?;
        let threads = concurrency.min(job_count).max(1);

        if let Some(delay_ms) = cfg.override_ms {
            match cfg.available_mbps {
                Some(available) if available > 0.0 => tracing::info!(
                    delay_ms,
                    "throttle override: {:.1}% of available bandwidth per job",
                    effective_bandwidth(available, delay_ms, true)
                ),
                _ => tracing::info!(delay_ms, "throttle override"),
            }
            return Some(ThrottleSettings {
                delay_ms,
                threads,
                overridden: true,
            });
        }

        let (available, desired) = match (cfg.available_mbps, cfg.desired_mbps) {
            (Some(a), Some(d)) if d > 0.0 && d <= a => (a, d),
            (a, d) => {
                tracing::info!(
                    available = ?a,
                    desired = ?d,
                    "throttling disabled (requires 0 < desired <= available)"
                );
                return None;
            }
        };

        let delay_ms = compute_delay(available, desired, threads);
        tracing::info!(
            delay_ms,
            threads,
            "throttle: {:.2} Mbit/s per job ({:.1}% of {} Mbit/s), target {} Mbit/s total",
            effective_bandwidth(available, delay_ms, false),
            effective_bandwidth(available, delay_ms, true),
            available,
            desired
        );
        Some(ThrottleSettings {
            delay_ms,
            threads,
            overridden: false,
        })
    }
}
