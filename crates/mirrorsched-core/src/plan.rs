//! Configuration + catalog to a ready-to-run job list.

use std::path::Path;

use crate::catalog::{self, CatalogPlan, CatalogRecord, FolderSource};
use crate::config::MirrorConfig;
use crate::job::{self, JobDescriptor};
use crate::throttle::ThrottleSettings;

/// Everything the scheduler needs for one run.
#[derive(Debug)]
pub struct PreparedRun {
    pub jobs: Vec<JobDescriptor>,
    pub throttle: Option<ThrottleSettings>,
    pub catalog: CatalogPlan,
}

/// Expand the catalog, resolve the shared throttle delay for `concurrency`
/// against the resulting job count, and materialize one command per job.
pub fn prepare<F: FolderSource + ?Sized>(
    cfg: &MirrorConfig,
    records: &[CatalogRecord],
    folders: &F,
    concurrency: usize,
    log_dir: &Path,
) -> PreparedRun {
    let catalog = catalog::expand(records, folders);
    let throttle =
        ThrottleSettings::resolve(cfg.throttle.as_ref(), concurrency, catalog.pairs.len());
    let jobs = job::build_jobs(&catalog.pairs, &cfg.tool, throttle, log_dir);
    PreparedRun {
        jobs,
        throttle,
        catalog,
    }
}
