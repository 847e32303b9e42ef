//! CLI command handlers, one per file.

mod plan;
mod run;
mod throttle;
mod window;

pub use plan::run_plan;
pub use run::run_mirror;
pub use throttle::run_throttle;
pub use window::run_window;

use anyhow::{Context, Result};
use mirrorsched_core::catalog::{self, CatalogRecord};
use mirrorsched_core::config::MirrorConfig;
use std::path::Path;

/// Load catalog records from `explicit` or the configured catalog path.
fn load_records(cfg: &MirrorConfig, explicit: Option<&Path>) -> Result<Vec<CatalogRecord>> {
    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => cfg.resolved_catalog_path()?,
    };
    let records =
        catalog::load_catalog(&path).with_context(|| format!("load catalog {}", path.display()))?;
    tracing::info!(path = %path.display(), records = records.len(), "catalog loaded");
    Ok(records)
}
