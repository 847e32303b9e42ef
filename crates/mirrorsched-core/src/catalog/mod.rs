//! Folder catalog: input records to a deduplicated, ordered list of folder pairs.
//!
//! Every non-excluded record becomes a root pair (copied without recursion).
//! Each immediate subfolder of a root that is not itself listed in the catalog
//! becomes a discovered pair (copied recursively). Pairs are unique by
//! normalized source and destination path.

mod error;
pub mod path;
mod source;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

pub use error::{CatalogError, SkipReason};
pub use source::{FolderSource, LocalFolders};

/// One entry of the catalog file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogRecord {
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub destination: String,
    /// Excluded folders are neither copied as roots nor discovered as subfolders.
    #[serde(default)]
    pub exclude: bool,
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    folder: Vec<CatalogRecord>,
}

/// Parse catalog TOML (`[[folder]]` tables) and check required fields.
pub fn parse_catalog(data: &str) -> Result<Vec<CatalogRecord>, CatalogError> {
    let file: CatalogFile = toml::from_str(data)?;
    for (index, record) in file.folder.iter().enumerate() {
        if record.source.trim().is_empty() {
            return Err(CatalogError::MissingField {
                index,
                field: "source",
            });
        }
        if record.destination.trim().is_empty() && !record.exclude {
            return Err(CatalogError::MissingField {
                index,
                field: "destination",
            });
        }
    }
    Ok(file.folder)
}

pub fn load_catalog(path: &Path) -> Result<Vec<CatalogRecord>, CatalogError> {
    let data = std::fs::read_to_string(path).map_err(|source| CatalogError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_catalog(&data)
}

/// A source/destination folder pair that becomes exactly one job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FolderPair {
    /// Label relative to the catalog root, e.g. `Projects` or `Projects/2024`.
    pub name: String,
    pub source: String,
    pub target: String,
    /// Declared in the catalog (as opposed to discovered as a subfolder).
    pub is_root: bool,
}

/// Result of expanding the catalog.
#[derive(Debug, Default)]
pub struct CatalogPlan {
    pub pairs: Vec<FolderPair>,
    /// Declared folders that were dropped because a path was unreachable.
    pub skipped: Vec<(CatalogRecord, SkipReason)>,
    /// Records dropped as duplicates of an earlier record.
    pub duplicates: usize,
}

impl CatalogPlan {
    pub fn root_count(&self) -> usize {
        self.pairs.iter().filter(|p| p.is_root).count()
    }
}

/// Expand catalog records into folder pairs, in input order, each root followed
/// by its discovered subfolders sorted by name.
pub fn expand<F: FolderSource + ?Sized>(records: &[CatalogRecord], folders: &F) -> CatalogPlan {
    let declared: HashSet<String> = records.iter().map(|r| path::normalize(&r.source)).collect();
    let excluded: HashSet<String> = records
        .iter()
        .filter(|r| r.exclude)
        .map(|r| path::normalize(&r.source))
        .collect();
    let mut seen: HashSet<(String, String)> = HashSet::new();
    let mut plan = CatalogPlan::default();

    for record in records.iter().filter(|r| !r.exclude) {
        let source_key = path::normalize(&record.source);
        if excluded.contains(&source_key) {
            tracing::debug!(source = %record.source, "folder is excluded elsewhere in the catalog");
            continue;
        }
        if !seen.insert((source_key, path::normalize(&record.destination))) {
            tracing::warn!(source = %record.source, "duplicate catalog entry ignored");
            plan.duplicates += 1;
            continue;
        }

        if let Some(reason) = unreachable_reason(record, folders) {
            tracing::warn!(
                source = %record.source,
                destination = %record.destination,
                "skipping folder: {}",
                reason
            );
            plan.skipped.push((record.clone(), reason));
            continue;
        }

        let root_name = path::last_component(&record.source)
            .unwrap_or(&record.source)
            .to_string();
        plan.pairs.push(FolderPair {
            name: root_name.clone(),
            source: record.source.clone(),
            target: record.destination.clone(),
            is_root: true,
        });

        let mut subs = match folders.subfolders(&record.source) {
            Ok(subs) => subs,
            Err(e) => {
                tracing::warn!(source = %record.source, "cannot list subfolders: {}", e);
                continue;
            }
        };
        subs.sort();
        for sub in subs {
            let source = path::join(&record.source, &sub);
            let source_key = path::normalize(&source);
            if declared.contains(&source_key) {
                continue;
            }
            let target = path::join(&record.destination, &sub);
            if !seen.insert((source_key, path::normalize(&target))) {
                continue;
            }
            plan.pairs.push(FolderPair {
                name: format!("{}/{}", root_name, sub),
                source,
                target,
                is_root: false,
            });
        }
    }

    tracing::info!(
        roots = plan.root_count(),
        discovered = plan.pairs.len() - plan.root_count(),
        skipped = plan.skipped.len(),
        duplicates = plan.duplicates,
        "catalog expanded"
    );
    plan
}

fn unreachable_reason<F: FolderSource + ?Sized>(
    record: &CatalogRecord,
    folders: &F,
) -> Option<SkipReason> {
    if !folders.is_dir(&record.source) {
        return Some(SkipReason::SourceUnreachable);
    }
    // The destination folder itself may not exist yet; its parent must.
    let destination_ok = folders.is_dir(&record.destination)
        || path::parent(&record.destination).is_some_and(|p| folders.is_dir(&p));
    if !destination_ok {
        return Some(SkipReason::DestinationUnreachable);
    }
    None
}
