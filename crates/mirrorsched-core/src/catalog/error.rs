use std::path::PathBuf;

use thiserror::Error;

/// Fatal catalog problems. Any of these aborts the run before a job is submitted.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("read catalog {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse catalog: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("catalog record {index}: missing {field}")]
    MissingField { index: usize, field: &'static str },
}

/// Why a catalog folder did not become a job. Not fatal; logged as a warning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    SourceUnreachable,
    DestinationUnreachable,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::SourceUnreachable => write!(f, "source path unreachable"),
            SkipReason::DestinationUnreachable => write!(f, "destination path unreachable"),
        }
    }
}
