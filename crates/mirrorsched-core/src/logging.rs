//! Tracing setup: append to a file under the XDG state dir, stderr if that fails.

use anyhow::Result;
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,mirrorsched=debug,mirrorsched_core=debug";

/// Where log output ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogDestination {
    File(PathBuf),
    Stderr,
}

impl fmt::Display for LogDestination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogDestination::File(p) => write!(f, "{}", p.display()),
            LogDestination::Stderr => f.write_str("stderr"),
        }
    }
}

/// `$XDG_STATE_HOME/mirrorsched/mirrorsched.log`.
pub fn log_file_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("mirrorsched")?;
    Ok(xdg_dirs.get_state_home().join("mirrorsched.log"))
}

/// `RUST_LOG` if set and valid, otherwise the crate defaults.
fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

fn open_append(path: &Path) -> Result<File> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    Ok(OpenOptions::new().create(true).append(true).open(path)?)
}

/// Install the global subscriber. Falls back to stderr when the log file cannot
/// be opened; a second call is a no-op.
pub fn init() -> LogDestination {
    let file = log_file_path().and_then(|p| open_append(&p).map(|f| (p, f)));

    match file {
        Ok((path, file)) => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .try_init();
            tracing::info!(path = %path.display(), "logging initialized");
            LogDestination::File(path)
        }
        Err(err) => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .with_writer(std::io::stderr)
                .with_ansi(false)
                .try_init();
            tracing::warn!("log file unavailable ({:#}), logging to stderr", err);
            LogDestination::Stderr
        }
    }
}
