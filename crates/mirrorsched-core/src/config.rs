use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::window::RunWindow;

/// Bandwidth throttling parameters (optional `[throttle]` section in config.toml).
///
/// Throttling is only active when `0 < desired_mbps <= available_mbps`, or when
/// `override_ms` is set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThrottleConfig {
    /// Bandwidth available between the two endpoints, in megabits per second.
    #[serde(default)]
    pub available_mbps: Option<f64>,
    /// Aggregate bandwidth all jobs together should use, in megabits per second.
    #[serde(default)]
    pub desired_mbps: Option<f64>,
    /// Fixed inter-packet gap in milliseconds; bypasses the calculation.
    #[serde(default)]
    pub override_ms: Option<u64>,
}

/// External mirroring tool invocation (`[tool]` section).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    /// Executable name or path.
    pub program: String,
    /// Parameter profile for catalog (root) folders: no recursion, purge on destination.
    pub root_args: Vec<String>,
    /// Parameter profile for discovered subfolders: full recursive mirror.
    pub subfolder_args: Vec<String>,
    /// Prefix for the throttle argument; the delay in ms is appended.
    pub throttle_flag: String,
    /// Prefix for the per-job log file argument; the path is appended.
    pub log_flag: String,
    /// Exit codes `0..=max_success_code` count as success.
    pub max_success_code: i32,
}

impl Default for ToolConfig {
    fn default() -> Self {
        let common = ["/COPY:DAT", "/R:2", "/W:10", "/NP", "/NDL"];
        let mut root_args: Vec<String> = vec!["/PURGE".into(), "/LEV:1".into()];
        root_args.extend(common.iter().map(|s| s.to_string()));
        let mut subfolder_args: Vec<String> = vec!["/MIR".into()];
        subfolder_args.extend(common.iter().map(|s| s.to_string()));
        Self {
            program: "robocopy".to_string(),
            root_args,
            subfolder_args,
            throttle_flag: "/IPG:".to_string(),
            log_flag: "/LOG:".to_string(),
            max_success_code: 0,
        }
    }
}

/// Global configuration loaded from `~/.config/mirrorsched/config.toml`.
///
/// Loaded once at startup and never modified afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MirrorConfig {
    /// Maximum number of jobs running at the same time.
    pub concurrency: usize,
    /// Delay between scheduler poll ticks, in milliseconds.
    pub poll_interval_ms: u64,
    /// Minimum time between two progress log lines, in seconds.
    pub report_interval_secs: u64,
    /// Time a canceled job gets to exit before it is killed, in seconds.
    pub cancel_grace_secs: u64,
    /// Folder catalog; defaults to `catalog.toml` next to the config file.
    #[serde(default)]
    pub catalog_path: Option<PathBuf>,
    /// Directory for per-job tool logs; defaults to the XDG state dir.
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
    /// Sentinel file whose presence requests a hard stop.
    #[serde(default)]
    pub stop_file: Option<PathBuf>,
    #[serde(default)]
    pub throttle: Option<ThrottleConfig>,
    #[serde(default)]
    pub tool: ToolConfig,
    /// "Not allowed to run" windows.
    #[serde(default, rename = "run_window")]
    pub run_windows: Vec<RunWindow>,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            concurrency: 8,
            poll_interval_ms: 1000,
            report_interval_secs: 60,
            cancel_grace_secs: 30,
            catalog_path: None,
            log_dir: None,
            stop_file: None,
            throttle: None,
            tool: ToolConfig::default(),
            run_windows: Vec::new(),
        }
    }
}

impl MirrorConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn report_interval(&self) -> Duration {
        Duration::from_secs(self.report_interval_secs)
    }

    pub fn cancel_grace(&self) -> Duration {
        Duration::from_secs(self.cancel_grace_secs)
    }

    /// Rejects values the scheduler cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            anyhow::bail!("concurrency must be at least 1");
        }
        if self.poll_interval_ms == 0 {
            anyhow::bail!("poll_interval_ms must be greater than 0");
        }
        if self.tool.program.trim().is_empty() {
            anyhow::bail!("tool.program must not be empty");
        }
        if let Some(t) = &self.throttle {
            for (name, value) in [("available_mbps", t.available_mbps), ("desired_mbps", t.desired_mbps)] {
                if let Some(v) = value {
                    if !v.is_finite() || v < 0.0 {
                        anyhow::bail!("throttle.{} must be a non-negative number, got {}", name, v);
                    }
                }
            }
        }
        Ok(())
    }

    pub fn resolved_catalog_path(&self) -> Result<PathBuf> {
        match &self.catalog_path {
            Some(p) => Ok(p.clone()),
            None => default_catalog_path(),
        }
    }

    pub fn resolved_log_dir(&self) -> Result<PathBuf> {
        match &self.log_dir {
            Some(p) => Ok(p.clone()),
            None => Ok(state_dir()?.join("jobs")),
        }
    }

    pub fn resolved_stop_file(&self) -> Result<PathBuf> {
        match &self.stop_file {
            Some(p) => Ok(p.clone()),
            None => Ok(state_dir()?.join("STOP")),
        }
    }
}

fn state_dir() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("mirrorsched")?;
    Ok(xdg_dirs.get_state_home())
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("mirrorsched")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

pub fn default_catalog_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("mirrorsched")?;
    Ok(xdg_dirs.get_config_home().join("catalog.toml"))
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<MirrorConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = MirrorConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from_path(&path)
}

/// Load and validate configuration from an explicit path (must exist).
pub fn load_from_path(path: &Path) -> Result<MirrorConfig> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("read config {}", path.display()))?;
    let cfg: MirrorConfig =
        toml::from_str(&data).with_context(|| format!("parse config {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("invalid config {}", path.display()))?;
    Ok(cfg)
}
