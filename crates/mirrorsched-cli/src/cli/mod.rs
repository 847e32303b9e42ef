//! CLI for the mirrorsched folder replication scheduler.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use mirrorsched_core::config::{self, MirrorConfig};
use std::path::{Path, PathBuf};

use commands::{run_mirror, run_plan, run_throttle, run_window};

/// Exit code for a run that ended on the stop signal or a closed run window.
pub const EXIT_STOPPED_EARLY: i32 = 2;

/// Top-level CLI for mirrorsched.
#[derive(Debug, Parser)]
#[command(name = "mirrorsched")]
#[command(about = "mirrorsched: bounded, time-windowed folder mirror scheduler", long_about = None)]
pub struct Cli {
    /// Config file to use instead of the XDG default.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Expand the catalog and run every mirror job.
    Run {
        /// Catalog file (defaults to `catalog_path` from the config).
        #[arg(long, value_name = "PATH")]
        catalog: Option<PathBuf>,
        /// Run up to N jobs concurrently (defaults to `concurrency` from the config).
        #[arg(long, value_name = "N", value_parser = clap::value_parser!(u16).range(1..))]
        jobs: Option<u16>,
    },

    /// Print the job list and tool commands without running anything.
    Plan {
        /// Catalog file (defaults to `catalog_path` from the config).
        #[arg(long, value_name = "PATH")]
        catalog: Option<PathBuf>,
        /// Emit the jobs as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Compute the inter-packet delay for a bandwidth target.
    Throttle {
        /// Available link bandwidth in Mbit/s.
        #[arg(long)]
        available: f64,
        /// Desired total bandwidth in Mbit/s.
        #[arg(long)]
        desired: f64,
        /// Number of jobs running at once.
        #[arg(long, default_value = "1")]
        threads: usize,
    },

    /// Report whether the configured run windows permit work right now.
    Window,
}

impl Cli {
    /// Parse arguments, dispatch, and return the process exit code.
    pub async fn run_from_args() -> Result<i32> {
        let cli = Cli::parse();

        match cli.command {
            CliCommand::Run { catalog, jobs } => {
                let cfg = load_config(cli.config.as_deref())?;
                run_mirror(&cfg, catalog.as_deref(), jobs.map(usize::from)).await
            }
            CliCommand::Plan { catalog, json } => {
                let cfg = load_config(cli.config.as_deref())?;
                run_plan(&cfg, catalog.as_deref(), json)?;
                Ok(0)
            }
            CliCommand::Throttle {
                available,
                desired,
                threads,
            } => {
                run_throttle(available, desired, threads);
                Ok(0)
            }
            CliCommand::Window => {
                let cfg = load_config(cli.config.as_deref())?;
                run_window(&cfg);
                Ok(0)
            }
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<MirrorConfig> {
    let cfg = match path {
        Some(p) => config::load_from_path(p)?,
        None => config::load_or_init()?,
    };
    tracing::debug!("loaded config: {:?}", cfg);
    Ok(cfg)
}

#[cfg(test)]
mod tests;
