//! Tests for run and plan.

use super::parse;
use crate::cli::{Cli, CliCommand};
use clap::Parser;
use std::path::Path;

#[test]
fn cli_parse_run_defaults() {
    match parse(&["mirrorsched", "run"]) {
        CliCommand::Run { catalog, jobs } => {
            assert!(catalog.is_none());
            assert!(jobs.is_none());
        }
        _ => panic!("expected Run"),
    }
}

#[test]
fn cli_parse_run_with_catalog_and_jobs() {
    match parse(&["mirrorsched", "run", "--catalog", "/etc/folders.toml", "--jobs", "4"]) {
        CliCommand::Run { catalog, jobs } => {
            assert_eq!(catalog.as_deref(), Some(Path::new("/etc/folders.toml")));
            assert_eq!(jobs, Some(4));
        }
        _ => panic!("expected Run"),
    }
}

#[test]
fn cli_parse_run_rejects_zero_jobs() {
    assert!(Cli::try_parse_from(["mirrorsched", "run", "--jobs", "0"]).is_err());
}

#[test]
fn cli_parse_plan() {
    match parse(&["mirrorsched", "plan", "--json"]) {
        CliCommand::Plan { catalog, json } => {
            assert!(catalog.is_none());
            assert!(json);
        }
        _ => panic!("expected Plan"),
    }
}

#[test]
fn cli_parse_global_config_after_subcommand() {
    let cli = Cli::try_parse_from(["mirrorsched", "plan", "--config", "/tmp/m.toml"]).unwrap();
    assert_eq!(cli.config.as_deref(), Some(Path::new("/tmp/m.toml")));
    assert!(matches!(cli.command, CliCommand::Plan { json: false, .. }));
}
