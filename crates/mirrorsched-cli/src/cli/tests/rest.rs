//! Tests for throttle and window.

use super::parse;
use crate::cli::{Cli, CliCommand};
use clap::Parser;

#[test]
fn cli_parse_throttle() {
    match parse(&[
        "mirrorsched",
        "throttle",
        "--available",
        "1000",
        "--desired",
        "250.5",
        "--threads",
        "8",
    ]) {
        CliCommand::Throttle {
            available,
            desired,
            threads,
        } => {
            assert_eq!(available, 1000.0);
            assert_eq!(desired, 250.5);
            assert_eq!(threads, 8);
        }
        _ => panic!("expected Throttle"),
    }
}

#[test]
fn cli_parse_throttle_threads_default() {
    match parse(&["mirrorsched", "throttle", "--available", "100", "--desired", "10"]) {
        CliCommand::Throttle { threads, .. } => assert_eq!(threads, 1),
        _ => panic!("expected Throttle"),
    }
}

#[test]
fn cli_parse_throttle_requires_bandwidths() {
    assert!(Cli::try_parse_from(["mirrorsched", "throttle", "--available", "100"]).is_err());
}

#[test]
fn cli_parse_window() {
    match parse(&["mirrorsched", "--config", "/tmp/m.toml", "window"]) {
        CliCommand::Window => {}
        _ => panic!("expected Window"),
    }
}

#[test]
fn cli_rejects_unknown_subcommand() {
    assert!(Cli::try_parse_from(["mirrorsched", "status"]).is_err());
}
