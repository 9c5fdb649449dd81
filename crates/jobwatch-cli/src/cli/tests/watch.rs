//! Tests for `watch` and `config` argument parsing.

use super::parse;
use crate::cli::{Cli, CliCommand};
use clap::Parser;

#[test]
fn cli_parse_watch_defaults() {
    match parse(&["jobwatch", "watch", "job-42"]) {
        CliCommand::Watch {
            job_id,
            base_url,
            token,
            poll_only,
        } => {
            assert_eq!(job_id, "job-42");
            assert!(base_url.is_none());
            assert!(token.is_none());
            assert!(!poll_only);
        }
        _ => panic!("expected Watch"),
    }
}

#[test]
fn cli_parse_watch_with_overrides() {
    match parse(&[
        "jobwatch",
        "watch",
        "17",
        "--base-url",
        "https://api.rent.example",
        "--token",
        "abc",
        "--poll-only",
    ]) {
        CliCommand::Watch {
            job_id,
            base_url,
            token,
            poll_only,
        } => {
            assert_eq!(job_id, "17");
            assert_eq!(base_url.as_deref(), Some("https://api.rent.example"));
            assert_eq!(token.as_deref(), Some("abc"));
            assert!(poll_only);
        }
        _ => panic!("expected Watch"),
    }
}

#[test]
fn cli_parse_watch_requires_job_id() {
    assert!(Cli::try_parse_from(["jobwatch", "watch"]).is_err());
}

#[test]
fn cli_parse_config() {
    match parse(&["jobwatch", "config"]) {
        CliCommand::Config => {}
        _ => panic!("expected Config"),
    }
}
