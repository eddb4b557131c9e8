// crates/garage-door-cli/src/main_tests.rs
// ============================================================================
// Module: CLI Main Helpers Tests
// Description: Unit tests for argument parsing and CLI wiring helpers.
// Purpose: Ensure commands map onto the store and uploader the config names.
// Dependencies: garage-door-cli main helpers
// ============================================================================

//! ## Overview
//! Covers clap parsing, message draft conversion, uploader selection, and log
//! filter precedence.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;

use clap::Parser;
use garage_door_config::UploadConfig;
use garage_door_core::Timestamp;

use super::ChallengeCommand;
use super::Cli;
use super::Commands;
use super::ConfiguredUploader;
use super::MessageCommand;
use super::SchemaCommand;
use super::message_draft;
use crate::logging::resolve_filter_directive;

// ============================================================================
// SECTION: Parsing
// ============================================================================

#[test]
fn parses_global_flags_after_subcommand() {
    let cli = Cli::try_parse_from([
        "garage-door",
        "status",
        "--config",
        "/etc/garage-door.toml",
        "--log-level",
        "debug",
    ])
    .unwrap();
    assert_eq!(cli.config, Some(PathBuf::from("/etc/garage-door.toml")));
    assert_eq!(cli.log_level.as_deref(), Some("debug"));
    assert!(matches!(cli.command, Commands::Status));
}

#[test]
fn parses_history_timestamp() {
    let cli =
        Cli::try_parse_from(["garage-door", "history", "--since", "2024-06-01 07:30:00"]).unwrap();
    let Commands::History(command) = cli.command else {
        panic!("expected history command");
    };
    assert_eq!(command.since, Timestamp::parse("2024-06-01 07:30:00.000000").unwrap());
}

#[test]
fn rejects_malformed_timestamp() {
    assert!(Cli::try_parse_from(["garage-door", "message", "list", "--since", "yesterday"]).is_err());
}

#[test]
fn parses_challenge_subcommands() {
    let cli = Cli::try_parse_from(["garage-door", "challenge", "consume", "--code", "4821"]).unwrap();
    let Commands::Challenge {
        command: ChallengeCommand::Consume {
            code,
        },
    } = cli.command
    else {
        panic!("expected challenge consume");
    };
    assert_eq!(code, "4821");
    assert!(Cli::try_parse_from(["garage-door", "challenge", "issue"]).is_err());
}

#[test]
fn schema_reset_defaults_to_unconfirmed() {
    let cli = Cli::try_parse_from(["garage-door", "schema", "reset"]).unwrap();
    assert!(matches!(
        cli.command,
        Commands::Schema {
            command: SchemaCommand::Reset {
                yes: false
            }
        }
    ));
}

// ============================================================================
// SECTION: Wiring
// ============================================================================

#[test]
fn message_record_maps_optional_fields() {
    let cli = Cli::try_parse_from([
        "garage-door",
        "message",
        "record",
        "--sid",
        "SM100",
        "--from",
        "+15550001",
        "--body",
        "open",
    ])
    .unwrap();
    let Commands::Message {
        command: MessageCommand::Record(command),
    } = cli.command
    else {
        panic!("expected message record");
    };
    let draft = message_draft(command);
    assert_eq!(draft.sid, "SM100");
    assert_eq!(draft.phone_from.as_deref(), Some("+15550001"));
    assert_eq!(draft.body.as_deref(), Some("open"));
    assert!(draft.phone_to.is_none());
    assert!(draft.created_at.is_none());
}

#[test]
fn uploader_follows_upload_section() {
    assert_eq!(ConfiguredUploader::from_config(&UploadConfig::Log).kind(), "log");
    let directory = UploadConfig::Directory {
        destination: PathBuf::from("/srv/photos"),
    };
    assert_eq!(ConfiguredUploader::from_config(&directory).kind(), "directory");
}

#[test]
fn log_filter_precedence() {
    assert_eq!(resolve_filter_directive(Some("debug"), Some("warn"), "info"), "debug");
    assert_eq!(resolve_filter_directive(None, Some("warn"), "info"), "warn");
    assert_eq!(resolve_filter_directive(Some(" "), None, "error"), "error");
}
