// crates/garage-door-cli/src/main.rs
// ============================================================================
// Module: Garage Door CLI Entry Point
// Description: Command dispatcher for the monitor, lock, and challenge workflows.
// Purpose: Run the door monitor and administer its SQLite store from a shell.
// Dependencies: clap, garage-door-{config,core,devices,store-sqlite}, serde,
//               thiserror, tokio, tracing, tracing-subscriber
// ============================================================================

//! ## Overview
//! `garage-door` loads one configuration file, opens the `SQLite` door store,
//! and runs a single command. Structured results are written to stdout as JSON
//! lines; failures go to stderr with a non-zero exit code. The `monitor`
//! command runs the state loop on a blocking thread until Ctrl-C.

// ============================================================================
// SECTION: Modules
// ============================================================================

mod logging;
#[cfg(test)]
mod main_tests;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Stdout;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use garage_door_config::GarageDoorConfig;
use garage_door_config::UploadConfig;
use garage_door_core::AuthorizationError;
use garage_door_core::Authorizer;
use garage_door_core::Clock;
use garage_door_core::DoorMonitor;
use garage_door_core::DoorStateRecord;
use garage_door_core::DoorStore;
use garage_door_core::NewTextMessage;
use garage_door_core::RandomCodeSource;
use garage_door_core::SystemClock;
use garage_door_core::TextMessageRecord;
use garage_door_core::Timestamp;
use garage_door_core::UploadError;
use garage_door_core::Uploader;
use garage_door_core::challenge_window_start;
use garage_door_devices::CommandCamera;
use garage_door_devices::DirectoryUploader;
use garage_door_devices::GpioValueSensor;
use garage_door_devices::LogUploader;
use garage_door_store_sqlite::SqliteDoorStore;
use serde::Serialize;
use thiserror::Error;
use tracing::info;
use tracing::warn;

use crate::logging::init_logging;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "garage-door", version, disable_help_subcommand = true)]
struct Cli {
    /// Config file path (defaults to `GARAGE_DOOR_CONFIG`, then garage-door.toml).
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,
    /// Log filter directive overriding `RUST_LOG` and `logging.level`.
    #[arg(long, value_name = "LEVEL", global = true)]
    log_level: Option<String>,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Watch the door sensor and photograph every transition until Ctrl-C.
    Monitor,
    /// Place the administrative lock.
    Lock,
    /// Remove the administrative lock.
    Unlock,
    /// Show the lock and the latest recorded door state.
    Status,
    /// Challenge code utilities.
    Challenge {
        /// Selected challenge subcommand.
        #[command(subcommand)]
        command: ChallengeCommand,
    },
    /// Text message audit utilities.
    Message {
        /// Selected message subcommand.
        #[command(subcommand)]
        command: MessageCommand,
    },
    /// List door state transitions after a timestamp.
    History(HistoryCommand),
    /// Schema maintenance utilities.
    Schema {
        /// Selected schema subcommand.
        #[command(subcommand)]
        command: SchemaCommand,
    },
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Challenge subcommands.
#[derive(Subcommand, Debug)]
enum ChallengeCommand {
    /// Issue a code for an inbound message.
    Issue {
        /// Originating message sid.
        #[arg(long)]
        sid: String,
    },
    /// Check a code without consuming it.
    Verify {
        /// Challenge code.
        #[arg(long)]
        code: String,
    },
    /// Check a code and delete it.
    Consume {
        /// Challenge code.
        #[arg(long)]
        code: String,
    },
    /// Delete challenges older than the validity window.
    Purge,
}

/// Message subcommands.
#[derive(Subcommand, Debug)]
enum MessageCommand {
    /// Record a text message.
    Record(MessageRecordCommand),
    /// Update the delivery status of a message.
    Status {
        /// Message sid.
        #[arg(long)]
        sid: String,
        /// New delivery status.
        #[arg(long)]
        status: String,
        /// Optional status detail.
        #[arg(long)]
        message: Option<String>,
    },
    /// List messages created at or after a timestamp.
    List {
        /// Inclusive lower bound (`YYYY-MM-DD HH:MM:SS[.ffffff]`).
        #[arg(long, value_name = "TIMESTAMP")]
        since: Timestamp,
    },
}

/// Arguments for `message record`.
#[derive(Args, Debug)]
struct MessageRecordCommand {
    /// External message identifier.
    #[arg(long)]
    sid: String,
    /// Sender address.
    #[arg(long)]
    from: Option<String>,
    /// Recipient address.
    #[arg(long)]
    to: Option<String>,
    /// Transport direction label.
    #[arg(long)]
    direction: Option<String>,
    /// Delivery status label.
    #[arg(long)]
    status: Option<String>,
    /// Message body.
    #[arg(long)]
    body: Option<String>,
}

/// Arguments for `history`.
#[derive(Args, Debug)]
struct HistoryCommand {
    /// Exclusive lower bound (`YYYY-MM-DD HH:MM:SS[.ffffff]`).
    #[arg(long, value_name = "TIMESTAMP")]
    since: Timestamp,
}

/// Schema subcommands.
#[derive(Subcommand, Debug)]
enum SchemaCommand {
    /// Drop and recreate every table.
    Reset {
        /// Confirm that all stored data will be lost.
        #[arg(long)]
        yes: bool,
    },
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Load and validate the configuration file.
    Validate,
}

// ============================================================================
// SECTION: Output Types
// ============================================================================

/// Lock command output.
#[derive(Debug, Serialize)]
struct LockOutput {
    /// Whether the lock is held.
    locked: bool,
    /// When the lock was placed.
    #[serde(skip_serializing_if = "Option::is_none")]
    locked_at: Option<Timestamp>,
}

/// Status command output.
#[derive(Debug, Serialize)]
struct StatusOutput {
    /// Whether the lock is held.
    locked: bool,
    /// When the lock was placed.
    locked_at: Option<Timestamp>,
    /// Latest recorded door state.
    door: Option<DoorStateRecord>,
}

/// Challenge issue output.
#[derive(Debug, Serialize)]
struct ChallengeIssueOutput<'a> {
    /// Issued code.
    code: String,
    /// Originating message sid.
    message_sid: &'a str,
}

/// Challenge verify/consume output.
#[derive(Debug, Serialize)]
struct ChallengeCheckOutput {
    /// Whether the code was deleted.
    consumed: bool,
    /// Message that requested the challenge.
    message: TextMessageRecord,
}

/// Challenge purge output.
#[derive(Debug, Serialize)]
struct PurgeOutput {
    /// Challenges at or before this instant were deleted.
    cutoff: Timestamp,
    /// Number of deleted rows.
    purged: usize,
}

/// Message status output.
#[derive(Debug, Serialize)]
struct MessageStatusOutput<'a> {
    /// Message sid.
    sid: &'a str,
    /// New status.
    status: &'a str,
}

/// Monitor shutdown summary.
#[derive(Debug, Serialize)]
struct MonitorOutput {
    /// Cycles executed.
    cycles: u64,
    /// Cycles that recorded a transition.
    transitions: u64,
    /// Cycles that failed.
    failures: u64,
}

/// Generic acknowledgement output.
#[derive(Debug, Serialize)]
struct AckOutput<'a> {
    /// Completed action.
    status: &'a str,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for user-facing messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
async fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    let config = GarageDoorConfig::load(cli.config.as_deref())
        .map_err(|err| CliError::new(format!("failed to load config: {err}")))?;
    init_logging(&config.logging, cli.log_level.as_deref())
        .map_err(|err| CliError::new(err.to_string()))?;

    match cli.command {
        Commands::Monitor => command_monitor(&config).await,
        Commands::Lock => command_lock(&config),
        Commands::Unlock => command_unlock(&config),
        Commands::Status => command_status(&config),
        Commands::Challenge {
            command,
        } => command_challenge(&config, command),
        Commands::Message {
            command,
        } => command_message(&config, command),
        Commands::History(command) => command_history(&config, &command),
        Commands::Schema {
            command,
        } => command_schema(&config, command),
        Commands::Config {
            command: ConfigCommand::Validate,
        } => {
            write_json(&AckOutput {
                status: "valid",
            })?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

// ============================================================================
// SECTION: Wiring
// ============================================================================

/// Opens the configured `SQLite` store.
fn open_store(config: &GarageDoorConfig, clock: Arc<dyn Clock>) -> CliResult<SqliteDoorStore> {
    let store = SqliteDoorStore::new(&config.database.store_config())
        .map_err(|err| CliError::new(format!("failed to open door store: {err}")))?;
    Ok(store.with_clock(clock).with_challenge_validity(config.challenge.validity()))
}

/// Builds the authorizer over the configured store.
fn open_authorizer(
    config: &GarageDoorConfig,
) -> CliResult<Authorizer<SqliteDoorStore, RandomCodeSource>> {
    let store = open_store(config, Arc::new(SystemClock))?;
    Ok(Authorizer::new(store, RandomCodeSource).with_code_length(config.challenge.code_length))
}

/// Uploader selected by the `[upload]` section.
enum ConfiguredUploader {
    /// Folder copy.
    Directory(DirectoryUploader),
    /// JSON line per batch on stdout.
    Log(LogUploader<Stdout>),
}

impl ConfiguredUploader {
    /// Builds the uploader for `config`.
    fn from_config(config: &UploadConfig) -> Self {
        match config {
            UploadConfig::Log => Self::Log(LogUploader::new(std::io::stdout())),
            UploadConfig::Directory {
                destination,
            } => Self::Directory(DirectoryUploader::new(destination.clone())),
        }
    }

    /// Returns the configured upload kind.
    const fn kind(&self) -> &'static str {
        match self {
            Self::Directory(_) => "directory",
            Self::Log(_) => "log",
        }
    }
}

impl Uploader for ConfiguredUploader {
    fn upload(&self, files: &[PathBuf]) -> Result<(), UploadError> {
        match self {
            Self::Directory(uploader) => uploader.upload(files),
            Self::Log(uploader) => uploader.upload(files),
        }
    }
}

// ============================================================================
// SECTION: Monitor Command
// ============================================================================

/// Runs the state monitor loop until Ctrl-C.
async fn command_monitor(config: &GarageDoorConfig) -> CliResult<ExitCode> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let store = open_store(config, Arc::clone(&clock))?;
    let sensor =
        GpioValueSensor::new(config.sensor.value_path.clone(), config.sensor.closed_value.clone());
    let camera = CommandCamera::new(
        config.camera.program.clone(),
        config.camera.args.clone(),
        config.camera.extension.clone(),
        Arc::clone(&clock),
    );
    let uploader = ConfiguredUploader::from_config(&config.upload);
    info!(
        sensor = %sensor.value_path().display(),
        camera = %config.camera.program,
        upload = uploader.kind(),
        "configured door monitor"
    );
    let monitor = DoorMonitor::new(store, sensor, camera, uploader, clock, config.monitor_config());

    let stop = Arc::new(AtomicBool::new(false));
    let signal_stop = Arc::clone(&stop);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("stop requested");
                signal_stop.store(true, Ordering::SeqCst);
            }
            Err(err) => warn!(error = %err, "failed to listen for ctrl-c"),
        }
    });

    let worker_stop = Arc::clone(&stop);
    let report = tokio::task::spawn_blocking(move || monitor.run(&worker_stop))
        .await
        .map_err(|err| CliError::new(format!("monitor task failed: {err}")))?;
    write_json(&MonitorOutput {
        cycles: report.cycles,
        transitions: report.transitions,
        failures: report.failures,
    })?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Lock Commands
// ============================================================================

/// Executes `lock`.
fn command_lock(config: &GarageDoorConfig) -> CliResult<ExitCode> {
    let authorizer = open_authorizer(config)?;
    let locked_at = authorizer.lock().map_err(|err| authorization_error("lock failed", &err))?;
    write_json(&LockOutput {
        locked: true,
        locked_at: Some(locked_at),
    })?;
    Ok(ExitCode::SUCCESS)
}

/// Executes `unlock`.
fn command_unlock(config: &GarageDoorConfig) -> CliResult<ExitCode> {
    let authorizer = open_authorizer(config)?;
    authorizer.unlock().map_err(|err| authorization_error("unlock failed", &err))?;
    write_json(&LockOutput {
        locked: false,
        locked_at: None,
    })?;
    Ok(ExitCode::SUCCESS)
}

/// Executes `status`.
fn command_status(config: &GarageDoorConfig) -> CliResult<ExitCode> {
    let authorizer = open_authorizer(config)?;
    let locked_at =
        authorizer.lock_status().map_err(|err| authorization_error("status failed", &err))?;
    let door = authorizer
        .store()
        .find_latest_door_state()
        .map_err(|err| CliError::new(format!("status failed: {err}")))?;
    write_json(&StatusOutput {
        locked: locked_at.is_some(),
        locked_at,
        door,
    })?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Challenge Commands
// ============================================================================

/// Dispatches challenge subcommands.
fn command_challenge(config: &GarageDoorConfig, command: ChallengeCommand) -> CliResult<ExitCode> {
    let authorizer = open_authorizer(config)?;
    match command {
        ChallengeCommand::Issue {
            sid,
        } => {
            let code = authorizer
                .issue_challenge(&sid)
                .map_err(|err| authorization_error("challenge issue failed", &err))?;
            write_json(&ChallengeIssueOutput {
                code,
                message_sid: &sid,
            })?;
        }
        ChallengeCommand::Verify {
            code,
        } => {
            let message = authorizer
                .verify_challenge(&code)
                .map_err(|err| authorization_error("challenge rejected", &err))?;
            write_json(&ChallengeCheckOutput {
                consumed: false,
                message,
            })?;
        }
        ChallengeCommand::Consume {
            code,
        } => {
            let message = authorizer
                .consume_challenge(&code)
                .map_err(|err| authorization_error("challenge rejected", &err))?;
            write_json(&ChallengeCheckOutput {
                consumed: true,
                message,
            })?;
        }
        ChallengeCommand::Purge => {
            let cutoff = challenge_window_start(SystemClock.now(), config.challenge.validity())
                .map_err(|err| CliError::new(format!("challenge purge failed: {err}")))?;
            let purged = authorizer
                .store()
                .purge_challenges_before(cutoff)
                .map_err(|err| CliError::new(format!("challenge purge failed: {err}")))?;
            write_json(&PurgeOutput {
                cutoff,
                purged,
            })?;
        }
    }
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Message Commands
// ============================================================================

/// Dispatches message subcommands.
fn command_message(config: &GarageDoorConfig, command: MessageCommand) -> CliResult<ExitCode> {
    let store = open_store(config, Arc::new(SystemClock))?;
    match command {
        MessageCommand::Record(command) => {
            let draft = message_draft(command);
            let record = store
                .insert_message(&draft)
                .map_err(|err| CliError::new(format!("message record failed: {err}")))?;
            write_json(&record)?;
        }
        MessageCommand::Status {
            sid,
            status,
            message,
        } => {
            store
                .update_message_status(&sid, &status, message.as_deref())
                .map_err(|err| CliError::new(format!("message status failed: {err}")))?;
            write_json(&MessageStatusOutput {
                sid: &sid,
                status: &status,
            })?;
        }
        MessageCommand::List {
            since,
        } => {
            let messages = store
                .find_messages_since(since)
                .map_err(|err| CliError::new(format!("message list failed: {err}")))?;
            write_json(&messages)?;
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// Converts `message record` arguments into a draft row.
fn message_draft(command: MessageRecordCommand) -> NewTextMessage {
    NewTextMessage {
        phone_from: command.from,
        phone_to: command.to,
        direction: command.direction,
        status: command.status,
        body: command.body,
        ..NewTextMessage::new(command.sid)
    }
}

// ============================================================================
// SECTION: History and Schema Commands
// ============================================================================

/// Executes `history`.
fn command_history(config: &GarageDoorConfig, command: &HistoryCommand) -> CliResult<ExitCode> {
    let store = open_store(config, Arc::new(SystemClock))?;
    let states = store
        .find_door_states_since(command.since)
        .map_err(|err| CliError::new(format!("history failed: {err}")))?;
    write_json(&states)?;
    Ok(ExitCode::SUCCESS)
}

/// Dispatches schema subcommands.
fn command_schema(config: &GarageDoorConfig, command: SchemaCommand) -> CliResult<ExitCode> {
    match command {
        SchemaCommand::Reset {
            yes,
        } => {
            if !yes {
                return Err(CliError::new(
                    "schema reset deletes all door data; pass --yes to confirm".to_string(),
                ));
            }
            let store = open_store(config, Arc::new(SystemClock))?;
            store
                .reset_schema()
                .map_err(|err| CliError::new(format!("schema reset failed: {err}")))?;
            warn!(path = %config.database.path.display(), "door store schema reset");
            write_json(&AckOutput {
                status: "reset",
            })?;
        }
    }
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Formats an authorization failure.
fn authorization_error(context: &str, error: &AuthorizationError) -> CliError {
    CliError::new(format!("{context}: {error}"))
}

/// Writes `value` as one JSON line on stdout.
fn write_json<T: Serialize + ?Sized>(value: &T) -> CliResult<()> {
    let mut bytes = serde_json::to_vec(value)
        .map_err(|err| CliError::new(format!("failed to serialize output: {err}")))?;
    bytes.push(b'\n');
    let mut stdout = std::io::stdout();
    stdout
        .write_all(&bytes)
        .and_then(|()| stdout.flush())
        .map_err(|err| CliError::new(output_error("stdout", &err)))
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats an output error message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    format!("failed to write {stream}: {error}")
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
