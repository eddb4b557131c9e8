// crates/garage-door-cli/src/logging.rs
// ============================================================================
// Module: CLI Logging Setup
// Description: tracing-subscriber initialization for the garage-door binary.
// Purpose: Route monitor and authorization events to the door log file.
// Dependencies: garage-door-config, thiserror, tracing-subscriber
// ============================================================================

//! ## Overview
//! The filter comes from `--log-level`, then `RUST_LOG`, then
//! `logging.level`. An unparseable directive falls back to `info`. Events go
//! to `<logging.directory>/<logging.file_name>` in append mode without ANSI
//! codes, or to stderr when no directory is configured. Stdout stays reserved
//! for command output.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::path::PathBuf;

use garage_door_config::LoggingConfig;
use thiserror::Error;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Filter used when the requested directive does not parse.
const FALLBACK_FILTER: &str = "info";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Logging setup failures.
#[derive(Debug, Error)]
pub enum LoggingError {
    /// Log file or directory could not be opened.
    #[error("failed to open log file {path}: {error}")]
    Open {
        /// Log file path.
        path: PathBuf,
        /// Underlying I/O error.
        error: String,
    },
    /// A global subscriber was already installed.
    #[error("failed to install log subscriber: {0}")]
    Install(String),
}

// ============================================================================
// SECTION: Setup
// ============================================================================

/// Picks the filter directive in precedence order.
pub fn resolve_filter_directive<'a>(
    cli_level: Option<&'a str>,
    env_level: Option<&'a str>,
    config_level: &'a str,
) -> &'a str {
    [cli_level, env_level]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|level| !level.is_empty())
        .unwrap_or_else(|| config_level.trim())
}

/// Builds an [`EnvFilter`], falling back to `info` for bad directives.
pub fn build_filter(directive: &str) -> EnvFilter {
    EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new(FALLBACK_FILTER))
}

/// Installs the global subscriber for this process.
///
/// # Errors
///
/// Returns [`LoggingError`] when the log file cannot be opened or a subscriber
/// is already installed.
pub fn init_logging(config: &LoggingConfig, cli_level: Option<&str>) -> Result<(), LoggingError> {
    let env_level = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let directive = resolve_filter_directive(cli_level, env_level.as_deref(), &config.level);
    let filter = build_filter(directive);

    if let Some(path) = config.file_path() {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|err| LoggingError::Open {
                path: path.clone(),
                error: err.to_string(),
            })?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path).map_err(|err| {
            LoggingError::Open {
                path: path.clone(),
                error: err.to_string(),
            }
        })?;
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(file).with_ansi(false))
            .try_init()
            .map_err(|err| LoggingError::Install(err.to_string()))
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr).with_ansi(false))
            .try_init()
            .map_err(|err| LoggingError::Install(err.to_string()))
    }
}
