// crates/garage-door-config/src/config.rs
// ============================================================================
// Module: Garage Door Configuration
// Description: Configuration loading and validation for the door monitor.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: garage-door-core, garage-door-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! Every section has defaults, so an empty file is a valid configuration for a
//! monitor running from its working directory. Values are read once at
//! startup; nothing here watches the file.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use garage_door_core::CAMERA_OUTPUT_PLACEHOLDER;
use garage_door_core::DEFAULT_CODE_LENGTH;
use garage_door_core::MonitorConfig;
use garage_door_store_sqlite::SqliteStoreConfig;
use garage_door_store_sqlite::SqliteStoreMode;
use garage_door_store_sqlite::SqliteSyncMode;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "garage-door.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "GARAGE_DOOR_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Upper bound on photos taken for a single transition.
pub(crate) const MAX_PHOTOS_PER_TRANSITION: u32 = 50;
/// Upper bound on the challenge window (one day).
pub(crate) const MAX_CHALLENGE_VALIDITY_MINUTES: u64 = 24 * 60;
/// Upper bound on challenge code length.
pub(crate) const MAX_CODE_LENGTH: usize = 12;
/// Upper bound on either monitor interval (one hour).
pub(crate) const MAX_INTERVAL_MS: u64 = 60 * 60 * 1000;

// ============================================================================
// SECTION: Root Config
// ============================================================================

/// Garage door monitor configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GarageDoorConfig {
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Monitor loop timings and photo counts.
    #[serde(default)]
    pub monitor: MonitorSettings,
    /// Challenge code settings.
    #[serde(default)]
    pub challenge: ChallengeConfig,
    /// Photo storage settings.
    #[serde(default)]
    pub photos: PhotosConfig,
    /// Log output settings.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Door sensor adapter settings.
    #[serde(default)]
    pub sensor: SensorConfig,
    /// Camera adapter settings.
    #[serde(default)]
    pub camera: CameraConfig,
    /// Upload adapter settings.
    #[serde(default)]
    pub upload: UploadConfig,
}

impl GarageDoorConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::from_toml(content)
    }

    /// Parses and validates configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.database.validate()?;
        self.monitor.validate()?;
        self.challenge.validate()?;
        self.photos.validate()?;
        self.logging.validate()?;
        self.sensor.validate()?;
        self.camera.validate()?;
        self.upload.validate()?;
        Ok(())
    }

    /// Returns the monitor loop configuration.
    #[must_use]
    pub fn monitor_config(&self) -> MonitorConfig {
        MonitorConfig {
            poll_interval: Duration::from_millis(self.monitor.poll_interval_ms),
            photo_interval: Duration::from_millis(self.monitor.photo_interval_ms),
            photos_on_open: self.monitor.photos_on_open,
            photos_on_close: self.monitor.photos_on_close,
            photo_directory: self.photos.directory.clone(),
        }
    }
}

// ============================================================================
// SECTION: Database
// ============================================================================

/// `SQLite` database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database file path.
    #[serde(default = "default_database_path")]
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` synchronous mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            busy_timeout_ms: default_busy_timeout_ms(),
            journal_mode: SqliteStoreMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }
}

impl DatabaseConfig {
    /// Validates database configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_path_value("database.path", &self.path)?;
        if self.busy_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "database.busy_timeout_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns the store configuration for these settings.
    #[must_use]
    pub fn store_config(&self) -> SqliteStoreConfig {
        SqliteStoreConfig {
            path: self.path.clone(),
            busy_timeout_ms: self.busy_timeout_ms,
            journal_mode: self.journal_mode,
            sync_mode: self.sync_mode,
        }
    }
}

/// Returns the default database path.
fn default_database_path() -> PathBuf {
    PathBuf::from("garage-door.db")
}

/// Returns the default busy timeout for `SQLite` connections.
const fn default_busy_timeout_ms() -> u64 {
    5_000
}

// ============================================================================
// SECTION: Monitor
// ============================================================================

/// Monitor loop timings and photo counts.
#[derive(Debug, Clone, Deserialize)]
pub struct MonitorSettings {
    /// Delay between polling cycles in milliseconds.
    #[serde(default = "default_interval_ms")]
    pub poll_interval_ms: u64,
    /// Delay between photos in one sequence in milliseconds.
    #[serde(default = "default_interval_ms")]
    pub photo_interval_ms: u64,
    /// Photos taken when the door opens.
    #[serde(default = "default_photos_on_open")]
    pub photos_on_open: u32,
    /// Photos taken when the door closes.
    #[serde(default = "default_photos_on_close")]
    pub photos_on_close: u32,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_interval_ms(),
            photo_interval_ms: default_interval_ms(),
            photos_on_open: default_photos_on_open(),
            photos_on_close: default_photos_on_close(),
        }
    }
}

impl MonitorSettings {
    /// Validates monitor settings.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_ms == 0 || self.poll_interval_ms > MAX_INTERVAL_MS {
            return Err(ConfigError::Invalid(format!(
                "monitor.poll_interval_ms must be between 1 and {MAX_INTERVAL_MS}"
            )));
        }
        if self.photo_interval_ms > MAX_INTERVAL_MS {
            return Err(ConfigError::Invalid(format!(
                "monitor.photo_interval_ms must be at most {MAX_INTERVAL_MS}"
            )));
        }
        for (field, value) in [
            ("monitor.photos_on_open", self.photos_on_open),
            ("monitor.photos_on_close", self.photos_on_close),
        ] {
            if value > MAX_PHOTOS_PER_TRANSITION {
                return Err(ConfigError::Invalid(format!(
                    "{field} must be at most {MAX_PHOTOS_PER_TRANSITION}"
                )));
            }
        }
        Ok(())
    }
}

/// Returns the default poll and photo interval.
const fn default_interval_ms() -> u64 {
    2_000
}

/// Returns the default photo count on open.
const fn default_photos_on_open() -> u32 {
    5
}

/// Returns the default photo count on close.
const fn default_photos_on_close() -> u32 {
    1
}

// ============================================================================
// SECTION: Challenge
// ============================================================================

/// Challenge code settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ChallengeConfig {
    /// Minutes a challenge stays valid after issue.
    #[serde(default = "default_validity_minutes")]
    pub validity_minutes: u64,
    /// Digits per issued code.
    #[serde(default = "default_code_length")]
    pub code_length: usize,
}

impl Default for ChallengeConfig {
    fn default() -> Self {
        Self {
            validity_minutes: default_validity_minutes(),
            code_length: default_code_length(),
        }
    }
}

impl ChallengeConfig {
    /// Validates challenge settings.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.validity_minutes == 0 || self.validity_minutes > MAX_CHALLENGE_VALIDITY_MINUTES {
            return Err(ConfigError::Invalid(format!(
                "challenge.validity_minutes must be between 1 and {MAX_CHALLENGE_VALIDITY_MINUTES}"
            )));
        }
        if self.code_length == 0 || self.code_length > MAX_CODE_LENGTH {
            return Err(ConfigError::Invalid(format!(
                "challenge.code_length must be between 1 and {MAX_CODE_LENGTH}"
            )));
        }
        Ok(())
    }

    /// Returns the validity window as a duration.
    #[must_use]
    pub const fn validity(&self) -> Duration {
        Duration::from_secs(self.validity_minutes.saturating_mul(60))
    }
}

/// Returns the default challenge window in minutes.
const fn default_validity_minutes() -> u64 {
    15
}

/// Returns the default challenge code length.
const fn default_code_length() -> usize {
    DEFAULT_CODE_LENGTH
}

// ============================================================================
// SECTION: Photos
// ============================================================================

/// Photo storage settings.
#[derive(Debug, Clone, Deserialize)]
pub struct PhotosConfig {
    /// Base directory; photos land in date-named subdirectories.
    #[serde(default = "default_photo_directory")]
    pub directory: PathBuf,
}

impl Default for PhotosConfig {
    fn default() -> Self {
        Self {
            directory: default_photo_directory(),
        }
    }
}

impl PhotosConfig {
    /// Validates photo settings.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_path_value("photos.directory", &self.directory)
    }
}

/// Returns the default photo directory.
fn default_photo_directory() -> PathBuf {
    PathBuf::from("photos")
}

// ============================================================================
// SECTION: Logging
// ============================================================================

/// Log output settings.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Directory for the log file; logs go to stderr when unset.
    #[serde(default)]
    pub directory: Option<PathBuf>,
    /// Log file name inside `directory`.
    #[serde(default = "default_log_file_name")]
    pub file_name: String,
    /// Default filter directive (for example `info` or `garage_door_core=debug`).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: None,
            file_name: default_log_file_name(),
            level: default_log_level(),
        }
    }
}

impl LoggingConfig {
    /// Validates logging settings.
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(directory) = &self.directory {
            validate_path_value("logging.directory", directory)?;
        }
        let name = self.file_name.trim();
        if name.is_empty() || name.contains('/') || name.contains('\\') {
            return Err(ConfigError::Invalid(
                "logging.file_name must be a non-empty file name".to_string(),
            ));
        }
        if name.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("logging.file_name too long".to_string()));
        }
        if self.level.trim().is_empty() {
            return Err(ConfigError::Invalid("logging.level must be non-empty".to_string()));
        }
        Ok(())
    }

    /// Returns the log file path when file logging is configured.
    #[must_use]
    pub fn file_path(&self) -> Option<PathBuf> {
        self.directory.as_ref().map(|directory| directory.join(self.file_name.trim()))
    }
}

/// Returns the default log file name.
fn default_log_file_name() -> String {
    "door-state-change.log".to_string()
}

/// Returns the default log level.
fn default_log_level() -> String {
    "info".to_string()
}

// ============================================================================
// SECTION: Sensor
// ============================================================================

/// File-backed door sensor settings.
#[derive(Debug, Clone, Deserialize)]
pub struct SensorConfig {
    /// Path of the value file (for example a sysfs GPIO `value`).
    #[serde(default = "default_sensor_path")]
    pub value_path: PathBuf,
    /// Trimmed file content meaning "closed".
    #[serde(default = "default_closed_value")]
    pub closed_value: String,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            value_path: default_sensor_path(),
            closed_value: default_closed_value(),
        }
    }
}

impl SensorConfig {
    /// Validates sensor settings.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_path_value("sensor.value_path", &self.value_path)?;
        if self.closed_value.trim().is_empty() {
            return Err(ConfigError::Invalid("sensor.closed_value must be non-empty".to_string()));
        }
        Ok(())
    }
}

/// Returns the default sensor value path.
fn default_sensor_path() -> PathBuf {
    PathBuf::from("/sys/class/gpio/gpio18/value")
}

/// Returns the default closed value.
fn default_closed_value() -> String {
    "1".to_string()
}

// ============================================================================
// SECTION: Camera
// ============================================================================

/// Command-driven camera settings.
#[derive(Debug, Clone, Deserialize)]
pub struct CameraConfig {
    /// Capture program.
    #[serde(default = "default_camera_program")]
    pub program: String,
    /// Program arguments; `{output}` is replaced with the photo path.
    #[serde(default = "default_camera_args")]
    pub args: Vec<String>,
    /// Photo file extension.
    #[serde(default = "default_camera_extension")]
    pub extension: String,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            program: default_camera_program(),
            args: default_camera_args(),
            extension: default_camera_extension(),
        }
    }
}

impl CameraConfig {
    /// Validates camera settings.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.program.trim().is_empty() {
            return Err(ConfigError::Invalid("camera.program must be non-empty".to_string()));
        }
        if !self.args.iter().any(|arg| arg.contains(CAMERA_OUTPUT_PLACEHOLDER)) {
            return Err(ConfigError::Invalid(format!(
                "camera.args must contain the {CAMERA_OUTPUT_PLACEHOLDER} placeholder"
            )));
        }
        if self.extension.is_empty() || !self.extension.chars().all(|ch| ch.is_ascii_alphanumeric())
        {
            return Err(ConfigError::Invalid(
                "camera.extension must be non-empty ascii alphanumeric".to_string(),
            ));
        }
        Ok(())
    }
}

/// Returns the default capture program.
fn default_camera_program() -> String {
    "raspistill".to_string()
}

/// Returns the default capture arguments.
fn default_camera_args() -> Vec<String> {
    vec!["-n".to_string(), "-o".to_string(), CAMERA_OUTPUT_PLACEHOLDER.to_string()]
}

/// Returns the default photo extension.
fn default_camera_extension() -> String {
    "jpg".to_string()
}

// ============================================================================
// SECTION: Upload
// ============================================================================

/// Upload adapter selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UploadConfig {
    /// Record batches in the log only.
    #[default]
    Log,
    /// Copy batches into a destination directory.
    Directory {
        /// Destination root; files land in `<destination>/<date>/`.
        destination: PathBuf,
    },
}

impl UploadConfig {
    /// Validates upload settings.
    fn validate(&self) -> Result<(), ConfigError> {
        match self {
            Self::Log => Ok(()),
            Self::Directory {
                destination,
            } => validate_path_value("upload.destination", destination),
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from CLI or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against length limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a configured path value against length constraints.
fn validate_path_value(field: &str, value: &Path) -> Result<(), ConfigError> {
    let text = value.to_string_lossy();
    if text.trim().is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in value.components() {
        let component_value = component.as_os_str().to_string_lossy();
        if component_value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}
