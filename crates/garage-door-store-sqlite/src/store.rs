// crates/garage-door-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Door Store
// Description: Durable DoorStore backed by SQLite.
// Purpose: Persist door history, the lock, challenges, and text messages.
// Dependencies: garage-door-core, rusqlite, serde, thiserror, tracing
// ============================================================================

//! ## Overview
//! This module implements a durable [`DoorStore`] using `SQLite`. Every call
//! takes the connection mutex, runs inside a single transaction, and commits
//! before returning, so a second process (the inbound message handler) can use
//! the same database file while the monitor loop runs.
//!
//! Invariants:
//! - Message ids and the singleton lock are enforced by `UNIQUE` constraints,
//!   never by a read-then-write check.
//! - Timestamps are stored as `YYYY-MM-DD HH:MM:SS.ffffff` text.
//! - Rows are mapped into records by explicit `map_*_row` functions.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use garage_door_core::ChallengeRecord;
use garage_door_core::Clock;
use garage_door_core::DEFAULT_CHALLENGE_VALIDITY;
use garage_door_core::DoorState;
use garage_door_core::DoorStateRecord;
use garage_door_core::DoorStore;
use garage_door_core::NewTextMessage;
use garage_door_core::StoreError;
use garage_door_core::SystemClock;
use garage_door_core::TextMessageRecord;
use garage_door_core::Timestamp;
use garage_door_core::challenge_window_start;
use garage_door_core::interfaces::require_field;
use rusqlite::Connection;
use rusqlite::ErrorCode;
use rusqlite::OpenFlags;
use rusqlite::OptionalExtension;
use rusqlite::Transaction;
use rusqlite::TransactionBehavior;
use rusqlite::params;
use rusqlite::types::Type;
use rusqlite::types::ValueRef;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;
use tracing::info;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// `SQLite` schema version recorded in `store_meta`.
pub const SCHEMA_VERSION: i64 = 1;
/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;

/// Column list shared by every text message query.
const MESSAGE_COLUMNS: &str = "tm.sid, tm.created_at, tm.sent_at, tm.phone_from, tm.phone_to, \
                               tm.direction, tm.status, tm.status_message, tm.error_code, \
                               tm.error_message, tm.body";

/// Door tables in their fixed on-disk layout.
const CREATE_TABLES: &str = "CREATE TABLE IF NOT EXISTS text_messages (
        sid text UNIQUE,
        created_at timestamp,
        sent_at timestamp,
        phone_from text,
        phone_to text,
        direction text,
        status text,
        status_message text,
        error_code text,
        error_message text,
        body text
    );
    CREATE TABLE IF NOT EXISTS door_lock (id integer UNIQUE, locked_at timestamp);
    CREATE TABLE IF NOT EXISTS door_state_history (state text, changed_at timestamp);
    CREATE TABLE IF NOT EXISTS door_challenge (
        code text,
        text_message_sid text,
        challenged_at timestamp
    );
    CREATE INDEX IF NOT EXISTS idx_door_state_history_changed_at
        ON door_state_history (changed_at);
    CREATE INDEX IF NOT EXISTS idx_door_challenge_code ON door_challenge (code);";

/// Drops the door tables (not `store_meta`).
const DROP_TABLES: &str = "DROP TABLE IF EXISTS text_messages;
    DROP TABLE IF EXISTS door_lock;
    DROP TABLE IF EXISTS door_state_history;
    DROP TABLE IF EXISTS door_challenge;";

// ============================================================================
// SECTION: Config
// ============================================================================

/// `SQLite` journal mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `journal_mode` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteStoreMode {
    /// WAL journal mode (recommended).
    #[default]
    Wal,
    /// Delete journal mode (legacy).
    Delete,
}

impl SqliteStoreMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// `SQLite` sync mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `synchronous` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteSyncMode {
    /// Full synchronous mode (safest).
    #[default]
    Full,
    /// Normal synchronous mode (balanced).
    Normal,
}

impl SqliteSyncMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Normal => "normal",
        }
    }
}

/// Configuration for the `SQLite` door store.
///
/// # Invariants
/// - `path` must resolve to a file path (not a directory).
/// - `busy_timeout_ms` is interpreted as milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SqliteStoreConfig {
    /// Path to the `SQLite` database file.
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` sync mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

impl SqliteStoreConfig {
    /// Creates a config for `path` with default pragmas.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: SqliteStoreMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }
}

/// Returns the default busy timeout for `SQLite` connections.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// `SQLite` store errors.
///
/// # Invariants
/// - Error messages avoid embedding message bodies.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SqliteStoreError {
    /// Store I/O error.
    #[error("sqlite store io error: {0}")]
    Io(String),
    /// `SQLite` engine error.
    #[error("sqlite store db error: {0}")]
    Db(String),
    /// Stored row could not be mapped into a record.
    #[error("sqlite store corruption: {0}")]
    Corrupt(String),
    /// Store schema version mismatch.
    #[error("sqlite store version mismatch: {0}")]
    VersionMismatch(String),
    /// Invalid store configuration or input.
    #[error("sqlite store invalid data: {0}")]
    Invalid(String),
    /// A message with the same sid already exists.
    #[error("sqlite store duplicate text message: {0}")]
    DuplicateMessage(String),
    /// The lock row already exists.
    #[error("sqlite store lock already held")]
    AlreadyLocked,
    /// An update matched no row.
    #[error("sqlite store row not found: {0}")]
    NotFound(String),
}

impl From<SqliteStoreError> for StoreError {
    fn from(error: SqliteStoreError) -> Self {
        match error {
            SqliteStoreError::Io(message) => Self::Io(message),
            SqliteStoreError::Db(message) => Self::Store(message),
            SqliteStoreError::Corrupt(message) => Self::Corrupt(message),
            SqliteStoreError::VersionMismatch(message) => Self::VersionMismatch(message),
            SqliteStoreError::Invalid(message) => Self::Validation(message),
            SqliteStoreError::DuplicateMessage(sid) => Self::DuplicateKey(format!("text message {sid}")),
            SqliteStoreError::AlreadyLocked => Self::AlreadyLocked,
            SqliteStoreError::NotFound(message) => Self::NotFound(message),
        }
    }
}

/// Maps an engine error, separating row-mapping failures from engine faults.
fn map_sql_error(err: &rusqlite::Error) -> SqliteStoreError {
    match err {
        rusqlite::Error::FromSqlConversionFailure(..) | rusqlite::Error::InvalidColumnType(..) => {
            SqliteStoreError::Corrupt(err.to_string())
        }
        _ => SqliteStoreError::Db(err.to_string()),
    }
}

/// Returns whether `err` is a `UNIQUE` (or other) constraint violation.
fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(failure, _) if failure.code == ErrorCode::ConstraintViolation
    )
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// `SQLite`-backed door store.
///
/// # Invariants
/// - `SQLite` connection access is serialized through a mutex.
/// - Each operation commits its own transaction before returning.
#[derive(Clone)]
pub struct SqliteDoorStore {
    /// Shared connection guarded by a mutex.
    connection: Arc<Mutex<Connection>>,
    /// Clock used for defaulted timestamps.
    clock: Arc<dyn Clock>,
    /// Challenge validity window.
    challenge_validity: Duration,
}

impl SqliteDoorStore {
    /// Opens (creating if needed) an `SQLite` door store.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the database cannot be opened or
    /// initialized.
    pub fn new(config: &SqliteStoreConfig) -> Result<Self, SqliteStoreError> {
        validate_store_path(&config.path)?;
        ensure_parent_dir(&config.path)?;
        let mut connection = open_connection(config)?;
        initialize_schema(&mut connection)?;
        debug!(path = %config.path.display(), "opened sqlite door store");
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
            clock: Arc::new(SystemClock),
            challenge_validity: DEFAULT_CHALLENGE_VALIDITY,
        })
    }

    /// Replaces the clock used for defaulted timestamps.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Overrides the challenge validity window.
    #[must_use]
    pub const fn with_challenge_validity(mut self, validity: Duration) -> Self {
        self.challenge_validity = validity;
        self
    }

    /// Verifies the store can execute a simple SQL statement.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] if the mutex is poisoned or the query fails.
    pub fn check_connection(&self) -> Result<(), SqliteStoreError> {
        self.read(|tx| {
            tx.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
                .map_err(|err| map_sql_error(&err))?;
            Ok(())
        })
    }

    /// Runs `op` inside an immediate (write-locking) transaction.
    fn write<T>(
        &self,
        op: impl FnOnce(&Transaction<'_>) -> Result<T, SqliteStoreError>,
    ) -> Result<T, SqliteStoreError> {
        self.transact(TransactionBehavior::Immediate, op)
    }

    /// Runs `op` inside a deferred (read) transaction.
    fn read<T>(
        &self,
        op: impl FnOnce(&Transaction<'_>) -> Result<T, SqliteStoreError>,
    ) -> Result<T, SqliteStoreError> {
        self.transact(TransactionBehavior::Deferred, op)
    }

    /// Locks the connection, runs `op` in a transaction, and commits.
    fn transact<T>(
        &self,
        behavior: TransactionBehavior,
        op: impl FnOnce(&Transaction<'_>) -> Result<T, SqliteStoreError>,
    ) -> Result<T, SqliteStoreError> {
        let mut guard = self
            .connection
            .lock()
            .map_err(|_| SqliteStoreError::Io("sqlite mutex poisoned".to_string()))?;
        let tx = guard
            .transaction_with_behavior(behavior)
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        let value = op(&tx)?;
        tx.commit().map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        drop(guard);
        Ok(value)
    }

    /// Resolves the default challenge window start from the store clock.
    fn default_valid_after(&self) -> Result<Timestamp, SqliteStoreError> {
        challenge_window_start(self.clock.now(), self.challenge_validity)
            .map_err(|err| SqliteStoreError::Invalid(err.to_string()))
    }
}

impl DoorStore for SqliteDoorStore {
    fn insert_message(&self, message: &NewTextMessage) -> Result<TextMessageRecord, StoreError> {
        require_field("sid", &message.sid)?;
        let now = self.clock.now();
        let record = TextMessageRecord::from_draft(
            message,
            message.created_at.unwrap_or(now),
            message.sent_at.unwrap_or(now),
        );
        self.write(|tx| {
            let result = tx.execute(
                "INSERT INTO text_messages (sid, created_at, sent_at, phone_from, phone_to, \
                 direction, status, status_message, error_code, error_message, body)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    record.sid,
                    record.created_at.to_string(),
                    record.sent_at.to_string(),
                    record.phone_from,
                    record.phone_to,
                    record.direction,
                    record.status,
                    record.status_message,
                    record.error_code,
                    record.error_message,
                    record.body,
                ],
            );
            match result {
                Ok(_) => Ok(()),
                Err(err) if is_constraint_violation(&err) => {
                    Err(SqliteStoreError::DuplicateMessage(record.sid.clone()))
                }
                Err(err) => Err(SqliteStoreError::Db(err.to_string())),
            }
        })?;
        debug!(sid = %record.sid, "inserted text message");
        Ok(record)
    }

    fn update_message_status(
        &self,
        sid: &str,
        status: &str,
        status_message: Option<&str>,
    ) -> Result<(), StoreError> {
        require_field("sid", sid)?;
        require_field("status", status)?;
        self.write(|tx| {
            let updated = tx
                .execute(
                    "UPDATE text_messages SET status = ?1, status_message = ?2 WHERE sid = ?3",
                    params![status, status_message, sid],
                )
                .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            if updated == 0 {
                return Err(SqliteStoreError::NotFound(format!("text message {sid}")));
            }
            Ok(())
        })?;
        info!(sid, status, "updated text message status");
        Ok(())
    }

    fn find_messages_since(&self, from: Timestamp) -> Result<Vec<TextMessageRecord>, StoreError> {
        let sql = format!(
            "SELECT {MESSAGE_COLUMNS} FROM text_messages tm
             WHERE tm.created_at >= ?1
             ORDER BY tm.created_at ASC, tm.rowid ASC"
        );
        Ok(self.read(|tx| {
            let mut stmt = tx.prepare(&sql).map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            let rows = stmt
                .query_map(params![from.to_string()], map_message_row)
                .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            rows.collect::<Result<Vec<_>, _>>().map_err(|err| map_sql_error(&err))
        })?)
    }

    fn insert_lock(&self, locked_at: Option<Timestamp>) -> Result<Timestamp, StoreError> {
        let locked_at = locked_at.unwrap_or_else(|| self.clock.now());
        self.write(|tx| {
            match tx.execute(
                "INSERT INTO door_lock (id, locked_at) VALUES (1, ?1)",
                params![locked_at.to_string()],
            ) {
                Ok(_) => Ok(()),
                Err(err) if is_constraint_violation(&err) => Err(SqliteStoreError::AlreadyLocked),
                Err(err) => Err(SqliteStoreError::Db(err.to_string())),
            }
        })?;
        Ok(locked_at)
    }

    fn remove_lock(&self) -> Result<(), StoreError> {
        Ok(self.write(|tx| {
            tx.execute("DELETE FROM door_lock", [])
                .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            Ok(())
        })?)
    }

    fn find_lock(&self) -> Result<Option<Timestamp>, StoreError> {
        Ok(self.read(|tx| {
            tx.query_row("SELECT locked_at FROM door_lock LIMIT 1", [], |row| {
                read_timestamp(row, 0)
            })
            .optional()
            .map_err(|err| map_sql_error(&err))
        })?)
    }

    fn insert_door_state(
        &self,
        state: DoorState,
        changed_at: Option<Timestamp>,
    ) -> Result<DoorStateRecord, StoreError> {
        let record = DoorStateRecord {
            state,
            changed_at: changed_at.unwrap_or_else(|| self.clock.now()),
        };
        self.write(|tx| {
            tx.execute(
                "INSERT INTO door_state_history (state, changed_at) VALUES (?1, ?2)",
                params![record.state.as_str(), record.changed_at.to_string()],
            )
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            Ok(())
        })?;
        Ok(record)
    }

    fn find_latest_door_state(&self) -> Result<Option<DoorStateRecord>, StoreError> {
        Ok(self.read(|tx| {
            tx.query_row(
                "SELECT state, changed_at FROM door_state_history
                 ORDER BY changed_at DESC, rowid DESC LIMIT 1",
                [],
                map_state_row,
            )
            .optional()
            .map_err(|err| map_sql_error(&err))
        })?)
    }

    fn find_door_states_since(&self, from: Timestamp) -> Result<Vec<DoorStateRecord>, StoreError> {
        Ok(self.read(|tx| {
            let mut stmt = tx
                .prepare(
                    "SELECT state, changed_at FROM door_state_history
                     WHERE changed_at > ?1
                     ORDER BY changed_at ASC, rowid ASC",
                )
                .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            let rows = stmt
                .query_map(params![from.to_string()], map_state_row)
                .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            rows.collect::<Result<Vec<_>, _>>().map_err(|err| map_sql_error(&err))
        })?)
    }

    fn insert_challenge(
        &self,
        code: &str,
        message_sid: &str,
        challenged_at: Option<Timestamp>,
    ) -> Result<ChallengeRecord, StoreError> {
        require_field("code", code)?;
        require_field("message_sid", message_sid)?;
        let record = ChallengeRecord {
            code: code.to_string(),
            message_sid: message_sid.to_string(),
            challenged_at: challenged_at.unwrap_or_else(|| self.clock.now()),
        };
        self.write(|tx| {
            tx.execute(
                "INSERT INTO door_challenge (code, text_message_sid, challenged_at)
                 VALUES (?1, ?2, ?3)",
                params![record.code, record.message_sid, record.challenged_at.to_string()],
            )
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            Ok(())
        })?;
        Ok(record)
    }

    fn delete_challenge(&self, code: &str) -> Result<usize, StoreError> {
        require_field("code", code)?;
        Ok(self.write(|tx| {
            tx.execute("DELETE FROM door_challenge WHERE code = ?1", params![code])
                .map_err(|err| SqliteStoreError::Db(err.to_string()))
        })?)
    }

    fn find_challenge(
        &self,
        code: &str,
        valid_after: Option<Timestamp>,
    ) -> Result<Option<TextMessageRecord>, StoreError> {
        if code.trim().is_empty() {
            return Ok(None);
        }
        let valid_after = match valid_after {
            Some(value) => value,
            None => self.default_valid_after()?,
        };
        let sql = format!(
            "SELECT {MESSAGE_COLUMNS} FROM text_messages tm
             INNER JOIN door_challenge dc ON dc.text_message_sid = tm.sid
             WHERE dc.code = ?1 AND dc.challenged_at > ?2
             ORDER BY dc.challenged_at DESC, dc.rowid DESC LIMIT 1"
        );
        Ok(self.read(|tx| {
            tx.query_row(&sql, params![code, valid_after.to_string()], map_message_row)
                .optional()
                .map_err(|err| map_sql_error(&err))
        })?)
    }

    fn purge_challenges_before(&self, cutoff: Timestamp) -> Result<usize, StoreError> {
        let removed = self.write(|tx| {
            tx.execute(
                "DELETE FROM door_challenge WHERE challenged_at <= ?1",
                params![cutoff.to_string()],
            )
            .map_err(|err| SqliteStoreError::Db(err.to_string()))
        })?;
        info!(removed, %cutoff, "purged expired door challenges");
        Ok(removed)
    }

    fn reset_schema(&self) -> Result<(), StoreError> {
        self.write(|tx| {
            tx.execute_batch(DROP_TABLES).map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            tx.execute_batch(CREATE_TABLES).map_err(|err| SqliteStoreError::Db(err.to_string()))
        })?;
        info!("reset door store schema");
        Ok(())
    }
}

// ============================================================================
// SECTION: Row Mapping
// ============================================================================

/// Maps a `SQLite` row (in [`MESSAGE_COLUMNS`] order) into a message record.
fn map_message_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<TextMessageRecord> {
    Ok(TextMessageRecord {
        sid: read_text(row, 0)?.ok_or_else(|| {
            rusqlite::Error::InvalidColumnType(0, "sid".to_string(), Type::Null)
        })?,
        created_at: read_timestamp(row, 1)?,
        sent_at: read_timestamp(row, 2)?,
        phone_from: read_text(row, 3)?,
        phone_to: read_text(row, 4)?,
        direction: read_text(row, 5)?,
        status: read_text(row, 6)?,
        status_message: read_text(row, 7)?,
        error_code: read_text(row, 8)?,
        error_message: read_text(row, 9)?,
        body: read_text(row, 10)?,
    })
}

/// Maps a `(state, changed_at)` row into a door state record.
fn map_state_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<DoorStateRecord> {
    let raw: String = row.get(0)?;
    let state = raw
        .parse::<DoorState>()
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(err)))?;
    Ok(DoorStateRecord {
        state,
        changed_at: read_timestamp(row, 1)?,
    })
}

/// Reads a required timestamp column stored as text.
fn read_timestamp(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<Timestamp> {
    let raw: String = row.get(idx)?;
    Timestamp::parse(&raw)
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err)))
}

/// Reads a loosely-typed text column; integer and real values are rendered as
/// text since older writers did not coerce them.
fn read_text(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<Option<String>> {
    match row.get_ref(idx)? {
        ValueRef::Null => Ok(None),
        ValueRef::Text(bytes) => Ok(Some(String::from_utf8_lossy(bytes).into_owned())),
        ValueRef::Integer(value) => Ok(Some(value.to_string())),
        ValueRef::Real(value) => Ok(Some(value.to_string())),
        ValueRef::Blob(_) => Err(rusqlite::Error::InvalidColumnType(
            idx,
            format!("column {idx}"),
            Type::Blob,
        )),
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Ensures the parent directory for the store exists.
fn ensure_parent_dir(path: &Path) -> Result<(), SqliteStoreError> {
    let Some(parent) = path.parent() else {
        return Err(SqliteStoreError::Io("store path missing parent directory".to_string()));
    };
    if parent.as_os_str().is_empty() {
        return Ok(());
    }
    std::fs::create_dir_all(parent).map_err(|err| SqliteStoreError::Io(err.to_string()))
}

/// Validates store paths for safety limits.
fn validate_store_path(path: &Path) -> Result<(), SqliteStoreError> {
    if path.as_os_str().is_empty() {
        return Err(SqliteStoreError::Invalid("store path must not be empty".to_string()));
    }
    let path_string = path.display().to_string();
    if path_string.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(SqliteStoreError::Invalid("store path exceeds length limit".to_string()));
    }
    for component in path.components() {
        let name = component.as_os_str().to_string_lossy();
        if name.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(SqliteStoreError::Invalid(
                "store path contains an overlong component".to_string(),
            ));
        }
    }
    if path.is_dir() {
        return Err(SqliteStoreError::Invalid(
            "store path must be a file, not a directory".to_string(),
        ));
    }
    Ok(())
}

/// Opens an `SQLite` connection with the configured pragmas.
fn open_connection(config: &SqliteStoreConfig) -> Result<Connection, SqliteStoreError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let connection = Connection::open_with_flags(&config.path, flags)
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    apply_pragmas(&connection, config)?;
    Ok(connection)
}

/// Applies `SQLite` pragmas required for durability and shared access.
fn apply_pragmas(
    connection: &Connection,
    config: &SqliteStoreConfig,
) -> Result<(), SqliteStoreError> {
    connection
        .busy_timeout(Duration::from_millis(config.busy_timeout_ms))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    connection
        .execute_batch(&format!("PRAGMA journal_mode = {};", config.journal_mode.pragma_value()))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    connection
        .execute_batch(&format!("PRAGMA synchronous = {};", config.sync_mode.pragma_value()))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    Ok(())
}

/// Creates missing tables and validates the recorded schema version.
///
/// Databases that predate `store_meta` are adopted in place: the door tables
/// are created only if absent, then the version row is written.
fn initialize_schema(connection: &mut Connection) -> Result<(), SqliteStoreError> {
    let tx = connection
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    tx.execute_batch("CREATE TABLE IF NOT EXISTS store_meta (version INTEGER NOT NULL);")
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    let version: Option<i64> = tx
        .query_row("SELECT version FROM store_meta LIMIT 1", params![], |row| row.get(0))
        .optional()
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    match version {
        None => {
            tx.execute("INSERT INTO store_meta (version) VALUES (?1)", params![SCHEMA_VERSION])
                .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        }
        Some(value) if value == SCHEMA_VERSION => {}
        Some(value) => {
            return Err(SqliteStoreError::VersionMismatch(format!(
                "unsupported schema version: {value}"
            )));
        }
    }
    tx.execute_batch(CREATE_TABLES).map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    tx.commit().map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    Ok(())
}
