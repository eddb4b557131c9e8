// crates/garage-door-core/src/interfaces/mod.rs
// ============================================================================
// Module: Garage Door Interfaces
// Description: Contracts for storage, sensing, capture, upload, and time.
// Purpose: Define the seams between the monitor runtime and its collaborators.
// Dependencies: crate::core, thiserror
// ============================================================================

//! ## Overview
//! The runtime never touches a database, GPIO pin, camera, or upload target
//! directly. Each collaborator is a trait here; production adapters live in
//! the store and devices crates, fakes live in tests.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::core::ChallengeRecord;
use crate::core::DoorState;
use crate::core::DoorStateRecord;
use crate::core::NewTextMessage;
use crate::core::TextMessageRecord;
use crate::core::Timestamp;

// ============================================================================
// SECTION: Door Store
// ============================================================================

/// Door store errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A required field was missing or empty on a write.
    #[error("door store validation error: {0}")]
    Validation(String),
    /// A unique key (message sid) already exists.
    #[error("door store duplicate key: {0}")]
    DuplicateKey(String),
    /// A lock row already exists.
    #[error("door is already locked")]
    AlreadyLocked,
    /// No row matched an update.
    #[error("door store record not found: {0}")]
    NotFound(String),
    /// Store I/O error.
    #[error("door store io error: {0}")]
    Io(String),
    /// Storage engine or connectivity failure.
    #[error("door store error: {0}")]
    Store(String),
    /// Stored data could not be mapped into a record.
    #[error("door store corruption: {0}")]
    Corrupt(String),
    /// Stored schema version is incompatible.
    #[error("door store version mismatch: {0}")]
    VersionMismatch(String),
}

/// Durable owner of messages, the lock, state history, and challenges.
///
/// Every operation taking an optional timestamp resolves the default from the
/// store clock at call time.
pub trait DoorStore {
    /// Inserts a text message audit row.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Validation`] when `sid` is empty and
    /// [`StoreError::DuplicateKey`] when the `sid` already exists.
    fn insert_message(&self, message: &NewTextMessage) -> Result<TextMessageRecord, StoreError>;

    /// Updates the status fields of an existing message.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Validation`] when `sid` or `status` is empty and
    /// [`StoreError::NotFound`] when no message matches.
    fn update_message_status(
        &self,
        sid: &str,
        status: &str,
        status_message: Option<&str>,
    ) -> Result<(), StoreError>;

    /// Returns messages created at or after `from`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store cannot be read.
    fn find_messages_since(&self, from: Timestamp) -> Result<Vec<TextMessageRecord>, StoreError>;

    /// Creates the singleton lock and returns its `locked_at`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::AlreadyLocked`] when a lock already exists.
    fn insert_lock(&self, locked_at: Option<Timestamp>) -> Result<Timestamp, StoreError>;

    /// Removes the lock; succeeds when no lock exists.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store cannot be written.
    fn remove_lock(&self) -> Result<(), StoreError>;

    /// Returns when the door was locked, if it is.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store cannot be read.
    fn find_lock(&self) -> Result<Option<Timestamp>, StoreError>;

    /// Appends a state history row.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store cannot be written.
    fn insert_door_state(
        &self,
        state: DoorState,
        changed_at: Option<Timestamp>,
    ) -> Result<DoorStateRecord, StoreError>;

    /// Returns the newest history row; equal timestamps resolve to the latest
    /// insertion.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store cannot be read.
    fn find_latest_door_state(&self) -> Result<Option<DoorStateRecord>, StoreError>;

    /// Returns history rows strictly after `from`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store cannot be read.
    fn find_door_states_since(&self, from: Timestamp) -> Result<Vec<DoorStateRecord>, StoreError>;

    /// Records a challenge code for the originating message.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Validation`] when `code` or `message_sid` is empty.
    fn insert_challenge(
        &self,
        code: &str,
        message_sid: &str,
        challenged_at: Option<Timestamp>,
    ) -> Result<ChallengeRecord, StoreError>;

    /// Deletes every challenge with `code`, returning how many were removed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Validation`] when `code` is empty.
    fn delete_challenge(&self, code: &str) -> Result<usize, StoreError>;

    /// Returns the originating message of the newest challenge matching `code`
    /// issued strictly after `valid_after` (default: now minus the validity
    /// window). Unknown and expired codes both yield `None`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store cannot be read.
    fn find_challenge(
        &self,
        code: &str,
        valid_after: Option<Timestamp>,
    ) -> Result<Option<TextMessageRecord>, StoreError>;

    /// Deletes challenges issued at or before `cutoff`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store cannot be written.
    fn purge_challenges_before(&self, cutoff: Timestamp) -> Result<usize, StoreError>;

    /// Drops and recreates every table. Maintenance use only.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the schema cannot be rebuilt.
    fn reset_schema(&self) -> Result<(), StoreError>;
}

// ============================================================================
// SECTION: Door Sensor
// ============================================================================

/// Sensor read failures.
#[derive(Debug, Error)]
pub enum SensorError {
    /// The sensor could not be read.
    #[error("sensor read failed: {0}")]
    ReadFailed(String),
    /// The sensor returned a value outside the expected set.
    #[error("sensor returned unexpected value: {0}")]
    UnexpectedValue(String),
}

/// Door position sensor.
pub trait DoorSensor {
    /// Returns `true` when the door is closed.
    ///
    /// # Errors
    ///
    /// Returns [`SensorError`] when the sensor cannot be read.
    fn is_closed(&self) -> Result<bool, SensorError>;
}

// ============================================================================
// SECTION: Camera
// ============================================================================

/// Photo capture failures.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// The capture directory could not be prepared.
    #[error("capture directory error: {0}")]
    Directory(String),
    /// The camera failed to produce a photo.
    #[error("capture failed: {0}")]
    CaptureFailed(String),
}

/// Token in command-driven camera arguments replaced by the output path.
pub const CAMERA_OUTPUT_PLACEHOLDER: &str = "{output}";

/// Still camera pointed at the door.
pub trait Camera {
    /// Takes one photo into `directory`; file names embed `label` and a
    /// timestamp so uploads can be correlated by a human.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError`] when no photo was written.
    fn take_picture(&self, directory: &Path, label: &str) -> Result<PathBuf, CaptureError>;
}

// ============================================================================
// SECTION: Uploader
// ============================================================================

/// Upload failures.
#[derive(Debug, Error)]
pub enum UploadError {
    /// A file could not be read for upload.
    #[error("upload source error: {0}")]
    Source(String),
    /// The destination rejected or failed the upload.
    #[error("upload failed: {0}")]
    UploadFailed(String),
}

/// Destination for captured photos.
pub trait Uploader {
    /// Uploads one transition's photos as a single batch.
    ///
    /// # Errors
    ///
    /// Returns [`UploadError`] when any file fails to upload.
    fn upload(&self, files: &[PathBuf]) -> Result<(), UploadError>;
}

// ============================================================================
// SECTION: Clock
// ============================================================================

/// Source of wall-clock time and the loop's only suspension point.
pub trait Clock: Send + Sync {
    /// Returns the current time.
    fn now(&self) -> Timestamp;

    /// Blocks for `duration`.
    fn sleep(&self, duration: Duration);
}

// ============================================================================
// SECTION: Challenge Codes
// ============================================================================

/// Generator for unpredictable numeric challenge codes.
pub trait ChallengeCodeSource {
    /// Returns a code of exactly `length` decimal digits.
    fn next_code(&self, length: usize) -> String;
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Rejects an empty required field with [`StoreError::Validation`].
///
/// # Errors
///
/// Returns [`StoreError::Validation`] when `value` is empty or whitespace.
pub fn require_field(field: &str, value: &str) -> Result<(), StoreError> {
    if value.trim().is_empty() {
        return Err(StoreError::Validation(format!("{field} is required")));
    }
    Ok(())
}
