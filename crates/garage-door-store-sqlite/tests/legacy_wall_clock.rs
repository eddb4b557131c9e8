// crates/garage-door-store-sqlite/tests/legacy_wall_clock.rs
// ============================================================================
// Module: Legacy Wall-Clock Tests
// Description: Adopted databases whose rows were written in local wall time.
// Purpose: Keep new rows ordered against rows from existing writers.
// ============================================================================

//! Tests mixing legacy-written rows with rows defaulted by the store clock.

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
    reason = "Test-only assertions and helpers are permitted."
)]

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::Local;
use chrono::TimeDelta;
use garage_door_core::Camera;
use garage_door_core::CaptureError;
use garage_door_core::CycleOutcome;
use garage_door_core::DoorMonitor;
use garage_door_core::DoorSensor;
use garage_door_core::DoorState;
use garage_door_core::DoorStore;
use garage_door_core::MonitorConfig;
use garage_door_core::SensorError;
use garage_door_core::SystemClock;
use garage_door_core::Timestamp;
use garage_door_core::UploadError;
use garage_door_core::Uploader;
use garage_door_store_sqlite::SqliteDoorStore;
use garage_door_store_sqlite::SqliteStoreConfig;
use rusqlite::Connection;
use rusqlite::params;
use tempfile::TempDir;

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Sensor reporting an open door on every read.
struct OpenDoor;

impl DoorSensor for OpenDoor {
    fn is_closed(&self) -> Result<bool, SensorError> {
        Ok(false)
    }
}

/// Camera that names a photo without writing it.
struct NullCamera;

impl Camera for NullCamera {
    fn take_picture(&self, directory: &Path, label: &str) -> Result<PathBuf, CaptureError> {
        Ok(directory.join(format!("{label}.jpg")))
    }
}

/// Uploader that accepts every batch.
struct NullUploader;

impl Uploader for NullUploader {
    fn upload(&self, _files: &[PathBuf]) -> Result<(), UploadError> {
        Ok(())
    }
}

/// Local wall-clock text `minutes_ago` minutes back, as a legacy writer stores it.
fn legacy_stamp(minutes_ago: i64) -> String {
    (Local::now().naive_local() - TimeDelta::minutes(minutes_ago))
        .format("%Y-%m-%d %H:%M:%S%.6f")
        .to_string()
}

/// Creates a database with the original table layout and no `store_meta`.
fn legacy_database(path: &Path) {
    let connection = Connection::open(path).unwrap();
    connection
        .execute_batch(
            "CREATE TABLE text_messages (sid text UNIQUE, created_at timestamp, \
             sent_at timestamp, phone_from text, phone_to text, direction text, status text, \
             status_message text, error_code text, error_message text, body text);
             CREATE TABLE door_lock (id integer UNIQUE, locked_at timestamp);
             CREATE TABLE door_state_history (state text, changed_at timestamp);
             CREATE TABLE door_challenge (code text, text_message_sid text, \
             challenged_at timestamp);",
        )
        .unwrap();
    let created = legacy_stamp(20);
    connection
        .execute(
            "INSERT INTO text_messages (sid, created_at, sent_at, body) VALUES ('SM1', ?1, ?1, \
             'unlock')",
            params![created],
        )
        .unwrap();
    connection
        .execute(
            "INSERT INTO door_state_history VALUES ('closed', ?1)",
            params![legacy_stamp(1)],
        )
        .unwrap();
    connection
        .execute(
            "INSERT INTO door_challenge VALUES ('4821', 'SM1', ?1)",
            params![legacy_stamp(14)],
        )
        .unwrap();
    connection
        .execute(
            "INSERT INTO door_challenge VALUES ('9090', 'SM1', ?1)",
            params![legacy_stamp(16)],
        )
        .unwrap();
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn steady_door_after_legacy_row_records_one_transition() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("legacy.db");
    legacy_database(&path);

    let store = SqliteDoorStore::new(&SqliteStoreConfig::new(&path)).unwrap();
    let mut config = MonitorConfig::new(dir.path().join("photos"));
    config.photos_on_open = 1;
    config.photos_on_close = 1;
    let monitor =
        DoorMonitor::new(store, OpenDoor, NullCamera, NullUploader, Arc::new(SystemClock), config);

    let mut transitions = 0;
    for _ in 0 .. 3 {
        if let CycleOutcome::Transitioned {
            ..
        } = monitor.run_cycle().unwrap()
        {
            transitions += 1;
        }
    }
    assert_eq!(transitions, 1);

    let reader = SqliteDoorStore::new(&SqliteStoreConfig::new(&path)).unwrap();
    let latest = reader.find_latest_door_state().unwrap().unwrap();
    assert_eq!(latest.state, DoorState::Open);
    let all = reader.find_door_states_since(Timestamp::parse("2000-01-01").unwrap()).unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].state, DoorState::Closed);
}

#[test]
fn legacy_challenges_follow_local_validity_window() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("legacy.db");
    legacy_database(&path);

    let store = SqliteDoorStore::new(&SqliteStoreConfig::new(&path)).unwrap();
    assert_eq!(store.find_challenge("4821", None).unwrap().unwrap().sid, "SM1");
    assert!(store.find_challenge("9090", None).unwrap().is_none());
}

#[test]
fn defaulted_rows_sort_after_legacy_rows() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("legacy.db");
    legacy_database(&path);

    let store = SqliteDoorStore::new(&SqliteStoreConfig::new(&path)).unwrap();
    let legacy_latest = store.find_latest_door_state().unwrap().unwrap();
    let appended = store.insert_door_state(DoorState::Open, None).unwrap();
    assert!(appended.changed_at > legacy_latest.changed_at);
    assert_eq!(store.find_latest_door_state().unwrap().unwrap(), appended);
}
