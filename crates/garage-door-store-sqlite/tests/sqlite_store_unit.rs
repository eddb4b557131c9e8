// crates/garage-door-store-sqlite/tests/sqlite_store_unit.rs
// ============================================================================
// Module: SQLite Door Store Unit Tests
// Description: Contract tests for the SQLite door store.
// Purpose: Validate uniqueness, ordering, windows, path safety, and
//          cross-connection behavior.
// ============================================================================

//! ## Overview
//! Unit-level tests for `SQLite` door store invariants:
//! - Duplicate message ids and double locks are rejected by constraints
//! - Latest state and history ordering with deterministic tie-breaks
//! - Challenge validity windows and replay after delete
//! - Path safety checks and schema version validation
//! - Concurrent lock attempts from independent connections

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
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use garage_door_core::DoorState;
use garage_door_core::DoorStore;
use garage_door_core::ManualClock;
use garage_door_core::NewTextMessage;
use garage_door_core::StoreError;
use garage_door_core::Timestamp;
use garage_door_store_sqlite::SqliteDoorStore;
use garage_door_store_sqlite::SqliteStoreConfig;
use garage_door_store_sqlite::SqliteStoreError;
use garage_door_store_sqlite::SqliteStoreMode;
use tempfile::TempDir;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn ts(value: &str) -> Timestamp {
    Timestamp::parse(value).unwrap()
}

fn open(path: &Path, clock: &ManualClock) -> SqliteDoorStore {
    SqliteDoorStore::new(&SqliteStoreConfig::new(path)).unwrap().with_clock(Arc::new(clock.clone()))
}

fn fixture() -> (TempDir, ManualClock, SqliteDoorStore) {
    let dir = TempDir::new().unwrap();
    let clock = ManualClock::new(ts("2024-06-01 08:00:00"));
    let store = open(&dir.path().join("garage.db"), &clock);
    (dir, clock, store)
}

// ============================================================================
// SECTION: Text Messages
// ============================================================================

#[test]
fn duplicate_message_sid_fails_and_keeps_first_row() {
    let (_dir, _clock, store) = fixture();
    let mut first = NewTextMessage::new("SM1");
    first.body = Some("lock".to_string());
    first.phone_from = Some("+15550001".to_string());
    store.insert_message(&first).unwrap();

    let mut second = NewTextMessage::new("SM1");
    second.body = Some("unlock".to_string());
    assert!(matches!(store.insert_message(&second), Err(StoreError::DuplicateKey(_))));

    let rows = store.find_messages_since(ts("2024-01-01")).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].body.as_deref(), Some("lock"));
    assert_eq!(rows[0].phone_from.as_deref(), Some("+15550001"));
}

#[test]
fn message_round_trip_preserves_every_field() {
    let (_dir, _clock, store) = fixture();
    let draft = NewTextMessage {
        sid: "SM42".to_string(),
        created_at: Some(ts("2024-06-01 07:59:58.123456")),
        sent_at: Some(ts("2024-06-01 07:59:59")),
        phone_from: Some("+15550001".to_string()),
        phone_to: Some("+15550002".to_string()),
        direction: Some("inbound".to_string()),
        status: Some("received".to_string()),
        status_message: None,
        error_code: Some("30003".to_string()),
        error_message: Some("unreachable".to_string()),
        body: Some("open".to_string()),
    };
    let inserted = store.insert_message(&draft).unwrap();
    let loaded = store.find_messages_since(ts("2024-06-01")).unwrap().remove(0);
    assert_eq!(loaded, inserted);
}

#[test]
fn missing_sid_is_a_validation_error() {
    let (_dir, _clock, store) = fixture();
    assert!(matches!(store.insert_message(&NewTextMessage::default()), Err(StoreError::Validation(_))));
}

#[test]
fn status_update_requires_existing_row() {
    let (_dir, _clock, store) = fixture();
    store.insert_message(&NewTextMessage::new("SM1")).unwrap();
    store.update_message_status("SM1", "delivered", Some("ok")).unwrap();
    let row = store.find_messages_since(ts("2024-01-01")).unwrap().remove(0);
    assert_eq!(row.status.as_deref(), Some("delivered"));
    assert_eq!(row.status_message.as_deref(), Some("ok"));

    store.update_message_status("SM1", "failed", None).unwrap();
    let row = store.find_messages_since(ts("2024-01-01")).unwrap().remove(0);
    assert_eq!(row.status_message, None);

    assert!(matches!(
        store.update_message_status("SM2", "delivered", None),
        Err(StoreError::NotFound(_))
    ));
    assert!(matches!(
        store.update_message_status("SM1", " ", None),
        Err(StoreError::Validation(_))
    ));
}

#[test]
fn messages_since_includes_boundary() {
    let (_dir, _clock, store) = fixture();
    for (sid, at) in [("SM1", "2024-06-01 07:00:00"), ("SM2", "2024-06-01 07:30:00")] {
        let mut draft = NewTextMessage::new(sid);
        draft.created_at = Some(ts(at));
        store.insert_message(&draft).unwrap();
    }
    let rows = store.find_messages_since(ts("2024-06-01 07:30:00")).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].sid, "SM2");
    assert!(store.find_messages_since(ts("2024-06-02")).unwrap().is_empty());
}

// ============================================================================
// SECTION: Lock
// ============================================================================

#[test]
fn second_lock_fails_and_first_is_kept() {
    let (_dir, clock, store) = fixture();
    let first = store.insert_lock(None).unwrap();
    clock.advance(Duration::from_secs(90));
    assert!(matches!(store.insert_lock(None), Err(StoreError::AlreadyLocked)));
    assert_eq!(store.find_lock().unwrap(), Some(first));
}

#[test]
fn remove_lock_without_lock_is_ok() {
    let (_dir, _clock, store) = fixture();
    store.remove_lock().unwrap();
    store.insert_lock(None).unwrap();
    store.remove_lock().unwrap();
    store.remove_lock().unwrap();
    assert_eq!(store.find_lock().unwrap(), None);
}

#[test]
fn concurrent_lock_attempts_from_separate_connections_admit_one() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("garage.db");
    let clock = ManualClock::new(ts("2024-06-01 08:00:00"));
    let stores: Vec<SqliteDoorStore> = (0 .. 4).map(|_| open(&path, &clock)).collect();

    let handles: Vec<_> = stores
        .into_iter()
        .map(|store| thread::spawn(move || store.insert_lock(None)))
        .collect();
    let results: Vec<_> = handles.into_iter().map(|handle| handle.join().unwrap()).collect();

    assert_eq!(results.iter().filter(|result| result.is_ok()).count(), 1);
    assert!(
        results
            .iter()
            .filter(|result| result.is_err())
            .all(|result| matches!(result, Err(StoreError::AlreadyLocked)))
    );
}

// ============================================================================
// SECTION: Door State History
// ============================================================================

#[test]
fn latest_state_uses_max_timestamp_then_insertion_order() {
    let (_dir, _clock, store) = fixture();
    assert!(store.find_latest_door_state().unwrap().is_none());
    store.insert_door_state(DoorState::Open, Some(ts("2024-06-01 09:00:00"))).unwrap();
    store.insert_door_state(DoorState::Closed, Some(ts("2024-06-01 08:00:00"))).unwrap();
    assert_eq!(store.find_latest_door_state().unwrap().unwrap().state, DoorState::Open);

    store.insert_door_state(DoorState::Closed, Some(ts("2024-06-01 09:00:00"))).unwrap();
    for _ in 0 .. 3 {
        assert_eq!(store.find_latest_door_state().unwrap().unwrap().state, DoorState::Closed);
    }
}

#[test]
fn states_since_is_strict() {
    let (_dir, _clock, store) = fixture();
    let boundary = ts("2024-06-01 12:00:00");
    store.insert_door_state(DoorState::Closed, Some(boundary)).unwrap();
    store.insert_door_state(DoorState::Open, Some(ts("2024-06-01 12:00:00.000001"))).unwrap();
    store.insert_door_state(DoorState::Closed, Some(ts("2024-06-01 11:59:59"))).unwrap();
    let rows = store.find_door_states_since(boundary).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].state, DoorState::Open);
}

#[test]
fn default_changed_at_comes_from_clock() {
    let (_dir, clock, store) = fixture();
    clock.advance(Duration::from_secs(3));
    let record = store.insert_door_state(DoorState::Open, None).unwrap();
    assert_eq!(record.changed_at, ts("2024-06-01 08:00:03"));
    assert_eq!(store.find_latest_door_state().unwrap().unwrap(), record);
}

// ============================================================================
// SECTION: Challenges
// ============================================================================

#[test]
fn challenge_found_inside_window_only() {
    let (_dir, clock, store) = fixture();
    store.insert_message(&NewTextMessage::new("SM100")).unwrap();
    store.insert_challenge("4821", "SM100", None).unwrap();

    clock.advance(Duration::from_secs(5 * 60));
    assert_eq!(store.find_challenge("4821", None).unwrap().unwrap().sid, "SM100");
    assert!(store.find_challenge("4822", None).unwrap().is_none());

    clock.set(ts("2024-06-01 08:15:00"));
    assert!(store.find_challenge("4821", None).unwrap().is_none());
}

#[test]
fn deleted_challenge_is_not_replayable() {
    let (_dir, clock, store) = fixture();
    store.insert_message(&NewTextMessage::new("SM100")).unwrap();
    store.insert_challenge("4821", "SM100", None).unwrap();
    clock.advance(Duration::from_secs(5 * 60));
    assert!(store.find_challenge("4821", None).unwrap().is_some());
    assert_eq!(store.delete_challenge("4821").unwrap(), 1);
    assert!(store.find_challenge("4821", None).unwrap().is_none());
    assert_eq!(store.delete_challenge("4821").unwrap(), 0);
}

#[test]
fn explicit_window_start_overrides_default() {
    let (_dir, clock, store) = fixture();
    store.insert_message(&NewTextMessage::new("SM1")).unwrap();
    store.insert_challenge("1111", "SM1", None).unwrap();
    clock.advance(Duration::from_secs(3600));
    assert!(store.find_challenge("1111", None).unwrap().is_none());
    assert!(store.find_challenge("1111", Some(ts("2024-06-01 07:59:59"))).unwrap().is_some());
    assert!(store.find_challenge("1111", Some(ts("2024-06-01 08:00:00"))).unwrap().is_none());
}

#[test]
fn shorter_validity_window() {
    let dir = TempDir::new().unwrap();
    let clock = ManualClock::new(ts("2024-06-01 08:00:00"));
    let store = open(&dir.path().join("garage.db"), &clock)
        .with_challenge_validity(Duration::from_secs(120));
    store.insert_message(&NewTextMessage::new("SM1")).unwrap();
    store.insert_challenge("2222", "SM1", None).unwrap();
    clock.advance(Duration::from_secs(119));
    assert!(store.find_challenge("2222", None).unwrap().is_some());
    clock.advance(Duration::from_secs(1));
    assert!(store.find_challenge("2222", None).unwrap().is_none());
}

#[test]
fn purge_deletes_expired_rows() {
    let (_dir, _clock, store) = fixture();
    store.insert_challenge("1", "SM1", Some(ts("2024-06-01 07:00:00"))).unwrap();
    store.insert_challenge("2", "SM1", Some(ts("2024-06-01 07:45:00"))).unwrap();
    store.insert_challenge("3", "SM1", Some(ts("2024-06-01 07:50:00"))).unwrap();
    assert_eq!(store.purge_challenges_before(ts("2024-06-01 07:45:00")).unwrap(), 2);
    assert_eq!(store.delete_challenge("3").unwrap(), 1);
}

// ============================================================================
// SECTION: Store Lifecycle
// ============================================================================

#[test]
fn data_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("garage.db");
    let clock = ManualClock::new(ts("2024-06-01 08:00:00"));
    let locked_at = {
        let store = open(&path, &clock);
        store.insert_door_state(DoorState::Open, None).unwrap();
        store.insert_lock(None).unwrap()
    };
    let reopened = open(&path, &clock);
    assert_eq!(reopened.find_lock().unwrap(), Some(locked_at));
    assert_eq!(reopened.find_latest_door_state().unwrap().unwrap().state, DoorState::Open);
}

#[test]
fn reset_schema_empties_tables() {
    let (_dir, _clock, store) = fixture();
    store.insert_message(&NewTextMessage::new("SM1")).unwrap();
    store.insert_lock(None).unwrap();
    store.insert_door_state(DoorState::Closed, None).unwrap();
    store.insert_challenge("1", "SM1", None).unwrap();
    store.reset_schema().unwrap();
    assert!(store.find_lock().unwrap().is_none());
    assert!(store.find_latest_door_state().unwrap().is_none());
    assert!(store.find_challenge("1", None).unwrap().is_none());
    store.insert_message(&NewTextMessage::new("SM1")).unwrap();
}

#[test]
fn rejects_directory_path() {
    let dir = TempDir::new().unwrap();
    let result = SqliteDoorStore::new(&SqliteStoreConfig::new(dir.path()));
    assert!(matches!(result, Err(SqliteStoreError::Invalid(_))));
}

#[test]
fn rejects_overlong_component() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("a".repeat(300)).join("garage.db");
    assert!(matches!(
        SqliteDoorStore::new(&SqliteStoreConfig::new(path)),
        Err(SqliteStoreError::Invalid(_))
    ));
}

#[test]
fn rejects_unknown_schema_version() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("garage.db");
    {
        let connection = rusqlite::Connection::open(&path).unwrap();
        connection
            .execute_batch(
                "CREATE TABLE store_meta (version INTEGER NOT NULL);
                 INSERT INTO store_meta (version) VALUES (99);",
            )
            .unwrap();
    }
    assert!(matches!(
        SqliteDoorStore::new(&SqliteStoreConfig::new(&path)),
        Err(SqliteStoreError::VersionMismatch(_))
    ));
}

#[test]
fn delete_journal_mode_opens() {
    let dir = TempDir::new().unwrap();
    let mut config = SqliteStoreConfig::new(dir.path().join("garage.db"));
    config.journal_mode = SqliteStoreMode::Delete;
    let store = SqliteDoorStore::new(&config).unwrap();
    store.check_connection().unwrap();
}
