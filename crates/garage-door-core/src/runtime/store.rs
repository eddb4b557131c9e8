// crates/garage-door-core/src/runtime/store.rs
// ============================================================================
// Module: Garage Door In-Memory Store
// Description: Simple in-memory door store for tests and examples.
// Purpose: Provide a deterministic store implementation without external deps.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! This module provides an in-memory implementation of [`DoorStore`] with the
//! same observable contract as the `SQLite` store: duplicate sids and second
//! locks are rejected, equal timestamps resolve by insertion order, and
//! challenge expiry is evaluated at lookup time. It is not durable.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::time::Duration;

use crate::core::ChallengeRecord;
use crate::core::DEFAULT_CHALLENGE_VALIDITY;
use crate::core::DoorState;
use crate::core::DoorStateRecord;
use crate::core::NewTextMessage;
use crate::core::TextMessageRecord;
use crate::core::Timestamp;
use crate::core::challenge_window_start;
use crate::interfaces::Clock;
use crate::interfaces::DoorStore;
use crate::interfaces::StoreError;
use crate::interfaces::require_field;
use crate::runtime::clock::SystemClock;

// ============================================================================
// SECTION: In-Memory Store
// ============================================================================

/// Tables held by the in-memory store, in insertion order.
#[derive(Debug, Default)]
struct MemoryTables {
    /// Text message audit rows.
    messages: Vec<TextMessageRecord>,
    /// Singleton lock.
    lock: Option<Timestamp>,
    /// Door state history rows.
    history: Vec<DoorStateRecord>,
    /// Challenge rows.
    challenges: Vec<ChallengeRecord>,
}

/// In-memory door store for tests and examples.
#[derive(Clone)]
pub struct InMemoryDoorStore {
    /// Tables protected by a mutex.
    tables: Arc<Mutex<MemoryTables>>,
    /// Clock used for defaulted timestamps.
    clock: Arc<dyn Clock>,
    /// Challenge validity window.
    challenge_validity: Duration,
}

impl Default for InMemoryDoorStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryDoorStore {
    /// Creates an empty store using the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Creates an empty store using `clock` for defaulted timestamps.
    #[must_use]
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            tables: Arc::new(Mutex::new(MemoryTables::default())),
            clock,
            challenge_validity: DEFAULT_CHALLENGE_VALIDITY,
        }
    }

    /// Overrides the challenge validity window.
    #[must_use]
    pub const fn with_challenge_validity(mut self, validity: Duration) -> Self {
        self.challenge_validity = validity;
        self
    }

    /// Locks the tables.
    fn tables(&self) -> Result<MutexGuard<'_, MemoryTables>, StoreError> {
        self.tables.lock().map_err(|_| StoreError::Store("door store mutex poisoned".to_string()))
    }
}

impl DoorStore for InMemoryDoorStore {
    fn insert_message(&self, message: &NewTextMessage) -> Result<TextMessageRecord, StoreError> {
        require_field("sid", &message.sid)?;
        let now = self.clock.now();
        let record = TextMessageRecord::from_draft(
            message,
            message.created_at.unwrap_or(now),
            message.sent_at.unwrap_or(now),
        );
        let mut guard = self.tables()?;
        if guard.messages.iter().any(|existing| existing.sid == message.sid) {
            return Err(StoreError::DuplicateKey(format!("text message {}", message.sid)));
        }
        guard.messages.push(record.clone());
        drop(guard);
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
        let mut guard = self.tables()?;
        let record = guard
            .messages
            .iter_mut()
            .find(|record| record.sid == sid)
            .ok_or_else(|| StoreError::NotFound(format!("text message {sid}")))?;
        record.status = Some(status.to_string());
        record.status_message = status_message.map(str::to_string);
        drop(guard);
        Ok(())
    }

    fn find_messages_since(&self, from: Timestamp) -> Result<Vec<TextMessageRecord>, StoreError> {
        let mut messages: Vec<TextMessageRecord> = self
            .tables()?
            .messages
            .iter()
            .filter(|record| record.created_at >= from)
            .cloned()
            .collect();
        messages.sort_by_key(|record| record.created_at);
        Ok(messages)
    }

    fn insert_lock(&self, locked_at: Option<Timestamp>) -> Result<Timestamp, StoreError> {
        let locked_at = locked_at.unwrap_or_else(|| self.clock.now());
        let mut guard = self.tables()?;
        if guard.lock.is_some() {
            return Err(StoreError::AlreadyLocked);
        }
        guard.lock = Some(locked_at);
        drop(guard);
        Ok(locked_at)
    }

    fn remove_lock(&self) -> Result<(), StoreError> {
        self.tables()?.lock = None;
        Ok(())
    }

    fn find_lock(&self) -> Result<Option<Timestamp>, StoreError> {
        Ok(self.tables()?.lock)
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
        self.tables()?.history.push(record.clone());
        Ok(record)
    }

    fn find_latest_door_state(&self) -> Result<Option<DoorStateRecord>, StoreError> {
        let guard = self.tables()?;
        let latest = guard
            .history
            .iter()
            .enumerate()
            .max_by_key(|(index, record)| (record.changed_at, *index))
            .map(|(_, record)| record.clone());
        drop(guard);
        Ok(latest)
    }

    fn find_door_states_since(&self, from: Timestamp) -> Result<Vec<DoorStateRecord>, StoreError> {
        let mut records: Vec<DoorStateRecord> = self
            .tables()?
            .history
            .iter()
            .filter(|record| record.changed_at > from)
            .cloned()
            .collect();
        records.sort_by_key(|record| record.changed_at);
        Ok(records)
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
        self.tables()?.challenges.push(record.clone());
        Ok(record)
    }

    fn delete_challenge(&self, code: &str) -> Result<usize, StoreError> {
        require_field("code", code)?;
        let mut guard = self.tables()?;
        let before = guard.challenges.len();
        guard.challenges.retain(|record| record.code != code);
        let removed = before - guard.challenges.len();
        drop(guard);
        Ok(removed)
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
            None => challenge_window_start(self.clock.now(), self.challenge_validity)
                .map_err(|err| StoreError::Validation(err.to_string()))?,
        };
        let guard = self.tables()?;
        let message = guard
            .challenges
            .iter()
            .enumerate()
            .filter(|(_, record)| record.code == code && record.challenged_at > valid_after)
            .filter_map(|(index, record)| {
                guard
                    .messages
                    .iter()
                    .find(|message| message.sid == record.message_sid)
                    .map(|message| (record.challenged_at, index, message))
            })
            .max_by_key(|(challenged_at, index, _)| (*challenged_at, *index))
            .map(|(_, _, message)| message.clone());
        drop(guard);
        Ok(message)
    }

    fn purge_challenges_before(&self, cutoff: Timestamp) -> Result<usize, StoreError> {
        let mut guard = self.tables()?;
        let before = guard.challenges.len();
        guard.challenges.retain(|record| record.challenged_at > cutoff);
        let removed = before - guard.challenges.len();
        drop(guard);
        Ok(removed)
    }

    fn reset_schema(&self) -> Result<(), StoreError> {
        *self.tables()? = MemoryTables::default();
        Ok(())
    }
}
