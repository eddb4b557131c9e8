// crates/garage-door-core/src/runtime/authorization.rs
// ============================================================================
// Module: Challenge/Lock Authorization
// Description: Rules for issuing and consuming challenges and for locking.
// Purpose: Decide whether a remote lock or unlock request is authorized.
// Dependencies: crate::{core, interfaces}, thiserror, tracing
// ============================================================================

//! ## Overview
//! The authorizer is pure decision logic over a [`DoorStore`]. It issues
//! numeric challenge codes bound to an inbound message, validates candidate
//! codes, and sets or clears the administrative lock.
//!
//! Invariants:
//! - Unknown and expired codes fail identically with
//!   [`AuthorizationError::ChallengeInvalid`].
//! - A verified challenge stays valid until deleted or expired; callers use
//!   [`Authorizer::consume_challenge`] (or delete explicitly) to prevent replay.
//! - A newly issued code never matches a challenge that is still live.
//! - Locking twice fails with [`AuthorizationError::AlreadyLocked`]; unlocking
//!   is idempotent.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;
use tracing::info;
use tracing::warn;

use crate::core::DEFAULT_CODE_LENGTH;
use crate::core::TextMessageRecord;
use crate::core::Timestamp;
use crate::interfaces::ChallengeCodeSource;
use crate::interfaces::DoorStore;
use crate::interfaces::StoreError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Codes drawn before giving up on finding one not already live.
const MAX_ISSUE_ATTEMPTS: usize = 32;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Authorization failures reported back to the requester.
#[derive(Debug, Error)]
pub enum AuthorizationError {
    /// The code was never issued, has expired, or was already consumed.
    #[error("challenge code is invalid")]
    ChallengeInvalid,
    /// A lock was requested while the door is already locked.
    #[error("door is already locked")]
    AlreadyLocked,
    /// Actuation was requested while the door is locked.
    #[error("door is locked since {locked_at}")]
    Locked {
        /// When the lock was placed.
        locked_at: Timestamp,
    },
    /// Every drawn code collided with a live challenge.
    #[error("no unused challenge code available")]
    CodesExhausted,
    /// The store failed.
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for AuthorizationError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::AlreadyLocked => Self::AlreadyLocked,
            other => Self::Store(other),
        }
    }
}

// ============================================================================
// SECTION: Authorizer
// ============================================================================

/// Challenge and lock authorization over a door store.
pub struct Authorizer<S, G> {
    /// Backing store.
    store: S,
    /// Challenge code generator.
    codes: G,
    /// Number of digits per issued code.
    code_length: usize,
}

impl<S: DoorStore, G: ChallengeCodeSource> Authorizer<S, G> {
    /// Creates an authorizer issuing codes of the default length.
    #[must_use]
    pub const fn new(store: S, codes: G) -> Self {
        Self {
            store,
            codes,
            code_length: DEFAULT_CODE_LENGTH,
        }
    }

    /// Overrides the issued code length; zero falls back to the default.
    #[must_use]
    pub const fn with_code_length(mut self, code_length: usize) -> Self {
        self.code_length = if code_length == 0 { DEFAULT_CODE_LENGTH } else { code_length };
        self
    }

    /// Returns the backing store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Issues and persists a fresh code for the inbound message `message_sid`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthorizationError::Store`] when the challenge cannot be saved
    /// and [`AuthorizationError::CodesExhausted`] when every drawn code is
    /// already live.
    pub fn issue_challenge(&self, message_sid: &str) -> Result<String, AuthorizationError> {
        for _ in 0 .. MAX_ISSUE_ATTEMPTS {
            let code = self.codes.next_code(self.code_length);
            if self.store.find_challenge(&code, None)?.is_some() {
                continue;
            }
            let record = self.store.insert_challenge(&code, message_sid, None)?;
            info!(message_sid, challenged_at = %record.challenged_at, "issued door challenge");
            return Ok(code);
        }
        warn!(message_sid, "challenge code space exhausted");
        Err(AuthorizationError::CodesExhausted)
    }

    /// Returns the originating message when `code` is currently valid.
    ///
    /// # Errors
    ///
    /// Returns [`AuthorizationError::ChallengeInvalid`] when the code is
    /// unknown or expired.
    pub fn verify_challenge(&self, code: &str) -> Result<TextMessageRecord, AuthorizationError> {
        if let Some(message) = self.store.find_challenge(code, None)? {
            return Ok(message);
        }
        warn!("rejected invalid door challenge");
        Err(AuthorizationError::ChallengeInvalid)
    }

    /// Verifies `code` and deletes it so it cannot be replayed.
    ///
    /// # Errors
    ///
    /// Returns [`AuthorizationError::ChallengeInvalid`] when the code is
    /// unknown or expired.
    pub fn consume_challenge(&self, code: &str) -> Result<TextMessageRecord, AuthorizationError> {
        let message = self.verify_challenge(code)?;
        self.store.delete_challenge(code)?;
        info!(message_sid = %message.sid, "consumed door challenge");
        Ok(message)
    }

    /// Places the administrative lock.
    ///
    /// # Errors
    ///
    /// Returns [`AuthorizationError::AlreadyLocked`] when a lock exists.
    pub fn lock(&self) -> Result<Timestamp, AuthorizationError> {
        let locked_at = self.store.insert_lock(None)?;
        info!(%locked_at, "door locked");
        Ok(locked_at)
    }

    /// Removes the administrative lock if present.
    ///
    /// # Errors
    ///
    /// Returns [`AuthorizationError::Store`] when the store fails.
    pub fn unlock(&self) -> Result<(), AuthorizationError> {
        self.store.remove_lock()?;
        info!("door unlocked");
        Ok(())
    }

    /// Returns when the door was locked, if it is.
    ///
    /// # Errors
    ///
    /// Returns [`AuthorizationError::Store`] when the store fails.
    pub fn lock_status(&self) -> Result<Option<Timestamp>, AuthorizationError> {
        Ok(self.store.find_lock()?)
    }

    /// Guard for door actuation: fails while the lock is held.
    ///
    /// # Errors
    ///
    /// Returns [`AuthorizationError::Locked`] when the door is locked.
    pub fn ensure_unlocked(&self) -> Result<(), AuthorizationError> {
        match self.store.find_lock()? {
            Some(locked_at) => Err(AuthorizationError::Locked {
                locked_at,
            }),
            None => Ok(()),
        }
    }
}
