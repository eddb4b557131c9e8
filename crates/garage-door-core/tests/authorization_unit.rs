// crates/garage-door-core/tests/authorization_unit.rs
// ============================================================================
// Module: Authorization Unit Tests
// Description: Challenge issue/verify/consume and lock rules.
// Purpose: Validate replay protection, expiry windows, and lock semantics.
// ============================================================================

//! Unit tests for the challenge/lock authorization model.

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

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use garage_door_core::AuthorizationError;
use garage_door_core::Authorizer;
use garage_door_core::ChallengeCodeSource;
use garage_door_core::DoorStore;
use garage_door_core::InMemoryDoorStore;
use garage_door_core::ManualClock;
use garage_door_core::NewTextMessage;
use garage_door_core::RandomCodeSource;
use garage_door_core::Timestamp;

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Code source that always returns the same code.
struct FixedCode(&'static str);

impl ChallengeCodeSource for FixedCode {
    fn next_code(&self, _length: usize) -> String {
        self.0.to_string()
    }
}

/// Code source replaying a fixed sequence, repeating the last code.
struct ScriptedCodes(Mutex<VecDeque<&'static str>>);

impl ScriptedCodes {
    fn new(codes: &[&'static str]) -> Self {
        Self(Mutex::new(codes.iter().copied().collect()))
    }
}

impl ChallengeCodeSource for ScriptedCodes {
    fn next_code(&self, _length: usize) -> String {
        let mut codes = self.0.lock().unwrap();
        let code = if codes.len() > 1 { codes.pop_front().unwrap() } else { codes[0] };
        code.to_string()
    }
}

fn start() -> Timestamp {
    Timestamp::parse("2024-06-01 18:00:00").unwrap()
}

fn fixture(code: &'static str) -> (ManualClock, Authorizer<InMemoryDoorStore, FixedCode>) {
    let clock = ManualClock::new(start());
    let store = InMemoryDoorStore::with_clock(Arc::new(clock.clone()));
    store.insert_message(&NewTextMessage::new("SM100")).unwrap();
    (clock, Authorizer::new(store, FixedCode(code)))
}

// ============================================================================
// SECTION: Challenges
// ============================================================================

#[test]
fn issue_consume_then_replay_is_rejected() {
    let (clock, authorizer) = fixture("4821");
    assert_eq!(authorizer.issue_challenge("SM100").unwrap(), "4821");

    clock.advance(Duration::from_secs(5 * 60));
    let message = authorizer.consume_challenge("4821").unwrap();
    assert_eq!(message.sid, "SM100");

    clock.advance(Duration::from_secs(60));
    assert!(matches!(
        authorizer.verify_challenge("4821"),
        Err(AuthorizationError::ChallengeInvalid)
    ));
    assert!(authorizer.store().find_challenge("4821", None).unwrap().is_none());
}

#[test]
fn verify_does_not_consume() {
    let (_clock, authorizer) = fixture("1234");
    authorizer.issue_challenge("SM100").unwrap();
    assert_eq!(authorizer.verify_challenge("1234").unwrap().sid, "SM100");
    assert_eq!(authorizer.verify_challenge("1234").unwrap().sid, "SM100");
}

#[test]
fn expired_and_unknown_codes_fail_identically() {
    let (clock, authorizer) = fixture("7777");
    authorizer.issue_challenge("SM100").unwrap();

    assert!(matches!(
        authorizer.verify_challenge("0000"),
        Err(AuthorizationError::ChallengeInvalid)
    ));

    clock.advance(Duration::from_secs(15 * 60));
    assert!(matches!(
        authorizer.verify_challenge("7777"),
        Err(AuthorizationError::ChallengeInvalid)
    ));
}

#[test]
fn challenge_valid_just_inside_window() {
    let (clock, authorizer) = fixture("2468");
    authorizer.issue_challenge("SM100").unwrap();
    clock.advance(Duration::from_secs(15 * 60 - 1));
    assert!(authorizer.verify_challenge("2468").is_ok());
}

#[test]
fn challenge_for_missing_message_is_invalid() {
    let (_clock, authorizer) = fixture("5555");
    authorizer.issue_challenge("SM999").unwrap();
    assert!(matches!(
        authorizer.verify_challenge("5555"),
        Err(AuthorizationError::ChallengeInvalid)
    ));
}

#[test]
fn random_codes_respect_configured_length() {
    let store = InMemoryDoorStore::new();
    store.insert_message(&NewTextMessage::new("SM1")).unwrap();
    let authorizer = Authorizer::new(store, RandomCodeSource).with_code_length(6);
    let code = authorizer.issue_challenge("SM1").unwrap();
    assert_eq!(code.len(), 6);
    assert!(code.chars().all(|c| c.is_ascii_digit()));
    assert_eq!(authorizer.verify_challenge(&code).unwrap().sid, "SM1");
}

#[test]
fn issue_skips_codes_that_are_still_live() {
    let clock = ManualClock::new(start());
    let store = InMemoryDoorStore::with_clock(Arc::new(clock.clone()));
    store.insert_message(&NewTextMessage::new("SM1")).unwrap();
    store.insert_message(&NewTextMessage::new("SM2")).unwrap();
    let authorizer = Authorizer::new(store, ScriptedCodes::new(&["4821", "4821", "5309"]));

    assert_eq!(authorizer.issue_challenge("SM1").unwrap(), "4821");
    assert_eq!(authorizer.issue_challenge("SM2").unwrap(), "5309");

    assert_eq!(authorizer.consume_challenge("5309").unwrap().sid, "SM2");
    assert_eq!(authorizer.verify_challenge("4821").unwrap().sid, "SM1");
}

#[test]
fn expired_code_may_be_reissued() {
    let clock = ManualClock::new(start());
    let store = InMemoryDoorStore::with_clock(Arc::new(clock.clone()));
    store.insert_message(&NewTextMessage::new("SM1")).unwrap();
    store.insert_message(&NewTextMessage::new("SM2")).unwrap();
    let authorizer = Authorizer::new(store, FixedCode("4821"));

    authorizer.issue_challenge("SM1").unwrap();
    clock.advance(Duration::from_secs(16 * 60));
    assert_eq!(authorizer.issue_challenge("SM2").unwrap(), "4821");
    assert_eq!(authorizer.verify_challenge("4821").unwrap().sid, "SM2");
}

#[test]
fn issue_gives_up_when_every_code_is_live() {
    let (_clock, authorizer) = fixture("1111");
    authorizer.issue_challenge("SM100").unwrap();
    assert!(matches!(
        authorizer.issue_challenge("SM100"),
        Err(AuthorizationError::CodesExhausted)
    ));
    assert_eq!(authorizer.verify_challenge("1111").unwrap().sid, "SM100");
}

// ============================================================================
// SECTION: Locks
// ============================================================================

#[test]
fn second_lock_fails_and_keeps_first_timestamp() {
    let (clock, authorizer) = fixture("0001");
    let first = authorizer.lock().unwrap();
    clock.advance(Duration::from_secs(30));
    assert!(matches!(authorizer.lock(), Err(AuthorizationError::AlreadyLocked)));
    assert_eq!(authorizer.lock_status().unwrap(), Some(first));
}

#[test]
fn unlock_is_idempotent() {
    let (_clock, authorizer) = fixture("0001");
    authorizer.unlock().unwrap();
    authorizer.lock().unwrap();
    authorizer.unlock().unwrap();
    authorizer.unlock().unwrap();
    assert_eq!(authorizer.lock_status().unwrap(), None);
}

#[test]
fn actuation_guard_reports_lock_time() {
    let (_clock, authorizer) = fixture("0001");
    authorizer.ensure_unlocked().unwrap();
    let locked_at = authorizer.lock().unwrap();
    match authorizer.ensure_unlocked() {
        Err(AuthorizationError::Locked {
            locked_at: reported,
        }) => assert_eq!(reported, locked_at),
        other => panic!("expected locked, got {other:?}"),
    }
}
