// crates/garage-door-core/src/core/mod.rs
// ============================================================================
// Module: Garage Door Core Types
// Description: Canonical records persisted by the door store.
// Purpose: Provide stable, serializable types for door state, locks,
//          challenges, and text messages.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! Core types mirror the four persisted entities (state history, lock,
//! challenge, text message) plus the timestamp model they share. The store
//! crate maps rows into these types explicitly; nothing here touches storage.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod challenge;
pub mod message;
pub mod state;
pub mod time;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use challenge::ChallengeRecord;
pub use challenge::DEFAULT_CHALLENGE_VALIDITY;
pub use challenge::DEFAULT_CODE_LENGTH;
pub use challenge::challenge_window_start;
pub use message::NewTextMessage;
pub use message::TextMessageRecord;
pub use state::DoorState;
pub use state::DoorStateRecord;
pub use state::ParseDoorStateError;
pub use self::time::Timestamp;
pub use self::time::TimestampError;
