// crates/garage-door-core/src/core/challenge.rs
// ============================================================================
// Module: Challenge Records
// Description: One-time authorization codes tied to a text message.
// Purpose: Define the challenge row and its validity defaults.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A challenge binds a short numeric code to the message that produced it.
//! Validity is a fixed window measured from `challenged_at` and is enforced
//! when the challenge is looked up; expired rows may still exist on disk.

use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

use crate::core::time::Timestamp;
use crate::core::time::TimestampError;

/// Default validity window for a challenge code.
pub const DEFAULT_CHALLENGE_VALIDITY: Duration = Duration::from_secs(15 * 60);
/// Default number of digits in an issued challenge code.
pub const DEFAULT_CODE_LENGTH: usize = 4;

/// Persisted challenge row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeRecord {
    /// Numeric challenge code.
    pub code: String,
    /// Identifier of the message that produced the challenge.
    pub message_sid: String,
    /// When the challenge was issued.
    pub challenged_at: Timestamp,
}

/// Returns the earliest exclusive `challenged_at` still valid at `now`.
///
/// # Errors
///
/// Returns [`TimestampError::OutOfRange`] when the window start is
/// unrepresentable.
pub fn challenge_window_start(
    now: Timestamp,
    validity: Duration,
) -> Result<Timestamp, TimestampError> {
    now.checked_sub(validity)
}
