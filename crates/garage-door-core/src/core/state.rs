// crates/garage-door-core/src/core/state.rs
// ============================================================================
// Module: Door State Records
// Description: Door open/closed state and its history rows.
// Purpose: Provide the typed form of the append-only state history log.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! The door is either open or closed. Every detected transition appends one
//! [`DoorStateRecord`]; the newest record by `changed_at` is the current state.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Door State
// ============================================================================

/// Sensor-derived door state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DoorState {
    /// Door is open.
    Open,
    /// Door is closed.
    Closed,
}

impl DoorState {
    /// Maps a sensor "is closed" reading to a door state.
    #[must_use]
    pub const fn from_closed(is_closed: bool) -> Self {
        if is_closed { Self::Closed } else { Self::Open }
    }

    /// Returns the persisted label (`open` / `closed`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for DoorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a persisted state label is unknown.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown door state: {0}")]
pub struct ParseDoorStateError(pub String);

impl FromStr for DoorState {
    type Err = ParseDoorStateError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "open" => Ok(Self::Open),
            "closed" => Ok(Self::Closed),
            other => Err(ParseDoorStateError(other.to_string())),
        }
    }
}

// ============================================================================
// SECTION: History Record
// ============================================================================

/// One row of the door state history log.
///
/// # Invariants
/// - Rows are never mutated after insertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoorStateRecord {
    /// State the door moved into.
    pub state: DoorState,
    /// When the transition was recorded.
    pub changed_at: Timestamp,
}
