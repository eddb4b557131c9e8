// crates/garage-door-core/src/core/message.rs
// ============================================================================
// Module: Text Message Records
// Description: Audit rows for inbound and outbound text messages.
// Purpose: Provide the insert draft and the stored form of a message.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Each processed text message is stored once, keyed by its external `sid`.
//! Only `status` and `status_message` change after insertion.

use serde::Deserialize;
use serde::Serialize;

use crate::core::time::Timestamp;

/// Message to insert into the audit log.
///
/// `created_at` and `sent_at` default to the store clock when omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTextMessage {
    /// External message identifier (idempotency key).
    pub sid: String,
    /// Creation time reported by the transport.
    pub created_at: Option<Timestamp>,
    /// Send time reported by the transport.
    pub sent_at: Option<Timestamp>,
    /// Sender address.
    pub phone_from: Option<String>,
    /// Recipient address.
    pub phone_to: Option<String>,
    /// Transport direction label (for example `inbound`).
    pub direction: Option<String>,
    /// Delivery status label.
    pub status: Option<String>,
    /// Free-form status detail.
    pub status_message: Option<String>,
    /// Transport error code.
    pub error_code: Option<String>,
    /// Transport error message.
    pub error_message: Option<String>,
    /// Message body.
    pub body: Option<String>,
}

impl NewTextMessage {
    /// Creates a draft with only the identifier set.
    #[must_use]
    pub fn new(sid: impl Into<String>) -> Self {
        Self {
            sid: sid.into(),
            ..Self::default()
        }
    }
}

/// Stored text message row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextMessageRecord {
    /// External message identifier.
    pub sid: String,
    /// Creation time.
    pub created_at: Timestamp,
    /// Send time.
    pub sent_at: Timestamp,
    /// Sender address.
    pub phone_from: Option<String>,
    /// Recipient address.
    pub phone_to: Option<String>,
    /// Transport direction label.
    pub direction: Option<String>,
    /// Delivery status label.
    pub status: Option<String>,
    /// Free-form status detail.
    pub status_message: Option<String>,
    /// Transport error code.
    pub error_code: Option<String>,
    /// Transport error message.
    pub error_message: Option<String>,
    /// Message body.
    pub body: Option<String>,
}

impl TextMessageRecord {
    /// Builds the stored form of a draft using resolved timestamps.
    #[must_use]
    pub fn from_draft(draft: &NewTextMessage, created_at: Timestamp, sent_at: Timestamp) -> Self {
        Self {
            sid: draft.sid.clone(),
            created_at,
            sent_at,
            phone_from: draft.phone_from.clone(),
            phone_to: draft.phone_to.clone(),
            direction: draft.direction.clone(),
            status: draft.status.clone(),
            status_message: draft.status_message.clone(),
            error_code: draft.error_code.clone(),
            error_message: draft.error_message.clone(),
            body: draft.body.clone(),
        }
    }
}
