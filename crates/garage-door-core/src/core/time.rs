// crates/garage-door-core/src/core/time.rs
// ============================================================================
// Module: Garage Door Time Model
// Description: Wall-clock timestamps shared by every persisted record.
// Purpose: Provide a sortable, text-stable timestamp for storage and logs.
// Dependencies: chrono, serde, time
// ============================================================================

//! ## Overview
//! Timestamps are naive wall-clock date-times with microsecond precision. The
//! storage form is `YYYY-MM-DD HH:MM:SS.ffffff`; the fraction is always
//! written so that text ordering matches chronological ordering. Parsing also
//! accepts the fraction-less form and a bare `YYYY-MM-DD` date (midnight).
//!
//! "Now" is local wall-clock time without an offset. Existing monitor
//! databases and any other process sharing the file write the same basis, so
//! rows from every writer order correctly against each other.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use ::time::Date;
use ::time::Month;
use ::time::OffsetDateTime;
use ::time::PrimitiveDateTime;
use ::time::Time;
use ::time::format_description::BorrowedFormatItem;
use ::time::macros::format_description;
use chrono::Datelike;
use chrono::NaiveDateTime;
use chrono::Timelike;
use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;
use thiserror::Error;

// ============================================================================
// SECTION: Formats
// ============================================================================

/// Storage format with a fractional second component.
const FRACTIONAL_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond]");
/// Storage format without a fractional second component.
const WHOLE_SECOND_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
/// Date-only format, interpreted as midnight.
const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Timestamp parsing and arithmetic errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimestampError {
    /// The text did not match any accepted timestamp form.
    #[error("invalid timestamp: {0}")]
    Parse(String),
    /// Arithmetic left the representable date range.
    #[error("timestamp out of range")]
    OutOfRange,
}

// ============================================================================
// SECTION: Timestamp
// ============================================================================

/// Naive wall-clock timestamp with microsecond precision.
///
/// # Invariants
/// - Sub-microsecond precision is truncated on construction.
/// - `Display` output is the storage form and sorts chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(PrimitiveDateTime);

impl Timestamp {
    /// Wraps a date-time, truncating it to microseconds.
    #[must_use]
    pub fn from_datetime(value: PrimitiveDateTime) -> Self {
        let micros = value.microsecond();
        let truncated = value.replace_microsecond(micros).unwrap_or(value);
        Self(truncated)
    }

    /// Returns the current local wall-clock time.
    #[must_use]
    pub fn now_local() -> Self {
        let now = chrono::Local::now().naive_local();
        Self::from_naive(&now).unwrap_or_else(|_| {
            let utc = OffsetDateTime::now_utc();
            Self(PrimitiveDateTime::new(utc.date(), utc.time()))
        })
    }

    /// Converts a `chrono` naive date-time, truncating it to microseconds.
    ///
    /// A leap-second fraction is clamped to the last microsecond of the second.
    ///
    /// # Errors
    ///
    /// Returns [`TimestampError::OutOfRange`] when the value is outside the
    /// supported calendar range.
    pub fn from_naive(value: &NaiveDateTime) -> Result<Self, TimestampError> {
        let month = u8::try_from(value.month())
            .ok()
            .and_then(|month| Month::try_from(month).ok())
            .ok_or(TimestampError::OutOfRange)?;
        let day = u8::try_from(value.day()).map_err(|_| TimestampError::OutOfRange)?;
        let date = Date::from_calendar_date(value.year(), month, day)
            .map_err(|_| TimestampError::OutOfRange)?;
        let hour = u8::try_from(value.hour()).map_err(|_| TimestampError::OutOfRange)?;
        let minute = u8::try_from(value.minute()).map_err(|_| TimestampError::OutOfRange)?;
        let second = u8::try_from(value.second()).map_err(|_| TimestampError::OutOfRange)?;
        let micros = value.nanosecond().min(999_999_999) / 1_000;
        let time = Time::from_hms_micro(hour, minute, second, micros)
            .map_err(|_| TimestampError::OutOfRange)?;
        Ok(Self(PrimitiveDateTime::new(date, time)))
    }

    /// Returns the wrapped date-time.
    #[must_use]
    pub const fn as_datetime(&self) -> PrimitiveDateTime {
        self.0
    }

    /// Parses a timestamp from any accepted text form.
    ///
    /// # Errors
    ///
    /// Returns [`TimestampError::Parse`] when the text matches no form.
    pub fn parse(value: &str) -> Result<Self, TimestampError> {
        let trimmed = value.trim();
        if let Ok(parsed) = PrimitiveDateTime::parse(trimmed, FRACTIONAL_FORMAT) {
            return Ok(Self::from_datetime(parsed));
        }
        if let Ok(parsed) = PrimitiveDateTime::parse(trimmed, WHOLE_SECOND_FORMAT) {
            return Ok(Self::from_datetime(parsed));
        }
        Date::parse(trimmed, DATE_FORMAT)
            .map(|date| Self(date.midnight()))
            .map_err(|_| TimestampError::Parse(trimmed.to_string()))
    }

    /// Returns this timestamp moved forward by `duration`.
    ///
    /// # Errors
    ///
    /// Returns [`TimestampError::OutOfRange`] when the result is unrepresentable.
    pub fn checked_add(self, duration: Duration) -> Result<Self, TimestampError> {
        let delta = ::time::Duration::try_from(duration).map_err(|_| TimestampError::OutOfRange)?;
        self.0.checked_add(delta).map(Self::from_datetime).ok_or(TimestampError::OutOfRange)
    }

    /// Returns this timestamp moved back by `duration`.
    ///
    /// # Errors
    ///
    /// Returns [`TimestampError::OutOfRange`] when the result is unrepresentable.
    pub fn checked_sub(self, duration: Duration) -> Result<Self, TimestampError> {
        let delta = ::time::Duration::try_from(duration).map_err(|_| TimestampError::OutOfRange)?;
        self.0.checked_sub(delta).map(Self::from_datetime).ok_or(TimestampError::OutOfRange)
    }

    /// Returns the `YYYYMMDD` partition label used for photo directories.
    #[must_use]
    pub fn date_partition(&self) -> String {
        let date = self.0.date();
        format!("{:04}{:02}{:02}", date.year(), u8::from(date.month()), date.day())
    }

    /// Returns a `YYYYMMDD_HHMMSS_ffffff` stamp suitable for file names.
    #[must_use]
    pub fn file_stamp(&self) -> String {
        let time = self.0.time();
        format!(
            "{}_{:02}{:02}{:02}_{:06}",
            self.date_partition(),
            time.hour(),
            time.minute(),
            time.second(),
            time.microsecond()
        )
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let date = self.0.date();
        let time = self.0.time();
        write!(
            f,
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}.{:06}",
            date.year(),
            u8::from(date.month()),
            date.day(),
            time.hour(),
            time.minute(),
            time.second(),
            time.microsecond()
        )
    }
}

impl FromStr for Timestamp {
    type Err = TimestampError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

impl From<PrimitiveDateTime> for Timestamp {
    fn from(value: PrimitiveDateTime) -> Self {
        Self::from_datetime(value)
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
