// crates/garage-door-devices/src/sensor.rs
// ============================================================================
// Module: GPIO Value Sensor
// Description: Door sensor backed by a sysfs-style value file.
// Purpose: Report door closure from a reed switch exported as a file.
// Dependencies: garage-door-core, std
// ============================================================================

//! ## Overview
//! `GpioValueSensor` reads a small text file (for example
//! `/sys/class/gpio/gpioN/value`) on every poll. The trimmed content equal to
//! the configured closed value means closed; any other non-empty value means
//! open. Empty files are reported as unexpected values.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Read;
use std::path::Path;
use std::path::PathBuf;

use garage_door_core::DoorSensor;
use garage_door_core::SensorError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum bytes read from the value file.
const MAX_VALUE_BYTES: u64 = 64;

// ============================================================================
// SECTION: Sensor
// ============================================================================

/// File-backed door sensor.
#[derive(Debug, Clone)]
pub struct GpioValueSensor {
    /// Value file path.
    value_path: PathBuf,
    /// Trimmed content meaning "closed".
    closed_value: String,
}

impl GpioValueSensor {
    /// Creates a sensor reading `value_path`.
    #[must_use]
    pub fn new(value_path: impl Into<PathBuf>, closed_value: impl Into<String>) -> Self {
        Self {
            value_path: value_path.into(),
            closed_value: closed_value.into().trim().to_string(),
        }
    }

    /// Returns the value file path.
    #[must_use]
    pub fn value_path(&self) -> &Path {
        &self.value_path
    }
}

impl DoorSensor for GpioValueSensor {
    fn is_closed(&self) -> Result<bool, SensorError> {
        let file = std::fs::File::open(&self.value_path).map_err(|err| {
            SensorError::ReadFailed(format!("{}: {err}", self.value_path.display()))
        })?;
        let mut raw = String::new();
        file.take(MAX_VALUE_BYTES)
            .read_to_string(&mut raw)
            .map_err(|err| SensorError::ReadFailed(err.to_string()))?;
        let value = raw.trim();
        if value.is_empty() {
            return Err(SensorError::UnexpectedValue("empty sensor value".to_string()));
        }
        Ok(value == self.closed_value)
    }
}
