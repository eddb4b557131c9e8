// crates/garage-door-core/src/runtime/monitor.rs
// ============================================================================
// Module: Door State Monitor
// Description: Polling loop that records door transitions and photographs them.
// Purpose: Detect open/closed transitions and run the capture/upload workflow.
// Dependencies: crate::{core, interfaces}, thiserror, tracing
// ============================================================================

//! ## Overview
//! Each cycle reads the sensor, compares against the newest persisted state,
//! and on a transition appends a history row, takes a short photo sequence
//! into a date-partitioned directory, and uploads the sequence as one batch.
//!
//! Invariants:
//! - The monitor is the single writer of door state history.
//! - A cycle failure never ends the loop; it is logged and the next cycle
//!   starts from scratch after the normal poll interval.
//! - The stop flag is checked once per cycle, before any work.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::time::Duration;

use thiserror::Error;
use tracing::debug;
use tracing::error;
use tracing::info;

use crate::core::DoorState;
use crate::core::DoorStateRecord;
use crate::interfaces::Camera;
use crate::interfaces::CaptureError;
use crate::interfaces::Clock;
use crate::interfaces::DoorSensor;
use crate::interfaces::DoorStore;
use crate::interfaces::SensorError;
use crate::interfaces::StoreError;
use crate::interfaces::UploadError;
use crate::interfaces::Uploader;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default delay between polling cycles.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);
/// Default delay between photos in one sequence.
pub const DEFAULT_PHOTO_INTERVAL: Duration = Duration::from_secs(2);
/// Default photo count when the door opens.
pub const DEFAULT_PHOTOS_ON_OPEN: u32 = 5;
/// Default photo count when the door closes.
pub const DEFAULT_PHOTOS_ON_CLOSE: u32 = 1;

// ============================================================================
// SECTION: Config
// ============================================================================

/// Monitor loop tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorConfig {
    /// Delay between cycles.
    pub poll_interval: Duration,
    /// Delay between photos in one sequence.
    pub photo_interval: Duration,
    /// Photos taken when the door opens.
    pub photos_on_open: u32,
    /// Photos taken when the door closes.
    pub photos_on_close: u32,
    /// Base directory; photos land in `<base>/<YYYYMMDD>`.
    pub photo_directory: PathBuf,
}

impl MonitorConfig {
    /// Creates a config with default timings and photo counts.
    #[must_use]
    pub fn new(photo_directory: impl Into<PathBuf>) -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            photo_interval: DEFAULT_PHOTO_INTERVAL,
            photos_on_open: DEFAULT_PHOTOS_ON_OPEN,
            photos_on_close: DEFAULT_PHOTOS_ON_CLOSE,
            photo_directory: photo_directory.into(),
        }
    }

    /// Returns how many photos to take on a transition into `state`.
    #[must_use]
    pub const fn photo_count(&self, state: DoorState) -> u32 {
        match state {
            DoorState::Open => self.photos_on_open,
            DoorState::Closed => self.photos_on_close,
        }
    }
}

// ============================================================================
// SECTION: Cycle Results
// ============================================================================

/// Failure inside a single monitor cycle.
#[derive(Debug, Error)]
pub enum CycleError {
    /// The sensor could not be read.
    #[error(transparent)]
    Sensor(#[from] SensorError),
    /// The store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// A photo could not be captured.
    #[error(transparent)]
    Capture(#[from] CaptureError),
    /// The photo batch could not be uploaded.
    #[error(transparent)]
    Upload(#[from] UploadError),
}

impl CycleError {
    /// Returns a stable label for logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Sensor(_) => "sensor",
            Self::Store(_) => "store",
            Self::Capture(_) => "capture",
            Self::Upload(_) => "upload",
        }
    }

    /// Returns whether the loop should stop on this error. No kind is fatal
    /// today; every failure is retried on the next cycle.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        match self {
            Self::Sensor(_) | Self::Store(_) | Self::Capture(_) | Self::Upload(_) => false,
        }
    }
}

/// Result of one successful cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The sensor agrees with the newest persisted state.
    Unchanged(DoorState),
    /// A transition was recorded and photographed.
    Transitioned {
        /// The appended history row.
        record: DoorStateRecord,
        /// Photos captured and uploaded for the transition.
        photos: Vec<PathBuf>,
    },
}

/// Counters returned when the loop stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MonitorReport {
    /// Cycles executed.
    pub cycles: u64,
    /// Cycles that recorded a transition.
    pub transitions: u64,
    /// Cycles that failed.
    pub failures: u64,
}

// ============================================================================
// SECTION: Monitor
// ============================================================================

/// Door state monitor loop.
pub struct DoorMonitor<S, D, C, U> {
    /// State history store.
    store: S,
    /// Door position sensor.
    sensor: D,
    /// Camera used for transition photos.
    camera: C,
    /// Photo upload destination.
    uploader: U,
    /// Time source and sleep point.
    clock: Arc<dyn Clock>,
    /// Loop tuning.
    config: MonitorConfig,
}

impl<S, D, C, U> DoorMonitor<S, D, C, U>
where
    S: DoorStore,
    D: DoorSensor,
    C: Camera,
    U: Uploader,
{
    /// Creates a monitor over the given collaborators.
    pub fn new(
        store: S,
        sensor: D,
        camera: C,
        uploader: U,
        clock: Arc<dyn Clock>,
        config: MonitorConfig,
    ) -> Self {
        Self {
            store,
            sensor,
            camera,
            uploader,
            clock,
            config,
        }
    }

    /// Returns the loop configuration.
    #[must_use]
    pub const fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Runs cycles until `stop` is set, sleeping the poll interval after each.
    pub fn run(&self, stop: &AtomicBool) -> MonitorReport {
        info!(
            poll_interval_ms = duration_millis(self.config.poll_interval),
            photo_directory = %self.config.photo_directory.display(),
            "starting door state change monitor"
        );
        let mut report = MonitorReport::default();
        while !stop.load(Ordering::SeqCst) {
            report.cycles += 1;
            match self.run_cycle() {
                Ok(CycleOutcome::Transitioned {
                    ..
                }) => report.transitions += 1,
                Ok(CycleOutcome::Unchanged(_)) => {}
                Err(err) => {
                    report.failures += 1;
                    error!(kind = err.kind(), error = %err, "failure while monitoring door state change");
                    if err.is_fatal() {
                        break;
                    }
                }
            }
            self.clock.sleep(self.config.poll_interval);
        }
        info!(
            cycles = report.cycles,
            transitions = report.transitions,
            failures = report.failures,
            "door state change monitor stopped"
        );
        report
    }

    /// Executes one cycle without sleeping afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`CycleError`] when the sensor, store, camera, or uploader fails.
    pub fn run_cycle(&self) -> Result<CycleOutcome, CycleError> {
        let current = DoorState::from_closed(self.sensor.is_closed()?);
        let latest = self.store.find_latest_door_state()?;
        debug!(
            current = %current,
            latest = latest.as_ref().map_or("none", |record| record.state.as_str()),
            "polled door state"
        );
        if let Some(latest) = latest
            && latest.state == current
        {
            return Ok(CycleOutcome::Unchanged(current));
        }

        info!(state = %current, "setting door state");
        let record = self.store.insert_door_state(current, Some(self.clock.now()))?;
        let photos = self.take_pictures(current)?;
        if !photos.is_empty() {
            self.uploader.upload(&photos)?;
        }
        Ok(CycleOutcome::Transitioned {
            record,
            photos,
        })
    }

    /// Takes the photo sequence for a transition into `state`.
    fn take_pictures(&self, state: DoorState) -> Result<Vec<PathBuf>, CaptureError> {
        let count = self.config.photo_count(state);
        let directory = self.config.photo_directory.join(self.clock.now().date_partition());
        let mut photos = Vec::new();
        for index in 0..count {
            if index > 0 {
                self.clock.sleep(self.config.photo_interval);
            }
            photos.push(self.camera.take_picture(&directory, state.as_str())?);
        }
        Ok(photos)
    }
}

/// Converts a duration to whole milliseconds for logging.
fn duration_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
