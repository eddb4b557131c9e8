// crates/garage-door-core/src/lib.rs
// ============================================================================
// Module: Garage Door Core Library
// Description: Public API surface for the garage door monitor core.
// Purpose: Expose records, capability interfaces, and runtime components.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Garage door core holds the door state, lock, challenge, and text message
//! records, the interfaces the monitor talks to (store, sensor, camera,
//! uploader, clock), the challenge/lock authorization rules, and the state
//! monitor loop. Persistence and hardware live behind the interfaces so the
//! runtime can be driven by in-memory fakes in tests.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use self::core::*;

pub use interfaces::CAMERA_OUTPUT_PLACEHOLDER;
pub use interfaces::Camera;
pub use interfaces::CaptureError;
pub use interfaces::ChallengeCodeSource;
pub use interfaces::Clock;
pub use interfaces::DoorSensor;
pub use interfaces::DoorStore;
pub use interfaces::SensorError;
pub use interfaces::StoreError;
pub use interfaces::UploadError;
pub use interfaces::Uploader;
pub use runtime::AuthorizationError;
pub use runtime::Authorizer;
pub use runtime::CycleError;
pub use runtime::CycleOutcome;
pub use runtime::DoorMonitor;
pub use runtime::InMemoryDoorStore;
pub use runtime::ManualClock;
pub use runtime::MonitorConfig;
pub use runtime::MonitorReport;
pub use runtime::RandomCodeSource;
pub use runtime::SystemClock;
