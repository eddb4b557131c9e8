// crates/garage-door-devices/src/lib.rs
// ============================================================================
// Module: Garage Door Devices Library
// Description: Reference adapters for the sensor, camera, and uploader seams.
// Purpose: Connect the monitor loop to files, capture commands, and folders.
// Dependencies: garage-door-core, serde_json, tracing
// ============================================================================

//! ## Overview
//! Each adapter implements one capability trait from `garage-door-core`:
//! - [`GpioValueSensor`] reads a sysfs-style value file.
//! - [`CommandCamera`] runs an external still-capture program.
//! - [`DirectoryUploader`] copies photo batches into a destination folder.
//! - [`LogUploader`] records photo batches as JSON lines.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod camera;
pub mod sensor;
pub mod upload;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use camera::CommandCamera;
pub use sensor::GpioValueSensor;
pub use upload::DirectoryUploader;
pub use upload::LogUploader;
