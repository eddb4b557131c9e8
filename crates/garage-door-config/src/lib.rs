// crates/garage-door-config/src/lib.rs
// ============================================================================
// Module: Garage Door Config Library
// Description: Canonical config model and validation.
// Purpose: Single source of truth for garage-door.toml semantics.
// Dependencies: garage-door-core, garage-door-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! `garage-door-config` defines the configuration read once at startup by the
//! `garage-door` binary: database location and pragmas, monitor timings and
//! photo counts, challenge window, photo and log locations, and the sensor,
//! camera, and upload adapters. Validation fails closed.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
