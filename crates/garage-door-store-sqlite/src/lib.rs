// crates/garage-door-store-sqlite/src/lib.rs
// ============================================================================
// Module: SQLite Door Store
// Description: Durable DoorStore backend using SQLite.
// Purpose: Persist door history, locks, challenges, and text messages.
// Dependencies: garage-door-core, rusqlite
// ============================================================================

//! ## Overview
//! This crate provides a SQLite-backed [`garage_door_core::DoorStore`]. The
//! four-table layout is fixed so that databases written by earlier monitor
//! deployments open without migration; a small `store_meta` table records the
//! schema version alongside them.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use store::SCHEMA_VERSION;
pub use store::SqliteDoorStore;
pub use store::SqliteStoreConfig;
pub use store::SqliteStoreError;
pub use store::SqliteStoreMode;
pub use store::SqliteSyncMode;
