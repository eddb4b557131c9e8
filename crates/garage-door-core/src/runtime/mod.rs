// crates/garage-door-core/src/runtime/mod.rs
// ============================================================================
// Module: Garage Door Runtime
// Description: Authorization model, monitor loop, and reference helpers.
// Purpose: Execute door monitoring and lock authorization over interfaces.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! The runtime holds the two pieces of decision logic (challenge/lock
//! authorization and the state monitor loop) plus reference clocks, a random
//! code source, and an in-memory store.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod authorization;
pub mod clock;
pub mod codes;
pub mod monitor;
pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use authorization::AuthorizationError;
pub use authorization::Authorizer;
pub use clock::ManualClock;
pub use clock::SystemClock;
pub use codes::RandomCodeSource;
pub use monitor::CycleError;
pub use monitor::CycleOutcome;
pub use monitor::DoorMonitor;
pub use monitor::MonitorConfig;
pub use monitor::MonitorReport;
pub use store::InMemoryDoorStore;
