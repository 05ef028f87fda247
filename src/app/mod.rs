//! Application core: lifecycle logic with zero direct I/O.
//!
//! The request monitor lives here; the orchestrator engine lives in
//! [`crate::fsm`].  All interaction with hardware happens through the
//! **port traits** in [`ports`], keeping this layer testable without real
//! peripherals.

pub mod events;
pub mod monitor;
pub mod ports;
