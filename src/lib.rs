//! OTA lifecycle firmware library.
//!
//! Exposes the lifecycle logic for integration testing and for the
//! firmware binary. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod boot;
pub mod config;
pub mod drivers;
pub mod error;
pub mod events;
pub mod fsm;
pub mod lifecycle;
pub mod pins;
pub mod tasks;
mod time_driver;
