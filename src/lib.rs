//! sensorfeed firmware library.
//!
//! Exposes the pure-logic modules for integration testing and host-side
//! simulation. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod cadence;
pub mod config;
pub mod convert;
pub mod error;
pub mod payload;
pub mod pins;

// The adapters and drivers compile on every target; hardware access inside
// them is cfg-gated.
pub mod adapters;
pub mod drivers;
pub mod sensors;
