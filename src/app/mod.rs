//! Application core — pure domain logic, zero I/O.
//!
//! This module contains the rules of the sensorfeed firmware: when to
//! sample, how readings become payloads, and how the loop recovers from a
//! broken session. All interaction with hardware and the network happens
//! through **port traits** defined in [`ports`], keeping this layer fully
//! testable without real peripherals.

pub mod context;
pub mod events;
pub mod monitor;
pub mod ports;
pub mod service;
