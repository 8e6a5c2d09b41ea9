//! Unified error types for the sensorfeed firmware.
//!
//! Three failure classes with three different recovery policies:
//!
//! | Type              | Raised by          | Policy                               |
//! |-------------------|--------------------|--------------------------------------|
//! | [`SensorError`]   | ADC reader         | fatal, stops the main loop           |
//! | [`ConversionError`] | unit converter   | drop that channel's sample, continue |
//! | [`TransportError`]| MQTT / Wi-Fi       | log, reconnect, continue             |
//!
//! All variants are `Copy` so they can be carried in events and iteration
//! reports without allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// The oneshot conversion did not complete. `code` is the driver's
    /// return code (`esp_err_t` on device, `-1` in simulation).
    HardwareFault { adc_channel: u32, code: i32 },
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HardwareFault { adc_channel, code } => {
                write!(f, "ADC1 channel {adc_channel} conversion failed (rc={code})")
            }
        }
    }
}

impl core::error::Error for SensorError {}

// ---------------------------------------------------------------------------
// Conversion errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionError {
    /// The Beta model is undefined for this raw code (non-positive input,
    /// or a code so large the model denominator is no longer positive).
    Domain { raw: i32 },
    /// The converted value does not fit the text payload.
    Unrepresentable,
}

impl fmt::Display for ConversionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Domain { raw } => write!(f, "raw code {raw} outside thermistor model domain"),
            Self::Unrepresentable => write!(f, "value does not fit the payload buffer"),
        }
    }
}

impl core::error::Error for ConversionError {}

// ---------------------------------------------------------------------------
// Transport errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    /// Network association or broker session could not be established.
    Connection(&'static str),
    /// The broker or the MQTT stack reported a protocol-level failure.
    Protocol(&'static str),
    /// The session dropped or is not currently usable; retrying may succeed.
    TransientIo(&'static str),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connection(msg) => write!(f, "connection error: {msg}"),
            Self::Protocol(msg) => write!(f, "protocol error: {msg}"),
            Self::TransientIo(msg) => write!(f, "transient I/O error: {msg}"),
        }
    }
}

impl core::error::Error for TransportError {}
