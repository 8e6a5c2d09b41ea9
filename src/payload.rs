//! Published feed names and their text payloads.
//!
//! Both feeds are plain ASCII decimal: the thermistor as °C with two
//! fractional digits, the photoresistor as the integer ADC code.

use core::fmt::{self, Write};

use crate::error::ConversionError;

/// Maximum payload length in bytes.
pub const PAYLOAD_CAP: usize = 32;

/// Text payload ready for `TelemetryTransport::publish`.
pub type Payload = heapless::String<PAYLOAD_CAP>;

/// The two telemetry feeds, in publish order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feed {
    Thermistor,
    Photoresistor,
}

impl Feed {
    /// Channel name on the telemetry service.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Thermistor => "thermistor",
            Self::Photoresistor => "photoresistor",
        }
    }
}

impl fmt::Display for Feed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A physical reading on its way to the broker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TelemetryValue {
    /// Degrees Celsius.
    Celsius(f64),
    /// Unconverted ADC code.
    RawCode(u16),
}

impl TelemetryValue {
    pub fn encode(&self) -> Result<Payload, ConversionError> {
        let mut out = Payload::new();
        match self {
            Self::Celsius(c) => write!(out, "{c:.2}"),
            Self::RawCode(code) => write!(out, "{code}"),
        }
        .map_err(|_| ConversionError::Unrepresentable)?;
        Ok(out)
    }
}

impl fmt::Display for TelemetryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Celsius(c) => write!(f, "{c:.2} \u{00b0}C"),
            Self::RawCode(code) => write!(f, "{code} (raw)"),
        }
    }
}
