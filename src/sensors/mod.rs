//! Sensor subsystem — analog channel descriptors and the ADC reader.
//!
//! A [`SensorChannel`] is built once at startup (inside
//! [`DeviceContext`](crate::app::context::DeviceContext)) and never mutated.
//! Each read produces a fresh [`RawSample`].

pub mod analog;

use core::num::NonZeroU32;

use crate::payload::Feed;
use crate::pins;

/// Full-scale code after widening the native ADC result to 16 bits.
pub const ADC_FULL_SCALE: NonZeroU32 = NonZeroU32::new(65_535).unwrap();

/// One analog input and the constants needed to interpret it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorChannel {
    /// Feed the reading is published to.
    pub feed: Feed,
    /// ADC1 channel handle used by the oneshot driver.
    pub adc_channel: u32,
    pub gpio: i32,
    /// Volts represented by `full_scale`.
    pub reference_voltage: f64,
    pub full_scale: NonZeroU32,
}

impl SensorChannel {
    pub fn thermistor(reference_voltage: f64) -> Self {
        Self {
            feed: Feed::Thermistor,
            adc_channel: pins::THERMISTOR_ADC_CHANNEL,
            gpio: pins::THERMISTOR_ADC_GPIO,
            reference_voltage,
            full_scale: ADC_FULL_SCALE,
        }
    }

    pub fn photoresistor(reference_voltage: f64) -> Self {
        Self {
            feed: Feed::Photoresistor,
            adc_channel: pins::PHOTORESISTOR_ADC_CHANNEL,
            gpio: pins::PHOTORESISTOR_ADC_GPIO,
            reference_voltage,
            full_scale: ADC_FULL_SCALE,
        }
    }
}

/// A single ADC code in `[0, full_scale]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RawSample(u16);

impl RawSample {
    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    /// Widen a native 12-bit ADC result to the 16-bit code space by bit
    /// replication, so 0 → 0 and 4095 → 65535.
    pub const fn from_native_12bit(native: u16) -> Self {
        let n = native & 0x0FFF;
        Self((n << 4) | (n >> 8))
    }

    pub const fn code(self) -> u16 {
        self.0
    }

    /// The code as the signed integer the converter functions take.
    pub fn as_i32(self) -> i32 {
        i32::from(self.0)
    }
}
