//! ADC1 oneshot reader.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: reads through the oneshot unit configured by `hw_init` and
//! widens the 12-bit result to 16 bits.
//! On host/test: returns per-channel codes injected with [`AdcReader::sim_set`]
//! and can be told to fail a channel with [`AdcReader::sim_fail`].

#[cfg(target_os = "espidf")]
use crate::drivers::hw_init;
use crate::error::SensorError;
#[cfg(not(target_os = "espidf"))]
use crate::pins::ADC1_CHANNEL_COUNT;

use super::{RawSample, SensorChannel};

/// Code every simulated channel reports until told otherwise (25 °C on the
/// thermistor model).
#[cfg(not(target_os = "espidf"))]
pub const SIM_DEFAULT_CODE: u16 = 10_000;

pub struct AdcReader {
    #[cfg(not(target_os = "espidf"))]
    sim_codes: [u16; ADC1_CHANNEL_COUNT],
    #[cfg(not(target_os = "espidf"))]
    sim_faulted: [bool; ADC1_CHANNEL_COUNT],
}

impl Default for AdcReader {
    fn default() -> Self {
        Self::new()
    }
}

impl AdcReader {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            sim_codes: [SIM_DEFAULT_CODE; ADC1_CHANNEL_COUNT],
            #[cfg(not(target_os = "espidf"))]
            sim_faulted: [false; ADC1_CHANNEL_COUNT],
        }
    }

    /// Take one conversion on `channel`.
    pub fn read(&mut self, channel: &SensorChannel) -> Result<RawSample, SensorError> {
        self.read_native(channel.adc_channel)
            .map(RawSample::from_native_12bit)
            .map_err(|code| SensorError::HardwareFault {
                adc_channel: channel.adc_channel,
                code,
            })
    }

    #[cfg(target_os = "espidf")]
    fn read_native(&mut self, adc_channel: u32) -> Result<u16, i32> {
        hw_init::adc1_read(adc_channel)
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_native(&mut self, adc_channel: u32) -> Result<u16, i32> {
        let idx = adc_channel as usize;
        if idx >= ADC1_CHANNEL_COUNT || self.sim_faulted[idx] {
            return Err(-1);
        }
        // Stored codes are 16-bit; hand back the native 12-bit value.
        Ok(self.sim_codes[idx] >> 4)
    }

    /// Set the 16-bit code a simulated channel reports. The low nibble is
    /// lost to the 12-bit round trip.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_set(&mut self, adc_channel: u32, code: u16) {
        if let Some(slot) = self.sim_codes.get_mut(adc_channel as usize) {
            *slot = code;
        }
    }

    /// Make every subsequent read of `adc_channel` fail (or recover).
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_fail(&mut self, adc_channel: u32, failed: bool) {
        if let Some(slot) = self.sim_faulted.get_mut(adc_channel as usize) {
            *slot = failed;
        }
    }
}
