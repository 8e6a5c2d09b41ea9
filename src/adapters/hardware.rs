//! Hardware adapter — bridges the ADC to the domain's [`AnalogPort`].
//!
//! This is the only module in the system that touches the analog front
//! end. On non-espidf targets the underlying reader is a cfg-gated
//! simulation.

use log::trace;

use crate::app::ports::AnalogPort;
use crate::error::SensorError;
use crate::sensors::analog::AdcReader;
use crate::sensors::{RawSample, SensorChannel};

/// Concrete adapter that puts the ADC reader behind the port trait.
pub struct HardwareAdapter {
    adc: AdcReader,
}

impl HardwareAdapter {
    pub fn new(adc: AdcReader) -> Self {
        Self { adc }
    }

    /// Access the reader, e.g. to inject simulated codes.
    pub fn adc_mut(&mut self) -> &mut AdcReader {
        &mut self.adc
    }
}

impl AnalogPort for HardwareAdapter {
    fn sample(&mut self, channel: &SensorChannel) -> Result<RawSample, SensorError> {
        let sample = self.adc.read(channel)?;
        trace!(
            "ADC1 ch{} (GPIO{}) -> {}",
            channel.adc_channel,
            channel.gpio,
            sample.code()
        );
        Ok(sample)
    }
}
