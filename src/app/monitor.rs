//! Local readout monitor.
//!
//! Offline bench mode: samples both channels on a fixed interval and logs
//! each one in its configured [`ReadoutMode`]. Never touches the network.

use core::convert::Infallible;

use log::info;

use crate::config::{ReadoutMode, TelemetryConfig};
use crate::convert::{self, ThermistorModel};
use crate::error::{ConversionError, SensorError};
use crate::sensors::{RawSample, SensorChannel};

use super::context::DeviceContext;
use super::events::AppEvent;
use super::ports::{AnalogPort, EventSink};

pub struct Monitor {
    channels: [(SensorChannel, ReadoutMode); 2],
    model: ThermistorModel,
}

impl Monitor {
    pub fn new(
        ctx: &DeviceContext,
        thermistor_mode: ReadoutMode,
        photoresistor_mode: ReadoutMode,
    ) -> Self {
        Self {
            channels: [
                (ctx.thermistor, thermistor_mode),
                (ctx.photoresistor, photoresistor_mode),
            ],
            model: ctx.thermistor_model,
        }
    }

    pub fn from_config(config: &TelemetryConfig) -> Self {
        Self::new(
            &DeviceContext::from_config(config),
            config.thermistor_readout,
            config.photoresistor_readout,
        )
    }

    /// Sample and report both channels once.
    pub fn tick(
        &self,
        hw: &mut impl AnalogPort,
        sink: &mut impl EventSink,
    ) -> Result<(), SensorError> {
        for (channel, mode) in &self.channels {
            let raw = hw.sample(channel)?;
            match self.readout(*mode, channel, raw) {
                Ok(value) => sink.emit(&AppEvent::Readout {
                    feed: channel.feed,
                    mode: *mode,
                    raw: raw.code(),
                    value,
                }),
                Err(error) => sink.emit(&AppEvent::SampleDropped {
                    feed: channel.feed,
                    error,
                }),
            }
        }
        Ok(())
    }

    /// Tick forever, calling `pace` in between. Returns only when the ADC
    /// fails.
    pub fn run(
        &self,
        hw: &mut impl AnalogPort,
        sink: &mut impl EventSink,
        mut pace: impl FnMut(),
    ) -> Result<Infallible, SensorError> {
        info!("Monitor running (no network)");
        loop {
            self.tick(hw, sink)?;
            pace();
        }
    }

    fn readout(
        &self,
        mode: ReadoutMode,
        channel: &SensorChannel,
        raw: RawSample,
    ) -> Result<f64, ConversionError> {
        match mode {
            ReadoutMode::Raw => Ok(f64::from(raw.code())),
            ReadoutMode::Voltage => Ok(convert::to_voltage(
                raw.as_i32(),
                channel.reference_voltage,
                channel.full_scale,
            )),
            ReadoutMode::Temperature => self.model.celsius(raw.as_i32()),
        }
    }
}
