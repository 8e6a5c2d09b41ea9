//! Device context — everything the main loop owns.
//!
//! Built once at startup from [`TelemetryConfig`] and moved into the
//! [`TelemetryService`](super::service::TelemetryService). There is no
//! other copy of the channel descriptors or calibration constants.

use crate::cadence::PublishCadence;
use crate::config::TelemetryConfig;
use crate::convert::ThermistorModel;
use crate::sensors::SensorChannel;

#[derive(Debug, Clone)]
pub struct DeviceContext {
    pub thermistor: SensorChannel,
    pub photoresistor: SensorChannel,
    pub thermistor_model: ThermistorModel,
    pub cadence: PublishCadence,
}

impl DeviceContext {
    pub fn new(
        thermistor: SensorChannel,
        photoresistor: SensorChannel,
        thermistor_model: ThermistorModel,
        cadence: PublishCadence,
    ) -> Self {
        Self {
            thermistor,
            photoresistor,
            thermistor_model,
            cadence,
        }
    }

    pub fn from_config(config: &TelemetryConfig) -> Self {
        Self::new(
            SensorChannel::thermistor(config.adc_reference_voltage),
            SensorChannel::photoresistor(config.adc_reference_voltage),
            config.thermistor_model(),
            PublishCadence::new(u64::from(config.publish_interval_ms)),
        )
    }
}
