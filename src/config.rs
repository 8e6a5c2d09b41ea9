//! System configuration parameters
//!
//! Everything the firmware needs at boot: broker and Wi-Fi credentials
//! (opaque to the core, passed straight to the transport), timing, and the
//! thermistor calibration. Loaded from NVS via [`ConfigPort`]; a JSON
//! provisioning document can be baked into the image at build time through
//! the `SENSORFEED_CONFIG_JSON` environment variable.
//!
//! [`ConfigPort`]: crate::app::ports::ConfigPort

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::adapters::mqtt::is_topic_segment;
use crate::adapters::wifi::{validate_password, validate_ssid};
use crate::app::ports::ConfigError;
use crate::convert::{self, ThermistorModel};

pub type HostString = heapless::String<64>;
pub type UserString = heapless::String<32>;
pub type SecretString = heapless::String<64>;
pub type SsidString = heapless::String<32>;

pub const DEFAULT_BROKER_HOST: &str = "io.adafruit.com";
pub const DEFAULT_BROKER_PORT: u16 = 1883;

/// Provisioning JSON embedded at build time, if any.
pub const EMBEDDED_CONFIG_JSON: Option<&str> = option_env!("SENSORFEED_CONFIG_JSON");

/// What the main loop does after boot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunMode {
    /// Sample and publish to the broker.
    Publish,
    /// Sample and log locally; no network.
    Monitor,
}

/// Unit a channel is shown in by the local monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReadoutMode {
    /// ADC code.
    Raw,
    /// Volts.
    Voltage,
    /// Degrees Celsius (thermistor only).
    Temperature,
}

/// Core system configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    pub run_mode: RunMode,

    // --- Broker ---
    pub broker_host: HostString,
    pub broker_port: u16,
    /// Broker user; also the first topic segment (`{username}/feeds/...`).
    pub username: UserString,
    /// Broker key / password.
    pub credential: SecretString,

    // --- Wi-Fi ---
    pub wifi_ssid: SsidString,
    pub wifi_password: SecretString,

    // --- Timing ---
    /// Interval between publish batches (milliseconds)
    pub publish_interval_ms: u32,
    /// Pause between main-loop iterations (milliseconds)
    pub poll_interval_ms: u32,
    /// Upper bound on waiting for the broker's CONNACK (milliseconds)
    pub connect_timeout_ms: u32,
    /// Local monitor sampling interval (milliseconds)
    pub monitor_interval_ms: u32,

    // --- Analog front end ---
    /// Volts at full-scale ADC code
    pub adc_reference_voltage: f64,
    pub thermistor_beta: f64,
    /// Calibration reference temperature (Kelvin)
    pub thermistor_reference_kelvin: f64,
    /// Raw code read at the reference temperature
    pub thermistor_reference_code: f64,

    // --- Local monitor ---
    pub thermistor_readout: ReadoutMode,
    pub photoresistor_readout: ReadoutMode,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            run_mode: RunMode::Publish,

            broker_host: HostString::try_from(DEFAULT_BROKER_HOST).unwrap_or_default(),
            broker_port: DEFAULT_BROKER_PORT,
            username: UserString::new(),
            credential: SecretString::new(),

            wifi_ssid: SsidString::new(),
            wifi_password: SecretString::new(),

            publish_interval_ms: 5_000,
            poll_interval_ms: 100,
            connect_timeout_ms: 10_000,
            monitor_interval_ms: 500,

            adc_reference_voltage: 3.3,
            thermistor_beta: convert::BETA,
            thermistor_reference_kelvin: convert::REFERENCE_KELVIN,
            thermistor_reference_code: convert::REFERENCE_CODE,

            thermistor_readout: ReadoutMode::Temperature,
            photoresistor_readout: ReadoutMode::Raw,
        }
    }
}

impl TelemetryConfig {
    /// Parse and validate a JSON provisioning document. Missing fields are
    /// rejected; start from [`TelemetryConfig::default`] serialised to JSON
    /// to get a complete template.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(json).map_err(|_| ConfigError::Corrupted)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn thermistor_model(&self) -> ThermistorModel {
        ThermistorModel::new(
            self.thermistor_beta,
            self.thermistor_reference_kelvin,
            self.thermistor_reference_code,
        )
    }

    /// Range-check every field. Invalid values are rejected, never clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.run_mode == RunMode::Publish {
            if self.broker_host.is_empty() {
                return Err(ConfigError::ValidationFailed("broker_host must not be empty"));
            }
            if self.broker_port == 0 {
                return Err(ConfigError::ValidationFailed("broker_port must be non-zero"));
            }
            if !is_topic_segment(&self.username) {
                return Err(ConfigError::ValidationFailed(
                    "username must be a non-empty topic segment (no '/', '+', '#' or space)",
                ));
            }
            validate_ssid(&self.wifi_ssid).map_err(|_| {
                ConfigError::ValidationFailed("wifi_ssid must be 1-32 printable ASCII bytes")
            })?;
            validate_password(&self.wifi_password).map_err(|_| {
                ConfigError::ValidationFailed("wifi_password must be empty or 8-64 bytes")
            })?;
        }
        if !(1_000..=3_600_000).contains(&self.publish_interval_ms) {
            return Err(ConfigError::ValidationFailed(
                "publish_interval_ms must be 1000–3600000",
            ));
        }
        if self.poll_interval_ms > 5_000 {
            return Err(ConfigError::ValidationFailed("poll_interval_ms must be 0–5000"));
        }
        if !(500..=60_000).contains(&self.connect_timeout_ms) {
            return Err(ConfigError::ValidationFailed(
                "connect_timeout_ms must be 500–60000",
            ));
        }
        if !(50..=60_000).contains(&self.monitor_interval_ms) {
            return Err(ConfigError::ValidationFailed(
                "monitor_interval_ms must be 50–60000",
            ));
        }
        if !(self.adc_reference_voltage > 0.0 && self.adc_reference_voltage <= 5.0) {
            return Err(ConfigError::ValidationFailed(
                "adc_reference_voltage must be in (0, 5] V",
            ));
        }
        if !(self.thermistor_beta > 0.0 && self.thermistor_beta.is_finite()) {
            return Err(ConfigError::ValidationFailed("thermistor_beta must be positive"));
        }
        if !(200.0..=400.0).contains(&self.thermistor_reference_kelvin) {
            return Err(ConfigError::ValidationFailed(
                "thermistor_reference_kelvin must be 200–400 K",
            ));
        }
        if !(self.thermistor_reference_code > 0.0 && self.thermistor_reference_code.is_finite()) {
            return Err(ConfigError::ValidationFailed(
                "thermistor_reference_code must be positive",
            ));
        }
        if self.photoresistor_readout == ReadoutMode::Temperature {
            return Err(ConfigError::ValidationFailed(
                "photoresistor_readout cannot be Temperature",
            ));
        }
        Ok(())
    }
}

// Credentials never reach the log.
impl fmt::Debug for TelemetryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelemetryConfig")
            .field("run_mode", &self.run_mode)
            .field("broker_host", &self.broker_host)
            .field("broker_port", &self.broker_port)
            .field("username", &self.username)
            .field("credential", &"<redacted>")
            .field("wifi_ssid", &self.wifi_ssid)
            .field("wifi_password", &"<redacted>")
            .field("publish_interval_ms", &self.publish_interval_ms)
            .field("poll_interval_ms", &self.poll_interval_ms)
            .field("connect_timeout_ms", &self.connect_timeout_ms)
            .field("monitor_interval_ms", &self.monitor_interval_ms)
            .field("adc_reference_voltage", &self.adc_reference_voltage)
            .field("thermistor_beta", &self.thermistor_beta)
            .field("thermistor_reference_kelvin", &self.thermistor_reference_kelvin)
            .field("thermistor_reference_code", &self.thermistor_reference_code)
            .field("thermistor_readout", &self.thermistor_readout)
            .field("photoresistor_readout", &self.photoresistor_readout)
            .finish()
    }
}
