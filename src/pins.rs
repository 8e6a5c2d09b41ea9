//! GPIO / ADC pin assignments for the sensor board.
//!
//! Single source of truth: the reader, `hw_init` and the device context all
//! reference this module rather than hard-coding channel numbers.

// ---------------------------------------------------------------------------
// Sensors — Analog (ADC1, oneshot mode)
// ---------------------------------------------------------------------------

/// NTC thermistor (10 kΩ @ 25 °C, B = 3950) in a divider to 3V3.
/// ADC1 channel 8 (GPIO 9 on ESP32-S3). Board silkscreen "A0".
pub const THERMISTOR_ADC_GPIO: i32 = 9;
pub const THERMISTOR_ADC_CHANNEL: u32 = 8;

/// CdS photoresistor in a divider to 3V3.
/// ADC1 channel 4 (GPIO 5 on ESP32-S3). Board silkscreen "A1".
pub const PHOTORESISTOR_ADC_GPIO: i32 = 5;
pub const PHOTORESISTOR_ADC_CHANNEL: u32 = 4;

/// Number of ADC1 channels on the ESP32-S3 (CH0..CH9).
pub const ADC1_CHANNEL_COUNT: usize = 10;
