//! Unit conversion: raw ADC codes → volts and degrees Celsius.
//!
//! Everything here is pure and stateless so it can be unit-tested without
//! hardware. All arithmetic is `f64`; the Beta model subtracts two nearly
//! equal reciprocals around the reference point and `f32` loses most of the
//! significant digits there.
//!
//! The thermistor uses the simplified Beta-parameter equation
//!
//! ```text
//!            1
//! T = ─────────────────────────────────── − 273.15
//!      ln(raw / R_CODE) / β  +  1 / T0
//! ```
//!
//! with `β = 3950`, `R_CODE = 10000` and `T0 = 298.15 K`. The raw code is
//! used directly as the resistance proxy, which makes the reading
//! monotonically decreasing in the ADC code.

use core::num::NonZeroU32;

use crate::error::ConversionError;

/// Offset between the Kelvin and Celsius scales.
pub const KELVIN_OFFSET: f64 = 273.15;

/// Thermistor Beta coefficient (datasheet B25/85).
pub const BETA: f64 = 3950.0;

/// Raw code that corresponds to the reference temperature.
pub const REFERENCE_CODE: f64 = 10_000.0;

/// Calibration reference temperature: 25 °C.
pub const REFERENCE_KELVIN: f64 = 25.0 + KELVIN_OFFSET;

/// Convert a raw ADC code to the voltage it represents.
///
/// Linear and unclamped: codes outside `[0, full_scale]` produce voltages
/// outside `[0, reference_voltage]`.
pub fn to_voltage(raw: i32, reference_voltage: f64, full_scale: NonZeroU32) -> f64 {
    reference_voltage * (f64::from(raw) / f64::from(full_scale.get()))
}

/// Convert a raw ADC code to °C with the nominal (25 °C) thermistor model.
pub fn to_temperature_celsius(raw: i32) -> Result<f64, ConversionError> {
    ThermistorModel::NOMINAL.celsius(raw)
}

/// Beta-parameter thermistor model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThermistorModel {
    pub beta: f64,
    /// Temperature (K) at which the sensor reads `reference_code`.
    pub reference_kelvin: f64,
    pub reference_code: f64,
}

impl ThermistorModel {
    pub const NOMINAL: Self = Self {
        beta: BETA,
        reference_kelvin: REFERENCE_KELVIN,
        reference_code: REFERENCE_CODE,
    };

    pub fn new(beta: f64, reference_kelvin: f64, reference_code: f64) -> Self {
        Self {
            beta,
            reference_kelvin,
            reference_code,
        }
    }

    /// Map a raw code to °C.
    ///
    /// Fails with [`ConversionError::Domain`] for `raw <= 0` (the logarithm
    /// is undefined) and for codes that push the reciprocal temperature to
    /// zero or below.
    pub fn celsius(&self, raw: i32) -> Result<f64, ConversionError> {
        if raw <= 0 {
            return Err(ConversionError::Domain { raw });
        }
        let ratio = f64::from(raw) / self.reference_code;
        let inv_t = ratio.ln() / self.beta + 1.0 / self.reference_kelvin;
        if inv_t <= 0.0 {
            return Err(ConversionError::Domain { raw });
        }
        let celsius = 1.0 / inv_t - KELVIN_OFFSET;
        if !celsius.is_finite() {
            return Err(ConversionError::Domain { raw });
        }
        Ok(celsius)
    }

    /// Model inverse: the (fractional) raw code the sensor would report at
    /// `celsius`. Used for calibration checks and test fixtures.
    pub fn raw_for_celsius(&self, celsius: f64) -> f64 {
        let inv_t = 1.0 / (celsius + KELVIN_OFFSET);
        self.reference_code * (self.beta * (inv_t - 1.0 / self.reference_kelvin)).exp()
    }
}

impl Default for ThermistorModel {
    fn default() -> Self {
        Self::NOMINAL
    }
}
