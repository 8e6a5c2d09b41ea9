//! WiFi station-mode link.
//!
//! Owned by the MQTT adapter, which brings it up before opening a broker
//! session and resets it on reconnect.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `BlockingWifi<EspWifi>` from `esp_idf_svc::wifi`.
//! - **all other targets**: simulation with injectable association failures.

use core::fmt;
use log::{info, warn};

use crate::error::TransportError;

use super::utils::is_printable_ascii;

#[cfg(target_os = "espidf")]
use esp_idf_svc::{
    eventloop::EspSystemEventLoop,
    hal::modem::Modem,
    nvs::EspDefaultNvsPartition,
    wifi::{AuthMethod, BlockingWifi, ClientConfiguration, Configuration, EspWifi},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WifiError {
    InvalidSsid,
    InvalidPassword,
    /// The driver could not be created or configured (`esp_err_t`).
    Driver(i32),
}

impl fmt::Display for WifiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSsid => write!(f, "SSID invalid (must be 1-32 printable ASCII bytes)"),
            Self::InvalidPassword => write!(
                f,
                "password invalid (must be 8-64 bytes for WPA2, or empty for open)"
            ),
            Self::Driver(rc) => write!(f, "WiFi driver error (rc={})", rc),
        }
    }
}

impl core::error::Error for WifiError {}

// ───────────────────────────────────────────────────────────────
// Validation
// ───────────────────────────────────────────────────────────────

pub fn validate_ssid(ssid: &str) -> Result<(), WifiError> {
    if ssid.is_empty() || ssid.len() > 32 || !is_printable_ascii(ssid) {
        return Err(WifiError::InvalidSsid);
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), WifiError> {
    if password.is_empty() {
        return Ok(());
    }
    if password.len() < 8 || password.len() > 64 {
        return Err(WifiError::InvalidPassword);
    }
    Ok(())
}

// ───────────────────────────────────────────────────────────────
// WiFi link
// ───────────────────────────────────────────────────────────────

pub struct WifiLink {
    ssid: heapless::String<32>,
    #[cfg(target_os = "espidf")]
    wifi: BlockingWifi<EspWifi<'static>>,
    #[cfg(not(target_os = "espidf"))]
    sim_up: bool,
    #[cfg(not(target_os = "espidf"))]
    sim_failures_left: u32,
    #[cfg(not(target_os = "espidf"))]
    sim_associations: u32,
}

impl WifiLink {
    #[cfg(target_os = "espidf")]
    pub fn new(
        modem: Modem,
        sysloop: EspSystemEventLoop,
        nvs: EspDefaultNvsPartition,
        ssid: &str,
        password: &str,
    ) -> Result<Self, WifiError> {
        validate_ssid(ssid)?;
        validate_password(password)?;

        let esp_wifi =
            EspWifi::new(modem, sysloop.clone(), Some(nvs)).map_err(|e| WifiError::Driver(e.code()))?;
        let mut wifi =
            BlockingWifi::wrap(esp_wifi, sysloop).map_err(|e| WifiError::Driver(e.code()))?;

        let auth_method = if password.is_empty() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        };
        wifi.set_configuration(&Configuration::Client(ClientConfiguration {
            ssid: ssid.try_into().map_err(|_| WifiError::InvalidSsid)?,
            password: password.try_into().map_err(|_| WifiError::InvalidPassword)?,
            auth_method,
            ..Default::default()
        }))
        .map_err(|e| WifiError::Driver(e.code()))?;

        Ok(Self {
            ssid: ssid.try_into().map_err(|_| WifiError::InvalidSsid)?,
            wifi,
        })
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new(ssid: &str, password: &str) -> Result<Self, WifiError> {
        validate_ssid(ssid)?;
        validate_password(password)?;
        Ok(Self {
            ssid: ssid.try_into().map_err(|_| WifiError::InvalidSsid)?,
            sim_up: false,
            sim_failures_left: 0,
            sim_associations: 0,
        })
    }

    /// Associate and wait for an IP address.
    pub fn connect(&mut self) -> Result<(), TransportError> {
        info!("WiFi: connecting to '{}'", self.ssid);
        match self.platform_connect() {
            Ok(()) => {
                info!("WiFi: connected");
                Ok(())
            }
            Err(e) => {
                warn!("WiFi: connection failed: {}", e);
                Err(e)
            }
        }
    }

    /// Drop the association and bring it back up.
    pub fn reset(&mut self) -> Result<(), TransportError> {
        info!("WiFi: resetting link");
        self.platform_disconnect();
        self.connect()
    }

    pub fn is_up(&self) -> bool {
        self.platform_is_up()
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_connect(&mut self) -> Result<(), TransportError> {
        if !self.wifi.is_started().unwrap_or(false) {
            self.wifi
                .start()
                .map_err(|_| TransportError::Connection("wifi start failed"))?;
        }
        self.wifi
            .connect()
            .map_err(|_| TransportError::Connection("wifi association failed"))?;
        self.wifi
            .wait_netif_up()
            .map_err(|_| TransportError::Connection("no IP address from AP"))
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_connect(&mut self) -> Result<(), TransportError> {
        self.sim_associations += 1;
        if self.sim_failures_left > 0 {
            self.sim_failures_left -= 1;
            self.sim_up = false;
            return Err(TransportError::Connection("wifi association failed"));
        }
        self.sim_up = true;
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_disconnect(&mut self) {
        let _ = self.wifi.disconnect();
        let _ = self.wifi.stop();
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_disconnect(&mut self) {
        self.sim_up = false;
    }

    #[cfg(target_os = "espidf")]
    fn platform_is_up(&self) -> bool {
        self.wifi.is_connected().unwrap_or(false)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_is_up(&self) -> bool {
        self.sim_up
    }

    // ── Simulation controls ───────────────────────────────────

    /// Fail the next `count` association attempts.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_fail_next(&mut self, count: u32) {
        self.sim_failures_left = count;
    }

    /// Drop the link as if the AP went away.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_drop(&mut self) {
        self.sim_up = false;
    }

    /// Association attempts so far.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_associations(&self) -> u32 {
        self.sim_associations
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
