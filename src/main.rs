//! sensorfeed firmware — main entry point.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter   LogEventSink     NvsAdapter   Esp32Time     │
//! │  (AnalogPort)      (EventSink+Hooks)(ConfigPort) (TimePort)    │
//! │  MqttTransport ── WifiLink                                     │
//! │  (TelemetryTransport)                                          │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │     TelemetryService (publish)  ·  Monitor (bench)     │    │
//! │  │     cadence · convert · reconnect                      │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::thread;
use std::time::Duration;

use anyhow::Result;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::prelude::Peripherals;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use log::{error, info, warn};

use sensorfeed::adapters::device_id;
use sensorfeed::adapters::hardware::HardwareAdapter;
use sensorfeed::adapters::log_sink::LogEventSink;
use sensorfeed::adapters::mqtt::{MqttSettings, MqttTransport};
use sensorfeed::adapters::nvs::NvsAdapter;
use sensorfeed::adapters::time::Esp32TimeAdapter;
use sensorfeed::adapters::wifi::WifiLink;
use sensorfeed::app::context::DeviceContext;
use sensorfeed::app::monitor::Monitor;
use sensorfeed::app::service::TelemetryService;
use sensorfeed::config::{EMBEDDED_CONFIG_JSON, RunMode, TelemetryConfig};
use sensorfeed::drivers::{hw_init, watchdog::Watchdog};
use sensorfeed::error::SensorError;
use sensorfeed::sensors::analog::AdcReader;

/// Floor for the task watchdog; a reconnect (Wi-Fi + CONNACK) runs inside
/// one loop iteration.
const WATCHDOG_MIN_MS: u32 = 30_000;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  sensorfeed v{}                   ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Peripherals ────────────────────────────────────────
    hw_init::init_peripherals()?;

    // ── 3. Config from NVS (first boot: embedded JSON, else defaults)
    let nvs = NvsAdapter::new()?;
    let config = match nvs.load_or_provision(EMBEDDED_CONFIG_JSON) {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!("Config load failed ({}), using defaults", e);
            TelemetryConfig::default()
        }
    };
    info!("{:?}", config);

    // ── 4. Context + adapters ─────────────────────────────────
    let ctx = DeviceContext::from_config(&config);
    let mut hw = HardwareAdapter::new(AdcReader::new());
    let mut sink = LogEventSink::new();
    let watchdog = Watchdog::new(
        config
            .connect_timeout_ms
            .saturating_mul(3)
            .max(WATCHDOG_MIN_MS),
    );

    // ── 5. Run until the ADC fails ────────────────────────────
    let fault = match config.run_mode {
        RunMode::Monitor => {
            let monitor = Monitor::new(&ctx, config.thermistor_readout, config.photoresistor_readout);
            let interval = Duration::from_millis(u64::from(config.monitor_interval_ms));
            let Err(fault) = monitor.run(&mut hw, &mut sink, || {
                watchdog.feed();
                thread::sleep(interval);
            });
            fault
        }
        RunMode::Publish => run_publisher(&config, ctx, &mut hw, &mut sink, &watchdog)?,
    };

    error!("Main loop stopped: {}", fault);
    Err(fault.into())
}

fn run_publisher(
    config: &TelemetryConfig,
    ctx: DeviceContext,
    hw: &mut HardwareAdapter,
    sink: &mut LogEventSink,
    watchdog: &Watchdog,
) -> Result<SensorError> {
    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs_partition = EspDefaultNvsPartition::take()?;

    let link = WifiLink::new(
        peripherals.modem,
        sysloop,
        nvs_partition,
        &config.wifi_ssid,
        &config.wifi_password,
    )?;
    let client_id = device_id::client_id(&device_id::read_mac());
    let mut transport = MqttTransport::new(MqttSettings::from_config(config, client_id), link);

    let clock = Esp32TimeAdapter::new();
    let mut service = TelemetryService::new(ctx);
    service.start(&mut transport, sink);

    let pace = Duration::from_millis(u64::from(config.poll_interval_ms));
    let Err(fault) = service.run(&clock, hw, &mut transport, sink, || {
        watchdog.feed();
        thread::sleep(pace);
    });
    Ok(fault)
}
