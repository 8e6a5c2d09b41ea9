//! Integration tests: the real adapters in their host simulation mode.
//!
//! HardwareAdapter (simulated ADC1) + MqttTransport over a simulated
//! WifiLink, driven by TelemetryService.

use std::time::Duration;

use crate::mock_hw::RecordingSink;

use sensorfeed::adapters::device_id;
use sensorfeed::adapters::hardware::HardwareAdapter;
use sensorfeed::adapters::mqtt::{MqttSettings, MqttTransport, SessionEvent};
use sensorfeed::adapters::wifi::WifiLink;
use sensorfeed::app::context::DeviceContext;
use sensorfeed::app::ports::{ConnectionState, TelemetryTransport};
use sensorfeed::app::service::{Iteration, TelemetryService};
use sensorfeed::config::{TelemetryConfig, UserString};
use sensorfeed::pins;
use sensorfeed::sensors::analog::AdcReader;

fn config() -> TelemetryConfig {
    TelemetryConfig {
        username: UserString::try_from("maker").unwrap(),
        connect_timeout_ms: 500,
        ..Default::default()
    }
}

fn stack() -> (TelemetryService, HardwareAdapter, MqttTransport) {
    let cfg = config();
    let client_id = device_id::client_id(&device_id::read_mac());
    let mut settings = MqttSettings::from_config(&cfg, client_id);
    settings.connect_timeout = Duration::from_millis(100);
    let transport = MqttTransport::new(settings, WifiLink::new("Lab", "").unwrap());
    let hw = HardwareAdapter::new(AdcReader::new());
    (
        TelemetryService::new(DeviceContext::from_config(&cfg)),
        hw,
        transport,
    )
}

#[test]
fn publishes_to_adafruit_feed_topics() {
    let (mut svc, mut hw, mut tx) = stack();
    hw.adc_mut().sim_set(pins::PHOTORESISTOR_ADC_CHANNEL, 0xFFFF);
    let mut sink = RecordingSink::new();

    svc.start(&mut tx, &mut sink);
    assert_eq!(tx.state(), ConnectionState::Connected);
    assert_eq!(sink.connects, 1);

    let it = svc.iterate(5_100, &mut hw, &mut tx, &mut sink).unwrap();
    assert!(matches!(it, Iteration::Published(_)));

    let published = tx.sim_published();
    assert_eq!(published.len(), 2);
    assert_eq!(published[0].0, "maker/feeds/thermistor");
    assert_eq!(published[1], ("maker/feeds/photoresistor".to_string(), "65535".to_string()));
}

#[test]
fn broker_disconnect_triggers_reconnect() {
    let (mut svc, mut hw, mut tx) = stack();
    let mut sink = RecordingSink::new();
    svc.start(&mut tx, &mut sink);

    assert!(tx.sim_inject(SessionEvent::Disconnected));
    let it = svc.iterate(5_100, &mut hw, &mut tx, &mut sink).unwrap();
    assert!(matches!(it, Iteration::Recovered { reconnected: true, .. }));
    assert!(tx.sim_published().is_empty());
    assert_eq!(sink.disconnects, 1);
    assert_eq!(sink.connects, 2);
    // reconnect() reset the Wi-Fi link.
    assert_eq!(tx.link().sim_associations(), 2);

    let it = svc.iterate(10_200, &mut hw, &mut tx, &mut sink).unwrap();
    assert!(matches!(it, Iteration::Published(_)));
}

#[test]
fn wifi_outage_is_retried_until_ap_returns() {
    let (mut svc, mut hw, mut tx) = stack();
    let mut sink = RecordingSink::new();
    svc.start(&mut tx, &mut sink);

    tx.link_mut().sim_drop();
    tx.link_mut().sim_fail_next(2);

    for now in [1_000, 2_000] {
        let it = svc.iterate(now, &mut hw, &mut tx, &mut sink).unwrap();
        assert!(matches!(it, Iteration::Recovered { reconnected: false, .. }));
    }
    let it = svc.iterate(3_000, &mut hw, &mut tx, &mut sink).unwrap();
    assert!(matches!(it, Iteration::Recovered { reconnected: true, .. }));
    assert_eq!(svc.faults(), 3);

    let it = svc.iterate(5_100, &mut hw, &mut tx, &mut sink).unwrap();
    assert!(matches!(it, Iteration::Published(_)));
}

#[test]
fn adc_fault_surfaces_through_stack() {
    let (mut svc, mut hw, mut tx) = stack();
    hw.adc_mut().sim_fail(pins::THERMISTOR_ADC_CHANNEL, true);
    let mut sink = RecordingSink::new();
    svc.start(&mut tx, &mut sink);

    assert!(svc.iterate(5_100, &mut hw, &mut tx, &mut sink).is_err());
    assert!(tx.sim_published().is_empty());
}
