//! Integration tests: TelemetryService against mock adapters.
//!
//! Time is driven explicitly; each test picks the uptime of every
//! iteration.

use crate::mock_hw::{ManualClock, MockAdc, MockTransport, RecordingSink, TransportCall};

use sensorfeed::app::context::DeviceContext;
use sensorfeed::app::events::AppEvent;
use sensorfeed::app::service::{ChannelOutcome, Iteration, LoopState, TelemetryService};
use sensorfeed::config::TelemetryConfig;
use sensorfeed::error::{ConversionError, SensorError, TransportError};
use sensorfeed::payload::Feed;

fn service() -> TelemetryService {
    TelemetryService::new(DeviceContext::from_config(&TelemetryConfig::default()))
}

/// Thermistor at the 25 °C reference code, photoresistor mid-scale.
fn adc() -> MockAdc {
    MockAdc::new(10_000, 32_768)
}

// ── Scenario A: healthy transport, 5.1 s per iteration ───────

#[test]
fn scenario_a_one_pair_per_iteration() {
    let mut svc = service();
    let mut hw = adc();
    let mut tx = MockTransport::connected();
    let mut sink = RecordingSink::new();

    for i in 1..=4u64 {
        let it = svc.iterate(i * 5_100, &mut hw, &mut tx, &mut sink).unwrap();
        assert!(matches!(it, Iteration::Published(_)), "iteration {i}: {it:?}");
    }

    let published = tx.published();
    assert_eq!(published.len(), 8);
    for pair in published.chunks(2) {
        assert_eq!(pair[0], ("thermistor".to_string(), "25.00".to_string()));
        assert_eq!(pair[1], ("photoresistor".to_string(), "32768".to_string()));
    }
    assert_eq!(svc.batches(), 4);
    assert_eq!(tx.reconnect_count(), 0);
}

#[test]
fn scenario_a_samples_thermistor_first() {
    let mut svc = service();
    let mut hw = adc();
    let mut tx = MockTransport::connected();
    let mut sink = RecordingSink::new();

    svc.iterate(5_100, &mut hw, &mut tx, &mut sink).unwrap();
    assert_eq!(hw.sampled, vec![Feed::Thermistor, Feed::Photoresistor]);
}

// ── Scenario B: poll() fails on iteration 3 ──────────────────

#[test]
fn scenario_b_fault_reconnects_once_and_skips_publish() {
    let mut svc = service();
    let mut hw = adc();
    let mut tx = MockTransport::connected();
    tx.fail_poll(3, TransportError::TransientIo("socket reset"));
    let mut sink = RecordingSink::new();

    let mut results = Vec::new();
    for i in 1..=5u64 {
        results.push(svc.iterate(i * 5_100, &mut hw, &mut tx, &mut sink).unwrap());
    }

    assert!(matches!(results[0], Iteration::Published(_)));
    assert!(matches!(results[1], Iteration::Published(_)));
    assert_eq!(
        results[2],
        Iteration::Recovered {
            fault: TransportError::TransientIo("socket reset"),
            reconnected: true,
        }
    );
    assert!(matches!(results[3], Iteration::Published(_)));
    assert!(matches!(results[4], Iteration::Published(_)));

    assert_eq!(tx.reconnect_count(), 1);
    // Iterations 1, 2, 4, 5 published; 3 did not.
    assert_eq!(tx.published().len(), 8);
    assert_eq!(svc.faults(), 1);
    assert_eq!(svc.state(), LoopState::Polling);
}

#[test]
fn scenario_b_no_sampling_on_faulted_iteration() {
    let mut svc = service();
    let mut hw = adc();
    let mut tx = MockTransport::connected();
    tx.fail_poll(1, TransportError::Protocol("bad packet"));
    let mut sink = RecordingSink::new();

    svc.iterate(5_100, &mut hw, &mut tx, &mut sink).unwrap();
    assert!(hw.sampled.is_empty());
    assert_eq!(
        tx.calls,
        vec![TransportCall::Poll, TransportCall::Reconnect]
    );
    assert_eq!(sink.disconnects, 1);
    assert_eq!(sink.connects, 1);
}

#[test]
fn scenario_b_elapsed_measured_from_last_batch() {
    let mut svc = service();
    let mut hw = adc();
    let mut tx = MockTransport::connected();
    tx.fail_poll(3, TransportError::TransientIo("socket reset"));
    let mut sink = RecordingSink::new();

    for i in 1..=4u64 {
        svc.iterate(i * 5_100, &mut hw, &mut tx, &mut sink).unwrap();
    }
    // The faulted iteration did not touch the stamp; iteration 4 did.
    assert_eq!(svc.context().cadence.last_publish_ms(), 20_400);
    // Not due again until strictly more than 5 s after iteration 4.
    let it = svc.iterate(25_400, &mut hw, &mut tx, &mut sink).unwrap();
    assert_eq!(it, Iteration::Idle);
}

// ── Scenario C: 2 s steps below the 5 s cadence ──────────────

#[test]
fn scenario_c_publishes_only_after_threshold() {
    let mut svc = service();
    let mut hw = adc();
    let mut tx = MockTransport::connected();
    let mut sink = RecordingSink::new();

    for now in [0, 2_000, 4_000] {
        let it = svc.iterate(now, &mut hw, &mut tx, &mut sink).unwrap();
        assert_eq!(it, Iteration::Idle, "at {now} ms");
    }
    assert!(tx.published().is_empty());
    assert!(hw.sampled.is_empty());

    let it = svc.iterate(10_000, &mut hw, &mut tx, &mut sink).unwrap();
    assert!(matches!(it, Iteration::Published(_)));
    assert_eq!(tx.published().len(), 2);
}

#[test]
fn exact_interval_is_not_due() {
    let mut svc = service();
    let mut hw = adc();
    let mut tx = MockTransport::connected();
    let mut sink = RecordingSink::new();

    assert_eq!(
        svc.iterate(5_000, &mut hw, &mut tx, &mut sink).unwrap(),
        Iteration::Idle
    );
    assert!(matches!(
        svc.iterate(5_001, &mut hw, &mut tx, &mut sink).unwrap(),
        Iteration::Published(_)
    ));
}

// ── Error escalation ──────────────────────────────────────────

#[test]
fn zero_thermistor_code_drops_only_that_feed() {
    let mut svc = service();
    let mut hw = MockAdc::new(0, 500);
    let mut tx = MockTransport::connected();
    let mut sink = RecordingSink::new();

    let it = svc.iterate(5_100, &mut hw, &mut tx, &mut sink).unwrap();
    let Iteration::Published(report) = it else {
        panic!("expected a batch, got {it:?}");
    };
    assert_eq!(
        report.thermistor,
        ChannelOutcome::Dropped(ConversionError::Domain { raw: 0 })
    );
    assert_eq!(report.photoresistor, ChannelOutcome::Sent);
    assert_eq!(
        tx.published(),
        vec![("photoresistor".to_string(), "500".to_string())]
    );
    // The batch completed, so the cadence restarts.
    assert_eq!(svc.context().cadence.last_publish_ms(), 5_100);
    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::SampleDropped { feed: Feed::Thermistor, .. })),
        1
    );
}

#[test]
fn hardware_fault_stops_run() {
    let mut svc = service();
    let mut hw = adc();
    // Samples 1-2 are the first batch; sample 3 (next thermistor) fails.
    hw.fail_from_sample(3);
    let mut tx = MockTransport::connected();
    let mut sink = RecordingSink::new();
    let clock = ManualClock::at(0);

    let Err(fault) = svc.run(&clock, &mut hw, &mut tx, &mut sink, || clock.advance(1_000));
    assert!(matches!(
        fault,
        SensorError::HardwareFault { adc_channel: 8, code: -1 }
    ));
    assert_eq!(svc.batches(), 1);
    assert_eq!(tx.published().len(), 2);
}

#[test]
fn failed_reconnect_is_retried_next_iteration() {
    let mut svc = service();
    let mut hw = adc();
    let mut tx = MockTransport::connected();
    tx.fail_poll(1, TransportError::TransientIo("socket reset"));
    tx.fail_reconnect(1);
    let mut sink = RecordingSink::new();

    let first = svc.iterate(1_000, &mut hw, &mut tx, &mut sink).unwrap();
    assert!(matches!(first, Iteration::Recovered { reconnected: false, .. }));
    assert_eq!(svc.state(), LoopState::Faulted);

    // poll() still has no session, so the loop reconnects again.
    let second = svc.iterate(2_000, &mut hw, &mut tx, &mut sink).unwrap();
    assert!(matches!(second, Iteration::Recovered { reconnected: true, .. }));
    assert_eq!(svc.state(), LoopState::Polling);

    let third = svc.iterate(6_000, &mut hw, &mut tx, &mut sink).unwrap();
    assert!(matches!(third, Iteration::Published(_)));
    assert_eq!(tx.reconnect_count(), 2);
    assert_eq!(svc.faults(), 2);
    assert_eq!(sink.count(|e| matches!(e, AppEvent::ReconnectFailed(_))), 1);
}

#[test]
fn initial_connect_failure_is_recovered_by_loop() {
    let mut svc = service();
    let mut hw = adc();
    let mut tx = MockTransport::new();
    tx.fail_connect();
    let mut sink = RecordingSink::new();

    svc.start(&mut tx, &mut sink);
    assert_eq!(svc.state(), LoopState::Faulted);
    assert!(matches!(sink.events[0], AppEvent::Started { .. }));

    let it = svc.iterate(100, &mut hw, &mut tx, &mut sink).unwrap();
    assert!(matches!(it, Iteration::Recovered { reconnected: true, .. }));
    assert_eq!(sink.connects, 1);

    let it = svc.iterate(5_100, &mut hw, &mut tx, &mut sink).unwrap();
    assert!(matches!(it, Iteration::Published(_)));
}

#[test]
fn start_runs_connect_hooks() {
    let mut svc = service();
    let mut tx = MockTransport::new();
    let mut sink = RecordingSink::new();

    svc.start(&mut tx, &mut sink);
    assert_eq!(svc.state(), LoopState::Polling);
    assert_eq!(sink.connects, 1);
    assert_eq!(sink.subscribes.len(), 1);
    assert_eq!(tx.calls, vec![TransportCall::Connect]);
}
