//! Mock adapters for integration tests.
//!
//! Every port call is recorded so tests can assert on the full history
//! (sample order, publish order, reconnect count) without touching the ADC
//! or a broker.

use std::cell::Cell;
use std::collections::{HashMap, HashSet};

use sensorfeed::app::events::AppEvent;
use sensorfeed::app::ports::{
    AnalogPort, ConnectionState, EventSink, SubscribeAck, TelemetryTransport, TimePort,
    TransportHooks,
};
use sensorfeed::error::{SensorError, TransportError};
use sensorfeed::payload::Feed;
use sensorfeed::sensors::{RawSample, SensorChannel};

// ── MockAdc ───────────────────────────────────────────────────

pub struct MockAdc {
    codes: HashMap<Feed, u16>,
    /// Fail the Nth sample (1-based) and every one after it.
    fail_from: Option<usize>,
    pub sampled: Vec<Feed>,
}

#[allow(dead_code)]
impl MockAdc {
    pub fn new(thermistor: u16, photoresistor: u16) -> Self {
        Self {
            codes: HashMap::from([
                (Feed::Thermistor, thermistor),
                (Feed::Photoresistor, photoresistor),
            ]),
            fail_from: None,
            sampled: Vec::new(),
        }
    }

    pub fn set(&mut self, feed: Feed, code: u16) {
        self.codes.insert(feed, code);
    }

    pub fn fail_from_sample(&mut self, n: usize) {
        self.fail_from = Some(n);
    }
}

impl AnalogPort for MockAdc {
    fn sample(&mut self, channel: &SensorChannel) -> Result<RawSample, SensorError> {
        self.sampled.push(channel.feed);
        if self.fail_from.is_some_and(|n| self.sampled.len() >= n) {
            return Err(SensorError::HardwareFault {
                adc_channel: channel.adc_channel,
                code: -1,
            });
        }
        Ok(RawSample::new(self.codes[&channel.feed]))
    }
}

// ── MockTransport ─────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum TransportCall {
    Connect,
    Poll,
    Publish { channel: String, payload: String },
    Reconnect,
}

pub struct MockTransport {
    pub calls: Vec<TransportCall>,
    state: ConnectionState,
    polls: usize,
    reconnects: usize,
    /// 1-based poll numbers that fail.
    poll_failures: HashMap<usize, TransportError>,
    /// 1-based reconnect numbers that fail.
    reconnect_failures: HashSet<usize>,
    connect_fails: bool,
}

#[allow(dead_code)]
impl MockTransport {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            state: ConnectionState::Disconnected,
            polls: 0,
            reconnects: 0,
            poll_failures: HashMap::new(),
            reconnect_failures: HashSet::new(),
            connect_fails: false,
        }
    }

    /// A transport whose session is already up.
    pub fn connected() -> Self {
        let mut t = Self::new();
        t.state = ConnectionState::Connected;
        t
    }

    pub fn fail_poll(&mut self, nth: usize, error: TransportError) {
        self.poll_failures.insert(nth, error);
    }

    pub fn fail_reconnect(&mut self, nth: usize) {
        self.reconnect_failures.insert(nth);
    }

    pub fn fail_connect(&mut self) {
        self.connect_fails = true;
    }

    pub fn published(&self) -> Vec<(String, String)> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                TransportCall::Publish { channel, payload } => {
                    Some((channel.clone(), payload.clone()))
                }
                _ => None,
            })
            .collect()
    }

    pub fn reconnect_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| **c == TransportCall::Reconnect)
            .count()
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl TelemetryTransport for MockTransport {
    fn connect(&mut self, hooks: &mut impl TransportHooks) -> Result<(), TransportError> {
        self.calls.push(TransportCall::Connect);
        if self.connect_fails {
            self.state = ConnectionState::Disconnected;
            return Err(TransportError::Connection("broker unreachable"));
        }
        self.state = ConnectionState::Connected;
        hooks.on_connect();
        hooks.on_subscribe(&SubscribeAck { message_id: 1 });
        Ok(())
    }

    fn poll(&mut self, hooks: &mut impl TransportHooks) -> Result<(), TransportError> {
        self.calls.push(TransportCall::Poll);
        self.polls += 1;
        if let Some(e) = self.poll_failures.get(&self.polls) {
            if self.state == ConnectionState::Connected {
                hooks.on_disconnect();
            }
            self.state = ConnectionState::Disconnected;
            return Err(*e);
        }
        if self.state != ConnectionState::Connected {
            return Err(TransportError::TransientIo("no live broker session"));
        }
        Ok(())
    }

    fn publish(&mut self, channel: &str, payload: &str) -> Result<(), TransportError> {
        self.calls.push(TransportCall::Publish {
            channel: channel.to_string(),
            payload: payload.to_string(),
        });
        Ok(())
    }

    fn reconnect(&mut self, hooks: &mut impl TransportHooks) -> Result<(), TransportError> {
        self.calls.push(TransportCall::Reconnect);
        if self.state == ConnectionState::Connected {
            return Ok(());
        }
        self.reconnects += 1;
        if self.reconnect_failures.contains(&self.reconnects) {
            return Err(TransportError::Connection("AP not found"));
        }
        self.state = ConnectionState::Connected;
        hooks.on_connect();
        Ok(())
    }

    fn state(&self) -> ConnectionState {
        self.state
    }
}

// ── ManualClock ───────────────────────────────────────────────

#[derive(Default)]
pub struct ManualClock {
    now: Cell<u64>,
}

#[allow(dead_code)]
impl ManualClock {
    pub fn at(ms: u64) -> Self {
        Self { now: Cell::new(ms) }
    }

    pub fn set(&self, ms: u64) {
        self.now.set(ms);
    }

    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get() + ms);
    }
}

impl TimePort for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
    pub connects: u32,
    pub disconnects: u32,
    pub subscribes: Vec<SubscribeAck>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

impl TransportHooks for RecordingSink {
    fn on_connect(&mut self) {
        self.connects += 1;
    }

    fn on_disconnect(&mut self) {
        self.disconnects += 1;
    }

    fn on_subscribe(&mut self, ack: &SubscribeAck) {
        self.subscribes.push(*ack);
    }
}
