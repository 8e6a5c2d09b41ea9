//! Telemetry service — the sampling and publishing loop.
//!
//! [`TelemetryService`] owns the [`DeviceContext`] and drives one
//! iteration at a time: service the transport, and when the publish
//! cadence has expired, sample both channels, convert, and publish.
//! All I/O flows through port traits passed in at the call site, so the
//! whole loop runs against mock adapters in tests.
//!
//! ```text
//!  AnalogPort ──▶ ┌────────────────────────┐ ──▶ TelemetryTransport
//!                 │    TelemetryService     │
//!    TimePort ──▶ │ cadence · convert · FSM │ ──▶ EventSink
//!                 └────────────────────────┘
//! ```
//!
//! Loop states: steady `Polling`, with a transient excursion
//! `Polling → Faulted → Reconnecting → Polling` whenever `poll()` fails.
//! A failed reconnect leaves the loop `Faulted` until the next iteration
//! retries it.

use core::convert::Infallible;

use log::{debug, info, warn};

use crate::error::{ConversionError, SensorError, TransportError};
use crate::payload::{Feed, TelemetryValue};
use crate::sensors::{RawSample, SensorChannel};

use super::context::DeviceContext;
use super::events::AppEvent;
use super::ports::{AnalogPort, EventSink, TelemetryTransport, TimePort, TransportHooks};

// ───────────────────────────────────────────────────────────────
// Iteration results
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Polling,
    Faulted,
    Reconnecting,
}

/// What happened to one channel within a publish batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelOutcome {
    /// Handed to the transport.
    Sent,
    /// Conversion failed; nothing was published.
    Dropped(ConversionError),
    /// The transport rejected the publish.
    Failed(TransportError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchReport {
    pub at_ms: u64,
    pub thermistor: ChannelOutcome,
    pub photoresistor: ChannelOutcome,
}

/// Result of a single call to [`TelemetryService::iterate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Iteration {
    /// Transport healthy, cadence not yet due.
    Idle,
    /// A publish batch was attempted.
    Published(BatchReport),
    /// `poll()` failed and a reconnect was attempted; nothing was sampled.
    Recovered {
        fault: TransportError,
        reconnected: bool,
    },
}

// ───────────────────────────────────────────────────────────────
// TelemetryService
// ───────────────────────────────────────────────────────────────

pub struct TelemetryService {
    ctx: DeviceContext,
    state: LoopState,
    iterations: u64,
    batches: u64,
    faults: u64,
}

impl TelemetryService {
    pub fn new(ctx: DeviceContext) -> Self {
        Self {
            ctx,
            state: LoopState::Polling,
            iterations: 0,
            batches: 0,
            faults: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Announce the ADC configuration and open the first session.
    ///
    /// A failed initial connect is not fatal: the first iteration sees a
    /// failing `poll()` and takes the reconnect path.
    pub fn start(
        &mut self,
        transport: &mut impl TelemetryTransport,
        sink: &mut (impl EventSink + TransportHooks),
    ) {
        let channel = &self.ctx.thermistor;
        sink.emit(&AppEvent::Started {
            reference_voltage: channel.reference_voltage,
            full_scale: channel.full_scale.get(),
        });

        if let Err(e) = transport.connect(sink) {
            warn!("Initial connect failed: {}", e);
            sink.emit(&AppEvent::TransportFault(e));
            self.state = LoopState::Faulted;
        }
    }

    // ── Per-iteration orchestration ───────────────────────────

    /// Run one loop iteration at uptime `now_ms`.
    ///
    /// Only a [`SensorError`] escapes; transport and conversion failures
    /// are absorbed and reported in the returned [`Iteration`].
    pub fn iterate(
        &mut self,
        now_ms: u64,
        hw: &mut impl AnalogPort,
        transport: &mut impl TelemetryTransport,
        sink: &mut (impl EventSink + TransportHooks),
    ) -> Result<Iteration, SensorError> {
        self.iterations += 1;

        if let Err(fault) = transport.poll(sink) {
            return Ok(self.recover(fault, transport, sink));
        }
        if self.state != LoopState::Polling {
            debug!("Loop {:?} -> Polling", self.state);
            self.state = LoopState::Polling;
        }

        if !self.ctx.cadence.is_due(now_ms) {
            return Ok(Iteration::Idle);
        }

        // Thermistor first, then photoresistor. The cadence is marked only
        // once both have been attempted.
        let thermistor = self.ctx.thermistor;
        let photoresistor = self.ctx.photoresistor;
        let thermistor = self.publish_reading(&thermistor, hw, transport, sink)?;
        let photoresistor = self.publish_reading(&photoresistor, hw, transport, sink)?;

        self.ctx.cadence.mark(now_ms);
        self.batches += 1;

        Ok(Iteration::Published(BatchReport {
            at_ms: now_ms,
            thermistor,
            photoresistor,
        }))
    }

    /// Iterate forever, calling `pace` between iterations.
    ///
    /// Returns only when the ADC fails.
    pub fn run(
        &mut self,
        clock: &impl TimePort,
        hw: &mut impl AnalogPort,
        transport: &mut impl TelemetryTransport,
        sink: &mut (impl EventSink + TransportHooks),
        mut pace: impl FnMut(),
    ) -> Result<Infallible, SensorError> {
        info!(
            "Telemetry loop running (publish every {} ms)",
            self.ctx.cadence.interval_ms()
        );
        loop {
            self.iterate(clock.now_ms(), hw, transport, sink)?;
            pace();
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn context(&self) -> &DeviceContext {
        &self.ctx
    }

    /// Iterations run so far.
    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    /// Publish batches completed so far.
    pub fn batches(&self) -> u64 {
        self.batches
    }

    /// Transport faults observed so far.
    pub fn faults(&self) -> u64 {
        self.faults
    }

    // ── Internal ──────────────────────────────────────────────

    fn recover(
        &mut self,
        fault: TransportError,
        transport: &mut impl TelemetryTransport,
        sink: &mut (impl EventSink + TransportHooks),
    ) -> Iteration {
        self.faults += 1;
        self.state = LoopState::Faulted;
        sink.emit(&AppEvent::TransportFault(fault));

        self.state = LoopState::Reconnecting;
        let reconnected = match transport.reconnect(sink) {
            Ok(()) => {
                self.state = LoopState::Polling;
                sink.emit(&AppEvent::Reconnected);
                true
            }
            Err(e) => {
                self.state = LoopState::Faulted;
                sink.emit(&AppEvent::ReconnectFailed(e));
                false
            }
        };

        Iteration::Recovered { fault, reconnected }
    }

    fn publish_reading(
        &self,
        channel: &SensorChannel,
        hw: &mut impl AnalogPort,
        transport: &mut impl TelemetryTransport,
        sink: &mut impl EventSink,
    ) -> Result<ChannelOutcome, SensorError> {
        let feed = channel.feed;
        let raw = hw.sample(channel)?;

        let value = match self.value_for(feed, raw) {
            Ok(v) => v,
            Err(error) => {
                sink.emit(&AppEvent::SampleDropped { feed, error });
                return Ok(ChannelOutcome::Dropped(error));
            }
        };
        sink.emit(&AppEvent::Reading {
            feed,
            raw: raw.code(),
            value,
        });

        let payload = match value.encode() {
            Ok(p) => p,
            Err(error) => {
                sink.emit(&AppEvent::SampleDropped { feed, error });
                return Ok(ChannelOutcome::Dropped(error));
            }
        };

        match transport.publish(feed.name(), &payload) {
            Ok(()) => {
                sink.emit(&AppEvent::Published { feed, payload });
                Ok(ChannelOutcome::Sent)
            }
            Err(error) => {
                sink.emit(&AppEvent::PublishFailed { feed, error });
                Ok(ChannelOutcome::Failed(error))
            }
        }
    }

    fn value_for(&self, feed: Feed, raw: RawSample) -> Result<TelemetryValue, ConversionError> {
        match feed {
            Feed::Thermistor => self
                .ctx
                .thermistor_model
                .celsius(raw.as_i32())
                .map(TelemetryValue::Celsius),
            Feed::Photoresistor => Ok(TelemetryValue::RawCode(raw.code())),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
