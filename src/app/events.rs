//! Outbound application events.
//!
//! The [`TelemetryService`](super::service::TelemetryService) and the
//! [`Monitor`](super::monitor::Monitor) emit these through the
//! [`EventSink`](super::ports::EventSink) port. Adapters on the other side
//! decide what to do with them.

use crate::config::ReadoutMode;
use crate::error::{ConversionError, TransportError};
use crate::payload::{Feed, Payload, TelemetryValue};

/// Structured events emitted by the application core.
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// The service is up; carries the ADC front-end constants.
    Started {
        reference_voltage: f64,
        full_scale: u32,
    },

    /// A channel was sampled and converted.
    Reading {
        feed: Feed,
        raw: u16,
        value: TelemetryValue,
    },

    /// A payload was handed to the transport.
    Published { feed: Feed, payload: Payload },

    /// The transport rejected a publish; the batch continues.
    PublishFailed { feed: Feed, error: TransportError },

    /// A sample could not be converted; nothing is published for it.
    SampleDropped { feed: Feed, error: ConversionError },

    /// `poll()` failed; a reconnect follows.
    TransportFault(TransportError),

    /// `reconnect()` succeeded.
    Reconnected,

    /// `reconnect()` failed; retried on the next faulted iteration.
    ReconnectFailed(TransportError),

    /// Local monitor readout.
    Readout {
        feed: Feed,
        mode: ReadoutMode,
        raw: u16,
        value: f64,
    },
}
