//! Port traits — the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ TelemetryService (domain)
//! ```
//!
//! Driven adapters (ADC, MQTT transport, clock, event sinks, storage)
//! implement these traits. The [`TelemetryService`](super::service::TelemetryService)
//! consumes them via generics, so the domain core never touches hardware
//! or sockets directly.

use crate::config::TelemetryConfig;
use crate::error::{SensorError, TransportError};
use crate::sensors::{RawSample, SensorChannel};

// ───────────────────────────────────────────────────────────────
// Analog port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: the domain calls this to obtain raw ADC codes.
pub trait AnalogPort {
    /// Take one conversion on `channel`. Blocks for at most one ADC
    /// conversion cycle.
    fn sample(&mut self, channel: &SensorChannel) -> Result<RawSample, SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Telemetry transport port (driven adapter: domain → broker)
// ───────────────────────────────────────────────────────────────

/// Session lifecycle as seen by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// Broker acknowledgement of a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscribeAck {
    pub message_id: u32,
}

/// Connection-lifecycle hooks.
///
/// Invoked synchronously from inside [`TelemetryTransport::connect`],
/// [`poll`](TelemetryTransport::poll) and
/// [`reconnect`](TelemetryTransport::reconnect). Observability only: hooks
/// cannot fail and must not call back into the transport.
pub trait TransportHooks {
    fn on_connect(&mut self) {}
    fn on_disconnect(&mut self) {}
    fn on_subscribe(&mut self, _ack: &SubscribeAck) {}
}

/// Network + MQTT session, as one collaborator.
pub trait TelemetryTransport {
    /// Bring up the network and open a broker session.
    fn connect(&mut self, hooks: &mut impl TransportHooks) -> Result<(), TransportError>;

    /// One non-blocking pass over inbound session traffic. Fails with
    /// [`TransportError::Protocol`] or [`TransportError::TransientIo`] when
    /// the session is not usable.
    fn poll(&mut self, hooks: &mut impl TransportHooks) -> Result<(), TransportError>;

    /// Fire-and-forget publish (at most once, no delivery confirmation).
    fn publish(&mut self, channel: &str, payload: &str) -> Result<(), TransportError>;

    /// Tear down and re-establish the session. No-op when already connected.
    fn reconnect(&mut self, hooks: &mut impl TransportHooks) -> Result<(), TransportError>;

    fn state(&self) -> ConnectionState;
}

// ───────────────────────────────────────────────────────────────
// Time port (driven adapter: system timer → domain)
// ───────────────────────────────────────────────────────────────

/// Monotonic clock.
pub trait TimePort {
    /// Milliseconds since boot.
    fn now_ms(&self) -> u64;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port. Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists system configuration.
///
/// Implementations MUST validate before persisting; invalid ranges are
/// rejected with [`ConfigError::ValidationFailed`], not clamped.
pub trait ConfigPort {
    /// Load configuration from persistent storage.
    /// Returns [`TelemetryConfig::default()`] if no stored config exists.
    fn load(&self) -> Result<TelemetryConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&self, config: &TelemetryConfig) -> Result<(), ConfigError>;
}

/// Errors from [`ConfigPort`] operations.
#[derive(Debug)]
pub enum ConfigError {
    /// Stored config failed integrity / deserialization check.
    Corrupted,
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl core::error::Error for ConfigError {}
