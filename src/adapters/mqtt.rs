//! MQTT telemetry transport.
//!
//! Implements [`TelemetryTransport`] on top of a [`WifiLink`] and an MQTT
//! session. Readings go to Adafruit IO style topics,
//! `{username}/feeds/{channel}`, at QoS 0.
//!
//! ## Threading
//!
//! On ESP-IDF the MQTT client runs its own task. Its callback does nothing
//! but push a [`SessionEvent`] into a bounded `embassy-sync` channel; the
//! main loop drains that channel in [`poll`](TelemetryTransport::poll) and
//! is the only place [`ConnectionState`] changes. On host builds the same
//! channel is fed by [`MqttTransport::sim_inject`].

use core::fmt::Write;
use std::time::{Duration, Instant};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::{debug, info, warn};

use crate::app::ports::{ConnectionState, SubscribeAck, TelemetryTransport, TransportHooks};
use crate::config::{HostString, SecretString, TelemetryConfig, UserString};
use crate::error::TransportError;

use super::device_id::ClientIdString;
use super::utils::is_printable_ascii;
use super::wifi::WifiLink;

#[cfg(target_os = "espidf")]
use esp_idf_svc::mqtt::client::{EspMqttClient, EventPayload, MqttClientConfiguration, QoS};

/// Capacity of the session event queue.
pub const SESSION_QUEUE_DEPTH: usize = 8;

/// `{username}/feeds/{channel}` with a 32-byte username.
pub type TopicString = heapless::String<96>;

type SessionQueue = Channel<CriticalSectionRawMutex, SessionEvent, SESSION_QUEUE_DEPTH>;

/// Session events raised by the MQTT stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    Connected,
    Disconnected,
    Subscribed { message_id: u32 },
    Error,
}

#[cfg(target_os = "espidf")]
static SESSION_EVENTS: SessionQueue = Channel::new();

const SESSION_POLL_STEP: Duration = Duration::from_millis(50);

/// Push `event` onto the session queue. A full queue drops the event.
fn enqueue(queue: &SessionQueue, event: SessionEvent) -> Result<(), TransportError> {
    queue.try_send(event).map_err(|_| {
        warn!("MQTT event queue full, dropped {:?}", event);
        TransportError::TransientIo("session event queue full")
    })
}

/// Non-empty printable ASCII with no level separator, wildcard or space.
pub fn is_topic_segment(s: &str) -> bool {
    !s.is_empty() && is_printable_ascii(s) && !s.contains(['/', '+', '#', ' '])
}

/// Build the feed topic for `channel`.
pub fn feed_topic(username: &str, channel: &str) -> Result<TopicString, TransportError> {
    if !is_topic_segment(username) {
        return Err(TransportError::Protocol("username is not a valid topic segment"));
    }
    if !is_topic_segment(channel) {
        return Err(TransportError::Protocol("feed name is not a valid topic segment"));
    }
    let mut topic = TopicString::new();
    write!(topic, "{}/feeds/{}", username, channel)
        .map_err(|_| TransportError::Protocol("topic too long"))?;
    Ok(topic)
}

/// Broker session parameters.
#[derive(Clone)]
pub struct MqttSettings {
    pub broker_host: HostString,
    pub broker_port: u16,
    pub username: UserString,
    pub credential: SecretString,
    pub client_id: ClientIdString,
    pub connect_timeout: Duration,
}

impl MqttSettings {
    pub fn from_config(config: &TelemetryConfig, client_id: ClientIdString) -> Self {
        Self {
            broker_host: config.broker_host.clone(),
            broker_port: config.broker_port,
            username: config.username.clone(),
            credential: config.credential.clone(),
            client_id,
            connect_timeout: Duration::from_millis(u64::from(config.connect_timeout_ms)),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// MqttTransport
// ───────────────────────────────────────────────────────────────

pub struct MqttTransport {
    settings: MqttSettings,
    link: WifiLink,
    state: ConnectionState,
    #[cfg(target_os = "espidf")]
    client: Option<EspMqttClient<'static>>,
    #[cfg(not(target_os = "espidf"))]
    events: SessionQueue,
    #[cfg(not(target_os = "espidf"))]
    sim_refusals_left: u32,
    #[cfg(not(target_os = "espidf"))]
    sim_silent: bool,
    #[cfg(not(target_os = "espidf"))]
    sim_published: Vec<(String, String)>,
}

impl MqttTransport {
    pub fn new(settings: MqttSettings, link: WifiLink) -> Self {
        Self {
            settings,
            link,
            state: ConnectionState::Disconnected,
            #[cfg(target_os = "espidf")]
            client: None,
            #[cfg(not(target_os = "espidf"))]
            events: Channel::new(),
            #[cfg(not(target_os = "espidf"))]
            sim_refusals_left: 0,
            #[cfg(not(target_os = "espidf"))]
            sim_silent: false,
            #[cfg(not(target_os = "espidf"))]
            sim_published: Vec::new(),
        }
    }

    pub fn link(&self) -> &WifiLink {
        &self.link
    }

    pub fn link_mut(&mut self) -> &mut WifiLink {
        &mut self.link
    }

    // ── Session handling (both targets) ───────────────────────

    /// Apply one session event to the connection state.
    fn apply(
        &mut self,
        event: SessionEvent,
        hooks: &mut impl TransportHooks,
    ) -> Result<(), TransportError> {
        debug!("MQTT event: {:?}", event);
        match event {
            SessionEvent::Connected => {
                self.state = ConnectionState::Connected;
                hooks.on_connect();
            }
            SessionEvent::Disconnected => {
                self.state = ConnectionState::Disconnected;
                hooks.on_disconnect();
            }
            SessionEvent::Subscribed { message_id } => {
                hooks.on_subscribe(&SubscribeAck { message_id });
            }
            SessionEvent::Error => {
                self.state = ConnectionState::Disconnected;
                return Err(TransportError::Protocol("MQTT stack reported an error"));
            }
        }
        Ok(())
    }

    fn drain(&mut self, hooks: &mut impl TransportHooks) -> Result<(), TransportError> {
        while let Ok(event) = self.events().try_receive() {
            self.apply(event, hooks)?;
        }
        Ok(())
    }

    fn discard_stale_events(&self) {
        while self.events().try_receive().is_ok() {}
    }

    /// Wait for CONNACK, bounded by the configured timeout.
    fn await_session(&mut self, hooks: &mut impl TransportHooks) -> Result<(), TransportError> {
        let deadline = Instant::now() + self.settings.connect_timeout;
        loop {
            self.drain(hooks)?;
            if self.state == ConnectionState::Connected {
                return Ok(());
            }
            if Instant::now() >= deadline {
                self.close_session();
                self.state = ConnectionState::Disconnected;
                return Err(TransportError::Connection("timed out waiting for CONNACK"));
            }
            std::thread::sleep(SESSION_POLL_STEP);
        }
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn events(&self) -> &SessionQueue {
        &SESSION_EVENTS
    }

    #[cfg(not(target_os = "espidf"))]
    fn events(&self) -> &SessionQueue {
        &self.events
    }

    #[cfg(target_os = "espidf")]
    fn open_session(&mut self) -> Result<(), TransportError> {
        let s = &self.settings;
        let url = format!("mqtt://{}:{}", s.broker_host, s.broker_port);
        let conf = MqttClientConfiguration {
            client_id: Some(s.client_id.as_str()),
            username: (!s.username.is_empty()).then_some(s.username.as_str()),
            password: (!s.credential.is_empty()).then_some(s.credential.as_str()),
            ..Default::default()
        };

        let client = EspMqttClient::new_cb(&url, &conf, |event| {
            let forwarded = match event.payload() {
                EventPayload::Connected(_) => SessionEvent::Connected,
                EventPayload::Disconnected => SessionEvent::Disconnected,
                EventPayload::Subscribed(id) => SessionEvent::Subscribed {
                    message_id: id as u32,
                },
                EventPayload::Error(_) => SessionEvent::Error,
                _ => return,
            };
            // Already logged; the main loop times out or polls again.
            let _ = enqueue(&SESSION_EVENTS, forwarded);
        })
        .map_err(|e| {
            warn!("MQTT client init failed: {}", e);
            TransportError::Connection("MQTT client could not be created")
        })?;

        self.client = Some(client);
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn open_session(&mut self) -> Result<(), TransportError> {
        if self.sim_refusals_left > 0 {
            self.sim_refusals_left -= 1;
            return Err(TransportError::Connection("broker refused the session"));
        }
        if !self.sim_silent {
            enqueue(&self.events, SessionEvent::Connected)?;
        }
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn close_session(&mut self) {
        // Dropping the client stops its task.
        self.client = None;
    }

    #[cfg(not(target_os = "espidf"))]
    fn close_session(&mut self) {}

    #[cfg(target_os = "espidf")]
    fn send(&mut self, topic: &str, payload: &str) -> Result<(), TransportError> {
        let client = self
            .client
            .as_mut()
            .ok_or(TransportError::TransientIo("no MQTT client"))?;
        client
            .publish(topic, QoS::AtMostOnce, false, payload.as_bytes())
            .map(|_| ())
            .map_err(|_| TransportError::TransientIo("publish not accepted by MQTT client"))
    }

    #[cfg(not(target_os = "espidf"))]
    fn send(&mut self, topic: &str, payload: &str) -> Result<(), TransportError> {
        self.sim_published.push((topic.into(), payload.into()));
        Ok(())
    }

    // ── Simulation controls ───────────────────────────────────

    /// Queue a session event as the MQTT task would.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_inject(&self, event: SessionEvent) -> bool {
        enqueue(&self.events, event).is_ok()
    }

    /// Refuse the next `count` session attempts.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_refuse_next(&mut self, count: u32) {
        self.sim_refusals_left = count;
    }

    /// Accept sessions but never send CONNACK.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_silent_broker(&mut self, silent: bool) {
        self.sim_silent = silent;
    }

    /// `(topic, payload)` pairs published so far.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_published(&self) -> &[(String, String)] {
        &self.sim_published
    }
}

impl TelemetryTransport for MqttTransport {
    fn connect(&mut self, hooks: &mut impl TransportHooks) -> Result<(), TransportError> {
        if !self.link.is_up() {
            self.link.connect()?;
        }
        info!(
            "Connecting to {}:{} as {}",
            self.settings.broker_host, self.settings.broker_port, self.settings.client_id
        );
        self.state = ConnectionState::Connecting;
        self.discard_stale_events();
        if let Err(e) = self.open_session() {
            self.state = ConnectionState::Disconnected;
            return Err(e);
        }
        self.await_session(hooks)
    }

    fn poll(&mut self, hooks: &mut impl TransportHooks) -> Result<(), TransportError> {
        self.drain(hooks)?;
        if !self.link.is_up() {
            self.state = ConnectionState::Disconnected;
            return Err(TransportError::TransientIo("wifi link down"));
        }
        if self.state != ConnectionState::Connected {
            return Err(TransportError::TransientIo("no live broker session"));
        }
        Ok(())
    }

    fn publish(&mut self, channel: &str, payload: &str) -> Result<(), TransportError> {
        if self.state != ConnectionState::Connected {
            return Err(TransportError::TransientIo("not connected"));
        }
        let topic = feed_topic(&self.settings.username, channel)?;
        info!("Publishing {} to {}", payload, topic);
        self.send(&topic, payload)
    }

    fn reconnect(&mut self, hooks: &mut impl TransportHooks) -> Result<(), TransportError> {
        if self.state == ConnectionState::Connected {
            return Ok(());
        }
        info!("Reconnecting");
        self.close_session();
        self.link.reset()?;
        self.connect(hooks)
    }

    fn state(&self) -> ConnectionState {
        self.state
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
