//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] and [`TransportHooks`] by writing status lines
//! to the ESP-IDF logger (UART / USB-CDC in production).

use log::{debug, error, info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::{EventSink, SubscribeAck, TransportHooks};
use crate::config::ReadoutMode;

/// Adapter that logs every [`AppEvent`] and session hook to the console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started {
                reference_voltage,
                full_scale,
            } => {
                info!(
                    "ADC reference voltage: {:.2} V, full scale: {}",
                    reference_voltage, full_scale
                );
            }
            AppEvent::Reading { feed, raw, value } => {
                debug!("{}: raw={} -> {}", feed, raw, value);
            }
            AppEvent::Published { feed, payload } => {
                info!("Published {} to {} feed", payload, feed);
            }
            AppEvent::PublishFailed { feed, error } => {
                warn!("Publish to {} feed failed: {}", feed, error);
            }
            AppEvent::SampleDropped { feed, error } => {
                warn!("Dropped {} sample: {}", feed, error);
            }
            AppEvent::TransportFault(e) => {
                error!("Failed to get data, retrying: {}", e);
            }
            AppEvent::Reconnected => {
                info!("Reconnected to broker");
            }
            AppEvent::ReconnectFailed(e) => {
                warn!("Reconnect failed, will retry: {}", e);
            }
            AppEvent::Readout {
                feed,
                mode,
                raw,
                value,
            } => match mode {
                ReadoutMode::Raw => info!("{}: {}", feed, raw),
                ReadoutMode::Voltage => info!("{}: {:.3} V", feed, value),
                ReadoutMode::Temperature => info!("{}: {:.2} \u{00b0}C", feed, value),
            },
        }
    }
}

impl TransportHooks for LogEventSink {
    fn on_connect(&mut self) {
        info!("Connected to broker");
    }

    fn on_disconnect(&mut self) {
        info!("Disconnected from broker");
    }

    fn on_subscribe(&mut self, ack: &SubscribeAck) {
        info!("Subscribed (msg id {})", ack.message_id);
    }
}
