//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter     | Implements          | Connects to                 |
//! |-------------|---------------------|-----------------------------|
//! | `hardware`  | AnalogPort          | ESP32-S3 ADC1 oneshot       |
//! | `log_sink`  | EventSink           | Serial log output           |
//! |             | TransportHooks      |                             |
//! | `mqtt`      | TelemetryTransport  | MQTT broker over `wifi`     |
//! | `nvs`       | ConfigPort          | NVS / in-memory store       |
//! | `time`      | TimePort            | ESP32 system timer          |
//! | `wifi`      | (used by `mqtt`)    | ESP-IDF WiFi STA            |

pub mod device_id;
pub mod hardware;
pub mod log_sink;
pub mod mqtt;
pub mod nvs;
pub mod time;
pub(super) mod utils;
pub mod wifi;
