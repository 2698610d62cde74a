//! Network abstraction traits for MQTT.
//!
//! The door controller itself never talks to the network. The services
//! layer bridges controller events and remote commands onto a broker
//! through the [`MqttClient`] trait, so the same bridge runs on the
//! ESP32 (ESP-IDF client) and on the desktop (rumqttc).
//!
//! ```text
//! garage/state        - Current door state (retained)
//! garage/state/set    - Request a state: open, close, stop
//! garage/config/set   - Config update string: rdt=500|mtt=6000
//! garage/status       - Status string, refreshed every scan
//! garage/alert/+      - timeout / night alerts
//! ```

extern crate alloc;
use alloc::string::String;
use alloc::vec::Vec;

// ============================================================================
// MQTT Client Trait (Sync-First Design)
// ============================================================================

/// MQTT client trait for pub/sub messaging.
///
/// This trait uses a **sync-first design** that works on both ESP32
/// (blocking I/O) and desktop.
///
/// # Implementation Notes
///
/// - `publish` and `subscribe` are synchronous (blocking on ESP32)
/// - `try_recv` is non-blocking for polling patterns
/// - The client should handle reconnection internally
pub trait MqttClient {
    /// Error type for MQTT operations.
    type Error: core::fmt::Debug;

    /// Publish a message to a topic (blocking).
    fn publish(&mut self, topic: &str, payload: &[u8], retain: bool) -> Result<(), Self::Error>;

    /// Subscribe to a topic (blocking).
    fn subscribe(&mut self, topic: &str) -> Result<(), Self::Error>;

    /// Try to receive the next message (non-blocking).
    ///
    /// Returns `None` if no message is available. This should never block.
    fn try_recv(&mut self) -> Option<MqttMessage>;

    /// Check if connected to broker.
    fn is_connected(&self) -> bool;
}

/// An MQTT message received from a subscription.
#[derive(Clone, Debug)]
pub struct MqttMessage {
    /// Topic the message was published to.
    pub topic: String,
    /// Message payload as raw bytes.
    pub payload: Vec<u8>,
}

impl MqttMessage {
    /// Create a new MQTT message.
    pub fn new(topic: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
        }
    }

    /// Returns the payload as a UTF-8 string, if valid.
    pub fn payload_str(&self) -> Option<&str> {
        core::str::from_utf8(&self.payload).ok()
    }
}
