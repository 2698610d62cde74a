//! MQTT bridge for unified polling across platforms.
//!
//! Provides a platform-agnostic bridge between the door controller and any
//! implementation of the `MqttClient` trait: commands come in on
//! `<prefix>/state/set` and `<prefix>/config/set`, controller events go
//! out on their own topics.
//!
//! | Event | Topic | Payload | Retained |
//! |-------|-------|---------|----------|
//! | `Started` | `state` | `init` | yes |
//! | `StateChanged` | `state` | state name | yes |
//! | `OpenTimeout` | `alert/timeout` | elapsed, e.g. `20m` | no |
//! | `NightAlert` | `alert/night` | local `H:M` | no |
//! | `Status` | `status` | `status=..|time=..|sensor=..|signal=..` | no |
//! | `ConfigChanged` | `config` | changed field count | no |
//!
//! # Example
//!
//! ```ignore
//! use rs_garage::services::{MqttBridge, SharedDoorState};
//!
//! let state = Arc::new(SharedDoorState::new(controller, SystemClock::new()));
//! let mut bridge = MqttBridge::new(Arc::clone(&state), mqtt_client, config);
//! bridge.subscribe_control_topics()?;
//!
//! // In main loop:
//! bridge.poll()?;            // Process incoming commands
//! bridge.publish_events()?;  // Publish what the controller emitted
//! ```

use log::{debug, warn};

use crate::config::MqttConfig;
use crate::events::DoorEvent;
use crate::messages::parse_state_request;
use crate::traits::MqttClient;

use super::DoorService;

/// Topic suffix for state requests.
pub const STATE_SET_TOPIC: &str = "state/set";
/// Topic suffix for configuration updates.
pub const CONFIG_SET_TOPIC: &str = "config/set";

/// One outgoing MQTT message derived from a [`DoorEvent`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventMessage {
    /// Topic suffix below the configured prefix.
    pub suffix: &'static str,
    /// Payload text.
    pub payload: String,
    /// Whether the broker should retain it.
    pub retain: bool,
}

/// Map a controller event to its topic, payload and retain flag.
pub fn event_message(event: &DoorEvent) -> EventMessage {
    let (suffix, payload, retain) = match event {
        DoorEvent::Started => ("state", "init".to_string(), true),
        DoorEvent::StateChanged(state) => ("state", state.to_string(), true),
        DoorEvent::OpenTimeout(elapsed) => ("alert/timeout", elapsed.to_string(), false),
        DoorEvent::NightAlert { hour, minute } => {
            ("alert/night", format!("{hour}:{minute}"), false)
        }
        DoorEvent::Status(report) => ("status", report.to_string(), false),
        DoorEvent::ConfigChanged(count) => ("config", count.to_string(), false),
    };
    EventMessage {
        suffix,
        payload,
        retain,
    }
}

/// A command received over MQTT.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InboundCommand {
    /// Request a door state by name.
    State(String),
    /// Apply a configuration update string.
    Config(String),
}

/// Parse a message on a control topic.
///
/// State requests may be plain text (`open`) or JSON (`{"state":"open"}`).
/// Returns `None` for other topics or non-UTF-8 payloads.
pub fn parse_inbound(prefix: &str, topic: &str, payload: &[u8]) -> Option<InboundCommand> {
    let suffix = topic.strip_prefix(prefix)?.strip_prefix('/')?;
    let text = core::str::from_utf8(payload).ok()?.trim();
    match suffix {
        STATE_SET_TOPIC => {
            if text.starts_with('{') {
                let req = parse_state_request(text.as_bytes())?;
                Some(InboundCommand::State(req.state.as_str().to_string()))
            } else {
                Some(InboundCommand::State(text.to_string()))
            }
        }
        CONFIG_SET_TOPIC => Some(InboundCommand::Config(text.to_string())),
        _ => None,
    }
}

// ============================================================================
// MQTT Bridge
// ============================================================================

/// Unified MQTT bridge for both desktop and ESP32.
///
/// Wraps any `MqttClient` implementation and provides:
/// - Message polling with command dispatch
/// - Event publishing
pub struct MqttBridge<D, C>
where
    D: DoorService,
    C: MqttClient,
{
    door: D,
    client: C,
    config: MqttConfig,
}

impl<D, C> MqttBridge<D, C>
where
    D: DoorService,
    C: MqttClient,
{
    /// Create a new MQTT bridge.
    pub fn new(door: D, client: C, config: MqttConfig) -> Self {
        Self {
            door,
            client,
            config,
        }
    }

    /// Get a reference to the MQTT client.
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Get a mutable reference to the MQTT client.
    pub fn client_mut(&mut self) -> &mut C {
        &mut self.client
    }

    /// Subscribe to control topics.
    pub fn subscribe_control_topics(&mut self) -> Result<(), C::Error> {
        for suffix in [STATE_SET_TOPIC, CONFIG_SET_TOPIC] {
            let topic = self.config.topic(suffix);
            self.client.subscribe(&topic)?;
        }
        Ok(())
    }

    /// Process every pending incoming message.
    ///
    /// Rejected commands are logged and skipped. Returns how many
    /// commands were dispatched.
    pub fn poll(&mut self) -> Result<usize, C::Error> {
        let mut handled = 0;
        while let Some(msg) = self.client.try_recv() {
            let Some(cmd) = parse_inbound(&self.config.topic_prefix, &msg.topic, &msg.payload)
            else {
                debug!("ignoring message on {}", msg.topic);
                continue;
            };
            handled += 1;
            match cmd {
                InboundCommand::State(name) => {
                    if let Err(e) = self.door.request_state(&name) {
                        warn!("mqtt state request {:?} failed: {}", name, e);
                    }
                }
                InboundCommand::Config(update) => {
                    if let Err(e) = self.door.update_config(&update) {
                        warn!("mqtt config update failed: {}", e);
                    }
                }
            }
        }
        Ok(handled)
    }

    /// Publish every event the controller emitted since the last call.
    ///
    /// Returns how many messages were published. Stops at the first
    /// publish error; events not yet published are dropped.
    pub fn publish_events(&mut self) -> Result<usize, C::Error> {
        let events = self.door.drain_events();
        for (i, event) in events.iter().enumerate() {
            let msg = event_message(event);
            let topic = self.config.topic(msg.suffix);
            if let Err(e) = self.client.publish(&topic, msg.payload.as_bytes(), msg.retain) {
                warn!(
                    "mqtt publish to {} failed, dropping {} event(s)",
                    topic,
                    events.len() - i
                );
                return Err(e);
            }
        }
        Ok(events.len())
    }
}
