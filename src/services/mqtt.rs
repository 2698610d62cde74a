//! Async MQTT handler for desktop builds, built on `rumqttc`.
//!
//! **Subscribe Topics:**
//! - `garage/state/set` - Request a state: `open`, `close`, `stop` or `{"state": "open"}`
//! - `garage/config/set` - Configuration update: `rdt=500|mtt=12000`
//!
//! **Publish Topics:**
//! - `garage/state` - Door state (retained), `init` on startup
//! - `garage/alert/timeout` - Door left open too long
//! - `garage/alert/night` - Door open during the night window
//! - `garage/status` - Periodic status string
//! - `garage/config` - Number of fields changed by the last update
//!
//! Topic mapping is shared with [`super::MqttBridge`] through
//! [`super::parse_inbound`] and [`super::event_message`].

use std::time::Duration;

use log::{debug, info, warn};
use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS};

use crate::config::MqttConfig as SharedMqttConfig;

use super::mqtt_runner::{event_message, parse_inbound, InboundCommand};
use super::shared::DoorService;

// ============================================================================
// Configuration
// ============================================================================

/// Runtime MQTT client configuration for `rumqttc`.
///
/// This struct uses `String` for runtime compatibility with the `rumqttc` library.
/// For embedded/no-alloc contexts, use [`crate::config::MqttConfig`] which uses
/// fixed-size `ShortString` types and convert with [`MqttRuntimeConfig::from_config`].
#[derive(Debug, Clone)]
pub struct MqttRuntimeConfig {
    /// MQTT broker hostname
    pub host: String,
    /// MQTT broker port
    pub port: u16,
    /// Client ID
    pub client_id: String,
    /// Topic prefix (default: "garage")
    pub topic_prefix: String,
    /// Optional username and password
    pub credentials: Option<(String, String)>,
    /// How often queued controller events are published, in milliseconds
    pub publish_interval_ms: u64,
    /// Keep-alive interval in seconds
    pub keep_alive_secs: u16,
}

impl Default for MqttRuntimeConfig {
    fn default() -> Self {
        Self::from_config(&SharedMqttConfig::default())
    }
}

impl MqttRuntimeConfig {
    /// Create a new config with the given broker address
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    /// Create from shared MqttConfig
    pub fn from_config(config: &SharedMqttConfig) -> Self {
        let credentials = config.has_auth().then(|| {
            (
                config.username.as_str().to_string(),
                config.password.as_str().to_string(),
            )
        });
        Self {
            host: config.host.as_str().to_string(),
            port: config.port,
            client_id: config.client_id.as_str().to_string(),
            topic_prefix: config.topic_prefix.as_str().to_string(),
            credentials,
            publish_interval_ms: 100,
            keep_alive_secs: config.keep_alive_secs,
        }
    }

    /// Set the client ID
    pub fn client_id(mut self, id: impl Into<String>) -> Self {
        self.client_id = id.into();
        self
    }

    /// Set the topic prefix
    pub fn topic_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.topic_prefix = prefix.into();
        self
    }

    /// Set the event publish interval
    pub fn publish_interval_ms(mut self, ms: u64) -> Self {
        self.publish_interval_ms = ms;
        self
    }

    fn topic(&self, suffix: &str) -> String {
        format!("{}/{}", self.topic_prefix, suffix)
    }
}

// ============================================================================
// MQTT Handler
// ============================================================================

/// MQTT handler that bridges broker messages to a shared door controller.
///
/// The handler does not poll the controller; run the poll loop separately
/// against the same [`DoorService`].
pub struct MqttHandler<D> {
    door: D,
    config: MqttRuntimeConfig,
}

impl<D> MqttHandler<D>
where
    D: DoorService + Clone + 'static,
{
    /// Create a new MQTT handler over a shared door service.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let state = Arc::new(SharedDoorState::new(controller, SystemClock::new()));
    ///
    /// // Web and MQTT share the same state
    /// let web_router = build_router(Arc::clone(&state), &web_config);
    /// let mqtt_handler = MqttHandler::new(Arc::clone(&state), mqtt_config);
    /// ```
    pub fn new(door: D, config: MqttRuntimeConfig) -> Self {
        Self { door, config }
    }

    /// Get a handle to the shared door service.
    pub fn door(&self) -> D {
        self.door.clone()
    }

    /// Run the MQTT handler
    ///
    /// This function handles MQTT messages until the subscription fails.
    /// Connection errors are logged and retried.
    pub async fn run(self) -> Result<(), MqttError> {
        let mut options =
            MqttOptions::new(&self.config.client_id, &self.config.host, self.config.port);
        options.set_keep_alive(Duration::from_secs(self.config.keep_alive_secs as u64));
        if let Some((user, pass)) = &self.config.credentials {
            options.set_credentials(user, pass);
        }

        let (client, mut eventloop) = AsyncClient::new(options, 10);

        let topics = [
            self.config.topic(super::STATE_SET_TOPIC),
            self.config.topic(super::CONFIG_SET_TOPIC),
        ];

        for topic in &topics {
            client
                .subscribe(topic, QoS::AtLeastOnce)
                .await
                .map_err(|e| MqttError::Subscribe(e.to_string()))?;
        }

        info!(
            "mqtt connecting to {}:{}, subscribed to {:?}",
            self.config.host, self.config.port, topics
        );

        // Spawn event publisher task
        let door_for_publish = self.door.clone();
        let config_for_publish = self.config.clone();
        let client_for_publish = client.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_millis(
                config_for_publish.publish_interval_ms.max(1),
            ));
            loop {
                interval.tick().await;
                for event in door_for_publish.drain_events() {
                    let msg = event_message(&event);
                    let topic = config_for_publish.topic(msg.suffix);
                    if let Err(e) = client_for_publish
                        .publish(&topic, QoS::AtLeastOnce, msg.retain, msg.payload)
                        .await
                    {
                        warn!("mqtt publish to {} failed: {}", topic, e);
                    }
                }
            }
        });

        // Main event loop
        loop {
            match eventloop.poll().await {
                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    self.handle_message(&publish.topic, &publish.payload);
                }
                Ok(_) => {}
                Err(e) => {
                    warn!("mqtt connection error: {:?}", e);
                    tokio::time::sleep(Duration::from_secs(5)).await;
                }
            }
        }
    }

    fn handle_message(&self, topic: &str, payload: &[u8]) {
        let Some(cmd) = parse_inbound(&self.config.topic_prefix, topic, payload) else {
            debug!("ignoring message on {}", topic);
            return;
        };

        match cmd {
            InboundCommand::State(name) => match self.door.request_state(&name) {
                Ok(state) => debug!("mqtt request {:?} -> {}", name, state),
                Err(e) => warn!("mqtt state request {:?} failed: {}", name, e),
            },
            InboundCommand::Config(update) => match self.door.update_config(&update) {
                Ok(changed) => debug!("mqtt config update changed {} field(s)", changed),
                Err(e) => warn!("mqtt config update failed: {}", e),
            },
        }
    }
}

/// MQTT-related errors
#[derive(Debug)]
pub enum MqttError {
    /// Failed to subscribe to topic
    Subscribe(String),
}

impl std::fmt::Display for MqttError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Subscribe(e) => write!(f, "mqtt subscribe failed: {e}"),
        }
    }
}

impl std::error::Error for MqttError {}
