//! MQTT client for ESP32-C3.
//!
//! Implements the `MqttClient` trait on top of esp-idf-svc so the shared
//! [`crate::services`] bridge logic can run on the device. Incoming messages
//! are forwarded from the connection thread through a channel and polled
//! with `try_recv()`.
//!
//! # Example
//!
//! ```ignore
//! use rs_garage::hal::esp32::Esp32Mqtt;
//! use rs_garage::config::MqttConfig;
//! use rs_garage::traits::MqttClient;
//!
//! let config = MqttConfig::default()
//!     .with_host("192.168.1.100")
//!     .with_topic_prefix("home/garage");
//!
//! let mut mqtt = Esp32Mqtt::new(&config)?;
//! mqtt.subscribe("home/garage/state/set")?;
//! mqtt.publish("home/garage/state", b"init", true)?;
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use esp_idf_svc::mqtt::client::{
    EspMqttClient, EspMqttConnection, EventPayload, MqttClientConfiguration, QoS,
};
use log::{info, warn};

use crate::config::MqttConfig;
use crate::traits::{MqttClient, MqttMessage};

/// MQTT client for the door controller.
///
/// Connects to an MQTT broker and queues incoming messages. Subscriptions
/// are made by the caller, normally through `MqttBridge`.
pub struct Esp32Mqtt {
    client: EspMqttClient<'static>,
    message_rx: Receiver<MqttMessage>,
    connected: Arc<AtomicBool>,
}

impl Esp32Mqtt {
    /// Create a new MQTT client and start connecting to the broker.
    ///
    /// # Errors
    ///
    /// Returns an error if the client cannot be created.
    pub fn new(config: &MqttConfig) -> anyhow::Result<Self> {
        let broker_url = format!("mqtt://{}:{}", config.host.as_str(), config.port);

        let (username, password) = if config.has_auth() {
            (
                Some(config.username.as_str()),
                Some(config.password.as_str()),
            )
        } else {
            (None, None)
        };

        let mqtt_config = MqttClientConfiguration {
            client_id: Some(config.client_id.as_str()),
            keep_alive_interval: Some(Duration::from_secs(config.keep_alive_secs as u64)),
            username,
            password,
            ..Default::default()
        };

        let (message_tx, message_rx) = channel::<MqttMessage>();
        let connected = Arc::new(AtomicBool::new(false));

        let (client, mut connection) = EspMqttClient::new(&broker_url, &mqtt_config)?;

        // Spawn a thread to handle incoming messages
        let connected_flag = Arc::clone(&connected);
        thread::Builder::new()
            .stack_size(6 * 1024)
            .spawn(move || handle_mqtt_events(&mut connection, message_tx, &connected_flag))?;

        info!("mqtt client started for {}", broker_url);

        Ok(Self {
            client,
            message_rx,
            connected,
        })
    }
}

// ============================================================================
// MqttClient Trait Implementation
// ============================================================================

/// Error type for ESP32 MQTT operations.
#[derive(Debug)]
pub struct Esp32MqttError(pub String);

impl core::fmt::Display for Esp32MqttError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "MQTT error: {}", self.0)
    }
}

impl std::error::Error for Esp32MqttError {}

impl MqttClient for Esp32Mqtt {
    type Error = Esp32MqttError;

    fn publish(&mut self, topic: &str, payload: &[u8], retain: bool) -> Result<(), Self::Error> {
        let qos = if retain {
            QoS::AtLeastOnce
        } else {
            QoS::AtMostOnce
        };
        self.client
            .publish(topic, qos, retain, payload)
            .map_err(|e| Esp32MqttError(format!("{:?}", e)))?;
        Ok(())
    }

    fn subscribe(&mut self, topic: &str) -> Result<(), Self::Error> {
        self.client
            .subscribe(topic, QoS::AtLeastOnce)
            .map_err(|e| Esp32MqttError(format!("{:?}", e)))?;
        info!("mqtt subscribed to {}", topic);
        Ok(())
    }

    fn try_recv(&mut self) -> Option<MqttMessage> {
        match self.message_rx.try_recv() {
            Ok(msg) => Some(msg),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.connected.store(false, Ordering::Relaxed);
                None
            }
        }
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn handle_mqtt_events(
    connection: &mut EspMqttConnection,
    message_tx: Sender<MqttMessage>,
    connected: &AtomicBool,
) {
    loop {
        match connection.next() {
            Err(e) => {
                warn!("mqtt connection error: {:?}", e);
                connected.store(false, Ordering::Relaxed);
                thread::sleep(Duration::from_secs(1));
            }
            Ok(event) => match event.payload() {
                EventPayload::Connected(_) => {
                    info!("mqtt connected");
                    connected.store(true, Ordering::Relaxed);
                }
                EventPayload::Disconnected => {
                    warn!("mqtt disconnected");
                    connected.store(false, Ordering::Relaxed);
                }
                EventPayload::Received {
                    topic: Some(topic),
                    data,
                    ..
                } => {
                    let msg = MqttMessage::new(topic.to_string(), data.to_vec());
                    if message_tx.send(msg).is_err() {
                        return;
                    }
                }
                _ => {}
            },
        }
    }
}
