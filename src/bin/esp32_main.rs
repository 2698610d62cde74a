//! ESP32-C3 SuperMini garage door controller.
//!
//! This is the main entry point for the physical hardware controller.
//! It runs a 20Hz control loop that:
//! - Sequences relay clicks to drive the opener
//! - Scans the laser break beam for the closed position
//! - Raises open-too-long and night alerts
//! - Bridges commands and events to an MQTT broker (if enabled)
//!
//! The door configuration is kept in NVS and rewritten whenever a remote
//! update changes it.
//!
//! # Build
//!
//! ```bash
//! # Relay + sensor only
//! cargo build --release --features esp32 --bin esp32_main
//!
//! # With WiFi + MQTT
//! WIFI_SSID=... WIFI_PASSWORD=... MQTT_HOST=... \
//!     cargo build --release --features esp32-mqtt --bin esp32_main
//! ```

use std::thread;
use std::time::Duration;

use esp_idf_hal::adc::oneshot::AdcDriver;
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use log::{info, warn};
use rs_garage::hal::esp32::{Esp32Clock, Esp32LightSensor, Esp32Relay};
use rs_garage::traits::{Clock, EventQueue};
use rs_garage::{Config, DoorController, MqttConfig, WifiConfig};

/// Main loop interval in milliseconds (20Hz)
const LOOP_INTERVAL_MS: u64 = 50;

/// Refresh the RSSI reading every this many loop ticks (about 5 s)
#[cfg(feature = "wifi")]
const RSSI_INTERVAL: u32 = 100;

fn main() -> anyhow::Result<()> {
    // Initialize ESP-IDF
    esp_idf_hal::sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();

    info!("rs-garage SuperMini controller starting");

    // =========================================================================
    // Configuration
    // =========================================================================
    let nvs = EspDefaultNvsPartition::take()?;

    #[cfg(feature = "serde")]
    let mut store = rs_garage::hal::esp32::Esp32NvsStore::new(nvs.clone())?;

    #[cfg(feature = "serde")]
    let door_config = rs_garage::storage::load_or_default(&mut store);
    #[cfg(not(feature = "serde"))]
    let door_config = rs_garage::DoorConfig::default();

    let config = Config::default()
        .with_wifi(
            WifiConfig::default()
                .with_ssid(option_env!("WIFI_SSID").unwrap_or(""))
                .with_password(option_env!("WIFI_PASSWORD").unwrap_or("")),
        )
        .with_mqtt(MqttConfig::default().with_host(option_env!("MQTT_HOST").unwrap_or("localhost")))
        .with_door(door_config);

    info!("door config: {}", config.door);

    let peripherals = Peripherals::take()?;

    // =========================================================================
    // Initialize Relay (GPIO3) and Break Beam (GPIO2 laser, GPIO4 ADC)
    // =========================================================================
    let relay = Esp32Relay::new(peripherals.pins.gpio3)?;
    info!("relay initialized (GPIO3)");

    let adc1 = AdcDriver::new(peripherals.adc1)?;
    let sensor = Esp32LightSensor::new(&adc1, peripherals.pins.gpio4, peripherals.pins.gpio2)?;
    info!("beam sensor initialized (GPIO2 laser, GPIO4 ADC)");

    // =========================================================================
    // Initialize WiFi (required for MQTT)
    // =========================================================================
    #[cfg(feature = "wifi")]
    let mut wifi = {
        use esp_idf_svc::eventloop::EspSystemEventLoop;
        use rs_garage::hal::esp32::Esp32Wifi;

        if config.wifi.enabled && config.wifi.is_configured() {
            let sysloop = EspSystemEventLoop::take()?;
            Some(Esp32Wifi::new(peripherals.modem, sysloop, Some(nvs), &config.wifi)?)
        } else {
            warn!("wifi not configured (set WIFI_SSID/WIFI_PASSWORD)");
            None
        }
    };
    #[cfg(not(feature = "wifi"))]
    drop(nvs);

    // Wall time for the alerts; held for the life of the loop
    #[cfg(feature = "wifi")]
    let _sntp = match wifi {
        Some(_) => match Esp32Clock::start_sntp() {
            Ok(sntp) => Some(sntp),
            Err(e) => {
                warn!("sntp failed to start, alerts stay off: {:?}", e);
                None
            }
        },
        None => None,
    };

    // =========================================================================
    // Initialize MQTT Client
    // =========================================================================
    #[cfg(feature = "esp32-mqtt")]
    let mut mqtt = {
        use rs_garage::hal::esp32::Esp32Mqtt;
        use rs_garage::services::{CONFIG_SET_TOPIC, STATE_SET_TOPIC};
        use rs_garage::traits::MqttClient;

        if config.mqtt.enabled && wifi.is_some() {
            match Esp32Mqtt::new(&config.mqtt) {
                Ok(mut client) => {
                    for suffix in [STATE_SET_TOPIC, CONFIG_SET_TOPIC] {
                        if let Err(e) = client.subscribe(&config.mqtt.topic(suffix)) {
                            warn!("mqtt subscribe failed: {}", e);
                        }
                    }
                    Some(client)
                }
                Err(e) => {
                    warn!("mqtt client failed to start: {:?}", e);
                    None
                }
            }
        } else {
            info!("mqtt disabled");
            None
        }
    };

    // =========================================================================
    // Initialize Clock and Controller
    // =========================================================================
    let clock = Esp32Clock::new();
    let mut door = DoorController::new(
        relay,
        sensor,
        EventQueue::default(),
        config.door.clone(),
        clock.now(),
    );

    #[cfg(feature = "wifi")]
    let mut rssi_tick: u32 = 0;

    info!("starting control loop (20Hz)");

    // =========================================================================
    // Main Control Loop
    // =========================================================================
    loop {
        let now = clock.now();

        // ---------------------------------------------------------------------
        // Process MQTT commands
        // ---------------------------------------------------------------------
        #[cfg(feature = "esp32-mqtt")]
        if let Some(ref mut client) = mqtt {
            use rs_garage::services::{parse_inbound, InboundCommand};
            use rs_garage::traits::MqttClient;

            while let Some(msg) = client.try_recv() {
                match parse_inbound(&config.mqtt.topic_prefix, &msg.topic, &msg.payload) {
                    Some(InboundCommand::State(name)) => {
                        if let Err(e) = door.request_state(&name, now) {
                            warn!("mqtt state request {:?} failed: {}", name, e);
                        }
                    }
                    Some(InboundCommand::Config(update)) => match door.update_config(&update) {
                        Ok(0) => {}
                        Ok(_) => {
                            let saved = rs_garage::storage::save_if_changed(&mut store, door.config());
                            if let Err(e) = saved {
                                warn!("config not persisted: {}", e);
                            }
                        }
                        Err(e) => warn!("mqtt config update failed: {}", e),
                    },
                    None => {}
                }
            }
        }

        // ---------------------------------------------------------------------
        // Keep the link up; signal strength for the status string
        // ---------------------------------------------------------------------
        #[cfg(feature = "wifi")]
        {
            if rssi_tick == 0 {
                if let Some(dbm) = wifi.as_mut().and_then(|w| w.maintain()) {
                    door.set_signal_strength(dbm);
                }
            }
            rssi_tick = (rssi_tick + 1) % RSSI_INTERVAL;
        }

        // ---------------------------------------------------------------------
        // Update controller (relay, scan, alerts, motion timeout)
        // ---------------------------------------------------------------------
        door.poll(now);

        // ---------------------------------------------------------------------
        // Publish events
        // ---------------------------------------------------------------------
        for event in door.events_mut().drain() {
            #[cfg(feature = "esp32-mqtt")]
            if let Some(ref mut client) = mqtt {
                use rs_garage::services::event_message;
                use rs_garage::traits::MqttClient;

                let msg = event_message(&event);
                let topic = config.mqtt.topic(msg.suffix);
                if let Err(e) = client.publish(&topic, msg.payload.as_bytes(), msg.retain) {
                    warn!("mqtt publish to {} failed: {}", topic, e);
                }
                continue;
            }
            info!("event: {:?}", event);
        }

        // Sleep until next tick
        thread::sleep(Duration::from_millis(LOOP_INTERVAL_MS));
    }
}
