//! # rs-garage
//!
//! A garage door opener controller with break-beam position sensing,
//! open-door alerts, web API and MQTT integration.
//!
//! ## Features
//!
//! - **Hardware abstraction**: Traits for the opener relay, the beam sensor and time
//! - **Relay sequencing**: Multi-click presses with configurable hold and pause times
//! - **Position sensing**: Ambient-compensated emitter pulses averaged over several reads
//! - **Alerts**: Door left open too long, door open during the night window
//! - **Remote configuration**: `key=value|...` updates, validated as a batch
//!
//! ## Architecture
//!
//! The crate is structured to allow testing on desktop without hardware:
//!
//! - `traits` - Hardware, network and event sink abstractions
//! - `door` - Door states and requests
//! - `transition` - Which requests are honoured from which state, and how many clicks they take
//! - `timer` - Wraparound-safe millisecond timers
//! - `sensor` - Beam sensor sampling
//! - `alerts` - Open-timeout and night-window tracking
//! - `controller` - Main controller that ties everything together
//! - `hal` - Concrete implementations (mock for testing, esp32 for hardware)
//!
//! ## Example
//!
//! ```rust
//! use rs_garage::{DoorController, DoorEvent, DoorState, Timestamp};
//! use rs_garage::config::DoorConfig;
//! use rs_garage::hal::{MockEvents, MockLightSensor, MockRelay};
//!
//! let mut door = DoorController::new(
//!     MockRelay::new(),
//!     MockLightSensor::open(),
//!     MockEvents::new(),
//!     DoorConfig::default(),
//!     Timestamp::new(0, 1_700_000_000),
//! );
//! assert_eq!(door.events().last(), Some(&DoorEvent::Started));
//!
//! // Call poll from your main loop
//! door.poll(Timestamp::new(0, 1_700_000_000));
//! assert_eq!(door.state(), DoorState::Open);
//!
//! // Remote commands name the state they want
//! door.request_state("close", Timestamp::new(50, 1_700_000_000)).unwrap();
//! assert_eq!(door.state(), DoorState::Closing);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

extern crate alloc;

/// Open-timeout and night-window alert tracking.
pub mod alerts;
/// Door controller that coordinates the relay, sensor, timers and alerts.
pub mod controller;
/// Door states and remote requests.
pub mod door;
/// Error types for commands and configuration.
pub mod error;
/// Events emitted by the controller.
pub mod events;
/// Hardware abstraction layer with mock implementations for testing.
pub mod hal;
/// Beam position sensor sampling.
pub mod sensor;
/// Millisecond timers that survive tick wraparound.
pub mod timer;
/// Core traits for hardware abstraction, networking and events.
pub mod traits;
/// State transition table.
pub mod transition;

/// Shared configuration system for desktop and ESP32.
pub mod config;

/// Shared message types for HTTP/MQTT communication (serde-based).
#[cfg(feature = "serde")]
pub mod messages;

/// Versioned binary persistence of the door configuration.
#[cfg(feature = "serde")]
pub mod storage;

/// Network services for HTTP API and MQTT (feature-gated).
#[cfg(any(feature = "web", feature = "mqtt", feature = "esp32-mqtt"))]
pub mod services;

// Re-exports for convenience
pub use alerts::AlertTracker;
pub use controller::{DoorController, DoorSnapshot, SensorMode};
pub use door::{DoorRequest, DoorState};
pub use error::{ConfigError, DoorError};
pub use events::{DoorEvent, Elapsed, StatusReport};
pub use sensor::{PositionSensor, SensorReading};
pub use timer::{Timer, TimerDuration};
pub use traits::{
    // Hardware
    Clock,
    // Events
    EventBuffer,
    EventQueue,
    EventSink,
    LightSensor,
    // Network
    MqttClient,
    MqttMessage,
    NullSink,
    RelayOutput,
    Timestamp,
};
pub use transition::{transition, MotionAction, Transition};

// Config re-exports
pub use config::{Config, DoorConfig, MqttConfig, TimingField, WebConfig, WifiConfig};

// Message re-exports (for HTTP/MQTT APIs)
#[cfg(feature = "serde")]
pub use messages::StateRequest;

// Parsing function re-exports (serde-json-core based)
#[cfg(feature = "serde-json-core")]
pub use messages::parse_state_request;
