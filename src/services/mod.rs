//! Network services for HTTP API and MQTT integration.
//!
//! This module provides optional network connectivity for the door controller:
//! - `web` feature: Axum-based HTTP API server with JSON endpoints
//! - `mqtt` feature: MQTT client for pub/sub messaging
//!
//! Both services integrate with the core `DoorController` through a unified
//! shared state pattern using `SharedDoorState` wrapped in `Arc` for
//! thread-safe access across all services.
//!
//! # Shared State Pattern
//!
//! The poll loop, the web API and MQTT all drive a single controller via
//! `SharedDoorState`:
//!
//! ```ignore
//! use std::sync::Arc;
//! use rs_garage::services::SharedDoorState;
//!
//! // Create single shared state
//! let state = Arc::new(SharedDoorState::new(controller, SystemClock::new()));
//!
//! // Web and MQTT both use the same state
//! let web_router = build_router(Arc::clone(&state), &web_config);
//! let mqtt_handler = MqttHandler::new(Arc::clone(&state), mqtt_config);
//! ```

// Shared state (available with any network service)
#[cfg(any(feature = "web", feature = "mqtt", feature = "esp32-mqtt"))]
pub mod shared;

// API types are shared between web and mqtt
#[cfg(any(feature = "web", feature = "mqtt"))]
pub mod api;

#[cfg(feature = "web")]
pub mod web;

#[cfg(feature = "mqtt")]
pub mod mqtt;

// MQTT bridge (platform-agnostic, also used by the ESP32 binary)
#[cfg(any(feature = "web", feature = "mqtt", feature = "esp32-mqtt"))]
pub mod mqtt_runner;

// Re-exports
#[cfg(any(feature = "web", feature = "mqtt", feature = "esp32-mqtt"))]
pub use shared::*;

#[cfg(any(feature = "web", feature = "mqtt"))]
pub use api::*;

#[cfg(feature = "web")]
pub use web::*;

#[cfg(feature = "mqtt")]
pub use mqtt::*;

#[cfg(any(feature = "web", feature = "mqtt", feature = "esp32-mqtt"))]
pub use mqtt_runner::*;
