//! Trait definitions for hardware abstraction, events and networking.
//!
//! This module defines the core abstractions that allow rs-garage to:
//! - Run on different hardware (ESP32, desktop mock)
//! - Deliver controller events to any transport
//! - Use different MQTT client implementations
//!
//! # Submodules
//!
//! - `hardware`: Relay output, beam sensor, clock
//! - `events`: Event sink for state changes, alerts and status
//! - `network`: MQTT client trait
//!
//! # Hardware Abstraction
//!
//! - [`RelayOutput`]: Relay across the opener's push button
//! - [`LightSensor`]: Photo sensor with a switchable emitter
//! - [`Clock`]: Wrapping millisecond tick plus wall-clock seconds

pub mod events;
pub mod hardware;
pub mod network;

pub use events::*;
pub use hardware::*;
pub use network::*;
