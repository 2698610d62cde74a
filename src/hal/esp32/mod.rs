//! ESP32-C3 SuperMini hardware abstraction layer for a garage door opener.
//!
//! This module provides hardware implementations for the ESP32-C3 SuperMini
//! board wired to the opener's wall-button terminals through a relay, with a
//! laser and photo resistor forming the break beam.
//!
//! # Hardware Configuration
//!
//! - **MCU**: ESP32-C3 SuperMini (RISC-V 160MHz, 4MB Flash)
//! - **Relay**: 3.3V relay module across the opener's push-button terminals
//! - **Emitter**: 5mW laser diode module, switched through a transistor
//! - **Sensor**: Photo resistor divider into ADC1
//!
//! # Pin Assignments
//!
//! See the [`pins`] module for GPIO assignments matching the SuperMini layout.

mod clock;
mod relay;
mod sensor;

pub use clock::Esp32Clock;
pub use relay::Esp32Relay;
pub use sensor::Esp32LightSensor;

#[cfg(feature = "serde")]
mod nvs;
#[cfg(feature = "serde")]
pub use nvs::Esp32NvsStore;

#[cfg(feature = "wifi")]
mod wifi;
#[cfg(feature = "wifi")]
pub use wifi::Esp32Wifi;

#[cfg(feature = "esp32-mqtt")]
mod mqtt;
#[cfg(feature = "esp32-mqtt")]
pub use mqtt::{Esp32Mqtt, Esp32MqttError};

/// Pin assignments for SuperMini ESP32-C3.
pub mod pins {
    // =========================================================================
    // Break Beam
    // =========================================================================

    /// Laser emitter enable (active high)
    pub const LASER: i32 = 2;

    /// Photo resistor divider output - ADC1
    pub const PHOTO: i32 = 4;

    // =========================================================================
    // Opener
    // =========================================================================

    /// Relay coil driver (active high)
    pub const RELAY: i32 = 3;
}
