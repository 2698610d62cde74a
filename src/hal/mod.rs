//! Hardware Abstraction Layer implementations.
//!
//! This module contains concrete implementations of the traits
//! defined in [`crate::traits`] for various platforms.
//!
//! # Available Implementations
//!
//! - `mock`: Test implementations for desktop development
//! - `system`: Host clock (requires `std` feature)
//! - `esp32`: ESP32 relay, laser beam sensor, WiFi and MQTT (requires `esp32` feature)

pub mod mock;

#[cfg(feature = "std")]
pub mod system;

#[cfg(feature = "esp32")]
pub mod esp32;

pub use mock::*;

#[cfg(feature = "std")]
pub use system::*;

#[cfg(feature = "esp32")]
pub use esp32::*;
