//! Hardware abstraction traits for the relay, the beam sensor and time.
//!
//! This module defines the hardware interfaces that let rs-garage run
//! on an ESP32 board, on a desktop with mocks, or inside tests.
//!
//! # Key Traits
//!
//! | Trait | Purpose |
//! |-------|---------|
//! | [`RelayOutput`] | Drives the relay wired across the opener's push button |
//! | [`LightSensor`] | Photo sensor plus the emitter (laser) aimed at the door |
//! | [`Clock`] | Wrapping millisecond tick and wall-clock seconds |
//!
//! # Implementation
//!
//! For testing and desktop development, use the mock implementations
//! from [`crate::hal::mock`]. For ESP32 hardware, use the
//! implementations from `hal::esp32` (requires `esp32` feature).
//!
//! # Example
//!
//! ```rust
//! use rs_garage::traits::RelayOutput;
//! use rs_garage::hal::MockRelay;
//!
//! let mut relay = MockRelay::new();
//! relay.set_active(true).unwrap();
//! relay.set_active(false).unwrap();
//!
//! assert_eq!(relay.presses, 1);
//! ```

/// Relay output trait - the "button" of the garage door opener.
///
/// Closing the relay is equivalent to holding the wall button; releasing it
/// lets go of the button. One activate/release pair is one click.
///
/// # Example Implementation
///
/// ```rust,ignore
/// use rs_garage::traits::RelayOutput;
///
/// struct MyRelay { /* gpio handle */ }
///
/// impl RelayOutput for MyRelay {
///     type Error = ();
///
///     fn set_active(&mut self, active: bool) -> Result<(), ()> {
///         // Drive the GPIO high or low...
///         Ok(())
///     }
/// }
/// ```
pub trait RelayOutput {
    /// Error type for relay operations.
    type Error: core::fmt::Debug;

    /// Energize (`true`) or release (`false`) the relay.
    fn set_active(&mut self, active: bool) -> Result<(), Self::Error>;

    /// Convenience method to release the relay.
    fn release(&mut self) -> Result<(), Self::Error> {
        self.set_active(false)
    }
}

/// Beam sensor trait: an analog photo sensor and a switchable emitter.
///
/// The position sensor takes one reading with the emitter off (ambient)
/// and one with the emitter on, so implementations only need raw access.
///
/// # Implementation Notes
///
/// - `read_level()` returns the raw ADC value; higher means brighter
///   ambient on the photo resistor divider, lower means more light
///   reflected back from the door.
/// - `delay_us()` is only used for the sub-millisecond emitter pulse and
///   may busy-wait.
pub trait LightSensor {
    /// Error type for sensor operations.
    type Error: core::fmt::Debug;

    /// Read the raw brightness level.
    fn read_level(&mut self) -> Result<u16, Self::Error>;

    /// Switch the emitter on or off.
    fn set_emitter(&mut self, on: bool) -> Result<(), Self::Error>;

    /// Wait for the given number of microseconds.
    fn delay_us(&mut self, us: u32);
}

/// Wall-clock readings before 2020-01-01 UTC mean the clock has not been
/// set yet (no SNTP sync since boot).
pub const MIN_SYNCED_EPOCH_SECS: u64 = 1_577_836_800;

/// A point in time as seen by the controller.
///
/// `tick_ms` is a free-running millisecond counter that wraps after
/// `u32::MAX`; `epoch_secs` is wall-clock UTC seconds used for elapsed
/// time reporting and the night window.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Timestamp {
    /// Millisecond tick (wraps around).
    pub tick_ms: u32,
    /// Seconds since the Unix epoch (UTC).
    pub epoch_secs: u64,
}

impl Timestamp {
    /// Creates a timestamp from its parts.
    #[inline]
    pub const fn new(tick_ms: u32, epoch_secs: u64) -> Self {
        Self {
            tick_ms,
            epoch_secs,
        }
    }

    /// Whether `epoch_secs` looks like a synchronized wall clock.
    #[inline]
    pub const fn wall_clock_set(&self) -> bool {
        self.epoch_secs >= MIN_SYNCED_EPOCH_SECS
    }
}

/// Time source trait for `no_std` compatibility.
///
/// # Example
///
/// ```rust
/// use rs_garage::traits::Clock;
/// use rs_garage::hal::MockClock;
///
/// let mut clock = MockClock::new();
/// assert_eq!(clock.now_ms(), 0);
///
/// clock.advance(100);
/// assert_eq!(clock.now_ms(), 100);
/// ```
pub trait Clock {
    /// Returns the free-running millisecond tick.
    ///
    /// Wraps to zero after `u32::MAX`.
    fn now_ms(&self) -> u32;

    /// Returns wall-clock seconds since the Unix epoch.
    fn epoch_secs(&self) -> u64;

    /// Returns both readings as a [`Timestamp`].
    fn now(&self) -> Timestamp {
        Timestamp::new(self.now_ms(), self.epoch_secs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestRelay {
        active: bool,
        calls: usize,
    }

    impl RelayOutput for TestRelay {
        type Error = ();

        fn set_active(&mut self, active: bool) -> Result<(), ()> {
            self.active = active;
            self.calls += 1;
            Ok(())
        }
    }

    #[test]
    fn relay_release_default_impl() {
        let mut relay = TestRelay {
            active: true,
            calls: 0,
        };
        relay.release().unwrap();
        assert!(!relay.active);
        assert_eq!(relay.calls, 1);
    }

    struct FixedClock;

    impl Clock for FixedClock {
        fn now_ms(&self) -> u32 {
            42
        }

        fn epoch_secs(&self) -> u64 {
            1_700_000_000
        }
    }

    #[test]
    fn clock_now_combines_readings() {
        let now = FixedClock.now();
        assert_eq!(now, Timestamp::new(42, 1_700_000_000));
    }

    #[test]
    fn boot_time_wall_clock_is_not_set() {
        assert!(!Timestamp::new(0, 30).wall_clock_set());
        assert!(!Timestamp::new(0, MIN_SYNCED_EPOCH_SECS - 1).wall_clock_set());
        assert!(Timestamp::new(0, 1_700_000_000).wall_clock_set());
    }

    #[test]
    fn timestamp_default_is_zero() {
        let ts = Timestamp::default();
        assert_eq!(ts.tick_ms, 0);
        assert_eq!(ts.epoch_secs, 0);
    }
}
