//! Non-blocking duration timer.
//!
//! A [`Timer`] never sleeps. The owner polls it with the current
//! millisecond tick and the timer answers whether it is still running.
//! Expiry is computed on elapsed time (`now - start`), so a tick counter
//! that wraps past `u32::MAX` mid-interval is handled.
//!
//! # Example
//!
//! ```rust
//! use rs_garage::timer::Timer;
//! use rs_garage::config::DoorConfig;
//!
//! let config = DoorConfig::default();
//! let mut timer = Timer::fixed(100);
//!
//! timer.start(u32::MAX - 10, &config);
//! assert!(!timer.is_timeout(50));       // 61 ms elapsed
//! assert!(timer.is_timeout(89));        // 100 ms elapsed, fires once
//! assert!(!timer.is_timeout(200));
//! ```

use crate::config::{DoorConfig, TimingField};

/// Where a timer takes its duration from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerDuration {
    /// A fixed number of milliseconds.
    Fixed(u32),
    /// A configuration field, read each time the timer starts.
    Bound(TimingField),
}

impl TimerDuration {
    /// Duration in milliseconds under `config`.
    pub fn resolve(self, config: &DoorConfig) -> u32 {
        match self {
            Self::Fixed(ms) => ms,
            Self::Bound(field) => config.timing_ms(field),
        }
    }
}

/// One-shot millisecond timer.
#[derive(Clone, Debug)]
pub struct Timer {
    duration: TimerDuration,
    running: bool,
    start_ms: u32,
    end_ms: u32,
}

impl Timer {
    /// Timer with a fixed duration.
    pub const fn fixed(ms: u32) -> Self {
        Self::new(TimerDuration::Fixed(ms))
    }

    /// Timer whose duration follows a configuration field.
    pub const fn bound(field: TimingField) -> Self {
        Self::new(TimerDuration::Bound(field))
    }

    /// Stopped timer with the given duration source.
    pub const fn new(duration: TimerDuration) -> Self {
        Self {
            duration,
            running: false,
            start_ms: 0,
            end_ms: 0,
        }
    }

    /// Replace the duration with a fixed value. Takes effect at the next start.
    pub fn set_duration(&mut self, ms: u32) {
        self.duration = TimerDuration::Fixed(ms);
    }

    /// Follow a configuration field. Takes effect at the next start.
    pub fn bind(&mut self, field: TimingField) {
        self.duration = TimerDuration::Bound(field);
    }

    /// Current duration source.
    pub fn duration(&self) -> TimerDuration {
        self.duration
    }

    /// Start (or restart) from `now_ms`.
    pub fn start(&mut self, now_ms: u32, config: &DoorConfig) {
        self.start_ms = now_ms;
        self.end_ms = now_ms.wrapping_add(self.duration.resolve(config));
        self.running = true;
    }

    /// Cancel without firing.
    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Whether the timer is still counting at `now_ms`.
    ///
    /// The first call at or past the end stops the timer and returns false.
    pub fn is_running(&mut self, now_ms: u32) -> bool {
        if !self.running {
            return false;
        }
        let elapsed = now_ms.wrapping_sub(self.start_ms);
        if elapsed >= self.span() {
            self.running = false;
        }
        self.running
    }

    /// True only for the call that observes expiry.
    ///
    /// Never true for a timer that was stopped or never started.
    pub fn is_timeout(&mut self, now_ms: u32) -> bool {
        self.running && !self.is_running(now_ms)
    }

    /// Milliseconds until expiry, or 0 when not running.
    pub fn time_left(&self, now_ms: u32) -> u32 {
        if !self.running {
            return 0;
        }
        self.span()
            .saturating_sub(now_ms.wrapping_sub(self.start_ms))
    }

    /// Whether the timer was started and has not yet been seen to expire.
    ///
    /// Unlike [`is_running`](Self::is_running) this does not check the clock.
    pub fn is_armed(&self) -> bool {
        self.running
    }

    fn span(&self) -> u32 {
        self.end_ms.wrapping_sub(self.start_ms)
    }
}
