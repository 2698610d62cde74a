//! Host clock for desktop builds.

use std::time::{Instant, SystemTime, UNIX_EPOCH};

use crate::traits::Clock;

/// [`Clock`] backed by `Instant` (tick) and `SystemTime` (wall clock).
///
/// The tick counts milliseconds since construction and wraps like the
/// hardware counter does.
///
/// ```rust
/// use rs_garage::hal::SystemClock;
/// use rs_garage::traits::Clock;
///
/// let clock = SystemClock::new();
/// assert!(clock.now_ms() < 1000);
/// assert!(clock.epoch_secs() > 1_600_000_000);
/// ```
#[derive(Clone, Copy, Debug)]
pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    /// Clock whose tick starts at zero now.
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// The instant the tick counts from.
    pub fn start_time(&self) -> Instant {
        self.start
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u32 {
        // Truncation is the wrap.
        self.start.elapsed().as_millis() as u32
    }

    fn epoch_secs(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}
