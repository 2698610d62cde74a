//! ESP32 clock implementation using the ESP-IDF timer.

use std::time::{SystemTime, UNIX_EPOCH};

#[cfg(feature = "wifi")]
use esp_idf_svc::{sntp::EspSntp, sys::EspError};
#[cfg(feature = "wifi")]
use log::info;

use crate::traits::Clock;

/// ESP32 clock using the hardware timer.
///
/// The millisecond tick comes from `esp_timer_get_time()` (microseconds
/// since boot) truncated to `u32`, so it wraps after about 49 days just like
/// the controller expects. Wall-clock seconds come from the system time,
/// which reads near zero until SNTP has synchronized; see
/// [`Esp32Clock::start_sntp`]. The controller holds its alerts until then.
///
/// # Example
///
/// ```ignore
/// use rs_garage::hal::esp32::Esp32Clock;
/// use rs_garage::traits::Clock;
///
/// let clock = Esp32Clock::new();
/// let start = clock.now_ms();
/// // ... do work ...
/// let elapsed = clock.now_ms().wrapping_sub(start);
/// ```
pub struct Esp32Clock;

impl Esp32Clock {
    /// Creates a new ESP32 clock instance.
    #[inline]
    pub fn new() -> Self {
        Self
    }
}

#[cfg(feature = "wifi")]
impl Esp32Clock {
    /// Start SNTP against the default pool.
    ///
    /// The system time is stepped once the first reply arrives. Keep the
    /// returned handle alive for as long as time should stay synchronized.
    pub fn start_sntp() -> Result<EspSntp<'static>, EspError> {
        let sntp = EspSntp::new_default()?;
        info!("sntp started");
        Ok(sntp)
    }
}

impl Default for Esp32Clock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for Esp32Clock {
    #[inline]
    fn now_ms(&self) -> u32 {
        // Safe: this is a simple read of the hardware timer, no side effects
        let micros = unsafe { esp_idf_hal::sys::esp_timer_get_time() };
        (micros / 1000) as u32
    }

    fn epoch_secs(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}
