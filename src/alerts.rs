//! Open-door alerts.
//!
//! Two alerts watch a door that is not closed: one fires when it has been
//! open longer than a timeout, the other when it is open during a local
//! night window. Each fires at most once per episode; an episode ends
//! when the door is confirmed closed and [`AlertTracker::reset`] is called.

use log::warn;

use crate::config::DoorConfig;
use crate::door::DoorState;
use crate::events::{DoorEvent, Elapsed};

const MINUTES_PER_DAY: i64 = 24 * 60;
const SECS_PER_DAY: i64 = 24 * 60 * 60;

/// Whether `minute` falls inside the window from `start` to `end`.
///
/// A window whose start is after its end wraps past midnight. Equal
/// bounds disable the window.
///
/// ```rust
/// use rs_garage::alerts::in_night_window;
///
/// assert!(in_night_window(1400, 1320, 360));
/// assert!(in_night_window(100, 1320, 360));
/// assert!(!in_night_window(700, 1320, 360));
/// assert!(!in_night_window(700, 600, 600));
/// ```
pub fn in_night_window(minute: u16, start: u16, end: u16) -> bool {
    if start == end {
        return false;
    }
    let outside = if start > end {
        minute < start && minute > end
    } else {
        minute < start || minute > end
    };
    !outside
}

/// Local minute of the day for a UTC timestamp and zone offset.
pub fn local_minute_of_day(epoch_secs: u64, offset_secs: i64) -> u16 {
    let local = i64::try_from(epoch_secs)
        .unwrap_or(i64::MAX)
        .saturating_add(offset_secs);
    (local.rem_euclid(SECS_PER_DAY) / 60).rem_euclid(MINUTES_PER_DAY) as u16
}

/// Once-per-episode alert flags.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AlertTracker {
    timeout_fired: bool,
    night_fired: bool,
}

impl AlertTracker {
    /// Both alerts armed.
    pub const fn new() -> Self {
        Self {
            timeout_fired: false,
            night_fired: false,
        }
    }

    /// Re-arm both alerts. Call when the door is confirmed closed.
    pub fn reset(&mut self) {
        self.timeout_fired = false;
        self.night_fired = false;
    }

    /// Whether the open-timeout alert has fired this episode.
    pub fn timeout_fired(&self) -> bool {
        self.timeout_fired
    }

    /// Whether the night alert has fired this episode.
    pub fn night_fired(&self) -> bool {
        self.night_fired
    }

    /// Fire the open-timeout alert once `elapsed_secs` reaches the timeout.
    pub fn check_open_timeout(
        &mut self,
        state: DoorState,
        elapsed_secs: u64,
        config: &DoorConfig,
    ) -> Option<DoorEvent> {
        let timeout = u64::from(config.alert_open_timeout_secs);
        if state == DoorState::Closed || self.timeout_fired || timeout == 0 {
            return None;
        }
        if elapsed_secs < timeout {
            return None;
        }

        self.timeout_fired = true;
        let elapsed = Elapsed(elapsed_secs);
        warn!("door {} for {}", state, elapsed);
        Some(DoorEvent::OpenTimeout(elapsed))
    }

    /// Fire the night alert once while the local time is inside the window.
    pub fn check_night(
        &mut self,
        state: DoorState,
        epoch_secs: u64,
        config: &DoorConfig,
    ) -> Option<DoorEvent> {
        if state == DoorState::Closed || self.night_fired {
            return None;
        }
        let minute = local_minute_of_day(epoch_secs, config.time_zone_secs());
        if !in_night_window(minute, config.alert_night_start, config.alert_night_end) {
            return None;
        }

        self.night_fired = true;
        let hour = (minute / 60) as u8;
        let minute = (minute % 60) as u8;
        warn!("door {} at night, {}:{}", state, hour, minute);
        Some(DoorEvent::NightAlert { hour, minute })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc() -> DoorConfig {
        DoorConfig::default().with_time_zone(0.0)
    }

    // =========================================================================
    // Night window
    // =========================================================================

    #[test]
    fn overnight_window() {
        assert!(in_night_window(1440, 1320, 360));
        assert!(in_night_window(1320, 1320, 360));
        assert!(in_night_window(360, 1320, 360));
        assert!(in_night_window(0, 1320, 360));
        assert!(!in_night_window(700, 1320, 360));
        assert!(!in_night_window(361, 1320, 360));
        assert!(!in_night_window(1319, 1320, 360));
    }

    #[test]
    fn same_day_window() {
        assert!(in_night_window(60, 0, 120));
        assert!(in_night_window(0, 0, 120));
        assert!(in_night_window(120, 0, 120));
        assert!(!in_night_window(121, 0, 120));
        assert!(!in_night_window(1439, 60, 120));
    }

    #[test]
    fn equal_bounds_disable() {
        for minute in [0, 600, 1439] {
            assert!(!in_night_window(minute, 600, 600));
        }
    }

    #[test]
    fn local_minute_applies_offset() {
        // 1970-01-02 03:30 UTC
        let epoch = 86_400 + 3 * 3600 + 30 * 60;
        assert_eq!(local_minute_of_day(epoch, 0), 210);
        assert_eq!(local_minute_of_day(epoch, -7 * 3600), 20 * 60 + 30);
        assert_eq!(local_minute_of_day(epoch, 5 * 3600 + 1800), 9 * 60);
    }

    #[test]
    fn local_minute_saturates_on_extreme_inputs() {
        assert!(local_minute_of_day(u64::MAX, i64::MAX) < 1440);
        assert!(local_minute_of_day(0, i64::MIN) < 1440);
    }

    // =========================================================================
    // Open timeout
    // =========================================================================

    #[test]
    fn open_timeout_fires_at_threshold_once() {
        let config = DoorConfig::default();
        let mut alerts = AlertTracker::new();

        assert!(alerts
            .check_open_timeout(DoorState::Open, 1199, &config)
            .is_none());
        assert_eq!(
            alerts.check_open_timeout(DoorState::Open, 1200, &config),
            Some(DoorEvent::OpenTimeout(Elapsed(1200)))
        );
        assert!(alerts
            .check_open_timeout(DoorState::Open, 1300, &config)
            .is_none());
        assert!(alerts.timeout_fired());
    }

    #[test]
    fn open_timeout_suppressed_when_closed_or_disabled() {
        let mut alerts = AlertTracker::new();
        assert!(alerts
            .check_open_timeout(DoorState::Closed, 5000, &DoorConfig::default())
            .is_none());

        let disabled = DoorConfig::default().with_alert_open_timeout_secs(0);
        assert!(alerts
            .check_open_timeout(DoorState::Open, 5000, &disabled)
            .is_none());
        assert!(!alerts.timeout_fired());
    }

    #[test]
    fn reset_rearms_both() {
        let config = utc();
        let mut alerts = AlertTracker::new();
        let midnight = 86_400;

        assert!(alerts.check_open_timeout(DoorState::Stopped, 1200, &config).is_some());
        assert!(alerts.check_night(DoorState::Stopped, midnight, &config).is_some());

        alerts.reset();
        assert!(!alerts.timeout_fired());
        assert!(!alerts.night_fired());
        assert!(alerts.check_night(DoorState::Stopped, midnight, &config).is_some());
    }

    // =========================================================================
    // Night alert
    // =========================================================================

    #[test]
    fn night_alert_reports_local_time() {
        let config = DoorConfig::default().with_time_zone(-7.0);
        let mut alerts = AlertTracker::new();
        // 06:05 UTC is 23:05 local
        let epoch = 86_400 + 6 * 3600 + 5 * 60;

        assert_eq!(
            alerts.check_night(DoorState::Open, epoch, &config),
            Some(DoorEvent::NightAlert { hour: 23, minute: 5 })
        );
        assert!(alerts.check_night(DoorState::Open, epoch + 60, &config).is_none());
    }

    #[test]
    fn night_alert_quiet_during_day_and_when_closed() {
        let config = utc();
        let mut alerts = AlertTracker::new();
        let noon = 86_400 + 12 * 3600;
        let midnight = 86_400;

        assert!(alerts.check_night(DoorState::Open, noon, &config).is_none());
        assert!(alerts.check_night(DoorState::Closed, midnight, &config).is_none());
        assert!(!alerts.night_fired());
    }
}
