//! Events emitted by the door controller.
//!
//! Events are plain data. How they are rendered (topic names, payload
//! text) is up to the sink, but the [`Display`](core::fmt::Display) impls
//! here produce the payload strings used on the wire:
//!
//! ```rust
//! use rs_garage::events::{Elapsed, StatusReport};
//! use rs_garage::DoorState;
//!
//! assert_eq!(Elapsed(90).to_string(), "90s");
//! assert_eq!(Elapsed(3 * 3600).to_string(), "180m");
//!
//! let report = StatusReport {
//!     state: DoorState::Open,
//!     elapsed: Elapsed(600),
//!     sensor: 12,
//!     signal: -61,
//! };
//! assert_eq!(report.to_string(), "status=open|time=10m|sensor=12|signal=-61");
//! ```

use core::fmt;

use crate::door::DoorState;

/// Something observable happened in the controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DoorEvent {
    /// The controller has been constructed and the relay released.
    Started,
    /// The door state changed.
    StateChanged(DoorState),
    /// The door has been open longer than the configured timeout.
    OpenTimeout(Elapsed),
    /// The door is open during the night window (local time).
    NightAlert {
        /// Local hour, 0-23.
        hour: u8,
        /// Local minute, 0-59.
        minute: u8,
    },
    /// Periodic status refresh, once per scan.
    Status(StatusReport),
    /// A configuration update changed this many fields.
    ConfigChanged(usize),
}

/// Seconds since an event, rendered with an adaptive unit.
///
/// Seconds roll up to minutes from 120, minutes to hours from 120 and
/// hours to days from 48.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Elapsed(pub u64);

impl Elapsed {
    /// Scaled value and unit suffix.
    pub fn scaled(self) -> (u64, char) {
        let mut value = self.0;
        let mut unit = 's';
        if value >= 120 {
            value /= 60;
            unit = 'm';
            if value >= 120 {
                value /= 60;
                unit = 'h';
                if value >= 48 {
                    value /= 24;
                    unit = 'd';
                }
            }
        }
        (value, unit)
    }
}

impl fmt::Display for Elapsed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (value, unit) = self.scaled();
        write!(f, "{value}{unit}")
    }
}

/// Snapshot published with every scan.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StatusReport {
    /// Current door state.
    pub state: DoorState,
    /// Time since the last state-affecting event.
    pub elapsed: Elapsed,
    /// Last sensor reading in percent.
    pub sensor: u8,
    /// Network signal strength in dBm.
    pub signal: i8,
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "status={}|time={}|sensor={}|signal={}",
            self.state, self.elapsed, self.sensor, self.signal
        )
    }
}
