//! Door position states and the requests that move between them.

use core::fmt;
use core::str::FromStr;

use crate::error::DoorError;

/// Position of the door as tracked by the controller.
///
/// [`DoorState::Unknown`] is only produced when parsing text that names no
/// known state; the controller itself never holds it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum DoorState {
    /// Beam tripped by the closed door.
    Closed,
    /// Motion finished in the open direction.
    Open,
    /// Travelling up.
    Opening,
    /// Travelling down.
    Closing,
    /// Halted part way.
    Stopped,
    /// Unrecognized text.
    Unknown,
}

impl DoorState {
    /// Lowercase name used in events and the status string.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Closed => "closed",
            Self::Open => "open",
            Self::Opening => "opening",
            Self::Closing => "closing",
            Self::Stopped => "stopped",
            Self::Unknown => "unknown",
        }
    }

    /// Translate a state name; `close` is accepted as an alias of `closed`.
    ///
    /// ```rust
    /// use rs_garage::DoorState;
    ///
    /// assert_eq!(DoorState::from_text("close"), DoorState::Closed);
    /// assert_eq!(DoorState::from_text("Open"), DoorState::Unknown);
    /// ```
    pub fn from_text(text: &str) -> Self {
        match text {
            "closed" | "close" => Self::Closed,
            "open" => Self::Open,
            "closing" => Self::Closing,
            "opening" => Self::Opening,
            "stopped" => Self::Stopped,
            _ => Self::Unknown,
        }
    }

    /// True while the door is moving.
    pub const fn is_moving(self) -> bool {
        matches!(self, Self::Opening | Self::Closing)
    }
}

impl fmt::Display for DoorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A remote request to move the door.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DoorRequest {
    /// Raise the door.
    Open,
    /// Lower the door.
    Close,
    /// Halt the door where it is.
    Stop,
}

impl FromStr for DoorRequest {
    type Err = DoorError;

    /// Names are matched exactly; both the verb and the target state are
    /// accepted (`open`/`opening`, `close`/`closing`/`closed`, `stop`/`stopped`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" | "opening" => Ok(Self::Open),
            "close" | "closing" | "closed" => Ok(Self::Close),
            "stop" | "stopped" => Ok(Self::Stop),
            _ => Err(DoorError::InvalidStateRequest),
        }
    }
}

impl fmt::Display for DoorRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Open => "open",
            Self::Close => "close",
            Self::Stop => "stop",
        })
    }
}
