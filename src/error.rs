//! Error types for door control and configuration.
//!
//! All variants are `Copy` so they can travel through the poll loop and
//! the command interface without allocation.

use core::fmt;

/// Error returned by controller commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoorError {
    /// The requested state name is not one of the accepted commands.
    InvalidStateRequest,
    /// A configuration update was rejected.
    Config(ConfigError),
    /// The relay could not be driven.
    Relay,
}

impl fmt::Display for DoorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidStateRequest => write!(f, "invalid state request"),
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Relay => write!(f, "relay output failed"),
        }
    }
}

impl From<ConfigError> for DoorError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for DoorError {}

/// Reasons a configuration update string is rejected.
///
/// Any of these rejects the whole update; no field is changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// The update string contained no assignments.
    Empty,
    /// A segment had no `=` separator.
    MissingAssignment,
    /// A segment named a field that does not exist.
    UnknownField,
    /// A value could not be parsed as a number for its field.
    InvalidValue,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty update"),
            Self::MissingAssignment => write!(f, "segment without '='"),
            Self::UnknownField => write!(f, "unknown field"),
            Self::InvalidValue => write!(f, "value is not a number"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}
