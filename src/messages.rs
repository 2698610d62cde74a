//! Shared message types for HTTP/MQTT communication.
//!
//! These types are `no_std` compatible and can be deserialized using either
//! `serde_json` (desktop) or `serde-json-core` (embedded).
//!
//! # Example
//!
//! ```
//! use rs_garage::messages::StateRequest;
//! use rs_garage::DoorRequest;
//!
//! let req = StateRequest::new("close");
//! assert_eq!(req.request(), Ok(DoorRequest::Close));
//! ```

use heapless::String as HString;
use serde::{Deserialize, Serialize};

use crate::door::DoorRequest;
use crate::error::DoorError;

/// Longest accepted state name.
pub const MAX_STATE_NAME: usize = 16;

/// Request to move the door.
///
/// # JSON Examples
///
/// ```json
/// {"state": "open"}
/// {"state": "close"}
/// {"state": "stop"}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateRequest {
    /// Requested state name, matched exactly.
    pub state: HString<MAX_STATE_NAME>,
}

impl StateRequest {
    /// Create a request, truncating names that are too long.
    pub fn new(state: &str) -> Self {
        let mut name = HString::new();
        for c in state.chars() {
            if name.push(c).is_err() {
                break;
            }
        }
        Self { state: name }
    }

    /// Parse the state name into a [`DoorRequest`].
    pub fn request(&self) -> Result<DoorRequest, DoorError> {
        self.state.parse()
    }
}

/// Parse a state request from JSON bytes.
///
/// Works in both `std` and `no_std` environments using `serde-json-core`.
///
/// # Example
///
/// ```
/// use rs_garage::messages::parse_state_request;
///
/// let req = parse_state_request(br#"{"state": "open"}"#).unwrap();
/// assert_eq!(req.state.as_str(), "open");
///
/// assert!(parse_state_request(br#"{"speed": 1}"#).is_none());
/// ```
#[cfg(feature = "serde-json-core")]
pub fn parse_state_request(json: &[u8]) -> Option<StateRequest> {
    serde_json_core::from_slice(json).ok().map(|(req, _)| req)
}
