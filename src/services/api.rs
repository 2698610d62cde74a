//! API request and response types for HTTP/MQTT communication.

use serde::{Deserialize, Serialize};

use crate::controller::DoorSnapshot;
use crate::door::DoorState;
use crate::events::{Elapsed, StatusReport};

// Re-export shared request types from messages module
pub use crate::messages::StateRequest;

// ============================================================================
// Response Types
// ============================================================================

/// API response wrapper for consistent JSON structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Whether the request was successful
    pub success: bool,
    /// Response data (present when success=true)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Error message (present when success=false)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Create a successful response with data
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// Create an error response
    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Current door status response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Current door state
    pub state: DoorState,
    /// Seconds since the last state change
    pub elapsed_secs: u64,
    /// Last sensor reading in percent
    pub sensor: u8,
    /// Network signal strength in dBm
    pub signal: i8,
    /// Compact status line, as published over MQTT
    pub status: String,
    /// Relay clicks still pending
    pub relay_clicks_left: u8,
    /// Milliseconds until the motion timer expires
    pub motion_ms_left: u32,
    /// Open-timeout alert already sent this episode
    pub timeout_alert_fired: bool,
    /// Night alert already sent this episode
    pub night_alert_fired: bool,
    /// Running without a beam sensor
    pub virtual_sensor: bool,
}

impl From<&DoorSnapshot> for StatusResponse {
    fn from(snapshot: &DoorSnapshot) -> Self {
        let report = StatusReport {
            state: snapshot.state,
            elapsed: Elapsed(snapshot.elapsed_secs),
            sensor: snapshot.sensor,
            signal: snapshot.signal,
        };
        Self {
            state: snapshot.state,
            elapsed_secs: snapshot.elapsed_secs,
            sensor: snapshot.sensor,
            signal: snapshot.signal,
            status: report.to_string(),
            relay_clicks_left: snapshot.relay_clicks_left,
            motion_ms_left: snapshot.motion_ms_left,
            timeout_alert_fired: snapshot.timeout_alert_fired,
            night_alert_fired: snapshot.night_alert_fired,
            virtual_sensor: snapshot.virtual_sensor,
        }
    }
}

/// State request result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateChangeResponse {
    /// State after the request (unchanged for a no-op)
    pub state: DoorState,
}

/// Configuration response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigResponse {
    /// Active configuration string
    pub config: String,
    /// Fields changed by the update (absent for reads)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changed: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> DoorSnapshot {
        DoorSnapshot {
            state: DoorState::Open,
            elapsed_secs: 150,
            sensor: 3,
            signal: -60,
            relay_clicks_left: 0,
            motion_ms_left: 0,
            timeout_alert_fired: false,
            night_alert_fired: true,
            virtual_sensor: false,
        }
    }

    // ========================================================================
    // ApiResponse Tests
    // ========================================================================

    #[test]
    fn test_api_response_ok() {
        let response = ApiResponse::ok("test data");
        assert!(response.success);
        assert_eq!(response.data, Some("test data"));
        assert_eq!(response.error, None);
    }

    #[test]
    fn test_api_response_err() {
        let response: ApiResponse<String> = ApiResponse::err("something went wrong");
        assert!(!response.success);
        assert_eq!(response.data, None);
        assert_eq!(response.error, Some("something went wrong".to_string()));
    }

    #[test]
    fn test_api_response_serde_skips_empty_fields() {
        let json = serde_json::to_string(&ApiResponse::ok(42)).unwrap();
        assert_eq!(json, r#"{"success":true,"data":42}"#);

        let json = serde_json::to_string(&ApiResponse::<()>::err("nope")).unwrap();
        assert_eq!(json, r#"{"success":false,"error":"nope"}"#);
    }

    // ========================================================================
    // StatusResponse Tests
    // ========================================================================

    #[test]
    fn test_status_response_from_snapshot() {
        let response = StatusResponse::from(&snapshot());
        assert_eq!(response.state, DoorState::Open);
        assert_eq!(response.status, "status=open|time=2m|sensor=3|signal=-60");
        assert!(response.night_alert_fired);
    }

    #[test]
    fn test_status_response_state_serializes_lowercase() {
        let json = serde_json::to_string(&StatusResponse::from(&snapshot())).unwrap();
        assert!(json.contains(r#""state":"open""#));
        assert!(json.contains(r#""elapsed_secs":150"#));
    }

    #[test]
    fn test_config_response_omits_changed_on_read() {
        let response = ConfigResponse {
            config: "ver=1.4".into(),
            changed: None,
        };
        let json = serde_json::to_string(&response).unwrap();
        assert_eq!(json, r#"{"config":"ver=1.4"}"#);
    }
}
