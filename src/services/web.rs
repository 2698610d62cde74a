//! Axum-based HTTP server for the door controller API.
//!
//! Provides REST endpoints for:
//! - GET `/api/status` - Current door status
//! - POST `/api/state` - Request a state: `{"state": "open"}`
//! - GET `/api/config` - Active configuration string
//! - POST `/api/config` - Apply a configuration update (raw `key=value|...` body)

use std::net::SocketAddr;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use log::info;
use tower_http::cors::{Any, CorsLayer};

use crate::config::WebConfig;
use crate::error::DoorError;
use crate::messages::parse_state_request;

use super::api::{ApiResponse, ConfigResponse, StateChangeResponse, StatusResponse};
use super::shared::DoorService;

// ============================================================================
// Route Handlers
// ============================================================================

fn error_status(err: &DoorError) -> StatusCode {
    match err {
        DoorError::InvalidStateRequest | DoorError::Config(_) => StatusCode::BAD_REQUEST,
        DoorError::Relay => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// GET /api/status - Returns current door status
async fn get_status<D: DoorService + Clone + 'static>(
    State(door): State<D>,
) -> Json<ApiResponse<StatusResponse>> {
    let snapshot = door.snapshot();
    Json(ApiResponse::ok(StatusResponse::from(&snapshot)))
}

/// POST /api/state - Request a door state
///
/// Accepts JSON: `{"state": "open"}`, `{"state": "close"}` or `{"state": "stop"}`.
/// Uses the same `serde-json-core` parser as the ESP32 build.
async fn set_state<D: DoorService + Clone + 'static>(
    State(door): State<D>,
    body: Bytes,
) -> impl IntoResponse {
    let Some(req) = parse_state_request(&body) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::err("Invalid state request")),
        );
    };

    match door.request_state(req.state.as_str()) {
        Ok(state) => (
            StatusCode::OK,
            Json(ApiResponse::ok(StateChangeResponse { state })),
        ),
        Err(e) => (error_status(&e), Json(ApiResponse::err(e.to_string()))),
    }
}

/// GET /api/config - Returns the active configuration string
async fn get_config<D: DoorService + Clone + 'static>(
    State(door): State<D>,
) -> Json<ApiResponse<ConfigResponse>> {
    Json(ApiResponse::ok(ConfigResponse {
        config: door.config_string(),
        changed: None,
    }))
}

/// POST /api/config - Apply a `key=value|...` update
async fn set_config<D: DoorService + Clone + 'static>(
    State(door): State<D>,
    body: Bytes,
) -> impl IntoResponse {
    let Ok(update) = std::str::from_utf8(&body) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::err("Config update must be UTF-8 text")),
        );
    };

    match door.update_config(update.trim()) {
        Ok(changed) => (
            StatusCode::OK,
            Json(ApiResponse::ok(ConfigResponse {
                config: door.config_string(),
                changed: Some(changed),
            })),
        ),
        Err(e) => (error_status(&e), Json(ApiResponse::err(e.to_string()))),
    }
}

/// Fallback handler for 404
async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ApiResponse::<()>::err("Not found")),
    )
}

// ============================================================================
// Server Builder
// ============================================================================

/// Configuration for the web server
#[derive(Debug, Clone)]
pub struct WebServerConfig {
    /// Address to bind to
    pub addr: SocketAddr,
    /// Whether to enable CORS for all origins
    pub cors_permissive: bool,
}

impl Default for WebServerConfig {
    fn default() -> Self {
        Self::from_config(&WebConfig::default())
    }
}

impl WebServerConfig {
    /// Create a new config with the given address
    pub fn new(addr: impl Into<SocketAddr>) -> Self {
        Self {
            addr: addr.into(),
            ..Default::default()
        }
    }

    /// Set whether CORS should be permissive
    pub fn cors(mut self, permissive: bool) -> Self {
        self.cors_permissive = permissive;
        self
    }

    /// Create from shared WebConfig
    pub fn from_config(config: &WebConfig) -> Self {
        Self {
            addr: ([0, 0, 0, 0], config.port).into(),
            cors_permissive: config.cors_permissive,
        }
    }
}

/// Build the Axum router with all routes
pub fn build_router<D>(door: D, config: &WebServerConfig) -> Router
where
    D: DoorService + Clone + 'static,
{
    let mut router = Router::new()
        .route("/api/status", get(get_status::<D>))
        .route("/api/state", axum::routing::post(set_state::<D>))
        .route("/api/config", get(get_config::<D>).post(set_config::<D>))
        .fallback(not_found)
        .with_state(door);

    // Add CORS if requested
    if config.cors_permissive {
        router = router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );
    }

    router
}

/// Start the web server with shared state
///
/// This function runs until the server is shut down. Share the same
/// service handle with the MQTT bridge and the poll loop.
///
/// # Example
///
/// ```ignore
/// let state = Arc::new(SharedDoorState::new(controller, SystemClock::new()));
/// run_server(Arc::clone(&state), WebServerConfig::default()).await?;
/// ```
pub async fn run_server<D>(door: D, config: WebServerConfig) -> Result<(), std::io::Error>
where
    D: DoorService + Clone + 'static,
{
    let router = build_router(door, &config);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    info!("web server listening on http://{}", config.addr);

    axum::serve(listener, router).await
}
