//! Liveness endpoints
//!
//! - `/` answers `{"message":"server up"}`
//! - `/health`, `/healthz` report uptime and the shared connection state;
//!   neither waits on an in-flight connect

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use serde::Serialize;

use crate::connection::{redact_uri, ConnectionState};
use crate::server::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    /// Always true while the process is serving
    pub healthy: bool,
    /// Service version
    pub version: &'static str,
    /// Uptime in seconds
    pub uptime: u64,
    /// Current timestamp
    pub timestamp: String,
    /// Per-process identifier
    pub instance_id: String,
    /// Shared connection state, credentials masked
    pub connection: ConnectionState,
    /// Whether the insert target is configured
    #[serde(rename = "personalDbConfigured")]
    pub personal_db_configured: bool,
}

/// GET /
pub fn server_up() -> Response<Full<Bytes>> {
    super::json_response(
        StatusCode::OK,
        &serde_json::json!({ "message": "server up" }),
    )
}

/// GET /health
pub fn health_check(state: &AppState) -> Response<Full<Bytes>> {
    let connection = match state.connections.state() {
        ConnectionState::Connected { uri } => ConnectionState::Connected {
            uri: redact_uri(&uri),
        },
        other => other,
    };

    let body = HealthResponse {
        healthy: true,
        version: env!("CARGO_PKG_VERSION"),
        uptime: state.started_at.elapsed().as_secs(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        instance_id: state.instance_id.to_string(),
        connection,
        personal_db_configured: state.connections.personal_db_configured(),
    };

    super::json_response(StatusCode::OK, &body)
}
