//! HTTP routes for Mongo Viewer
//!
//! Handlers take already-read inputs (path segment, body bytes, query) and
//! return a complete JSON response, so they can be driven without a socket.

pub mod api;
pub mod health;

use bytes::Bytes;
use http_body_util::Full;
use hyper::header::{HeaderValue, ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_TYPE};
use hyper::{Response, StatusCode};
use serde::Serialize;
use tracing::{error, warn};

use crate::types::ViewerError;

pub use api::{handle_connect, handle_fetch, handle_insert, handle_table};
pub use health::{health_check, server_up};

/// JSON response with CORS header
pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<Full<Bytes>> {
    let (status, bytes) = match serde_json::to_vec(body) {
        Ok(bytes) => (status, bytes),
        Err(e) => {
            error!("Failed to serialize response: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                br#"{"error":"Internal serialization error"}"#.to_vec(),
            )
        }
    };

    let mut response = Response::new(Full::new(Bytes::from(bytes)));
    *response.status_mut() = status;
    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    response
}

/// `{ "error": message }` with the status the error maps to
///
/// The full error, cause included, is logged; the body only carries the
/// public message.
pub fn error_response(err: ViewerError) -> Response<Full<Bytes>> {
    warn!(operation = err.kind(), status = %err.status_code(), "Request failed: {}", err);
    let (status, message) = err.into_status_code_and_body();
    json_response(status, &serde_json::json!({ "error": message }))
}

/// Not found response
pub fn not_found_response(path: &str) -> Response<Full<Bytes>> {
    json_response(
        StatusCode::NOT_FOUND,
        &serde_json::json!({
            "error": "Not Found",
            "path": path,
        }),
    )
}
