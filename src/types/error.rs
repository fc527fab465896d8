//! Error types for Mongo Viewer
//!
//! Every failure a route can surface is one of these variants. Display carries
//! the driver cause for logs; response bodies carry a fixed message instead,
//! since driver text can echo hosts and URIs.

use hyper::StatusCode;

use crate::db::StoreError;

/// Main error type for Mongo Viewer operations
#[derive(Debug, thiserror::Error)]
pub enum ViewerError {
    /// Opening, listing, or closing the shared browse connection failed
    #[error("Failed to connect to MongoDB: {0}")]
    Connection(#[source] StoreError),

    /// A read was attempted with no active browse connection
    #[error("Not connected to MongoDB")]
    NotConnected,

    /// Reading a collection over the established connection failed
    #[error("Failed to fetch collection data: {0}")]
    Fetch(#[source] StoreError),

    /// Required configuration for the insert target is missing
    #[error("Configuration error: {0}")]
    Config(String),

    /// Writing to the dedicated insert target failed
    #[error("Failed to insert document: {0}")]
    Insert(#[source] StoreError),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ViewerError {
    /// Convert error to HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotConnected => StatusCode::BAD_REQUEST,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Connection(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Fetch(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Insert(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short operation label used in log lines
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Connection(_) => "connection",
            Self::NotConnected => "not_connected",
            Self::Fetch(_) => "fetch",
            Self::Config(_) => "config",
            Self::Insert(_) => "insert",
            Self::BadRequest(_) => "bad_request",
            Self::Internal(_) => "internal",
        }
    }

    /// Message safe to return to a client
    pub fn public_message(&self) -> String {
        match self {
            Self::Connection(_) => "Failed to connect to MongoDB".to_string(),
            Self::Fetch(_) => "Failed to fetch collection data".to_string(),
            Self::Insert(_) => "Failed to insert document".to_string(),
            Self::Internal(_) => "Internal server error".to_string(),
            Self::NotConnected | Self::Config(_) | Self::BadRequest(_) => self.to_string(),
        }
    }

    /// Convert to status code and body tuple for HTTP response
    pub fn into_status_code_and_body(self) -> (StatusCode, String) {
        (self.status_code(), self.public_message())
    }
}

impl From<std::io::Error> for ViewerError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for ViewerError {
    fn from(err: serde_json::Error) -> Self {
        Self::BadRequest(format!("Invalid JSON: {}", err))
    }
}

impl From<hyper::Error> for ViewerError {
    fn from(err: hyper::Error) -> Self {
        Self::Internal(format!("HTTP error: {}", err))
    }
}

/// Result type alias for Mongo Viewer operations
pub type Result<T> = std::result::Result<T, ViewerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_connected_is_bad_request() {
        assert_eq!(ViewerError::NotConnected.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_store_failures_are_server_errors() {
        let err = ViewerError::Fetch(StoreError::Driver("socket closed".into()));
        let (status, body) = err.into_status_code_and_body();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, "Failed to fetch collection data");

        let err = ViewerError::Config("PERSONAL_DB_URI is not set".into());
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_driver_text_stays_out_of_body() {
        let cause = "No servers available for mongodb://admin@db.internal:27017";
        for err in [
            ViewerError::Connection(StoreError::Driver(cause.into())),
            ViewerError::Insert(StoreError::Driver(cause.into())),
            ViewerError::Internal(cause.into()),
        ] {
            assert!(err.to_string().contains("db.internal"));
            let (_, body) = err.into_status_code_and_body();
            assert!(!body.contains("db.internal"), "leaked: {}", body);
        }
    }

    #[test]
    fn test_config_message_is_kept() {
        let err = ViewerError::Config("PERSONAL_DB_URI is not configured".into());
        assert_eq!(err.kind(), "config");
        assert!(err.public_message().contains("PERSONAL_DB_URI"));
    }

    #[test]
    fn test_json_error_is_bad_request() {
        let err: ViewerError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }
}
