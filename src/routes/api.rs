//! Browse and insert API
//!
//! - POST /api/connect - replace the shared connection, list collections
//! - GET /api/collections/{name} - all documents in a collection
//! - GET /api/collections/{name}/table - the same documents as a table
//! - POST /api/personal-db/collections/{name} - insert into the personal db

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use super::{error_response, json_response};
use crate::projection::{project_with, ColumnStrategy};
use crate::server::AppState;
use crate::types::{CollectionName, Result, ViewerError};

/// Body of POST /api/connect
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectRequest {
    /// Target URI; the configured default is used when absent
    #[serde(default)]
    pub mongo_url: Option<String>,
}

/// Query of GET /api/collections/{name}/table
#[derive(Debug, Default, Deserialize)]
pub struct TableQuery {
    #[serde(default)]
    pub columns: ColumnStrategy,
}

fn parse_connect_request(body: &[u8]) -> Result<ConnectRequest> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(ConnectRequest::default());
    }
    Ok(serde_json::from_slice(body)?)
}

fn parse_table_query(query: Option<&str>) -> Result<TableQuery> {
    serde_urlencoded::from_str(query.unwrap_or(""))
        .map_err(|e| ViewerError::BadRequest(format!("Invalid query: {}", e)))
}

/// POST /api/connect
pub async fn handle_connect(state: &AppState, body: Bytes) -> Response<Full<Bytes>> {
    let request = match parse_connect_request(&body) {
        Ok(r) => r,
        Err(e) => return error_response(e),
    };

    match state
        .connections
        .connect_or_default(request.mongo_url.as_deref())
        .await
    {
        Ok(collections) => json_response(StatusCode::OK, &json!({ "collections": collections })),
        Err(e) => error_response(e),
    }
}

/// GET /api/collections/{name}
pub async fn handle_fetch(state: &AppState, segment: &str) -> Response<Full<Bytes>> {
    let result = async {
        let name = CollectionName::from_path_segment(segment)?;
        state.connections.fetch_collection(&name).await
    }
    .await;

    match result {
        Ok(data) => json_response(StatusCode::OK, &json!({ "data": data })),
        Err(e) => error_response(e),
    }
}

/// GET /api/collections/{name}/table
pub async fn handle_table(
    state: &AppState,
    segment: &str,
    query: Option<&str>,
) -> Response<Full<Bytes>> {
    let result = async {
        let query = parse_table_query(query)?;
        let name = CollectionName::from_path_segment(segment)?;
        let docs = state.connections.fetch_collection(&name).await?;
        debug!(collection = %name, strategy = ?query.columns, "Projecting {} documents", docs.len());
        Ok::<_, ViewerError>(project_with(&docs, query.columns))
    }
    .await;

    match result {
        Ok(projection) => json_response(StatusCode::OK, &projection),
        Err(e) => error_response(e),
    }
}

/// POST /api/personal-db/collections/{name}
pub async fn handle_insert(state: &AppState, segment: &str, body: Bytes) -> Response<Full<Bytes>> {
    let result = async {
        let name = CollectionName::from_path_segment(segment)?;
        let document = match serde_json::from_slice::<Value>(&body)? {
            Value::Object(map) => map,
            _ => {
                return Err(ViewerError::BadRequest(
                    "Document must be a JSON object".to_string(),
                ))
            }
        };
        state.connections.insert_into(&name, document).await
    }
    .await;

    match result {
        Ok(inserted_id) => json_response(
            StatusCode::OK,
            &json!({
                "message": "Document inserted successfully",
                "insertedId": inserted_id,
            }),
        ),
        Err(e) => error_response(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_connect_body_uses_default() {
        let request = parse_connect_request(b"").unwrap();
        assert!(request.mongo_url.is_none());
    }

    #[test]
    fn test_connect_body_reads_mongo_url() {
        let request = parse_connect_request(br#"{"mongoUrl":"mongodb://x"}"#).unwrap();
        assert_eq!(request.mongo_url.as_deref(), Some("mongodb://x"));
    }

    #[test]
    fn test_malformed_connect_body_is_bad_request() {
        assert!(matches!(
            parse_connect_request(b"{nope"),
            Err(ViewerError::BadRequest(_))
        ));
    }

    #[test]
    fn test_table_query_defaults_to_first() {
        assert_eq!(parse_table_query(None).unwrap().columns, ColumnStrategy::First);
        assert_eq!(
            parse_table_query(Some("columns=union")).unwrap().columns,
            ColumnStrategy::Union
        );
        assert!(parse_table_query(Some("columns=sideways")).is_err());
    }
}
