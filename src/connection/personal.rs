//! Dedicated insert target
//!
//! Each insert opens its own connection, uses it once, and closes it before
//! returning, on success and on failure alike. The shared browse connection
//! is never involved.

use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info, warn};

use super::redact_uri;
use crate::db::{Document, StoreConnector};
use crate::types::{CollectionName, Result, ViewerError};

/// Separately configured write target
pub struct PersonalDb {
    connector: Arc<dyn StoreConnector>,
    uri: Option<String>,
}

impl PersonalDb {
    pub fn new(connector: Arc<dyn StoreConnector>, uri: Option<String>) -> Self {
        Self { connector, uri }
    }

    pub fn is_configured(&self) -> bool {
        self.uri.is_some()
    }

    /// Insert one document, returning the store-assigned id
    ///
    /// The open, insert and close run on their own task, so the connection is
    /// still closed when the caller is dropped mid-insert.
    pub async fn insert_one(&self, name: &CollectionName, document: Document) -> Result<Value> {
        let uri = self.uri.clone().ok_or_else(|| {
            error!(operation = "insert", "PERSONAL_DB_URI is not configured");
            ViewerError::Config("PERSONAL_DB_URI is not configured".to_string())
        })?;

        let connector = Arc::clone(&self.connector);
        let name = name.clone();
        tokio::spawn(async move { insert_scoped(connector, uri, name, document).await })
            .await
            .map_err(|e| {
                error!(operation = "insert", "Insert task failed: {}", e);
                ViewerError::Internal(format!("insert task failed: {}", e))
            })?
    }
}

async fn insert_scoped(
    connector: Arc<dyn StoreConnector>,
    uri: String,
    name: CollectionName,
    document: Document,
) -> Result<Value> {
    let store = connector.connect(&uri).await.map_err(|e| {
        error!(
            operation = "insert",
            "Connection to {} failed: {}",
            redact_uri(&uri),
            e
        );
        ViewerError::Insert(e)
    })?;

    let result = store.insert_one(name.as_str(), document).await;

    if let Err(e) = store.close().await {
        warn!(operation = "insert", "Failed to close insert connection: {}", e);
    }

    match result {
        Ok(id) => {
            info!(collection = %name, inserted_id = %id, "Document inserted");
            Ok(id)
        }
        Err(e) => {
            error!(operation = "insert", collection = %name, "Insert failed: {}", e);
            Err(ViewerError::Insert(e))
        }
    }
}
