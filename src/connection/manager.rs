//! Shared browse connection
//!
//! State machine:
//!
//! ```text
//! Disconnected --connect ok--> Connected(uri)
//! Connected    --connect-----> Disconnected (old handle closed)
//!                              --open + list ok--> Connected(new uri)
//!                              --any failure-----> Disconnected
//! ```
//!
//! `connect` holds the write guard from closing the old handle until the new
//! one is stored, so connects are serialized and a reader never sees a
//! closed handle. Reads share the read guard and run concurrently.
//!
//! The swap itself runs on a spawned task: a caller that goes away mid-connect
//! cannot leave a freshly opened handle unclosed and unstored.

use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use super::personal::PersonalDb;
use super::redact_uri;
use crate::db::{Document, DocumentStore, StoreConnector};
use crate::types::{CollectionName, Result, ViewerError};

/// Observable connection state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ConnectionState {
    Disconnected,
    /// A connect currently holds the write guard
    Connecting,
    Connected { uri: String },
}

struct ActiveConnection {
    uri: String,
    store: Box<dyn DocumentStore>,
}

/// Owner of the single shared store connection
pub struct ConnectionManager {
    connector: Arc<dyn StoreConnector>,
    default_uri: String,
    active: Arc<RwLock<Option<ActiveConnection>>>,
    personal: PersonalDb,
}

impl ConnectionManager {
    pub fn new(
        connector: Arc<dyn StoreConnector>,
        default_uri: impl Into<String>,
        personal: PersonalDb,
    ) -> Self {
        Self {
            connector,
            default_uri: default_uri.into(),
            active: Arc::new(RwLock::new(None)),
            personal,
        }
    }

    /// Replace the shared connection with one to `uri`
    ///
    /// Returns the collection names in the order the store reports them.
    pub async fn connect(&self, uri: &str) -> Result<Vec<String>> {
        let connector = Arc::clone(&self.connector);
        let active = Arc::clone(&self.active);
        let uri = uri.to_string();
        tokio::spawn(async move { swap_connection(connector, active, uri).await })
            .await
            .map_err(|e| {
                error!(operation = "connect", "Connect task failed: {}", e);
                ViewerError::Internal(format!("connect task failed: {}", e))
            })?
    }

    /// Connect to `uri`, or to the default URI when none (or a blank one) is given
    pub async fn connect_or_default(&self, uri: Option<&str>) -> Result<Vec<String>> {
        match uri.map(str::trim).filter(|u| !u.is_empty()) {
            Some(uri) => self.connect(uri).await,
            None => self.connect(&self.default_uri).await,
        }
    }

    /// Every document in `name`, unfiltered
    pub async fn fetch_collection(&self, name: &CollectionName) -> Result<Vec<Document>> {
        let active = self.active.read().await;
        let Some(connection) = active.as_ref() else {
            warn!(operation = "fetch", collection = %name, "Rejected: not connected");
            return Err(ViewerError::NotConnected);
        };

        connection.store.find_all(name.as_str()).await.map_err(|e| {
            error!(operation = "fetch", collection = %name, "Fetch failed: {}", e);
            ViewerError::Fetch(e)
        })
    }

    /// Insert into the dedicated personal database
    ///
    /// The shared connection is not touched.
    pub async fn insert_into(&self, name: &CollectionName, document: Document) -> Result<Value> {
        self.personal.insert_one(name, document).await
    }

    /// Current state, without waiting on an in-flight connect
    pub fn state(&self) -> ConnectionState {
        let Ok(active) = self.active.try_read() else {
            return ConnectionState::Connecting;
        };
        match active.as_ref() {
            Some(connection) => ConnectionState::Connected {
                uri: connection.uri.clone(),
            },
            None => ConnectionState::Disconnected,
        }
    }

    pub fn personal_db_configured(&self) -> bool {
        self.personal.is_configured()
    }

    pub async fn is_connected(&self) -> bool {
        self.active.read().await.is_some()
    }

    /// Close the shared connection, if any
    pub async fn shutdown(&self) {
        if let Some(previous) = self.active.write().await.take() {
            info!("Closing connection to {}", redact_uri(&previous.uri));
            if let Err(e) = previous.store.close().await {
                warn!(operation = "shutdown", "Failed to close connection: {}", e);
            }
        }
    }
}

async fn swap_connection(
    connector: Arc<dyn StoreConnector>,
    active: Arc<RwLock<Option<ActiveConnection>>>,
    uri: String,
) -> Result<Vec<String>> {
    let mut active = active.write().await;

    if let Some(previous) = active.take() {
        info!("Closing connection to {}", redact_uri(&previous.uri));
        if let Err(e) = previous.store.close().await {
            warn!(
                operation = "connect",
                "Failed to close previous connection to {}: {}",
                redact_uri(&previous.uri),
                e
            );
        }
    }

    info!("Connecting to {}", redact_uri(&uri));
    let store = connector.connect(&uri).await.map_err(|e| {
        error!(operation = "connect", "Connection to {} failed: {}", redact_uri(&uri), e);
        ViewerError::Connection(e)
    })?;

    let collections = match store.list_collections().await {
        Ok(names) => names,
        Err(e) => {
            error!(operation = "connect", "Listing collections failed: {}", e);
            if let Err(close_err) = store.close().await {
                warn!("Failed to close rejected connection: {}", close_err);
            }
            return Err(ViewerError::Connection(e));
        }
    };

    info!(
        "Connected to {} ({} collections)",
        redact_uri(&uri),
        collections.len()
    );
    *active = Some(ActiveConnection { uri, store });

    Ok(collections)
}
