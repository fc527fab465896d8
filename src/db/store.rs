//! Store capability traits
//!
//! A `StoreConnector` opens connections; each open connection is a boxed
//! `DocumentStore`. The manager never sees a concrete driver type.

use async_trait::async_trait;
use serde_json::Value;

use super::document::Document;

/// Failure reported by a store driver
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{0}")]
    Driver(String),

    #[error("document conversion failed: {0}")]
    Conversion(String),

    #[error("collection '{0}' not found")]
    CollectionNotFound(String),
}

impl From<mongodb::error::Error> for StoreError {
    fn from(err: mongodb::error::Error) -> Self {
        Self::Driver(err.to_string())
    }
}

impl From<bson::ser::Error> for StoreError {
    fn from(err: bson::ser::Error) -> Self {
        Self::Conversion(err.to_string())
    }
}

/// Opens connections to a document store
#[async_trait]
pub trait StoreConnector: Send + Sync {
    /// Open and verify a connection to `uri`
    async fn connect(&self, uri: &str) -> Result<Box<dyn DocumentStore>, StoreError>;
}

/// One open connection to a document store
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Collection names in the order the store reports them
    async fn list_collections(&self) -> Result<Vec<String>, StoreError>;

    /// Every document in `collection`, unfiltered
    async fn find_all(&self, collection: &str) -> Result<Vec<Document>, StoreError>;

    /// Insert one document, returning the id the store assigned
    async fn insert_one(&self, collection: &str, document: Document) -> Result<Value, StoreError>;

    /// Release the connection
    async fn close(&self) -> Result<(), StoreError>;
}
