//! MongoDB implementation of the store traits

use async_trait::async_trait;
use bson::doc;
use futures_util::TryStreamExt;
use mongodb::{Client, Database};
use serde_json::Value;
use tracing::{debug, info};

use super::document::{from_bson_document, normalize_bson, to_bson_document, Document};
use super::store::{DocumentStore, StoreConnector, StoreError};

/// Database used when neither configuration nor the URI names one
const FALLBACK_DB: &str = "test";

/// Opens MongoDB connections
#[derive(Debug, Clone)]
pub struct MongoConnector {
    db_name: Option<String>,
    timeout_ms: u64,
}

impl MongoConnector {
    pub fn new(db_name: Option<String>, timeout_ms: u64) -> Self {
        Self { db_name, timeout_ms }
    }

    /// Append driver timeouts so an unreachable server fails fast
    fn with_timeouts(&self, uri: &str) -> String {
        let params = format!(
            "serverSelectionTimeoutMS={ms}&connectTimeoutMS={ms}",
            ms = self.timeout_ms
        );
        if uri.contains('?') {
            format!("{}&{}", uri, params)
        } else if uri.ends_with('/') || has_path(uri) {
            format!("{}?{}", uri, params)
        } else {
            format!("{}/?{}", uri, params)
        }
    }
}

/// Whether the URI already has a `/database` path after the host list
fn has_path(uri: &str) -> bool {
    uri.split_once("://")
        .map(|(_, rest)| rest.contains('/'))
        .unwrap_or(false)
}

#[async_trait]
impl StoreConnector for MongoConnector {
    async fn connect(&self, uri: &str) -> Result<Box<dyn DocumentStore>, StoreError> {
        let client = Client::with_uri_str(self.with_timeouts(uri)).await?;

        let database = match &self.db_name {
            Some(name) => client.database(name),
            None => client
                .default_database()
                .unwrap_or_else(|| client.database(FALLBACK_DB)),
        };

        // Client construction is lazy; ping so a bad host fails here
        if let Err(e) = database.run_command(doc! { "ping": 1 }).await {
            client.shutdown().await;
            return Err(e.into());
        }

        info!("Connected to MongoDB database '{}'", database.name());

        Ok(Box::new(MongoStore { client, database }))
    }
}

/// One open MongoDB client bound to a database
#[derive(Debug, Clone)]
pub struct MongoStore {
    client: Client,
    database: Database,
}

#[async_trait]
impl DocumentStore for MongoStore {
    async fn list_collections(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.database.list_collection_names().await?)
    }

    async fn find_all(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        let cursor = self
            .database
            .collection::<bson::Document>(collection)
            .find(doc! {})
            .await?;

        let raw: Vec<bson::Document> = cursor.try_collect().await?;
        debug!(collection, count = raw.len(), "Fetched documents");

        Ok(raw.into_iter().map(from_bson_document).collect())
    }

    async fn insert_one(&self, collection: &str, document: Document) -> Result<Value, StoreError> {
        let bson_doc = to_bson_document(&document)?;

        let result = self
            .database
            .collection::<bson::Document>(collection)
            .insert_one(bson_doc)
            .await?;

        Ok(normalize_bson(result.inserted_id))
    }

    async fn close(&self) -> Result<(), StoreError> {
        self.client.clone().shutdown().await;
        Ok(())
    }
}
