//! Database layer for Mongo Viewer
//!
//! The store is reached only through the `StoreConnector` / `DocumentStore`
//! traits. `mongo` is the real driver, `mock` is an in-memory store used by
//! tests.

pub mod document;
pub mod mock;
pub mod mongo;
pub mod store;

pub use document::{from_bson_document, normalize_bson, to_bson_document, Document};
pub use mock::{MockConnector, MockHandle};
pub use mongo::{MongoConnector, MongoStore};
pub use store::{DocumentStore, StoreConnector, StoreError};
