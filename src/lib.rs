//! Mongo Viewer - schema-less MongoDB browser
//!
//! Holds a single shared connection to a document store and exposes its
//! collections over HTTP. Documents of any shape can be flattened into a
//! table by the projection module.
//!
//! ## Services
//!
//! - **Connection**: the one live browse connection, replaced on every connect
//! - **Personal DB**: a separately configured write target, opened per insert
//! - **Projection**: heterogeneous documents → columns and string cells
//! - **Server**: hyper HTTP/1 front end with JSON routes

pub mod config;
pub mod connection;
pub mod db;
pub mod projection;
pub mod routes;
pub mod server;
pub mod types;

pub use config::Args;
pub use connection::{ConnectionManager, ConnectionState, PersonalDb};
pub use projection::{project, ColumnStrategy, Projection};
pub use server::{run, AppState};
pub use types::{CollectionName, Result, ViewerError};
