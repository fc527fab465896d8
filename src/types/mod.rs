//! Shared types for Mongo Viewer

pub mod collection;
pub mod error;

pub use collection::CollectionName;
pub use error::{Result, ViewerError};
