//! Collection name newtype

use serde::{Deserialize, Serialize};
use std::fmt;

use super::error::{Result, ViewerError};

/// Name of a collection owned by the store
///
/// The only rule enforced here is non-emptiness; the store decides
/// everything else.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CollectionName(String);

impl CollectionName {
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(ViewerError::BadRequest(
                "Collection name must not be empty".to_string(),
            ));
        }
        Ok(Self(name))
    }

    /// Decode a percent-encoded URL path segment
    pub fn from_path_segment(segment: &str) -> Result<Self> {
        let decoded = urlencoding::decode(segment).map_err(|e| {
            ViewerError::BadRequest(format!("Invalid collection name encoding: {}", e))
        })?;
        Self::new(decoded.into_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CollectionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for CollectionName {
    type Error = ViewerError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<CollectionName> for String {
    fn from(name: CollectionName) -> Self {
        name.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_name_rejected() {
        assert!(matches!(
            CollectionName::new(""),
            Err(ViewerError::BadRequest(_))
        ));
    }

    #[test]
    fn test_path_segment_is_decoded() {
        let name = CollectionName::from_path_segment("my%20stuff").unwrap();
        assert_eq!(name.as_str(), "my stuff");
    }
}
