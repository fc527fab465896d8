//! Schema-less document model
//!
//! A document is an ordered string-keyed map of `serde_json::Value`, the
//! closed union {Null, Bool, Number, String, Array, Object}. Key order is
//! the order the store returned (serde_json `preserve_order`).
//!
//! BSON-only types are flattened to the plain JSON a browser expects:
//! ObjectIds become hex strings and dates become RFC 3339 strings. Anything
//! else falls back to relaxed extended JSON.

use bson::Bson;
use serde_json::Value;

use super::store::StoreError;

/// A single schema-less document
pub type Document = serde_json::Map<String, Value>;

/// Convert one BSON value to its display JSON form
pub fn normalize_bson(value: Bson) -> Value {
    match value {
        Bson::ObjectId(oid) => Value::String(oid.to_hex()),
        Bson::DateTime(dt) => match dt.try_to_rfc3339_string() {
            Ok(s) => Value::String(s),
            Err(_) => Bson::DateTime(dt).into_relaxed_extjson(),
        },
        Bson::Document(doc) => Value::Object(from_bson_document(doc)),
        Bson::Array(items) => Value::Array(items.into_iter().map(normalize_bson).collect()),
        other => other.into_relaxed_extjson(),
    }
}

/// Convert a BSON document, keeping field order
pub fn from_bson_document(doc: bson::Document) -> Document {
    doc.into_iter()
        .map(|(key, value)| (key, normalize_bson(value)))
        .collect()
}

/// Convert a JSON document into BSON for insertion
pub fn to_bson_document(doc: &Document) -> Result<bson::Document, StoreError> {
    Ok(bson::to_document(doc)?)
}
