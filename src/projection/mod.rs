//! Schema-less table projection
//!
//! Turns a batch of documents of unknown and possibly differing shape into
//! ordered column keys plus one row of display strings per document.
//!
//! ## Column discovery
//!
//! Columns come from the first document only (`ColumnStrategy::First`).
//! Keys that first appear in later documents are dropped from the table.
//! Callers that need every key ask for `ColumnStrategy::Union` explicitly;
//! the default is never widened silently.
//!
//! ## Cells
//!
//! | value            | cell                |
//! |------------------|---------------------|
//! | key absent       | `""`                |
//! | object / array   | compact JSON        |
//! | string           | the string itself   |
//! | number / bool    | JSON text           |
//! | null             | `null`              |

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

use crate::db::Document;

/// How the column set is derived
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnStrategy {
    /// Keys of the first document, in its order
    #[default]
    #[serde(alias = "first_document")]
    First,
    /// Every key in the batch, in first-seen order
    Union,
}

/// Tabular view of a document batch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Projection {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Projection {
    /// True when there is nothing to render ("no data" state)
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Project with first-document columns
pub fn project(docs: &[Document]) -> Projection {
    project_with(docs, ColumnStrategy::First)
}

/// Project with an explicit column strategy
pub fn project_with(docs: &[Document], strategy: ColumnStrategy) -> Projection {
    let columns = derive_columns(docs, strategy);

    let rows = docs
        .iter()
        .map(|doc| {
            columns
                .iter()
                .map(|key| doc.get(key).map(render_cell).unwrap_or_default())
                .collect()
        })
        .collect();

    Projection { columns, rows }
}

/// Derive the column keys once for the whole batch
pub fn derive_columns(docs: &[Document], strategy: ColumnStrategy) -> Vec<String> {
    match strategy {
        ColumnStrategy::First => docs
            .first()
            .map(|doc| doc.keys().cloned().collect())
            .unwrap_or_default(),
        ColumnStrategy::Union => {
            let mut seen: HashSet<&str> = HashSet::new();
            let mut columns: Vec<String> = Vec::new();
            for key in docs.iter().flat_map(|doc| doc.keys()) {
                if seen.insert(key.as_str()) {
                    columns.push(key.clone());
                }
            }
            columns
        }
    }
}

/// Display string for one present value
pub fn render_cell(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        // Display on Value is compact JSON
        other => other.to_string(),
    }
}
