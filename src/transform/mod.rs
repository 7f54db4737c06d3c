//! The graph ingestion transform.
//!
//! Converts flat source tables into property-graph rows: entity tables
//! become [`Node`] rows and relationship tables become [`Edge`] rows, with
//! all non-structural columns serialized into a JSON property payload.
//! Identity assignment, referential integrity and deduplication live here;
//! writing the rows out is the store layer's job.

pub mod edges;
pub mod errors;
pub mod nodes;
pub mod properties;
pub mod registry;

pub use edges::{edges_from_rows, EdgeBatch, EndpointColumns};
pub use errors::TransformError;
pub use nodes::{nodes_from_rows, NodeBatch};
pub use registry::IdentityRegistry;

use serde_json::Value;

use crate::source::{CellValue, SourceRow};

/// A node row destined for the `graph_node` table.
///
/// `id` is globally unique across all labels for one run: it is always
/// `<label>_<source primary key>`, so a client and a transaction sharing a
/// raw numeric key can never collide.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: String,
    pub label: String,
    pub properties: String,
}

impl Node {
    pub const COLUMNS: [&'static str; 3] = ["id", "label", "properties"];

    pub fn into_values(self) -> Vec<Value> {
        vec![
            Value::String(self.id),
            Value::String(self.label),
            Value::String(self.properties),
        ]
    }
}

/// An edge row destined for the `graph_edge` table.
///
/// `edge_id` is the edge's own primary key, independent of its endpoints:
/// the same endpoint pair may carry any number of distinct relationship
/// instances (repeated transactions between the same accounts).
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub id: String,
    pub dest_id: String,
    pub label: String,
    pub edge_id: String,
    pub properties: String,
}

impl Edge {
    pub const COLUMNS: [&'static str; 5] = ["id", "dest_id", "label", "edge_id", "properties"];

    pub fn into_values(self) -> Vec<Value> {
        vec![
            Value::String(self.id),
            Value::String(self.dest_id),
            Value::String(self.label),
            Value::String(self.edge_id),
            Value::String(self.properties),
        ]
    }
}

/// Columns whose name ends in `id` carry identities (primary or foreign
/// keys) and are stripped from property payloads.
pub(crate) fn is_identity_column(column: &str) -> bool {
    column.ends_with("id")
}

/// The label prefix an endpoint column contributes to derived ids:
/// `client_id` -> `client`.
pub(crate) fn endpoint_prefix(column: &str) -> &str {
    column.strip_suffix("_id").unwrap_or(column)
}

/// Normalize a label the way the original tables are keyed: trimmed,
/// lowercase.
pub(crate) fn normalize_label(label: &str) -> String {
    label.trim().to_lowercase()
}

/// Coerce `is`-prefixed flag columns to booleans in place, so payloads carry
/// `true`/`false` instead of the 0/1 the exports use.
pub(crate) fn coerce_boolean_flags(row: &mut SourceRow) {
    for (column, value) in row.iter_mut() {
        if column.starts_with("is") && !matches!(value, CellValue::Bool(_)) {
            *value = CellValue::Bool(value.as_flag());
        }
    }
}
