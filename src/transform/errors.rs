//! Transform error types.
//!
//! Structural errors are fatal to the table they occur in but never to
//! sibling tables; the pipeline records them per table and keeps going.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum TransformError {
    /// An entity table has no column ending in `id` to derive node
    /// identities from (or the configured identity column is absent).
    #[error("no identity column found in `{table}`")]
    MissingIdentityColumn { table: String },

    /// A relationship table does not resolve to two distinct endpoint
    /// columns.
    #[error("`{table}` needs two endpoint columns, found {found}")]
    InsufficientEndpointColumns { table: String, found: usize },

    /// A configured endpoint column is not present in the table.
    #[error("endpoint column `{column}` not present in `{table}`")]
    MissingEndpointColumn { table: String, column: String },

    /// A property value cannot be encoded as JSON (non-finite number).
    #[error("cannot encode column `{column}`: {detail}")]
    PropertySerialization { column: String, detail: String },
}
