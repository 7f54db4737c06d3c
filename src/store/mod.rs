//! Target engine access.
//!
//! The loader talks to the graph engine through exactly three operations
//! (execute a schema DDL statement, run an introspection query returning
//! names, apply an all-or-nothing batch of rows) plus a row count used
//! for post-load verification. [`GraphStore`] captures that surface so the
//! pipeline and batch writer can be driven against ClickHouse in production
//! and against in-memory fakes in tests.

pub mod batch;
pub mod clickhouse;
pub mod schema;

pub use self::batch::{BatchStats, BatchWriter};
pub use self::clickhouse::ClickHouseStore;
pub use self::schema::SchemaManager;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("schema statement failed: {statement}: {source}")]
    Schema {
        statement: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("introspection query failed: {query}: {source}")]
    Query {
        query: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("insert into `{table}` failed: {source}")]
    Insert {
        table: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error(
        "batch write to `{table}` failed at chunk {chunk_index} (rows {row_start}..{row_end}): {source}"
    )]
    BatchWrite {
        table: String,
        chunk_index: usize,
        row_start: usize,
        row_end: usize,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// The write surface of the target graph engine.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Execute one DDL statement.
    async fn execute_ddl(&self, statement: &str) -> Result<(), StoreError>;

    /// Run an introspection query whose result is a single `name` column.
    async fn fetch_names(&self, query: &str) -> Result<Vec<String>, StoreError>;

    /// Apply one chunk of rows to `table` as a single atomic upsert.
    /// Column lists are the static column tables of the node/edge schema.
    async fn apply_batch(
        &self,
        table: &str,
        columns: &[&'static str],
        rows: &[Vec<Value>],
    ) -> Result<(), StoreError>;

    /// Count the rows currently in `table`.
    async fn count(&self, table: &str) -> Result<u64, StoreError>;
}
