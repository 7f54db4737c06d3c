//! Mutation-bounded batch writer.
//!
//! The target engine caps the number of mutations (row-by-column writes) one
//! transaction may carry. Rows are partitioned so that
//! `rows_per_chunk * column_count <= max_mutations`, degrading to one row
//! per chunk when a single row alone exceeds the limit, and chunks are
//! applied strictly in input order.

use serde_json::Value;

use crate::store::{GraphStore, StoreError};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BatchStats {
    pub rows: usize,
    pub batches: usize,
}

pub struct BatchWriter<'a, S: GraphStore + ?Sized> {
    store: &'a S,
    max_mutations: usize,
}

impl<'a, S: GraphStore + ?Sized> BatchWriter<'a, S> {
    pub fn new(store: &'a S, max_mutations: usize) -> Self {
        Self {
            store,
            max_mutations,
        }
    }

    /// Rows per chunk for a table with `column_count` columns, never zero.
    pub fn chunk_rows(&self, column_count: usize) -> usize {
        (self.max_mutations / column_count.max(1)).max(1)
    }

    /// Write all rows to `table` in mutation-bounded chunks.
    ///
    /// A failure applying chunk *k* aborts the remaining chunks and carries
    /// the chunk index and row range for diagnosis. No validation or
    /// deduplication happens here; upstream transforms already produced
    /// referentially-sound rows.
    pub async fn write(
        &self,
        table: &str,
        columns: &[&'static str],
        rows: &[Vec<Value>],
    ) -> Result<BatchStats, StoreError> {
        if rows.is_empty() {
            return Ok(BatchStats::default());
        }

        let chunk_rows = self.chunk_rows(columns.len());
        let total_batches = rows.len().div_ceil(chunk_rows);

        for (chunk_index, chunk) in rows.chunks(chunk_rows).enumerate() {
            let row_start = chunk_index * chunk_rows;
            let row_end = row_start + chunk.len();
            log::info!(
                "inserting batch {}/{} into `{}` (rows {}..{} of {})",
                chunk_index + 1,
                total_batches,
                table,
                row_start,
                row_end,
                rows.len()
            );

            self.store
                .apply_batch(table, columns, chunk)
                .await
                .map_err(|source| StoreError::BatchWrite {
                    table: table.to_string(),
                    chunk_index,
                    row_start,
                    row_end,
                    source: Box::new(source),
                })?;
        }

        Ok(BatchStats {
            rows: rows.len(),
            batches: total_batches,
        })
    }
}
