//! The mutation bound of the batch writer, checked against a recording
//! store.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;

use graphload::store::{BatchWriter, GraphStore, StoreError};

/// Records the size of every chunk it is handed.
#[derive(Default, Clone)]
struct ChunkRecorder {
    chunk_sizes: Arc<Mutex<Vec<usize>>>,
}

#[async_trait]
impl GraphStore for ChunkRecorder {
    async fn execute_ddl(&self, _statement: &str) -> Result<(), StoreError> {
        Ok(())
    }

    async fn fetch_names(&self, _query: &str) -> Result<Vec<String>, StoreError> {
        Ok(vec![])
    }

    async fn apply_batch(
        &self,
        _table: &str,
        _columns: &[&'static str],
        rows: &[Vec<Value>],
    ) -> Result<(), StoreError> {
        self.chunk_sizes.lock().unwrap().push(rows.len());
        Ok(())
    }

    async fn count(&self, _table: &str) -> Result<u64, StoreError> {
        Ok(0)
    }
}

const TEN_COLUMNS: [&str; 10] = [
    "c0", "c1", "c2", "c3", "c4", "c5", "c6", "c7", "c8", "c9",
];

fn rows(count: usize, columns: usize) -> Vec<Vec<Value>> {
    (0..count)
        .map(|i| (0..columns).map(|_| Value::from(i as i64)).collect())
        .collect()
}

// The production limit scaled down ten-fold: 2500 ten-column rows at a limit
// of 800 mutations split into 80-row chunks, 32 batches in all
// (ceil(2500 / 80) = 32), the same shape as 250k rows at the real 80000
// limit.
#[tokio::test]
async fn partitions_into_mutation_bounded_batches() {
    let store = ChunkRecorder::default();
    let writer = BatchWriter::new(&store, 800);

    let stats = writer
        .write("graph_node", &TEN_COLUMNS, &rows(2500, 10))
        .await
        .unwrap();

    assert_eq!(stats.rows, 2500);
    assert_eq!(stats.batches, 32);

    let sizes = store.chunk_sizes.lock().unwrap();
    assert_eq!(sizes.len(), 32);
    assert_eq!(sizes.iter().sum::<usize>(), 2500);
    for size in sizes.iter() {
        assert!(
            size * TEN_COLUMNS.len() <= 800,
            "chunk of {} rows breaks the mutation bound",
            size
        );
    }
    // 2500 = 31 * 80 + 20.
    assert!(sizes[..31].iter().all(|&s| s == 80));
    assert_eq!(sizes[31], 20);
}

#[tokio::test]
async fn degrades_to_single_row_batches() {
    let store = ChunkRecorder::default();
    // One 10-column row already exceeds a limit of 4 mutations.
    let writer = BatchWriter::new(&store, 4);

    let stats = writer
        .write("graph_node", &TEN_COLUMNS, &rows(3, 10))
        .await
        .unwrap();

    assert_eq!(stats.batches, 3);
    assert_eq!(*store.chunk_sizes.lock().unwrap(), vec![1, 1, 1]);
}
