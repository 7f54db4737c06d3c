//! Unit tests - Tests that run without ClickHouse or other external dependencies
//!
//! These cover the transform invariants (identity uniqueness, referential
//! soundness, payload determinism) and the batch partitioning bound.

mod batch_partition_tests;
mod transform_invariants_tests;
