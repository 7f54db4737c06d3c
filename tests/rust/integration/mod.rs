//! Integration tests - Drive the full pipeline against an in-memory store
//!
//! These verify the end-to-end flow (schema lifecycle, two-phase load,
//! batching, reporting) without requiring a running ClickHouse.
