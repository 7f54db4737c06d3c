//! Relationship-table-to-edge transform.

use std::collections::HashSet;

use rustc_hash::FxHashSet;
use uuid::Uuid;

use crate::source::SourceRow;
use crate::transform::properties::serialize_properties;
use crate::transform::registry::IdentityRegistry;
use crate::transform::{
    coerce_boolean_flags, endpoint_prefix, is_identity_column, normalize_label, Edge,
    TransformError,
};

/// Explicit endpoint mapping for a relationship table. When a field is left
/// unset the transform falls back to column-order inference: the first
/// id-suffixed column is the source role, the second the destination role.
#[derive(Debug, Clone, Default)]
pub struct EndpointColumns {
    pub source: Option<String>,
    pub dest: Option<String>,
}

/// The edges produced from one relationship table, plus what was dropped.
#[derive(Debug, Default)]
pub struct EdgeBatch {
    pub edges: Vec<Edge>,
    /// Rows whose source endpoint was never registered as a node.
    pub dangling_dropped: usize,
    /// Rows discarded by the defensive dedup on `edge_id`.
    pub duplicates_dropped: usize,
}

/// Convert one relationship table into edge rows.
///
/// Endpoint ids are `<column prefix>_<value>`. Only the source endpoint is
/// checked against the registry: destination entities may be created by a
/// later pass or legitimately reference external identifiers, so dangling
/// destinations are allowed while dangling sources are dropped and counted.
pub fn edges_from_rows(
    table: &str,
    label: &str,
    mut rows: Vec<SourceRow>,
    endpoints: &EndpointColumns,
    registry: &IdentityRegistry,
) -> Result<EdgeBatch, TransformError> {
    let label = normalize_label(label);
    if rows.is_empty() {
        return Ok(EdgeBatch::default());
    }

    let (source_column, dest_column) = resolve_endpoints(table, &rows[0], endpoints)?;
    let source_prefix = endpoint_prefix(&source_column).to_string();
    let dest_prefix = endpoint_prefix(&dest_column).to_string();

    let mut batch = EdgeBatch::default();
    let mut seen_edge_ids: FxHashSet<String> = FxHashSet::default();

    for row in &mut rows {
        coerce_boolean_flags(row);

        let source_value = row
            .get(source_column.as_str())
            .ok_or_else(|| TransformError::MissingEndpointColumn {
                table: table.to_string(),
                column: source_column.clone(),
            })?
            .to_string();
        let dest_value = row
            .get(dest_column.as_str())
            .ok_or_else(|| TransformError::MissingEndpointColumn {
                table: table.to_string(),
                column: dest_column.clone(),
            })?
            .to_string();

        let id = format!("{}_{}", source_prefix, source_value);
        let dest_id = format!("{}_{}", dest_prefix, dest_value);
        let edge_id = Uuid::new_v4().simple().to_string();

        // Defensive: a repeated token is astronomically unlikely, but a
        // duplicate primary key would poison the whole batch downstream.
        if !seen_edge_ids.insert(edge_id.clone()) {
            batch.duplicates_dropped += 1;
            continue;
        }

        if !registry.contains(&id) {
            batch.dangling_dropped += 1;
            continue;
        }

        let mut excluded: HashSet<&str> = row
            .keys()
            .map(String::as_str)
            .filter(|column| is_identity_column(column))
            .collect();
        excluded.insert(source_column.as_str());
        excluded.insert(dest_column.as_str());
        excluded.insert("id");
        excluded.insert("dest_id");
        excluded.insert("label");
        excluded.insert("edge_id");

        let properties = serialize_properties(row, &excluded)?;

        batch.edges.push(Edge {
            id,
            dest_id,
            label: label.clone(),
            edge_id,
            properties,
        });
    }

    Ok(batch)
}

fn resolve_endpoints(
    table: &str,
    first_row: &SourceRow,
    endpoints: &EndpointColumns,
) -> Result<(String, String), TransformError> {
    let candidates: Vec<&String> = first_row
        .keys()
        .filter(|column| is_identity_column(column))
        .collect();

    let check = |configured: &str| -> Result<String, TransformError> {
        let column = crate::source::normalize_column(configured);
        if first_row.contains_key(column.as_str()) {
            Ok(column)
        } else {
            Err(TransformError::MissingEndpointColumn {
                table: table.to_string(),
                column,
            })
        }
    };

    let source = match &endpoints.source {
        Some(configured) => check(configured)?,
        None => match candidates.first() {
            Some(column) => (*column).clone(),
            None => {
                return Err(TransformError::InsufficientEndpointColumns {
                    table: table.to_string(),
                    found: 0,
                })
            }
        },
    };

    let dest = match &endpoints.dest {
        Some(configured) => check(configured)?,
        None => match candidates.iter().find(|column| ***column != source) {
            Some(column) => (**column).clone(),
            None => {
                return Err(TransformError::InsufficientEndpointColumns {
                    table: table.to_string(),
                    found: candidates.len(),
                })
            }
        },
    };

    if source == dest {
        return Err(TransformError::InsufficientEndpointColumns {
            table: table.to_string(),
            found: candidates.len(),
        });
    }

    Ok((source, dest))
}
