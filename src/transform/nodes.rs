//! Entity-table-to-node transform.

use std::collections::HashSet;

use rustc_hash::FxHashSet;

use crate::source::SourceRow;
use crate::transform::properties::serialize_properties;
use crate::transform::registry::IdentityRegistry;
use crate::transform::{
    coerce_boolean_flags, is_identity_column, normalize_label, Node, TransformError,
};

/// The nodes produced from one entity table, plus what was dropped on the
/// way.
#[derive(Debug, Default)]
pub struct NodeBatch {
    pub nodes: Vec<Node>,
    pub duplicates_dropped: usize,
}

/// Convert one entity table into node rows and register their identities.
///
/// The identity column is the configured `id_column` if given, otherwise the
/// first column whose name ends in `id`. Each node id is
/// `<label>_<identity value>`; rows whose derived id is already registered
/// (duplicate source rows, or a cross-table collision) are dropped
/// first-wins and counted.
///
/// Identities are merged into the registry only once the whole table has
/// transformed cleanly: a table abandoned halfway through (bad property
/// value) must not leave ids behind that edges could later bind to.
pub fn nodes_from_rows(
    table: &str,
    label: &str,
    mut rows: Vec<SourceRow>,
    id_column: Option<&str>,
    registry: &mut IdentityRegistry,
) -> Result<NodeBatch, TransformError> {
    let label = normalize_label(label);
    if rows.is_empty() {
        return Ok(NodeBatch::default());
    }

    let identity_column = resolve_identity_column(table, &rows[0], id_column)?;

    let mut batch = NodeBatch::default();
    let mut staged: FxHashSet<String> = FxHashSet::default();

    for row in &mut rows {
        coerce_boolean_flags(row);

        let identity = row
            .get(identity_column.as_str())
            .ok_or_else(|| TransformError::MissingIdentityColumn {
                table: table.to_string(),
            })?
            .to_string();
        let id = format!("{}_{}", label, identity);

        if registry.contains(&id) || staged.contains(&id) {
            batch.duplicates_dropped += 1;
            continue;
        }

        let mut excluded: HashSet<&str> = row
            .keys()
            .map(String::as_str)
            .filter(|column| is_identity_column(column))
            .collect();
        excluded.insert(identity_column.as_str());
        excluded.insert("id");
        excluded.insert("label");

        let properties = serialize_properties(row, &excluded)?;

        staged.insert(id.clone());
        batch.nodes.push(Node {
            id,
            label: label.clone(),
            properties,
        });
    }

    registry.extend(staged);
    Ok(batch)
}

fn resolve_identity_column(
    table: &str,
    first_row: &SourceRow,
    configured: Option<&str>,
) -> Result<String, TransformError> {
    let missing = || TransformError::MissingIdentityColumn {
        table: table.to_string(),
    };

    match configured {
        Some(column) => {
            let column = crate::source::normalize_column(column);
            if first_row.contains_key(column.as_str()) {
                Ok(column)
            } else {
                Err(missing())
            }
        }
        None => first_row
            .keys()
            .find(|column| is_identity_column(column))
            .cloned()
            .ok_or_else(missing),
    }
}
