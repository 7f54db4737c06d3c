//! Property payload serialization.
//!
//! Everything a source row carries beyond its structural columns is encoded
//! as one canonical JSON object string. Column order follows the source file
//! (the crate pins `serde_json` with `preserve_order`), which makes the
//! encoding deterministic: serializing the same row twice yields the same
//! bytes.

use std::collections::HashSet;

use serde_json::{Map, Number, Value};

use crate::source::{CellValue, SourceRow};
use crate::transform::TransformError;

/// Serialize the non-excluded columns of `row` into a JSON object string.
///
/// Non-finite numbers are rejected rather than silently emitted; a payload
/// the graph engine cannot parse later is worse than a loud failure now.
/// An empty remaining column set serializes to `{}`.
pub fn serialize_properties(
    row: &SourceRow,
    excluded: &HashSet<&str>,
) -> Result<String, TransformError> {
    let mut object = Map::new();
    for (column, value) in row {
        if excluded.contains(column.as_str()) {
            continue;
        }
        object.insert(column.clone(), encode_value(column, value)?);
    }

    // Serializing a Map<String, Value> cannot fail.
    Ok(Value::Object(object).to_string())
}

fn encode_value(column: &str, value: &CellValue) -> Result<Value, TransformError> {
    match value {
        CellValue::Null => Ok(Value::Null),
        CellValue::Bool(b) => Ok(Value::Bool(*b)),
        CellValue::Int(i) => Ok(Value::Number(Number::from(*i))),
        CellValue::Float(f) => {
            Number::from_f64(*f)
                .map(Value::Number)
                .ok_or_else(|| TransformError::PropertySerialization {
                    column: column.to_string(),
                    detail: format!("non-finite number {}", f),
                })
        }
        CellValue::Text(s) => Ok(Value::String(s.clone())),
    }
}
