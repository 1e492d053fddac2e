//! JSON ingestion implementation.
//!
//! Supported inputs:
//! - A single JSON object: `{"a":1}` (one record, e.g. a remote API response)
//! - A JSON array of objects: `[{"a":1}, {"a":2}]`
//! - Newline-delimited JSON (NDJSON): `{"a":1}\n{"a":2}\n`
//!
//! Nested objects are flattened into dot-path columns (e.g. `main.temp`), so mappings can address
//! nested and top-level fields the same way.

use std::fs;
use std::path::Path;

use crate::error::{IngestionError, IngestionResult};
use crate::types::{RecordSet, Value};

/// Ingest a JSON file into an in-memory [`RecordSet`].
pub fn ingest_json_from_path(path: impl AsRef<Path>) -> IngestionResult<RecordSet> {
    let text = fs::read_to_string(path)?;
    ingest_json_from_str(&text)
}

/// Ingest JSON from an in-memory string into a [`RecordSet`].
pub fn ingest_json_from_str(input: &str) -> IngestionResult<RecordSet> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(IngestionError::Malformed {
            message: "json input is empty".to_string(),
        });
    }

    // First try parsing as a single JSON value (array or object).
    match serde_json::from_str::<serde_json::Value>(trimmed) {
        Ok(v) => ingest_json_value(v),
        Err(first_err) => {
            // Fall back to NDJSON; a single-line document keeps the original parse error.
            if !trimmed.contains('\n') {
                return Err(first_err.into());
            }
            let mut values = Vec::new();
            for (i, line) in trimmed.lines().enumerate() {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let v = serde_json::from_str::<serde_json::Value>(line).map_err(|e| {
                    IngestionError::Malformed {
                        message: format!("invalid ndjson at line {}: {}", i + 1, e),
                    }
                })?;
                values.push(v);
            }
            ingest_json_values(values)
        }
    }
}

/// Flatten an already-parsed JSON document (object or array of objects).
pub fn ingest_json_value(v: serde_json::Value) -> IngestionResult<RecordSet> {
    match v {
        serde_json::Value::Array(items) => ingest_json_values(items),
        serde_json::Value::Object(_) => ingest_json_values(vec![v]),
        _ => Err(IngestionError::Malformed {
            message: "json must be an object, an array of objects, or NDJSON".to_string(),
        }),
    }
}

fn ingest_json_values(values: Vec<serde_json::Value>) -> IngestionResult<RecordSet> {
    let mut records: Vec<Vec<(String, Value)>> = Vec::with_capacity(values.len());

    for (idx0, v) in values.into_iter().enumerate() {
        let row_num = idx0 + 1;
        let serde_json::Value::Object(obj) = v else {
            return Err(IngestionError::Malformed {
                message: format!("row {row_num} is not a json object"),
            });
        };

        let mut fields = Vec::new();
        flatten_object(None, obj, &mut fields);
        records.push(fields);
    }

    Ok(RecordSet::from_records(records))
}

fn flatten_object(
    prefix: Option<&str>,
    obj: serde_json::Map<String, serde_json::Value>,
    out: &mut Vec<(String, Value)>,
) {
    for (key, value) in obj {
        let path = match prefix {
            Some(p) => format!("{p}.{key}"),
            None => key,
        };
        match value {
            serde_json::Value::Object(nested) if !nested.is_empty() => {
                flatten_object(Some(&path), nested, out);
            }
            other => out.push((path, convert_json_value(other))),
        }
    }
}

fn convert_json_value(v: serde_json::Value) -> Value {
    match v {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(b),
        serde_json::Value::String(s) => Value::Utf8(s),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Value::Int64(i),
            None => n.as_f64().map(Value::Float64).unwrap_or(Value::Null),
        },
        other => Value::Json(other),
    }
}
