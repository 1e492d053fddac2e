//! CSV ingestion implementation.

use std::path::Path;

use crate::error::IngestionResult;
use crate::types::{RecordSet, Value};

/// Ingest a CSV file into an in-memory [`RecordSet`].
///
/// Rules:
///
/// - CSV must have headers; every header becomes a column.
/// - Cells are type-inferred (see [`infer_value`]).
pub fn ingest_csv_from_path(path: impl AsRef<Path>) -> IngestionResult<RecordSet> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)?;
    ingest_csv_from_reader(&mut rdr)
}

/// Ingest CSV data from an existing CSV reader.
pub fn ingest_csv_from_reader<R: std::io::Read>(
    rdr: &mut csv::Reader<R>,
) -> IngestionResult<RecordSet> {
    let headers = rdr.headers()?.clone();
    let columns: Vec<String> = headers.iter().map(|h| h.trim().to_owned()).collect();

    let mut rows: Vec<Vec<Value>> = Vec::new();
    for result in rdr.records() {
        let record = result?;

        let mut row: Vec<Value> = Vec::with_capacity(columns.len());
        for idx in 0..columns.len() {
            row.push(infer_value(record.get(idx).unwrap_or("")));
        }
        rows.push(row);
    }

    Ok(RecordSet::new(columns, rows))
}

/// Infer a [`Value`] from a raw text cell.
///
/// Empty (after trimming) is `Null`, then integer, then float, otherwise the trimmed text.
pub fn infer_value(raw: &str) -> Value {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    if let Ok(v) = trimmed.parse::<i64>() {
        return Value::Int64(v);
    }
    if let Ok(v) = trimmed.parse::<f64>() {
        return Value::Float64(v);
    }
    Value::Utf8(trimmed.to_owned())
}
