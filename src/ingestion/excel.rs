#![cfg(feature = "excel")]

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};

use crate::error::{IngestionError, IngestionResult};
use crate::types::{RecordSet, Value};

/// Ingest one sheet of a workbook export (`.xlsx`, `.xls`, `.ods`, etc.) into a [`RecordSet`].
///
/// Behavior:
/// - Picks `sheet_name` if provided; otherwise uses the first sheet in the workbook
/// - Detects the first non-empty row as the header row
/// - Reads remaining rows and converts cells into [`Value`]s
pub fn ingest_excel_from_path(
    path: impl AsRef<Path>,
    sheet_name: Option<&str>,
) -> IngestionResult<RecordSet> {
    let mut workbook = open_workbook_auto(path)?;

    let sheet = match sheet_name {
        Some(name) => name.to_string(),
        None => workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| IngestionError::Malformed {
                message: "workbook has no sheets".to_string(),
            })?,
    };

    let range = workbook.worksheet_range(&sheet)?;
    ingest_sheet_range(&sheet, &range)
}

fn ingest_sheet_range(sheet: &str, range: &calamine::Range<Data>) -> IngestionResult<RecordSet> {
    let mut rows_iter = range
        .rows()
        .skip_while(|row| row.iter().all(|c| matches!(c, Data::Empty)));

    let header = rows_iter.next().ok_or_else(|| IngestionError::Malformed {
        message: format!("sheet '{sheet}' has no non-empty rows (no header row found)"),
    })?;
    let columns: Vec<String> = header
        .iter()
        .map(|c| cell_to_header_string(c).trim().to_string())
        .collect();

    let mut rows: Vec<Vec<Value>> = Vec::new();
    for row in rows_iter {
        let out_row = (0..columns.len())
            .map(|idx| convert_cell(row.get(idx).unwrap_or(&Data::Empty)))
            .collect();
        rows.push(out_row);
    }

    Ok(RecordSet::new(columns, rows))
}

fn cell_to_header_string(c: &Data) -> String {
    match c {
        Data::String(s) => s.clone(),
        Data::Float(f) if f.fract() == 0.0 => (*f as i64).to_string(),
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}

fn convert_cell(c: &Data) -> Value {
    match c {
        Data::Empty => Value::Null,
        Data::Int(i) => Value::Int64(*i),
        Data::Float(f) => Value::Float64(*f),
        Data::Bool(b) => Value::Bool(*b),
        Data::String(s) if s.trim().is_empty() => Value::Null,
        Data::String(s) => Value::Utf8(s.trim().to_string()),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(naive) => Value::Utf8(naive.format("%Y-%m-%dT%H:%M:%S").to_string()),
            None => Value::Float64(dt.as_f64()),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => Value::Utf8(s.clone()),
        Data::Error(_) => Value::Null,
    }
}
