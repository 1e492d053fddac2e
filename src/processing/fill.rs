//! Null filling for [`crate::types::RecordSet`].

use crate::types::{RecordSet, Value};

/// Sentinel written into unmapped columns that hold no value.
pub const MISSING_SENTINEL: &str = "N/A";

/// Returns a new [`RecordSet`] where every [`Value::Null`] is replaced by `fill`, except in the
/// columns named in `keep_null`.
///
/// Columns in `keep_null` keep their nulls so callers can still tell "absent" apart from data.
pub fn fill_nulls<'a, I>(records: &RecordSet, fill: &Value, keep_null: I) -> RecordSet
where
    I: IntoIterator<Item = &'a str>,
{
    let keep: Vec<usize> = keep_null
        .into_iter()
        .filter_map(|name| records.index_of(name))
        .collect();

    records.map_rows(|row| {
        row.iter()
            .enumerate()
            .map(|(idx, v)| match v {
                Value::Null if !keep.contains(&idx) => fill.clone(),
                other => other.clone(),
            })
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::{fill_nulls, MISSING_SENTINEL};
    use crate::types::{RecordSet, Value};

    #[test]
    fn fills_only_columns_not_kept() {
        let rs = RecordSet::new(
            vec!["humidity".to_string(), "station".to_string(), "note".to_string()],
            vec![
                vec![Value::Null, Value::Null, Value::Utf8("ok".to_string())],
                vec![Value::Int64(40), Value::Utf8("s1".to_string()), Value::Null],
            ],
        );
        let sentinel = Value::Utf8(MISSING_SENTINEL.to_string());
        let out = fill_nulls(&rs, &sentinel, ["humidity", "not_a_column"]);

        assert_eq!(
            out.rows,
            vec![
                vec![Value::Null, sentinel.clone(), Value::Utf8("ok".to_string())],
                vec![Value::Int64(40), Value::Utf8("s1".to_string()), sentinel.clone()],
            ]
        );
        // Original unchanged
        assert_eq!(rs.rows[0][1], Value::Null);
    }
}
