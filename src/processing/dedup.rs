//! Exact-duplicate row suppression for [`crate::types::RecordSet`].

use std::collections::HashSet;

use crate::types::{RecordSet, Value};

/// Returns a new [`RecordSet`] without rows that are structurally identical to an earlier row.
///
/// Equality covers every column. The first occurrence is kept and row order is preserved.
/// Floats compare by value, so `0.0` and `-0.0` are the same cell, and every `NaN` matches every
/// other `NaN`.
pub fn dedup(records: &RecordSet) -> RecordSet {
    let mut seen: HashSet<Vec<CellKey>> = HashSet::with_capacity(records.row_count());
    records.filter_rows(|row| seen.insert(row.iter().map(CellKey::from).collect()))
}

#[derive(Debug, PartialEq, Eq, Hash)]
enum CellKey {
    Null,
    Int64(i64),
    Float64(u64),
    Bool(bool),
    Utf8(String),
    Json(String),
}

impl From<&Value> for CellKey {
    fn from(v: &Value) -> Self {
        match v {
            Value::Null => CellKey::Null,
            Value::Int64(i) => CellKey::Int64(*i),
            Value::Float64(f) => CellKey::Float64(float_key(*f)),
            Value::Bool(b) => CellKey::Bool(*b),
            Value::Utf8(s) => CellKey::Utf8(s.clone()),
            Value::Json(j) => CellKey::Json(j.to_string()),
        }
    }
}

fn float_key(f: f64) -> u64 {
    if f.is_nan() {
        f64::NAN.to_bits()
    } else if f == 0.0 {
        0.0_f64.to_bits()
    } else {
        f.to_bits()
    }
}

#[cfg(test)]
mod tests {
    use super::dedup;
    use crate::types::{RecordSet, Value};

    fn sample() -> RecordSet {
        RecordSet::new(
            vec!["city".to_string(), "temp".to_string()],
            vec![
                vec![Value::Utf8("a".to_string()), Value::Float64(1.5)],
                vec![Value::Utf8("b".to_string()), Value::Null],
                vec![Value::Utf8("a".to_string()), Value::Float64(1.5)],
                vec![Value::Utf8("b".to_string()), Value::Null],
                vec![Value::Utf8("a".to_string()), Value::Float64(2.5)],
            ],
        )
    }

    #[test]
    fn dedup_keeps_first_occurrence_in_order() {
        let out = dedup(&sample());
        assert_eq!(out.columns, sample().columns);
        assert_eq!(
            out.rows,
            vec![
                vec![Value::Utf8("a".to_string()), Value::Float64(1.5)],
                vec![Value::Utf8("b".to_string()), Value::Null],
                vec![Value::Utf8("a".to_string()), Value::Float64(2.5)],
            ]
        );
    }

    #[test]
    fn dedup_distinguishes_value_types() {
        let rs = RecordSet::new(
            vec!["v".to_string()],
            vec![
                vec![Value::Int64(1)],
                vec![Value::Float64(1.0)],
                vec![Value::Utf8("1".to_string())],
            ],
        );
        assert_eq!(dedup(&rs).row_count(), 3);
    }

    #[test]
    fn dedup_of_empty_set_is_empty() {
        assert!(dedup(&RecordSet::empty()).is_empty());
    }

    #[test]
    fn dedup_treats_signed_zeros_as_equal() {
        let rs = RecordSet::new(
            vec!["temp".to_string(), "city".to_string()],
            vec![
                vec![Value::Float64(0.0), Value::Utf8("X".to_string())],
                vec![Value::Float64(-0.0), Value::Utf8("X".to_string())],
            ],
        );
        assert_eq!(rs.rows[0], rs.rows[1]);
        assert_eq!(dedup(&rs).row_count(), 1);
    }

    #[test]
    fn dedup_collapses_nans_with_different_payloads() {
        let other_nan = f64::from_bits(f64::NAN.to_bits() | 1);
        assert!(other_nan.is_nan());
        let rs = RecordSet::new(
            vec!["temp".to_string()],
            vec![vec![Value::Float64(f64::NAN)], vec![Value::Float64(other_nan)]],
        );
        assert_eq!(dedup(&rs).row_count(), 1);
    }
}
