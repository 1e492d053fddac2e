//! Core data model types.
//!
//! Source adapters produce a [`RecordSet`] (the generic, source-agnostic tabular form). The
//! normalizer turns it into [`CanonicalWeatherRecord`]s according to a [`SourceMapping`].

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Location used when a source has no usable location field.
pub const UNKNOWN_LOCATION: &str = "Unknown";

/// A single untyped value in a [`RecordSet`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Missing/empty value, or a field absent from this particular record.
    Null,
    /// 64-bit signed integer.
    Int64(i64),
    /// 64-bit float.
    Float64(f64),
    /// Boolean.
    Bool(bool),
    /// UTF-8 string.
    Utf8(String),
    /// Nested value that cannot be flattened into a dotted path (arrays, mostly).
    Json(serde_json::Value),
}

impl Value {
    /// Returns `true` for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Numeric view of the value.
    ///
    /// Integers and floats convert directly; strings are trimmed and parsed. Everything else
    /// (including booleans and nested values) is `None`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int64(v) => Some(*v as f64),
            Value::Float64(v) => Some(*v),
            Value::Utf8(s) => s.trim().parse::<f64>().ok(),
            Value::Null | Value::Bool(_) | Value::Json(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Int64(v) => write!(f, "{v}"),
            Value::Float64(v) => write!(f, "{v}"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Utf8(s) => f.write_str(s),
            Value::Json(v) => write!(f, "{v}"),
        }
    }
}

/// In-memory generic record set.
///
/// `columns` is the union of every field name seen across the records, in first-seen order.
/// Rows are stored as `Vec<Vec<Value>>` aligned with `columns`; a field missing from a given
/// record is [`Value::Null`] in that row.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RecordSet {
    /// Ordered column names.
    pub columns: Vec<String>,
    /// Row-major value storage.
    pub rows: Vec<Vec<Value>>,
}

impl RecordSet {
    /// Create a record set from columns and rows.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self { columns, rows }
    }

    /// An empty record set (no columns, no rows).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a record set from heterogeneous records given as `(field, value)` pairs.
    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = Vec<(String, Value)>>,
    {
        let mut columns: Vec<String> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();
        let mut sparse: Vec<Vec<(usize, Value)>> = Vec::new();

        for record in records {
            let mut cells = Vec::with_capacity(record.len());
            for (name, value) in record {
                let idx = match positions.get(&name) {
                    Some(&idx) => idx,
                    None => {
                        let idx = columns.len();
                        positions.insert(name.clone(), idx);
                        columns.push(name);
                        idx
                    }
                };
                cells.push((idx, value));
            }
            sparse.push(cells);
        }

        let width = columns.len();
        let rows = sparse
            .into_iter()
            .map(|cells| {
                let mut row = vec![Value::Null; width];
                for (idx, value) in cells {
                    row[idx] = value;
                }
                row
            })
            .collect();

        Self { columns, rows }
    }

    /// Number of rows in the record set.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` if there are no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the index of a column by name, if present.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Create a new record set containing only rows that match `predicate`.
    pub fn filter_rows<F>(&self, mut predicate: F) -> Self
    where
        F: FnMut(&[Value]) -> bool,
    {
        let rows = self
            .rows
            .iter()
            .filter(|row| predicate(row.as_slice()))
            .cloned()
            .collect();
        Self {
            columns: self.columns.clone(),
            rows,
        }
    }

    /// Create a new record set by applying `mapper` to every row.
    ///
    /// # Panics
    ///
    /// Panics if `mapper` returns a row with a different length than the column count.
    pub fn map_rows<F>(&self, mut mapper: F) -> Self
    where
        F: FnMut(&[Value]) -> Vec<Value>,
    {
        let expected_len = self.columns.len();
        let rows = self
            .rows
            .iter()
            .map(|row| {
                let out = mapper(row.as_slice());
                assert!(
                    out.len() == expected_len,
                    "mapped row length {} does not match column count {}",
                    out.len(),
                    expected_len
                );
                out
            })
            .collect();

        Self {
            columns: self.columns.clone(),
            rows,
        }
    }
}

/// Unit of a source's temperature field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TemperatureUnit {
    /// Degrees Celsius.
    #[default]
    #[serde(rename = "C", alias = "celsius")]
    Celsius,
    /// Degrees Fahrenheit.
    #[serde(rename = "F", alias = "fahrenheit")]
    Fahrenheit,
}

impl TemperatureUnit {
    /// Convert a reading in this unit to Celsius.
    pub fn to_celsius(self, value: f64) -> f64 {
        match self {
            TemperatureUnit::Celsius => value,
            TemperatureUnit::Fahrenheit => (value - 32.0) * 5.0 / 9.0,
        }
    }
}

/// Per-source description of which raw fields feed which canonical fields.
///
/// Field names may be dotted paths into flattened nested documents (e.g. `main.temp`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceMapping {
    /// Field holding the temperature reading. Mandatory.
    pub temperature: String,
    /// Unit of [`Self::temperature`].
    #[serde(default)]
    pub temperature_unit: TemperatureUnit,
    /// Field holding relative humidity.
    #[serde(default)]
    pub humidity: Option<String>,
    /// Field holding wind speed.
    #[serde(default)]
    pub wind_speed: Option<String>,
    /// Field holding the location name.
    #[serde(default)]
    pub location: Option<String>,
    /// Field holding the observation time.
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl SourceMapping {
    /// Create a mapping with only the mandatory temperature field.
    pub fn new(temperature: impl Into<String>, unit: TemperatureUnit) -> Self {
        Self {
            temperature: temperature.into(),
            temperature_unit: unit,
            humidity: None,
            wind_speed: None,
            location: None,
            timestamp: None,
        }
    }

    pub fn with_humidity(mut self, field: impl Into<String>) -> Self {
        self.humidity = Some(field.into());
        self
    }

    pub fn with_wind_speed(mut self, field: impl Into<String>) -> Self {
        self.wind_speed = Some(field.into());
        self
    }

    pub fn with_location(mut self, field: impl Into<String>) -> Self {
        self.location = Some(field.into());
        self
    }

    pub fn with_timestamp(mut self, field: impl Into<String>) -> Self {
        self.timestamp = Some(field.into());
        self
    }

    /// Every raw field name this mapping reads, mandatory first.
    pub fn mapped_fields(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.temperature.as_str()).chain(
            [
                &self.humidity,
                &self.wind_speed,
                &self.location,
                &self.timestamp,
            ]
            .into_iter()
            .filter_map(|f| f.as_deref()),
        )
    }

    /// Reject mappings with blank field names.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.temperature.trim().is_empty() {
            return Err(ConfigError::Invalid {
                message: "mapping temperature field must not be empty".to_string(),
            });
        }
        let optional = [
            ("humidity", &self.humidity),
            ("wind_speed", &self.wind_speed),
            ("location", &self.location),
            ("timestamp", &self.timestamp),
        ];
        for (name, field) in optional {
            if matches!(field, Some(f) if f.trim().is_empty()) {
                return Err(ConfigError::Invalid {
                    message: format!("mapping {name} field must not be empty when set"),
                });
            }
        }
        Ok(())
    }
}

/// The unified post-normalization weather observation.
///
/// Field order is part of the contract: serialization always emits
/// `source, timestamp, location, temperature_c, humidity, wind_speed, weather_score`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalWeatherRecord {
    /// Tag of the source this record came from.
    pub source: String,
    /// `YYYY-MM-DDTHH:MM:SSZ`, or `None` when the source value could not be parsed.
    pub timestamp: Option<String>,
    /// Location name, [`UNKNOWN_LOCATION`] when unavailable.
    pub location: String,
    /// Temperature in degrees Celsius.
    pub temperature_c: f64,
    pub humidity: Option<f64>,
    pub wind_speed: Option<f64>,
    /// `0.4*t + 0.3*h + 0.3*w` rounded to 2 decimals; `None` unless all three inputs exist.
    pub weather_score: Option<f64>,
}
