//! Normalization of generic record sets into [`CanonicalWeatherRecord`]s.
//!
//! Per record, in order:
//!
//! 1. exact duplicates are dropped ([`crate::processing::dedup`])
//! 2. nulls in columns the mapping does not read become `"N/A"` ([`crate::processing::fill_nulls`])
//! 3. temperature is parsed (mandatory) and converted to Celsius
//! 4. humidity and wind speed are parsed when mapped and present, else `None`
//! 5. location falls back to [`UNKNOWN_LOCATION`]
//! 6. timestamp is parsed leniently, or defaults to the run instant
//! 7. the weather score is computed, degrading to `None` on any failure
//! 8. the source tag is attached
//!
//! Only step 3 can fail, and its failure aborts the whole source.

use chrono::{DateTime, Utc};

use crate::error::NormalizeError;
use crate::processing::{dedup, fill_nulls, MISSING_SENTINEL};
use crate::timestamp;
use crate::types::{CanonicalWeatherRecord, RecordSet, SourceMapping, Value, UNKNOWN_LOCATION};

const TEMPERATURE_WEIGHT: f64 = 0.4;
const HUMIDITY_WEIGHT: f64 = 0.3;
const WIND_WEIGHT: f64 = 0.3;

/// Normalize `records` from the source tagged `source_tag`, using the current UTC time as the
/// default timestamp.
///
/// # Examples
///
/// ```rust
/// use weather_etl::normalize::normalize;
/// use weather_etl::types::{RecordSet, SourceMapping, TemperatureUnit, Value};
///
/// let rs = RecordSet::new(
///     vec!["temp_f".into(), "humidity".into(), "wind".into(), "city".into()],
///     vec![vec![Value::Int64(212), Value::Int64(50), Value::Int64(10), Value::Utf8("X".into())]],
/// );
/// let mapping = SourceMapping::new("temp_f", TemperatureUnit::Fahrenheit)
///     .with_humidity("humidity")
///     .with_wind_speed("wind")
///     .with_location("city");
///
/// let out = normalize(&rs, "CSV", &mapping).unwrap();
/// assert_eq!(out[0].temperature_c, 100.0);
/// assert_eq!(out[0].weather_score, Some(58.0));
/// ```
pub fn normalize(
    records: &RecordSet,
    source_tag: &str,
    mapping: &SourceMapping,
) -> Result<Vec<CanonicalWeatherRecord>, NormalizeError> {
    normalize_at(records, source_tag, mapping, Utc::now())
}

/// Like [`normalize`], with the run instant supplied by the caller.
pub fn normalize_at(
    records: &RecordSet,
    source_tag: &str,
    mapping: &SourceMapping,
    now: DateTime<Utc>,
) -> Result<Vec<CanonicalWeatherRecord>, NormalizeError> {
    let unique = dedup(records);
    let sentinel = Value::Utf8(MISSING_SENTINEL.to_string());
    let filled = fill_nulls(&unique, &sentinel, mapping.mapped_fields());

    let cols = MappedColumns::resolve(&filled, mapping);
    let run_timestamp = timestamp::format_canonical(now);

    filled
        .rows
        .iter()
        .enumerate()
        .map(|(idx0, row)| -> Result<CanonicalWeatherRecord, NormalizeError> {
            let cell = |col: Option<usize>| col.and_then(|i| row.get(i)).filter(|v| !v.is_null());

            let temperature_c = parse_temperature(idx0 + 1, mapping, cell(cols.temperature))?;
            let humidity = cell(cols.humidity).and_then(finite_f64);
            let wind_speed = cell(cols.wind_speed).and_then(finite_f64);

            let location = cell(cols.location)
                .map(|v| v.to_string())
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| UNKNOWN_LOCATION.to_string());

            let timestamp = match cell(cols.timestamp) {
                Some(v) => timestamp::parse_lenient(v).map(timestamp::format_canonical),
                None => Some(run_timestamp.clone()),
            };

            Ok(CanonicalWeatherRecord {
                source: source_tag.to_string(),
                timestamp,
                location,
                temperature_c,
                humidity,
                wind_speed,
                weather_score: weather_score(temperature_c, humidity, wind_speed),
            })
        })
        .collect()
}

/// Composite score `0.4*t + 0.3*h + 0.3*w`, rounded to 2 decimals.
///
/// `None` unless both humidity and wind speed are present and the result is finite.
pub fn weather_score(temperature_c: f64, humidity: Option<f64>, wind_speed: Option<f64>) -> Option<f64> {
    compute_score(temperature_c, humidity, wind_speed).ok()
}

#[derive(Debug)]
enum ScoreError {
    MissingInput,
    NonFinite,
}

fn compute_score(temperature_c: f64, humidity: Option<f64>, wind_speed: Option<f64>) -> Result<f64, ScoreError> {
    let humidity = humidity.ok_or(ScoreError::MissingInput)?;
    let wind_speed = wind_speed.ok_or(ScoreError::MissingInput)?;
    let raw = TEMPERATURE_WEIGHT * temperature_c + HUMIDITY_WEIGHT * humidity + WIND_WEIGHT * wind_speed;
    let rounded = (raw * 100.0).round() / 100.0;
    if rounded.is_finite() {
        Ok(rounded)
    } else {
        Err(ScoreError::NonFinite)
    }
}

/// Column positions of the mapped fields; `None` when unmapped or not in the record set.
struct MappedColumns {
    temperature: Option<usize>,
    humidity: Option<usize>,
    wind_speed: Option<usize>,
    location: Option<usize>,
    timestamp: Option<usize>,
}

impl MappedColumns {
    fn resolve(records: &RecordSet, mapping: &SourceMapping) -> Self {
        let find = |field: &Option<String>| field.as_deref().and_then(|f| records.index_of(f));
        Self {
            temperature: records.index_of(&mapping.temperature),
            humidity: find(&mapping.humidity),
            wind_speed: find(&mapping.wind_speed),
            location: find(&mapping.location),
            timestamp: find(&mapping.timestamp),
        }
    }
}

fn parse_temperature(row: usize, mapping: &SourceMapping, cell: Option<&Value>) -> Result<f64, NormalizeError> {
    let field_err = |raw: String, message: &str| NormalizeError::FieldParse {
        row,
        field: mapping.temperature.clone(),
        raw,
        message: message.to_string(),
    };

    let value = cell.ok_or_else(|| field_err(String::new(), "temperature field is missing"))?;
    let reading = finite_f64(value).ok_or_else(|| field_err(value.to_string(), "expected a finite number"))?;
    Ok(mapping.temperature_unit.to_celsius(reading))
}

fn finite_f64(v: &Value) -> Option<f64> {
    v.as_f64().filter(|f| f.is_finite())
}
