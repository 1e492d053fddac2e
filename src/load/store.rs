//! Persistent store capability and the implementations shipped with the crate.

use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::{StoreError, StoreResult};
use crate::timestamp;
use crate::types::CanonicalWeatherRecord;

/// The two store operations the loader needs.
///
/// Any store implementing these is substitutable; the loader never holds a store beyond one call.
pub trait WeatherStore {
    /// Maximum `timestamp` among stored records, or `None` when the store holds none.
    fn find_max_timestamp(&self) -> StoreResult<Option<DateTime<Utc>>>;

    /// Append `records` in one batch and return how many were written.
    fn insert_many(&mut self, records: &[CanonicalWeatherRecord]) -> StoreResult<usize>;
}

/// In-process store, mainly for tests and dry runs.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: Vec<CanonicalWeatherRecord>,
    insert_calls: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-seeded with `records`.
    pub fn with_records(records: Vec<CanonicalWeatherRecord>) -> Self {
        Self {
            records,
            insert_calls: 0,
        }
    }

    /// Stored records, in insertion order.
    pub fn records(&self) -> &[CanonicalWeatherRecord] {
        &self.records
    }

    /// Number of `insert_many` calls received.
    pub fn insert_calls(&self) -> usize {
        self.insert_calls
    }
}

impl WeatherStore for MemoryStore {
    fn find_max_timestamp(&self) -> StoreResult<Option<DateTime<Utc>>> {
        max_timestamp(
            self.records
                .iter()
                .enumerate()
                .map(|(idx, r)| (idx + 1, r.timestamp.clone())),
        )
    }

    fn insert_many(&mut self, records: &[CanonicalWeatherRecord]) -> StoreResult<usize> {
        self.insert_calls += 1;
        self.records.extend_from_slice(records);
        Ok(records.len())
    }
}

/// Append-only newline-delimited JSON file, one canonical record per line.
#[derive(Debug, Clone)]
pub struct JsonLinesStore {
    path: PathBuf,
}

impl JsonLinesStore {
    /// Store backed by the file at `path`. The file is created on first insert.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Store at `{target}/{namespace}/{collection}.jsonl`.
    pub fn open(target: impl AsRef<Path>, namespace: &str, collection: &str) -> Self {
        Self::new(target.as_ref().join(namespace).join(format!("{collection}.jsonl")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[derive(Deserialize)]
struct TimestampProjection {
    #[serde(default)]
    timestamp: Option<String>,
}

impl WeatherStore for JsonLinesStore {
    fn find_max_timestamp(&self) -> StoreResult<Option<DateTime<Utc>>> {
        let file = match fs::File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let mut stamps = Vec::new();
        for (idx0, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let projected: TimestampProjection = serde_json::from_str(&line)?;
            stamps.push((idx0 + 1, projected.timestamp));
        }
        max_timestamp(stamps)
    }

    fn insert_many(&mut self, records: &[CanonicalWeatherRecord]) -> StoreResult<usize> {
        if records.is_empty() {
            return Ok(0);
        }

        // Encode everything before touching the file so a bad record writes nothing.
        let mut buf = Vec::new();
        for record in records {
            serde_json::to_writer(&mut buf, record)?;
            buf.push(b'\n');
        }

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        file.write_all(&buf)?;
        file.flush()?;
        Ok(records.len())
    }
}

/// Max over stored timestamps; records without a timestamp never win, unparseable ones fail.
fn max_timestamp<I>(stamps: I) -> StoreResult<Option<DateTime<Utc>>>
where
    I: IntoIterator<Item = (usize, Option<String>)>,
{
    let mut max: Option<DateTime<Utc>> = None;
    for (line, raw) in stamps {
        let Some(raw) = raw else { continue };
        let ts = timestamp::parse_strict(&raw).map_err(|_| StoreError::InvalidStoredTimestamp {
            line,
            raw: raw.clone(),
        })?;
        if max.is_none_or(|m| ts > m) {
            max = Some(ts);
        }
    }
    Ok(max)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(ts: Option<&str>) -> CanonicalWeatherRecord {
        CanonicalWeatherRecord {
            source: "CSV".to_string(),
            timestamp: ts.map(str::to_string),
            location: "X".to_string(),
            temperature_c: 1.0,
            humidity: None,
            wind_speed: None,
            weather_score: None,
        }
    }

    #[test]
    fn memory_store_reports_max_timestamp() {
        let store = MemoryStore::with_records(vec![
            rec(Some("2024-01-02T00:00:00Z")),
            rec(None),
            rec(Some("2024-03-01T00:00:00Z")),
            rec(Some("2024-02-01T00:00:00Z")),
        ]);
        let max = store.find_max_timestamp().unwrap().unwrap();
        assert_eq!(timestamp::format_canonical(max), "2024-03-01T00:00:00Z");
    }

    #[test]
    fn empty_stores_have_no_watermark() {
        assert_eq!(MemoryStore::new().find_max_timestamp().unwrap(), None);

        let dir = tempfile::tempdir().unwrap();
        let store = JsonLinesStore::open(dir.path(), "weather_db", "readings");
        assert_eq!(store.find_max_timestamp().unwrap(), None);
    }

    #[test]
    fn stored_garbage_timestamp_is_an_error() {
        let store = MemoryStore::with_records(vec![rec(Some("2024-01-02T00:00:00Z")), rec(Some("soon"))]);
        let err = store.find_max_timestamp().unwrap_err();
        assert!(matches!(err, StoreError::InvalidStoredTimestamp { line: 2, .. }));
    }

    #[test]
    fn json_lines_store_appends_and_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonLinesStore::open(dir.path(), "weather_db", "readings");

        let n = store
            .insert_many(&[rec(Some("2024-01-01T00:00:00Z")), rec(Some("2024-01-03T00:00:00Z"))])
            .unwrap();
        assert_eq!(n, 2);
        store.insert_many(&[rec(Some("2024-01-02T00:00:00Z"))]).unwrap();

        let text = fs::read_to_string(store.path()).unwrap();
        assert_eq!(text.lines().count(), 3);
        assert!(text.lines().next().unwrap().starts_with(r#"{"source":"CSV","timestamp":"2024-01-01T00:00:00Z""#));

        let max = store.find_max_timestamp().unwrap().unwrap();
        assert_eq!(timestamp::format_canonical(max), "2024-01-03T00:00:00Z");
    }

    #[test]
    fn json_lines_store_ignores_empty_insert() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonLinesStore::new(dir.path().join("nested").join("x.jsonl"));
        assert_eq!(store.insert_many(&[]).unwrap(), 0);
        assert!(!store.path().exists());
    }
}
