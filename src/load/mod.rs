//! Incremental loading against a store's high-water mark.
//!
//! The watermark is the single maximum `timestamp` across the whole store, not per source. A
//! source whose clock lags another source's stored maximum has its records dropped for the run.

pub mod store;

use chrono::{DateTime, Utc};
use log::info;

use crate::error::LoadError;
use crate::timestamp;
use crate::types::CanonicalWeatherRecord;

pub use store::{JsonLinesStore, MemoryStore, WeatherStore};

/// Append the records of `batch` that are newer than the store's watermark.
///
/// - Every batch timestamp must parse strictly; a null or unparseable one fails the load
///   before the store is touched.
/// - Without a watermark (empty store) every record is new.
/// - Otherwise only records with a timestamp strictly greater than the watermark are new.
/// - New records are written with a single [`WeatherStore::insert_many`] call.
///
/// Returns the number of records written.
pub fn load(batch: &[CanonicalWeatherRecord], store: &mut dyn WeatherStore) -> Result<usize, LoadError> {
    let stamped = parse_batch_timestamps(batch)?;

    let fresh: Vec<CanonicalWeatherRecord> = match store.find_max_timestamp()? {
        Some(watermark) => {
            info!("Latest timestamp in store: {}", timestamp::format_canonical(watermark));
            stamped
                .into_iter()
                .filter(|(ts, _)| *ts > watermark)
                .map(|(_, rec)| rec.clone())
                .collect()
        }
        None => {
            info!("No existing records found. Will insert all.");
            batch.to_vec()
        }
    };

    if fresh.is_empty() {
        info!("No new data to insert.");
        return Ok(0);
    }

    let written = store.insert_many(&fresh)?;
    info!("Inserted {written} new records.");
    Ok(written)
}

fn parse_batch_timestamps(
    batch: &[CanonicalWeatherRecord],
) -> Result<Vec<(DateTime<Utc>, &CanonicalWeatherRecord)>, LoadError> {
    batch
        .iter()
        .enumerate()
        .map(|(index, rec)| parse_record_timestamp(index, rec).map(|ts| (ts, rec)))
        .collect()
}

fn parse_record_timestamp(index: usize, rec: &CanonicalWeatherRecord) -> Result<DateTime<Utc>, LoadError> {
    let raw = rec.timestamp.as_deref().ok_or_else(|| LoadError::WatermarkParse {
        index,
        raw: String::new(),
        message: "timestamp is null".to_string(),
    })?;
    timestamp::parse_strict(raw).map_err(|e| LoadError::WatermarkParse {
        index,
        raw: raw.to_string(),
        message: e.to_string(),
    })
}
