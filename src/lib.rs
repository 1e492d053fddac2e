//! `weather-etl` collects weather observations from heterogeneous sources, normalizes them into
//! one canonical record shape, and appends only the new ones to a persistent store.
//!
//! A run goes through four stages:
//!
//! 1. **Extract**: each configured source is read into a generic [`types::RecordSet`]
//!    ([`ingestion`]). File sources that fail abort the run; the remote source degrades to an
//!    empty contribution.
//! 2. **Normalize**: each record set is mapped into [`types::CanonicalWeatherRecord`]s using its
//!    [`types::SourceMapping`] ([`normalize`]).
//! 3. **Merge**: the per-source batches are concatenated in configured order
//!    ([`processing::merge`]).
//! 4. **Load**: records strictly newer than the store's watermark are appended in one batch
//!    ([`load`]).
//!
//! [`pipeline::Pipeline`] sequences these stages and [`scheduler`] triggers it once a day.
//!
//! ## What you can ingest
//!
//! - **CSV**: `.csv`, including spreadsheet exports
//! - **JSON**: `.json` / `.ndjson` (single object, array of objects, or newline-delimited);
//!   nested objects are flattened to dotted paths such as `main.temp`
//! - **Excel/workbooks** (Cargo feature `excel`): `.xlsx`, `.xls`, `.xlsm`, `.xlsb`, `.ods`
//! - **OpenWeatherMap**: the current-weather endpoint, through any [`ingestion::HttpGet`]
//!
//! Across formats, empty cells and explicit JSON `null` map to [`types::Value::Null`].
//!
//! ## Quick example: one run against an in-memory store
//!
//! ```no_run
//! use weather_etl::config::PipelineConfig;
//! use weather_etl::ingestion::ReqwestHttp;
//! use weather_etl::load::MemoryStore;
//! use weather_etl::pipeline::Pipeline;
//!
//! # fn main() -> Result<(), weather_etl::PipelineError> {
//! let config = PipelineConfig::from_path("config/db_config.json")?;
//! let pipeline = Pipeline::new(config, ReqwestHttp::new());
//!
//! let mut store = MemoryStore::new();
//! let report = pipeline.run(&mut store)?;
//! println!("inserted={}", report.inserted);
//! # Ok(())
//! # }
//! ```
//!
//! ## Normalizing a record set directly
//!
//! ```rust
//! use weather_etl::load::{load, MemoryStore};
//! use weather_etl::normalize::normalize;
//! use weather_etl::types::{RecordSet, SourceMapping, TemperatureUnit, Value};
//!
//! let rs = RecordSet::new(
//!     vec!["temperature_c".into(), "location_name".into(), "observed".into()],
//!     vec![vec![
//!         Value::Float64(21.5),
//!         Value::Utf8("Lahore".into()),
//!         Value::Utf8("2024-06-01 09:30:00".into()),
//!     ]],
//! );
//! let mapping = SourceMapping::new("temperature_c", TemperatureUnit::Celsius)
//!     .with_location("location_name")
//!     .with_timestamp("observed");
//!
//! let batch = normalize(&rs, "GoogleSheet", &mapping).unwrap();
//! assert_eq!(batch[0].timestamp.as_deref(), Some("2024-06-01T09:30:00Z"));
//! assert_eq!(batch[0].weather_score, None);
//!
//! let mut store = MemoryStore::new();
//! assert_eq!(load(&batch, &mut store).unwrap(), 1);
//! assert_eq!(load(&batch, &mut store).unwrap(), 0);
//! ```
//!
//! ## Modules
//!
//! - [`ingestion`]: source adapters and ingestion observability
//! - [`types`]: generic record sets, source mappings, canonical records
//! - [`processing`]: dedup, null filling, merge
//! - [`normalize`]: record set → canonical records
//! - [`load`]: watermark-based incremental loading and store implementations
//! - [`pipeline`]: run orchestration
//! - [`scheduler`]: daily trigger
//! - [`config`]: JSON configuration
//! - [`timestamp`]: lenient and strict timestamp handling
//! - [`error`]: error types

pub mod config;
pub mod error;
pub mod ingestion;
pub mod load;
pub mod normalize;
pub mod pipeline;
pub mod processing;
pub mod scheduler;
pub mod timestamp;
pub mod types;

pub use error::{
    ConfigError, IngestionError, IngestionResult, LoadError, NormalizeError, PipelineError, PipelineResult,
    StoreError, StoreResult,
};
