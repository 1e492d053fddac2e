//! Source adapters.
//!
//! Every adapter turns one raw input into a generic [`crate::types::RecordSet`]. Most callers
//! should use [`ingest_from_path`] (from [`unified`]) for file sources, which:
//!
//! - auto-detects format by file extension (or you can override via [`IngestionOptions`])
//! - optionally reports success/failure/alerts to an [`IngestionObserver`]
//!
//! The remote source goes through [`api::ingest_openweathermap`], which degrades failures to an
//! empty record set instead of returning an error.
//!
//! Format-specific functions are also available under:
//! - [`csv`]
//! - [`json`]
//! - `excel` (feature `excel`)

pub mod api;
pub mod csv;
#[cfg(feature = "excel")]
pub mod excel;
pub mod json;
pub mod observability;
pub mod unified;

pub use api::{ingest_openweathermap, HttpGet, HttpResponse, OpenWeatherMapQuery, ReqwestHttp};
pub use observability::{
    CompositeObserver, FileObserver, IngestionContext, IngestionObserver, IngestionSeverity, IngestionStats,
    LogObserver,
};
pub use unified::{ingest_from_path, ExcelSheetSelection, IngestionFormat, IngestionOptions};
