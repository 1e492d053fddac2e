//! Run orchestration: extract every source, normalize each, merge, load.
//!
//! A run either completes with a [`RunReport`] or fails with a [`PipelineError`]; the store is
//! written at most once, at the very end, so a failed run leaves it untouched.

use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use log::info;

use crate::config::{PipelineConfig, SourceConfig, SourceKind};
use crate::error::{PipelineError, PipelineResult};
use crate::ingestion::{
    ingest_from_path, ingest_openweathermap, ExcelSheetSelection, HttpGet, IngestionFormat, IngestionObserver,
    IngestionOptions, IngestionSeverity, OpenWeatherMapQuery,
};
use crate::load::{load, WeatherStore};
use crate::normalize::normalize_at;
use crate::processing::merge;
use crate::types::RecordSet;

/// Per-source counts for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceReport {
    pub tag: String,
    /// Rows produced by the adapter.
    pub extracted: usize,
    /// Canonical records after duplicate suppression.
    pub normalized: usize,
}

/// Outcome of one successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub sources: Vec<SourceReport>,
    /// Size of the merged batch handed to the loader.
    pub merged: usize,
    /// Records written to the store.
    pub inserted: usize,
    pub elapsed: Duration,
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sources=[")?;
        for (i, s) in self.sources.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}:{}/{}", s.tag, s.normalized, s.extracted)?;
        }
        write!(
            f,
            "], merged={}, inserted={}, elapsed={:?}",
            self.merged, self.inserted, self.elapsed
        )
    }
}

/// The configured pipeline plus its HTTP capability.
pub struct Pipeline<H: HttpGet> {
    config: PipelineConfig,
    http: H,
    observer: Option<Arc<dyn IngestionObserver>>,
}

impl<H: HttpGet> fmt::Debug for Pipeline<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("sources", &self.config.sources.len())
            .field("observer_set", &self.observer.is_some())
            .finish()
    }
}

impl<H: HttpGet> Pipeline<H> {
    pub fn new(config: PipelineConfig, http: H) -> Self {
        Self {
            config,
            http,
            observer: None,
        }
    }

    /// Attach an observer for per-source ingestion outcomes.
    pub fn with_observer(mut self, observer: Arc<dyn IngestionObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run once, using the current UTC time as the default record timestamp.
    pub fn run(&self, store: &mut dyn WeatherStore) -> PipelineResult<RunReport> {
        self.run_at(store, Utc::now())
    }

    /// Run once with an explicit run instant.
    pub fn run_at(&self, store: &mut dyn WeatherStore, now: DateTime<Utc>) -> PipelineResult<RunReport> {
        let start = Instant::now();
        info!("Starting weather ETL pipeline ({} sources)", self.config.sources.len());

        let mut extracted = Vec::with_capacity(self.config.sources.len());
        for source in &self.config.sources {
            let records = self.extract(source)?;
            let origin = if source.kind.is_remote() { "remote" } else { "file" };
            info!("Extracted {} rows from {origin} source '{}'", records.row_count(), source.tag);
            extracted.push((source, records));
        }

        let mut reports = Vec::with_capacity(extracted.len());
        let mut batches = Vec::with_capacity(extracted.len());
        for (source, records) in &extracted {
            let normalized =
                normalize_at(records, &source.tag, &source.mapping, now).map_err(|e| PipelineError::Normalize {
                    tag: source.tag.clone(),
                    source: e,
                })?;
            reports.push(SourceReport {
                tag: source.tag.clone(),
                extracted: records.row_count(),
                normalized: normalized.len(),
            });
            batches.push(normalized);
        }

        let batch = merge(batches);
        info!("Merged batch holds {} records", batch.len());

        let inserted = load(&batch, store)?;

        let report = RunReport {
            sources: reports,
            merged: batch.len(),
            inserted,
            elapsed: start.elapsed(),
        };
        info!("Weather ETL pipeline completed: {report}");
        Ok(report)
    }

    fn extract(&self, source: &SourceConfig) -> PipelineResult<RecordSet> {
        let mut options = IngestionOptions {
            source_tag: Some(source.tag.clone()),
            observer: self.observer.clone(),
            ..Default::default()
        };

        let result = match &source.kind {
            SourceKind::Csv { path } => {
                options.format = Some(IngestionFormat::Csv);
                ingest_from_path(path, &options)
            }
            SourceKind::Json { path } => {
                options.format = Some(IngestionFormat::Json);
                ingest_from_path(path, &options)
            }
            SourceKind::SheetExport { path, sheet } => {
                options.format = Some(sheet_export_format(path));
                if let Some(name) = sheet {
                    options.excel_sheet_selection = ExcelSheetSelection::Sheet(name.clone());
                }
                ingest_from_path(path, &options)
            }
            SourceKind::OpenWeatherMap {
                city,
                api_key,
                base_url,
            } => {
                options.alert_at_or_above = IngestionSeverity::Error;
                let query = OpenWeatherMapQuery {
                    base_url: base_url.clone(),
                    city: city.clone(),
                    api_key: api_key.clone(),
                };
                Ok(ingest_openweathermap(&self.http, &query, &options))
            }
        };

        result.map_err(|e| PipelineError::SourceUnavailable {
            tag: source.tag.clone(),
            source: e,
        })
    }
}

/// Workbook extensions go to the Excel reader; anything else is read as a CSV export.
fn sheet_export_format(path: &Path) -> IngestionFormat {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .and_then(IngestionFormat::from_extension)
    {
        Some(IngestionFormat::Excel) => IngestionFormat::Excel,
        _ => IngestionFormat::Csv,
    }
}
