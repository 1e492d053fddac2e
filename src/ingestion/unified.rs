//! Unified ingestion entrypoint.
//!
//! Most callers should use [`ingest_from_path`], which ingests a file into an in-memory
//! [`crate::types::RecordSet`].
//!
//! - If [`IngestionOptions::format`] is `None`, the ingestion format is inferred from the file
//!   extension.
//! - If an [`super::observability::IngestionObserver`] is provided, success/failure/alerts are
//!   reported to it.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::error::{IngestionError, IngestionResult};
use crate::types::RecordSet;

use super::observability::{IngestionContext, IngestionObserver, IngestionSeverity, IngestionStats};
use super::{csv, json};

/// Supported ingestion formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestionFormat {
    /// Comma-separated values (including spreadsheet CSV exports).
    Csv,
    /// JSON object, array-of-objects, or NDJSON.
    Json,
    /// Spreadsheet/workbook formats (feature-gated behind `excel`).
    Excel,
    /// JSON body fetched from a remote HTTP endpoint.
    RemoteJson,
}

impl IngestionFormat {
    /// Parse an ingestion format from a file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "json" | "ndjson" => Some(Self::Json),
            "xlsx" | "xls" | "xlsm" | "xlsb" | "ods" => Some(Self::Excel),
            _ => None,
        }
    }
}

/// How to choose the sheet when ingesting a workbook export.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ExcelSheetSelection {
    /// Ingest the first sheet (default).
    #[default]
    First,
    /// Ingest a single named sheet.
    Sheet(String),
}

/// Options controlling unified ingestion behavior.
///
/// Use [`Default`] for common cases.
#[derive(Clone)]
pub struct IngestionOptions {
    /// If `None`, auto-detect format from file extension.
    pub format: Option<IngestionFormat>,
    /// Excel-specific options.
    pub excel_sheet_selection: ExcelSheetSelection,
    /// Tag reported to the observer alongside the path.
    pub source_tag: Option<String>,
    /// Optional observer for logging/alerts.
    pub observer: Option<Arc<dyn IngestionObserver>>,
    /// Severity threshold at which `on_alert` is invoked.
    pub alert_at_or_above: IngestionSeverity,
}

impl fmt::Debug for IngestionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IngestionOptions")
            .field("format", &self.format)
            .field("excel_sheet_selection", &self.excel_sheet_selection)
            .field("source_tag", &self.source_tag)
            .field("observer_set", &self.observer.is_some())
            .field("alert_at_or_above", &self.alert_at_or_above)
            .finish()
    }
}

impl Default for IngestionOptions {
    fn default() -> Self {
        Self {
            format: None,
            excel_sheet_selection: ExcelSheetSelection::default(),
            source_tag: None,
            observer: None,
            alert_at_or_above: IngestionSeverity::Critical,
        }
    }
}

/// Unified ingestion entry point for path-based sources.
///
/// When an observer is configured, this function reports:
///
/// - `on_success` on success, with row count stats
/// - `on_failure` on failure, with a computed severity
/// - `on_alert` on failure when the computed severity is >= `options.alert_at_or_above`
///
/// # Examples
///
/// ```no_run
/// use weather_etl::ingestion::{ingest_from_path, IngestionOptions};
///
/// # fn main() -> Result<(), weather_etl::IngestionError> {
/// // Uses `.csv` to select CSV ingestion.
/// let rs = ingest_from_path("data/sample_data.csv", &IngestionOptions::default())?;
/// println!("rows={}", rs.row_count());
/// # Ok(())
/// # }
/// ```
///
/// ## Force a format explicitly
///
/// ```no_run
/// use weather_etl::ingestion::{ingest_from_path, IngestionFormat, IngestionOptions};
///
/// # fn main() -> Result<(), weather_etl::IngestionError> {
/// let opts = IngestionOptions {
///     format: Some(IngestionFormat::Csv),
///     ..Default::default()
/// };
/// let rs = ingest_from_path("google_sheet_export", &opts)?;
/// println!("rows={}", rs.row_count());
/// # Ok(())
/// # }
/// ```
pub fn ingest_from_path(path: impl AsRef<Path>, options: &IngestionOptions) -> IngestionResult<RecordSet> {
    let path = path.as_ref();
    let fmt = match options.format {
        Some(f) => f,
        None => infer_format_from_path(path)?,
    };

    let mut ctx = IngestionContext::for_path(path, fmt);
    ctx.source_tag = options.source_tag.clone();

    let result = match fmt {
        IngestionFormat::Csv => csv::ingest_csv_from_path(path),
        IngestionFormat::Json => json::ingest_json_from_path(path),
        IngestionFormat::Excel => ingest_excel_dispatch(path, &options.excel_sheet_selection),
        IngestionFormat::RemoteJson => Err(IngestionError::Malformed {
            message: format!("remote format cannot be read from a path ({})", path.display()),
        }),
    };

    report_outcome(
        options.observer.as_deref(),
        options.alert_at_or_above,
        &ctx,
        &result,
        severity_for_error,
    );

    result
}

/// Report one ingestion outcome to `observer`, if any.
pub(crate) fn report_outcome(
    observer: Option<&dyn IngestionObserver>,
    alert_at_or_above: IngestionSeverity,
    ctx: &IngestionContext,
    result: &IngestionResult<RecordSet>,
    severity_of: impl Fn(&IngestionError) -> IngestionSeverity,
) {
    let Some(obs) = observer else {
        return;
    };
    match result {
        Ok(rs) => obs.on_success(ctx, IngestionStats { rows: rs.row_count() }),
        Err(e) => {
            let sev = severity_of(e);
            obs.on_failure(ctx, sev, e);
            if sev >= alert_at_or_above {
                obs.on_alert(ctx, sev, e);
            }
        }
    }
}

pub(crate) fn severity_for_error(e: &IngestionError) -> IngestionSeverity {
    match e {
        IngestionError::Io(_) => IngestionSeverity::Critical,
        IngestionError::Http(_) => IngestionSeverity::Critical,
        IngestionError::Csv(err) => match err.kind() {
            ::csv::ErrorKind::Io(_) => IngestionSeverity::Critical,
            _ => IngestionSeverity::Error,
        },
        #[cfg(feature = "excel")]
        IngestionError::Excel(_) => IngestionSeverity::Error,
        IngestionError::Json(_) => IngestionSeverity::Error,
        IngestionError::Malformed { .. } => IngestionSeverity::Error,
    }
}

fn infer_format_from_path(path: &Path) -> IngestionResult<IngestionFormat> {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .ok_or_else(|| IngestionError::Malformed {
            message: format!(
                "cannot infer format: path has no extension ({})",
                path.display()
            ),
        })?;

    IngestionFormat::from_extension(ext).ok_or_else(|| IngestionError::Malformed {
        message: format!(
            "cannot infer format from extension '{ext}' for path ({})",
            path.display()
        ),
    })
}

fn ingest_excel_dispatch(path: &Path, sel: &ExcelSheetSelection) -> IngestionResult<RecordSet> {
    // Avoid unused warnings when the feature is off.
    let _ = (path, sel);

    #[cfg(feature = "excel")]
    {
        use super::excel;

        match sel {
            ExcelSheetSelection::First => excel::ingest_excel_from_path(path, None),
            ExcelSheetSelection::Sheet(name) => excel::ingest_excel_from_path(path, Some(name.as_str())),
        }
    }

    #[cfg(not(feature = "excel"))]
    {
        Err(IngestionError::Malformed {
            message: "excel ingestion not enabled (enable cargo feature 'excel')".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_from_extension_is_case_insensitive() {
        assert_eq!(IngestionFormat::from_extension("CSV"), Some(IngestionFormat::Csv));
        assert_eq!(IngestionFormat::from_extension("ndjson"), Some(IngestionFormat::Json));
        assert_eq!(IngestionFormat::from_extension("ods"), Some(IngestionFormat::Excel));
        assert_eq!(IngestionFormat::from_extension("parquet"), None);
    }

    #[test]
    fn missing_extension_cannot_be_inferred() {
        let err = ingest_from_path("data/no_extension", &IngestionOptions::default()).unwrap_err();
        assert!(err.to_string().contains("path has no extension"));
    }
}
