use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{SecondsFormat, Utc};
use log::{error, info, warn};

use crate::error::IngestionError;

use super::unified::IngestionFormat;

/// Severity classification used for observer callbacks and alerting thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum IngestionSeverity {
    /// Informational event.
    Info,
    /// Warning-level event (non-fatal, e.g. a remote source degraded to empty).
    Warning,
    /// Error-level event (operation failed).
    Error,
    /// Critical error (typically I/O or other infrastructure failures).
    Critical,
}

/// Context about an ingestion attempt.
#[derive(Debug, Clone)]
pub struct IngestionContext {
    /// Tag of the source being ingested, if known.
    pub source_tag: Option<String>,
    /// File path or endpoint (credentials redacted) used for ingestion.
    pub location: String,
    /// Format used for ingestion.
    pub format: IngestionFormat,
}

impl IngestionContext {
    /// Context for a path-based source.
    pub fn for_path(path: &Path, format: IngestionFormat) -> Self {
        Self {
            source_tag: None,
            location: path.display().to_string(),
            format,
        }
    }

    /// Attach the source tag.
    pub fn with_source_tag(mut self, tag: impl Into<String>) -> Self {
        self.source_tag = Some(tag.into());
        self
    }

    fn tag(&self) -> &str {
        self.source_tag.as_deref().unwrap_or("-")
    }
}

/// Minimal stats reported on successful ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestionStats {
    /// Number of ingested rows.
    pub rows: usize,
}

/// Observer interface for ingestion outcomes.
///
/// Implementors can record metrics, logs, or trigger alerts.
pub trait IngestionObserver: Send + Sync {
    /// Called when ingestion succeeds.
    fn on_success(&self, _ctx: &IngestionContext, _stats: IngestionStats) {}

    /// Called when ingestion fails.
    fn on_failure(&self, _ctx: &IngestionContext, _severity: IngestionSeverity, _error: &IngestionError) {}

    /// Called when an ingestion failure meets an alert threshold.
    ///
    /// Default behavior forwards to [`Self::on_failure`].
    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        self.on_failure(ctx, severity, error)
    }
}

/// An observer that fans out callbacks to a list of observers.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn IngestionObserver>>,
}

impl CompositeObserver {
    /// Create a new composite observer from a list of observers.
    pub fn new(observers: Vec<Arc<dyn IngestionObserver>>) -> Self {
        Self { observers }
    }
}

impl fmt::Debug for CompositeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeObserver")
            .field("observers_len", &self.observers.len())
            .finish()
    }
}

impl IngestionObserver for CompositeObserver {
    fn on_success(&self, ctx: &IngestionContext, stats: IngestionStats) {
        for o in &self.observers {
            o.on_success(ctx, stats);
        }
    }

    fn on_failure(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        for o in &self.observers {
            o.on_failure(ctx, severity, error);
        }
    }

    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        for o in &self.observers {
            o.on_alert(ctx, severity, error);
        }
    }
}

/// Forwards ingestion events to the `log` facade.
#[derive(Debug, Default)]
pub struct LogObserver;

impl IngestionObserver for LogObserver {
    fn on_success(&self, ctx: &IngestionContext, stats: IngestionStats) {
        info!(
            "[ingest][ok] source={} format={:?} location={} rows={}",
            ctx.tag(),
            ctx.format,
            ctx.location,
            stats.rows
        );
    }

    fn on_failure(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        let line = format!(
            "[ingest][{:?}] source={} format={:?} location={} err={}",
            severity,
            ctx.tag(),
            ctx.format,
            ctx.location,
            error
        );
        if severity >= IngestionSeverity::Error {
            error!("{line}");
        } else {
            warn!("{line}");
        }
    }

    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        error!(
            "[ALERT][ingest][{:?}] source={} format={:?} location={} err={}",
            severity,
            ctx.tag(),
            ctx.format,
            ctx.location,
            error
        );
    }
}

/// Appends ingestion events to a local log file.
#[derive(Debug)]
pub struct FileObserver {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileObserver {
    /// Create a file observer that appends events to `path`.
    ///
    /// Writes are best-effort; failures to open/write the log file are ignored.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    fn append_line(&self, line: &str) {
        let _guard = self.lock.lock().ok();
        if let Ok(mut f) = OpenOptions::new().create(true).append(true).open(&self.path) {
            let _ = writeln!(f, "{line}");
        }
    }
}

impl IngestionObserver for FileObserver {
    fn on_success(&self, ctx: &IngestionContext, stats: IngestionStats) {
        self.append_line(&format!(
            "{} ok source={} format={:?} location={} rows={}",
            now_rfc3339(),
            ctx.tag(),
            ctx.format,
            ctx.location,
            stats.rows
        ));
    }

    fn on_failure(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        self.append_line(&format!(
            "{} fail severity={:?} source={} format={:?} location={} err={}",
            now_rfc3339(),
            severity,
            ctx.tag(),
            ctx.format,
            ctx.location,
            error
        ));
    }

    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        self.append_line(&format!(
            "{} ALERT severity={:?} source={} format={:?} location={} err={}",
            now_rfc3339(),
            severity,
            ctx.tag(),
            ctx.format,
            ctx.location,
            error
        ));
    }
}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_observer_appends_one_line_per_event() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("ingest.log");
        let obs = FileObserver::new(&log_path);
        let ctx = IngestionContext::for_path(Path::new("data/sample.csv"), IngestionFormat::Csv)
            .with_source_tag("CSV");

        obs.on_success(&ctx, IngestionStats { rows: 3 });
        let err = IngestionError::Malformed {
            message: "boom".to_string(),
        };
        obs.on_alert(&ctx, IngestionSeverity::Critical, &err);

        let text = std::fs::read_to_string(&log_path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("ok source=CSV format=Csv location=data/sample.csv rows=3"));
        assert!(lines[1].contains("ALERT severity=Critical"));
    }

    #[test]
    fn severity_orders_from_info_to_critical() {
        assert!(IngestionSeverity::Info < IngestionSeverity::Warning);
        assert!(IngestionSeverity::Warning < IngestionSeverity::Error);
        assert!(IngestionSeverity::Error < IngestionSeverity::Critical);
    }
}
