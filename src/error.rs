use thiserror::Error;

/// Convenience result type for ingestion operations.
pub type IngestionResult<T> = Result<T, IngestionError>;

/// Convenience result type for [`crate::load::WeatherStore`] operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Convenience result type for a whole pipeline run.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Error type returned by source adapters.
///
/// This is a single error enum shared across CSV/JSON/remote (and optional Excel) ingestion.
#[derive(Debug, Error)]
pub enum IngestionError {
    /// Underlying I/O error (e.g. file not found, permission denied).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "excel")]
    /// Excel ingestion error (feature-gated behind `excel`).
    #[error("excel error: {0}")]
    Excel(#[from] calamine::Error),

    /// CSV ingestion error.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON document could not be parsed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP transport failure (connection refused, DNS, body read).
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The input parsed, but its shape is not a record set (e.g. a JSON scalar).
    #[error("malformed input: {message}")]
    Malformed { message: String },
}

/// Error type returned by the normalizer.
#[derive(Debug, Error)]
pub enum NormalizeError {
    /// The mandatory temperature field is absent or not numeric.
    #[error("failed to parse field '{field}' at row {row}: {message} (raw='{raw}')")]
    FieldParse {
        row: usize,
        field: String,
        raw: String,
        message: String,
    },
}

/// Error type returned by [`crate::load::WeatherStore`] implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying I/O error on the backing file.
    #[error("store io error: {0}")]
    Io(#[from] std::io::Error),

    /// A record could not be encoded or decoded.
    #[error("store encoding error: {0}")]
    Json(#[from] serde_json::Error),

    /// A stored record carries a timestamp that cannot be compared.
    #[error("stored timestamp at line {line} is not a valid instant (raw='{raw}')")]
    InvalidStoredTimestamp { line: usize, raw: String },
}

/// Error type returned by the incremental loader.
#[derive(Debug, Error)]
pub enum LoadError {
    /// A batch record's timestamp is null or cannot be parsed as a UTC instant.
    #[error("cannot compare batch record {index} against the watermark: {message} (raw='{raw}')")]
    WatermarkParse {
        index: usize,
        raw: String,
        message: String,
    },

    /// The store failed to report its watermark or to accept the batch.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Error type returned when reading or validating a [`crate::config::PipelineConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),

    /// The config file is not valid JSON for the expected shape.
    #[error("config parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// The config parsed but violates an invariant.
    #[error("invalid config: {message}")]
    Invalid { message: String },
}

/// Error type for a full pipeline run.
///
/// A run either completes with an inserted count or terminates with one of these; nothing is
/// written to the store when an error is returned.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A required file source could not be read.
    #[error("source '{tag}' unavailable: {source}")]
    SourceUnavailable {
        tag: String,
        #[source]
        source: IngestionError,
    },

    /// A source's batch could not be normalized.
    #[error("source '{tag}' failed normalization: {source}")]
    Normalize {
        tag: String,
        #[source]
        source: NormalizeError,
    },

    /// The load step failed.
    #[error("load failed: {0}")]
    Load(#[from] LoadError),

    /// The pipeline configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),
}
