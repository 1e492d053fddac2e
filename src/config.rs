//! Pipeline configuration.
//!
//! A run is described by one JSON document:
//!
//! ```json
//! {
//!   "store": { "target": "data/store", "namespace": "weather_db", "collection": "readings" },
//!   "sources": [
//!     { "tag": "CSV", "kind": "csv", "path": "data/sample_data.csv",
//!       "mapping": { "temperature": "temp_f", "temperature_unit": "F",
//!                    "humidity": "humidity", "wind_speed": "wind", "location": "city" } },
//!     { "tag": "OpenWeatherMap", "kind": "open_weather_map", "city": "Karachi", "api_key": "...",
//!       "mapping": { "temperature": "main.temp", "humidity": "main.humidity",
//!                    "wind_speed": "wind.speed", "location": "name", "timestamp": "dt" } }
//!   ],
//!   "schedule": { "at": "02:00", "poll_interval_secs": 60 }
//! }
//! ```
//!
//! Sources run in the order they are listed; that order is also the merge priority.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::ingestion::api::OPENWEATHERMAP_URL;
use crate::types::SourceMapping;

/// Default location of the config file.
pub const DEFAULT_CONFIG_PATH: &str = "config/db_config.json";

/// Top-level pipeline configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub store: StoreConfig,
    /// Sources in merge priority order.
    pub sources: Vec<SourceConfig>,
    #[serde(default)]
    pub schedule: ScheduleConfig,
}

/// Where canonical records are persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Connection target (a directory for the JSON-lines store).
    #[serde(alias = "mongo_url")]
    pub target: String,
    /// Database / namespace name.
    #[serde(alias = "db")]
    pub namespace: String,
    /// Collection / table name.
    pub collection: String,
}

/// One input source and how to map it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Constant tag written into every canonical record of this source.
    pub tag: String,
    #[serde(flatten)]
    pub kind: SourceKind,
    pub mapping: SourceMapping,
}

/// The supported source variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceKind {
    /// Delimited text file with a header row.
    Csv { path: PathBuf },
    /// JSON object, array of objects, or NDJSON file.
    Json { path: PathBuf },
    /// Spreadsheet export: CSV, or a workbook when the `excel` feature is enabled.
    SheetExport {
        path: PathBuf,
        #[serde(default)]
        sheet: Option<String>,
    },
    /// OpenWeatherMap current-weather endpoint. Failures degrade to an empty source.
    OpenWeatherMap {
        city: String,
        #[serde(default)]
        api_key: String,
        #[serde(default = "default_base_url")]
        base_url: String,
    },
}

impl SourceKind {
    /// Remote sources may fail without aborting the run; file sources may not.
    pub fn is_remote(&self) -> bool {
        matches!(self, SourceKind::OpenWeatherMap { .. })
    }
}

fn default_base_url() -> String {
    OPENWEATHERMAP_URL.to_string()
}

/// Daily trigger for the scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Local wall-clock time of the daily run, `HH:MM`.
    #[serde(default = "default_schedule_at")]
    pub at: String,
    /// How often the scheduler checks whether a run is due.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            at: default_schedule_at(),
            poll_interval_secs: default_poll_interval_secs(),
        }
    }
}

impl ScheduleConfig {
    /// The trigger time parsed from [`Self::at`].
    pub fn trigger_time(&self) -> Result<NaiveTime, ConfigError> {
        NaiveTime::parse_from_str(self.at.trim(), "%H:%M").map_err(|e| ConfigError::Invalid {
            message: format!("schedule.at '{}' is not HH:MM: {e}", self.at),
        })
    }
}

fn default_schedule_at() -> String {
    "02:00".to_string()
}

fn default_poll_interval_secs() -> u64 {
    60
}

impl PipelineConfig {
    /// Read, parse and validate a config file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Parse and validate a config document.
    pub fn from_json_str(input: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    /// Replace the credential of every remote source.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        let key = key.into();
        for source in &mut self.sources {
            if let SourceKind::OpenWeatherMap { api_key, .. } = &mut source.kind {
                *api_key = key.clone();
            }
        }
        self
    }

    /// Check invariants serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("store.target", &self.store.target),
            ("store.namespace", &self.store.namespace),
            ("store.collection", &self.store.collection),
        ] {
            if value.trim().is_empty() {
                return Err(invalid(format!("{name} must not be empty")));
            }
        }

        if self.sources.is_empty() {
            return Err(invalid("at least one source is required".to_string()));
        }

        let mut tags = HashSet::new();
        for source in &self.sources {
            if source.tag.trim().is_empty() {
                return Err(invalid("source tag must not be empty".to_string()));
            }
            if !tags.insert(source.tag.as_str()) {
                return Err(invalid(format!("duplicate source tag '{}'", source.tag)));
            }
            source.mapping.validate().map_err(|e| match e {
                ConfigError::Invalid { message } => invalid(format!("source '{}': {message}", source.tag)),
                other => other,
            })?;
        }

        self.schedule.trigger_time()?;
        if self.schedule.poll_interval_secs == 0 {
            return Err(invalid("schedule.poll_interval_secs must be > 0".to_string()));
        }
        Ok(())
    }
}

fn invalid(message: String) -> ConfigError {
    ConfigError::Invalid { message }
}
