//! Remote JSON API ingestion (OpenWeatherMap current-weather endpoint).
//!
//! The remote source is optional for a run: any failure (transport error, non-success status,
//! unparseable body) yields an empty [`RecordSet`] and a diagnostic instead of an error.

use log::{debug, warn};

use crate::error::{IngestionError, IngestionResult};
use crate::types::RecordSet;

use super::json;
use super::observability::{IngestionContext, IngestionSeverity};
use super::unified::{report_outcome, IngestionFormat, IngestionOptions};

/// Default OpenWeatherMap current-weather endpoint.
pub const OPENWEATHERMAP_URL: &str = "https://api.openweathermap.org/data/2.5/weather";

/// Status code and body of an HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    /// `true` for 2xx status codes.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Minimal HTTP GET capability used by the remote adapter.
pub trait HttpGet {
    /// Issue a single GET request; non-success statuses are returned, not raised.
    fn get(&self, url: &str) -> IngestionResult<HttpResponse>;
}

impl<T: HttpGet + ?Sized> HttpGet for &T {
    fn get(&self, url: &str) -> IngestionResult<HttpResponse> {
        (**self).get(url)
    }
}

/// [`HttpGet`] backed by a blocking `reqwest` client.
#[derive(Debug, Clone, Default)]
pub struct ReqwestHttp {
    client: reqwest::blocking::Client,
}

impl ReqwestHttp {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HttpGet for ReqwestHttp {
    fn get(&self, url: &str) -> IngestionResult<HttpResponse> {
        let response = self.client.get(url).send()?;
        let status = response.status().as_u16();
        let body = response.text()?;
        Ok(HttpResponse { status, body })
    }
}

/// Location and credential of an OpenWeatherMap query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenWeatherMapQuery {
    pub base_url: String,
    pub city: String,
    pub api_key: String,
}

impl OpenWeatherMapQuery {
    pub fn new(city: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: OPENWEATHERMAP_URL.to_string(),
            city: city.into(),
            api_key: api_key.into(),
        }
    }

    /// Full request URL, metric units.
    pub fn url(&self) -> IngestionResult<String> {
        self.build_url(&self.api_key)
    }

    /// Request URL with the credential masked, for diagnostics.
    pub fn redacted_url(&self) -> String {
        self.build_url("***").unwrap_or_else(|_| self.base_url.clone())
    }

    fn build_url(&self, api_key: &str) -> IngestionResult<String> {
        let url = reqwest::Url::parse_with_params(
            &self.base_url,
            &[("q", self.city.as_str()), ("appid", api_key), ("units", "metric")],
        )
        .map_err(|e| IngestionError::Malformed {
            message: format!("invalid base url '{}': {e}", self.base_url),
        })?;
        Ok(url.into())
    }
}

/// Fetch current weather for `query` and flatten it like the nested-object adapter.
///
/// Never fails: a transport error, non-success status, or unparseable body degrades to an empty
/// record set, logged as a warning and reported to the observer (if any) with
/// [`IngestionSeverity::Warning`].
pub fn ingest_openweathermap(
    http: &dyn HttpGet,
    query: &OpenWeatherMapQuery,
    options: &IngestionOptions,
) -> RecordSet {
    let ctx = IngestionContext {
        source_tag: options.source_tag.clone(),
        location: query.redacted_url(),
        format: IngestionFormat::RemoteJson,
    };

    debug!("requesting {}", ctx.location);
    let result = fetch(http, query);
    report_outcome(
        options.observer.as_deref(),
        options.alert_at_or_above,
        &ctx,
        &result,
        |_| IngestionSeverity::Warning,
    );

    match result {
        Ok(rs) => rs,
        Err(e) => {
            warn!("API error: {e} ({})", ctx.location);
            RecordSet::empty()
        }
    }
}

fn fetch(http: &dyn HttpGet, query: &OpenWeatherMapQuery) -> IngestionResult<RecordSet> {
    let response = http.get(&query.url()?)?;
    if !response.is_success() {
        return Err(IngestionError::Malformed {
            message: format!("non-success status {}", response.status),
        });
    }
    let doc: serde_json::Value = serde_json::from_str(&response.body)?;
    json::ingest_json_value(doc)
}
