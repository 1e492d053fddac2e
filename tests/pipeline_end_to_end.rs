use std::cell::RefCell;
use std::fs;

use chrono::{DateTime, TimeZone, Utc};

use weather_etl::config::{PipelineConfig, SourceKind};
use weather_etl::ingestion::{HttpGet, HttpResponse};
use weather_etl::load::{JsonLinesStore, MemoryStore, WeatherStore};
use weather_etl::pipeline::Pipeline;
use weather_etl::types::CanonicalWeatherRecord;
use weather_etl::{IngestionResult, LoadError, PipelineError};

struct StubHttp {
    status: u16,
    body: String,
    urls: RefCell<Vec<String>>,
}

impl StubHttp {
    fn new(status: u16, body: &str) -> Self {
        Self {
            status,
            body: body.to_string(),
            urls: RefCell::new(Vec::new()),
        }
    }
}

impl HttpGet for StubHttp {
    fn get(&self, url: &str) -> IngestionResult<HttpResponse> {
        self.urls.borrow_mut().push(url.to_string());
        Ok(HttpResponse {
            status: self.status,
            body: self.body.clone(),
        })
    }
}

const KARACHI_NOW: &str = r#"{
    "name": "Karachi",
    "dt": 1717297200,
    "main": { "temp": 29.0, "humidity": 60 },
    "wind": { "speed": 3.0 },
    "weather": [{ "main": "Clouds" }]
}"#;

fn config() -> PipelineConfig {
    PipelineConfig::from_path("tests/fixtures/pipeline_config.json").unwrap()
}

fn run_instant() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 2, 2, 0, 0).unwrap()
}

fn summary(records: &[CanonicalWeatherRecord]) -> Vec<(&str, &str, f64, Option<f64>)> {
    records
        .iter()
        .map(|r| (r.source.as_str(), r.location.as_str(), r.temperature_c, r.weather_score))
        .collect()
}

#[test]
fn api_failure_still_loads_file_sources() {
    let http = StubHttp::new(500, "internal error");
    let pipeline = Pipeline::new(config(), http);
    let mut store = MemoryStore::new();

    let report = pipeline.run_at(&mut store, run_instant()).unwrap();

    let per_source: Vec<(&str, usize, usize)> = report
        .sources
        .iter()
        .map(|s| (s.tag.as_str(), s.extracted, s.normalized))
        .collect();
    assert_eq!(
        per_source,
        vec![("CSV", 4, 3), ("JSON", 2, 2), ("GoogleSheet", 2, 2), ("OpenWeatherMap", 0, 0)]
    );
    assert_eq!(report.merged, 7);
    assert_eq!(report.inserted, 7);

    assert_eq!(
        summary(store.records()),
        vec![
            ("CSV", "X", 100.0, Some(58.0)),
            ("CSV", "Oslo", 0.0, Some(25.5)),
            ("CSV", "Paris", 20.0, None),
            ("JSON", "Karachi", 31.5, Some(34.83)),
            ("JSON", "Lahore", 35.0, Some(26.75)),
            ("GoogleSheet", "Lahore", 30.5, Some(29.3)),
            ("GoogleSheet", "Multan", 33.0, None),
        ]
    );

    let timestamps: Vec<&str> = store
        .records()
        .iter()
        .map(|r| r.timestamp.as_deref().unwrap())
        .collect();
    assert_eq!(
        timestamps,
        vec![
            "2024-06-02T02:00:00Z",
            "2024-06-02T02:00:00Z",
            "2024-06-02T02:00:00Z",
            "2024-06-01T10:00:00Z",
            "2024-06-01T11:00:00Z",
            "2024-06-01T08:00:00Z",
            "2024-06-01T08:00:00Z",
        ]
    );
    assert_eq!(store.insert_calls(), 1);
}

#[test]
fn api_success_contributes_a_record() {
    let http = StubHttp::new(200, KARACHI_NOW);
    let pipeline = Pipeline::new(config(), http);
    let mut store = MemoryStore::new();

    let report = pipeline.run_at(&mut store, run_instant()).unwrap();
    assert_eq!(report.inserted, 8);

    let last = store.records().last().unwrap();
    assert_eq!(last.source, "OpenWeatherMap");
    assert_eq!(last.location, "Karachi");
    assert_eq!(last.timestamp.as_deref(), Some("2024-06-02T03:00:00Z"));
    assert_eq!(last.weather_score, Some(30.5));
}

#[test]
fn api_request_uses_configured_city_and_key() {
    let http = StubHttp::new(404, "{}");
    Pipeline::new(config(), &http)
        .run_at(&mut MemoryStore::new(), run_instant())
        .unwrap();
    Pipeline::new(config().with_api_key("over ride"), &http)
        .run_at(&mut MemoryStore::new(), run_instant())
        .unwrap();

    let urls = http.urls.borrow();
    assert_eq!(
        *urls,
        vec![
            "http://localhost:9/data/2.5/weather?q=Karachi&appid=test-key&units=metric".to_string(),
            "http://localhost:9/data/2.5/weather?q=Karachi&appid=over+ride&units=metric".to_string(),
        ]
    );
}

#[test]
fn second_run_with_same_data_inserts_nothing() {
    let pipeline = Pipeline::new(config(), StubHttp::new(500, ""));
    let mut store = MemoryStore::new();

    assert_eq!(pipeline.run_at(&mut store, run_instant()).unwrap().inserted, 7);
    let again = pipeline.run_at(&mut store, run_instant()).unwrap();
    assert_eq!(again.merged, 7);
    assert_eq!(again.inserted, 0);
    assert_eq!(store.records().len(), 7);
}

#[test]
fn later_run_only_adds_records_past_the_global_watermark() {
    let pipeline = Pipeline::new(config(), StubHttp::new(500, ""));
    let mut store = MemoryStore::new();
    pipeline.run_at(&mut store, run_instant()).unwrap();

    // CSV rows carry the run instant, so only they clear the new watermark; the JSON and sheet
    // rows are older than the CSV rows stored by the first run.
    let next_day = Utc.with_ymd_and_hms(2024, 6, 3, 2, 0, 0).unwrap();
    let report = pipeline.run_at(&mut store, next_day).unwrap();
    assert_eq!(report.inserted, 3);
    assert!(store.records()[7..].iter().all(|r| r.source == "CSV"));
}

#[test]
fn missing_file_source_aborts_before_loading() {
    let mut cfg = config();
    cfg.sources[1].kind = SourceKind::Json {
        path: "tests/fixtures/missing_weather.json".into(),
    };
    let pipeline = Pipeline::new(cfg, StubHttp::new(200, KARACHI_NOW));
    let mut store = MemoryStore::new();

    let err = pipeline.run_at(&mut store, run_instant()).unwrap_err();
    match err {
        PipelineError::SourceUnavailable { tag, .. } => assert_eq!(tag, "JSON"),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(store.insert_calls(), 0);
}

#[test]
fn unparseable_temperature_aborts_the_run() {
    let mut cfg = config();
    cfg.sources[0].kind = SourceKind::Csv {
        path: "tests/fixtures/bad_temperature.csv".into(),
    };
    let pipeline = Pipeline::new(cfg, StubHttp::new(500, ""));
    let mut store = MemoryStore::new();

    let err = pipeline.run_at(&mut store, run_instant()).unwrap_err();
    let msg = err.to_string();
    assert!(matches!(err, PipelineError::Normalize { ref tag, .. } if tag == "CSV"));
    assert!(msg.contains("CSV"), "{msg}");
    assert!(store.records().is_empty());
}

#[test]
fn unparseable_source_timestamp_fails_the_load() {
    let dir = tempfile::tempdir().unwrap();
    let sheet = dir.path().join("sheet.csv");
    fs::write(
        &sheet,
        "location_name,temperature_c,humidity,wind_kph,recorded_at\nLahore,30.5,45,12,yesterday-ish\n",
    )
    .unwrap();

    let mut cfg = config();
    cfg.sources[2].kind = SourceKind::SheetExport {
        path: sheet,
        sheet: None,
    };
    let pipeline = Pipeline::new(cfg, StubHttp::new(500, ""));
    let mut store = MemoryStore::new();

    let err = pipeline.run_at(&mut store, run_instant()).unwrap_err();
    assert!(matches!(err, PipelineError::Load(LoadError::WatermarkParse { index: 5, .. })));
    assert_eq!(store.insert_calls(), 0);
}

#[test]
fn json_lines_store_round_trip_across_runs() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config();
    let mut store = JsonLinesStore::open(dir.path(), &cfg.store.namespace, &cfg.store.collection);
    let pipeline = Pipeline::new(cfg, StubHttp::new(500, ""));

    assert_eq!(pipeline.run_at(&mut store, run_instant()).unwrap().inserted, 7);
    assert_eq!(pipeline.run_at(&mut store, run_instant()).unwrap().inserted, 0);

    assert!(store.path().ends_with("weather_db/readings.jsonl"));
    let text = fs::read_to_string(store.path()).unwrap();
    assert_eq!(text.lines().count(), 7);

    let first: serde_json::Value = serde_json::from_str(text.lines().next().unwrap()).unwrap();
    assert_eq!(first["source"], "CSV");
    assert_eq!(first["temperature_c"], 100.0);
    assert_eq!(first["weather_score"], 58.0);

    let max = store.find_max_timestamp().unwrap().unwrap();
    assert_eq!(max, run_instant());
}
