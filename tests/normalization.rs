use chrono::{TimeZone, Utc};

use weather_etl::ingestion::json::ingest_json_from_path;
use weather_etl::normalize::normalize_at;
use weather_etl::types::{SourceMapping, TemperatureUnit};

fn station_mapping() -> SourceMapping {
    SourceMapping::new("reading.temp_c", TemperatureUnit::Celsius)
        .with_humidity("reading.rh")
        .with_wind_speed("wind.speed")
        .with_location("station")
        .with_timestamp("observed")
}

#[test]
fn normalize_ndjson_with_a_record_missing_humidity() {
    let rs = ingest_json_from_path("tests/fixtures/observations.ndjson").unwrap();
    let now = Utc.with_ymd_and_hms(2024, 6, 2, 2, 0, 0).unwrap();

    let out = normalize_at(&rs, "Stations", &station_mapping(), now).unwrap();
    assert_eq!(out.len(), 2);

    let complete = &out[0];
    assert_eq!(complete.location, "KHI-01");
    assert_eq!(complete.humidity, Some(66.0));
    assert_eq!(complete.weather_score, Some(32.44));
    assert_eq!(complete.timestamp.as_deref(), Some("2024-06-01T01:00:00Z"));

    let partial = &out[1];
    assert_eq!(partial.source, "Stations");
    assert_eq!(partial.location, "LHE-02");
    assert_eq!(partial.temperature_c, 36.4);
    assert_eq!(partial.wind_speed, Some(3.5));
    assert_eq!(partial.humidity, None);
    assert_eq!(partial.weather_score, None);
}
