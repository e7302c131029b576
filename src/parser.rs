//! Decoding of raw tracking payloads into [`RawFix`] values.
//!
//! The tracking API returns JSON, either a bare array of records or an object
//! wrapping them in `data`. CSV exports with the same column names are also
//! accepted. Every record must carry an entity id, an integer epoch-seconds
//! timestamp and both coordinates; one bad record fails the whole payload.

use crate::error::{RollupError, RollupResult};
use crate::rollup::types::{EntityId, RawFix};
use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};

const ENTITY_ID_KEYS: [&str; 3] = ["entityId", "entity_id", "id"];

/// Decodes a JSON payload from the tracking API.
pub fn parse_fixes(bytes: &[u8]) -> RollupResult<Vec<RawFix>> {
    let payload: Value = serde_json::from_slice(bytes)?;

    let records = match payload {
        Value::Array(records) => records,
        Value::Object(mut obj) => match obj.remove("data") {
            Some(Value::Array(records)) => records,
            _ => {
                return Err(RollupError::UnsupportedPayload(
                    "expected a `data` array".to_string(),
                ));
            }
        },
        _ => {
            return Err(RollupError::UnsupportedPayload(
                "expected an array of records".to_string(),
            ));
        }
    };

    records
        .iter()
        .enumerate()
        .map(|(index, record)| match record {
            Value::Object(fields) => json_record(index, fields),
            _ => Err(RollupError::InvalidField {
                index,
                field: "record",
                reason: "expected a JSON object".to_string(),
            }),
        })
        .collect()
}

fn json_record(index: usize, fields: &Map<String, Value>) -> RollupResult<RawFix> {
    let present = |key: &str| fields.get(key).filter(|v| !v.is_null());

    let entity_id = match ENTITY_ID_KEYS.iter().find_map(|key| present(*key)) {
        Some(Value::Number(n)) => n.as_i64().map(EntityId::Int).ok_or_else(|| {
            invalid(index, "entityId", format!("{n} is not an integer"))
        })?,
        Some(Value::String(s)) => EntityId::Text(s.clone()),
        Some(other) => return Err(invalid(index, "entityId", format!("unexpected {other}"))),
        None => return Err(missing(index, "entityId")),
    };

    let timestamp = present("timestamp")
        .ok_or_else(|| missing(index, "timestamp"))?
        .as_i64()
        .ok_or_else(|| invalid(index, "timestamp", "expected integer epoch seconds".into()))?;

    let latitude = json_coordinate(index, present("latitude"), "latitude")?;
    let longitude = json_coordinate(index, present("longitude"), "longitude")?;

    Ok(RawFix {
        entity_id,
        timestamp: epoch_seconds(index, timestamp)?,
        latitude,
        longitude,
    })
}

fn json_coordinate(index: usize, value: Option<&Value>, field: &'static str) -> RollupResult<f64> {
    let coordinate = value
        .ok_or_else(|| missing(index, field))?
        .as_f64()
        .ok_or_else(|| invalid(index, field, "expected a number".into()))?;
    finite(index, coordinate, field)
}

/// One row of a CSV export; empty cells and absent columns both read as `None`.
#[derive(Debug, Deserialize)]
struct CsvRecord {
    #[serde(rename = "entityId", alias = "entity_id", alias = "id")]
    entity_id: Option<String>,
    timestamp: Option<String>,
    latitude: Option<String>,
    longitude: Option<String>,
}

/// Decodes a CSV export with a header row.
pub fn parse_csv_fixes(bytes: &[u8]) -> RollupResult<Vec<RawFix>> {
    let mut rdr = csv::Reader::from_reader(bytes);
    let mut fixes = Vec::new();

    for (index, result) in rdr.deserialize().enumerate() {
        let record: CsvRecord = result?;
        fixes.push(csv_record(index, record)?);
    }

    Ok(fixes)
}

fn csv_record(index: usize, record: CsvRecord) -> RollupResult<RawFix> {
    let raw_id = record.entity_id.ok_or_else(|| missing(index, "entityId"))?;
    let entity_id = match raw_id.trim().parse::<i64>() {
        Ok(id) => EntityId::Int(id),
        Err(_) => EntityId::Text(raw_id),
    };

    let raw_ts = record.timestamp.ok_or_else(|| missing(index, "timestamp"))?;
    let timestamp = raw_ts
        .trim()
        .parse::<i64>()
        .map_err(|e| invalid(index, "timestamp", e.to_string()))?;

    Ok(RawFix {
        entity_id,
        timestamp: epoch_seconds(index, timestamp)?,
        latitude: csv_coordinate(index, record.latitude, "latitude")?,
        longitude: csv_coordinate(index, record.longitude, "longitude")?,
    })
}

fn csv_coordinate(index: usize, value: Option<String>, field: &'static str) -> RollupResult<f64> {
    let coordinate = value
        .ok_or_else(|| missing(index, field))?
        .trim()
        .parse::<f64>()
        .map_err(|e| invalid(index, field, e.to_string()))?;
    finite(index, coordinate, field)
}

/// `f64::from_str` accepts `NaN` and `inf`; neither can be averaged or
/// serialized as a JSON number.
fn finite(index: usize, coordinate: f64, field: &'static str) -> RollupResult<f64> {
    if coordinate.is_finite() {
        Ok(coordinate)
    } else {
        Err(invalid(index, field, "not a finite number".into()))
    }
}

/// Returns true for `http://` and `https://` sources.
pub fn is_remote(source: &str) -> bool {
    reqwest::Url::parse(source)
        .map(|url| matches!(url.scheme(), "http" | "https"))
        .unwrap_or(false)
}

/// Picks the decoder from the source name: `.csv` is CSV, anything else JSON.
///
/// For URLs only the path counts, so query strings do not hide the extension.
pub fn parse_source(name: &str, bytes: &[u8]) -> RollupResult<Vec<RawFix>> {
    let path = match reqwest::Url::parse(name) {
        Ok(url) if is_remote(name) => url.path().to_string(),
        _ => name.to_string(),
    };

    if path.to_ascii_lowercase().ends_with(".csv") {
        parse_csv_fixes(bytes)
    } else {
        parse_fixes(bytes)
    }
}

fn epoch_seconds(index: usize, secs: i64) -> RollupResult<DateTime<Utc>> {
    Utc.timestamp_opt(secs, 0)
        .single()
        .ok_or_else(|| invalid(index, "timestamp", format!("{secs} is out of range")))
}

fn missing(index: usize, field: &'static str) -> RollupError {
    RollupError::MissingField { index, field }
}

fn invalid(index: usize, field: &'static str, reason: String) -> RollupError {
    RollupError::InvalidField {
        index,
        field,
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bare_array() {
        let json = br#"[
            {"entityId": 42, "timestamp": 1700000000, "latitude": -24.5, "longitude": 31.2, "temperature": 28.0},
            {"entityId": "collar-9", "timestamp": 1700086400, "latitude": -24.6, "longitude": 31.3}
        ]"#;
        let fixes = parse_fixes(json).unwrap();

        assert_eq!(fixes.len(), 2);
        assert_eq!(fixes[0].entity_id, EntityId::Int(42));
        assert_eq!(fixes[0].timestamp.timestamp(), 1_700_000_000);
        assert_eq!(fixes[0].latitude, -24.5);
        assert_eq!(fixes[1].entity_id, EntityId::from("collar-9"));
    }

    #[test]
    fn test_parse_wrapped_data_with_alias() {
        let json = br#"{"count": 1, "data": [
            {"entity_id": 7, "timestamp": 1700000000, "latitude": -1, "longitude": 2}
        ]}"#;
        let fixes = parse_fixes(json).unwrap();

        assert_eq!(fixes[0].entity_id, EntityId::Int(7));
        assert_eq!(fixes[0].latitude, -1.0);
        assert_eq!(fixes[0].longitude, 2.0);
    }

    #[test]
    fn test_parse_empty_array() {
        assert!(parse_fixes(b"[]").unwrap().is_empty());
    }

    #[test]
    fn test_missing_latitude_fails() {
        let json = br#"[
            {"entityId": 1, "timestamp": 1, "latitude": -1.0, "longitude": 2.0},
            {"entityId": 1, "timestamp": 2, "longitude": 2.0}
        ]"#;
        let err = parse_fixes(json).unwrap_err();

        assert!(matches!(
            err,
            RollupError::MissingField {
                index: 1,
                field: "latitude"
            }
        ));
    }

    #[test]
    fn test_null_counts_as_missing() {
        let json = br#"[{"entityId": null, "timestamp": 1, "latitude": -1.0, "longitude": 2.0}]"#;
        let err = parse_fixes(json).unwrap_err();
        assert!(matches!(err, RollupError::MissingField { field: "entityId", .. }));
    }

    #[test]
    fn test_fractional_timestamp_is_invalid() {
        let json = br#"[{"entityId": 1, "timestamp": 1.5, "latitude": -1.0, "longitude": 2.0}]"#;
        let err = parse_fixes(json).unwrap_err();
        assert!(matches!(err, RollupError::InvalidField { field: "timestamp", .. }));
    }

    #[test]
    fn test_string_coordinate_is_invalid() {
        let json = br#"[{"entityId": 1, "timestamp": 1, "latitude": "-1.0", "longitude": 2.0}]"#;
        let err = parse_fixes(json).unwrap_err();
        assert!(matches!(err, RollupError::InvalidField { field: "latitude", .. }));
    }

    #[test]
    fn test_unsupported_payload() {
        assert!(matches!(
            parse_fixes(br#"{"items": []}"#).unwrap_err(),
            RollupError::UnsupportedPayload(_)
        ));
        assert!(matches!(
            parse_fixes(b"42").unwrap_err(),
            RollupError::UnsupportedPayload(_)
        ));
        assert!(matches!(parse_fixes(b"{not json").unwrap_err(), RollupError::Json(_)));
    }

    #[test]
    fn test_parse_csv() {
        let csv = b"entityId,timestamp,latitude,longitude,voltage\n\
                    42,1700000000,-24.5,31.2,3.7\n\
                    zebra-1,1700086400,-24.6,31.3,3.6\n";
        let fixes = parse_csv_fixes(csv).unwrap();

        assert_eq!(fixes.len(), 2);
        assert_eq!(fixes[0].entity_id, EntityId::Int(42));
        assert_eq!(fixes[1].entity_id, EntityId::from("zebra-1"));
        assert_eq!(fixes[1].longitude, 31.3);
    }

    #[test]
    fn test_csv_missing_column_fails() {
        let csv = b"entityId,timestamp,latitude\n42,1700000000,-24.5\n";
        let err = parse_csv_fixes(csv).unwrap_err();
        assert!(matches!(err, RollupError::MissingField { index: 0, field: "longitude" }));
    }

    #[test]
    fn test_csv_empty_cell_fails() {
        let csv = b"entityId,timestamp,latitude,longitude\n42,,-24.5,31.0\n";
        let err = parse_csv_fixes(csv).unwrap_err();
        assert!(matches!(err, RollupError::MissingField { field: "timestamp", .. }));
    }

    #[test]
    fn test_csv_non_finite_coordinates_fail() {
        let cases = [
            ("NaN", "31.0", "latitude"),
            ("-inf", "31.0", "latitude"),
            ("-24.5", "NaN", "longitude"),
            ("-24.5", "inf", "longitude"),
        ];
        for (lat, lng, bad) in cases {
            let csv = format!("entityId,timestamp,latitude,longitude\n1,1709251200,{lat},{lng}\n");
            let err = parse_csv_fixes(csv.as_bytes()).unwrap_err();
            match err {
                RollupError::InvalidField { index, field, reason } => {
                    assert_eq!(index, 0);
                    assert_eq!(field, bad);
                    assert_eq!(reason, "not a finite number");
                }
                other => panic!("unexpected error for ({lat}, {lng}): {other}"),
            }
        }
    }

    #[test]
    fn test_finite_guard_shared_by_both_decoders() {
        assert_eq!(finite(0, -24.5, "latitude").unwrap(), -24.5);
        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert!(matches!(
                finite(3, bad, "longitude"),
                Err(RollupError::InvalidField { index: 3, field: "longitude", .. })
            ));
        }
    }

    #[test]
    fn test_json_coordinates_accept_finite_only() {
        // JSON has no NaN literal; an overflowing number must not slip through as inf.
        let json = br#"[{"entityId": 1, "timestamp": 1, "latitude": -1e400, "longitude": 2.0}]"#;
        match parse_fixes(json) {
            Err(RollupError::InvalidField { field, .. }) => assert_eq!(field, "latitude"),
            Err(RollupError::Json(_)) => {}
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[test]
    fn test_is_remote() {
        assert!(is_remote("https://api.example.org/export.json"));
        assert!(is_remote("http://localhost:8080/data"));
        assert!(!is_remote("httpdump.json"));
        assert!(!is_remote("data/export.csv"));
    }

    #[test]
    fn test_parse_source_dispatches_on_url_path() {
        let csv = b"id,timestamp,latitude,longitude\n1,0,-1,1\n";
        let fixes = parse_source("https://example.org/export.csv?token=abc", csv).unwrap();
        assert_eq!(fixes.len(), 1);
        assert!(parse_source("https://example.org/data?format=.csv", csv).is_err());
    }

    #[test]
    fn test_parse_source_dispatch() {
        let csv = b"id,timestamp,latitude,longitude\n1,0,-1,1\n";
        assert_eq!(parse_source("export.CSV", csv).unwrap().len(), 1);
        assert!(parse_source("export.json", csv).is_err());
    }
}
