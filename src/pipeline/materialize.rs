// src/pipeline/materialize.rs

//! Storm materialization from track-geometry payloads.
//!
//! Turns named-storm features of a geometry snapshot into storm records.
//! Pure data transformation; malformed features are skipped, never fatal.

use chrono::{DateTime, Utc};

use crate::models::{Storm, StormOrigin};

/// Convert every named-storm feature in a geometry payload into a storm.
///
/// A feature qualifies when its properties carry a `STORMNAME`. Missing
/// scalar properties default to zero rather than dropping the storm, matching
/// the upstream service's habit of omitting fields between advisories.
pub fn storms_from_features(data: &serde_json::Value) -> Vec<Storm> {
    let Some(features) = data.get("features").and_then(|f| f.as_array()) else {
        return Vec::new();
    };

    let mut storms = Vec::new();
    for feature in features {
        let Some(properties) = feature.get("properties") else {
            continue;
        };
        let Some(name) = properties.get("STORMNAME").and_then(|n| n.as_str()) else {
            continue;
        };
        if name.trim().is_empty() {
            continue;
        }

        let wind_speed = number(properties, "MAXWIND");
        let pressure = number(properties, "MSLP");
        let (longitude, latitude) = point_of(feature);

        let movement = match (
            properties.get("TCDIRECTION").and_then(|d| d.as_str()),
            properties.get("TCSPEED"),
        ) {
            (Some(direction), Some(speed)) => format!("{direction} at {} mph", scalar(speed)),
            _ => "Unknown".to_string(),
        };

        let last_update = synoptic_time(properties).unwrap_or_else(Utc::now);

        storms.push(Storm {
            id: Storm::slug(name),
            name: name.to_string(),
            category: Storm::categorize_by_wind(wind_speed).to_string(),
            wind_speed,
            pressure,
            latitude,
            longitude,
            movement,
            last_update,
            next_update: Some(Storm::next_advisory(last_update)),
            forecast_track: Some(feature.clone()),
            is_active: true,
            origin: StormOrigin::Feed,
        });
    }

    storms
}

fn number(properties: &serde_json::Value, key: &str) -> f64 {
    properties.get(key).map(scalar).unwrap_or(0.0)
}

/// Coerce a JSON scalar to f64; the service reports numbers as either.
fn scalar(value: &serde_json::Value) -> f64 {
    match value {
        serde_json::Value::Number(n) => n.as_f64().unwrap_or(0.0),
        serde_json::Value::String(s) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

fn point_of(feature: &serde_json::Value) -> (f64, f64) {
    let coordinates = feature.pointer("/geometry/coordinates");
    let at = |i: usize| {
        coordinates
            .and_then(|c| c.get(i))
            .and_then(|v| v.as_f64())
            .unwrap_or(0.0)
    };
    (at(0), at(1))
}

/// The advisory's synoptic time: epoch milliseconds or an ISO timestamp.
fn synoptic_time(properties: &serde_json::Value) -> Option<DateTime<Utc>> {
    match properties.get("SYNOPTIC")? {
        serde_json::Value::Number(n) => {
            let millis = n.as_i64()?;
            DateTime::from_timestamp_millis(millis)
        }
        serde_json::Value::String(s) => s
            .parse::<DateTime<Utc>>()
            .ok()
            .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|t| t.to_utc())),
        _ => None,
    }
}
