// src/services/bulletin.rs

//! Active-storms bulletin decoder.
//!
//! The bulletin is a KML document whose storm folders carry extended data in
//! a `tc:` namespace. Extraction works on the raw markup with regular
//! expressions; the bulletin's structure is shallow enough that a full XML
//! tree is not worth carrying.

use std::sync::OnceLock;

use chrono::Utc;
use regex::Regex;

use crate::models::{Storm, StormOrigin};

fn folder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?s)<Folder[^>]*id="[^"]*"[^>]*>(.*?)</Folder>"#)
            .expect("folder pattern is valid")
    })
}

fn extended_data_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)<ExtendedData[^>]*tc[^>]*>(.*?)</ExtendedData>")
            .expect("extended-data pattern is valid")
    })
}

/// Extract the text content of one `tc:` element.
fn extract_value(text: &str, tag: &str) -> Option<String> {
    let pattern = format!("(?s)<{tag}>(.*?)</{tag}>");
    let re = Regex::new(&pattern).ok()?;
    re.captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
}

/// Keep only the digits of a reported measurement (e.g. "85 kt" -> 85).
fn parse_measurement(value: Option<&str>) -> f64 {
    let digits: String = value
        .unwrap_or("")
        .chars()
        .filter(|c| c.is_ascii_digit())
        .collect();
    digits.parse().unwrap_or(0.0)
}

fn display_name(storm_type: Option<&str>, name: &str) -> String {
    let prefix = match storm_type {
        Some("HU") => "Hurricane",
        Some("TS") => "Tropical Storm",
        _ => "Tropical Depression",
    };
    format!("{prefix} {name}")
}

/// Decode every active storm advertised by the bulletin.
///
/// Folders missing a name or center position are skipped. Records are tagged
/// `Bulletin` so fallback-synthesized storms stay distinguishable from
/// feed-derived ones. An empty result means the bulletin listed no storms,
/// not that decoding failed.
pub fn parse_active_bulletin(kml: &str) -> Vec<Storm> {
    let mut storms = Vec::new();

    for folder in folder_re().captures_iter(kml) {
        let content = folder.get(1).map(|m| m.as_str()).unwrap_or("");
        let Some(tc_data) = extended_data_re()
            .captures(content)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str())
        else {
            continue;
        };

        let name = extract_value(tc_data, "tc:name");
        let storm_type = extract_value(tc_data, "tc:type");
        let lat: f64 = extract_value(tc_data, "tc:centerLat")
            .and_then(|v| v.parse().ok())
            .unwrap_or(0.0);
        let lon: f64 = extract_value(tc_data, "tc:centerLon")
            .and_then(|v| v.parse().ok())
            .unwrap_or(0.0);

        let Some(name) = name else { continue };
        if lat == 0.0 || lon == 0.0 {
            continue;
        }

        let advisory_time = extract_value(tc_data, "tc:dateTime");
        let movement = extract_value(tc_data, "tc:movement");
        let pressure = extract_value(tc_data, "tc:minimumPressure");
        let wind_speed = extract_value(tc_data, "tc:maxSustainedWind");
        let atcf_id = extract_value(tc_data, "tc:atcfID");

        let wind_speed = parse_measurement(wind_speed.as_deref());
        let pressure = parse_measurement(pressure.as_deref());
        let full_name = display_name(storm_type.as_deref(), &name);

        // The bulletin's advisory time is a local-format string; the record
        // is stamped with the fetch time and the raw string is kept for audit.
        let now = Utc::now();

        storms.push(Storm {
            id: Storm::slug(&full_name),
            name: full_name.clone(),
            category: Storm::categorize_by_wind(wind_speed).to_string(),
            wind_speed,
            pressure,
            latitude: lat,
            longitude: lon,
            movement: movement.unwrap_or_else(|| "Unknown".to_string()),
            last_update: now,
            next_update: Some(Storm::next_advisory(now)),
            forecast_track: Some(serde_json::json!({
                "type": "Feature",
                "properties": {
                    "STORMNAME": full_name,
                    "ATCF_ID": atcf_id,
                    "SOURCE": "active-bulletin",
                    "ADVISORY_TIME": advisory_time,
                },
                "geometry": {
                    "type": "Point",
                    "coordinates": [lon, lat],
                },
            })),
            is_active: true,
            origin: StormOrigin::Bulletin,
        });
    }

    storms
}
