// src/models/storm.rs

//! Tracked storm entity.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Where a storm record came from.
///
/// Records synthesized from the active-storms bulletin during fallback are
/// tagged so they can never be mistaken for feed-derived data.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StormOrigin {
    /// Materialized from a track-geometry feed snapshot
    #[default]
    Feed,
    /// Synthesized from the secondary active-storms bulletin
    Bulletin,
}

/// A tracked storm with its current observed state.
///
/// Keyed by a stable slug derived from the name. Refreshes overwrite the
/// whole record; storms are deactivated rather than deleted so trend analysis
/// keeps its history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Storm {
    /// Stable identifier derived from the name (e.g. "hurricane-test")
    pub id: String,

    /// Display name as reported upstream
    pub name: String,

    /// Category label (Saffir–Simpson or depression/storm)
    pub category: String,

    /// Maximum sustained wind in mph
    pub wind_speed: f64,

    /// Minimum central pressure in mb
    pub pressure: f64,

    pub latitude: f64,
    pub longitude: f64,

    /// Movement descriptor (e.g. "NW at 12 mph")
    pub movement: String,

    /// When the storm was last observed upstream
    pub last_update: DateTime<Utc>,

    /// When the next advisory is expected
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_update: Option<DateTime<Utc>>,

    /// Raw forecast-track feature, when the feed supplied one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forecast_track: Option<serde_json::Value>,

    pub is_active: bool,

    #[serde(default)]
    pub origin: StormOrigin,
}

impl Storm {
    /// Derive the stable slug id from a storm name.
    pub fn slug(name: &str) -> String {
        name.trim()
            .to_lowercase()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("-")
    }

    /// Classify wind speed (mph) into a Saffir–Simpson category label.
    pub fn categorize_by_wind(wind_speed: f64) -> &'static str {
        if wind_speed >= 157.0 {
            "Category 5 Hurricane"
        } else if wind_speed >= 130.0 {
            "Category 4 Hurricane"
        } else if wind_speed >= 111.0 {
            "Category 3 Hurricane"
        } else if wind_speed >= 96.0 {
            "Category 2 Hurricane"
        } else if wind_speed >= 74.0 {
            "Category 1 Hurricane"
        } else if wind_speed >= 39.0 {
            "Tropical Storm"
        } else {
            "Tropical Depression"
        }
    }

    /// Advisory cadence: the next update is expected six hours after the last.
    pub fn next_advisory(last_update: DateTime<Utc>) -> DateTime<Utc> {
        last_update + Duration::hours(6)
    }
}
