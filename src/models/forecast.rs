// src/models/forecast.rs

//! Forecast record produced by the prediction pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Ordered path prediction: a time-stamped coordinate sequence.
///
/// `coordinates` and `time_points` are index-aligned.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct PathPrediction {
    /// [longitude, latitude] pairs
    pub coordinates: Vec<[f64; 2]>,
    /// ISO-8601 timestamps, one per coordinate
    pub time_points: Vec<String>,
    pub confidence_level: f64,
}

/// Ordered intensity forecast: parallel arrays per time point.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct IntensityForecast {
    /// mph values, one per time point
    pub wind_speeds: Vec<f64>,
    /// mb values, one per time point
    pub pressures: Vec<f64>,
    /// Saffir–Simpson labels, one per time point
    pub categories: Vec<String>,
    pub time_points: Vec<String>,
}

/// Landfall assessment.
///
/// Location and time are populated only when the probability clears the
/// reporting threshold.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct LandfallAssessment {
    /// 0–1 probability of landfall within the forecast window
    pub probability: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_time: Option<String>,
}

impl LandfallAssessment {
    /// Minimum probability below which location/time are not reported.
    pub const REPORTING_THRESHOLD: f64 = 0.3;
}

/// A structured multi-day forecast for one tracked storm.
///
/// One storm accumulates many forecast records over time; "latest" is
/// selected by creation time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Forecast {
    /// Store-assigned monotonic sequence id (0 until appended)
    #[serde(default)]
    pub id: u64,

    /// Owning storm id
    pub storm_id: String,

    pub path_prediction: PathPrediction,
    pub intensity_forecast: IntensityForecast,
    pub landfall: LandfallAssessment,

    /// Free-text rationale from the oracle
    pub analysis: String,

    /// Overall forecast confidence, 0–1
    pub confidence: f64,

    /// Stamped locally at normalization time, never taken from the oracle
    pub created_at: DateTime<Utc>,

    /// End of the validity window (one advisory cycle)
    pub valid_until: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_landfall_defaults_have_no_location() {
        let landfall = LandfallAssessment::default();
        assert_eq!(landfall.probability, 0.0);
        assert!(landfall.estimated_location.is_none());
        assert!(landfall.estimated_time.is_none());
    }
}
