// src/pipeline/predict.rs

//! Forecast generation against the external reasoning oracle.
//!
//! The oracle is untrusted. Every field of its reply passes through a
//! validate-with-defaults step before anything is persisted: sequences
//! default to empty, confidences to 0.7, probabilities to 0, and parallel
//! arrays are truncated to a common length. Timestamps are always stamped
//! locally. A failed oracle call surfaces as `PredictionUnavailable` from
//! `generate`; the trend analysis instead degrades to a steady/0.5 default.

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::{
    Forecast, IntensityForecast, LandfallAssessment, PathPrediction, Storm,
};
use crate::pipeline::context::PredictionContext;
use crate::services::Oracle;

/// How far out the forecast reaches, in hours.
const FORECAST_HORIZON_HOURS: i64 = 120;

/// How long a generated forecast stays valid (one advisory cycle).
const VALIDITY_HOURS: i64 = 6;

const DEFAULT_CONFIDENCE: f64 = 0.7;
const DEFAULT_ANALYSIS: &str = "Analysis not available";

const FORECAST_SYSTEM_PROMPT: &str = "You are an advanced meteorological AI specializing in hurricane forecasting. \
Analyze current hurricane data and environmental conditions to generate detailed predictions. \
Your predictions should be based on meteorological principles including: \
sea surface temperatures and their impact on intensification, \
wind shear effects on storm organization, \
steering currents and atmospheric patterns, \
historical storm behavior in similar conditions, \
and pressure gradients and their influence on storm movement. \
Provide scientific, data-driven forecasts with confidence levels. \
Respond with JSON in the exact format specified.";

const TREND_SYSTEM_PROMPT: &str = "Analyze hurricane intensification potential based on current conditions. \
Consider pressure, wind speed trends, and environmental factors.";

/// Intensification trend classification.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Rapid,
    Gradual,
    #[default]
    Steady,
    Weakening,
}

impl Trend {
    fn parse(s: &str) -> Trend {
        match s.trim().to_lowercase().as_str() {
            "rapid" => Trend::Rapid,
            "gradual" => Trend::Gradual,
            "weakening" => Trend::Weakening,
            _ => Trend::Steady,
        }
    }
}

/// Result of an intensification-trend analysis.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrendAssessment {
    pub trend: Trend,
    pub rationale: String,
    pub confidence: f64,
}

impl TrendAssessment {
    /// The assessment returned when the oracle cannot be consulted.
    pub fn fallback() -> Self {
        Self {
            trend: Trend::Steady,
            rationale: "Unable to analyze due to technical error".to_string(),
            confidence: 0.5,
        }
    }
}

// Raw reply shapes. Everything is optional; absence is repaired during
// normalization, a type mismatch rejects the reply as a whole.

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawReply {
    #[serde(default)]
    path_prediction: RawPath,
    #[serde(default)]
    intensity_forecast: RawIntensity,
    #[serde(default)]
    landfall: RawLandfall,
    analysis: Option<String>,
    confidence: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPath {
    #[serde(default)]
    coordinates: Vec<[f64; 2]>,
    #[serde(default)]
    time_points: Vec<String>,
    confidence_level: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawIntensity {
    #[serde(default)]
    wind_speeds: Vec<f64>,
    #[serde(default)]
    pressures: Vec<f64>,
    #[serde(default)]
    categories: Vec<String>,
    #[serde(default)]
    time_points: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawLandfall {
    probability: Option<f64>,
    estimated_location: Option<String>,
    estimated_time: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawTrend {
    potential: Option<String>,
    reasoning: Option<String>,
    confidence: Option<f64>,
}

/// Forecast generation engine.
pub struct PredictionEngine {
    oracle: Arc<dyn Oracle>,
}

impl PredictionEngine {
    pub fn new(oracle: Arc<dyn Oracle>) -> Self {
        Self { oracle }
    }

    /// Generate a structured forecast for one storm.
    ///
    /// Fails with `PredictionUnavailable` when the oracle call fails or the
    /// reply cannot be read as the expected shape; callers must not invent
    /// forecast values on failure.
    pub async fn generate(&self, storm: &Storm, context: &PredictionContext) -> Result<Forecast> {
        let prompt = build_forecast_prompt(context);
        let reply = self
            .oracle
            .complete_json(FORECAST_SYSTEM_PROMPT, &prompt)
            .await?;

        let raw: RawReply = serde_json::from_value(reply)
            .map_err(|e| AppError::prediction(format!("oracle reply rejected: {e}")))?;

        Ok(normalize(&storm.id, raw))
    }

    /// Classify the storm's intensification trend.
    ///
    /// Degrades to the steady/0.5 fallback when the oracle cannot be
    /// consulted or replies unusably.
    pub async fn analyze_trend(&self, storm: &Storm) -> TrendAssessment {
        let prompt = build_trend_prompt(storm);

        let reply = match self.oracle.complete_json(TREND_SYSTEM_PROMPT, &prompt).await {
            Ok(reply) => reply,
            Err(error) => {
                log::warn!("Trend analysis for {} unavailable: {error}", storm.id);
                return TrendAssessment::fallback();
            }
        };

        let raw: RawTrend = serde_json::from_value(reply).unwrap_or_default();
        TrendAssessment {
            trend: raw.potential.as_deref().map(Trend::parse).unwrap_or_default(),
            rationale: raw
                .reasoning
                .unwrap_or_else(|| DEFAULT_ANALYSIS.to_string()),
            confidence: clamp_unit(raw.confidence.unwrap_or(DEFAULT_CONFIDENCE)),
        }
    }
}

/// Repair an accepted reply into a forecast record.
///
/// Local clock stamps `created_at`/`valid_until`; the oracle's own notion of
/// time is never trusted.
fn normalize(storm_id: &str, raw: RawReply) -> Forecast {
    let mut path = PathPrediction {
        coordinates: raw.path_prediction.coordinates,
        time_points: raw.path_prediction.time_points,
        confidence_level: clamp_unit(
            raw.path_prediction
                .confidence_level
                .unwrap_or(DEFAULT_CONFIDENCE),
        ),
    };
    align_path(&mut path);

    let mut intensity = IntensityForecast {
        wind_speeds: raw.intensity_forecast.wind_speeds,
        pressures: raw.intensity_forecast.pressures,
        categories: raw.intensity_forecast.categories,
        time_points: raw.intensity_forecast.time_points,
    };
    align_intensity(&mut intensity);

    // Path and intensity describe the same time points; when both are
    // present their lengths must agree.
    let path_len = path.coordinates.len();
    let intensity_len = intensity_length(&intensity);
    if path_len > 0 && intensity_len > 0 {
        let common = path_len.min(intensity_len);
        truncate_path(&mut path, common);
        truncate_intensity(&mut intensity, common);
    }

    let probability = clamp_unit(raw.landfall.probability.unwrap_or(0.0));
    let reportable = probability > LandfallAssessment::REPORTING_THRESHOLD;
    let landfall = LandfallAssessment {
        probability,
        estimated_location: raw.landfall.estimated_location.filter(|_| reportable),
        estimated_time: raw.landfall.estimated_time.filter(|_| reportable),
    };

    let created_at = Utc::now();
    Forecast {
        id: 0,
        storm_id: storm_id.to_string(),
        path_prediction: path,
        intensity_forecast: intensity,
        landfall,
        analysis: raw.analysis.unwrap_or_else(|| DEFAULT_ANALYSIS.to_string()),
        confidence: clamp_unit(raw.confidence.unwrap_or(DEFAULT_CONFIDENCE)),
        created_at,
        valid_until: created_at + Duration::hours(VALIDITY_HOURS),
    }
}

fn align_path(path: &mut PathPrediction) {
    if path.time_points.is_empty() || path.coordinates.is_empty() {
        return;
    }
    let common = path.coordinates.len().min(path.time_points.len());
    truncate_path(path, common);
}

fn truncate_path(path: &mut PathPrediction, len: usize) {
    path.coordinates.truncate(len);
    path.time_points.truncate(len);
}

/// Effective length of the intensity group: the shortest non-empty array.
fn intensity_length(intensity: &IntensityForecast) -> usize {
    [
        intensity.wind_speeds.len(),
        intensity.pressures.len(),
        intensity.categories.len(),
        intensity.time_points.len(),
    ]
    .into_iter()
    .filter(|&l| l > 0)
    .min()
    .unwrap_or(0)
}

/// Align the intensity arrays to the shortest non-empty one.
///
/// Truncating an empty (absent) array is a no-op, so absent arrays stay
/// absent rather than being padded.
fn align_intensity(intensity: &mut IntensityForecast) {
    let common = intensity_length(intensity);
    if common > 0 {
        truncate_intensity(intensity, common);
    }
}

fn truncate_intensity(intensity: &mut IntensityForecast, len: usize) {
    intensity.wind_speeds.truncate(len);
    intensity.pressures.truncate(len);
    intensity.categories.truncate(len);
    intensity.time_points.truncate(len);
}

fn clamp_unit(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}

fn build_forecast_prompt(context: &PredictionContext) -> String {
    format!(
        "Analyze this hurricane and provide a detailed forecast:\n\n\
CURRENT HURRICANE DATA:\n\
- Name: {name}\n\
- Position: {lat}°N, {lon}°W\n\
- Maximum Sustained Winds: {wind} mph\n\
- Minimum Central Pressure: {pressure} mb\n\
- Movement: {movement}\n\
- Current Category: {category}\n\
- Last Update: {last_update}\n\n\
ENVIRONMENTAL CONDITIONS:\n\
- Sea Surface Temperature: {sst}°C\n\
- Atmospheric Pressure: {ambient} hPa\n\
- Wind Shear: {shear} knots\n\
- Ocean Currents: {currents}\n\n\
PREDICTION REQUIREMENTS:\n\
Generate a {horizon}-hour forecast including:\n\
1. Storm track with 12-hour interval coordinates\n\
2. Intensity changes (wind speed, pressure, category)\n\
3. Landfall probability and potential impact areas\n\
4. Meteorological analysis explaining the forecast\n\n\
Respond with JSON in this exact format:\n\
{{\n\
  \"pathPrediction\": {{\n\
    \"coordinates\": [[longitude, latitude], ...],\n\
    \"timePoints\": [\"2025-08-19T12:00:00Z\", ...],\n\
    \"confidenceLevel\": 0.85\n\
  }},\n\
  \"intensityForecast\": {{\n\
    \"windSpeeds\": [130, 125, 120, ...],\n\
    \"pressures\": [947, 950, 955, ...],\n\
    \"categories\": [\"Category 4\", \"Category 4\", \"Category 3\", ...],\n\
    \"timePoints\": [\"2025-08-19T12:00:00Z\", ...]\n\
  }},\n\
  \"landfall\": {{\n\
    \"probability\": 0.75,\n\
    \"estimatedLocation\": \"North Carolina Coast\",\n\
    \"estimatedTime\": \"2025-08-22T18:00:00Z\"\n\
  }},\n\
  \"analysis\": \"Detailed meteorological analysis explaining the forecast reasoning.\",\n\
  \"confidence\": 0.8\n\
}}",
        name = context.storm_name,
        lat = context.latitude,
        lon = context.longitude,
        wind = context.wind_speed,
        pressure = context.pressure,
        movement = context.movement,
        category = context.category,
        last_update = context.last_update.to_rfc3339(),
        sst = context.sea_temperature,
        ambient = context.atmospheric_pressure,
        shear = context.wind_shear,
        currents = context.ocean_currents,
        horizon = FORECAST_HORIZON_HOURS,
    )
}

fn build_trend_prompt(storm: &Storm) -> String {
    format!(
        "Analyze intensification potential for {name}:\n\
Current winds: {wind} mph\n\
Pressure: {pressure} mb\n\
Movement: {movement}\n\n\
Classify as: rapid, gradual, weakening, or steady\n\
Provide reasoning and confidence (0-1).\n\n\
Respond with JSON: {{\"potential\": \"rapid\", \"reasoning\": \"explanation\", \"confidence\": 0.8}}",
        name = storm.name,
        wind = storm.wind_speed,
        pressure = storm.pressure,
        movement = storm.movement,
    )
}
