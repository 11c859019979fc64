// src/pipeline/context.rs

//! Prediction context assembly.
//!
//! Merges a storm's current state with a fixed, bounded set of environmental
//! scalars pulled from the latest snapshots. The oracle always receives a
//! complete context: fields the feeds cannot supply fall back to Atlantic
//! hurricane-season climatology.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{Snapshot, Storm};

/// Seasonal climatology used when an environmental field is unavailable.
pub mod climatology {
    /// Sea surface temperature, °C
    pub const SEA_TEMPERATURE_C: f64 = 28.5;
    /// Standard atmospheric pressure, hPa
    pub const ATMOSPHERIC_PRESSURE_HPA: f64 = 1013.2;
    /// Moderate wind shear, knots
    pub const WIND_SHEAR_KT: f64 = 10.0;
    /// Qualitative current descriptor
    pub const OCEAN_CURRENTS: &str = "Gulf Stream influence, warm water transport northward";
}

/// Latest environmental snapshots consulted during context assembly.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvironmentInputs<'a> {
    pub pressure: Option<&'a Snapshot>,
    pub wind: Option<&'a Snapshot>,
    pub currents: Option<&'a Snapshot>,
}

/// Bounded context handed to the forecast oracle.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PredictionContext {
    pub storm_name: String,
    pub category: String,
    pub latitude: f64,
    pub longitude: f64,
    /// mph
    pub wind_speed: f64,
    /// mb
    pub pressure: f64,
    pub movement: String,
    pub last_update: DateTime<Utc>,

    /// °C
    pub sea_temperature: f64,
    /// hPa
    pub atmospheric_pressure: f64,
    /// knots
    pub wind_shear: f64,
    pub ocean_currents: String,
}

/// Build the prediction context for one storm.
///
/// Pure and side-effect free; safe to call repeatedly.
pub fn build_context(storm: &Storm, env: EnvironmentInputs<'_>) -> PredictionContext {
    PredictionContext {
        storm_name: storm.name.clone(),
        category: storm.category.clone(),
        latitude: storm.latitude,
        longitude: storm.longitude,
        wind_speed: storm.wind_speed,
        pressure: storm.pressure,
        movement: storm.movement.clone(),
        last_update: storm.last_update,

        sea_temperature: metadata_number(env.currents, "sea_surface_temp_c")
            .unwrap_or(climatology::SEA_TEMPERATURE_C),
        atmospheric_pressure: metadata_number(env.pressure, "ambient_pressure_hpa")
            .unwrap_or(climatology::ATMOSPHERIC_PRESSURE_HPA),
        wind_shear: metadata_number(env.wind, "wind_shear_kt")
            .unwrap_or(climatology::WIND_SHEAR_KT),
        ocean_currents: metadata_text(env.currents, "current_summary")
            .unwrap_or_else(|| climatology::OCEAN_CURRENTS.to_string()),
    }
}

fn metadata_number(snapshot: Option<&Snapshot>, key: &str) -> Option<f64> {
    snapshot?
        .metadata
        .as_ref()?
        .get(key)?
        .as_f64()
}

fn metadata_text(snapshot: Option<&Snapshot>, key: &str) -> Option<String> {
    snapshot?
        .metadata
        .as_ref()?
        .get(key)?
        .as_str()
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FeedKind, SnapshotPayload};

    fn sample_storm() -> Storm {
        Storm {
            id: "hurricane-erin".into(),
            name: "Hurricane Erin".into(),
            category: "Category 4 Hurricane".into(),
            wind_speed: 130.0,
            pressure: 945.0,
            latitude: 31.2,
            longitude: -73.5,
            movement: "NNW at 13 mph".into(),
            last_update: Utc::now(),
            next_update: None,
            forecast_track: None,
            is_active: true,
            origin: Default::default(),
        }
    }

    #[test]
    fn test_climatology_defaults_when_snapshots_absent() {
        let context = build_context(&sample_storm(), EnvironmentInputs::default());
        assert_eq!(context.sea_temperature, climatology::SEA_TEMPERATURE_C);
        assert_eq!(
            context.atmospheric_pressure,
            climatology::ATMOSPHERIC_PRESSURE_HPA
        );
        assert_eq!(context.wind_shear, climatology::WIND_SHEAR_KT);
        assert_eq!(context.ocean_currents, climatology::OCEAN_CURRENTS);
        assert_eq!(context.wind_speed, 130.0);
    }

    #[test]
    fn test_snapshot_scalars_override_climatology() {
        let currents = Snapshot::new(
            FeedKind::Currents,
            Utc::now(),
            Snapshot::GLOBAL_BOUNDS,
            SnapshotPayload::Raster {
                grib_url: None,
                netcdf_url: Some("https://example.com/phy".into()),
                cog_url: None,
                tile_url: None,
            },
            Some(serde_json::json!({
                "sea_surface_temp_c": 29.4,
                "current_summary": "weak loop current",
            })),
        );

        let context = build_context(
            &sample_storm(),
            EnvironmentInputs {
                currents: Some(&currents),
                ..Default::default()
            },
        );
        assert_eq!(context.sea_temperature, 29.4);
        assert_eq!(context.ocean_currents, "weak loop current");
        // Untouched fields still fall back.
        assert_eq!(context.wind_shear, climatology::WIND_SHEAR_KT);
    }

    #[test]
    fn test_build_is_repeatable() {
        let storm = sample_storm();
        let a = build_context(&storm, EnvironmentInputs::default());
        let b = build_context(&storm, EnvironmentInputs::default());
        assert_eq!(a, b);
    }
}
