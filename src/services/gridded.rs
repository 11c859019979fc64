// src/services/gridded.rs

//! Gridded-weather feed adapter.
//!
//! Model output lands in public object storage as 6-hourly cycle files. The
//! adapter derives the current cycle's file URL from the clock, probes that
//! the object exists, and stores a raster-reference snapshot pointing at the
//! grib file and its tile rendering.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Timelike, Utc};
use reqwest::Client;

use crate::error::{AppError, Result};
use crate::models::{Config, FeedFamily, FeedKind, Snapshot, SnapshotPayload};
use crate::services::SourceAdapter;
use crate::storage::SnapshotStore;
use crate::utils::http;

const KINDS: &[FeedKind] = &[FeedKind::Temperature, FeedKind::Pressure, FeedKind::Wind];

/// Adapter for the gridded-weather feed family.
pub struct GriddedFeed {
    config: Arc<Config>,
    store: Arc<dyn SnapshotStore>,
    client: Client,
}

impl GriddedFeed {
    pub fn new(config: Arc<Config>, store: Arc<dyn SnapshotStore>) -> Result<Self> {
        let client = http::create_async_client(&config.fetch)?;
        Ok(Self {
            config,
            store,
            client,
        })
    }

    /// The most recent 6-hourly model cycle at or before `now`.
    fn cycle_for(now: DateTime<Utc>) -> (String, String) {
        let date = now.format("%Y%m%d").to_string();
        let hour = (now.hour() / 6) * 6;
        (date, format!("{hour:02}"))
    }

    fn grib_url(&self, date: &str, hour: &str) -> String {
        format!(
            "{}/gfs.{date}/{hour}/atmos/gfs.t{hour}z.pgrb2.0p25.f000",
            self.config.gridded.base_url
        )
    }

    /// Tile URL template for a converted raster, query-encoded.
    fn tile_url(&self, cog_url: &str) -> String {
        let encoded: String = url::form_urlencoded::byte_serialize(cog_url.as_bytes()).collect();
        format!(
            "{}/cog/tiles/WebMercatorQuad/{{z}}/{{x}}/{{y}}.png?url={encoded}",
            self.config.gridded.tiler_url
        )
    }
}

#[async_trait]
impl SourceAdapter for GriddedFeed {
    fn family(&self) -> FeedFamily {
        FeedFamily::GriddedWeather
    }

    fn kinds(&self) -> &[FeedKind] {
        KINDS
    }

    async fn fetch(&self, kind: FeedKind) -> Result<Snapshot> {
        if !KINDS.contains(&kind) {
            return Err(AppError::config(format!(
                "kind {kind} is not served by the gridded-weather feed"
            )));
        }

        let context = format!("gridded/{kind}");
        let now = Utc::now();
        let (date, hour) = Self::cycle_for(now);
        let grib_url = self.grib_url(&date, &hour);

        // Probe that the cycle file actually exists before recording it.
        let response = self
            .client
            .head(&grib_url)
            .send()
            .await
            .map_err(|e| AppError::upstream(&context, e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(AppError::upstream(&context, format!("HTTP {status}")));
        }

        let cog_url = format!("{}/sample-{kind}.tif", self.config.gridded.tiler_url);
        let tile_url = self.tile_url(&cog_url);

        let cycle_time = now
            .with_hour(hour.parse().unwrap_or(0))
            .and_then(|t| t.with_minute(0))
            .and_then(|t| t.with_second(0))
            .and_then(|t| t.with_nanosecond(0))
            .unwrap_or(now);

        let snapshot = Snapshot::new(
            kind,
            cycle_time,
            Snapshot::GLOBAL_BOUNDS,
            SnapshotPayload::Raster {
                grib_url: Some(grib_url),
                netcdf_url: None,
                cog_url: Some(cog_url),
                tile_url: Some(tile_url),
            },
            Some(serde_json::json!({
                "source": "GFS",
                "resolution": "0.25°",
                "forecast_hour": 0,
            })),
        );

        self.store.append_snapshot(snapshot).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_cycle_rounds_down_to_six_hours() {
        let at = Utc.with_ymd_and_hms(2025, 8, 19, 14, 30, 0).unwrap();
        let (date, hour) = GriddedFeed::cycle_for(at);
        assert_eq!(date, "20250819");
        assert_eq!(hour, "12");

        let midnight = Utc.with_ymd_and_hms(2025, 8, 19, 3, 0, 0).unwrap();
        assert_eq!(GriddedFeed::cycle_for(midnight).1, "00");
    }
}
