// src/services/ocean.rs

//! Ocean-field feed adapter.
//!
//! The upstream catalog serves analysis/forecast datasets at stable
//! addresses; a fetch records a reference snapshot to the matching dataset.
//! Access requires account credentials, so a fetch without them fails
//! upstream-unavailable and the status view reports the family as missing
//! credentials.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use crate::error::{AppError, Result};
use crate::models::{Config, FeedFamily, FeedKind, Snapshot, SnapshotPayload};
use crate::services::SourceAdapter;
use crate::storage::SnapshotStore;

const KINDS: &[FeedKind] = &[FeedKind::Currents, FeedKind::Waves];

/// Adapter for the ocean-field feed family.
pub struct OceanFeed {
    config: Arc<Config>,
    store: Arc<dyn SnapshotStore>,
}

impl OceanFeed {
    pub fn new(config: Arc<Config>, store: Arc<dyn SnapshotStore>) -> Self {
        Self { config, store }
    }

    fn dataset_for(kind: FeedKind) -> Option<(&'static str, serde_json::Value)> {
        match kind {
            FeedKind::Currents => Some((
                "global-analysis-forecast-phy-001-024",
                serde_json::json!({
                    "source": "CMEMS",
                    "dataset": "GLOBAL_ANALYSISFORECAST_PHY_001_024",
                    "variables": ["uo", "vo"],
                    "resolution": "1/12°",
                }),
            )),
            FeedKind::Waves => Some((
                "global-analysis-forecast-wav-001-027",
                serde_json::json!({
                    "source": "CMEMS",
                    "dataset": "GLOBAL_ANALYSISFORECAST_WAV_001_027",
                    "variables": ["VHM0"],
                    "resolution": "1/12°",
                }),
            )),
            _ => None,
        }
    }
}

#[async_trait]
impl SourceAdapter for OceanFeed {
    fn family(&self) -> FeedFamily {
        FeedFamily::OceanField
    }

    fn kinds(&self) -> &[FeedKind] {
        KINDS
    }

    async fn fetch(&self, kind: FeedKind) -> Result<Snapshot> {
        let context = format!("ocean/{kind}");

        let Some((dataset, metadata)) = Self::dataset_for(kind) else {
            return Err(AppError::config(format!(
                "kind {kind} is not served by the ocean-field feed"
            )));
        };

        if !self.config.ocean.has_credentials() {
            return Err(AppError::upstream(&context, "credentials not configured"));
        }

        let netcdf_url = format!("{}/{dataset}", self.config.ocean.base_url);

        let snapshot = Snapshot::new(
            kind,
            Utc::now(),
            Snapshot::GLOBAL_BOUNDS,
            SnapshotPayload::Raster {
                grib_url: None,
                netcdf_url: Some(netcdf_url),
                cog_url: None,
                tile_url: None,
            },
            Some(metadata),
        );

        self.store.append_snapshot(snapshot).await
    }
}
