// src/services/track.rs

//! Track-geometry feed adapter.
//!
//! Wraps the public map-service layers carrying storm cones, forecast tracks,
//! and coastal warnings, plus the active-storms bulletin used as the
//! secondary live source during fallback.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;

use crate::error::{AppError, Result};
use crate::models::{Config, FeedFamily, FeedKind, Snapshot, SnapshotPayload, Storm};
use crate::services::bulletin::parse_active_bulletin;
use crate::services::{ActiveStormSource, SourceAdapter};
use crate::storage::SnapshotStore;
use crate::utils::http;

const KINDS: &[FeedKind] = &[FeedKind::Cones, FeedKind::Tracks, FeedKind::Warnings];

/// Adapter for the track-geometry feed family.
pub struct TrackFeed {
    config: Arc<Config>,
    store: Arc<dyn SnapshotStore>,
    client: Client,
}

impl TrackFeed {
    pub fn new(config: Arc<Config>, store: Arc<dyn SnapshotStore>) -> Result<Self> {
        let client = http::create_async_client(&config.fetch)?;
        Ok(Self {
            config,
            store,
            client,
        })
    }

    /// Ordered endpoint candidates for a kind.
    ///
    /// The cones layer is the one the map cannot render without, so it gets
    /// the alternate service as a failover; tracks and warnings use only the
    /// primary service.
    fn endpoints_for(&self, kind: FeedKind) -> Vec<String> {
        let base = &self.config.track.base_url;
        let alt = &self.config.track.alt_url;
        let query = "query?where=1%3D1&outFields=*&f=json";
        match kind {
            FeedKind::Cones => {
                let mut endpoints = vec![format!("{base}/0/{query}")];
                if !alt.is_empty() {
                    endpoints.push(format!("{alt}/0/{query}"));
                }
                endpoints
            }
            FeedKind::Tracks => vec![format!("{base}/1/{query}")],
            FeedKind::Warnings => vec![format!("{base}/2/{query}")],
            _ => Vec::new(),
        }
    }

    /// Query one endpoint and validate the payload shape.
    async fn query_endpoint(&self, kind: FeedKind, url: &str) -> Result<serde_json::Value> {
        let context = format!("track/{kind}");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::upstream(&context, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::upstream(&context, format!("HTTP {status}")));
        }

        let data: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AppError::format(&context, e))?;

        // The map service reports some errors with a 200 status.
        if data.get("error").is_some() {
            return Err(AppError::upstream(&context, "service-level error response"));
        }
        if !data.get("features").is_some_and(|f| f.is_array()) {
            return Err(AppError::format(&context, "missing features array"));
        }

        Ok(data)
    }
}

#[async_trait]
impl SourceAdapter for TrackFeed {
    fn family(&self) -> FeedFamily {
        FeedFamily::TrackGeometry
    }

    fn kinds(&self) -> &[FeedKind] {
        KINDS
    }

    async fn fetch(&self, kind: FeedKind) -> Result<Snapshot> {
        let endpoints = self.endpoints_for(kind);
        if endpoints.is_empty() {
            return Err(AppError::config(format!(
                "kind {kind} is not served by the track-geometry feed"
            )));
        }

        let mut last_error = AppError::upstream(format!("track/{kind}"), "no endpoint configured");
        for url in &endpoints {
            match self.query_endpoint(kind, url).await {
                Ok(data) => {
                    let snapshot = Snapshot::new(
                        kind,
                        Utc::now(),
                        Snapshot::ATLANTIC_BOUNDS,
                        SnapshotPayload::Geometry { data },
                        Some(serde_json::json!({
                            "source": "NHC",
                            "endpoint": url,
                        })),
                    );
                    return self.store.append_snapshot(snapshot).await;
                }
                Err(error) => {
                    log::warn!("Track endpoint failed ({url}): {error}");
                    last_error = error;
                }
            }
        }

        Err(last_error)
    }
}

#[async_trait]
impl ActiveStormSource for TrackFeed {
    /// Fetch and decode the active-storms bulletin.
    async fn active_storms(&self) -> Result<Vec<Storm>> {
        let url = &self.config.track.bulletin_url;
        if url.is_empty() {
            return Err(AppError::upstream("bulletin", "no bulletin URL configured"));
        }

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::upstream("bulletin", e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::upstream("bulletin", format!("HTTP {status}")));
        }

        let text = response
            .text()
            .await
            .map_err(|e| AppError::upstream("bulletin", e))?;

        Ok(parse_active_bulletin(&text))
    }
}
