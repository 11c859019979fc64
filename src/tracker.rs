// src/tracker.rs

//! Core facade exposing the operations the route layer dispatches to.
//!
//! Owns the store, the feed adapters, and the optional oracle. Every
//! operation here is safe to call concurrently with a refresh cycle.

use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::models::{
    Config, FeedFamily, FeedKind, Forecast, Snapshot, Storm, SystemStatus,
};
use crate::pipeline::context::{EnvironmentInputs, build_context};
use crate::pipeline::predict::{PredictionEngine, TrendAssessment};
use crate::pipeline::refresh::{RefreshOutcome, run_refresh};
use crate::pipeline::status::compute_status;
use crate::services::{
    ActiveStormSource, GriddedFeed, HttpOracle, OceanFeed, Oracle, SourceAdapter, TrackFeed,
};
use crate::storage::SnapshotStore;

/// Core application facade.
pub struct Tracker {
    config: Arc<Config>,
    store: Arc<dyn SnapshotStore>,
    adapters: Vec<Arc<dyn SourceAdapter>>,
    bulletin: Option<Arc<dyn ActiveStormSource>>,
    engine: Option<PredictionEngine>,
}

impl Tracker {
    /// Assemble a tracker from injected parts. Tests use this directly.
    pub fn new(
        config: Arc<Config>,
        store: Arc<dyn SnapshotStore>,
        adapters: Vec<Arc<dyn SourceAdapter>>,
        bulletin: Option<Arc<dyn ActiveStormSource>>,
        oracle: Option<Arc<dyn Oracle>>,
    ) -> Self {
        Self {
            config,
            store,
            adapters,
            bulletin,
            engine: oracle.map(PredictionEngine::new),
        }
    }

    /// Assemble a tracker with the real upstream adapters.
    ///
    /// An unconfigured oracle leaves forecasting disabled instead of failing
    /// startup; the status view reports limited mode.
    pub fn from_config(config: Arc<Config>, store: Arc<dyn SnapshotStore>) -> Result<Self> {
        let track = Arc::new(TrackFeed::new(Arc::clone(&config), Arc::clone(&store))?);
        let gridded = Arc::new(GriddedFeed::new(Arc::clone(&config), Arc::clone(&store))?);
        let ocean = Arc::new(OceanFeed::new(Arc::clone(&config), Arc::clone(&store)));

        let adapters: Vec<Arc<dyn SourceAdapter>> =
            vec![Arc::clone(&track) as Arc<dyn SourceAdapter>, gridded, ocean];
        let bulletin: Option<Arc<dyn ActiveStormSource>> = Some(track);

        let oracle: Option<Arc<dyn Oracle>> = if config.oracle.is_configured() {
            Some(Arc::new(HttpOracle::new(&config)?))
        } else {
            log::warn!("Forecast oracle not configured; running in limited mode");
            None
        };

        Ok(Self::new(config, store, adapters, bulletin, oracle))
    }

    pub fn store(&self) -> &Arc<dyn SnapshotStore> {
        &self.store
    }

    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    pub fn adapters(&self) -> &[Arc<dyn SourceAdapter>] {
        &self.adapters
    }

    pub fn bulletin(&self) -> Option<&Arc<dyn ActiveStormSource>> {
        self.bulletin.as_ref()
    }

    /// Run one refresh cycle now, independent of the scheduled timer.
    pub async fn refresh(&self) -> Result<RefreshOutcome> {
        run_refresh(
            &self.config,
            &self.store,
            &self.adapters,
            self.bulletin.as_ref(),
        )
        .await
    }

    /// All currently active storms.
    pub async fn active_storms(&self) -> Result<Vec<Storm>> {
        self.store.list_storms(true).await
    }

    /// One storm by id.
    pub async fn storm(&self, id: &str) -> Result<Storm> {
        self.store
            .get_storm(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("storm {id}")))
    }

    /// Latest snapshot for a (family, kind), fetching synchronously when the
    /// store has none yet.
    pub async fn latest_snapshot(&self, family: FeedFamily, kind: FeedKind) -> Result<Snapshot> {
        if kind.family() != family {
            return Err(AppError::config(format!(
                "kind {kind} does not belong to family {family}"
            )));
        }

        if let Some(snapshot) = self.store.latest_snapshot(family, kind).await? {
            return Ok(snapshot);
        }

        let adapter = self
            .adapters
            .iter()
            .find(|a| a.kinds().contains(&kind))
            .ok_or_else(|| AppError::not_found(format!("no adapter serves {family}/{kind}")))?;

        // The adapter appends on success, so the returned snapshot is the
        // store's new latest.
        adapter.fetch(kind).await
    }

    /// Current system-status view. Never fetches.
    pub async fn status(&self) -> Result<SystemStatus> {
        compute_status(&self.config, self.store.as_ref()).await
    }

    /// Forecast history, optionally narrowed to one storm.
    pub async fn list_forecasts(&self, storm_id: Option<&str>) -> Result<Vec<Forecast>> {
        self.store.list_forecasts(storm_id).await
    }

    /// Latest forecast for a storm.
    pub async fn latest_forecast(&self, storm_id: &str) -> Result<Forecast> {
        self.store
            .latest_forecast(storm_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("no forecast for storm {storm_id}")))
    }

    /// Generate, persist, and return a fresh forecast for a storm.
    pub async fn generate_forecast(&self, storm_id: &str) -> Result<Forecast> {
        let storm = self.storm(storm_id).await?;
        let engine = self
            .engine
            .as_ref()
            .ok_or_else(|| AppError::prediction("forecast oracle is not configured"))?;

        let pressure = self
            .store
            .latest_snapshot(FeedFamily::GriddedWeather, FeedKind::Pressure)
            .await?;
        let wind = self
            .store
            .latest_snapshot(FeedFamily::GriddedWeather, FeedKind::Wind)
            .await?;
        let currents = self
            .store
            .latest_snapshot(FeedFamily::OceanField, FeedKind::Currents)
            .await?;

        let context = build_context(
            &storm,
            EnvironmentInputs {
                pressure: pressure.as_ref(),
                wind: wind.as_ref(),
                currents: currents.as_ref(),
            },
        );

        let forecast = engine.generate(&storm, &context).await?;
        self.store.append_forecast(forecast).await
    }

    /// Classify a storm's intensification trend.
    ///
    /// Degrades to the steady default when no oracle is configured, matching
    /// the engine's behavior on a failed oracle call.
    pub async fn analyze_intensification(&self, storm_id: &str) -> Result<TrendAssessment> {
        let storm = self.storm(storm_id).await?;
        match &self.engine {
            Some(engine) => Ok(engine.analyze_trend(&storm).await),
            None => Ok(TrendAssessment::fallback()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SnapshotPayload, StormOrigin};
    use crate::storage::MemoryStore;
    use async_trait::async_trait;
    use chrono::Utc;

    struct FakeOracle {
        reply: serde_json::Value,
    }

    #[async_trait]
    impl Oracle for FakeOracle {
        async fn complete_json(&self, _system: &str, _user: &str) -> Result<serde_json::Value> {
            Ok(self.reply.clone())
        }
    }

    struct FailingOracle;

    #[async_trait]
    impl Oracle for FailingOracle {
        async fn complete_json(&self, _system: &str, _user: &str) -> Result<serde_json::Value> {
            Err(AppError::prediction("oracle timed out"))
        }
    }

    struct OneShotAdapter {
        store: Arc<dyn SnapshotStore>,
    }

    #[async_trait]
    impl SourceAdapter for OneShotAdapter {
        fn family(&self) -> FeedFamily {
            FeedFamily::GriddedWeather
        }

        fn kinds(&self) -> &[FeedKind] {
            &[FeedKind::Temperature, FeedKind::Pressure, FeedKind::Wind]
        }

        async fn fetch(&self, kind: FeedKind) -> Result<Snapshot> {
            let snapshot = Snapshot::new(
                kind,
                Utc::now(),
                Snapshot::GLOBAL_BOUNDS,
                SnapshotPayload::Raster {
                    grib_url: Some("https://example.com/cycle".into()),
                    netcdf_url: None,
                    cog_url: None,
                    tile_url: None,
                },
                None,
            );
            self.store.append_snapshot(snapshot).await
        }
    }

    fn hurricane_test() -> Storm {
        let now = Utc::now();
        Storm {
            id: "hurricane-test".into(),
            name: "Hurricane Test".into(),
            category: "Category 4 Hurricane".into(),
            wind_speed: 130.0,
            pressure: 945.0,
            latitude: 30.0,
            longitude: -75.0,
            movement: "NW at 12 mph".into(),
            last_update: now,
            next_update: Some(Storm::next_advisory(now)),
            forecast_track: None,
            is_active: true,
            origin: StormOrigin::Feed,
        }
    }

    fn ten_point_reply() -> serde_json::Value {
        let coordinates: Vec<[f64; 2]> =
            (0..10).map(|i| [-75.0 - i as f64, 30.0 + i as f64]).collect();
        let time_points: Vec<String> = (0..10).map(|i| format!("t{i}")).collect();
        let categories = vec!["Category 4"; 10];
        serde_json::json!({
            "pathPrediction": {
                "coordinates": coordinates,
                "timePoints": time_points.clone(),
                "confidenceLevel": 0.85,
            },
            "intensityForecast": {
                "windSpeeds": [130, 128, 125, 120, 115, 110, 105, 100, 95, 90],
                "pressures": [945, 947, 950, 953, 957, 960, 964, 968, 972, 976],
                "categories": categories,
                "timePoints": time_points,
            },
            "landfall": { "probability": 0.2 },
            "analysis": "gradual weakening along a recurving track",
            "confidence": 0.85,
        })
    }

    fn tracker_with_oracle(
        store: Arc<dyn SnapshotStore>,
        oracle: Option<Arc<dyn Oracle>>,
    ) -> Tracker {
        Tracker::new(Arc::new(Config::default()), store, Vec::new(), None, oracle)
    }

    #[tokio::test]
    async fn test_generate_forecast_end_to_end() {
        let store: Arc<dyn SnapshotStore> = Arc::new(MemoryStore::new());
        store.upsert_storm(hurricane_test()).await.unwrap();

        let oracle: Arc<dyn Oracle> = Arc::new(FakeOracle {
            reply: ten_point_reply(),
        });
        let tracker = tracker_with_oracle(Arc::clone(&store), Some(oracle));

        let generated = tracker.generate_forecast("hurricane-test").await.unwrap();
        assert_eq!(generated.path_prediction.coordinates.len(), 10);
        assert_eq!(generated.confidence, 0.85);

        // Retrievable through the latest-forecast contract.
        let latest = tracker.latest_forecast("hurricane-test").await.unwrap();
        assert_eq!(latest.id, generated.id);
        assert_eq!(latest.path_prediction.coordinates.len(), 10);
        assert_eq!(latest.path_prediction.confidence_level, 0.85);
    }

    #[tokio::test]
    async fn test_oracle_failure_writes_no_forecast() {
        let store: Arc<dyn SnapshotStore> = Arc::new(MemoryStore::new());
        store.upsert_storm(hurricane_test()).await.unwrap();

        let tracker = tracker_with_oracle(Arc::clone(&store), Some(Arc::new(FailingOracle)));

        let error = tracker.generate_forecast("hurricane-test").await.unwrap_err();
        assert!(matches!(error, AppError::PredictionUnavailable(_)));
        assert!(
            store
                .latest_forecast("hurricane-test")
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_unknown_storm_is_not_found() {
        let store: Arc<dyn SnapshotStore> = Arc::new(MemoryStore::new());
        let tracker = tracker_with_oracle(store, None);

        assert!(matches!(
            tracker.storm("no-such-storm").await.unwrap_err(),
            AppError::NotFound(_)
        ));
        assert!(matches!(
            tracker.generate_forecast("no-such-storm").await.unwrap_err(),
            AppError::NotFound(_)
        ));
        assert!(matches!(
            tracker.latest_forecast("no-such-storm").await.unwrap_err(),
            AppError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_generate_without_oracle_is_prediction_unavailable() {
        let store: Arc<dyn SnapshotStore> = Arc::new(MemoryStore::new());
        store.upsert_storm(hurricane_test()).await.unwrap();
        let tracker = tracker_with_oracle(store, None);

        assert!(matches!(
            tracker.generate_forecast("hurricane-test").await.unwrap_err(),
            AppError::PredictionUnavailable(_)
        ));

        // Trend analysis degrades instead of failing.
        let assessment = tracker
            .analyze_intensification("hurricane-test")
            .await
            .unwrap();
        assert_eq!(assessment.confidence, 0.5);
    }

    #[tokio::test]
    async fn test_latest_snapshot_fetches_when_empty() {
        let store: Arc<dyn SnapshotStore> = Arc::new(MemoryStore::new());
        let adapters: Vec<Arc<dyn SourceAdapter>> = vec![Arc::new(OneShotAdapter {
            store: Arc::clone(&store),
        })];
        let tracker = Tracker::new(
            Arc::new(Config::default()),
            Arc::clone(&store),
            adapters,
            None,
            None,
        );

        // Empty store: the read triggers a synchronous fetch-and-store.
        let snapshot = tracker
            .latest_snapshot(FeedFamily::GriddedWeather, FeedKind::Pressure)
            .await
            .unwrap();
        assert!(snapshot.id > 0);

        // Second read is served from the store.
        let again = tracker
            .latest_snapshot(FeedFamily::GriddedWeather, FeedKind::Pressure)
            .await
            .unwrap();
        assert_eq!(again.id, snapshot.id);
    }

    #[tokio::test]
    async fn test_latest_snapshot_rejects_family_kind_mismatch() {
        let store: Arc<dyn SnapshotStore> = Arc::new(MemoryStore::new());
        let tracker = tracker_with_oracle(store, None);

        assert!(matches!(
            tracker
                .latest_snapshot(FeedFamily::OceanField, FeedKind::Pressure)
                .await
                .unwrap_err(),
            AppError::Config(_)
        ));
    }
}
