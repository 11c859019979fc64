// src/storage/memory.rs

//! In-memory storage backend.
//!
//! Default backend for development and tests. All collections live behind a
//! single `RwLock`, so every read sees a point-in-time consistent view and
//! concurrent appends can never lose writes: the sequence counter is advanced
//! under the same write lock that inserts the record.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::Result;
use crate::models::{FeedFamily, FeedKind, Forecast, Snapshot, Storm};
use crate::storage::SnapshotStore;

#[derive(Debug, Default)]
struct Inner {
    snapshots: Vec<Snapshot>,
    storms: HashMap<String, Storm>,
    forecasts: Vec<Forecast>,
    seq: u64,
}

impl Inner {
    fn next_seq(&mut self) -> u64 {
        self.seq += 1;
        self.seq
    }
}

/// In-memory storage backend.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Select the latest snapshot among candidates: greatest timestamp, ties
/// broken by the monotonic append id.
fn latest_of<'a>(
    snapshots: impl Iterator<Item = &'a Snapshot>,
) -> Option<&'a Snapshot> {
    snapshots.max_by_key(|s| (s.timestamp, s.id))
}

#[async_trait]
impl SnapshotStore for MemoryStore {
    async fn append_snapshot(&self, mut snapshot: Snapshot) -> Result<Snapshot> {
        let mut inner = self.inner.write().await;
        snapshot.id = inner.next_seq();
        inner.snapshots.push(snapshot.clone());
        Ok(snapshot)
    }

    async fn latest_snapshot(
        &self,
        family: FeedFamily,
        kind: FeedKind,
    ) -> Result<Option<Snapshot>> {
        let inner = self.inner.read().await;
        Ok(latest_of(
            inner
                .snapshots
                .iter()
                .filter(|s| s.family == family && s.kind == kind),
        )
        .cloned())
    }

    async fn snapshots(
        &self,
        family: FeedFamily,
        kind: Option<FeedKind>,
    ) -> Result<Vec<Snapshot>> {
        let inner = self.inner.read().await;
        let mut matches: Vec<Snapshot> = inner
            .snapshots
            .iter()
            .filter(|s| s.family == family && kind.is_none_or(|k| s.kind == k))
            .cloned()
            .collect();
        matches.sort_by_key(|s| std::cmp::Reverse((s.timestamp, s.id)));
        Ok(matches)
    }

    async fn list_storms(&self, active_only: bool) -> Result<Vec<Storm>> {
        let inner = self.inner.read().await;
        let mut storms: Vec<Storm> = inner
            .storms
            .values()
            .filter(|s| !active_only || s.is_active)
            .cloned()
            .collect();
        storms.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(storms)
    }

    async fn get_storm(&self, id: &str) -> Result<Option<Storm>> {
        let inner = self.inner.read().await;
        Ok(inner.storms.get(id).cloned())
    }

    async fn upsert_storm(&self, storm: Storm) -> Result<Storm> {
        let mut inner = self.inner.write().await;
        inner.storms.insert(storm.id.clone(), storm.clone());
        Ok(storm)
    }

    async fn append_forecast(&self, mut forecast: Forecast) -> Result<Forecast> {
        let mut inner = self.inner.write().await;
        forecast.id = inner.next_seq();
        inner.forecasts.push(forecast.clone());
        Ok(forecast)
    }

    async fn latest_forecast(&self, storm_id: &str) -> Result<Option<Forecast>> {
        let inner = self.inner.read().await;
        Ok(inner
            .forecasts
            .iter()
            .filter(|f| f.storm_id == storm_id)
            .max_by_key(|f| (f.created_at, f.id))
            .cloned())
    }

    async fn list_forecasts(&self, storm_id: Option<&str>) -> Result<Vec<Forecast>> {
        let inner = self.inner.read().await;
        let mut matches: Vec<Forecast> = inner
            .forecasts
            .iter()
            .filter(|f| storm_id.is_none_or(|id| f.storm_id == id))
            .cloned()
            .collect();
        matches.sort_by_key(|f| std::cmp::Reverse((f.created_at, f.id)));
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SnapshotPayload;
    use chrono::{Duration, Utc};

    fn make_snapshot(kind: FeedKind, offset_mins: i64) -> Snapshot {
        Snapshot::new(
            kind,
            Utc::now() + Duration::minutes(offset_mins),
            Snapshot::GLOBAL_BOUNDS,
            SnapshotPayload::Geometry {
                data: serde_json::json!({"features": [], "offset": offset_mins}),
            },
            None,
        )
    }

    #[tokio::test]
    async fn test_latest_returns_greatest_timestamp() {
        let store = MemoryStore::new();
        store
            .append_snapshot(make_snapshot(FeedKind::Cones, 0))
            .await
            .unwrap();
        let newest = store
            .append_snapshot(make_snapshot(FeedKind::Cones, 30))
            .await
            .unwrap();
        store
            .append_snapshot(make_snapshot(FeedKind::Cones, 15))
            .await
            .unwrap();

        let latest = store
            .latest_snapshot(FeedFamily::TrackGeometry, FeedKind::Cones)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(latest.id, newest.id);
    }

    #[tokio::test]
    async fn test_latest_tie_broken_by_insertion_order() {
        let store = MemoryStore::new();
        let ts = Utc::now();
        let mut first = make_snapshot(FeedKind::Tracks, 0);
        first.timestamp = ts;
        let mut second = make_snapshot(FeedKind::Tracks, 0);
        second.timestamp = ts;

        store.append_snapshot(first).await.unwrap();
        let second = store.append_snapshot(second).await.unwrap();

        let latest = store
            .latest_snapshot(FeedFamily::TrackGeometry, FeedKind::Tracks)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(latest.id, second.id);
    }

    #[tokio::test]
    async fn test_latest_is_scoped_by_kind() {
        let store = MemoryStore::new();
        store
            .append_snapshot(make_snapshot(FeedKind::Cones, 60))
            .await
            .unwrap();

        let latest = store
            .latest_snapshot(FeedFamily::TrackGeometry, FeedKind::Warnings)
            .await
            .unwrap();
        assert!(latest.is_none());
    }

    #[tokio::test]
    async fn test_concurrent_appends_get_unique_ids() {
        let store = std::sync::Arc::new(MemoryStore::new());
        let mut handles = Vec::new();
        for i in 0..20 {
            let store = std::sync::Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store
                    .append_snapshot(make_snapshot(FeedKind::Wind, i))
                    .await
                    .unwrap()
                    .id
            }));
        }

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap());
        }
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 20);
    }

    #[tokio::test]
    async fn test_upsert_storm_replaces_whole_record() {
        let store = MemoryStore::new();
        let mut storm = Storm {
            id: "hurricane-ana".into(),
            name: "Hurricane Ana".into(),
            category: "Category 1 Hurricane".into(),
            wind_speed: 80.0,
            pressure: 985.0,
            latitude: 25.0,
            longitude: -70.0,
            movement: "NW at 10 mph".into(),
            last_update: Utc::now(),
            next_update: None,
            forecast_track: None,
            is_active: true,
            origin: Default::default(),
        };
        store.upsert_storm(storm.clone()).await.unwrap();

        storm.wind_speed = 100.0;
        storm.category = "Category 2 Hurricane".into();
        store.upsert_storm(storm).await.unwrap();

        let storms = store.list_storms(true).await.unwrap();
        assert_eq!(storms.len(), 1);
        assert_eq!(storms[0].wind_speed, 100.0);
    }

    #[tokio::test]
    async fn test_inactive_storms_filtered() {
        let store = MemoryStore::new();
        let mut storm = Storm {
            id: "ts-bob".into(),
            name: "Tropical Storm Bob".into(),
            category: "Tropical Storm".into(),
            wind_speed: 50.0,
            pressure: 1000.0,
            latitude: 20.0,
            longitude: -60.0,
            movement: "N at 8 mph".into(),
            last_update: Utc::now(),
            next_update: None,
            forecast_track: None,
            is_active: false,
            origin: Default::default(),
        };
        store.upsert_storm(storm.clone()).await.unwrap();
        assert!(store.list_storms(true).await.unwrap().is_empty());

        storm.is_active = true;
        store.upsert_storm(storm).await.unwrap();
        assert_eq!(store.list_storms(true).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_latest_forecast_by_creation_time() {
        let store = MemoryStore::new();
        let base = Utc::now();
        for (i, offset) in [0i64, 60, 30].iter().enumerate() {
            let forecast = Forecast {
                id: 0,
                storm_id: "hurricane-ana".into(),
                path_prediction: Default::default(),
                intensity_forecast: Default::default(),
                landfall: Default::default(),
                analysis: format!("forecast {i}"),
                confidence: 0.7,
                created_at: base + Duration::minutes(*offset),
                valid_until: base + Duration::hours(6),
            };
            store.append_forecast(forecast).await.unwrap();
        }

        let latest = store.latest_forecast("hurricane-ana").await.unwrap().unwrap();
        assert_eq!(latest.analysis, "forecast 1");
        assert!(store.latest_forecast("no-such-storm").await.unwrap().is_none());
    }
}
