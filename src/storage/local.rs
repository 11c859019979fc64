//! Local filesystem storage backend.
//!
//! Persists the store as JSON files under a root directory so state survives
//! a restart. All writes go through an atomic temp-file rename, so a crash
//! mid-write never leaves a torn file behind.
//!
//! ## Storage Layout
//!
//! ```text
//! {root}/
//! ├── snapshots.json      # Append-only snapshot log
//! ├── storms.json         # Current storm records, keyed by slug
//! └── forecasts.json      # Append-only forecast log
//! ```

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

use crate::error::{AppError, Result};
use crate::models::{FeedFamily, FeedKind, Forecast, Snapshot, Storm};
use crate::storage::SnapshotStore;

const SNAPSHOTS_FILE: &str = "snapshots.json";
const STORMS_FILE: &str = "storms.json";
const FORECASTS_FILE: &str = "forecasts.json";

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

/// Local filesystem storage backend.
pub struct LocalStore {
    root_dir: PathBuf,
    inner: RwLock<Inner>,
}

impl LocalStore {
    /// Open a store rooted at the given directory, loading any existing state.
    pub async fn open(root_dir: impl Into<PathBuf>) -> Result<Self> {
        let root_dir = root_dir.into();

        let snapshots: Vec<Snapshot> =
            Self::read_json_in(&root_dir, SNAPSHOTS_FILE).await?.unwrap_or_default();
        let storms: HashMap<String, Storm> =
            Self::read_json_in(&root_dir, STORMS_FILE).await?.unwrap_or_default();
        let forecasts: Vec<Forecast> =
            Self::read_json_in(&root_dir, FORECASTS_FILE).await?.unwrap_or_default();

        // Resume the sequence after the highest persisted id.
        let seq = snapshots
            .iter()
            .map(|s| s.id)
            .chain(forecasts.iter().map(|f| f.id))
            .max()
            .unwrap_or(0);

        Ok(Self {
            root_dir,
            inner: RwLock::new(Inner {
                snapshots,
                storms,
                forecasts,
                seq,
            }),
        })
    }

    fn path(&self, key: &str) -> PathBuf {
        self.root_dir.join(key)
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(value)?;
        self.write_bytes(key, &bytes).await
    }

    /// Read JSON from a file under `root`, returning None if it doesn't exist.
    async fn read_json_in<T: DeserializeOwned>(
        root: &PathBuf,
        key: &str,
    ) -> Result<Option<T>> {
        match tokio::fs::read(root.join(key)).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }
}

#[async_trait]
impl SnapshotStore for LocalStore {
    async fn append_snapshot(&self, mut snapshot: Snapshot) -> Result<Snapshot> {
        let mut inner = self.inner.write().await;
        snapshot.id = inner.next_seq();
        inner.snapshots.push(snapshot.clone());
        self.write_json(SNAPSHOTS_FILE, &inner.snapshots).await?;
        Ok(snapshot)
    }

    async fn latest_snapshot(
        &self,
        family: FeedFamily,
        kind: FeedKind,
    ) -> Result<Option<Snapshot>> {
        let inner = self.inner.read().await;
        Ok(inner
            .snapshots
            .iter()
            .filter(|s| s.family == family && s.kind == kind)
            .max_by_key(|s| (s.timestamp, s.id))
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
        self.write_json(STORMS_FILE, &inner.storms).await?;
        Ok(storm)
    }

    async fn append_forecast(&self, mut forecast: Forecast) -> Result<Forecast> {
        let mut inner = self.inner.write().await;
        forecast.id = inner.next_seq();
        inner.forecasts.push(forecast.clone());
        self.write_json(FORECASTS_FILE, &inner.forecasts).await?;
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
    use chrono::Utc;
    use tempfile::TempDir;

    fn make_snapshot(kind: FeedKind) -> Snapshot {
        Snapshot::new(
            kind,
            Utc::now(),
            Snapshot::GLOBAL_BOUNDS,
            SnapshotPayload::Raster {
                grib_url: Some("https://example.com/cycle.grb2".into()),
                netcdf_url: None,
                cog_url: None,
                tile_url: None,
            },
            None,
        )
    }

    #[tokio::test]
    async fn test_append_and_reload() {
        let tmp = TempDir::new().unwrap();

        let appended = {
            let store = LocalStore::open(tmp.path()).await.unwrap();
            store
                .append_snapshot(make_snapshot(FeedKind::Temperature))
                .await
                .unwrap()
        };

        // Re-open and verify state survived the restart.
        let store = LocalStore::open(tmp.path()).await.unwrap();
        let latest = store
            .latest_snapshot(FeedFamily::GriddedWeather, FeedKind::Temperature)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(latest.id, appended.id);
        assert_eq!(latest.digest, appended.digest);
    }

    #[tokio::test]
    async fn test_sequence_resumes_after_reload() {
        let tmp = TempDir::new().unwrap();

        let first_id = {
            let store = LocalStore::open(tmp.path()).await.unwrap();
            store
                .append_snapshot(make_snapshot(FeedKind::Wind))
                .await
                .unwrap()
                .id
        };

        let store = LocalStore::open(tmp.path()).await.unwrap();
        let second_id = store
            .append_snapshot(make_snapshot(FeedKind::Wind))
            .await
            .unwrap()
            .id;
        assert!(second_id > first_id);
    }

    #[tokio::test]
    async fn test_open_empty_dir() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStore::open(tmp.path()).await.unwrap();
        assert!(store.list_storms(false).await.unwrap().is_empty());
        assert!(
            store
                .latest_snapshot(FeedFamily::OceanField, FeedKind::Waves)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_storm_upsert_persists() {
        let tmp = TempDir::new().unwrap();
        {
            let store = LocalStore::open(tmp.path()).await.unwrap();
            store
                .upsert_storm(Storm {
                    id: "hurricane-carla".into(),
                    name: "Hurricane Carla".into(),
                    category: "Category 3 Hurricane".into(),
                    wind_speed: 115.0,
                    pressure: 960.0,
                    latitude: 27.0,
                    longitude: -93.0,
                    movement: "NNW at 9 mph".into(),
                    last_update: Utc::now(),
                    next_update: None,
                    forecast_track: None,
                    is_active: true,
                    origin: Default::default(),
                })
                .await
                .unwrap();
        }

        let store = LocalStore::open(tmp.path()).await.unwrap();
        let storm = store.get_storm("hurricane-carla").await.unwrap().unwrap();
        assert_eq!(storm.wind_speed, 115.0);
    }
}
